//! Spatial layout records and their tag encoding
//!
//! A record lists one `[z, y, x]` triple per placed voxel and, at the same
//! index, one row of the block table. Rows are never deduplicated: voxel
//! `i` always places `block_palette[i]`.
//!
//! Decoded records are encoded under an empty root name, positioned ones
//! under `root`.

use crate::axis::Axis;
use crate::block::{BlockEntry, BlockTexture, Candidate};
use crate::color::Color;
use crate::nbt::{self, Tag};
use crate::resolve::{BlockResolver, ResolverConfig};
use glam::IVec3;
use image::RgbaImage;
use tracing::debug;

pub const FORMAT_VERSION: i32 = 1;

/// Root tag name of positioned records
pub const POSITIONED_ROOT: &str = "root";

/// One row of the block table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub version: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureRecord {
    /// Name of the root tag
    pub root_name: String,
    pub format_version: i32,
    /// Bounding box `(width, height, depth)`
    pub size: IVec3,
    pub world_origin: IVec3,
    /// `[z, y, x]` per voxel in visit order
    pub block_indices: Vec<[i32; 3]>,
    pub block_palette: Vec<BlockState>,
}

impl StructureRecord {
    fn empty(root_name: &str) -> Self {
        Self {
            root_name: root_name.to_string(),
            format_version: FORMAT_VERSION,
            size: IVec3::ZERO,
            world_origin: IVec3::ZERO,
            block_indices: Vec::new(),
            block_palette: Vec::new(),
        }
    }

    fn push(&mut self, pos: IVec3, name: &str, version: i32) {
        self.block_indices.push([pos.z, pos.y, pos.x]);
        self.block_palette.push(BlockState {
            version,
            name: name.to_string(),
        });
    }

    /// Every pixel of every frame, resolved against `palette`
    ///
    /// Frames map to depth. The box is `(max x + 1, max y + 1, frames)`.
    pub fn from_frames<C: Candidate>(
        frames: &[RgbaImage],
        palette: &[C],
        resolver: &ResolverConfig,
        version: i32,
    ) -> Self {
        let resolver = BlockResolver::new(palette, resolver);
        let mut record = Self::empty("");
        let mut max = IVec3::splat(-1);

        for (z, frame) in frames.iter().enumerate() {
            for (x, y, pixel) in frame.enumerate_pixels() {
                let pos = IVec3::new(x as i32, y as i32, z as i32);
                record.push(pos, resolver.resolve(Color::from(pixel)), version);
                max = max.max(pos);
            }
        }

        record.size = IVec3::new(max.x + 1, max.y + 1, frames.len() as i32);
        debug!(
            "Decoded structure {:?} with {} voxels",
            record.size,
            record.block_indices.len()
        );
        record
    }

    /// Slice entries placed at their grid positions in `z` axis order
    ///
    /// Entries without a position are skipped; fully transparent slices
    /// place `transparent_block`. A grid position `(gx, gy, gz)` lands at
    /// `(gy, gz, gx)`, so its triple reads `[gx, gz, gy]`. The depth is the
    /// largest grid x without the `+1` the other two axes get, so a single
    /// column reports depth 0.
    pub fn from_positioned(entries: &[BlockEntry], transparent_block: &str, version: i32) -> Self {
        let mut record = Self::empty(POSITIONED_ROOT);
        let mut max = IVec3::new(-1, -1, 0);

        for entry in entries {
            let BlockTexture::Image(block) = entry.texture() else {
                continue;
            };
            let fill_with = if block.is_transparent() {
                transparent_block
            } else {
                entry.identifier()
            };
            let oriented = block.orientation(Axis::Z);
            let pos = IVec3::new(oriented.z, oriented.y, oriented.x);
            record.push(pos, fill_with, version);
            max = max.max(pos);
        }

        record.size = IVec3::new(max.x + 1, max.y + 1, max.z);
        debug!(
            "Positioned structure {:?} with {} voxels",
            record.size,
            record.block_indices.len()
        );
        record
    }

    pub fn is_empty(&self) -> bool {
        self.block_indices.is_empty()
    }

    /// Read back `(x, y, z) -> block name` in visit order
    pub fn placements(&self) -> Vec<(IVec3, &str)> {
        self.block_indices
            .iter()
            .zip(&self.block_palette)
            .map(|(&[z, y, x], state)| (IVec3::new(x, y, z), state.name.as_str()))
            .collect()
    }

    pub fn to_nbt(&self) -> Tag {
        let flat: Vec<i32> = self.block_indices.iter().flatten().copied().collect();

        let block_palette = self
            .block_palette
            .iter()
            .map(|state| {
                Tag::compound()
                    .with("version", Tag::Int(state.version))
                    .with("name", Tag::String(state.name.clone()))
                    .with("states", Tag::compound())
            })
            .collect();

        let position_data = Tag::Compound(
            (0..self.block_indices.len())
                .map(|idx| {
                    let data = Tag::compound().with("block_entity_data", Tag::compound());
                    (idx.to_string(), data)
                })
                .collect(),
        );

        let palette = Tag::compound().with(
            "default",
            Tag::compound()
                .with("block_palette", Tag::List(block_palette))
                .with("block_position_data", position_data),
        );

        let structure = Tag::compound()
            .with(
                "block_indices",
                Tag::List(vec![Tag::int_list(&flat), Tag::int_list(&[-1, -1, -1])]),
            )
            .with("entities", Tag::List(Vec::new()))
            .with("palette", palette);

        Tag::compound()
            .with("format_version", Tag::Int(self.format_version))
            .with("size", Tag::int_list(&self.size.to_array()))
            .with(
                "structure_world_origin",
                Tag::int_list(&self.world_origin.to_array()),
            )
            .with("structure", structure)
    }

    pub fn encode(&self) -> Vec<u8> {
        nbt::encode(&self.root_name, &self.to_nbt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{HueBlock, ImageBlock, Material};
    use crate::config::BLOCK_ENGINE_VERSION;
    use image::Rgba;

    fn slice_entry(pos: IVec3, rgba: [u8; 4]) -> BlockEntry {
        let title = format!("X{} Y{} Z{}", pos.x, pos.y, pos.z);
        let block = ImageBlock::new(RgbaImage::from_pixel(2, 2, Rgba(rgba)), pos, title);
        BlockEntry::new("art", block, Material::glossy())
    }

    #[test]
    fn test_decoded_bounding_box() {
        let frame = RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 255]));
        let palette = [BlockEntry::new("art", HueBlock::new([255u8, 0, 0]), Material::glossy())];
        let record = StructureRecord::from_frames(
            &[frame],
            &palette,
            &ResolverConfig::default(),
            BLOCK_ENGINE_VERSION,
        );

        assert_eq!(record.size, IVec3::new(3, 2, 1));
        assert_eq!(record.block_indices.len(), 6);
        // One row per pixel, even when identifiers repeat
        assert_eq!(record.block_palette.len(), 6);
        assert_eq!(record.block_indices[0], [0, 0, 0]);
        assert_eq!(record.block_indices[5], [0, 1, 2]);
        assert!(record.block_palette.iter().all(|s| s.name == "art:arglossy_ff0000ff"));
    }

    #[test]
    fn test_decoded_frames_are_depth() {
        let frames = vec![
            RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])),
            RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255])),
        ];
        let palette: [BlockEntry; 0] = [];
        let record = StructureRecord::from_frames(
            &frames,
            &palette,
            &ResolverConfig::default(),
            BLOCK_ENGINE_VERSION,
        );

        assert_eq!(record.size, IVec3::new(2, 2, 2));
        assert_eq!(record.block_indices[4], [1, 0, 0]);
        assert_eq!(record.block_palette[0].name, "minecraft:air");
        assert_eq!(record.block_palette[4].name, "minecraft:stone");
    }

    #[test]
    fn test_positioned_round_trip() {
        let entries = vec![
            slice_entry(IVec3::new(0, 0, 0), [200, 10, 10, 255]),
            slice_entry(IVec3::new(1, 0, 0), [10, 200, 10, 255]),
            slice_entry(IVec3::new(0, 1, 0), [0, 0, 0, 0]),
            BlockEntry::new("art", HueBlock::new([1u8, 2, 3]), Material::glossy()),
        ];
        let record =
            StructureRecord::from_positioned(&entries, "minecraft:air", BLOCK_ENGINE_VERSION);

        let expected: Vec<(IVec3, &str)> = vec![
            (IVec3::new(0, 0, 0), "art:arglossy_x0_y0_z0"),
            (IVec3::new(0, 0, 1), "art:arglossy_x1_y0_z0"),
            (IVec3::new(1, 0, 0), "minecraft:air"),
        ];
        assert_eq!(record.placements(), expected);

        for (entry, (pos, _)) in entries.iter().zip(&expected) {
            let grid = entry.texture().as_image().unwrap().position();
            assert_eq!(*pos, IVec3::new(grid.y, grid.z, grid.x));
        }
    }

    #[test]
    fn test_positioned_depth_has_no_plus_one() {
        let entries = vec![
            slice_entry(IVec3::new(0, 0, 0), [200, 10, 10, 255]),
            slice_entry(IVec3::new(2, 3, 0), [10, 200, 10, 255]),
        ];
        let record =
            StructureRecord::from_positioned(&entries, "minecraft:air", BLOCK_ENGINE_VERSION);

        // Grid (2, 3, 0) lands at (3, 0, 2)
        assert_eq!(record.size, IVec3::new(4, 1, 2));
        assert_eq!(record.block_indices[1], [2, 0, 3]);

        let column = vec![slice_entry(IVec3::new(0, 4, 0), [1, 1, 1, 255])];
        let record =
            StructureRecord::from_positioned(&column, "minecraft:air", BLOCK_ENGINE_VERSION);
        assert_eq!(record.size, IVec3::new(5, 1, 0));
    }

    #[test]
    fn test_positioned_without_slices_is_empty() {
        let entries = vec![BlockEntry::new("art", HueBlock::new([1u8, 2, 3]), Material::glossy())];
        let record =
            StructureRecord::from_positioned(&entries, "minecraft:air", BLOCK_ENGINE_VERSION);
        assert!(record.is_empty());
    }

    #[test]
    fn test_tag_layout() {
        let frame = RgbaImage::from_pixel(1, 2, Rgba([0, 0, 0, 0]));
        let palette: [BlockEntry; 0] = [];
        let record =
            StructureRecord::from_frames(&[frame], &palette, &ResolverConfig::default(), 7);
        let tag = record.to_nbt();

        assert_eq!(tag.get("format_version"), Some(&Tag::Int(1)));
        assert_eq!(tag.get("size"), Some(&Tag::int_list(&[1, 2, 1])));
        assert_eq!(tag.get("structure_world_origin"), Some(&Tag::int_list(&[0, 0, 0])));

        let structure = tag.get("structure").unwrap();
        assert_eq!(
            structure.get("block_indices"),
            Some(&Tag::List(vec![
                Tag::int_list(&[0, 0, 0, 0, 1, 0]),
                Tag::int_list(&[-1, -1, -1]),
            ]))
        );

        let default = structure.get("palette").and_then(|p| p.get("default")).unwrap();
        let Some(Tag::List(rows)) = default.get("block_palette") else {
            panic!("block palette missing");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("version"), Some(&Tag::Int(7)));
        assert_eq!(rows[0].get("name"), Some(&Tag::String("minecraft:air".into())));

        let Some(Tag::Compound(data)) = default.get("block_position_data") else {
            panic!("position data missing");
        };
        let keys: Vec<&str> = data.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["0", "1"]);
    }

    #[test]
    fn test_encode_header_bytes() {
        let palette: [BlockEntry; 0] = [];
        let record = StructureRecord::from_frames(&[], &palette, &ResolverConfig::default(), 1);
        let bytes = record.encode();

        assert_eq!(&bytes[..3], &[nbt::TAG_COMPOUND, 0, 0]);
        assert_eq!(bytes[3], nbt::TAG_INT);
        assert_eq!(&bytes[4..6], &[14, 0]);
        assert_eq!(&bytes[6..20], b"format_version");
        assert_eq!(&bytes[20..24], &1i32.to_le_bytes());
        assert_eq!(*bytes.last().unwrap(), nbt::TAG_END);
    }

    #[test]
    fn test_positioned_root_name() {
        let record = StructureRecord::from_positioned(&[], "minecraft:air", BLOCK_ENGINE_VERSION);
        let bytes = record.encode();

        assert_eq!(&bytes[..3], &[nbt::TAG_COMPOUND, 4, 0]);
        assert_eq!(&bytes[3..7], b"root");
        assert_eq!(bytes[7], nbt::TAG_INT);
    }
}
