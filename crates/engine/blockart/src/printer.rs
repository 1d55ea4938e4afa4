//! End-to-end generation: palette entries in, bundle payloads out

use crate::block::{
    compile_materials, materials_from_ids, printable_palette, BlockEntry, BlockTexture,
};
use crate::bundle::Bundle;
use crate::config::GenerationConfig;
use crate::emit::{CommandEmitter, EmitReport};
use crate::error::{BlockArtError, Result};
use crate::palette::{extract_palette, srgb_grid};
use crate::slice::{slice_frames, AuxMaps};
use crate::structure::StructureRecord;
use image::RgbaImage;
use tracing::info;

/// Where the palette listing lands in the bundle
pub const PALETTE_LISTING_PATH: &str = "palette.json";

/// One entry per extracted palette color and configured material
pub fn palette_entries(config: &GenerationConfig, frames: &[RgbaImage]) -> Vec<BlockEntry> {
    let textures: Vec<BlockTexture> = extract_palette(frames, &config.palette_options())
        .into_hue_blocks()
        .into_iter()
        .map(BlockTexture::from)
        .collect();
    compile_materials(&config.namespace, &textures, &materials_from_ids(&config.materials))
}

/// One entry per grid slice and configured material
pub fn slice_entries(
    config: &GenerationConfig,
    frames: &[RgbaImage],
    aux: AuxMaps<'_>,
) -> Vec<BlockEntry> {
    let textures: Vec<BlockTexture> = slice_frames(frames, &config.slice_options(), aux)
        .into_iter()
        .map(|slice| BlockTexture::from(slice.into_block()))
        .collect();
    compile_materials(&config.namespace, &textures, &materials_from_ids(&config.materials))
}

/// One entry per sampled point of the RGB cube and configured material
pub fn srgb_entries(config: &GenerationConfig, step: u32) -> Vec<BlockEntry> {
    let textures: Vec<BlockTexture> = srgb_grid(step).into_iter().map(BlockTexture::from).collect();
    compile_materials(&config.namespace, &textures, &materials_from_ids(&config.materials))
}

/// Chunks needed to cover the largest frame edge
pub fn print_chunks(frames: &[RgbaImage], config: &GenerationConfig) -> u32 {
    let edge = frames
        .iter()
        .map(|f| f.width().max(f.height()))
        .max()
        .unwrap_or(0);
    edge.div_ceil(config.chunk_size)
        .clamp(1, config.max_print_chunks)
}

/// Emit every output for one generation into `bundle`
///
/// Slice entries are placed by position, both as commands and as a
/// structure. When `art` is given it is decoded into a structure under the
/// same name against the whole palette, and printed pixel by pixel with the
/// printable entries only; failures there are recorded in the report
/// without aborting. A palette listing is written last.
pub fn print_art(
    bundle: &mut Bundle,
    config: &GenerationConfig,
    palette: &[BlockEntry],
    art: Option<&[RgbaImage]>,
    name: &str,
) -> Result<EmitReport> {
    if palette.len() < config.min_palette_length {
        return Err(BlockArtError::PaletteTooSmall {
            found: palette.len(),
            minimum: config.min_palette_length,
        });
    }

    let name = name.split_whitespace().collect::<Vec<_>>().join("_");
    info!("Printing {} with {} palette entries", name, palette.len());

    let positioned = StructureRecord::from_positioned(
        palette,
        &config.transparent_block,
        config.block_engine_version,
    );
    let mut decoded = None;

    let report = {
        let mut emitter = CommandEmitter::new(bundle, config);
        emitter.position_printer(&name, palette);

        if let Some(frames) = art {
            decoded = Some(StructureRecord::from_frames(
                frames,
                palette,
                &config.resolver_config(),
                config.block_engine_version,
            ));

            match printable_palette(palette) {
                Ok(printable) => {
                    let chunks = print_chunks(frames, config);
                    emitter.pixel_printer(&name, frames, &printable, chunks, config.alignment);
                }
                Err(err) => emitter.record_failure(&name, err),
            }
        }

        emitter.finish(&name)
    };

    let structure_path = format!("structures/{}.mcstructure", name);
    if !positioned.is_empty() {
        bundle.insert_bytes(structure_path.clone(), positioned.encode());
    }
    if let Some(record) = decoded {
        bundle.insert_bytes(structure_path, record.encode());
    }

    let listing: Vec<_> = palette.iter().map(BlockEntry::listing).collect();
    bundle.insert_text(PALETTE_LISTING_PATH, serde_json::to_string_pretty(&listing)?);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{HueBlock, Material};
    use crate::bundle::Payload;
    use image::Rgba;

    #[test]
    fn test_print_chunks() {
        let config = GenerationConfig::default();
        assert_eq!(print_chunks(&[RgbaImage::new(8, 4)], &config), 1);
        assert_eq!(print_chunks(&[RgbaImage::new(40, 20)], &config), 3);
        assert_eq!(print_chunks(&[RgbaImage::new(4000, 20)], &config), 16);
        assert_eq!(print_chunks(&[], &config), 1);
    }

    #[test]
    fn test_rejects_small_palette() {
        let config = GenerationConfig {
            min_palette_length: 2,
            ..Default::default()
        };
        let palette = vec![BlockEntry::new("art", HueBlock::new([0u8, 0, 0]), Material::glossy())];
        let mut bundle = Bundle::new();

        let err = print_art(&mut bundle, &config, &palette, None, "input").unwrap_err();
        assert!(matches!(err, BlockArtError::PaletteTooSmall { found: 1, minimum: 2 }));
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_unprintable_art_is_recorded() {
        let config = GenerationConfig::default();
        let mut entry = BlockEntry::new("art", HueBlock::new([0u8, 0, 0]), Material::glossy());
        entry.printable = false;
        let palette = vec![entry];
        let art = vec![RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]))];
        let mut bundle = Bundle::new();

        let report =
            print_art(&mut bundle, &config, &palette, Some(art.as_slice()), "my art").unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].unit, "my_art");
        assert!(bundle.contains("functions/print/my_art.mcfunction"));
        assert!(!bundle.contains("functions/print/my_art_glossy_x.mcfunction"));

        // The decoded structure still resolves against the full palette
        let expected = StructureRecord::from_frames(
            &art,
            &palette,
            &config.resolver_config(),
            config.block_engine_version,
        );
        assert_eq!(expected.placements()[0].1, "art:arglossy_000000ff");
        match bundle.get("structures/my_art.mcstructure") {
            Some(Payload::Bytes(bytes)) => assert_eq!(bytes, &expected.encode()),
            other => panic!("unexpected structure payload {:?}", other),
        }
    }

    #[test]
    fn test_palette_listing() {
        let config = GenerationConfig::default();
        let palette = vec![BlockEntry::new(
            "art",
            HueBlock::new([255u8, 0, 0]),
            Material::glossy(),
        )];
        let mut bundle = Bundle::new();

        print_art(&mut bundle, &config, &palette, None, "input").unwrap();

        let listing = bundle
            .get(PALETTE_LISTING_PATH)
            .and_then(Payload::as_text)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(listing).unwrap();
        assert_eq!(parsed[0]["identifier"], "art:arglossy_ff0000ff");
        assert_eq!(parsed[0]["color"], "#ff0000ff");
    }

    #[test]
    fn test_palette_entries_cross_materials() {
        let config = GenerationConfig {
            materials: vec!["glossy".into(), "metal".into()],
            ..Default::default()
        };
        let frame = RgbaImage::from_pixel(2, 2, Rgba([50, 60, 70, 255]));
        let entries = palette_entries(&config, &[frame]);

        let ids: Vec<&str> = entries.iter().map(|e| e.id()).collect();
        assert_eq!(ids, ["arglossy_323c46ff", "armetal_323c46ff"]);
    }
}
