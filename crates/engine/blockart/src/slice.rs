//! Partitioning an image into grid-positioned slices
//!
//! Each frame is cut into `slice_size`² tiles, x-major. A tile's position is
//! its grid cell, with the frame index as z. When the input is animated,
//! tiles sharing a grid cell are stacked top to bottom into one flipbook
//! texture.

use crate::block::ImageBlock;
use crate::config::DEFAULT_SLICE_COUNT;
use crate::palette::MAX_FRAME_DEPTH;
use glam::IVec3;
use image::imageops;
use image::RgbaImage;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct SliceOptions {
    /// Canvas edge the grid is derived from; the first frame's width when unset
    pub canvas_size: Option<u32>,
    /// Slices per canvas edge
    pub slice_count: u32,
    pub max_frames: usize,
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self {
            canvas_size: None,
            slice_count: DEFAULT_SLICE_COUNT,
            max_frames: MAX_FRAME_DEPTH,
        }
    }
}

/// Full-size auxiliary maps cropped alongside the color frames
#[derive(Debug, Clone, Copy, Default)]
pub struct AuxMaps<'a> {
    /// Metalness/emissive/roughness
    pub mer: Option<&'a RgbaImage>,
    pub normal: Option<&'a RgbaImage>,
}

/// Grid cell of a slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey {
    pub x: u32,
    pub y: u32,
}

/// A positioned sub-image
#[derive(Debug, Clone)]
pub struct Slice {
    pub image: RgbaImage,
    /// `(grid x, grid y, frame index)`
    pub position: IVec3,
    pub mer: Option<RgbaImage>,
    pub normal: Option<RgbaImage>,
    /// Frames stacked in `image`
    pub frame_count: u32,
}

impl Slice {
    pub fn key(&self) -> GridKey {
        GridKey {
            x: self.position.x as u32,
            y: self.position.y as u32,
        }
    }

    pub fn title(&self) -> String {
        let IVec3 { x, y, z } = self.position;
        if self.frame_count > 1 {
            format!("Flipbook X{} Y{} Z{}", x, y, z)
        } else {
            format!("X{} Y{} Z{}", x, y, z)
        }
    }

    pub fn into_block(self) -> ImageBlock {
        let title = self.title();
        let mut block =
            ImageBlock::new(self.image, self.position, title).with_frame_count(self.frame_count);
        block.mer = self.mer;
        block.normal = self.normal;
        block
    }
}

/// Edge length of one slice
pub fn slice_size(canvas_size: u32, slice_count: u32) -> u32 {
    assert!(slice_count > 0, "slice count must be positive");
    canvas_size.div_ceil(slice_count).max(1)
}

/// Cut every frame into grid slices, merging animated cells
pub fn slice_frames(frames: &[RgbaImage], options: &SliceOptions, aux: AuxMaps<'_>) -> Vec<Slice> {
    let Some(first) = frames.first() else {
        return Vec::new();
    };
    let frames = &frames[..frames.len().min(options.max_frames)];

    let canvas = options.canvas_size.unwrap_or(first.width());
    let size = slice_size(canvas, options.slice_count);

    let mut slices = Vec::new();
    for (z, frame) in frames.iter().enumerate() {
        let (width, height) = frame.dimensions();

        for (gx, x) in (0..width).step_by(size as usize).enumerate() {
            for (gy, y) in (0..height).step_by(size as usize).enumerate() {
                let position = IVec3::new(gx as i32, gy as i32, z as i32);
                let first_frame = z == 0;

                slices.push(Slice {
                    image: crop_tile(frame, x, y, size),
                    position,
                    mer: aux
                        .mer
                        .filter(|_| first_frame)
                        .map(|map| crop_tile(map, x, y, size)),
                    normal: aux
                        .normal
                        .filter(|_| first_frame)
                        .map(|map| crop_tile(map, x, y, size)),
                    frame_count: 1,
                });
            }
        }
    }

    debug!(
        "Cut {} slice(s) of {}px from {} frame(s)",
        slices.len(),
        size,
        frames.len()
    );

    if frames.len() > 1 {
        merge_animated(slices)
    } else {
        slices
    }
}

/// Group slices by grid cell in first-seen order and stack each group
/// vertically in frame order
pub fn merge_animated(slices: Vec<Slice>) -> Vec<Slice> {
    let mut groups: Vec<Vec<Slice>> = Vec::new();
    let mut index: HashMap<GridKey, usize> = HashMap::new();

    for slice in slices {
        let slot = *index.entry(slice.key()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(slice);
    }

    groups.into_iter().filter_map(stack_group).collect()
}

fn stack_group(mut group: Vec<Slice>) -> Option<Slice> {
    if group.is_empty() {
        return None;
    }
    group.sort_by_key(|s| s.position.z);

    let (width, height) = group[0].image.dimensions();
    let mut strip = RgbaImage::new(width, height * group.len() as u32);
    for (i, slice) in group.iter().enumerate() {
        imageops::replace(&mut strip, &slice.image, 0, i as i64 * height as i64);
    }

    let frame_count = group.len() as u32;
    let head = group.swap_remove(0);
    Some(Slice {
        image: strip,
        position: head.position,
        mer: head.mer,
        normal: head.normal,
        frame_count,
    })
}

/// `size`² region at `(x, y)`, transparent where it overhangs the source
fn crop_tile(src: &RgbaImage, x: u32, y: u32, size: u32) -> RgbaImage {
    let mut tile = RgbaImage::new(size, size);
    if x < src.width() && y < src.height() {
        let region = imageops::crop_imm(src, x, y, size, size).to_image();
        imageops::replace(&mut tile, &region, 0, 0);
    }
    tile
}

/// Playback order of flipbook frames: from the midpoint to the end, then
/// wrapping back to frame 1
///
/// The midpoint rounds half up, so a single frame has no playback order.
pub fn flipbook_frames(frame_count: u32) -> Vec<u32> {
    let start = (frame_count as f64 * 0.5).round() as u32;
    (start..frame_count).chain(1..start).collect()
}
