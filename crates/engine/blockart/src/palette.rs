//! Palette extraction
//!
//! Colors are collected frame-reverse, then in row-major pixel order. The
//! order of discovery is kept as-is because it decides which block wins an
//! exact match later on, so identical input always yields an identical
//! palette.

use crate::block::HueBlock;
use crate::color::{fuzzy_equals, is_opaque_enough, Color, Tolerance, PALETTE_TOLERANCE};
use crate::config::MIN_ALPHA;
use crate::frames::{fit_frame, limit_frames};
use image::RgbaImage;
use tracing::{debug, warn};

/// Every RGB value plus the accepted alpha range
pub const MAX_PALETTE_SIZE: usize = 256 * 256 * 256 + MIN_ALPHA as usize;

/// Palette frame depth
pub const MAX_FRAME_DEPTH: usize = 10;

/// Largest width and height scanned; bigger frames are downsampled first
pub const BOUNDARY: u32 = 256;

/// Knobs for [`extract_palette`]
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteOptions {
    pub min_alpha: u8,
    pub max_frames: usize,
    pub max_width: u32,
    pub max_height: u32,
    pub max_size: usize,
    pub tolerance: Tolerance,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            min_alpha: MIN_ALPHA,
            max_frames: MAX_FRAME_DEPTH,
            max_width: BOUNDARY,
            max_height: BOUNDARY,
            max_size: MAX_PALETTE_SIZE,
            tolerance: PALETTE_TOLERANCE,
        }
    }
}

/// Result of a palette scan
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteExtraction {
    /// Distinct colors in order of discovery
    pub colors: Vec<Color>,
    /// More qualifying colors existed than `max_size` allowed
    pub truncated: bool,
}

impl PaletteExtraction {
    /// One single-color block per palette color
    pub fn into_hue_blocks(self) -> Vec<HueBlock> {
        self.colors.into_iter().map(HueBlock::new).collect()
    }
}

/// Collect the distinct, sufficiently opaque colors of a frame sequence
///
/// Frames are visited last-to-first up to `max_frames`. Oversized frames
/// are downsampled with nearest-neighbor before any color is read. A color
/// is kept when its alpha exceeds `min_alpha` and no kept color is within
/// `tolerance` of it. Once `max_size` colors are kept, further qualifying
/// colors only mark the result as truncated.
pub fn extract_palette(frames: &[RgbaImage], options: &PaletteOptions) -> PaletteExtraction {
    let mut colors: Vec<Color> = Vec::new();
    let mut truncated = false;

    let frames = limit_frames(frames, options.max_frames);

    for frame in frames.iter().rev() {
        let frame = fit_frame(frame, options.max_width, options.max_height);

        for pixel in frame.pixels() {
            let color = Color::from(pixel);
            if !is_opaque_enough(color, options.min_alpha) {
                continue;
            }
            if colors
                .iter()
                .any(|&kept| fuzzy_equals(kept, color, options.tolerance))
            {
                continue;
            }
            if colors.len() >= options.max_size {
                truncated = true;
                continue;
            }
            colors.push(color);
        }
    }

    if truncated {
        warn!("Palette size has been truncated to {} colors", options.max_size);
    }
    debug!(
        "Extracted {} palette colors from {} frame(s)",
        colors.len(),
        frames.len()
    );

    PaletteExtraction { colors, truncated }
}

/// Blocks sampling the RGB cube every `step` values (red outermost)
///
/// The step is clamped to `1..=255`.
pub fn srgb_grid(step: u32) -> Vec<HueBlock> {
    let step = step.clamp(1, 255) as usize;
    let mut blocks = Vec::new();
    for r in (0..=255u8).step_by(step) {
        for g in (0..=255u8).step_by(step) {
            for b in (0..=255u8).step_by(step) {
                let title = format!("R{} G{} B{}", r, g, b);
                blocks.push(HueBlock::titled([r, g, b], title));
            }
        }
    }
    blocks
}
