//! Color samples and the numeric predicates used to classify them
//!
//! All channels are 8-bit with alpha 255 meaning fully opaque. Distances are
//! computed on RGB only; alpha only takes part in threshold checks and fuzzy
//! equality.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An RGBA color sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const TRANSPARENT: Color = Color([0, 0, 0, 0]);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color([r, g, b, a])
    }

    /// Three-channel colors are always fully opaque
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b, 255])
    }

    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }

    pub fn alpha(&self) -> u8 {
        self.0[3]
    }

    /// Lowercase `#rrggbbaa`
    pub fn hex(&self) -> String {
        let [r, g, b, a] = self.0;
        format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
    }
}

impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Self {
        Color(pixel.0)
    }
}

impl From<&Rgba<u8>> for Color {
    fn from(pixel: &Rgba<u8>) -> Self {
        Color(pixel.0)
    }
}

impl From<[u8; 4]> for Color {
    fn from(channels: [u8; 4]) -> Self {
        Color(channels)
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Color::rgb(r, g, b)
    }
}

/// Per-channel maximum absolute difference `[r, g, b, a]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance(pub [f32; 4]);

/// Tolerance used while collecting palette colors
pub const PALETTE_TOLERANCE: Tolerance =
    Tolerance([255.0 / 15.0, 255.0 / 15.0, 255.0 / 15.0, 255.0 / 50.0]);

/// Tolerance used when matching a pixel against a block's reference color
pub const EXACT_MATCH_TOLERANCE: Tolerance =
    Tolerance([255.0 / 10.0, 255.0 / 10.0, 255.0 / 10.0, 255.0 / 50.0]);

/// Alpha strictly above the minimum
#[inline]
pub fn is_opaque_enough(color: Color, min_alpha: u8) -> bool {
    color.alpha() > min_alpha
}

/// Every sample at or below the minimum alpha. An empty region counts as transparent.
pub fn is_fully_transparent<I>(samples: I, min_alpha: u8) -> bool
where
    I: IntoIterator<Item = Color>,
{
    samples.into_iter().all(|c| c.alpha() <= min_alpha)
}

/// Single-color translucency: anything not fully opaque
#[inline]
pub fn is_translucent(color: Color) -> bool {
    color.alpha() != 255
}

/// Region translucency: at least one partially transparent sample
pub fn region_is_translucent<I>(samples: I) -> bool
where
    I: IntoIterator<Item = Color>,
{
    samples
        .into_iter()
        .any(|c| c.alpha() > 0 && c.alpha() < 255)
}

/// Approximate equality with a per-channel tolerance (inclusive)
pub fn fuzzy_equals(a: Color, b: Color, tolerance: Tolerance) -> bool {
    a.0.iter()
        .zip(b.0.iter())
        .zip(tolerance.0.iter())
        .all(|((&x, &y), &tol)| (x as f32 - y as f32).abs() <= tol)
}

/// Euclidean distance over RGB
pub fn distance(a: Color, b: Color) -> f32 {
    let dr = a.r() as f32 - b.r() as f32;
    let dg = a.g() as f32 - b.g() as f32;
    let db = a.b() as f32 - b.b() as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Channel level below which a sample counts as black, above `255 - x` as white
const BW_THRESHOLD: u8 = 0x0f;

/// Most frequent visible color of an image
///
/// Near-black and near-white samples are skipped unless nothing else is
/// visible. Ties keep the color seen first in row-major order. Fully
/// transparent images yield [`Color::TRANSPARENT`].
pub fn dominant_color(img: &RgbaImage) -> Color {
    most_frequent(img, true)
        .or_else(|| most_frequent(img, false))
        .unwrap_or(Color::TRANSPARENT)
}

fn most_frequent(img: &RgbaImage, skip_extremes: bool) -> Option<Color> {
    let mut counts: HashMap<Color, usize> = HashMap::new();
    let mut order: Vec<Color> = Vec::new();

    for pixel in img.pixels() {
        let color = Color::from(pixel);
        if color.alpha() == 0 {
            continue;
        }
        if skip_extremes && (is_near_black(color) || is_near_white(color)) {
            continue;
        }
        let count = counts.entry(color).or_insert(0);
        if *count == 0 {
            order.push(color);
        }
        *count += 1;
    }

    // Strictly greater keeps the earliest color on ties
    order
        .into_iter()
        .fold(None, |best: Option<(Color, usize)>, color| {
            let n = counts[&color];
            match best {
                Some((_, best_n)) if best_n >= n => best,
                _ => Some((color, n)),
            }
        })
        .map(|(color, _)| color)
}

fn is_near_black(c: Color) -> bool {
    c.r() <= BW_THRESHOLD && c.g() <= BW_THRESHOLD && c.b() <= BW_THRESHOLD
}

fn is_near_white(c: Color) -> bool {
    let floor = 255 - BW_THRESHOLD;
    c.r() >= floor && c.g() >= floor && c.b() >= floor
}
