//! Decoding source bytes into RGBA frames and the resampling helpers the
//! palette and printer paths apply before scanning

use crate::error::{BlockArtError, Result};
use image::codecs::gif::GifDecoder;
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, ImageFormat, RgbaImage};
use std::borrow::Cow;
use std::io::Cursor;
use tracing::debug;

/// Decode image bytes into one or more same-shape RGBA frames
///
/// GIF inputs yield every animation frame, composited to the full canvas.
/// Other formats yield a single frame. RGB inputs are widened with alpha 255.
pub fn decode_frames(bytes: &[u8]) -> Result<Vec<RgbaImage>> {
    let format = image::guess_format(bytes).map_err(|_| BlockArtError::UnsupportedFormat)?;

    let frames: Vec<RgbaImage> = if format == ImageFormat::Gif {
        let decoder = GifDecoder::new(Cursor::new(bytes))?;
        decoder
            .into_frames()
            .collect_frames()?
            .into_iter()
            .map(|frame| frame.into_buffer())
            .collect()
    } else {
        vec![image::load_from_memory_with_format(bytes, format)?.to_rgba8()]
    };

    if frames.is_empty() {
        return Err(BlockArtError::EmptyImage);
    }

    debug!(
        "Decoded {} frame(s) of {}x{} ({:?})",
        frames.len(),
        frames[0].width(),
        frames[0].height(),
        format
    );

    Ok(frames)
}

/// The first `cap` frames
pub fn limit_frames(frames: &[RgbaImage], cap: usize) -> &[RgbaImage] {
    if frames.len() > cap {
        debug!("Limiting {} frames to {}", frames.len(), cap);
        return &frames[..cap];
    }
    frames
}

/// Scale to a target height, keeping aspect ratio (nearest neighbor)
pub fn resize_to_height(frame: &RgbaImage, height: u32) -> RgbaImage {
    assert!(height > 0, "target height must be positive");
    let width = scaled(frame.width(), height, frame.height());
    imageops::resize(frame, width, height, FilterType::Nearest)
}

/// Scale to a target width, keeping aspect ratio (nearest neighbor)
pub fn resize_to_width(frame: &RgbaImage, width: u32) -> RgbaImage {
    assert!(width > 0, "target width must be positive");
    let height = scaled(frame.height(), width, frame.width());
    imageops::resize(frame, width, height, FilterType::Nearest)
}

/// Downsample a frame that exceeds the bounds
///
/// Height is constrained first, then width, so a frame may end up smaller
/// than the bound on both axes. A frame already within bounds is borrowed.
pub fn fit_frame(frame: &RgbaImage, max_width: u32, max_height: u32) -> Cow<'_, RgbaImage> {
    let mut frame = Cow::Borrowed(frame);
    if frame.height() > max_height {
        debug!("Resizing input height {} -> {}", frame.height(), max_height);
        frame = Cow::Owned(resize_to_height(&frame, max_height));
    }
    if frame.width() > max_width {
        debug!("Resizing input width {} -> {}", frame.width(), max_width);
        frame = Cow::Owned(resize_to_width(&frame, max_width));
    }
    frame
}

/// [`fit_frame`] applied to every frame in place
pub fn fit_within(frames: &mut [RgbaImage], max_width: u32, max_height: u32) {
    for frame in frames.iter_mut() {
        let resized = match fit_frame(frame, max_width, max_height) {
            Cow::Owned(resized) => resized,
            Cow::Borrowed(_) => continue,
        };
        *frame = resized;
    }
}

/// `value * target / reference`, rounded, never zero
fn scaled(value: u32, target: u32, reference: u32) -> u32 {
    if reference == 0 {
        return target.max(1);
    }
    ((value as f64 * target as f64 / reference as f64).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("png encoding");
        bytes
    }

    #[test]
    fn test_decode_single_png() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]));
        let frames = decode_frames(&encode_png(&img)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].dimensions(), (3, 2));
        assert_eq!(frames[0].get_pixel(0, 0), &Rgba([1, 2, 3, 4]));
    }

    #[test]
    fn test_decode_rgb_png_gets_opaque_alpha() {
        let rgb = image::RgbImage::from_pixel(2, 2, image::Rgb([9, 8, 7]));
        let mut bytes = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let frames = decode_frames(&bytes).unwrap();
        assert_eq!(frames[0].get_pixel(1, 1), &Rgba([9, 8, 7, 255]));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode_frames(b"definitely not an image"),
            Err(BlockArtError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_fit_within_downsamples() {
        let mut frames = vec![RgbaImage::new(512, 1024)];
        fit_within(&mut frames, 256, 256);
        assert_eq!(frames[0].dimensions(), (128, 256));

        let mut wide = vec![RgbaImage::new(1024, 128)];
        fit_within(&mut wide, 256, 256);
        assert_eq!(wide[0].dimensions(), (256, 32));
    }

    #[test]
    fn test_fit_within_keeps_small_frames() {
        let mut frames = vec![RgbaImage::new(20, 10)];
        fit_within(&mut frames, 256, 256);
        assert_eq!(frames[0].dimensions(), (20, 10));
    }

    #[test]
    fn test_fit_frame_borrows_small_frames() {
        let small = RgbaImage::new(20, 10);
        assert!(matches!(fit_frame(&small, 256, 256), Cow::Borrowed(_)));

        let wide = RgbaImage::new(600, 10);
        assert_eq!(fit_frame(&wide, 300, u32::MAX).dimensions(), (300, 5));
    }

    #[test]
    fn test_limit_frames() {
        let frames = vec![RgbaImage::new(1, 1); 12];
        assert_eq!(limit_frames(&frames, 10).len(), 10);
        assert_eq!(limit_frames(&frames[..3], 10).len(), 3);
    }
}
