//! Whole-image alpha-over compositing.

use image::{DynamicImage, RgbaImage};

use crate::error::{Result, TileError};
use crate::raster::RasterBuffer;

fn to_rgba(buffer: &RasterBuffer) -> Result<RgbaImage> {
    buffer
        .to_dynamic()
        .map(DynamicImage::into_rgba8)
        .ok_or_else(|| TileError::InvalidPixelData {
            expected: buffer.pixel_count() * buffer.channels.count(),
            actual: buffer.pixels.len(),
        })
}

/// Draw `updated` over `base` with standard alpha blending. The result keeps
/// the base's size and is always RGBA.
pub fn overlay_buffers(base: &RasterBuffer, updated: &RasterBuffer) -> Result<RasterBuffer> {
    let mut canvas = to_rgba(base)?;
    let top = to_rgba(updated)?;
    image::imageops::overlay(&mut canvas, &top, 0, 0);
    Ok(RasterBuffer::from_dynamic(DynamicImage::ImageRgba8(canvas)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Channels;

    #[test]
    fn test_transparent_pixels_show_base() {
        let base = RasterBuffer::filled(2, 1, Channels::Gray, 0);
        let updated =
            RasterBuffer::new(2, 1, Channels::Rgba, vec![255, 0, 0, 255, 9, 9, 9, 0]).unwrap();

        let out = overlay_buffers(&base, &updated).unwrap();
        assert_eq!(out.channels, Channels::Rgba);
        assert_eq!(out.pixel(0, 0), &[255, 0, 0, 255]);
        assert_eq!(out.pixel(1, 0), &[0, 0, 0, 255]);
    }

    #[test]
    fn test_larger_top_is_clipped_to_base() {
        let base = RasterBuffer::filled(2, 2, Channels::Gray, 10);
        let updated = RasterBuffer::filled(5, 3, Channels::Rgba, 255);
        let out = overlay_buffers(&base, &updated).unwrap();
        assert_eq!((out.width, out.height), (2, 2));
        assert!(out.pixels.iter().all(|&v| v == 255));
    }
}
