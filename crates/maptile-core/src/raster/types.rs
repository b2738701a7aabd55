//! Core raster types.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TileError};
use crate::geometry::TileRect;

/// Pixel layout of a [`RasterBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Channels {
    /// Single luminance channel.
    Gray = 1,
    /// Luminance followed by alpha.
    GrayAlpha = 2,
    /// Red, green, blue.
    Rgb = 3,
    /// Red, green, blue, alpha.
    Rgba = 4,
}

impl Channels {
    /// Number of bytes per pixel.
    #[inline]
    pub fn count(self) -> usize {
        self as usize
    }

    /// Returns true if the last channel carries alpha.
    #[inline]
    pub fn has_alpha(self) -> bool {
        matches!(self, Channels::GrayAlpha | Channels::Rgba)
    }

    /// Index of the alpha channel, if any.
    pub fn alpha_index(self) -> Option<usize> {
        match self {
            Channels::GrayAlpha => Some(1),
            Channels::Rgba => Some(3),
            Channels::Gray | Channels::Rgb => None,
        }
    }
}

/// Filter type for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbor interpolation.
    Nearest,
    /// Bilinear interpolation.
    #[default]
    Bilinear,
    /// Lanczos3 interpolation.
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// An owned 2-D grid of 8-bit pixels, row-major, channels interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub channels: Channels,
    /// Pixel bytes, `width * height * channels` long.
    pub pixels: Vec<u8>,
}

impl RasterBuffer {
    /// Wrap existing pixel data, validating its length.
    pub fn new(width: u32, height: u32, channels: Channels, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * channels.count();
        if pixels.len() != expected {
            return Err(TileError::InvalidPixelData {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    /// A buffer with every byte of every channel set to `value`.
    pub fn filled(width: u32, height: u32, channels: Channels, value: u8) -> Self {
        Self {
            width,
            height,
            channels,
            pixels: vec![value; width as usize * height as usize * channels.count()],
        }
    }

    /// A zeroed buffer.
    pub fn zeros(width: u32, height: u32, channels: Channels) -> Self {
        Self::filled(width, height, channels, 0)
    }

    pub fn from_dynamic(img: image::DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (channels, pixels) = match img {
            image::DynamicImage::ImageLuma8(buf) => (Channels::Gray, buf.into_raw()),
            image::DynamicImage::ImageLumaA8(buf) => (Channels::GrayAlpha, buf.into_raw()),
            image::DynamicImage::ImageRgb8(buf) => (Channels::Rgb, buf.into_raw()),
            image::DynamicImage::ImageRgba8(buf) => (Channels::Rgba, buf.into_raw()),
            other if other.color().has_alpha() => (Channels::Rgba, other.into_rgba8().into_raw()),
            other if other.color().has_color() => (Channels::Rgb, other.into_rgb8().into_raw()),
            other => (Channels::Gray, other.into_luma8().into_raw()),
        };
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }

    /// Convert to an `image::DynamicImage` for use with the image crate.
    pub fn to_dynamic(&self) -> Option<image::DynamicImage> {
        let (w, h, px) = (self.width, self.height, self.pixels.clone());
        Some(match self.channels {
            Channels::Gray => image::DynamicImage::ImageLuma8(image::GrayImage::from_raw(w, h, px)?),
            Channels::GrayAlpha => {
                image::DynamicImage::ImageLumaA8(image::GrayAlphaImage::from_raw(w, h, px)?)
            }
            Channels::Rgb => image::DynamicImage::ImageRgb8(image::RgbImage::from_raw(w, h, px)?),
            Channels::Rgba => image::DynamicImage::ImageRgba8(image::RgbaImage::from_raw(w, h, px)?),
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid buffer.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Rectangle covering the whole buffer.
    pub fn bounds(&self) -> TileRect {
        TileRect::new(0, 0, self.width, self.height)
    }

    /// Bytes of the pixel at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let n = self.channels.count();
        let idx = (y as usize * self.width as usize + x as usize) * n;
        &self.pixels[idx..idx + n]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let n = self.channels.count();
        let idx = (y as usize * self.width as usize + x as usize) * n;
        &mut self.pixels[idx..idx + n]
    }

    /// Copy out a sub-region. The rectangle is clipped to the buffer.
    pub fn region(&self, rect: TileRect) -> RasterBuffer {
        let rect = rect.intersect(&self.bounds());
        let n = self.channels.count();
        let row_bytes = rect.width as usize * n;
        let mut pixels = Vec::with_capacity(row_bytes * rect.height as usize);
        for y in rect.y..rect.y + rect.height {
            let start = (y as usize * self.width as usize + rect.x as usize) * n;
            pixels.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }
        RasterBuffer {
            width: rect.width,
            height: rect.height,
            channels: self.channels,
            pixels,
        }
    }

    /// Overwrite the region at `(x, y)` with `src`, clipped to this buffer.
    pub fn paste(&mut self, src: &RasterBuffer, x: u32, y: u32) -> Result<()> {
        if src.channels != self.channels {
            return Err(TileError::DegenerateGeometry(format!(
                "cannot paste {:?} pixels into {:?} buffer",
                src.channels, self.channels
            )));
        }
        let target = TileRect::new(x, y, src.width, src.height).intersect(&self.bounds());
        let n = self.channels.count();
        let row_bytes = target.width as usize * n;
        for row in 0..target.height as usize {
            let src_start = row * src.width as usize * n;
            let dst_start = ((target.y as usize + row) * self.width as usize + target.x as usize) * n;
            self.pixels[dst_start..dst_start + row_bytes]
                .copy_from_slice(&src.pixels[src_start..src_start + row_bytes]);
        }
        Ok(())
    }

    /// Smallest and largest byte value. Intended for single-channel buffers.
    pub fn min_max(&self) -> (u8, u8) {
        self.pixels
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}
