//! Raster primitives the pipelines are written against.
//!
//! Masks are single-channel buffers holding `0` (off) or `255` (on); any
//! non-zero byte counts as "on" when a mask is consumed.

use crate::error::{Result, TileError};
use crate::geometry::AffineTransform;

use super::{Channels, FilterType, RasterBuffer};

/// Comparison used by [`RasterOps::compare_mask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
}

impl CompareOp {
    #[inline]
    fn test(self, lhs: u8, rhs: u8) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Lt => lhs < rhs,
        }
    }
}

/// Imaging capability consumed by the rotation, pyramid and merge pipelines.
pub trait RasterOps {
    /// Resample to exactly `width x height`.
    fn resize(&self, src: &RasterBuffer, width: u32, height: u32) -> Result<RasterBuffer>;

    /// Resample `src` through `transform` (source -> destination) into a
    /// `width x height` buffer. A destination pixel whose interpolation
    /// would read outside `src` is left as transparent zeros, never blended
    /// with the border.
    fn warp_affine(
        &self,
        src: &RasterBuffer,
        transform: &AffineTransform,
        width: u32,
        height: u32,
    ) -> Result<RasterBuffer>;

    /// Convert between pixel layouts. Added alpha is fully opaque.
    fn convert(&self, src: &RasterBuffer, channels: Channels) -> RasterBuffer;

    /// Extract one channel as a single-channel buffer.
    fn extract_channel(&self, src: &RasterBuffer, channel: usize) -> Result<RasterBuffer>;

    /// `255` where `pixel <op> value`, else `0`. Single-channel input.
    fn compare_mask(&self, src: &RasterBuffer, op: CompareOp, value: u8) -> RasterBuffer;

    /// `255` where `low <= pixel <= high`, else `0`. Single-channel input.
    fn in_range_mask(&self, src: &RasterBuffer, low: u8, high: u8) -> RasterBuffer;

    fn bitwise_not(&self, src: &RasterBuffer) -> RasterBuffer;

    /// Copy `src` pixels into `dst` at `(x, y)` wherever `mask` is non-zero.
    /// `mask` matches `src` in size; the write is clipped to `dst`.
    fn copy_masked(
        &self,
        src: &RasterBuffer,
        mask: &RasterBuffer,
        dst: &mut RasterBuffer,
        x: u32,
        y: u32,
    ) -> Result<()>;

    /// Saturating per-byte sum of two same-shaped buffers.
    fn add(&self, a: &RasterBuffer, b: &RasterBuffer) -> Result<RasterBuffer>;
}

/// [`RasterOps`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRasterOps {
    /// Filter used by [`RasterOps::resize`].
    pub filter: FilterType,
}

impl ImageRasterOps {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }
}

fn ensure_same_shape(a: &RasterBuffer, b: &RasterBuffer) -> Result<()> {
    if a.width != b.width || a.height != b.height {
        return Err(TileError::DegenerateGeometry(format!(
            "shape mismatch: {}x{} vs {}x{}",
            a.width, a.height, b.width, b.height
        )));
    }
    Ok(())
}

/// Snap a coordinate within `1e-6` of an integer onto it, so quarter turns
/// sample single pixels despite trigonometric noise.
#[inline]
fn snap_to_pixel(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < 1e-6 {
        r
    } else {
        v
    }
}

/// ITU-R BT.601 luma, integer weights summing to 1000.
#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}

fn map_single(src: &RasterBuffer, f: impl Fn(u8) -> u8) -> RasterBuffer {
    RasterBuffer {
        width: src.width,
        height: src.height,
        channels: Channels::Gray,
        pixels: src.pixels.iter().map(|&v| f(v)).collect(),
    }
}

impl RasterOps for ImageRasterOps {
    fn resize(&self, src: &RasterBuffer, width: u32, height: u32) -> Result<RasterBuffer> {
        if width == 0 || height == 0 {
            return Err(TileError::DegenerateGeometry(format!(
                "cannot resize to {}x{}",
                width, height
            )));
        }

        // Fast path: if dimensions match, just clone
        if src.width == width && src.height == height {
            return Ok(src.clone());
        }

        let img = src.to_dynamic().ok_or(TileError::InvalidPixelData {
            expected: src.pixel_count() * src.channels.count(),
            actual: src.byte_size(),
        })?;
        let resized = img.resize_exact(width, height, self.filter.to_image_filter());

        Ok(RasterBuffer::from_dynamic(resized))
    }

    fn warp_affine(
        &self,
        src: &RasterBuffer,
        transform: &AffineTransform,
        width: u32,
        height: u32,
    ) -> Result<RasterBuffer> {
        let inverse = transform.invert().ok_or_else(|| {
            TileError::DegenerateGeometry("affine transform is not invertible".to_string())
        })?;

        let n = src.channels.count();
        let (sw, sh) = (src.width as i64, src.height as i64);
        let mut out = RasterBuffer::zeros(width, height, src.channels);
        let at = |px: i64, py: i64, c: usize| -> f64 {
            src.pixels[(py as usize * sw as usize + px as usize) * n + c] as f64
        };

        for dst_y in 0..height {
            for dst_x in 0..width {
                let (sx, sy) = inverse.apply(dst_x as f64, dst_y as f64);
                if !sx.is_finite() || !sy.is_finite() {
                    continue;
                }
                let (sx, sy) = (snap_to_pixel(sx), snap_to_pixel(sy));
                let x0 = sx.floor() as i64;
                let y0 = sy.floor() as i64;
                let fx = sx - x0 as f64;
                let fy = sy - y0 as f64;

                // Both neighbours are needed unless the sample sits exactly on a column/row.
                let x1 = if fx > 0.0 { x0 + 1 } else { x0 };
                let y1 = if fy > 0.0 { y0 + 1 } else { y0 };
                if x0 < 0 || y0 < 0 || x1 >= sw || y1 >= sh {
                    continue;
                }

                let pixel = out.pixel_mut(dst_x, dst_y);
                for (c, value) in pixel.iter_mut().enumerate() {
                    let v = at(x0, y0, c) * (1.0 - fx) * (1.0 - fy)
                        + at(x1, y0, c) * fx * (1.0 - fy)
                        + at(x0, y1, c) * (1.0 - fx) * fy
                        + at(x1, y1, c) * fx * fy;
                    *value = v.clamp(0.0, 255.0).round() as u8;
                }
            }
        }

        Ok(out)
    }

    fn convert(&self, src: &RasterBuffer, channels: Channels) -> RasterBuffer {
        if src.channels == channels {
            return src.clone();
        }

        let mut pixels = Vec::with_capacity(src.pixel_count() * channels.count());
        for px in src.pixels.chunks_exact(src.channels.count()) {
            let (gray, r, g, b, a) = match src.channels {
                Channels::Gray => (px[0], px[0], px[0], px[0], 255),
                Channels::GrayAlpha => (px[0], px[0], px[0], px[0], px[1]),
                Channels::Rgb => (luma(px[0], px[1], px[2]), px[0], px[1], px[2], 255),
                Channels::Rgba => (luma(px[0], px[1], px[2]), px[0], px[1], px[2], px[3]),
            };
            match channels {
                Channels::Gray => pixels.push(gray),
                Channels::GrayAlpha => pixels.extend_from_slice(&[gray, a]),
                Channels::Rgb => pixels.extend_from_slice(&[r, g, b]),
                Channels::Rgba => pixels.extend_from_slice(&[r, g, b, a]),
            }
        }

        RasterBuffer {
            width: src.width,
            height: src.height,
            channels,
            pixels,
        }
    }

    fn extract_channel(&self, src: &RasterBuffer, channel: usize) -> Result<RasterBuffer> {
        let n = src.channels.count();
        if channel >= n {
            return Err(TileError::DegenerateGeometry(format!(
                "channel {} out of range for {:?}",
                channel, src.channels
            )));
        }
        Ok(RasterBuffer {
            width: src.width,
            height: src.height,
            channels: Channels::Gray,
            pixels: src.pixels.iter().skip(channel).step_by(n).copied().collect(),
        })
    }

    fn compare_mask(&self, src: &RasterBuffer, op: CompareOp, value: u8) -> RasterBuffer {
        map_single(src, |v| if op.test(v, value) { 255 } else { 0 })
    }

    fn in_range_mask(&self, src: &RasterBuffer, low: u8, high: u8) -> RasterBuffer {
        map_single(src, |v| if (low..=high).contains(&v) { 255 } else { 0 })
    }

    fn bitwise_not(&self, src: &RasterBuffer) -> RasterBuffer {
        RasterBuffer {
            width: src.width,
            height: src.height,
            channels: src.channels,
            pixels: src.pixels.iter().map(|v| !v).collect(),
        }
    }

    fn copy_masked(
        &self,
        src: &RasterBuffer,
        mask: &RasterBuffer,
        dst: &mut RasterBuffer,
        x: u32,
        y: u32,
    ) -> Result<()> {
        ensure_same_shape(src, mask)?;
        if src.channels != dst.channels {
            return Err(TileError::DegenerateGeometry(format!(
                "cannot copy {:?} pixels into {:?} buffer",
                src.channels, dst.channels
            )));
        }

        let n = src.channels.count();
        let cols = src.width.min(dst.width.saturating_sub(x));
        let rows = src.height.min(dst.height.saturating_sub(y));
        for row in 0..rows {
            for col in 0..cols {
                let m = (row * src.width + col) as usize;
                if mask.pixels[m] == 0 {
                    continue;
                }
                let s = m * n;
                let d = ((y + row) as usize * dst.width as usize + (x + col) as usize) * n;
                dst.pixels[d..d + n].copy_from_slice(&src.pixels[s..s + n]);
            }
        }
        Ok(())
    }

    fn add(&self, a: &RasterBuffer, b: &RasterBuffer) -> Result<RasterBuffer> {
        ensure_same_shape(a, b)?;
        if a.channels != b.channels {
            return Err(TileError::DegenerateGeometry(format!(
                "cannot add {:?} and {:?} buffers",
                a.channels, b.channels
            )));
        }
        Ok(RasterBuffer {
            width: a.width,
            height: a.height,
            channels: a.channels,
            pixels: a
                .pixels
                .iter()
                .zip(&b.pixels)
                .map(|(&l, &r)| l.saturating_add(r))
                .collect(),
        })
    }
}
