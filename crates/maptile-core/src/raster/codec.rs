//! PNG decoding and encoding.

use std::path::Path;

use image::{ExtendedColorType, ImageFormat, ImageReader};

use super::{Channels, RasterBuffer};
use crate::error::{Result, TileError};

/// How to interpret the decoded pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Collapse to a single luminance channel, dropping alpha.
    #[default]
    Grayscale,
    /// Keep the stored layout (gray, gray+alpha, RGB or RGBA).
    Unchanged,
}

/// Decode a raster file.
///
/// # Errors
///
/// Returns `TileError::InputUnreadable` if the file is missing, cannot be
/// decoded, or decodes to a zero-sized image.
pub fn load_png(path: &Path, mode: LoadMode) -> Result<RasterBuffer> {
    let img = ImageReader::open(path)
        .map_err(|e| TileError::unreadable(path, e))?
        .with_guessed_format()
        .map_err(|e| TileError::unreadable(path, e))?
        .decode()
        .map_err(|e| TileError::unreadable(path, e))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(TileError::unreadable(path, "image has no pixels"));
    }

    let img = match mode {
        LoadMode::Grayscale => image::DynamicImage::ImageLuma8(img.into_luma8()),
        LoadMode::Unchanged => img,
    };
    Ok(RasterBuffer::from_dynamic(img))
}

/// Encode a buffer as PNG at `path`. Parent directories must exist.
pub fn save_png(buffer: &RasterBuffer, path: &Path) -> Result<()> {
    if buffer.is_empty() {
        return Err(TileError::Encode {
            path: path.to_path_buf(),
            reason: format!("empty {}x{} buffer", buffer.width, buffer.height),
        });
    }

    let color = match buffer.channels {
        Channels::Gray => ExtendedColorType::L8,
        Channels::GrayAlpha => ExtendedColorType::La8,
        Channels::Rgb => ExtendedColorType::Rgb8,
        Channels::Rgba => ExtendedColorType::Rgba8,
    };

    image::save_buffer_with_format(
        path,
        &buffer.pixels,
        buffer.width,
        buffer.height,
        color,
        ImageFormat::Png,
    )
    .map_err(|e| match e {
        image::ImageError::IoError(source) => TileError::io(path, source),
        other => TileError::Encode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}
