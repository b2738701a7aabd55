//! Splitting a raster into coarse tiles on disk.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TileError};
use crate::geometry::tile_grid;
use crate::raster::{load_png, save_png, LoadMode, RasterBuffer};

/// A tile written by [`split_image_by_size`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceInfo {
    /// Offset of the tile in the split image.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
}

/// Cut `image` into `size` tiles written as `{col}_{row}.png` under
/// `output_dir`, which is created if missing. Tiles keep the image's pixel
/// layout, alpha included.
pub fn split_image_by_size(
    image: &RasterBuffer,
    size: u32,
    output_dir: &Path,
) -> Result<Vec<SliceInfo>> {
    if size == 0 {
        return Err(TileError::DegenerateGeometry("split size must be non-zero".to_string()));
    }
    std::fs::create_dir_all(output_dir).map_err(|e| TileError::io(output_dir, e))?;

    let mut slices = Vec::new();
    for cell in tile_grid(image.width, image.height, size, 0) {
        let path = output_dir.join(format!("{}_{}.png", cell.col, cell.row));
        save_png(&image.region(cell.rect), &path)?;
        debug!(path = %path.display(), x = cell.rect.x, y = cell.rect.y, "Wrote slice");
        slices.push(SliceInfo {
            x: cell.rect.x,
            y: cell.rect.y,
            width: cell.rect.width,
            height: cell.rect.height,
            path,
        });
    }
    Ok(slices)
}

/// Decode `image_path` unchanged and split it with [`split_image_by_size`].
pub fn split_file_by_size(image_path: &Path, size: u32, output_dir: &Path) -> Result<Vec<SliceInfo>> {
    let image = load_png(image_path, LoadMode::Unchanged)?;
    split_image_by_size(&image, size, output_dir)
}
