//! Tile-by-tile rotation of full-resolution maps.
//!
//! # Algorithm
//!
//! 1. Allocate a canvas sized to the rotated bounding box, filled with the
//!    neutral background value.
//! 2. Cut the source into `tile_size` tiles, each extended by a small margin
//!    on its right and bottom edges so rotated tiles overlap instead of
//!    leaving seams.
//! 3. Rotate every tile about its own center into its own bounding box, with
//!    transparent fill where the tile has no content.
//! 4. Place the tile so its center lands where the global rotation sends it,
//!    and copy the gray value wherever the rotated alpha is non-zero.
//!
//! Only one tile and its intermediates are alive at a time.

mod frame;

pub use frame::{Placement, RotationFrame};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::RotateConfig;
use crate::error::{Result, TileError};
use crate::geometry::{compute_rotated_bounds, tile_grid, GridCell};
use crate::raster::{
    load_png, save_png, Channels, CompareOp, ImageRasterOps, LoadMode, RasterBuffer, RasterOps,
};

/// Rotates grayscale maps tile by tile.
#[derive(Debug, Clone)]
pub struct RotationEngine<O = ImageRasterOps> {
    ops: O,
    config: RotateConfig,
}

impl RotationEngine<ImageRasterOps> {
    pub fn new(config: RotateConfig) -> Self {
        Self::with_ops(ImageRasterOps::default(), config)
    }
}

impl<O: RasterOps> RotationEngine<O> {
    pub fn with_ops(ops: O, config: RotateConfig) -> Self {
        Self { ops, config }
    }

    pub fn config(&self) -> &RotateConfig {
        &self.config
    }

    /// Rotate an in-memory raster. Non-gray input is converted to gray first.
    ///
    /// # Errors
    ///
    /// Returns `TileError::DegenerateGeometry` for an empty source or a zero
    /// tile size.
    pub fn rotate(&self, source: &RasterBuffer) -> Result<RasterBuffer> {
        if source.is_empty() {
            return Err(TileError::DegenerateGeometry(
                "cannot rotate an empty raster".to_string(),
            ));
        }
        if self.config.tile_size == 0 {
            return Err(TileError::DegenerateGeometry("tile size must be non-zero".to_string()));
        }

        let gray;
        let source = if source.channels == Channels::Gray {
            source
        } else {
            gray = self.ops.convert(source, Channels::Gray);
            &gray
        };

        let angle = self.config.angle_degrees;
        let (canvas_w, canvas_h) = compute_rotated_bounds(source.width, source.height, angle);
        info!(
            width = source.width,
            height = source.height,
            canvas_width = canvas_w,
            canvas_height = canvas_h,
            angle,
            "Rotating raster"
        );

        let mut canvas =
            RasterBuffer::filled(canvas_w, canvas_h, Channels::Gray, self.config.background);

        for cell in tile_grid(
            source.width,
            source.height,
            self.config.tile_size,
            self.config.tile_margin,
        ) {
            self.rotate_tile(source, &cell, &mut canvas)?;
        }

        Ok(canvas)
    }

    fn rotate_tile(
        &self,
        source: &RasterBuffer,
        cell: &GridCell,
        canvas: &mut RasterBuffer,
    ) -> Result<()> {
        let angle = self.config.angle_degrees;
        let frame = RotationFrame::new(
            cell,
            self.config.tile_size,
            (source.width, source.height),
            angle,
            self.config.placement,
        );

        let tile = self.ops.convert(&source.region(cell.rect), Channels::Rgba);
        let (rw, rh) = frame.rotated_size;
        let rotated = self.ops.warp_affine(&tile, &frame.transform(angle), rw, rh)?;
        drop(tile);

        let alpha = self.ops.extract_channel(&rotated, 3)?;
        let gray = self.ops.convert(&rotated, Channels::Gray);
        drop(rotated);

        let (x, y) = frame.placement((canvas.width, canvas.height), angle);
        debug!(
            row = cell.row,
            col = cell.col,
            x,
            y,
            rotated_width = rw,
            rotated_height = rh,
            "Placing rotated tile"
        );

        // Zero alpha keeps the background; anything else takes the tile's gray.
        let mask = self.ops.compare_mask(&alpha, CompareOp::Gt, 0);
        self.ops.copy_masked(&gray, &mask, canvas, x, y)
    }

    /// Rotate a PNG on disk and write the result next to it with a `.save`
    /// suffix before the extension. Returns the written path.
    ///
    /// # Errors
    ///
    /// Returns `TileError::InputUnreadable` if the source cannot be decoded;
    /// nothing is written in that case.
    pub fn rotate_file(&self, source_path: &Path) -> Result<PathBuf> {
        let source = load_png(source_path, LoadMode::Grayscale)?;
        let rotated = self.rotate(&source)?;
        drop(source);

        let output = rotated_output_path(source_path);
        save_png(&rotated, &output)?;
        info!(output = %output.display(), "Rotated raster written");
        Ok(output)
    }
}

/// `maps/floor.png` -> `maps/floor.save.png`.
pub fn rotated_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    source.with_file_name(format!("{}.save.{}", stem, ext))
}
