//! Multi-resolution tile pyramids for progressive map viewing.
//!
//! # Output Layout
//!
//! ```text
//! {output_parent}/{map_name}/
//!   {level}_{row}_{col}.png   one per tile, level 1 = full resolution
//!   thumb.png                 first level with both edges <= threshold
//!   info.json                 PyramidManifest
//! ```
//!
//! Each level is resized from the source, never from the previous level.

mod level;
mod manifest;

pub use level::{plan_levels, LevelSpec};
pub use manifest::{manifest_path, PyramidManifest, TileManifestEntry};

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::PyramidConfig;
use crate::error::{Result, TileError};
use crate::geometry::tile_grid;
use crate::raster::{load_png, save_png, ImageRasterOps, LoadMode, RasterBuffer, RasterOps};

const MANIFEST_FILE: &str = "info.json";
const THUMBNAIL_FILE: &str = "thumb.png";

/// Slices a map into a tile pyramid and writes its manifest.
#[derive(Debug, Clone)]
pub struct PyramidBuilder<O = ImageRasterOps> {
    ops: O,
    config: PyramidConfig,
}

impl PyramidBuilder<ImageRasterOps> {
    pub fn new(config: PyramidConfig) -> Self {
        Self::with_ops(ImageRasterOps::default(), config)
    }
}

impl<O: RasterOps> PyramidBuilder<O> {
    pub fn with_ops(ops: O, config: PyramidConfig) -> Self {
        Self { ops, config }
    }

    pub fn config(&self) -> &PyramidConfig {
        &self.config
    }

    /// Directory receiving the tiles of `map_name`.
    pub fn output_dir(output_parent: &Path, map_name: &str) -> PathBuf {
        output_parent.join(map_name)
    }

    /// Decode `image_path` as grayscale and build its pyramid under
    /// `{output_parent}/{map_name}`.
    ///
    /// # Errors
    ///
    /// Returns `TileError::InputUnreadable` if the source cannot be decoded,
    /// `TileError::Io` if the output directory or a file cannot be written.
    /// Tiles already written before a failure are left in place.
    pub fn build_file(
        &self,
        image_path: &Path,
        map_name: &str,
        checksum: &str,
        output_parent: &Path,
    ) -> Result<PyramidManifest> {
        let source = load_png(image_path, LoadMode::Grayscale)?;
        self.build(&source, map_name, checksum, output_parent)
    }

    /// Build the pyramid of an in-memory raster.
    pub fn build(
        &self,
        source: &RasterBuffer,
        map_name: &str,
        checksum: &str,
        output_parent: &Path,
    ) -> Result<PyramidManifest> {
        let tile_size = self.config.tile_size;
        if tile_size == 0 {
            return Err(TileError::DegenerateGeometry("tile size must be non-zero".to_string()));
        }

        let output_dir = Self::output_dir(output_parent, map_name);
        std::fs::create_dir_all(&output_dir).map_err(|e| TileError::io(&output_dir, e))?;

        info!(
            width = source.width,
            height = source.height,
            tile_size,
            ratio = self.config.downscale_ratio,
            output = %output_dir.display(),
            "Building tile pyramid"
        );

        let levels = plan_levels(
            source.width,
            source.height,
            tile_size,
            self.config.downscale_ratio,
        );
        if levels.is_empty() {
            warn!(
                width = source.width,
                height = source.height,
                tile_size,
                "Source is smaller than one tile; no tiles emitted"
            );
        } else if let Some(last) = levels.last().filter(|l| !l.fits_in_tile(tile_size)) {
            warn!(
                level = last.level,
                ratio = self.config.downscale_ratio,
                "Downscale stopped before reaching a single tile"
            );
        }

        let mut manifest = PyramidManifest::new(map_name, checksum);
        for spec in &levels {
            let image = if spec.level == 1 {
                Cow::Borrowed(source)
            } else {
                Cow::Owned(self.ops.resize(source, spec.width, spec.height)?)
            };
            self.emit_level(spec, &image, &output_dir, &mut manifest)?;
        }

        let manifest_file = output_dir.join(MANIFEST_FILE);
        manifest.write(&manifest_file)?;
        info!(
            tiles = manifest.tiles.len(),
            levels = levels.len(),
            manifest = %manifest_file.display(),
            "Tile pyramid written"
        );
        Ok(manifest)
    }

    fn emit_level(
        &self,
        spec: &LevelSpec,
        image: &RasterBuffer,
        output_dir: &Path,
        manifest: &mut PyramidManifest,
    ) -> Result<()> {
        let tile_size = self.config.tile_size;
        let prefix = self.config.path_strip_prefix.as_str();
        debug!(
            level = spec.level,
            ratio = spec.ratio,
            width = spec.width,
            height = spec.height,
            "Emitting level"
        );

        let threshold = self.config.thumbnail_threshold;
        if manifest.map_thumb_path.is_empty() && spec.width <= threshold && spec.height <= threshold
        {
            let thumb = output_dir.join(THUMBNAIL_FILE);
            save_png(image, &thumb)?;
            manifest.map_thumb_path = manifest_path(&thumb, prefix);
            manifest.map_thumb_width = spec.width;
            manifest.map_thumb_height = spec.height;
        }

        if spec.fits_in_tile(tile_size) {
            let path = output_dir.join(format!("{}_0_0.png", spec.level));
            save_png(image, &path)?;
            manifest.tiles.push(TileManifestEntry {
                path: manifest_path(&path, prefix),
                x: 0,
                y: 0,
                resolution: spec.ratio,
                tile_size,
            });
            return Ok(());
        }

        for cell in tile_grid(spec.width, spec.height, tile_size, 0) {
            let path = output_dir.join(format!("{}_{}_{}.png", spec.level, cell.row, cell.col));
            save_png(&image.region(cell.rect), &path)?;
            manifest.tiles.push(TileManifestEntry {
                path: manifest_path(&path, prefix),
                x: cell.col,
                y: cell.row,
                resolution: spec.ratio,
                tile_size,
            });
        }
        Ok(())
    }
}
