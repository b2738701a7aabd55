//! Merging an updated map into a base map.
//!
//! The updated image carries an alpha channel marking where it has new
//! content. It is split into coarse tiles on disk, then each coarse tile is
//! walked in smaller blocks so only one block's intermediates are alive at a
//! time. Every block is composited onto the gray base with [`blend_block`],
//! and the base is written once at the end.
//!
//! Coarse tiles are left in the intermediate directory after the merge.

mod blend;
mod overlay;
mod split;

pub use blend::{blend_block, mid_tone_mask, override_mid_tones, partition_masks, BlockMasks};
pub use overlay::overlay_buffers;
pub use split::{split_file_by_size, split_image_by_size, SliceInfo};

use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::MergeConfig;
use crate::error::{Result, TileError};
use crate::geometry::{tile_grid, TileRect};
use crate::raster::{
    load_png, save_png, Channels, ImageRasterOps, LoadMode, RasterBuffer, RasterOps,
};

/// Block counters reported by a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Blocks composited onto the base.
    pub blocks_merged: usize,
    /// Blocks without alpha content, or lying wholly outside the base.
    pub blocks_skipped: usize,
    /// Blocks cut down because they overhang the base.
    pub blocks_clipped: usize,
}

impl AddAssign for MergeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.blocks_merged += rhs.blocks_merged;
        self.blocks_skipped += rhs.blocks_skipped;
        self.blocks_clipped += rhs.blocks_clipped;
    }
}

/// Composites updated map content into a base map.
#[derive(Debug, Clone)]
pub struct TileMerger<O = ImageRasterOps> {
    ops: O,
    config: MergeConfig,
}

impl TileMerger<ImageRasterOps> {
    pub fn new(config: MergeConfig) -> Self {
        Self::with_ops(ImageRasterOps::default(), config)
    }
}

impl<O: RasterOps> TileMerger<O> {
    pub fn with_ops(ops: O, config: MergeConfig) -> Self {
        Self { ops, config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Directory next to `updated_path` that receives the coarse tiles.
    pub fn intermediate_dir(&self, updated_path: &Path) -> PathBuf {
        updated_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&self.config.intermediate_dir)
    }

    /// Merge the image at `updated_path` into the base at `base_path` and
    /// write the gray result to `output_path`.
    ///
    /// # Errors
    ///
    /// Returns `TileError::InputUnreadable` if either input cannot be
    /// decoded. The base is decoded first, so a bad base fails before any
    /// intermediate tile is written.
    pub fn merge(
        &self,
        base_path: &Path,
        updated_path: &Path,
        output_path: &Path,
    ) -> Result<MergeStats> {
        self.check_sizes()?;
        let mut base = load_png(base_path, LoadMode::Grayscale)?;

        let intermediate = self.intermediate_dir(updated_path);
        let slices = split_file_by_size(updated_path, self.config.coarse_tile_size, &intermediate)?;
        info!(
            base = %base_path.display(),
            updated = %updated_path.display(),
            width = base.width,
            height = base.height,
            coarse_tiles = slices.len(),
            "Merging map update"
        );

        let mut stats = MergeStats::default();
        for slice in &slices {
            let tile = load_png(&slice.path, LoadMode::Unchanged)?;
            stats += self.merge_tile(&mut base, &tile, slice.x, slice.y)?;
        }

        save_png(&base, output_path)?;
        info!(
            output = %output_path.display(),
            merged = stats.blocks_merged,
            skipped = stats.blocks_skipped,
            clipped = stats.blocks_clipped,
            "Merge written"
        );
        Ok(stats)
    }

    /// Merge an in-memory update into a gray base, block by block.
    pub fn merge_buffers(&self, base: &mut RasterBuffer, updated: &RasterBuffer) -> Result<MergeStats> {
        self.check_sizes()?;
        if base.channels != Channels::Gray {
            return Err(TileError::DegenerateGeometry(format!(
                "merge base must be gray, got {:?}",
                base.channels
            )));
        }
        self.merge_tile(base, updated, 0, 0)
    }

    /// Composite the blocks of `tile`, located at `(origin_x, origin_y)` in
    /// base coordinates.
    fn merge_tile(
        &self,
        base: &mut RasterBuffer,
        tile: &RasterBuffer,
        origin_x: u32,
        origin_y: u32,
    ) -> Result<MergeStats> {
        let mut stats = MergeStats::default();
        for cell in tile_grid(tile.width, tile.height, self.config.block_size, 0) {
            let wanted = TileRect::new(
                origin_x.saturating_add(cell.rect.x),
                origin_y.saturating_add(cell.rect.y),
                cell.rect.width,
                cell.rect.height,
            );
            let target = wanted.intersect(&base.bounds());
            if target.is_empty() {
                warn!(x = wanted.x, y = wanted.y, "Block lies outside the base; skipped");
                stats.blocks_skipped += 1;
                continue;
            }
            if target != wanted {
                warn!(
                    x = wanted.x,
                    y = wanted.y,
                    width = wanted.width,
                    height = wanted.height,
                    "Block overhangs the base; clipped"
                );
                stats.blocks_clipped += 1;
            }

            let block = tile.region(TileRect::new(cell.rect.x, cell.rect.y, target.width, target.height));
            let base_block = base.region(target);
            match blend_block(&self.ops, &block, &base_block, &self.config)? {
                Some(merged) => {
                    base.paste(&merged, target.x, target.y)?;
                    stats.blocks_merged += 1;
                }
                None => {
                    debug!(x = target.x, y = target.y, "Block has no content");
                    stats.blocks_skipped += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Alpha-over `updated_path` onto `base_path` at full color and write
    /// the RGBA result to `output_path`.
    pub fn overlay(&self, base_path: &Path, updated_path: &Path, output_path: &Path) -> Result<()> {
        let base = load_png(base_path, LoadMode::Unchanged)?;
        let updated = load_png(updated_path, LoadMode::Unchanged)?;
        let composed = overlay_buffers(&base, &updated)?;
        save_png(&composed, output_path)?;
        info!(output = %output_path.display(), "Overlay written");
        Ok(())
    }

    fn check_sizes(&self) -> Result<()> {
        if self.config.coarse_tile_size == 0 || self.config.block_size == 0 {
            return Err(TileError::DegenerateGeometry(
                "merge tile and block sizes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merger(coarse: u32, block: u32) -> TileMerger {
        TileMerger::new(MergeConfig {
            coarse_tile_size: coarse,
            block_size: block,
            ..Default::default()
        })
    }

    fn ramp(width: u32, height: u32) -> RasterBuffer {
        let pixels = (0..width * height).map(|i| (i * 7 % 256) as u8).collect();
        RasterBuffer::new(width, height, Channels::Gray, pixels).unwrap()
    }

    /// Gray+alpha update whose left `split` columns are opaque `value`.
    fn left_opaque(width: u32, height: u32, split: u32, value: u8) -> RasterBuffer {
        let mut pixels = Vec::new();
        for _ in 0..height {
            for x in 0..width {
                if x < split {
                    pixels.extend_from_slice(&[value, 255]);
                } else {
                    pixels.extend_from_slice(&[value, 0]);
                }
            }
        }
        RasterBuffer::new(width, height, Channels::GrayAlpha, pixels).unwrap()
    }

    #[test]
    fn test_merge_buffers_across_blocks() {
        let mut base = ramp(7, 5);
        let original = base.clone();
        let stats = merger(5000, 3)
            .merge_buffers(&mut base, &left_opaque(7, 5, 4, 20))
            .unwrap();

        for y in 0..5 {
            for x in 0..7 {
                let expected = if x < 4 { 20 } else { original.pixel(x, y)[0] };
                assert_eq!(base.pixel(x, y)[0], expected, "({}, {})", x, y);
            }
        }
        // 3 x 2 blocks; the rightmost column of blocks starts at x = 6.
        assert_eq!(stats.blocks_merged, 4);
        assert_eq!(stats.blocks_skipped, 2);
    }

    #[test]
    fn test_mid_tones_become_neutral() {
        let mut base = RasterBuffer::filled(4, 4, Channels::Gray, 0);
        merger(5000, 2)
            .merge_buffers(&mut base, &left_opaque(4, 4, 4, 150))
            .unwrap();
        assert!(base.pixels.iter().all(|&v| v == 128));
    }

    #[test]
    fn test_overhanging_update_is_clipped() {
        let mut base = RasterBuffer::filled(5, 3, Channels::Gray, 9);
        let stats = merger(5000, 4)
            .merge_buffers(&mut base, &left_opaque(8, 8, 8, 255))
            .unwrap();
        assert!(base.pixels.iter().all(|&v| v == 255));
        assert_eq!(stats.blocks_clipped, 2);
        assert_eq!(stats.blocks_skipped, 2);
    }

    #[test]
    fn test_base_must_be_gray() {
        let mut base = RasterBuffer::filled(2, 2, Channels::Rgb, 0);
        let result = merger(10, 10).merge_buffers(&mut base, &left_opaque(2, 2, 1, 0));
        assert!(matches!(result, Err(TileError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let mut base = RasterBuffer::filled(2, 2, Channels::Gray, 0);
        let result = merger(10, 0).merge_buffers(&mut base, &left_opaque(2, 2, 1, 0));
        assert!(matches!(result, Err(TileError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_merge_files_uses_coarse_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let base_path = dir.path().join("base.png");
        let updated_path = dir.path().join("update").join("new.png");
        let output_path = dir.path().join("merged.png");
        std::fs::create_dir_all(updated_path.parent().unwrap()).unwrap();

        let base = ramp(9, 6);
        save_png(&base, &base_path).unwrap();
        save_png(&left_opaque(9, 6, 5, 0), &updated_path).unwrap();

        let merger = merger(4, 2);
        let stats = merger.merge(&base_path, &updated_path, &output_path).unwrap();
        assert!(stats.blocks_merged > 0);

        let merged = load_png(&output_path, LoadMode::Unchanged).unwrap();
        assert_eq!(merged.channels, Channels::Gray);
        for y in 0..6 {
            for x in 0..9 {
                let expected = if x < 5 { 0 } else { base.pixel(x, y)[0] };
                assert_eq!(merged.pixel(x, y)[0], expected, "({}, {})", x, y);
            }
        }

        let intermediate = merger.intermediate_dir(&updated_path);
        assert_eq!(intermediate, dir.path().join("update").join("subImages"));
        assert!(intermediate.join("2_1.png").exists());
    }

    #[test]
    fn test_unreadable_base_fails_before_split() {
        let dir = tempfile::tempdir().unwrap();
        let updated_path = dir.path().join("new.png");
        save_png(&left_opaque(4, 4, 2, 0), &updated_path).unwrap();

        let merger = merger(2, 2);
        let result = merger.merge(&dir.path().join("missing.png"), &updated_path, &dir.path().join("out.png"));
        assert!(matches!(result, Err(TileError::InputUnreadable { .. })));
        assert!(!merger.intermediate_dir(&updated_path).exists());
    }

    #[test]
    fn test_overlay_files() {
        let dir = tempfile::tempdir().unwrap();
        let base_path = dir.path().join("base.png");
        let updated_path = dir.path().join("new.png");
        let output_path = dir.path().join("out.png");
        save_png(&RasterBuffer::filled(3, 2, Channels::Gray, 0), &base_path).unwrap();
        save_png(&left_opaque(3, 2, 1, 255), &updated_path).unwrap();

        merger(10, 10).overlay(&base_path, &updated_path, &output_path).unwrap();

        let out = load_png(&output_path, LoadMode::Unchanged).unwrap();
        assert_eq!(out.channels, Channels::Rgba);
        assert_eq!(out.pixel(0, 1), &[255, 255, 255, 255]);
        assert_eq!(out.pixel(2, 1), &[0, 0, 0, 255]);
    }
}
