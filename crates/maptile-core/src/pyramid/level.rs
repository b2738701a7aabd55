//! Resolution levels of a tile pyramid.

use crate::geometry::{tile_count, truncate};

/// One resolution stage. Level 1 is the full-resolution source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSpec {
    pub level: u32,
    /// Scale relative to the source, `downscale_ratio^(level - 1)`.
    pub ratio: f64,
    pub width: u32,
    pub height: u32,
}

impl LevelSpec {
    /// Level 1 at ratio 1.0.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            level: 1,
            ratio: 1.0,
            width,
            height,
        }
    }

    /// True when the whole level fits inside one tile.
    pub fn fits_in_tile(&self, tile_size: u32) -> bool {
        self.width <= tile_size && self.height <= tile_size
    }

    /// Number of tiles this level is cut into.
    pub fn tile_count(&self, tile_size: u32) -> u32 {
        if self.fits_in_tile(tile_size) {
            1
        } else {
            tile_count(self.width, tile_size) * tile_count(self.height, tile_size)
        }
    }

    /// The following level, derived from the source size rather than from
    /// this level's size so resampling error does not compound.
    ///
    /// Returns `None` if the level collapses to zero in either axis or does
    /// not shrink at all.
    pub fn next(&self, source_size: (u32, u32), downscale_ratio: f64) -> Option<LevelSpec> {
        let ratio = downscale_ratio.powi(self.level as i32);
        if !ratio.is_finite() {
            return None;
        }
        let width = truncate(source_size.0 as f64 * ratio);
        let height = truncate(source_size.1 as f64 * ratio);
        if width == 0 || height == 0 {
            return None;
        }
        if width >= self.width && height >= self.height {
            return None;
        }
        Some(LevelSpec {
            level: self.level + 1,
            ratio,
            width,
            height,
        })
    }
}

/// Every level a pyramid build visits, in order.
///
/// Levels continue while the previous level spans at least one full tile in
/// some axis. The last level is the first that fits in a single tile, unless
/// the sequence stops earlier on a collapsing or non-shrinking level. A
/// source smaller than one tile in both axes yields no levels.
pub fn plan_levels(width: u32, height: u32, tile_size: u32, downscale_ratio: f64) -> Vec<LevelSpec> {
    let mut levels = Vec::new();
    if tile_size == 0 || width == 0 || height == 0 {
        return levels;
    }
    if width < tile_size && height < tile_size {
        return levels;
    }

    let mut current = Some(LevelSpec::full(width, height));
    while let Some(spec) = current {
        levels.push(spec);
        if spec.fits_in_tile(tile_size) {
            break;
        }
        current = spec.next((width, height), downscale_ratio);
    }
    levels
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the level count is bounded by log(tile / max_edge) / log(ratio).
        #[test]
        fn prop_level_count_bounded(
            width in 1u32..=100_000,
            height in 1u32..=100_000,
            tile_size in 16u32..=1024,
            ratio in 0.05f64..0.95,
        ) {
            let levels = plan_levels(width, height, tile_size, ratio);
            let max_edge = width.max(height) as f64;
            let bound = if max_edge <= tile_size as f64 {
                1.0
            } else {
                ((tile_size as f64 / max_edge).ln() / ratio.ln()).ceil() + 1.0
            };
            prop_assert!(levels.len() as f64 <= bound, "{} levels, bound {}", levels.len(), bound);
        }

        /// Property: levels shrink monotonically and stay within the source.
        #[test]
        fn prop_levels_shrink(
            width in 1u32..=50_000,
            height in 1u32..=50_000,
            tile_size in 16u32..=1024,
            ratio in 0.05f64..0.95,
        ) {
            let levels = plan_levels(width, height, tile_size, ratio);
            for pair in levels.windows(2) {
                prop_assert!(pair[1].width <= pair[0].width);
                prop_assert!(pair[1].height <= pair[0].height);
                prop_assert!(pair[1].width > 0 && pair[1].height > 0);
                prop_assert_eq!(pair[1].level, pair[0].level + 1);
            }
        }
    }
}
