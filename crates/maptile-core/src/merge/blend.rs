//! Per-block masked compositing.
//!
//! For one block of the updated image and the matching block of the base:
//!
//! ```text
//! foreground = alpha > 0   -> updated gray, mid-tones forced to neutral
//! background = alpha == 0  -> base gray
//! merged     = (updated & foreground) + (base & background)
//! ```
//!
//! The two masks partition the block, so the sum never double-counts.

use crate::config::MergeConfig;
use crate::error::Result;
use crate::raster::{Channels, CompareOp, RasterBuffer, RasterOps};

/// Disjoint foreground/background split of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMasks {
    /// `255` where the updated image has content.
    pub foreground: RasterBuffer,
    /// `255` where the base image shows through.
    pub background: RasterBuffer,
}

/// Split a block by its alpha channel.
pub fn partition_masks<O: RasterOps + ?Sized>(ops: &O, alpha: &RasterBuffer) -> BlockMasks {
    let foreground = ops.compare_mask(alpha, CompareOp::Gt, 0);
    let inverted = ops.bitwise_not(alpha);
    let background = ops.compare_mask(&inverted, CompareOp::Gt, 254);
    BlockMasks {
        foreground,
        background,
    }
}

/// `255` where a gray value lies inside the configured mid-tone band.
pub fn mid_tone_mask<O: RasterOps + ?Sized>(
    ops: &O,
    gray: &RasterBuffer,
    config: &MergeConfig,
) -> RasterBuffer {
    ops.in_range_mask(gray, config.mid_tone_low, config.mid_tone_high)
}

/// Force gray values inside the mid-tone band to the neutral value.
pub fn override_mid_tones<O: RasterOps + ?Sized>(
    ops: &O,
    mut gray: RasterBuffer,
    config: &MergeConfig,
) -> Result<RasterBuffer> {
    let band = mid_tone_mask(ops, &gray, config);
    let neutral = RasterBuffer::filled(gray.width, gray.height, Channels::Gray, config.neutral_gray);
    ops.copy_masked(&neutral, &band, &mut gray, 0, 0)?;
    Ok(gray)
}

/// Composite one updated block over the matching gray base block.
///
/// Returns `None` when the block contributes nothing: it has no alpha
/// channel, or its alpha is zero everywhere.
pub fn blend_block<O: RasterOps + ?Sized>(
    ops: &O,
    updated: &RasterBuffer,
    base: &RasterBuffer,
    config: &MergeConfig,
) -> Result<Option<RasterBuffer>> {
    let Some(alpha_index) = updated.channels.alpha_index() else {
        return Ok(None);
    };
    let alpha = ops.extract_channel(updated, alpha_index)?;
    if alpha.min_max() == (0, 0) {
        return Ok(None);
    }

    let content = override_mid_tones(ops, ops.convert(updated, Channels::Gray), config)?;
    let masks = partition_masks(ops, &alpha);
    drop(alpha);

    let (w, h) = (updated.width, updated.height);
    let mut foreground = RasterBuffer::zeros(w, h, Channels::Gray);
    ops.copy_masked(&content, &masks.foreground, &mut foreground, 0, 0)?;
    drop(content);

    let mut background = RasterBuffer::zeros(w, h, Channels::Gray);
    ops.copy_masked(base, &masks.background, &mut background, 0, 0)?;

    Ok(Some(ops.add(&foreground, &background)?))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::raster::ImageRasterOps;
    use proptest::prelude::*;

    proptest! {
        /// Property: every pixel is selected by exactly one mask.
        #[test]
        fn prop_masks_are_disjoint_and_complete(alpha in prop::collection::vec(any::<u8>(), 1..512)) {
            let ops = ImageRasterOps::default();
            let len = alpha.len() as u32;
            let alpha = RasterBuffer::new(len, 1, Channels::Gray, alpha).unwrap();
            let masks = partition_masks(&ops, &alpha);

            for i in 0..alpha.pixels.len() {
                let fg = masks.foreground.pixels[i] != 0;
                let bg = masks.background.pixels[i] != 0;
                prop_assert!(fg ^ bg, "pixel {} alpha {}", i, alpha.pixels[i]);
                prop_assert_eq!(fg, alpha.pixels[i] > 0);
            }
        }

        /// Property: merged values come from exactly one of the two inputs.
        #[test]
        fn prop_merged_value_has_single_source(
            pixels in prop::collection::vec((any::<u8>(), any::<u8>(), any::<u8>()), 1..256),
        ) {
            let ops = ImageRasterOps::default();
            let config = MergeConfig::default();
            let len = pixels.len() as u32;
            let updated = RasterBuffer::new(
                len, 1, Channels::GrayAlpha,
                pixels.iter().flat_map(|&(g, a, _)| [g, a]).collect(),
            ).unwrap();
            let base = RasterBuffer::new(len, 1, Channels::Gray, pixels.iter().map(|p| p.2).collect()).unwrap();

            if let Some(merged) = blend_block(&ops, &updated, &base, &config).unwrap() {
                for (i, &(g, a, b)) in pixels.iter().enumerate() {
                    let expected = if a == 0 {
                        b
                    } else if (config.mid_tone_low..=config.mid_tone_high).contains(&g) {
                        config.neutral_gray
                    } else {
                        g
                    };
                    prop_assert_eq!(merged.pixels[i], expected);
                }
            } else {
                prop_assert!(pixels.iter().all(|p| p.1 == 0));
            }
        }
    }
}
