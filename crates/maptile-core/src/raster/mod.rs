//! Raster buffers and the imaging primitives the pipelines call into.
//!
//! This module provides:
//! - [`RasterBuffer`], an owned 8-bit pixel grid with 1-4 channels
//! - [`RasterOps`], the capability trait for resize, affine warp, channel
//!   extraction, masking and compositing
//! - [`ImageRasterOps`], the implementation on top of the `image` crate
//! - PNG load/save helpers
//!
//! Buffers are plain owned values. Every intermediate created inside a tile
//! or block iteration is dropped at the end of that iteration.

mod codec;
mod ops;
mod types;

pub use codec::{load_png, save_png, LoadMode};
pub use ops::{CompareOp, ImageRasterOps, RasterOps};
pub use types::{Channels, FilterType, RasterBuffer};
