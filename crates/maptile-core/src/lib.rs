//! Maptile Core - Large raster map processing
//!
//! This crate provides the pipelines behind the `maptile` tool:
//! tile-by-tile rotation of full-resolution grayscale maps, multi-resolution
//! tile pyramids with a JSON manifest, and alpha-masked merging of map
//! updates into a base map. Every pipeline works on bounded regions so peak
//! memory stays near one tile's worth of intermediates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod merge;
pub mod pyramid;
pub mod raster;
pub mod rotate;

pub use config::{MergeConfig, PyramidConfig, RotateConfig};
pub use error::{Result, TileError};
pub use geometry::{compute_rotated_bounds, tile_grid, AffineTransform, GridCell, TileRect};
pub use merge::{split_image_by_size, MergeStats, SliceInfo, TileMerger};
pub use pyramid::{PyramidBuilder, PyramidManifest, TileManifestEntry};
pub use raster::{Channels, ImageRasterOps, RasterBuffer, RasterOps};
pub use rotate::{Placement, RotationEngine};
