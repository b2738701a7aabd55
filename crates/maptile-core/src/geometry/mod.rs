//! Tile geometry: rectangle partitioning and rotation math.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, x grows right, y grows down
//! - Rotation angles are in degrees. [`compute_rotated_bounds`] ignores the
//!   sign; the rotation engine turns positive angles clockwise on screen,
//!   while [`AffineTransform::rotation`] follows the matrix convention and
//!   turns them counter-clockwise
//! - Tile grids are row-major; the last row and column are clipped, never padded

mod affine;

pub use affine::AffineTransform;

use serde::{Deserialize, Serialize};

/// Integer rectangle in the pixel space of one resolution level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Overlap of two rectangles. Disjoint rectangles yield an empty
    /// rectangle anchored at the clamped origin.
    pub fn intersect(&self, other: &TileRect) -> TileRect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right()).max(x);
        let bottom = self.bottom().min(other.bottom()).max(y);
        TileRect::new(x, y, right - x, bottom - y)
    }
}

/// One cell of a tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
    pub rect: TileRect,
}

/// Number of tiles of edge `tile_size` needed to cover `extent`.
#[inline]
pub fn tile_count(extent: u32, tile_size: u32) -> u32 {
    extent.div_ceil(tile_size)
}

/// Partition a `width x height` image into a row-major grid of tiles.
///
/// Each cell starts at `(col * tile_size, row * tile_size)` and spans
/// `tile_size + margin` pixels, clipped to the image. With `margin = 0`
/// the cells cover the image exactly once.
///
/// `tile_size` must be non-zero; a zero tile size yields no cells.
pub fn tile_grid(
    width: u32,
    height: u32,
    tile_size: u32,
    margin: u32,
) -> impl Iterator<Item = GridCell> {
    let (rows, cols) = if tile_size == 0 {
        (0, 0)
    } else {
        (tile_count(height, tile_size), tile_count(width, tile_size))
    };
    (0..rows).flat_map(move |row| {
        (0..cols).map(move |col| {
            let x = col * tile_size;
            let y = row * tile_size;
            let w = (tile_size + margin).min(width - x);
            let h = (tile_size + margin).min(height - y);
            GridCell {
                row,
                col,
                rect: TileRect::new(x, y, w, h),
            }
        })
    })
}

/// Compute the bounding box of a `width x height` rectangle rotated by
/// `angle_degrees`.
///
/// ```text
/// new_w = |w*cos| + |h*sin|
/// new_h = |w*sin| + |h*cos|
/// ```
///
/// Results are truncated toward zero. Exact multiples of 90° short-circuit
/// so that trigonometric rounding noise never changes the result.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let angle_normalized = angle_degrees % 360.0;
    let abs_angle = angle_normalized.abs();

    if abs_angle < 1e-9 || (abs_angle - 180.0).abs() < 1e-9 || (abs_angle - 360.0).abs() < 1e-9 {
        return (width, height);
    }
    if (abs_angle - 90.0).abs() < 1e-9 || (abs_angle - 270.0).abs() < 1e-9 {
        return (height, width);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();
    let (w, h) = (width as f64, height as f64);

    (truncate(w * cos + h * sin), truncate(w * sin + h * cos))
}

/// Truncate toward zero, tolerating floating-point dust just below an integer.
#[inline]
pub(crate) fn truncate(value: f64) -> u32 {
    (value + 1e-9).floor().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_count() {
        assert_eq!(tile_count(10000, 512), 20);
        assert_eq!(tile_count(8000, 512), 16);
        assert_eq!(tile_count(512, 512), 1);
        assert_eq!(tile_count(1, 512), 1);
        assert_eq!(tile_count(0, 512), 0);
    }

    #[test]
    fn test_grid_clips_last_row_and_column() {
        let cells: Vec<_> = tile_grid(250, 120, 100, 0).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[2].rect, TileRect::new(200, 0, 50, 100));
        assert_eq!(cells[5].rect, TileRect::new(200, 100, 50, 20));
        assert_eq!((cells[4].row, cells[4].col), (1, 1));
    }

    #[test]
    fn test_grid_with_margin() {
        let cells: Vec<_> = tile_grid(237, 153, 100, 2).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0].rect, TileRect::new(0, 0, 102, 102));
        assert_eq!(cells[1].rect, TileRect::new(100, 0, 102, 102));
        assert_eq!(cells[2].rect, TileRect::new(200, 0, 37, 102));
        assert_eq!(cells[5].rect, TileRect::new(200, 100, 37, 53));
    }

    #[test]
    fn test_grid_zero_tile_size_is_empty() {
        assert_eq!(tile_grid(100, 100, 0, 0).count(), 0);
    }

    #[test]
    fn test_intersect() {
        let a = TileRect::new(0, 0, 10, 10);
        assert_eq!(a.intersect(&TileRect::new(5, 5, 10, 10)), TileRect::new(5, 5, 5, 5));
        assert!(a.intersect(&TileRect::new(20, 20, 5, 5)).is_empty());
    }

    #[test]
    fn test_rotated_bounds_multiples_of_90() {
        assert_eq!(compute_rotated_bounds(237, 153, 0.0), (237, 153));
        assert_eq!(compute_rotated_bounds(237, 153, 90.0), (153, 237));
        assert_eq!(compute_rotated_bounds(237, 153, 180.0), (237, 153));
        assert_eq!(compute_rotated_bounds(237, 153, -90.0), (153, 237));
        assert_eq!(compute_rotated_bounds(237, 153, 450.0), (153, 237));
        assert_eq!(compute_rotated_bounds(237, 153, 720.0), (237, 153));
    }

    #[test]
    fn test_rotated_bounds_45() {
        // (237 + 153) * cos(45°) = 275.77
        let (w, h) = compute_rotated_bounds(237, 153, 45.0);
        assert!((275..=276).contains(&w), "width was {}", w);
        assert_eq!(w, h);
    }

    #[test]
    fn test_opposite_rotations_same_bounds() {
        assert_eq!(
            compute_rotated_bounds(100, 80, 30.0),
            compute_rotated_bounds(100, 80, -30.0)
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimensions_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=2000, 1u32..=2000)
    }

    proptest! {
        /// Property: the rotated bounding box never loses area.
        #[test]
        fn prop_rotated_area_not_smaller(
            (width, height) in dimensions_strategy(),
            angle in -720.0f64..720.0,
        ) {
            let (w, h) = compute_rotated_bounds(width, height, angle);
            prop_assert!(
                w as u64 * h as u64 >= width as u64 * height as u64,
                "{}x{} at {} deg -> {}x{}", width, height, angle, w, h
            );
        }

        /// Property: multiples of 180° keep, odd multiples of 90° swap.
        #[test]
        fn prop_right_angles(
            (width, height) in dimensions_strategy(),
            turns in -4i32..=4,
        ) {
            let half_turns = compute_rotated_bounds(width, height, turns as f64 * 180.0);
            prop_assert_eq!(half_turns, (width, height));
            let quarter = compute_rotated_bounds(width, height, turns as f64 * 180.0 + 90.0);
            prop_assert_eq!(quarter, (height, width));
        }

        /// Property: a zero-margin grid covers the image with no gaps or overlaps.
        #[test]
        fn prop_grid_covers_exactly(
            (width, height) in (1u32..=600, 1u32..=600),
            tile_size in 1u32..=256,
        ) {
            let cells: Vec<_> = tile_grid(width, height, tile_size, 0).collect();
            prop_assert_eq!(
                cells.len() as u32,
                tile_count(width, tile_size) * tile_count(height, tile_size)
            );

            let total: u64 = cells.iter().map(|c| c.rect.area()).sum();
            prop_assert_eq!(total, width as u64 * height as u64);

            for cell in &cells {
                prop_assert!(!cell.rect.is_empty());
                prop_assert!(cell.rect.right() <= width);
                prop_assert!(cell.rect.bottom() <= height);
            }
        }
    }
}
