//! Per-tile rotation frame: where a tile pivots and where it lands.
//!
//! A source pixel `p` maps to the canvas as `C' + R(p - C)` where `C` and
//! `C'` are the source and canvas centers. Each tile is rotated about its
//! own center, then positioned so that its center lands on the canvas point
//! the global mapping assigns to it.

use serde::{Deserialize, Serialize};

use crate::geometry::{truncate, AffineTransform, GridCell};

/// How a rotated tile's canvas position is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Placement {
    /// Pixel-center geometry on the clipped tile's actual extent. Rotation
    /// by 0° reproduces the source exactly.
    #[default]
    Centered,
    /// Integer placement of the first map tooling: interior tiles use the
    /// nominal grid center, border tiles `x + w/2 - 1`, and positions are
    /// truncated. Tiles can land one pixel off near the edges.
    Legacy,
}

/// Derived once per tile and consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationFrame {
    /// Pivot of the rotation in the tile's own pixel space.
    pub pivot: (f64, f64),
    /// Half the tile extent, used to center the tile in its rotated box.
    pub half_extent: (f64, f64),
    /// Bounding box of the rotated tile.
    pub rotated_size: (u32, u32),
    /// Tile center relative to the source image center.
    pub source_offset: (f64, f64),
    placement: Placement,
}

impl RotationFrame {
    pub fn new(
        cell: &GridCell,
        tile_size: u32,
        source_size: (u32, u32),
        angle_degrees: f64,
        placement: Placement,
    ) -> Self {
        let rect = cell.rect;
        let (tw, th) = (rect.width as f64, rect.height as f64);

        let (pivot, source_offset) = match placement {
            Placement::Centered => {
                let pivot = ((tw - 1.0) / 2.0, (th - 1.0) / 2.0);
                let offset = (
                    rect.x as f64 + pivot.0 - (source_size.0 as f64 - 1.0) / 2.0,
                    rect.y as f64 + pivot.1 - (source_size.1 as f64 - 1.0) / 2.0,
                );
                (pivot, offset)
            }
            Placement::Legacy => {
                let pivot = ((rect.width / 2) as f64, (rect.height / 2) as f64);
                let center_x = legacy_center(rect.x, rect.width, tile_size);
                let center_y = legacy_center(rect.y, rect.height, tile_size);
                let offset = (
                    (center_x - (source_size.0 / 2) as i64) as f64,
                    (center_y - (source_size.1 / 2) as i64) as f64,
                );
                (pivot, offset)
            }
        };

        let base = AffineTransform::rotation(pivot.0, pivot.1, -angle_degrees, 1.0);
        let cos = base.m[0][0].abs();
        let sin = base.m[0][1].abs();
        let rotated_size = (
            truncate(tw * cos + th * sin).max(1),
            truncate(tw * sin + th * cos).max(1),
        );

        Self {
            pivot,
            half_extent: (tw / 2.0, th / 2.0),
            rotated_size,
            source_offset,
            placement,
        }
    }

    /// Tile-local transform: rotate by `-angle_degrees` about the pivot and
    /// shift so the tile sits centered in its rotated bounding box.
    ///
    /// Matrix convention turns positive angles counter-clockwise on screen,
    /// while [`RotationFrame::destination_center`] turns them clockwise.
    pub fn transform(&self, angle_degrees: f64) -> AffineTransform {
        let (rw, rh) = self.rotated_size;
        AffineTransform::rotation(self.pivot.0, self.pivot.1, -angle_degrees, 1.0).translated(
            rw as f64 / 2.0 - self.half_extent.0,
            rh as f64 / 2.0 - self.half_extent.1,
        )
    }

    /// Canvas point the tile's center maps to.
    pub fn destination_center(&self, canvas_size: (u32, u32), angle_degrees: f64) -> (f64, f64) {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let (ox, oy) = self.source_offset;
        let (cx, cy) = match self.placement {
            Placement::Centered => (
                (canvas_size.0 as f64 - 1.0) / 2.0,
                (canvas_size.1 as f64 - 1.0) / 2.0,
            ),
            Placement::Legacy => (canvas_size.0 as f64 / 2.0, canvas_size.1 as f64 / 2.0),
        };
        (cx + ox * cos - oy * sin, cy + ox * sin + oy * cos)
    }

    /// Top-left canvas position of the rotated tile, clamped per axis so the
    /// tile never extends past the canvas.
    pub fn placement(&self, canvas_size: (u32, u32), angle_degrees: f64) -> (u32, u32) {
        let (dx, dy) = self.destination_center(canvas_size, angle_degrees);
        let (rw, rh) = self.rotated_size;
        let (x, y) = match self.placement {
            Placement::Centered => (
                (dx - (rw as f64 - 1.0) / 2.0).round() as i64,
                (dy - (rh as f64 - 1.0) / 2.0).round() as i64,
            ),
            Placement::Legacy => (
                dx as i64 - (rw / 2) as i64,
                dy as i64 - (rh / 2) as i64,
            ),
        };
        (
            clamp_axis(x, canvas_size.0, rw),
            clamp_axis(y, canvas_size.1, rh),
        )
    }
}

fn legacy_center(origin: u32, extent: u32, tile_size: u32) -> i64 {
    if extent > tile_size {
        origin as i64 + (tile_size / 2) as i64
    } else {
        origin as i64 + (extent / 2) as i64 - 1
    }
}

fn clamp_axis(pos: i64, canvas: u32, extent: u32) -> u32 {
    let max = canvas as i64 - extent as i64;
    pos.min(max).max(0) as u32
}
