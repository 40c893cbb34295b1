//! 2:1 diamond isometric projection.
//!
//! ```text
//! px = origin.x + (gx - gy) * half_w
//! py = origin.y + (gx + gy) * half_h
//! ```
//!
//! A tile's projected point is the top vertex of its diamond, so the
//! diamond of cell `(x, y)` covers continuous grid space `[x, x+1) × [y, y+1)`.
//! Unprojection solves the linear system exactly; picking a cell floors it.

use serde::{Deserialize, Serialize};

use crate::grid::Cell;

/// Viewport size in CSS-style logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const MIN_SIZE: f32 = 1.0;

    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(Self::MIN_SIZE),
            height: height.max(Self::MIN_SIZE),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(300.0, 300.0)
    }
}

/// Bidirectional grid ↔ pixel mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoProjector {
    pub half_w: f32,
    pub half_h: f32,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl IsoProjector {
    pub fn new(tile_w: f32, tile_h: f32, origin_x: f32, origin_y: f32) -> Self {
        Self {
            half_w: tile_w / 2.0,
            half_h: tile_h / 2.0,
            origin_x,
            origin_y,
        }
    }

    /// Projector whose floor is centred in `viewport`, lifted by `nudge` px.
    ///
    /// The four floor corners are projected at a zero origin; the bounding
    /// box of their diamonds is centred and the origin rounded to whole
    /// pixels so tile edges stay crisp.
    pub fn centered(
        viewport: Viewport,
        cols: i32,
        rows: i32,
        tile_w: f32,
        tile_h: f32,
        nudge: f32,
    ) -> Self {
        let zero = Self::new(tile_w, tile_h, 0.0, 0.0);
        let last_x = (cols - 1).max(0) as f32;
        let last_y = (rows - 1).max(0) as f32;
        let corners = [
            zero.project(0.0, 0.0),
            zero.project(last_x, 0.0),
            zero.project(0.0, last_y),
            zero.project(last_x, last_y),
        ];

        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for (px, py) in corners {
            min_x = min_x.min(px - zero.half_w);
            max_x = max_x.max(px + zero.half_w);
            min_y = min_y.min(py);
            max_y = max_y.max(py + tile_h);
        }

        let origin_x = (viewport.width / 2.0 - (min_x + max_x) / 2.0).round();
        let origin_y = (viewport.height / 2.0 - (min_y + max_y) / 2.0).round() - nudge;
        Self::new(tile_w, tile_h, origin_x, origin_y)
    }

    pub fn tile_width(&self) -> f32 {
        self.half_w * 2.0
    }

    pub fn tile_height(&self) -> f32 {
        self.half_h * 2.0
    }

    pub fn project(&self, gx: f32, gy: f32) -> (f32, f32) {
        (
            self.origin_x + (gx - gy) * self.half_w,
            self.origin_y + (gx + gy) * self.half_h,
        )
    }

    pub fn project_cell(&self, cell: Cell) -> (f32, f32) {
        self.project(cell.x as f32, cell.y as f32)
    }

    /// Exact inverse of [`IsoProjector::project`].
    pub fn unproject(&self, px: f32, py: f32) -> (f32, f32) {
        let diff = (px - self.origin_x) / self.half_w; // gx - gy
        let sum = (py - self.origin_y) / self.half_h; // gx + gy
        ((sum + diff) / 2.0, (sum - diff) / 2.0)
    }

    /// Cell whose diamond contains the pixel. May be out of bounds.
    pub fn pick_cell(&self, px: f32, py: f32) -> Cell {
        let (gx, gy) = self.unproject(px, py);
        Cell::new(gx.floor() as i32, gy.floor() as i32)
    }
}
