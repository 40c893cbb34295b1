//! Rectangular tile grid with a walkability bitmap.
//!
//! A grid is built once per room from its [`RoomLayout`] and never mutated
//! afterwards. Cells are addressed `y * cols + x`. The outer ring is always
//! blocked, whatever the layout says, so every participant computes the
//! same walkability for the same room.

use serde::{Deserialize, Serialize};

use crate::layout::RoomLayout;
use crate::pathfinding::Pathfinder;

/// Largest accepted grid side, in cells.
pub const MAX_GRID_SIDE: i32 = 256;

/// Integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing a continuous grid position, by rounding.
    pub fn round(x: f32, y: f32) -> Self {
        Self::new(x.round() as i32, y.round() as i32)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True when `other` is one orthogonal step away.
    pub fn is_adjacent(self, other: Cell) -> bool {
        self.manhattan(other) == 1
    }
}

/// Immutable per-room tile grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: i32,
    rows: i32,
    walkable: Vec<bool>,
}

impl Grid {
    /// A grid whose interior is fully walkable and whose border ring is blocked.
    ///
    /// Each side is clamped to `1..=MAX_GRID_SIDE`.
    pub fn open(cols: i32, rows: i32) -> Self {
        let cols = cols.clamp(1, MAX_GRID_SIDE);
        let rows = rows.clamp(1, MAX_GRID_SIDE);
        let mut grid = Self {
            cols,
            rows,
            walkable: vec![true; cols as usize * rows as usize],
        };
        grid.seal_border();
        grid
    }

    /// Build the grid for a room layout: carve every obstacle rectangle,
    /// then seal the border.
    pub fn from_layout(layout: &RoomLayout) -> Self {
        let mut grid = Self::open(layout.cols, layout.rows);
        for rect in &layout.obstacles {
            let Some(rect) = rect.clipped(grid.cols, grid.rows) else {
                continue;
            };
            for cell in rect.cells() {
                grid.block(cell.x, cell.y);
            }
        }
        grid
    }

    /// Mark a cell as blocked. Out-of-bounds coordinates are ignored.
    pub fn block(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.walkable[i] = false;
        }
    }

    fn seal_border(&mut self) {
        for x in 0..self.cols {
            self.block(x, 0);
            self.block(x, self.rows - 1);
        }
        for y in 0..self.rows {
            self.block(0, y);
            self.block(self.cols - 1, y);
        }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.walkable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walkable.is_empty()
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.cols && y < self.rows
    }

    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.cols as usize + x as usize)
        } else {
            None
        }
    }

    /// Out-of-bounds cells are never walkable.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.walkable[i])
    }

    pub fn is_walkable_cell(&self, cell: Cell) -> bool {
        self.is_walkable(cell.x, cell.y)
    }

    /// Clamp a coordinate into the interior ring `[1, cols-2] × [1, rows-2]`.
    pub fn clamp_interior(&self, x: i32, y: i32) -> Cell {
        let max_x = (self.cols - 2).max(1);
        let max_y = (self.rows - 2).max(1);
        Cell::new(x.clamp(1, max_x), y.clamp(1, max_y))
    }

    pub fn walkable_count(&self) -> usize {
        self.walkable.iter().filter(|w| **w).count()
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows).flat_map(move |y| (0..self.cols).map(move |x| Cell::new(x, y)))
    }

    /// Shortest 4-connected route; see [`Pathfinder::find_path`].
    pub fn find_path(&self, start: Cell, goal: Cell) -> Vec<Cell> {
        Pathfinder::new().find_path(self, start, goal)
    }
}
