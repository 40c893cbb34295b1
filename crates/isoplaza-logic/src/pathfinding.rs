//! A* pathfinding over the 4-connected tile grid.
//!
//! `Pathfinder` keeps its score and frontier buffers between searches so
//! repeated clicks do not reallocate. The heuristic is Manhattan distance,
//! which is admissible for unit-cost orthogonal moves, so returned paths are
//! shortest. Ties on `f` are broken by lower `h`, then by insertion order,
//! and neighbours are always expanded N, E, S, W: identical inputs produce
//! identical paths on every client.
//!
//! Result convention: the path always starts with `start`. A single-node
//! path means "no movement": either `start == goal` or no route exists.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::grid::{Cell, Grid};

/// Expansion order. Fixed so output is reproducible.
pub const NEIGHBOR_ORDER: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

const NO_PARENT: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    f: u32,
    h: u32,
    seq: u64,
    index: usize,
}

/// Reusable A* search state.
#[derive(Debug, Default)]
pub struct Pathfinder {
    g_score: Vec<u32>,
    came_from: Vec<usize>,
    closed: Vec<bool>,
    open: BinaryHeap<Reverse<OpenEntry>>,
    expanded: usize,
}

impl Pathfinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells closed by the most recent search.
    pub fn last_expanded(&self) -> usize {
        self.expanded
    }

    /// Search on a [`Grid`], returning a fresh path.
    pub fn find_path(&mut self, grid: &Grid, start: Cell, goal: Cell) -> Vec<Cell> {
        let mut out = Vec::new();
        self.search(start, goal, grid.cols(), grid.rows(), |x, y| grid.is_walkable(x, y), &mut out);
        out
    }

    /// Search with an arbitrary walkability predicate, writing the route
    /// into `out` (cleared first). `out` always ends up non-empty.
    pub fn search<F>(
        &mut self,
        start: Cell,
        goal: Cell,
        cols: i32,
        rows: i32,
        is_walkable: F,
        out: &mut Vec<Cell>,
    ) where
        F: Fn(i32, i32) -> bool,
    {
        out.clear();
        out.push(start);
        self.expanded = 0;

        if start == goal {
            return;
        }
        let in_bounds = |c: Cell| c.x >= 0 && c.y >= 0 && c.x < cols && c.y < rows;
        if cols <= 0 || rows <= 0 || !in_bounds(start) || !in_bounds(goal) {
            return;
        }
        if !is_walkable(goal.x, goal.y) {
            return;
        }

        let size = cols as usize * rows as usize;
        self.reset(size);

        let index_of = |c: Cell| c.y as usize * cols as usize + c.x as usize;
        let cell_of = |i: usize| Cell::new(i as i32 % cols, i as i32 / cols);

        let start_idx = index_of(start);
        let goal_idx = index_of(goal);
        let mut seq: u64 = 0;

        self.g_score[start_idx] = 0;
        let h0 = start.manhattan(goal);
        self.open.push(Reverse(OpenEntry {
            f: h0,
            h: h0,
            seq,
            index: start_idx,
        }));

        while let Some(Reverse(entry)) = self.open.pop() {
            let current = entry.index;
            if self.closed[current] {
                continue;
            }
            self.closed[current] = true;
            self.expanded += 1;

            if current == goal_idx {
                self.reconstruct(start_idx, goal_idx, cols, out);
                return;
            }

            let here = cell_of(current);
            let g_here = self.g_score[current];
            for (dx, dy) in NEIGHBOR_ORDER {
                let next = here.offset(dx, dy);
                if !in_bounds(next) || !is_walkable(next.x, next.y) {
                    continue;
                }
                let ni = index_of(next);
                if self.closed[ni] {
                    continue;
                }
                let tentative = g_here + 1;
                if tentative < self.g_score[ni] {
                    self.g_score[ni] = tentative;
                    self.came_from[ni] = current;
                    let h = next.manhattan(goal);
                    seq += 1;
                    self.open.push(Reverse(OpenEntry {
                        f: tentative + h,
                        h,
                        seq,
                        index: ni,
                    }));
                }
            }
        }
        // Frontier exhausted: `out` still holds only `start`.
    }

    fn reset(&mut self, size: usize) {
        self.g_score.clear();
        self.g_score.resize(size, u32::MAX);
        self.came_from.clear();
        self.came_from.resize(size, NO_PARENT);
        self.closed.clear();
        self.closed.resize(size, false);
        self.open.clear();
    }

    fn reconstruct(&self, start_idx: usize, goal_idx: usize, cols: i32, out: &mut Vec<Cell>) {
        out.clear();
        let mut current = goal_idx;
        loop {
            out.push(Cell::new(current as i32 % cols, current as i32 / cols));
            if current == start_idx {
                break;
            }
            current = self.came_from[current];
            if current == NO_PARENT {
                break;
            }
        }
        out.reverse();
    }
}

/// One-shot search with a temporary [`Pathfinder`].
pub fn find_path<F>(start: Cell, goal: Cell, cols: i32, rows: i32, is_walkable: F) -> Vec<Cell>
where
    F: Fn(i32, i32) -> bool,
{
    let mut out = Vec::new();
    Pathfinder::new().search(start, goal, cols, rows, is_walkable, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cells(points: &[(i32, i32)]) -> Vec<Cell> {
        points.iter().map(|&(x, y)| Cell::new(x, y)).collect()
    }

    /// Breadth-first reference distance, `None` if unreachable.
    fn bfs_distance(grid: &Grid, start: Cell, goal: Cell) -> Option<usize> {
        let mut dist = vec![usize::MAX; grid.len()];
        let mut queue = VecDeque::new();
        dist[grid.index(start.x, start.y)?] = 0;
        queue.push_back(start);
        while let Some(c) = queue.pop_front() {
            let d = dist[grid.index(c.x, c.y)?];
            if c == goal {
                return Some(d);
            }
            for (dx, dy) in NEIGHBOR_ORDER {
                let n = c.offset(dx, dy);
                if let Some(i) = grid.index(n.x, n.y) {
                    if grid.is_walkable_cell(n) && dist[i] == usize::MAX {
                        dist[i] = d + 1;
                        queue.push_back(n);
                    }
                }
            }
        }
        None
    }

    fn assert_valid_route(grid: &Grid, path: &[Cell], start: Cell, goal: Cell) {
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        for pair in path.windows(2) {
            assert!(pair[0].is_adjacent(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
        for c in &path[1..] {
            assert!(grid.is_walkable_cell(*c), "{:?} not walkable", c);
        }
    }

    #[test]
    fn test_same_cell() {
        let grid = Grid::open(10, 10);
        let p = grid.find_path(Cell::new(3, 3), Cell::new(3, 3));
        assert_eq!(p, cells(&[(3, 3)]));
    }

    #[test]
    fn test_straight_corridor() {
        let grid = Grid::open(20, 16);
        let p = grid.find_path(Cell::new(6, 6), Cell::new(10, 6));
        assert_eq!(p, cells(&[(6, 6), (7, 6), (8, 6), (9, 6), (10, 6)]));
    }

    #[test]
    fn test_routes_around_wall() {
        // Vertical wall at x=5 from y=1..=7, gap at y=8
        let mut grid = Grid::open(10, 10);
        for y in 1..=7 {
            grid.block(5, y);
        }
        let start = Cell::new(3, 3);
        let goal = Cell::new(7, 3);
        let p = grid.find_path(start, goal);
        assert_valid_route(&grid, &p, start, goal);
        assert_eq!(p.len() - 1, bfs_distance(&grid, start, goal).unwrap());
        assert!(p.contains(&Cell::new(5, 8)));
    }

    #[test]
    fn test_blocked_goal_returns_start() {
        let mut grid = Grid::open(10, 10);
        grid.block(6, 6);
        let p = grid.find_path(Cell::new(2, 2), Cell::new(6, 6));
        assert_eq!(p, cells(&[(2, 2)]));
    }

    #[test]
    fn test_isolated_goal_returns_start() {
        let mut grid = Grid::open(10, 10);
        // Box in (6,6)
        for (x, y) in [(6, 5), (7, 6), (6, 7), (5, 6)] {
            grid.block(x, y);
        }
        let p = grid.find_path(Cell::new(2, 2), Cell::new(6, 6));
        assert_eq!(p, cells(&[(2, 2)]));
    }

    #[test]
    fn test_out_of_bounds_goal() {
        let grid = Grid::open(10, 10);
        assert_eq!(grid.find_path(Cell::new(2, 2), Cell::new(30, 2)).len(), 1);
        assert_eq!(grid.find_path(Cell::new(2, 2), Cell::new(-1, 2)).len(), 1);
    }

    #[test]
    fn test_deterministic_output() {
        let mut grid = Grid::open(16, 16);
        for y in 3..12 {
            grid.block(8, y);
        }
        let start = Cell::new(2, 7);
        let goal = Cell::new(13, 7);
        let first = grid.find_path(start, goal);
        let mut finder = Pathfinder::new();
        for _ in 0..5 {
            assert_eq!(finder.find_path(&grid, start, goal), first);
        }
    }

    #[test]
    fn test_buffer_reuse_between_grids() {
        let mut finder = Pathfinder::new();
        let big = Grid::open(30, 30);
        let small = Grid::open(5, 5);
        assert_eq!(finder.find_path(&big, Cell::new(1, 1), Cell::new(28, 28)).len(), 55);
        assert_eq!(finder.find_path(&small, Cell::new(1, 1), Cell::new(3, 3)).len(), 5);
    }

    #[test]
    fn test_heuristic_limits_expansion() {
        let grid = Grid::open(40, 40);
        let mut finder = Pathfinder::new();
        finder.find_path(&grid, Cell::new(1, 1), Cell::new(10, 1));
        // A straight open run should not flood the whole grid
        assert!(finder.last_expanded() < 100, "{}", finder.last_expanded());
    }

    #[test]
    fn test_predicate_search() {
        let walls = [(2, 1), (2, 2), (2, 3)];
        let p = find_path(Cell::new(1, 2), Cell::new(3, 2), 5, 5, |x, y| {
            x > 0 && y > 0 && x < 4 && y < 4 && !walls.contains(&(x, y))
        });
        // Column 2 is sealed between the borders
        assert_eq!(p, cells(&[(1, 2)]));
    }

    #[test]
    fn test_random_grids_match_bfs() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut grid = Grid::open(12, 10);
            for _ in 0..30 {
                grid.block(rng.gen_range(1..11), rng.gen_range(1..9));
            }
            let start = Cell::new(rng.gen_range(1..11), rng.gen_range(1..9));
            let goal = Cell::new(rng.gen_range(1..11), rng.gen_range(1..9));
            if !grid.is_walkable_cell(start) {
                continue;
            }
            let path = grid.find_path(start, goal);
            match bfs_distance(&grid, start, goal) {
                Some(d) if grid.is_walkable_cell(goal) => {
                    assert_eq!(path.len() - 1, d);
                    assert_valid_route(&grid, &path, start, goal);
                }
                _ => assert_eq!(path, vec![start]),
            }
        }
    }
}
