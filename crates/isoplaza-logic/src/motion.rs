//! Local avatar motion state machine.
//!
//! ```text
//!            navigate / held step / seat seek
//!   Idle ───────────────────────────────────▶ PathFollowing
//!    ▲  ◀──────────── last node reached ─────────┘  │
//!    │                                             │ last node == target seat
//!    └──── toggle sit / stand_up ──── Sitting ◀─────┘
//! ```
//!
//! The avatar's continuous position is a linear blend between the two path
//! nodes bracketing `progress` (in segments travelled). Path nodes live in a
//! buffer reused across requests; a second scratch buffer receives search
//! results so a failed search never clobbers the active path.

use crate::facing::Facing;
use crate::grid::{Cell, Grid};
use crate::layout::Seat;
use crate::pathfinding::Pathfinder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Idle,
    PathFollowing,
    Sitting,
}

/// Continuous grid-space position of the local avatar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avatar {
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
}

impl Avatar {
    pub fn at(cell: Cell, facing: Facing) -> Self {
        Self {
            x: cell.x as f32,
            y: cell.y as f32,
            facing,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::round(self.x, self.y)
    }
}

/// Why the active path exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPurpose {
    Walk,
    SeekSeat(Seat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// A path of `nodes` cells (including the start) is now active.
    Started { nodes: usize },
    /// Goal is the current cell.
    AlreadyThere,
    /// Goal walkable but no route; current motion untouched.
    Unreachable,
    /// Goal out of bounds, blocked, or the avatar cannot move right now.
    Rejected,
}

impl NavOutcome {
    pub fn started(self) -> bool {
        matches!(self, NavOutcome::Started { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitOutcome {
    /// Walking to the chosen seat.
    Seeking(Seat),
    /// Already on the chosen seat.
    SatDown(Seat),
    StoodUp,
    /// A seat seek in progress was cancelled.
    Cancelled,
    NoFreeSeat,
    /// Nearest free seat has no route.
    Unreachable(Seat),
}

/// Raised by [`MotionController::advance`] when a path completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    Arrived(Cell),
    SatDown(Seat),
}

#[derive(Debug)]
pub struct MotionController {
    avatar: Avatar,
    state: MotionState,
    speed: f32,
    nodes: Vec<Cell>,
    scratch: Vec<Cell>,
    progress: f32,
    purpose: PathPurpose,
    seat: Option<Seat>,
    pathfinder: Pathfinder,
}

impl MotionController {
    /// Controller with the avatar standing on `spawn`. `speed` is in tiles
    /// per second.
    pub fn new(spawn: Cell, facing: Facing, speed: f32) -> Self {
        Self {
            avatar: Avatar::at(spawn, facing),
            state: MotionState::Idle,
            speed,
            nodes: Vec::new(),
            scratch: Vec::new(),
            progress: 0.0,
            purpose: PathPurpose::Walk,
            seat: None,
            pathfinder: Pathfinder::new(),
        }
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == MotionState::PathFollowing
    }

    pub fn is_sitting(&self) -> bool {
        self.state == MotionState::Sitting
    }

    /// Seat currently sat on.
    pub fn seat(&self) -> Option<Seat> {
        self.seat
    }

    /// Active path nodes, empty unless following a path.
    pub fn path(&self) -> &[Cell] {
        if self.is_moving() {
            &self.nodes
        } else {
            &[]
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn purpose(&self) -> PathPurpose {
        self.purpose
    }

    /// Put the avatar on `cell`, discarding any path and seat.
    pub fn reset(&mut self, cell: Cell, facing: Facing) {
        self.avatar = Avatar::at(cell, facing);
        self.clear_path();
        self.seat = None;
        self.state = MotionState::Idle;
    }

    /// Drop the active path and seat but keep the current position.
    pub fn halt(&mut self) {
        self.clear_path();
        self.seat = None;
        self.state = MotionState::Idle;
    }

    /// Free walk to `goal`. A seated avatar stands up only once a path starts.
    pub fn navigate_to(&mut self, grid: &Grid, goal: Cell) -> NavOutcome {
        if !grid.is_walkable_cell(goal) {
            log::debug!("navigation rejected: {:?} is not walkable", goal);
            return NavOutcome::Rejected;
        }
        let outcome = self.start_path(grid, goal, PathPurpose::Walk);
        if outcome.started() {
            self.seat = None;
        }
        outcome
    }

    /// One held-key step of `(dx, dy)`, each in `-1..=1`.
    ///
    /// Only taken while idle. Diagonal steps need both orthogonal
    /// neighbours walkable so the avatar never cuts a blocked corner.
    pub fn step_held(&mut self, grid: &Grid, dx: i32, dy: i32) -> NavOutcome {
        if self.state != MotionState::Idle {
            return NavOutcome::Rejected;
        }
        let dx = dx.signum();
        let dy = dy.signum();
        let here = self.avatar.cell();
        let target = grid.clamp_interior(here.x + dx, here.y + dy);
        if target == here {
            return NavOutcome::AlreadyThere;
        }
        if !grid.is_walkable_cell(target) {
            return NavOutcome::Rejected;
        }
        let (sx, sy) = (target.x - here.x, target.y - here.y);
        if sx != 0
            && sy != 0
            && !(grid.is_walkable(here.x + sx, here.y) && grid.is_walkable(here.x, here.y + sy))
        {
            return NavOutcome::Rejected;
        }

        self.nodes.clear();
        self.nodes.push(here);
        self.nodes.push(target);
        self.begin(PathPurpose::Walk, sx, sy)
    }

    /// Toggle sit: stand up when seated, cancel a seek in progress, or
    /// walk to the nearest free walkable seat.
    ///
    /// `occupied` are the rounded cells of known peers.
    pub fn seek_seat(&mut self, grid: &Grid, seats: &[Seat], occupied: &[Cell]) -> SitOutcome {
        match self.state {
            MotionState::Sitting => {
                self.stand_up();
                return SitOutcome::StoodUp;
            }
            MotionState::PathFollowing if matches!(self.purpose, PathPurpose::SeekSeat(_)) => {
                self.clear_path();
                self.state = MotionState::Idle;
                return SitOutcome::Cancelled;
            }
            _ => {}
        }

        let here = self.avatar.cell();
        let Some(seat) = nearest_free_seat(grid, seats, occupied, here) else {
            return SitOutcome::NoFreeSeat;
        };

        if seat.cell() == here {
            self.clear_path();
            self.sit_on(seat);
            return SitOutcome::SatDown(seat);
        }
        match self.start_path(grid, seat.cell(), PathPurpose::SeekSeat(seat)) {
            NavOutcome::Started { .. } => SitOutcome::Seeking(seat),
            _ => SitOutcome::Unreachable(seat),
        }
    }

    /// Stand up in place. Returns whether the avatar was sitting.
    pub fn stand_up(&mut self) -> bool {
        if self.state != MotionState::Sitting {
            return false;
        }
        self.seat = None;
        self.state = MotionState::Idle;
        true
    }

    /// Advance along the active path by `speed * dt` segments.
    pub fn advance(&mut self, dt: f32) -> Option<MotionEvent> {
        if self.state != MotionState::PathFollowing || self.nodes.len() < 2 {
            return None;
        }
        self.progress += self.speed * dt.max(0.0);
        let last_index = self.nodes.len() - 1;

        if self.progress >= last_index as f32 {
            let last = self.nodes[last_index];
            self.avatar.x = last.x as f32;
            self.avatar.y = last.y as f32;
            let purpose = self.purpose;
            self.clear_path();
            return match purpose {
                PathPurpose::SeekSeat(seat) if seat.cell() == last => {
                    self.sit_on(seat);
                    Some(MotionEvent::SatDown(seat))
                }
                _ => {
                    self.state = MotionState::Idle;
                    Some(MotionEvent::Arrived(last))
                }
            };
        }

        let seg = (self.progress.floor() as usize).min(last_index - 1);
        let a = self.nodes[seg];
        let b = self.nodes[seg + 1];
        let t = self.progress - seg as f32;
        self.avatar.x = a.x as f32 + (b.x - a.x) as f32 * t;
        self.avatar.y = a.y as f32 + (b.y - a.y) as f32 * t;
        self.avatar.facing = Facing::from_step(b.x - a.x, b.y - a.y, self.avatar.facing);
        None
    }

    fn start_path(&mut self, grid: &Grid, goal: Cell, purpose: PathPurpose) -> NavOutcome {
        let here = self.avatar.cell();
        if here == goal {
            return NavOutcome::AlreadyThere;
        }
        self.pathfinder.search(
            here,
            goal,
            grid.cols(),
            grid.rows(),
            |x, y| grid.is_walkable(x, y),
            &mut self.scratch,
        );
        if self.scratch.len() < 2 {
            log::debug!("no route from {:?} to {:?}", here, goal);
            return NavOutcome::Unreachable;
        }
        std::mem::swap(&mut self.nodes, &mut self.scratch);
        let (dx, dy) = (self.nodes[1].x - here.x, self.nodes[1].y - here.y);
        log::debug!(
            "path {:?} -> {:?}: {} nodes, {} expanded",
            here,
            goal,
            self.nodes.len(),
            self.pathfinder.last_expanded()
        );
        self.begin(purpose, dx, dy)
    }

    fn begin(&mut self, purpose: PathPurpose, dx: i32, dy: i32) -> NavOutcome {
        self.progress = 0.0;
        self.purpose = purpose;
        self.state = MotionState::PathFollowing;
        self.avatar.facing = Facing::from_step(dx, dy, self.avatar.facing);
        NavOutcome::Started {
            nodes: self.nodes.len(),
        }
    }

    fn sit_on(&mut self, seat: Seat) {
        self.avatar.x = seat.x as f32;
        self.avatar.y = seat.y as f32;
        self.avatar.facing = seat.facing;
        self.seat = Some(seat);
        self.state = MotionState::Sitting;
    }

    fn clear_path(&mut self) {
        self.nodes.clear();
        self.progress = 0.0;
        self.purpose = PathPurpose::Walk;
    }
}

/// Nearest walkable, unoccupied seat by Manhattan distance. Ties keep
/// table order.
pub fn nearest_free_seat(grid: &Grid, seats: &[Seat], occupied: &[Cell], from: Cell) -> Option<Seat> {
    seats
        .iter()
        .filter(|s| grid.is_walkable_cell(s.cell()) && !occupied.contains(&s.cell()))
        .min_by_key(|s| s.cell().manhattan(from))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{RoomId, RoomLayout};

    fn controller_at(x: i32, y: i32) -> MotionController {
        MotionController::new(Cell::new(x, y), Facing::South, 3.4)
    }

    fn run_until_idle(mc: &mut MotionController) -> Vec<MotionEvent> {
        let mut events = Vec::new();
        for _ in 0..10_000 {
            if let Some(e) = mc.advance(1.0 / 60.0) {
                events.push(e);
            }
            if !mc.is_moving() {
                break;
            }
        }
        events
    }

    #[test]
    fn test_straight_walk_faces_east() {
        let grid = Grid::open(20, 16);
        let mut mc = controller_at(6, 6);
        assert_eq!(mc.navigate_to(&grid, Cell::new(10, 6)), NavOutcome::Started { nodes: 5 });
        assert_eq!(
            mc.path(),
            &[Cell::new(6, 6), Cell::new(7, 6), Cell::new(8, 6), Cell::new(9, 6), Cell::new(10, 6)]
        );
        assert_eq!(mc.avatar().facing, Facing::East);
        let events = run_until_idle(&mut mc);
        assert_eq!(events, vec![MotionEvent::Arrived(Cell::new(10, 6))]);
        assert_eq!((mc.avatar().x, mc.avatar().y), (10.0, 6.0));
        assert_eq!(mc.avatar().facing, Facing::East);
        assert_eq!(mc.state(), MotionState::Idle);
    }

    #[test]
    fn test_interpolates_between_nodes() {
        let grid = Grid::open(20, 16);
        let mut mc = MotionController::new(Cell::new(6, 6), Facing::South, 2.0);
        mc.navigate_to(&grid, Cell::new(10, 6));
        mc.advance(0.25);
        assert!((mc.avatar().x - 6.5).abs() < 1e-5);
        assert_eq!(mc.avatar().y, 6.0);
        mc.advance(0.5);
        assert!((mc.avatar().x - 7.5).abs() < 1e-5);
    }

    #[test]
    fn test_facing_updates_per_segment() {
        // Wall forces an L-shaped route: south first, then east
        let mut grid = Grid::open(10, 10);
        for x in 3..9 {
            grid.block(x, 2);
        }
        let mut mc = controller_at(2, 2);
        assert!(mc.navigate_to(&grid, Cell::new(4, 3)).started());
        let mut seen = Vec::new();
        while mc.is_moving() {
            mc.advance(1.0 / 30.0);
            if seen.last() != Some(&mc.avatar().facing) {
                seen.push(mc.avatar().facing);
            }
        }
        assert_eq!(seen, vec![Facing::South, Facing::East]);
    }

    #[test]
    fn test_blocked_target_rejected() {
        let mut grid = Grid::open(20, 16);
        grid.block(10, 6);
        let mut mc = controller_at(6, 6);
        assert_eq!(mc.navigate_to(&grid, Cell::new(10, 6)), NavOutcome::Rejected);
        assert_eq!(mc.navigate_to(&grid, Cell::new(0, 6)), NavOutcome::Rejected);
        assert_eq!(mc.navigate_to(&grid, Cell::new(40, 6)), NavOutcome::Rejected);
        assert_eq!(mc.state(), MotionState::Idle);
        assert_eq!(mc.avatar().cell(), Cell::new(6, 6));
    }

    #[test]
    fn test_unreachable_keeps_current_path() {
        let mut grid = Grid::open(20, 16);
        for (x, y) in [(15, 11), (16, 12), (15, 13), (14, 12)] {
            grid.block(x, y);
        }
        let mut mc = controller_at(3, 3);
        mc.navigate_to(&grid, Cell::new(8, 3));
        mc.advance(0.1);
        assert_eq!(mc.navigate_to(&grid, Cell::new(15, 12)), NavOutcome::Unreachable);
        assert!(mc.is_moving());
        assert_eq!(mc.path().last(), Some(&Cell::new(8, 3)));
    }

    #[test]
    fn test_new_request_replaces_path() {
        let grid = Grid::open(20, 16);
        let mut mc = controller_at(6, 6);
        mc.navigate_to(&grid, Cell::new(12, 6));
        mc.advance(0.1);
        assert!(mc.navigate_to(&grid, Cell::new(6, 10)).started());
        assert_eq!(mc.path().first(), Some(&Cell::new(6, 6)));
        assert_eq!(mc.progress(), 0.0);
        let events = run_until_idle(&mut mc);
        assert_eq!(events, vec![MotionEvent::Arrived(Cell::new(6, 10))]);
    }

    #[test]
    fn test_held_step() {
        let grid = Grid::open(20, 16);
        let mut mc = controller_at(6, 6);
        assert_eq!(mc.step_held(&grid, 0, -1), NavOutcome::Started { nodes: 2 });
        assert_eq!(mc.avatar().facing, Facing::North);
        // Busy: a second step is dropped until the first lands
        assert_eq!(mc.step_held(&grid, 0, -1), NavOutcome::Rejected);
        run_until_idle(&mut mc);
        assert_eq!(mc.avatar().cell(), Cell::new(6, 5));
    }

    #[test]
    fn test_held_step_into_wall_dropped() {
        let grid = Grid::open(20, 16);
        let mut mc = controller_at(1, 1);
        assert_eq!(mc.step_held(&grid, -1, 0), NavOutcome::AlreadyThere);
        let mut blocked = Grid::open(20, 16);
        blocked.block(2, 1);
        assert_eq!(mc.step_held(&blocked, 1, 0), NavOutcome::Rejected);
        assert_eq!(mc.state(), MotionState::Idle);
    }

    #[test]
    fn test_diagonal_needs_clear_corners() {
        let mut grid = Grid::open(20, 16);
        grid.block(7, 6);
        let mut mc = controller_at(6, 6);
        assert_eq!(mc.step_held(&grid, 1, 1), NavOutcome::Rejected);
        assert!(mc.step_held(&grid, -1, 1).started());
        assert_eq!(mc.avatar().facing, Facing::West);
        run_until_idle(&mut mc);
        assert_eq!(mc.avatar().cell(), Cell::new(5, 7));
    }

    #[test]
    fn test_seat_seek_sits_with_seat_facing() {
        let grid = Grid::open(20, 16);
        let seats = [Seat::new(9, 6, Facing::North), Seat::new(3, 3, Facing::West)];
        let mut mc = controller_at(6, 6);
        assert_eq!(mc.seek_seat(&grid, &seats, &[]), SitOutcome::Seeking(seats[0]));
        let events = run_until_idle(&mut mc);
        assert_eq!(events, vec![MotionEvent::SatDown(seats[0])]);
        assert!(mc.is_sitting());
        assert_eq!(mc.avatar().facing, Facing::North);
        assert_eq!(mc.seat(), Some(seats[0]));
    }

    #[test]
    fn test_seat_seek_skips_occupied_and_blocked() {
        let mut grid = Grid::open(20, 16);
        grid.block(7, 6);
        let seats = [
            Seat::new(7, 6, Facing::North),
            Seat::new(6, 8, Facing::North),
            Seat::new(12, 12, Facing::East),
        ];
        let mut mc = controller_at(6, 6);
        let outcome = mc.seek_seat(&grid, &seats, &[Cell::new(6, 8)]);
        assert_eq!(outcome, SitOutcome::Seeking(seats[2]));
    }

    #[test]
    fn test_no_free_seat_does_not_move() {
        let grid = Grid::open(20, 16);
        let seats = [Seat::new(9, 6, Facing::North)];
        let mut mc = controller_at(6, 6);
        assert_eq!(mc.seek_seat(&grid, &seats, &[Cell::new(9, 6)]), SitOutcome::NoFreeSeat);
        assert_eq!(mc.state(), MotionState::Idle);
        assert_eq!(mc.avatar().cell(), Cell::new(6, 6));
    }

    #[test]
    fn test_toggle_twice_is_identity() {
        let grid = Grid::open(20, 16);
        let seats = [Seat::new(9, 6, Facing::North)];

        // Seek then cancel before any frame
        let mut mc = controller_at(6, 6);
        let before = *mc.avatar();
        mc.seek_seat(&grid, &seats, &[]);
        assert_eq!(mc.seek_seat(&grid, &seats, &[]), SitOutcome::Cancelled);
        assert_eq!(mc.state(), MotionState::Idle);
        assert_eq!((mc.avatar().x, mc.avatar().y), (before.x, before.y));

        // Already on the seat: sit then stand in place
        let mut mc = controller_at(9, 6);
        assert_eq!(mc.seek_seat(&grid, &seats, &[]), SitOutcome::SatDown(seats[0]));
        assert_eq!(mc.seek_seat(&grid, &seats, &[]), SitOutcome::StoodUp);
        assert_eq!(mc.state(), MotionState::Idle);
        assert_eq!(mc.avatar().cell(), Cell::new(9, 6));
    }

    #[test]
    fn test_walk_request_stands_up() {
        let grid = Grid::open(20, 16);
        let seats = [Seat::new(6, 6, Facing::North)];
        let mut mc = controller_at(6, 6);
        mc.seek_seat(&grid, &seats, &[]);
        assert!(mc.is_sitting());
        // Rejected targets leave the avatar seated
        assert_eq!(mc.navigate_to(&grid, Cell::new(0, 0)), NavOutcome::Rejected);
        assert!(mc.is_sitting());
        assert!(mc.navigate_to(&grid, Cell::new(8, 6)).started());
        assert!(!mc.is_sitting());
        assert_eq!(mc.seat(), None);
    }

    #[test]
    fn test_walk_without_path_keeps_seat() {
        let mut grid = Grid::open(20, 16);
        // Wall off (10, 10)
        for (x, y) in [(9, 10), (11, 10), (10, 9), (10, 11)] {
            grid.block(x, y);
        }
        let seat = Seat::new(6, 6, Facing::North);
        let mut mc = controller_at(6, 6);
        mc.seek_seat(&grid, &[seat], &[]);
        assert_eq!(mc.navigate_to(&grid, Cell::new(6, 6)), NavOutcome::AlreadyThere);
        assert_eq!(mc.navigate_to(&grid, Cell::new(10, 10)), NavOutcome::Unreachable);
        assert!(mc.is_sitting());
        assert_eq!(mc.seat(), Some(seat));
        assert_eq!(mc.avatar().facing, Facing::North);
    }

    #[test]
    fn test_held_step_ignored_while_sitting() {
        let grid = Grid::open(20, 16);
        let seats = [Seat::new(6, 6, Facing::North)];
        let mut mc = controller_at(6, 6);
        mc.seek_seat(&grid, &seats, &[]);
        assert_eq!(mc.step_held(&grid, 1, 0), NavOutcome::Rejected);
        assert!(mc.is_sitting());
    }

    #[test]
    fn test_preset_seats_reachable_from_spawn() {
        for id in RoomId::ALL {
            let layout = RoomLayout::preset(id);
            let grid = Grid::from_layout(&layout);
            for seat in &layout.seats {
                let path = grid.find_path(layout.spawn, seat.cell());
                assert!(path.len() > 1, "{:?} seat {:?} unreachable", id, seat);
            }
        }
    }
}
