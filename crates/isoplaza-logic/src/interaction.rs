//! Pointer hit-testing and stall visits.
//!
//! Stall hit boxes are screen-space rectangles, so they are only meaningful
//! for the projection they were computed with. The [`StallRegistry`] is
//! rebuilt every frame and tagged with that frame's number; when the
//! viewport or room changes it is invalidated so a click can never consult
//! boxes from an old layout.

use crate::grid::{Cell, Grid};
use crate::layout::{StallKind, StallSpec};
use crate::motion::NavOutcome;

/// Neighbour search order used when a stall's own cell is blocked.
pub const APPROACH_OFFSETS: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
];

/// Axis-aligned hit rectangle around a stall's projected position.
#[derive(Debug, Clone, PartialEq)]
pub struct StallHitBox {
    pub stall_id: String,
    pub kind: StallKind,
    pub cell: Cell,
    /// Centre in screen pixels.
    pub screen_x: f32,
    pub screen_y: f32,
    pub width: f32,
    pub height: f32,
}

impl StallHitBox {
    /// Edges are inclusive.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        px >= self.screen_x - hw
            && px <= self.screen_x + hw
            && py >= self.screen_y - hh
            && py <= self.screen_y + hh
    }
}

/// Frame-scoped stall hit boxes.
#[derive(Debug, Clone, Default)]
pub struct StallRegistry {
    frame: Option<u64>,
    boxes: Vec<StallHitBox>,
}

impl StallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard last frame's boxes and start collecting for `frame`.
    pub fn begin_frame(&mut self, frame: u64) {
        self.boxes.clear();
        self.frame = Some(frame);
    }

    pub fn register(&mut self, hit_box: StallHitBox) {
        self.boxes.push(hit_box);
    }

    /// Forget everything; the next hit test misses until a frame is built.
    pub fn invalidate(&mut self) {
        self.boxes.clear();
        self.frame = None;
    }

    /// Frame the boxes were built for, `None` when invalidated.
    pub fn frame(&self) -> Option<u64> {
        self.frame
    }

    pub fn is_current(&self, frame: u64) -> bool {
        self.frame == Some(frame)
    }

    pub fn boxes(&self) -> &[StallHitBox] {
        &self.boxes
    }

    /// First registered box containing the point, if the registry was
    /// built for `frame`.
    pub fn hit_test(&self, px: f32, py: f32, frame: u64) -> Option<&StallHitBox> {
        if !self.is_current(frame) {
            return None;
        }
        self.boxes.iter().find(|b| b.contains(px, py))
    }
}

/// Cell to walk to when visiting a stall at `stall`: the stall itself if
/// walkable, else the first walkable neighbour in [`APPROACH_OFFSETS`] order.
pub fn approach_cell(grid: &Grid, stall: Cell) -> Option<Cell> {
    if grid.is_walkable_cell(stall) {
        return Some(stall);
    }
    APPROACH_OFFSETS
        .iter()
        .map(|&(dx, dy)| stall.offset(dx, dy))
        .find(|&c| grid.is_walkable_cell(c))
}

/// Travel time estimate for a path of `nodes` cells.
pub fn arrival_delay_ms(nodes: usize, speed: f32) -> u64 {
    if speed <= 0.0 {
        return 0;
    }
    ((nodes as f32 / speed) * 1000.0).round() as u64
}

/// "Visit this stall?" prompt shown on arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitPrompt {
    pub stall_id: String,
    pub kind: StallKind,
    pub title: String,
}

impl VisitPrompt {
    pub fn for_stall(stall: &StallSpec) -> Self {
        Self {
            stall_id: stall.id.clone(),
            kind: stall.kind,
            title: stall.title().to_string(),
        }
    }

    pub fn heading(&self) -> String {
        format!("Visit {}?", self.title)
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }
}

/// Prompt scheduled to open once the avatar should have arrived. The
/// prompt is captured when scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingArrival {
    pub due_at_ms: u64,
    pub prompt: VisitPrompt,
}

impl PendingArrival {
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.due_at_ms
    }
}

/// What a pointer click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Walking toward a stall; its prompt opens on arrival.
    StallApproach { stall_id: String, due_at_ms: u64 },
    /// Stall clicked with no route or already there; prompt opened now.
    StallPrompt { stall_id: String },
    /// Floor click, handled as a navigation request.
    Floor { cell: Cell, outcome: NavOutcome },
}

/// A head the pointer can hover to reveal a nameplate.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y_head: f32,
}

/// Hover hot spot sits a little above the head anchor.
pub const HOVER_LIFT: f32 = 8.0;

/// Nearest target within `radius` of the pointer. Earlier targets win ties.
pub fn pick_hover(targets: &[HoverTarget], px: f32, py: f32, radius: f32) -> Option<&HoverTarget> {
    let mut best: Option<(&HoverTarget, f32)> = None;
    for t in targets {
        let d = (px - t.x).hypot(py - (t.y_head - HOVER_LIFT));
        if d <= radius && best.map_or(true, |(_, bd)| d < bd) {
            best = Some((t, d));
        }
    }
    best.map(|(t, _)| t)
}
