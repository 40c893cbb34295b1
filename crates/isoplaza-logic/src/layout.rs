//! Room catalogue: the data that shapes each room.
//!
//! Every room is described by a [`RoomLayout`]: grid size, spawn point,
//! obstacle rectangles, seats, interactive stalls and passive decorations.
//! The three built-in presets are plain tables below; any other layout can
//! be loaded from JSON and checked with [`validate_layout`]. Furniture
//! drawing and hit-testing both consume the same stall table, so there is no
//! per-room branching anywhere else in the engine.
//!
//! ```
//! use isoplaza_logic::layout::{validate_layout, RoomId, RoomLayout};
//!
//! let layout = RoomLayout::preset(RoomId::parse("Café"));
//! assert_eq!(layout.id, RoomId::Cafe);
//! assert!(validate_layout(&layout).is_empty());
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::facing::Facing;
use crate::grid::{Cell, Grid, MAX_GRID_SIDE};

/// Closed enumeration of room presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoomId {
    #[default]
    Lobby,
    Cafe,
    Rooftop,
}

impl RoomId {
    pub const ALL: [RoomId; 3] = [RoomId::Lobby, RoomId::Cafe, RoomId::Rooftop];

    /// Parse a room identifier. Matching is case-insensitive and accepts the
    /// display titles too; anything unrecognised falls back to the lobby.
    pub fn parse(s: &str) -> RoomId {
        match s.trim().to_lowercase().as_str() {
            "lobby" | "main market" => RoomId::Lobby,
            "cafe" | "café" | "produce area" => RoomId::Cafe,
            "rooftop" | "trading area" => RoomId::Rooftop,
            other => {
                log::debug!("Unknown room '{}', falling back to Lobby", other);
                RoomId::Lobby
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RoomId::Lobby => "Lobby",
            RoomId::Cafe => "Cafe",
            RoomId::Rooftop => "Rooftop",
        }
    }

    /// Player-facing title.
    pub fn title(self) -> &'static str {
        match self {
            RoomId::Lobby => "Main Market",
            RoomId::Cafe => "Produce Area",
            RoomId::Rooftop => "Trading Area",
        }
    }
}

/// Inclusive rectangle of cells, `x0..=x1` × `y0..=y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl CellRect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub const fn single(x: i32, y: i32) -> Self {
        Self::new(x, y, x, y)
    }

    /// Horizontal run on one row.
    pub const fn row(x0: i32, x1: i32, y: i32) -> Self {
        Self::new(x0, y, x1, y)
    }

    /// Vertical run on one column.
    pub const fn column(x: i32, y0: i32, y1: i32) -> Self {
        Self::new(x, y0, x, y1)
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (x0, x1) = (self.x0.min(self.x1), self.x0.max(self.x1));
        let (y0, y1) = (self.y0.min(self.y1), self.y0.max(self.y1));
        (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| Cell::new(x, y)))
    }

    /// Intersection with a `cols` × `rows` grid, normalised. `None` when
    /// the rectangle lies entirely off the grid.
    pub fn clipped(&self, cols: i32, rows: i32) -> Option<CellRect> {
        let x0 = self.x0.min(self.x1).max(0);
        let x1 = self.x0.max(self.x1).min(cols - 1);
        let y0 = self.y0.min(self.y1).max(0);
        let y1 = self.y0.max(self.y1).min(rows - 1);
        (x0 <= x1 && y0 <= y1).then(|| CellRect::new(x0, y0, x1, y1))
    }
}

/// A claimable seat with a prescribed facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub x: i32,
    pub y: i32,
    pub facing: Facing,
}

impl Seat {
    pub const fn new(x: i32, y: i32, facing: Facing) -> Self {
        Self { x, y, facing }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// What a stall offers; drives glow, prompt copy and routing downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StallKind {
    Prediction,
    Produce,
    Trading,
    General,
}

impl StallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StallKind::Prediction => "prediction",
            StallKind::Produce => "produce",
            StallKind::Trading => "trading",
            StallKind::General => "general",
        }
    }

    /// Featured stalls pulse a glow and orbit particles.
    pub fn is_featured(self) -> bool {
        matches!(self, StallKind::Produce | StallKind::Trading)
    }

    /// Glyph orbiting a featured stall.
    pub fn particle_glyph(self) -> &'static str {
        match self {
            StallKind::Produce => "🌱",
            _ => "💰",
        }
    }

    /// One-line pitch shown in the visit prompt.
    pub fn description(self) -> &'static str {
        match self {
            StallKind::Prediction => {
                "Enter the prediction markets to bet on future events with KALE tokens!"
            }
            StallKind::Produce => "Browse fresh organic produce from local farmers.",
            StallKind::Trading => "Access KALE trading, futures, and DeFi services.",
            StallKind::General => "Explore KALE-powered services and earn rewards!",
        }
    }
}

pub const DEFAULT_STALL_TITLE: &str = "KALE Service";

/// An interactive point of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallSpec {
    pub id: String,
    pub kind: StallKind,
    pub x: i32,
    pub y: i32,
    /// Short ground label.
    pub label: String,
    pub icon: String,
    /// Title used in the visit prompt.
    #[serde(default)]
    pub title: Option<String>,
}

impl StallSpec {
    fn new(id: &str, kind: StallKind, x: i32, y: i32, label: &str, icon: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            x,
            y,
            label: label.to_string(),
            icon: icon.to_string(),
            title: Some(title.to_string()),
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_STALL_TITLE)
    }
}

/// Passive room dressing with no hit box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decoration {
    CropPlot { x: i32, y: i32 },
}

/// Everything needed to build and dress one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomLayout {
    pub id: RoomId,
    pub cols: i32,
    pub rows: i32,
    pub spawn: Cell,
    #[serde(default)]
    pub spawn_facing: Facing,
    #[serde(default)]
    pub obstacles: Vec<CellRect>,
    #[serde(default)]
    pub seats: Vec<Seat>,
    #[serde(default)]
    pub stalls: Vec<StallSpec>,
    #[serde(default)]
    pub decorations: Vec<Decoration>,
}

pub const PRESET_COLS: i32 = 20;
pub const PRESET_ROWS: i32 = 16;

impl RoomLayout {
    /// Built-in layout for a room.
    pub fn preset(id: RoomId) -> Self {
        match id {
            RoomId::Lobby => lobby(),
            RoomId::Cafe => cafe(),
            RoomId::Rooftop => rooftop(),
        }
    }

    /// Parse and validate a layout from JSON.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let layout: RoomLayout = serde_json::from_str(json)?;
        let issues = validate_layout(&layout);
        if issues.is_empty() {
            Ok(layout)
        } else {
            log::warn!(
                "Layout {} rejected with {} issue(s)",
                layout.id.name(),
                issues.len()
            );
            Err(LayoutError::Invalid(issues))
        }
    }

    pub fn to_json(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn stall(&self, id: &str) -> Option<&StallSpec> {
        self.stalls.iter().find(|s| s.id == id)
    }
}

fn lobby() -> RoomLayout {
    use StallKind::*;
    RoomLayout {
        id: RoomId::Lobby,
        cols: PRESET_COLS,
        rows: PRESET_ROWS,
        spawn: Cell::new(6, 6),
        spawn_facing: Facing::South,
        obstacles: vec![
            CellRect::new(8, 6, 11, 9),
            CellRect::row(3, 4, 4),
            CellRect::row(15, 16, 10),
            CellRect::row(8, 10, 2),
            CellRect::single(13, 12),
            CellRect::single(5, 9),
        ],
        seats: vec![
            Seat::new(3, 5, Facing::North),
            Seat::new(4, 5, Facing::North),
            Seat::new(15, 11, Facing::North),
            Seat::new(16, 11, Facing::North),
        ],
        stalls: vec![
            StallSpec::new("prediction-stall", Prediction, 3, 4, "PREDICT", "🔮", "Prediction Market"),
            StallSpec::new("stake-stall", General, 7, 2, "STAKE", "🥬", "KALE Staking"),
            StallSpec::new("yield-stall", General, 14, 3, "YIELD FARM", "🌾", "KALE Yield Farm"),
            StallSpec::new("mall-stall", General, 9, 8, "KALE MALL", "🏬", "KALE Mall"),
            StallSpec::new("liquidity-stall", General, 2, 9, "LIQUIDITY", "💧", "KALE Liquidity"),
            StallSpec::new("rewards-stall", General, 6, 12, "REWARDS", "🎁", "KALE Rewards"),
            StallSpec::new("governance-stall", General, 12, 7, "VOTE", "🗳️", "KALE Governance"),
            StallSpec::new("exchange-stall", General, 16, 11, "EXCHANGE", "🔄", "KALE Exchange"),
        ],
        decorations: Vec::new(),
    }
}

fn cafe() -> RoomLayout {
    use StallKind::*;
    let mut obstacles: Vec<CellRect> = [
        (5, 5),
        (6, 5),
        (5, 6),
        (14, 5),
        (14, 6),
        (13, 5),
        (10, 9),
        (10, 10),
        (9, 9),
        (3, 8),
        (16, 4),
    ]
    .iter()
    .map(|&(x, y)| CellRect::single(x, y))
    .collect();
    obstacles.push(CellRect::row(2, 5, 11));
    obstacles.push(CellRect::row(3, 5, 10));

    RoomLayout {
        id: RoomId::Cafe,
        cols: PRESET_COLS,
        rows: PRESET_ROWS,
        spawn: Cell::new(6, 6),
        spawn_facing: Facing::South,
        obstacles,
        // Seats sit one tile in front of the counters at (5,6) and (14,6).
        seats: vec![
            Seat::new(5, 7, Facing::North),
            Seat::new(14, 7, Facing::North),
            Seat::new(10, 11, Facing::North),
        ],
        stalls: vec![
            StallSpec::new("produce-stall", Produce, 5, 3, "PRODUCE", "🥕", "Produce Shop"),
            StallSpec::new("kale-cafe", General, 12, 5, "KALE CAFÉ", "☕", "KALE Café"),
            StallSpec::new("wellness-stall", General, 16, 8, "WELLNESS", "🧘", "KALE Wellness"),
        ],
        decorations: Vec::new(),
    }
}

fn rooftop() -> RoomLayout {
    use StallKind::*;
    let mut obstacles = Vec::new();
    // Planter pairs on a 5x3 lattice
    for y in (3..PRESET_ROWS - 3).step_by(3) {
        for x in (3..PRESET_COLS - 3).step_by(5) {
            obstacles.push(CellRect::row(x, x + 1, y));
        }
    }
    obstacles.extend([
        CellRect::row(6, 7, 12),
        CellRect::row(12, 13, 12),
        // Trading pit
        CellRect::row(8, 11, 6),
        CellRect::row(8, 11, 10),
        CellRect::column(7, 7, 9),
        CellRect::column(12, 7, 9),
    ]);

    RoomLayout {
        id: RoomId::Rooftop,
        cols: PRESET_COLS,
        rows: PRESET_ROWS,
        spawn: Cell::new(6, 6),
        spawn_facing: Facing::South,
        obstacles,
        seats: vec![Seat::new(6, 13, Facing::North), Seat::new(12, 13, Facing::North)],
        stalls: vec![
            StallSpec::new("trading-stall", Trading, 6, 4, "TRADING", "📈", "Trading Floor"),
            StallSpec::new("futures-stall", Trading, 13, 3, "KALE FUTURES", "📊", "KALE Futures"),
            StallSpec::new("lending-stall", General, 17, 7, "KALE LENDING", "🏦", "KALE Lending"),
            StallSpec::new("insurance-stall", General, 3, 10, "KALE INSURANCE", "🛡️", "KALE Insurance"),
            StallSpec::new("loans-stall", General, 8, 13, "KALE LOANS", "💰", "KALE Loans"),
            StallSpec::new("treasury-stall", General, 15, 12, "TREASURY", "🏛️", "KALE Treasury"),
        ],
        decorations: vec![
            Decoration::CropPlot { x: 5, y: 8 },
            Decoration::CropPlot { x: 11, y: 9 },
            Decoration::CropPlot { x: 14, y: 5 },
        ],
    }
}

/// A problem found while validating a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutIssue {
    /// Needs at least a 3x3 grid to have any interior.
    GridTooSmall { cols: i32, rows: i32 },
    /// Either side is above [`MAX_GRID_SIDE`].
    GridTooLarge { cols: i32, rows: i32 },
    SpawnNotWalkable(Cell),
    SeatNotWalkable(Cell),
    DuplicateSeat(Cell),
    StallOutOfBounds(String),
    DuplicateStallId(String),
    EmptyStallId,
    DecorationOutOfBounds(Cell),
}

impl std::fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutIssue::GridTooSmall { cols, rows } => {
                write!(f, "grid {}x{} is smaller than 3x3", cols, rows)
            }
            LayoutIssue::GridTooLarge { cols, rows } => write!(
                f,
                "grid {}x{} is larger than {}x{}",
                cols, rows, MAX_GRID_SIDE, MAX_GRID_SIDE
            ),
            LayoutIssue::SpawnNotWalkable(c) => write!(f, "spawn ({}, {}) is not walkable", c.x, c.y),
            LayoutIssue::SeatNotWalkable(c) => write!(f, "seat ({}, {}) is not walkable", c.x, c.y),
            LayoutIssue::DuplicateSeat(c) => write!(f, "seat ({}, {}) listed twice", c.x, c.y),
            LayoutIssue::StallOutOfBounds(id) => write!(f, "stall '{}' is off the grid", id),
            LayoutIssue::DuplicateStallId(id) => write!(f, "stall id '{}' used twice", id),
            LayoutIssue::EmptyStallId => write!(f, "stall with an empty id"),
            LayoutIssue::DecorationOutOfBounds(c) => {
                write!(f, "decoration ({}, {}) is off the grid", c.x, c.y)
            }
        }
    }
}

/// Validate a layout, returning every issue found.
pub fn validate_layout(layout: &RoomLayout) -> Vec<LayoutIssue> {
    let mut issues = Vec::new();

    if layout.cols < 3 || layout.rows < 3 {
        issues.push(LayoutIssue::GridTooSmall {
            cols: layout.cols,
            rows: layout.rows,
        });
        return issues;
    }
    if layout.cols > MAX_GRID_SIDE || layout.rows > MAX_GRID_SIDE {
        issues.push(LayoutIssue::GridTooLarge {
            cols: layout.cols,
            rows: layout.rows,
        });
        return issues;
    }

    let grid = Grid::from_layout(layout);

    if !grid.is_walkable_cell(layout.spawn) {
        issues.push(LayoutIssue::SpawnNotWalkable(layout.spawn));
    }

    let mut seen_seats = HashSet::new();
    for seat in &layout.seats {
        if !grid.is_walkable_cell(seat.cell()) {
            issues.push(LayoutIssue::SeatNotWalkable(seat.cell()));
        }
        if !seen_seats.insert(seat.cell()) {
            issues.push(LayoutIssue::DuplicateSeat(seat.cell()));
        }
    }

    let mut seen_ids = HashSet::new();
    for stall in &layout.stalls {
        if stall.id.trim().is_empty() {
            issues.push(LayoutIssue::EmptyStallId);
        } else if !seen_ids.insert(stall.id.as_str()) {
            issues.push(LayoutIssue::DuplicateStallId(stall.id.clone()));
        }
        if !grid.in_bounds(stall.x, stall.y) {
            issues.push(LayoutIssue::StallOutOfBounds(stall.id.clone()));
        }
    }

    for deco in &layout.decorations {
        let Decoration::CropPlot { x, y } = *deco;
        if !grid.in_bounds(x, y) {
            issues.push(LayoutIssue::DecorationOutOfBounds(Cell::new(x, y)));
        }
    }

    issues
}

/// Errors that can occur while loading a layout.
#[derive(Debug)]
pub enum LayoutError {
    Json(serde_json::Error),
    Invalid(Vec<LayoutIssue>),
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        LayoutError::Json(e)
    }
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::Json(e) => write!(f, "Layout parse error: {}", e),
            LayoutError::Invalid(issues) => {
                write!(f, "Invalid layout ({} issue(s)): {:?}", issues.len(), issues)
            }
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayoutError::Json(e) => Some(e),
            LayoutError::Invalid(_) => None,
        }
    }
}
