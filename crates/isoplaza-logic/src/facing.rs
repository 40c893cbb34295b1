//! Cardinal facing shared by the local avatar, peers and seats.

use serde::{Deserialize, Serialize};

/// One of the four directions an avatar can face.
///
/// Serialized as the single letters `N`, `E`, `S`, `W` so peer snapshots
/// from the transport can be deserialized directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "E")]
    East,
    #[default]
    #[serde(rename = "S")]
    South,
    #[serde(rename = "W")]
    West,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// Facing for a movement delta in grid space.
    ///
    /// The longer axis wins. Equal non-zero components pick the horizontal
    /// axis. A zero delta keeps `current`.
    pub fn from_delta(dx: f32, dy: f32, current: Facing) -> Facing {
        if dx == 0.0 && dy == 0.0 {
            return current;
        }
        if dx.abs() >= dy.abs() {
            if dx > 0.0 {
                Facing::East
            } else {
                Facing::West
            }
        } else if dy > 0.0 {
            Facing::South
        } else {
            Facing::North
        }
    }

    /// Integer-step convenience over [`Facing::from_delta`].
    pub fn from_step(dx: i32, dy: i32, current: Facing) -> Facing {
        Self::from_delta(dx as f32, dy as f32, current)
    }

    /// Unit grid step for this facing (north is -y).
    pub fn step(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::East => (1, 0),
            Facing::South => (0, 1),
            Facing::West => (-1, 0),
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Facing::North => "N",
            Facing::East => "E",
            Facing::South => "S",
            Facing::West => "W",
        }
    }
}
