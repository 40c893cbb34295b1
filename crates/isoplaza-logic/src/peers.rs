//! Remote avatar smoothing.
//!
//! The transport delivers authoritative [`Peer`] snapshots at its own pace.
//! Every frame [`PeerReconciler::reconcile`] moves each smoothed position a
//! fraction `1 - exp(-rate * dt)` of the way toward its snapshot. That
//! fraction composes across frames, so convergence speed does not depend on
//! the frame rate. Entries are inserted when an id first appears and dropped
//! on the first frame it is missing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::facing::Facing;
use crate::grid::Cell;
use crate::palette::{self, Rgba};

pub const DEFAULT_PEER_NAME: &str = "Guest";

/// Authoritative state of a remote participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub facing: Facing,
    #[serde(default)]
    pub sit: bool,
    #[serde(default)]
    pub wave: bool,
    #[serde(default)]
    pub laugh: bool,
    /// Shirt colour as `#rrggbb`.
    #[serde(default)]
    pub color: Option<String>,
}

impl Peer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            facing: Facing::South,
            sit: false,
            wave: false,
            laugh: false,
            color: None,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            DEFAULT_PEER_NAME
        } else {
            &self.name
        }
    }

    /// Cell the peer occupies, by rounding.
    pub fn cell(&self) -> Cell {
        Cell::round(self.x, self.y)
    }

    pub fn shirt(&self) -> Rgba {
        self.color
            .as_deref()
            .and_then(Rgba::parse_hex)
            .unwrap_or(palette::AVATAR_SHIRT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedPeer {
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
}

/// Fraction of the remaining distance covered in `dt` seconds.
pub fn blend_factor(rate: f32, dt: f32) -> f32 {
    if dt <= 0.0 || rate <= 0.0 {
        return 0.0;
    }
    (1.0 - (-rate * dt).exp()).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct PeerReconciler {
    rate: f32,
    smoothed: HashMap<String, SmoothedPeer>,
}

impl PeerReconciler {
    pub fn new(rate: f32) -> Self {
        Self {
            rate,
            smoothed: HashMap::new(),
        }
    }

    /// One smoothing pass against the latest snapshot.
    pub fn reconcile(&mut self, peers: &[Peer], dt: f32) {
        let alpha = blend_factor(self.rate, dt);
        for p in peers {
            let s = self.smoothed.entry(p.id.clone()).or_insert(SmoothedPeer {
                x: p.x,
                y: p.y,
                facing: p.facing,
            });
            s.x += (p.x - s.x) * alpha;
            s.y += (p.y - s.y) * alpha;
            s.facing = p.facing;
        }
        self.smoothed
            .retain(|id, _| peers.iter().any(|p| &p.id == id));
    }

    pub fn get(&self, id: &str) -> Option<&SmoothedPeer> {
        self.smoothed.get(id)
    }

    pub fn len(&self) -> usize {
        self.smoothed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.smoothed.is_empty()
    }

    pub fn clear(&mut self) {
        self.smoothed.clear();
    }

    /// Peers paired with their smoothed state, farthest (smallest y) first.
    pub fn depth_sorted<'a>(&self, peers: &'a [Peer]) -> Vec<(&'a Peer, SmoothedPeer)> {
        let mut out: Vec<(&Peer, SmoothedPeer)> = peers
            .iter()
            .map(|p| {
                let s = self.smoothed.get(&p.id).copied().unwrap_or(SmoothedPeer {
                    x: p.x,
                    y: p.y,
                    facing: p.facing,
                });
                (p, s)
            })
            .collect();
        out.sort_by(|a, b| a.1.y.total_cmp(&b.1.y));
        out
    }
}
