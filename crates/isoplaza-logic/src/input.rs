//! Input surface consumed by [`crate::sim::RoomSimulation`].
//!
//! Pointer coordinates are viewport-relative logical pixels. Keyboard input
//! is reduced to four movement keys; combinations give eight directions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKey {
    Up,
    Down,
    Left,
    Right,
}

impl MoveKey {
    /// Map a key name (DOM-style `key` value) to a movement key.
    /// Arrow keys and WASD are recognised.
    pub fn from_key_name(name: &str) -> Option<MoveKey> {
        match name {
            "ArrowUp" | "w" | "W" => Some(MoveKey::Up),
            "ArrowDown" | "s" | "S" => Some(MoveKey::Down),
            "ArrowLeft" | "a" | "A" => Some(MoveKey::Left),
            "ArrowRight" | "d" | "D" => Some(MoveKey::Right),
            _ => None,
        }
    }

    /// Grid step. Up moves toward row 0.
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveKey::Up => (0, -1),
            MoveKey::Down => (0, 1),
            MoveKey::Left => (-1, 0),
            MoveKey::Right => (1, 0),
        }
    }
}

/// Currently held movement keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl HeldKeys {
    fn slot(&mut self, key: MoveKey) -> &mut bool {
        match key {
            MoveKey::Up => &mut self.up,
            MoveKey::Down => &mut self.down,
            MoveKey::Left => &mut self.left,
            MoveKey::Right => &mut self.right,
        }
    }

    pub fn press(&mut self, key: MoveKey) {
        *self.slot(key) = true;
    }

    pub fn release(&mut self, key: MoveKey) {
        *self.slot(key) = false;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }

    /// Combined step, or `None` when nothing is held or opposites cancel.
    pub fn direction(&self) -> Option<(i32, i32)> {
        let dx = self.right as i32 - self.left as i32;
        let dy = self.down as i32 - self.up as i32;
        if dx == 0 && dy == 0 {
            None
        } else {
            Some((dx, dy))
        }
    }
}

/// Discrete input delivered to the simulation between frames.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerClick { x: f32, y: f32 },
    PointerDoubleClick { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerLeave,
    KeyDown(MoveKey),
    KeyUp(MoveKey),
    /// A text field gained (`true`) or lost focus. Movement keys are
    /// ignored while focused.
    TextFocus(bool),
    ToggleSit,
    /// Cosmetic emote flags, held by the caller.
    SetEmotes { wave: bool, laugh: bool },
    ConfirmVisit,
    DismissVisit,
}
