//! Pure room simulation logic for IsoPlaza.
//!
//! This crate contains the shared isometric room engine independent of any
//! window, network transport or identity service. Functions take plain data
//! and return results, making them unit-testable and portable across the
//! desktop viewer, the headless harness, and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`chat`] | Chat feed, `/sit` `/wave` `/laugh` commands, per-author speech bubbles |
//! | [`clock`] | Gameplay-speed and background-speed animation accumulators |
//! | [`config`] | Engine tunables and their validation |
//! | [`facing`] | Cardinal facing and delta-to-facing rules |
//! | [`grid`] | Tile grid with walkability bitmap built from a room layout |
//! | [`input`] | Pointer/keyboard events and held-direction tracking |
//! | [`interaction`] | Stall hit-testing, approach cells, visit prompts, hover picking |
//! | [`iso`] | 2:1 diamond projection between grid space and screen pixels |
//! | [`layout`] | Room catalogue: obstacles, seats, stalls, decorations (data-driven) |
//! | [`motion`] | Local avatar state machine: path following, held steps, seat seek |
//! | [`palette`] | Colour constants and shading helpers |
//! | [`pathfinding`] | A* over the 4-connected tile grid with deterministic tie-breaks |
//! | [`peers`] | Exponential smoothing of remote avatars toward their latest state |
//! | [`render`] | Per-frame render command list and nameplate layout |
//! | [`sim`] | `RoomSimulation`: owns all entity state, advanced by `tick` |

pub mod chat;
pub mod clock;
pub mod config;
pub mod facing;
pub mod grid;
pub mod input;
pub mod interaction;
pub mod iso;
pub mod layout;
pub mod motion;
pub mod palette;
pub mod pathfinding;
pub mod peers;
pub mod render;
pub mod sim;
