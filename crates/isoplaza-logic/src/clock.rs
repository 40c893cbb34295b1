//! Animation time accumulators.
//!
//! Two independent clocks: gameplay time speeds up while the local avatar
//! walks (drives limb swing, stall pulses, bob), background time advances at
//! a constant slow rate (sky, clouds, birds) so the scenery never pauses or
//! races with gameplay.

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationClock {
    gameplay: f32,
    background: f32,
    moving_rate: f32,
    idle_rate: f32,
    background_rate: f32,
}

impl AnimationClock {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            gameplay: 0.0,
            background: 0.0,
            moving_rate: config.anim_rate_moving,
            idle_rate: config.anim_rate_idle,
            background_rate: config.background_rate,
        }
    }

    pub fn advance(&mut self, dt: f32, moving: bool) {
        let dt = dt.max(0.0);
        let rate = if moving {
            self.moving_rate
        } else {
            self.idle_rate
        };
        self.gameplay += dt * rate;
        self.background += dt * self.background_rate;
    }

    pub fn gameplay(&self) -> f32 {
        self.gameplay
    }

    pub fn background(&self) -> f32 {
        self.background
    }
}
