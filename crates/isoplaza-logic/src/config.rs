//! Engine tunables.
//!
//! Every constant the room engine depends on lives in [`EngineConfig`] so a
//! host can load overrides from JSON and check them with
//! [`validate_config`] before building a simulation.
//!
//! ```
//! use isoplaza_logic::config::{validate_config, EngineConfig};
//!
//! let mut config = EngineConfig::default();
//! config.travel_speed = 5.0;
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Full tile width in pixels (2:1 diamond).
    pub tile_width: f32,
    pub tile_height: f32,
    /// Upward nudge applied after centring the floor, pixels.
    pub origin_nudge: f32,
    /// Avatar traversal speed, tiles per second.
    pub travel_speed: f32,
    /// Frame delta cap, seconds. Large stalls do not teleport avatars.
    pub max_frame_delta: f32,
    /// Peer smoothing rate, 1/s. Higher converges faster.
    pub peer_smoothing_rate: f32,
    /// Minimum interval between outbound position reports.
    pub report_interval_ms: u64,
    /// How long a chat line stays above its author.
    pub chat_bubble_ms: u64,
    /// Lifetime of local notices (":)", "No free seat!").
    pub notice_ms: u64,
    /// Most recent chat messages considered for bubbles.
    pub chat_window: usize,
    pub stall_hit_width: f32,
    pub stall_hit_height: f32,
    /// Hit box centre sits this many pixels above the tile's top vertex.
    pub stall_hit_raise: f32,
    /// Gameplay animation rate while walking / idle.
    pub anim_rate_moving: f32,
    pub anim_rate_idle: f32,
    /// Background drift rate, independent of gameplay.
    pub background_rate: f32,
    pub nameplate_retries: u32,
    pub nameplate_step: f32,
    /// Pointer distance from a head that counts as hovering.
    pub hover_radius: f32,
    /// Two clicks closer than this are reported as a double-click.
    pub double_click_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_width: 54.0,
            tile_height: 27.0,
            origin_nudge: 6.0,
            travel_speed: 3.4,
            max_frame_delta: 0.05,
            peer_smoothing_rate: 8.0,
            report_interval_ms: 100,
            chat_bubble_ms: 3000,
            notice_ms: 2000,
            chat_window: 10,
            stall_hit_width: 80.0,
            stall_hit_height: 80.0,
            stall_hit_raise: 10.0,
            anim_rate_moving: 8.0,
            anim_rate_idle: 3.0,
            background_rate: 0.25,
            nameplate_retries: 8,
            nameplate_step: 8.0,
            hover_radius: 28.0,
            double_click_ms: 300,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Tile must be wider than tall and both positive.
    InvalidTileSize { width: f32, height: f32 },
    NonPositiveSpeed(f32),
    NonPositiveFrameDelta(f32),
    NegativeSmoothingRate(f32),
    ZeroReportInterval,
    ZeroChatWindow,
    InvalidHitBox { width: f32, height: f32 },
    NonPositiveHoverRadius(f32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidTileSize { width, height } => {
                write!(f, "tile {}x{} must be positive and wider than tall", width, height)
            }
            ConfigError::NonPositiveSpeed(v) => write!(f, "travel speed {} must be positive", v),
            ConfigError::NonPositiveFrameDelta(v) => {
                write!(f, "max frame delta {} must be positive", v)
            }
            ConfigError::NegativeSmoothingRate(v) => {
                write!(f, "peer smoothing rate {} must not be negative", v)
            }
            ConfigError::ZeroReportInterval => write!(f, "report interval must be non-zero"),
            ConfigError::ZeroChatWindow => write!(f, "chat window must be non-zero"),
            ConfigError::InvalidHitBox { width, height } => {
                write!(f, "stall hit box {}x{} must be positive", width, height)
            }
            ConfigError::NonPositiveHoverRadius(v) => {
                write!(f, "hover radius {} must be positive", v)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validate an engine configuration, returning all errors found.
pub fn validate_config(config: &EngineConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if !(config.tile_width > 0.0 && config.tile_height > 0.0)
        || config.tile_height > config.tile_width
    {
        errors.push(ConfigError::InvalidTileSize {
            width: config.tile_width,
            height: config.tile_height,
        });
    }
    if !(config.travel_speed > 0.0) {
        errors.push(ConfigError::NonPositiveSpeed(config.travel_speed));
    }
    if !(config.max_frame_delta > 0.0) {
        errors.push(ConfigError::NonPositiveFrameDelta(config.max_frame_delta));
    }
    if config.peer_smoothing_rate < 0.0 || config.peer_smoothing_rate.is_nan() {
        errors.push(ConfigError::NegativeSmoothingRate(config.peer_smoothing_rate));
    }
    if config.report_interval_ms == 0 {
        errors.push(ConfigError::ZeroReportInterval);
    }
    if config.chat_window == 0 {
        errors.push(ConfigError::ZeroChatWindow);
    }
    if !(config.stall_hit_width > 0.0 && config.stall_hit_height > 0.0) {
        errors.push(ConfigError::InvalidHitBox {
            width: config.stall_hit_width,
            height: config.stall_hit_height,
        });
    }
    if !(config.hover_radius > 0.0) {
        errors.push(ConfigError::NonPositiveHoverRadius(config.hover_radius));
    }

    errors
}
