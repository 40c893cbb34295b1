//! Farm-market colour palette.

use serde::{Deserialize, Serialize};

/// 8-bit sRGB colour with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// From a `0xRRGGBB` literal.
    pub const fn hex(v: u32) -> Self {
        Self::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    /// Parse `#rrggbb` or `rrggbb`. Peers send shirt colours this way.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::hex)
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Lighten (positive) or darken (negative) by a percentage toward
    /// white or black.
    pub fn shade(self, percent: f32) -> Self {
        let target = if percent < 0.0 { 0.0 } else { 255.0 };
        let p = (percent.abs() / 100.0).min(1.0);
        let mix = |c: u8| ((target - c as f32) * p + c as f32).round() as u8;
        Self {
            r: mix(self.r),
            g: mix(self.g),
            b: mix(self.b),
            a: self.a,
        }
    }

    /// Components in `0.0..=1.0`.
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

pub const TILE_A: Rgba = Rgba::hex(0xe9c46a);
pub const TILE_B: Rgba = Rgba::hex(0xf4a261);
pub const BLOCK: Rgba = Rgba::hex(0x8b4513);
pub const OUTLINE: Rgba = Rgba::rgb(0, 0, 0);
pub const WALL_TOP: Rgba = Rgba::hex(0xa5a58d);
pub const WALL_SIDE: Rgba = Rgba::hex(0x6b705c);
pub const AVATAR_SHIRT: Rgba = Rgba::hex(0x52b788);
pub const AVATAR_SKIN: Rgba = Rgba::hex(0xddbea9);
pub const AVATAR_HAIR: Rgba = Rgba::hex(0x5b3a1a);
pub const AVATAR_LEGS: Rgba = Rgba::hex(0x2b2b2b);
pub const SKY_TOP: Rgba = Rgba::rgb(235, 246, 255);
pub const CLOUD: Rgba = Rgba::rgb(255, 255, 255);
pub const BIRD: Rgba = Rgba {
    r: 0,
    g: 0,
    b: 0,
    a: 115,
};
pub const SOIL: Rgba = Rgba::hex(0x8b4513);
pub const SPROUT: Rgba = Rgba::hex(0x22c55e);
pub const GLOW_PRODUCE: Rgba = Rgba::hex(0x22c55e);
pub const GLOW_TRADING: Rgba = Rgba::hex(0xf59e0b);
pub const SIGN_AMBER: Rgba = Rgba::hex(0xfbbf24);
pub const INK: Rgba = Rgba::hex(0x111827);
pub const PAPER: Rgba = Rgba {
    r: 255,
    g: 255,
    b: 255,
    a: 242,
};
