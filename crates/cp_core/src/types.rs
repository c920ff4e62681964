use serde::{Deserialize, Serialize};

pub type MatchId = u32;
pub type PlayerId = u32;
pub type TeamId = u32;

/// Tracking frame index. Signed so a window below frame 0 is representable.
pub type FrameNo = i64;

/// Position in pitch units, origin at the center spot, x toward the right goal, y up.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PitchPos {
    pub x: f64,
    pub y: f64,
}

impl PitchPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The player highlighted across rendered frames
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FocalPlayer {
    pub id: PlayerId,
    pub name: String,
}

impl FocalPlayer {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// Field dimensions in pitch units (length along x, width along y)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PitchDims {
    pub length: f64,
    pub width: f64,
}

impl PitchDims {
    pub fn standard() -> Self {
        Self { length: 105.0, width: 68.0 }
    }

    pub fn is_valid(&self) -> bool {
        self.length.is_finite() && self.width.is_finite() && self.length > 0.0 && self.width > 0.0
    }

    pub fn half_length(&self) -> f64 {
        self.length / 2.0
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }
}

/// 8-bit RGB color as found in kit metadata (`#RRGGBB`)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8 { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb8 = Rgb8 { r: 255, g: 255, b: 255 };
    pub const BLUE: Rgb8 = Rgb8 { r: 0, g: 0, b: 255 };
    pub const GREY: Rgb8 = Rgb8 { r: 176, g: 176, b: 176 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `RRGGBB` or `#RGB`.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        // from_str_radix alone would take a leading '+'
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self { r, g, b })
            }
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Self { r: r * 17, g: g * 17, b: b * 17 })
            }
            _ => None,
        }
    }
}
