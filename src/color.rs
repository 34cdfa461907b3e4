//! Color type and swatch formatting helpers.
//!
//! Everything here is pure: hex and `RGB(..)` labels for the swatch cards, and
//! the light/dark text decision drawn on top of each swatch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PaletteError, Result};

/// Channel sum below which a swatch gets light text (half of 3 × 255).
pub const CHANNEL_SUM_THRESHOLD: f32 = 382.5;

/// Rec. 709 luminance below which a swatch gets light text.
pub const LUMINANCE_THRESHOLD: f32 = 127.5;

/// An 8-bit color, always in RGB channel order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn channels(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }

    pub fn channel_sum(self) -> u32 {
        self.red as u32 + self.green as u32 + self.blue as u32
    }

    pub fn to_hex(self) -> String {
        format_hex(self)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl From<[u8; 3]> for Color {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self { red, green, blue }
    }
}

impl TryFrom<(i64, i64, i64)> for Color {
    type Error = PaletteError;

    /// Out-of-range channels are rejected, never wrapped or truncated.
    fn try_from((r, g, b): (i64, i64, i64)) -> Result<Self> {
        let channel = |v: i64| {
            u8::try_from(v).map_err(|_| PaletteError::invalid_color(format!("({r}, {g}, {b})")))
        };
        Ok(Self::new(channel(r)?, channel(g)?, channel(b)?))
    }
}

/// `#rrggbb`, lowercase and zero-padded.
pub fn format_hex(color: Color) -> String {
    color.to_string()
}

/// Hex-format untyped channel values, failing on anything outside `0..=255`.
pub fn format_channels_hex(red: i64, green: i64, blue: i64) -> Result<String> {
    Color::try_from((red, green, blue)).map(format_hex)
}

/// `RGB(r, g, b)` label shown under each swatch.
pub fn format_rgb(color: Color) -> String {
    format!("RGB({}, {}, {})", color.red, color.green, color.blue)
}

/// Parse `#rrggbb` or `rrggbb` (either case) back into a [`Color`].
pub fn parse_hex(s: &str) -> Result<Color> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PaletteError::invalid_color(s));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| PaletteError::invalid_color(s))
    };
    Ok(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Whether text drawn over `color` should be light (white).
///
/// Coarse heuristic: compares the plain channel sum against half of 3 × 255.
/// It ignores how differently the eye weighs each channel; see
/// [`Contrast::Luminance`] for a perceptual alternative.
pub fn is_light_background(color: Color) -> bool {
    Contrast::ChannelSum.use_light_text(color)
}

/// Rule used to pick the overlay text color for a swatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contrast {
    /// Channel sum below [`CHANNEL_SUM_THRESHOLD`].
    #[default]
    ChannelSum,
    /// Rec. 709 relative luminance below [`LUMINANCE_THRESHOLD`].
    Luminance,
}

impl Contrast {
    pub fn use_light_text(self, color: Color) -> bool {
        match self {
            Contrast::ChannelSum => (color.channel_sum() as f32) < CHANNEL_SUM_THRESHOLD,
            Contrast::Luminance => {
                let lum = 0.2126 * color.red as f32
                    + 0.7152 * color.green as f32
                    + 0.0722 * color.blue as f32;
                lum < LUMINANCE_THRESHOLD
            }
        }
    }

    pub fn text_color(self, color: Color) -> Color {
        if self.use_light_text(color) {
            Color::WHITE
        } else {
            Color::BLACK
        }
    }
}
