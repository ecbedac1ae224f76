//! Shift colors

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of fill and font colors a shift may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
    Gray,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl Color {
    /// Every palette entry in display order
    pub const ALL: [Color; 9] = [
        Color::White,
        Color::Black,
        Color::Gray,
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Purple,
    ];

    /// Lowercase wire name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
            Color::Gray => "gray",
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown color name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color '{0}'")]
pub struct UnknownColor(pub String);

impl FromStr for Color {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Color::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

/// Decode a color written by any client, substituting `fallback` for
/// names outside the palette and for non-string values
pub(crate) fn decode_or<'de, D>(deserializer: D, fallback: Color) -> Result<Color, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw
        .as_str()
        .and_then(|name| name.parse().ok())
        .unwrap_or(fallback))
}

/// A fill/font pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorPair {
    /// Background fill
    pub bg: Color,
    /// Font color
    pub font: Color,
}

impl ColorPair {
    /// Fresh shifts: white fill, black text
    pub const DEFAULT: ColorPair = ColorPair {
        bg: Color::White,
        font: Color::Black,
    };

    /// Shift has been worked
    pub const COMPLETE: ColorPair = ColorPair {
        bg: Color::Green,
        font: Color::White,
    };

    /// Shift handed to operations
    pub const OPS: ColorPair = ColorPair {
        bg: Color::Blue,
        font: Color::White,
    };
}

impl Default for ColorPair {
    fn default() -> Self {
        Self::DEFAULT
    }
}
