//! Color math for style configuration.
//!
//! All colors in a [`StyleConfig`](crate::StyleConfig) are 24-bit sRGB values
//! written as `#rrggbb`. This module provides the [`HexColor`] value type plus
//! the small numeric helpers the tool needs: lightening, WCAG relative
//! luminance and contrast ratio, and the accessibility score derived from it.

use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{BackgroundMode, StyleConfig};

// ============================================================================
// HexColor
// ============================================================================

/// Error returned when a string is not a `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {0:?}: expected 6 hex digits such as \"#dc2626\"")]
pub struct ParseColorError(pub String);

/// An opaque 24-bit sRGB color.
///
/// Serializes to and from the lowercase `#rrggbb` form. The leading `#` is
/// optional when parsing.
///
/// ```
/// use favicon_studio::HexColor;
///
/// let red: HexColor = "#DC2626".parse().unwrap();
/// assert_eq!(red.to_string(), "#dc2626");
/// assert_eq!(red.rgb(), (220, 38, 38));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(Srgb<u8>);

impl HexColor {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self(Srgb::new(red, green, blue))
    }

    /// Returns the `(r, g, b)` channels.
    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.0.red, self.0.green, self.0.blue)
    }

    /// Returns the underlying `palette` color.
    pub fn srgb(&self) -> Srgb<u8> {
        self.0
    }

    /// Returns the color as a tiny-skia color with the given opacity (0.0-1.0).
    pub(crate) fn to_skia(self, opacity: f32) -> resvg::tiny_skia::Color {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        resvg::tiny_skia::Color::from_rgba8(self.0.red, self.0.green, self.0.blue, alpha)
    }
}

impl FromStr for HexColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_string()));
        }
        let rgb = Srgb::<u8>::from_str(digits).map_err(|_| ParseColorError(s.to_string()))?;
        Ok(Self(rgb))
    }
}

impl TryFrom<String> for HexColor {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

#[cfg(feature = "jsonschema")]
impl schemars::JsonSchema for HexColor {
    fn schema_name() -> String {
        "HexColor".to_string()
    }

    fn json_schema(_gen: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        use schemars::schema::{InstanceType, SchemaObject};

        let mut schema = SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            ..SchemaObject::default()
        };
        schema.string().pattern = Some("^#?[0-9a-fA-F]{6}$".to_string());
        schema.into()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.rgb();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

// ============================================================================
// Color Math
// ============================================================================

/// Lightens a color by adding `round(2.55 * percent)` to every channel.
///
/// Channels are clamped to 0-255, so negative percentages darken.
pub fn lighten(color: HexColor, percent: f64) -> HexColor {
    // Half-up rounding, so -0.5 rounds toward zero like the browser does.
    let amount = (2.55 * percent + 0.5).floor() as i32;
    let shift = |channel: u8| (channel as i32 + amount).clamp(0, 255) as u8;
    let (r, g, b) = color.rgb();
    HexColor::new(shift(r), shift(g), shift(b))
}

/// Computes the WCAG relative luminance of a color (0.0 for black, 1.0 for white).
pub fn relative_luminance(color: HexColor) -> f64 {
    let linear = |channel: u8| {
        let c = channel as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    let (r, g, b) = color.rgb();
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// Computes the contrast ratio between two colors.
///
/// The result is symmetric and ranges from 1.0 (identical) to 21.0
/// (black on white).
pub fn contrast_ratio(a: HexColor, b: HexColor) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    (la.max(lb) + 0.05) / (la.min(lb) + 0.05)
}

/// Maps a contrast ratio onto the tool's three-step accessibility score.
///
/// `>= 4.5` scores 100, `>= 3.0` scores 75, anything lower scores 50.
pub fn score_for_ratio(ratio: f64) -> u8 {
    if ratio >= 4.5 {
        100
    } else if ratio >= 3.0 {
        75
    } else {
        50
    }
}

/// The background color used for contrast checks.
///
/// Gradient backgrounds are approximated by lightening the first gradient
/// color by 50%, not by sampling the actual gradient.
pub fn effective_background(config: &StyleConfig) -> HexColor {
    match config.mode {
        BackgroundMode::Gradient => lighten(config.gradient.0, 50.0),
        _ => config.background,
    }
}

/// Contrast ratio between the effective background and the foreground color.
pub fn config_contrast_ratio(config: &StyleConfig) -> f64 {
    contrast_ratio(effective_background(config), config.foreground)
}

/// Accessibility score (50, 75 or 100) for a style configuration.
pub fn accessibility_score(config: &StyleConfig) -> u8 {
    score_for_ratio(config_contrast_ratio(config))
}
