//! Style configuration and its update reducer.
//!
//! A [`StyleConfig`] is an immutable value describing one favicon design.
//! The session never mutates it in place; every user edit is expressed as a
//! [`StyleEdit`] and applied with [`StyleConfig::apply`], which returns a new
//! value with the edit applied and clamped to its valid range.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "content": "text",
//!   "glyph": "P",
//!   "fontFamily": "Inter",
//!   "fontWeight": 700,
//!   "mode": "gradient",
//!   "gradient": ["#dc2626", "#000000"],
//!   "borderRadius": 20.0
//! }
//! ```
//!
//! Missing fields take their default values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::HexColor;

/// Maximum number of characters in a typed glyph.
pub const MAX_GLYPH_CHARS: usize = 3;

pub const SHADOW_INTENSITY_MAX: f32 = 20.0;
pub const GLOW_INTENSITY_MAX: f32 = 30.0;
pub const LOGO_SCALE_MIN: f32 = 20.0;
pub const LOGO_SCALE_MAX: f32 = 120.0;
pub const BORDER_RADIUS_MAX: f32 = 50.0;
pub const BORDER_WIDTH_MAX: f32 = 10.0;

// ============================================================================
// Enums
// ============================================================================

/// What is drawn in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ContentSource {
    /// Up to three typed characters.
    #[default]
    Text,
    /// A single icon (usually an emoji).
    Icon,
    /// An uploaded logo bitmap.
    Logo,
}

/// Background treatment and the matching foreground effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BackgroundMode {
    #[default]
    Solid,
    Gradient,
    Outline,
    Shadow,
    Glow,
    #[serde(rename = "3d", alias = "three-d")]
    #[cfg_attr(feature = "clap", value(name = "3d"))]
    ThreeD,
}

impl BackgroundMode {
    /// Short name used in file names (`solid`, `gradient`, ..., `3d`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Gradient => "gradient",
            Self::Outline => "outline",
            Self::Shadow => "shadow",
            Self::Glow => "glow",
            Self::ThreeD => "3d",
        }
    }
}

/// Fine repeating texture drawn over the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Texture {
    #[default]
    None,
    Dots,
    Lines,
    Grid,
}

/// Randomly placed shapes drawn over the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Pattern {
    #[default]
    None,
    Circles,
    Triangles,
}

// ============================================================================
// StyleConfig
// ============================================================================

/// The full set of visual parameters for one render.
///
/// Gradient colors only matter in [`BackgroundMode::Gradient`], the shadow
/// intensity only in [`BackgroundMode::Shadow`], and the glow fields only in
/// [`BackgroundMode::Glow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct StyleConfig {
    pub content: ContentSource,

    /// Typed text, 1-3 characters.
    pub glyph: String,

    /// Selected icon string.
    pub icon: String,

    pub font_family: String,

    /// CSS font weight (100-900).
    pub font_weight: u16,

    pub mode: BackgroundMode,

    /// Fill color for every mode except gradient; stroke color for outline.
    pub background: HexColor,

    /// Glyph color.
    pub foreground: HexColor,

    /// Start and end color of the diagonal background gradient.
    pub gradient: (HexColor, HexColor),

    /// Shadow offset (and logo shadow blur) in pixels, 0-20.
    pub shadow_intensity: f32,

    /// Glow blur radius in pixels, 0-30.
    pub glow_intensity: f32,

    pub glow_color: HexColor,

    /// Logo side as a percentage of the icon side, 20-120.
    pub logo_scale: f32,

    /// Corner radius as a percentage of the icon side, 0-50.
    pub border_radius: f32,

    /// Border stroke width in pixels, 0-10.
    pub border_width: f32,

    pub border_color: HexColor,

    pub texture: Texture,

    pub pattern: Pattern,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let red = HexColor::new(0xdc, 0x26, 0x26);
        Self {
            content: ContentSource::Text,
            glyph: "P".to_string(),
            icon: "🚀".to_string(),
            font_family: "Inter".to_string(),
            font_weight: 700,
            mode: BackgroundMode::Solid,
            background: red,
            foreground: HexColor::WHITE,
            gradient: (red, HexColor::BLACK),
            shadow_intensity: 5.0,
            glow_intensity: 10.0,
            glow_color: red,
            logo_scale: 80.0,
            border_radius: 0.0,
            border_width: 0.0,
            border_color: HexColor::BLACK,
            texture: Texture::None,
            pattern: Pattern::None,
        }
    }
}

impl StyleConfig {
    /// Returns a new config with `edit` applied.
    ///
    /// Numeric values are clamped to their valid range and typed text is
    /// truncated to [`MAX_GLYPH_CHARS`] characters.
    ///
    /// ```
    /// use favicon_studio::{StyleConfig, StyleEdit};
    ///
    /// let config = StyleConfig::default()
    ///     .apply(StyleEdit::Glyph("ACME".into()))
    ///     .apply(StyleEdit::BorderRadius(80.0));
    ///
    /// assert_eq!(config.glyph, "ACM");
    /// assert_eq!(config.border_radius, 50.0);
    /// ```
    pub fn apply(&self, edit: StyleEdit) -> Self {
        let mut next = self.clone();
        match edit {
            StyleEdit::Content(content) => next.content = content,
            StyleEdit::Glyph(text) => next.glyph = truncate_glyph(&text),
            StyleEdit::Icon(icon) => next.icon = icon,
            StyleEdit::FontFamily(family) => next.font_family = family,
            StyleEdit::FontWeight(weight) => next.font_weight = weight,
            StyleEdit::Mode(mode) => next.mode = mode,
            StyleEdit::Background(color) => next.background = color,
            StyleEdit::Foreground(color) => next.foreground = color,
            StyleEdit::GradientColors(start, end) => next.gradient = (start, end),
            StyleEdit::ShadowIntensity(value) => next.shadow_intensity = value,
            StyleEdit::GlowIntensity(value) => next.glow_intensity = value,
            StyleEdit::GlowColor(color) => next.glow_color = color,
            StyleEdit::LogoScale(value) => next.logo_scale = value,
            StyleEdit::BorderRadius(value) => next.border_radius = value,
            StyleEdit::BorderWidth(value) => next.border_width = value,
            StyleEdit::BorderColor(color) => next.border_color = color,
            StyleEdit::Texture(texture) => next.texture = texture,
            StyleEdit::Pattern(pattern) => next.pattern = pattern,
        }
        next.normalized()
    }

    /// Clamps every numeric field into its valid range.
    pub fn normalized(mut self) -> Self {
        self.glyph = truncate_glyph(&self.glyph);
        self.font_weight = self.font_weight.clamp(100, 900);
        self.shadow_intensity = clamp_or(self.shadow_intensity, 0.0, SHADOW_INTENSITY_MAX);
        self.glow_intensity = clamp_or(self.glow_intensity, 0.0, GLOW_INTENSITY_MAX);
        self.logo_scale = clamp_or(self.logo_scale, LOGO_SCALE_MIN, LOGO_SCALE_MAX);
        self.border_radius = clamp_or(self.border_radius, 0.0, BORDER_RADIUS_MAX);
        self.border_width = clamp_or(self.border_width, 0.0, BORDER_WIDTH_MAX);
        self
    }

    /// Returns the string drawn in the foreground, if the content is textual.
    ///
    /// Returns `None` for logo content and for blank text.
    pub fn active_glyph(&self) -> Option<&str> {
        let glyph = match self.content {
            ContentSource::Text => self.glyph.as_str(),
            ContentSource::Icon => self.icon.as_str(),
            ContentSource::Logo => return None,
        };
        if glyph.trim().is_empty() {
            None
        } else {
            Some(glyph)
        }
    }

    /// Name used for the exported package: the glyph, or `"logo"`.
    pub fn content_name(&self) -> String {
        match self.content {
            ContentSource::Logo => "logo".to_string(),
            ContentSource::Text => self.glyph.trim().to_string(),
            ContentSource::Icon => self.icon.trim().to_string(),
        }
    }

    /// Checks that the config has the input it needs before generation.
    ///
    /// `logo_loaded` reports whether a logo asset is currently available.
    pub fn validate(&self, logo_loaded: bool) -> Result<(), ValidationError> {
        match self.content {
            ContentSource::Logo if !logo_loaded => Err(ValidationError::MissingLogo),
            ContentSource::Logo => Ok(()),
            ContentSource::Text | ContentSource::Icon => match self.active_glyph() {
                Some(_) => Ok(()),
                None => Err(ValidationError::EmptyGlyph),
            },
        }
    }

    /// Serializes the config to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the config to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes and normalizes a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::normalized)
    }
}

fn truncate_glyph(text: &str) -> String {
    text.chars().take(MAX_GLYPH_CHARS).collect()
}

fn clamp_or(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}

// ============================================================================
// StyleEdit
// ============================================================================

/// A single user edit to a [`StyleConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum StyleEdit {
    Content(ContentSource),
    Glyph(String),
    Icon(String),
    FontFamily(String),
    FontWeight(u16),
    Mode(BackgroundMode),
    Background(HexColor),
    Foreground(HexColor),
    GradientColors(HexColor, HexColor),
    ShadowIntensity(f32),
    GlowIntensity(f32),
    GlowColor(HexColor),
    LogoScale(f32),
    BorderRadius(f32),
    BorderWidth(f32),
    BorderColor(HexColor),
    Texture(Texture),
    Pattern(Pattern),
}

// ============================================================================
// Validation
// ============================================================================

/// Missing input detected before generation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("enter text for your favicon")]
    EmptyGlyph,

    #[error("upload a logo image")]
    MissingLogo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tool_defaults() {
        let config = StyleConfig::default();
        assert_eq!(config.content, ContentSource::Text);
        assert_eq!(config.glyph, "P");
        assert_eq!(config.background.to_string(), "#dc2626");
        assert_eq!(config.foreground.to_string(), "#ffffff");
        assert_eq!(config.gradient.1, HexColor::BLACK);
        assert_eq!(config.logo_scale, 80.0);
        assert_eq!(config.texture, Texture::None);
    }

    #[test]
    fn apply_returns_new_value() {
        let original = StyleConfig::default();
        let edited = original.apply(StyleEdit::Mode(BackgroundMode::Glow));
        assert_eq!(original.mode, BackgroundMode::Solid);
        assert_eq!(edited.mode, BackgroundMode::Glow);
    }

    #[test]
    fn apply_clamps_numeric_edits() {
        let config = StyleConfig::default()
            .apply(StyleEdit::ShadowIntensity(100.0))
            .apply(StyleEdit::GlowIntensity(-3.0))
            .apply(StyleEdit::LogoScale(5.0))
            .apply(StyleEdit::BorderWidth(f32::NAN))
            .apply(StyleEdit::FontWeight(1000));
        assert_eq!(config.shadow_intensity, SHADOW_INTENSITY_MAX);
        assert_eq!(config.glow_intensity, 0.0);
        assert_eq!(config.logo_scale, LOGO_SCALE_MIN);
        assert_eq!(config.border_width, 0.0);
        assert_eq!(config.font_weight, 900);
    }

    #[test]
    fn glyph_truncates_by_character() {
        let config = StyleConfig::default().apply(StyleEdit::Glyph("日本語です".into()));
        assert_eq!(config.glyph, "日本語");
    }

    #[test]
    fn active_glyph_follows_content_source() {
        let config = StyleConfig::default();
        assert_eq!(config.active_glyph(), Some("P"));

        let icon = config.apply(StyleEdit::Content(ContentSource::Icon));
        assert_eq!(icon.active_glyph(), Some("🚀"));

        let logo = config.apply(StyleEdit::Content(ContentSource::Logo));
        assert_eq!(logo.active_glyph(), None);

        let blank = config.apply(StyleEdit::Glyph("  ".into()));
        assert_eq!(blank.active_glyph(), None);
    }

    #[test]
    fn validation_errors() {
        let blank = StyleConfig::default().apply(StyleEdit::Glyph(String::new()));
        assert_eq!(blank.validate(true), Err(ValidationError::EmptyGlyph));

        let logo = StyleConfig::default().apply(StyleEdit::Content(ContentSource::Logo));
        assert_eq!(logo.validate(false), Err(ValidationError::MissingLogo));
        assert_eq!(logo.validate(true), Ok(()));

        assert_eq!(StyleConfig::default().validate(false), Ok(()));
    }

    #[test]
    fn content_name() {
        let config = StyleConfig::default();
        assert_eq!(config.content_name(), "P");
        assert_eq!(
            config.apply(StyleEdit::Content(ContentSource::Logo)).content_name(),
            "logo"
        );
    }

    #[test]
    fn json_roundtrip_and_format() {
        let config = StyleConfig::default()
            .apply(StyleEdit::Mode(BackgroundMode::ThreeD))
            .apply(StyleEdit::Texture(Texture::Grid));

        let json = config.to_json_pretty().unwrap();
        assert!(json.contains("\"fontFamily\""));
        assert!(json.contains("\"3d\""));
        assert!(json.contains("\"grid\""));

        let restored = StyleConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn partial_json_uses_defaults_and_clamps() {
        let config =
            StyleConfig::from_json(r##"{"glyph": "XYZW", "borderRadius": 75, "mode": "three-d"}"##)
                .unwrap();
        assert_eq!(config.glyph, "XYZ");
        assert_eq!(config.border_radius, 50.0);
        assert_eq!(config.mode, BackgroundMode::ThreeD);
        assert_eq!(config.font_family, "Inter");
    }

    #[test]
    fn invalid_color_is_rejected() {
        assert!(StyleConfig::from_json(r##"{"background": "#12345"}"##).is_err());
    }
}
