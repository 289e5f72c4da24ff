//! Brand kits: named, reusable style presets.
//!
//! A [`BrandKit`] captures the brand-defining subset of a [`StyleConfig`]
//! (colors, font, mode, texture and pattern) so it can be applied to other
//! designs. Content, effect intensities and shape settings are left alone.
//!
//! # Example
//!
//! ```
//! use favicon_studio::{BackgroundMode, BrandKit, BrandKitLibrary, StyleConfig, StyleEdit};
//!
//! let branded = StyleConfig::default().apply(StyleEdit::Mode(BackgroundMode::Glow));
//! let kit = BrandKit::capture("Acme", &branded).unwrap();
//!
//! let mut library = BrandKitLibrary::new();
//! library.save(kit);
//!
//! // Serialize for storage
//! let json = library.to_json().unwrap();
//! let restored = BrandKitLibrary::from_json(&json).unwrap();
//!
//! let design = restored.get("Acme").unwrap().apply_to(&StyleConfig::default());
//! assert_eq!(design.mode, BackgroundMode::Glow);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::HexColor;
use crate::config::{BackgroundMode, Pattern, StyleConfig, Texture};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrandKitError {
    #[error("brand kit name is empty")]
    MissingName,
}

// ============================================================================
// BrandStyle
// ============================================================================

/// The part of a [`StyleConfig`] that a brand kit carries.
///
/// # JSON Format
///
/// ```json
/// {
///   "background": "#dc2626",
///   "foreground": "#ffffff",
///   "fontFamily": "Inter",
///   "fontWeight": 700,
///   "mode": "gradient",
///   "gradient": ["#dc2626", "#000000"],
///   "texture": "none",
///   "pattern": "circles"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct BrandStyle {
    pub background: HexColor,
    pub foreground: HexColor,
    pub font_family: String,
    pub font_weight: u16,
    pub mode: BackgroundMode,
    pub gradient: (HexColor, HexColor),
    pub texture: Texture,
    pub pattern: Pattern,
}

impl From<&StyleConfig> for BrandStyle {
    fn from(config: &StyleConfig) -> Self {
        Self {
            background: config.background,
            foreground: config.foreground,
            font_family: config.font_family.clone(),
            font_weight: config.font_weight,
            mode: config.mode,
            gradient: config.gradient,
            texture: config.texture,
            pattern: config.pattern,
        }
    }
}

// ============================================================================
// BrandKit
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct BrandKit {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub keywords: Vec<String>,

    pub style: BrandStyle,
}

impl BrandKit {
    /// Captures the brand subset of `config` under `name`.
    ///
    /// The name is trimmed; an empty name is rejected.
    pub fn capture(name: &str, config: &StyleConfig) -> Result<Self, BrandKitError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BrandKitError::MissingName);
        }
        Ok(Self {
            name: name.to_string(),
            description: String::new(),
            keywords: Vec::new(),
            style: config.into(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `config` with the kit's style fields overwritten.
    pub fn apply_to(&self, config: &StyleConfig) -> StyleConfig {
        let style = &self.style;
        StyleConfig {
            background: style.background,
            foreground: style.foreground,
            font_family: style.font_family.clone(),
            font_weight: style.font_weight,
            mode: style.mode,
            gradient: style.gradient,
            texture: style.texture,
            pattern: style.pattern,
            ..config.clone()
        }
        .normalized()
    }
}

// ============================================================================
// BrandKitLibrary
// ============================================================================

/// An ordered collection of brand kits with unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrandKitLibrary {
    kits: Vec<BrandKit>,
}

impl BrandKitLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `kit`, replacing an existing kit with the same name in place.
    pub fn save(&mut self, kit: BrandKit) {
        match self.kits.iter_mut().find(|existing| existing.name == kit.name) {
            Some(existing) => *existing = kit,
            None => self.kits.push(kit),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BrandKit> {
        self.kits.iter().find(|kit| kit.name == name)
    }

    /// Removes and returns the kit named `name`.
    pub fn remove(&mut self, name: &str) -> Option<BrandKit> {
        let index = self.kits.iter().position(|kit| kit.name == name)?;
        Some(self.kits.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BrandKit> {
        self.kits.iter()
    }

    pub fn len(&self) -> usize {
        self.kits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kits.is_empty()
    }

    /// Serializes the library to a JSON array.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a library from a JSON array.
    ///
    /// Later kits replace earlier kits with the same name.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let kits: Vec<BrandKit> = serde_json::from_str(json)?;
        let mut library = Self::new();
        for kit in kits {
            library.save(kit);
        }
        Ok(library)
    }
}

// ============================================================================
// Tests
// ============================================================================
