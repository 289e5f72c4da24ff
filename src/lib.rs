//! favicon-studio: favicon design and export library
//!
//! This crate renders a favicon design (text, an icon or an uploaded logo on
//! a styled background) at any size, and packages the renders into the
//! files a website needs.
//!
//! # Example
//!
//! ```
//! use favicon_studio::{BackgroundMode, FaviconStudio, StyleEdit, Texture};
//!
//! let mut studio = FaviconStudio::new();
//!
//! // Every edit goes through the StyleConfig reducer
//! studio.update(StyleEdit::Glyph("Fx".into()));
//! studio.update(StyleEdit::Mode(BackgroundMode::Gradient));
//! studio.update(StyleEdit::BorderRadius(25.0));
//! studio.update(StyleEdit::Texture(Texture::Dots));
//!
//! // Live previews at 16, 32, 64 and 128 px
//! for (size, surface) in studio.render_previews() {
//!     assert_eq!(surface.device_size(), *size);
//! }
//!
//! // All nine export sizes, then the package files
//! let package = studio.package().unwrap();
//! assert_eq!(package.archive_name(), "favicon-Fx-gradient.zip");
//! assert!(package.file("favicon.ico").is_some());
//! ```
//!
//! # Rendering Without a Session
//!
//! [`CompositionEngine`] renders a [`StyleConfig`] directly onto a
//! [`RasterSurface`]:
//!
//! ```
//! use favicon_studio::{CompositionEngine, RasterSurface, StyleConfig};
//!
//! let engine = CompositionEngine::new();
//! let surface = engine.render_size(64, 2.0, &StyleConfig::default(), None).unwrap();
//! assert_eq!(surface.device_size(), 128);
//! let png = surface.encode_png().unwrap();
//! ```

pub mod brand_kit;
pub mod color;
pub mod config;
pub mod engine;
pub mod export;
pub mod layer;
pub mod matting;
pub mod studio;
pub mod surface;

pub use brand_kit::{BrandKit, BrandKitError, BrandKitLibrary, BrandStyle};
pub use color::{HexColor, ParseColorError};
pub use config::{
    BackgroundMode, ContentSource, Pattern, StyleConfig, StyleEdit, Texture, ValidationError,
};
pub use engine::CompositionEngine;
pub use export::{ExportBundle, ExportError, ExportPackage, WebManifest};
pub use layer::{Layer, RenderContext, ShadowSpec, SvgSource};
pub use matting::{LogoAsset, LogoSlot, MattingError};
pub use studio::{AccessibilityReport, FaviconStudio, GenerationError};
pub use surface::RasterSurface;
