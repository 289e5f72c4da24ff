//! The favicon design session.

use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::brand_kit::{BrandKit, BrandKitError};
use crate::color::{HexColor, config_contrast_ratio, effective_background, score_for_ratio};
use crate::config::{StyleConfig, StyleEdit, ValidationError};
use crate::engine::CompositionEngine;
use crate::export::{ExportBundle, ExportError, ExportPackage, REQUIRED_SIZES};
use crate::matting::{Completion, LogoSlot, MattingError, RemovalSettings, ReprocessTicket};
use crate::surface::RasterSurface;

/// Sizes rendered for the live preview.
pub const PREVIEW_SIZES: [u32; 4] = [16, 32, 64, 128];

// ============================================================================
// Errors
// ============================================================================

/// Generation failed; no bundle was produced.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to build favicon package")]
    Export(#[from] ExportError),

    #[error("cannot allocate a {size}x{size} render surface")]
    Surface { size: u32 },
}

// ============================================================================
// AccessibilityReport
// ============================================================================

/// Foreground/background contrast of the current design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessibilityReport {
    /// The background the ratio was measured against.
    pub background: HexColor,
    pub foreground: HexColor,

    /// WCAG contrast ratio, 1.0-21.0.
    pub ratio: f64,

    /// 100 at 4.5:1 and above, 75 from 3:1, 50 below.
    pub score: u8,
}

// ============================================================================
// FaviconStudio
// ============================================================================

/// One favicon design session.
///
/// Holds the current [`StyleConfig`], the uploaded logo and a cache of the
/// preview renders. Every change that affects rendering bumps a revision
/// counter; previews are re-rendered lazily when the revision moves on.
///
/// # Example
///
/// ```
/// use favicon_studio::{BackgroundMode, FaviconStudio, StyleEdit};
///
/// let mut studio = FaviconStudio::new();
/// studio.update(StyleEdit::Glyph("AB".into()));
/// studio.update(StyleEdit::Mode(BackgroundMode::Gradient));
///
/// let previews = studio.render_previews();
/// assert_eq!(previews.len(), 4);
///
/// let bundle = studio.generate().unwrap();
/// assert!(bundle.is_complete());
/// ```
pub struct FaviconStudio {
    config: StyleConfig,
    logo: LogoSlot,
    engine: CompositionEngine,
    preview_scale: f32,
    revision: u64,
    previews: Option<(u64, Vec<(u32, RasterSurface)>)>,
}

impl Default for FaviconStudio {
    fn default() -> Self {
        Self::new()
    }
}

impl FaviconStudio {
    /// Creates a session with the default style.
    pub fn new() -> Self {
        Self::with_config(StyleConfig::default())
    }

    pub fn with_config(config: StyleConfig) -> Self {
        Self {
            config: config.normalized(),
            logo: LogoSlot::default(),
            engine: CompositionEngine::new(),
            preview_scale: 1.0,
            revision: 0,
            previews: None,
        }
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    pub fn logo(&self) -> &LogoSlot {
        &self.logo
    }

    /// Applies one edit and returns the new config.
    pub fn update(&mut self, edit: StyleEdit) -> &StyleConfig {
        let next = self.config.apply(edit);
        if next != self.config {
            self.config = next;
            self.touch();
        }
        &self.config
    }

    /// Replaces the whole config, for example after loading a saved style.
    pub fn replace_config(&mut self, config: StyleConfig) {
        self.config = config.normalized();
        self.touch();
    }

    /// Sets the device scale of the preview surfaces.
    ///
    /// Non-finite and non-positive scales are ignored.
    pub fn set_preview_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 && scale != self.preview_scale {
            self.preview_scale = scale;
            self.touch();
        }
    }

    pub fn preview_scale(&self) -> f32 {
        self.preview_scale
    }

    // ------------------------------------------------------------------------
    // Logo
    // ------------------------------------------------------------------------

    /// Decodes and stores an uploaded logo.
    ///
    /// A decode error leaves the current logo in place. When background
    /// removal is enabled, the returned ticket must be run and passed to
    /// [`complete_reprocess`](Self::complete_reprocess).
    pub fn upload_logo(&mut self, bytes: &[u8]) -> Result<Option<ReprocessTicket>, MattingError> {
        let ticket = self.logo.upload(bytes)?;
        self.touch();
        Ok(ticket)
    }

    /// Stores an already decoded logo.
    pub fn set_logo(&mut self, image: RgbaImage) -> Option<ReprocessTicket> {
        let ticket = self.logo.set_original(image);
        self.touch();
        ticket
    }

    /// Changes background-removal settings.
    pub fn set_removal(&mut self, settings: RemovalSettings) -> Option<ReprocessTicket> {
        let before = self.logo.settings();
        let ticket = self.logo.set_removal(settings);
        if self.logo.settings() != before {
            self.touch();
        }
        ticket
    }

    /// Applies a finished background-removal request.
    pub fn complete_reprocess(
        &mut self,
        ticket: ReprocessTicket,
        result: Result<RgbaImage, MattingError>,
    ) -> Completion {
        let completion = self.logo.complete(ticket, result);
        if completion != Completion::Stale {
            self.touch();
        }
        completion
    }

    /// Runs any pending background removal on the current thread.
    pub fn reprocess_now(&mut self) -> Option<Completion> {
        let completion = self.logo.reprocess_now()?;
        if completion != Completion::Stale {
            self.touch();
        }
        Some(completion)
    }

    pub fn clear_logo(&mut self) {
        self.logo.clear();
        self.touch();
    }

    // ------------------------------------------------------------------------
    // Brand kits
    // ------------------------------------------------------------------------

    /// Captures the current style as a brand kit named `name`.
    pub fn capture_brand_kit(&self, name: &str) -> Result<BrandKit, BrandKitError> {
        BrandKit::capture(name, &self.config)
    }

    pub fn apply_brand_kit(&mut self, kit: &BrandKit) {
        let next = kit.apply_to(&self.config);
        if next != self.config {
            self.config = next;
            self.touch();
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Renders the preview sizes at the preview scale.
    ///
    /// Returns `(size, surface)` pairs in ascending size order. Results are
    /// cached until the next change to the config, logo or scale.
    pub fn render_previews(&mut self) -> &[(u32, RasterSurface)] {
        let stale = self
            .previews
            .as_ref()
            .is_none_or(|(revision, _)| *revision != self.revision);

        if stale {
            debug!(revision = self.revision, "Rendering previews");
            let logo = self.logo.active();
            let surfaces = PREVIEW_SIZES
                .iter()
                .filter_map(|&size| {
                    self.engine
                        .render_size(size, self.preview_scale, &self.config, logo)
                        .map(|surface| (size, surface))
                })
                .collect();
            self.previews = Some((self.revision, surfaces));
        }

        self.previews
            .as_ref()
            .map(|(_, surfaces)| surfaces.as_slice())
            .unwrap_or_default()
    }

    /// Reports the contrast of the current design.
    pub fn accessibility(&self) -> AccessibilityReport {
        let ratio = config_contrast_ratio(&self.config);
        AccessibilityReport {
            background: effective_background(&self.config),
            foreground: self.config.foreground,
            ratio,
            score: score_for_ratio(ratio),
        }
    }

    /// Renders every export size at device scale 1.
    ///
    /// Validates first; nothing is rendered for an invalid design. Any
    /// failure discards the partial bundle.
    pub fn generate(&self) -> Result<ExportBundle, GenerationError> {
        self.config.validate(self.logo.is_loaded())?;

        info!(
            content = %self.config.content_name(),
            mode = self.config.mode.as_str(),
            "Generating favicon bundle"
        );
        let logo = self.logo.active();
        let mut bundle = ExportBundle::new();
        for size in REQUIRED_SIZES {
            let surface = self
                .engine
                .render_size(size, 1.0, &self.config, logo)
                .ok_or(GenerationError::Surface { size })?;
            bundle.insert(&surface)?;
        }
        info!(sizes = bundle.len(), "Favicon bundle generated");

        Ok(bundle)
    }

    /// Generates a bundle and assembles the package files from it.
    pub fn package(&self) -> Result<ExportPackage, GenerationError> {
        let bundle = self.generate()?;
        Ok(ExportPackage::assemble(&bundle, &self.config)?)
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackgroundMode, ContentSource};
    use image::Rgba;

    fn logo_on_white() -> RgbaImage {
        let mut logo = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
        for y in 5..15 {
            for x in 5..15 {
                logo.put_pixel(x, y, Rgba([0, 0, 200, 255]));
            }
        }
        logo
    }

    #[test]
    fn update_goes_through_reducer() {
        let mut studio = FaviconStudio::new();
        let config = studio.update(StyleEdit::BorderRadius(90.0));
        assert_eq!(config.border_radius, 50.0);
    }

    #[test]
    fn previews_are_cached_until_change() {
        let mut studio = FaviconStudio::new();
        studio.update(StyleEdit::Content(ContentSource::Logo));

        let sizes: Vec<_> = studio.render_previews().iter().map(|(size, _)| *size).collect();
        assert_eq!(sizes, PREVIEW_SIZES);
        let revision = studio.previews.as_ref().unwrap().0;

        studio.render_previews();
        assert_eq!(studio.previews.as_ref().unwrap().0, revision);

        studio.update(StyleEdit::Background(HexColor::BLACK));
        let previews = studio.render_previews();
        assert_eq!(previews[0].1.pixel(8, 8), Some(Rgba([0, 0, 0, 255])));
        assert_ne!(studio.previews.as_ref().unwrap().0, revision);
    }

    #[test]
    fn preview_scale_multiplies_device_pixels() {
        let mut studio = FaviconStudio::new();
        studio.set_preview_scale(2.0);
        studio.set_preview_scale(f32::NAN);
        assert_eq!(studio.preview_scale(), 2.0);

        let previews = studio.render_previews();
        assert_eq!(previews[0].1.device_size(), 32);
        assert_eq!(previews[3].1.device_size(), 256);
    }

    #[test]
    fn accessibility_of_defaults() {
        let studio = FaviconStudio::new();
        let report = studio.accessibility();
        assert_eq!(report.background, studio.config().background);
        assert!(report.ratio > 4.5);
        assert_eq!(report.score, 100);
    }

    #[test]
    fn generate_validates_first() {
        let mut studio = FaviconStudio::new();
        studio.update(StyleEdit::Glyph(String::new()));
        assert!(matches!(
            studio.generate(),
            Err(GenerationError::Validation(ValidationError::EmptyGlyph))
        ));

        studio.update(StyleEdit::Content(ContentSource::Logo));
        assert!(matches!(
            studio.generate(),
            Err(GenerationError::Validation(ValidationError::MissingLogo))
        ));
    }

    #[test]
    fn generate_renders_every_size() {
        let mut studio = FaviconStudio::new();
        studio.update(StyleEdit::Content(ContentSource::Logo));
        studio.set_logo(logo_on_white());

        let bundle = studio.generate().unwrap();
        assert_eq!(bundle.len(), REQUIRED_SIZES.len());
        for entry in bundle.iter() {
            assert_eq!(entry.image.dimensions(), (entry.size, entry.size));
            assert!(!entry.png.is_empty());
        }
    }

    #[test]
    fn logo_removal_changes_render() {
        let mut studio = FaviconStudio::new();
        studio.update(StyleEdit::Content(ContentSource::Logo));
        studio.update(StyleEdit::Mode(BackgroundMode::Solid));
        studio.update(StyleEdit::Background(HexColor::BLACK));
        studio.update(StyleEdit::LogoScale(100.0));
        assert!(studio.set_logo(logo_on_white()).is_none());

        // White logo backdrop covers the corner.
        assert_eq!(studio.render_previews()[1].1.pixel(1, 1), Some(Rgba([255, 255, 255, 255])));

        let ticket = studio
            .set_removal(RemovalSettings::new(true, 30))
            .unwrap();
        let result = ticket.run();
        assert_eq!(studio.complete_reprocess(ticket, Ok(result)), Completion::Applied);

        assert_eq!(studio.render_previews()[1].1.pixel(1, 1), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn brand_kit_roundtrip_through_session() {
        let mut studio = FaviconStudio::new();
        studio.update(StyleEdit::Mode(BackgroundMode::Glow));
        let kit = studio.capture_brand_kit("Acme").unwrap();

        let mut other = FaviconStudio::new();
        other.apply_brand_kit(&kit);
        assert_eq!(other.config().mode, BackgroundMode::Glow);
        assert!(other.capture_brand_kit("").is_err());
    }

    #[test]
    fn package_uses_content_name() {
        let mut studio = FaviconStudio::new();
        studio.update(StyleEdit::Glyph("Q".into()));
        studio.update(StyleEdit::Mode(BackgroundMode::Outline));

        let package = studio.package().unwrap();
        assert_eq!(package.archive_name(), "favicon-Q-outline.zip");
        assert_eq!(package.manifest().short_name, "Q");
    }
}
