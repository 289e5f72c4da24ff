//! The composition engine: one fixed layer pipeline for every icon size.

use image::RgbaImage;
use rand::RngCore;
use tracing::debug;

use crate::config::StyleConfig;
use crate::layer::{
    BorderLayer, ClipLayer, FillLayer, ForegroundLayer, GlyphRasterizer, Layer, RenderContext,
};
use crate::surface::RasterSurface;

/// Renders a [`StyleConfig`] onto raster surfaces.
///
/// The same engine renders previews and export sizes, so a preview at a
/// given size matches the exported file pixel for pixel (up to the random
/// placement of pattern shapes).
///
/// # Layer Pipeline
///
/// 1. **Clip** - rounded icon shape, consumed by steps 2-5
/// 2. **Fill** - solid, gradient or outline background
/// 3. **Border** - optional stroke inside the edge
/// 4. **Texture** - dots, lines or grid
/// 5. **Pattern** - scattered circles or triangles
/// 6. **Foreground** - glyph or logo with the mode's effect, unclipped
///
/// # Example
///
/// ```
/// use favicon_studio::{BackgroundMode, CompositionEngine, RasterSurface, StyleConfig, StyleEdit};
///
/// let engine = CompositionEngine::new();
/// let config = StyleConfig::default().apply(StyleEdit::Mode(BackgroundMode::Solid));
///
/// let mut surface = RasterSurface::new(32).unwrap();
/// engine.render(&mut surface, &config, None);
///
/// // Corner pixels show the background color.
/// assert_eq!(surface.pixel(0, 0).unwrap().0, [0xdc, 0x26, 0x26, 255]);
/// ```
#[derive(Default)]
pub struct CompositionEngine {
    glyphs: GlyphRasterizer,
}

impl CompositionEngine {
    /// Creates an engine, loading the system fonts.
    pub fn new() -> Self {
        Self {
            glyphs: GlyphRasterizer::new(),
        }
    }

    /// Clears `surface` and draws `config` onto it.
    ///
    /// `logo` is the active logo bitmap; it is only drawn for logo content.
    /// Pattern shapes are placed with the thread-local RNG.
    pub fn render(&self, surface: &mut RasterSurface, config: &StyleConfig, logo: Option<&RgbaImage>) {
        self.render_with_rng(surface, config, logo, &mut rand::thread_rng());
    }

    /// Like [`render`](Self::render), drawing pattern shapes from `rng`.
    pub fn render_with_rng(
        &self,
        surface: &mut RasterSurface,
        config: &StyleConfig,
        logo: Option<&RgbaImage>,
        rng: &mut dyn RngCore,
    ) {
        debug!(
            size = surface.size(),
            scale = surface.scale(),
            mode = config.mode.as_str(),
            content = ?config.content,
            "Rendering favicon"
        );
        surface.clear();

        let clip = ClipLayer {
            radius_percent: config.border_radius,
        };
        let fill = FillLayer::from_config(config);
        let border = BorderLayer::from_config(config);
        let foreground = ForegroundLayer {
            config,
            logo,
            glyphs: &self.glyphs,
        };
        let layers: [&dyn Layer; 6] = [
            &clip,
            &fill,
            &border,
            &config.texture,
            &config.pattern,
            &foreground,
        ];

        let mut ctx = RenderContext::new(surface, rng);
        for layer in layers {
            layer.transform(&mut ctx);
            layer.emit(&mut ctx);
        }
    }

    /// Renders onto a new surface of logical side `size` at `scale`.
    ///
    /// Returns `None` if the surface cannot be allocated.
    pub fn render_size(
        &self,
        size: u32,
        scale: f32,
        config: &StyleConfig,
        logo: Option<&RgbaImage>,
    ) -> Option<RasterSurface> {
        let mut surface = RasterSurface::with_scale(size, scale)?;
        self.render(&mut surface, config, logo);
        Some(surface)
    }
}

// ============================================================================
// Tests
// ============================================================================
