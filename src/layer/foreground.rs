//! Foreground layer: the glyph or logo with the effect of the current mode.
//!
//! The foreground is drawn after the background layers and ignores the
//! [`ClipRegion`](super::ClipRegion), so shadows and glows may reach past
//! rounded corners.
//!
//! | Mode       | Glyph                                             | Logo                                   |
//! |------------|---------------------------------------------------|----------------------------------------|
//! | `shadow`   | 30% black copy offset by the intensity, then fill | blurred 30% black shadow underneath    |
//! | `glow`     | halo in the glow color                            | halo in the glow color                 |
//! | `3d`       | 20% black copy at +2, fill, 30% white copy at -1  | shadowed copy at +2, then sharp logo   |
//! | `gradient` | vertical fill to a 20% lighter foreground         | plain                                  |
//! | otherwise  | flat fill                                         | plain                                  |

use image::RgbaImage;
use image::imageops::{self, FilterType};
use resvg::tiny_skia::{
    FilterQuality, GradientStop, IntSize, LinearGradient, Pixmap, PixmapPaint, Point, Shader,
    SpreadMode, Transform,
};
use tracing::trace;

use super::effect::{ShadowSpec, draw_artwork, fill_coverage, tinted};
use super::glyph::{GlyphArt, GlyphRasterizer, GlyphStyle};
use super::{Layer, RenderContext};
use crate::color::{HexColor, lighten};
use crate::config::{BackgroundMode, ContentSource, StyleConfig};
use crate::surface::RasterSurface;

/// How much lighter the bottom of a gradient glyph is, in percent.
const GLYPH_GRADIENT_LIGHTEN: f64 = 20.0;

/// Logical offset of the raised copy in 3D mode.
const RAISED_OFFSET: f32 = 2.0;

/// Logical offset of the highlight copy in 3D mode.
const HIGHLIGHT_OFFSET: f32 = -1.0;

/// Shadow cast by the raised logo copy in 3D mode.
const RAISED_LOGO_SHADOW: ShadowSpec = ShadowSpec {
    color: HexColor::BLACK,
    opacity: 0.3,
    blur: 5.0,
    offset: (3.0, 3.0),
};

/// Side of the drawn logo for an icon of side `size`.
///
/// `logo_scale` is a percentage; values above 100 overflow the icon.
///
/// ```
/// use favicon_studio::layer::logo_extent;
///
/// assert_eq!(logo_extent(64, 80.0), 51.2);
/// ```
pub fn logo_extent(size: u32, logo_scale: f32) -> f32 {
    size as f32 * logo_scale / 100.0
}

// ============================================================================
// ForegroundLayer
// ============================================================================

/// Draws the configured glyph or logo.
///
/// Draws nothing when the content is a logo but none is loaded, or when the
/// glyph is blank.
pub struct ForegroundLayer<'r> {
    pub config: &'r StyleConfig,
    pub logo: Option<&'r RgbaImage>,
    pub glyphs: &'r GlyphRasterizer,
}

impl Layer for ForegroundLayer<'_> {
    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let surface = ctx.surface_mut();
        match self.config.content {
            ContentSource::Logo => match self.logo {
                Some(logo) => draw_logo(surface, logo, self.config),
                None => trace!("No logo loaded, skipping foreground"),
            },
            ContentSource::Text | ContentSource::Icon => match self.config.active_glyph() {
                Some(glyph) => self.draw_glyph(surface, glyph),
                None => trace!("Blank glyph, skipping foreground"),
            },
        }
    }
}

impl ForegroundLayer<'_> {
    fn draw_glyph(&self, surface: &mut RasterSurface, glyph: &str) {
        let style = GlyphStyle {
            content: self.config.content,
            family: &self.config.font_family,
            weight: self.config.font_weight,
        };
        match self.glyphs.rasterize(glyph, &style, surface.size(), surface.scale()) {
            Some(art) => draw_glyph_art(surface, &art, self.config),
            None => trace!(glyph, "Glyph has no ink, skipping foreground"),
        }
    }
}

/// Composites rasterized glyph art with the effect of the current mode.
fn draw_glyph_art(surface: &mut RasterSurface, art: &GlyphArt, config: &StyleConfig) {
    let Some(main) = glyph_fill(art, config, surface.size(), surface.scale()) else {
        return;
    };
    let silhouette = art.pixmap();

    match config.mode {
        BackgroundMode::Shadow => {
            let i = config.shadow_intensity;
            if let Some(shadow) = tinted(silhouette, HexColor::BLACK, 0.3) {
                draw_artwork(surface, &shadow, (i, i), None);
            }
            draw_artwork(surface, &main, (0.0, 0.0), None);
        }
        BackgroundMode::Glow => {
            let glow = ShadowSpec::glow(config.glow_color, config.glow_intensity);
            draw_artwork(surface, &main, (0.0, 0.0), Some(&glow));
        }
        BackgroundMode::ThreeD => {
            if let Some(depth) = tinted(silhouette, HexColor::BLACK, 0.2) {
                draw_artwork(surface, &depth, (RAISED_OFFSET, RAISED_OFFSET), None);
            }
            draw_artwork(surface, &main, (0.0, 0.0), None);
            if let Some(highlight) = tinted(silhouette, HexColor::WHITE, 0.3) {
                draw_artwork(surface, &highlight, (HIGHLIGHT_OFFSET, HIGHLIGHT_OFFSET), None);
            }
        }
        _ => draw_artwork(surface, &main, (0.0, 0.0), None),
    }
}

/// Colors the glyph: a vertical gradient in gradient mode, a flat
/// foreground fill otherwise. Color artwork is kept as is.
fn glyph_fill(art: &GlyphArt, config: &StyleConfig, size: u32, scale: f32) -> Option<Pixmap> {
    let coverage = match art {
        GlyphArt::Colored(pixmap) => return Some(pixmap.clone()),
        GlyphArt::Coverage(coverage) => coverage,
    };

    let shader = match config.mode {
        BackgroundMode::Gradient => {
            let top = config.foreground;
            let bottom = lighten(top, GLYPH_GRADIENT_LIGHTEN);
            LinearGradient::new(
                Point::from_xy(0.0, 0.0),
                Point::from_xy(0.0, size as f32),
                vec![
                    GradientStop::new(0.0, top.to_skia(1.0)),
                    GradientStop::new(1.0, bottom.to_skia(1.0)),
                ],
                SpreadMode::Pad,
                Transform::identity(),
            )?
        }
        _ => Shader::SolidColor(config.foreground.to_skia(1.0)),
    };

    fill_coverage(coverage, shader, scale)
}

// ============================================================================
// Logo
// ============================================================================

fn draw_logo(surface: &mut RasterSurface, logo: &RgbaImage, config: &StyleConfig) {
    let Some(art) = logo_artwork(logo, surface.size(), surface.scale(), config.logo_scale) else {
        return;
    };

    match config.mode {
        BackgroundMode::Shadow => {
            let i = config.shadow_intensity;
            let shadow = ShadowSpec::drop(i, (i, i));
            draw_artwork(surface, &art, (0.0, 0.0), Some(&shadow));
        }
        BackgroundMode::Glow => {
            let glow = ShadowSpec::glow(config.glow_color, config.glow_intensity);
            draw_artwork(surface, &art, (0.0, 0.0), Some(&glow));
        }
        BackgroundMode::ThreeD => {
            draw_artwork(
                surface,
                &art,
                (RAISED_OFFSET, RAISED_OFFSET),
                Some(&RAISED_LOGO_SHADOW),
            );
            draw_artwork(surface, &art, (0.0, 0.0), None);
        }
        _ => draw_artwork(surface, &art, (0.0, 0.0), None),
    }
}

/// Places the logo, stretched to a centered square, on a device-sized pixmap.
fn logo_artwork(logo: &RgbaImage, size: u32, scale: f32, logo_scale: f32) -> Option<Pixmap> {
    let device = (size as f32 * scale).round() as u32;
    let extent = logo_extent(size, logo_scale) * scale;
    let side = extent.round().max(1.0) as u32;
    let origin = (device as f32 - extent) / 2.0;

    // Resampled in premultiplied space so transparent pixels don't bleed.
    let mut resized = imageops::resize(&premultiplied(logo), side, side, FilterType::CatmullRom);
    // Bicubic ringing can push a channel above its alpha.
    for pixel in resized.pixels_mut() {
        let alpha = pixel[3];
        for channel in &mut pixel.0[..3] {
            *channel = (*channel).min(alpha);
        }
    }
    let logo = Pixmap::from_vec(resized.into_raw(), IntSize::from_wh(side, side)?)?;

    let mut art = Pixmap::new(device, device)?;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    art.draw_pixmap(0, 0, logo.as_ref(), &paint, Transform::from_translate(origin, origin), None);
    Some(art)
}

fn premultiplied(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let mul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        pixel.0 = [mul(r), mul(g), mul(b), a];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StyleEdit;
    use image::Rgba;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn render(config: &StyleConfig, logo: Option<&RgbaImage>, size: u32) -> RasterSurface {
        let glyphs = GlyphRasterizer::new();
        let mut surface = RasterSurface::new(size).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = RenderContext::new(&mut surface, &mut rng);
        ForegroundLayer {
            config,
            logo,
            glyphs: &glyphs,
        }
        .transform(&mut ctx);
        surface
    }

    fn logo_config(mode: BackgroundMode) -> StyleConfig {
        StyleConfig::default()
            .apply(StyleEdit::Content(ContentSource::Logo))
            .apply(StyleEdit::Mode(mode))
            .apply(StyleEdit::LogoScale(50.0))
    }

    fn blue_logo() -> RgbaImage {
        RgbaImage::from_pixel(40, 20, Rgba([0, 0, 255, 255]))
    }

    fn is_clear(surface: &RasterSurface) -> bool {
        surface.to_rgba_image().pixels().all(|p| p[3] == 0)
    }

    /// Opaque coverage over the 20..40 square of a 64px surface.
    fn square_coverage() -> GlyphArt {
        let mut coverage = Pixmap::new(64, 64).unwrap();
        let rect = resvg::tiny_skia::Rect::from_xywh(20.0, 20.0, 20.0, 20.0).unwrap();
        let mut paint = resvg::tiny_skia::Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        coverage.fill_rect(rect, &paint, Transform::identity(), None);
        GlyphArt::Coverage(coverage)
    }

    fn glyph_config(mode: BackgroundMode) -> StyleConfig {
        StyleConfig::default()
            .apply(StyleEdit::Mode(mode))
            .apply(StyleEdit::Foreground(HexColor::new(0, 0, 255)))
    }

    fn composite(art: &GlyphArt, config: &StyleConfig) -> RasterSurface {
        let mut surface = RasterSurface::new(64).unwrap();
        draw_glyph_art(&mut surface, art, config);
        surface
    }

    fn near(actual: u8, expected: u8) -> bool {
        actual.abs_diff(expected) <= 2
    }

    #[test]
    fn solid_glyph_is_a_flat_fill() {
        let surface = composite(&square_coverage(), &glyph_config(BackgroundMode::Solid));

        assert_eq!(surface.pixel(20, 20), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(surface.pixel(39, 39), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(surface.pixel(40, 30).unwrap()[3], 0);
        assert_eq!(surface.pixel(42, 42).unwrap()[3], 0);
    }

    #[test]
    fn shadow_glyph_casts_offset_black_copy() {
        let config = glyph_config(BackgroundMode::Shadow).apply(StyleEdit::ShadowIntensity(4.0));
        let surface = composite(&square_coverage(), &config);

        assert_eq!(surface.pixel(30, 30), Some(Rgba([0, 0, 255, 255])));
        // Only the shadow copy, shifted to 24..44, reaches here.
        let shadow = surface.pixel(42, 42).unwrap();
        assert!(near(shadow[3], 77), "30% alpha, got {}", shadow[3]);
        assert_eq!(&shadow.0[..3], &[0, 0, 0]);
        assert_eq!(surface.pixel(45, 45).unwrap()[3], 0);
        assert_eq!(surface.pixel(19, 19).unwrap()[3], 0);
    }

    #[test]
    fn glow_glyph_has_halo_in_glow_color() {
        let config = glyph_config(BackgroundMode::Glow)
            .apply(StyleEdit::GlowColor(HexColor::new(255, 255, 0)))
            .apply(StyleEdit::GlowIntensity(10.0));
        let surface = composite(&square_coverage(), &config);

        assert_eq!(surface.pixel(30, 30), Some(Rgba([0, 0, 255, 255])));
        for (x, y) in [(17, 30), (42, 30), (30, 17), (30, 42)] {
            let halo = surface.pixel(x, y).unwrap();
            assert!(halo[3] > 0, "no halo at ({x}, {y})");
            assert!(halo[0] > 200 && halo[1] > 200 && halo[2] < 50);
        }
        assert_eq!(surface.pixel(0, 0).unwrap()[3], 0);
    }

    #[test]
    fn three_d_glyph_layers_depth_fill_and_highlight() {
        let surface = composite(&square_coverage(), &glyph_config(BackgroundMode::ThreeD));

        // Depth copy at +2 shows past the right edge.
        let depth = surface.pixel(41, 30).unwrap();
        assert!(near(depth[3], 51), "20% alpha, got {}", depth[3]);
        assert_eq!(&depth.0[..3], &[0, 0, 0]);

        // Highlight copy at -1 shows past the left edge.
        let highlight = surface.pixel(19, 30).unwrap();
        assert!(near(highlight[3], 77), "30% alpha, got {}", highlight[3]);
        assert_eq!(&highlight.0[..3], &[255, 255, 255]);

        // The highlight sits over the fill.
        let center = surface.pixel(30, 30).unwrap();
        assert_eq!(center[3], 255);
        assert_eq!(center[2], 255);
        assert!(near(center[0], 77) && near(center[1], 77), "got {center:?}");
    }

    #[test]
    fn gradient_glyph_lightens_downward() {
        let config =
            glyph_config(BackgroundMode::Gradient).apply(StyleEdit::Foreground(HexColor::BLACK));
        let surface = composite(&square_coverage(), &config);

        let top = surface.pixel(30, 20).unwrap();
        let bottom = surface.pixel(30, 39).unwrap();
        assert_eq!((top[3], bottom[3]), (255, 255));
        assert!(top[0] < bottom[0], "{top:?} should be darker than {bottom:?}");
        // The ramp ends at #333333 on the bottom edge of the icon.
        assert!(bottom[0] < 0x33);
        assert_eq!(surface.pixel(42, 42).unwrap()[3], 0);
    }

    #[test]
    fn colored_glyph_keeps_its_colors() {
        let mut art = Pixmap::new(64, 64).unwrap();
        art.fill(resvg::tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        let surface = composite(&GlyphArt::Colored(art), &glyph_config(BackgroundMode::Gradient));

        assert_eq!(surface.pixel(10, 50), Some(Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn logo_extent_is_linear() {
        for size in [16, 32, 64, 128, 512] {
            assert_eq!(logo_extent(size, 100.0), size as f32);
            assert_eq!(logo_extent(size, 50.0), size as f32 / 2.0);
        }
        assert_eq!(logo_extent(100, 120.0), 120.0);
    }

    #[test]
    fn logo_is_stretched_to_a_centered_square() {
        let surface = render(&logo_config(BackgroundMode::Solid), Some(&blue_logo()), 64);

        // 50% of 64 is a 32px square spanning 16..48.
        assert_eq!(surface.pixel(32, 32), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(surface.pixel(17, 17), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(surface.pixel(46, 46), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(surface.pixel(14, 32).unwrap()[3], 0);
        assert_eq!(surface.pixel(32, 49).unwrap()[3], 0);
    }

    #[test]
    fn logo_shadow_extends_bottom_right() {
        let config = logo_config(BackgroundMode::Shadow).apply(StyleEdit::ShadowIntensity(4.0));
        let surface = render(&config, Some(&blue_logo()), 64);

        let shadow = surface.pixel(50, 50).unwrap();
        assert!(shadow[3] > 0);
        assert!(shadow[2] < 5, "shadow is black");
        assert_eq!(surface.pixel(10, 10).unwrap()[3], 0);
    }

    #[test]
    fn logo_glow_surrounds_logo() {
        let config = logo_config(BackgroundMode::Glow)
            .apply(StyleEdit::GlowColor(HexColor::new(255, 255, 0)))
            .apply(StyleEdit::GlowIntensity(10.0));
        let surface = render(&config, Some(&blue_logo()), 64);

        let halo = surface.pixel(13, 32).unwrap();
        assert!(halo[3] > 0);
        assert!(halo[0] > 200 && halo[1] > 200 && halo[2] < 50);
    }

    #[test]
    fn logo_3d_keeps_sharp_copy_on_top() {
        let surface = render(&logo_config(BackgroundMode::ThreeD), Some(&blue_logo()), 64);

        assert_eq!(surface.pixel(32, 32), Some(Rgba([0, 0, 255, 255])));
        // The raised copy peeks out past the right edge of the sharp one.
        let raised = surface.pixel(48, 32).unwrap();
        assert!(raised[2] > 200 && raised[3] > 200);
    }

    #[test]
    fn missing_logo_draws_nothing() {
        let surface = render(&logo_config(BackgroundMode::Solid), None, 32);
        assert!(is_clear(&surface));
    }

    #[test]
    fn blank_glyph_draws_nothing() {
        let config = StyleConfig::default().apply(StyleEdit::Glyph("   ".into()));
        let surface = render(&config, None, 32);
        assert!(is_clear(&surface));
    }

    #[test]
    fn translucent_logo_pixels_keep_their_color() {
        let mut logo = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
        logo.put_pixel(0, 0, Rgba([0, 255, 0, 0]));
        let premul = premultiplied(&logo);
        assert_eq!(premul.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(premul.get_pixel(4, 4).0, [255, 0, 0, 255]);
    }
}
