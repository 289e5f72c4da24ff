//! Shadow, glow and tinting helpers for foreground artwork.
//!
//! Foreground artwork is a device-sized [`Pixmap`] positioned at the surface
//! origin. Effects are expressed as explicit values and applied per draw call,
//! so no drawing state leaks from one call into the next.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{
    FilterQuality, Mask, MaskType, Paint, Pixmap, PixmapPaint, Rect, Shader, Transform,
};

use crate::color::HexColor;
use crate::surface::{RasterSurface, rgba_image_to_pixmap};

// ============================================================================
// ShadowSpec
// ============================================================================

/// A drop shadow cast by one draw call.
///
/// Lengths are in logical pixels. The shadow is the artwork's silhouette in
/// `color`, blurred and shifted by `offset`, and painted underneath the
/// artwork.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSpec {
    pub color: HexColor,

    /// Opacity of the shadow color (0.0-1.0).
    pub opacity: f32,

    /// Blur length. The Gaussian sigma is half of it.
    pub blur: f32,

    pub offset: (f32, f32),
}

impl ShadowSpec {
    /// A soft halo in `color` centered on the artwork.
    pub fn glow(color: HexColor, blur: f32) -> Self {
        Self {
            color,
            opacity: 1.0,
            blur,
            offset: (0.0, 0.0),
        }
    }

    /// A translucent black shadow.
    pub fn drop(blur: f32, offset: (f32, f32)) -> Self {
        Self {
            color: HexColor::BLACK,
            opacity: 0.3,
            blur,
            offset,
        }
    }

    /// An unblurred shadow at zero offset is hidden by the artwork itself.
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && (self.blur > 0.0 || self.offset != (0.0, 0.0))
    }
}

// ============================================================================
// Artwork Operations
// ============================================================================

/// Paints `shader` through the alpha coverage of `coverage`.
///
/// The shader is positioned in logical coordinates.
pub(crate) fn fill_coverage(coverage: &Pixmap, shader: Shader<'_>, scale: f32) -> Option<Pixmap> {
    let mask = Mask::from_pixmap(coverage.as_ref(), MaskType::Alpha);
    let mut out = Pixmap::new(coverage.width(), coverage.height())?;
    let rect = Rect::from_xywh(
        0.0,
        0.0,
        coverage.width() as f32 / scale,
        coverage.height() as f32 / scale,
    )?;
    let paint = Paint {
        shader,
        anti_alias: false,
        ..Paint::default()
    };
    out.fill_rect(rect, &paint, Transform::from_scale(scale, scale), Some(&mask));
    Some(out)
}

/// Returns the silhouette of `art` in a single translucent color.
pub(crate) fn tinted(art: &Pixmap, color: HexColor, opacity: f32) -> Option<Pixmap> {
    rgba_image_to_pixmap(&silhouette(art, color, opacity))
}

/// Straight-alpha silhouette with the color in every pixel, so blurring
/// never pulls in black from transparent regions.
fn silhouette(art: &Pixmap, color: HexColor, opacity: f32) -> RgbaImage {
    let (r, g, b) = color.rgb();
    let opacity = opacity.clamp(0.0, 1.0);
    let width = art.width();
    let pixels = art.pixels();

    RgbaImage::from_fn(width, art.height(), |x, y| {
        let coverage = pixels[(y * width + x) as usize].alpha();
        Rgba([r, g, b, (coverage as f32 * opacity).round() as u8])
    })
}

/// Renders the shadow of `art` at device resolution, before offsetting.
pub(crate) fn shadow_of(art: &Pixmap, spec: &ShadowSpec, scale: f32) -> Option<Pixmap> {
    let mut shadow = silhouette(art, spec.color, spec.opacity);
    let sigma = spec.blur * scale / 2.0;
    if sigma > 0.0 {
        shadow = image::imageops::blur(&shadow, sigma);
    }
    rgba_image_to_pixmap(&shadow)
}

/// Draws `art` onto the surface, translated by `offset` logical pixels.
///
/// When `shadow` is visible it is painted first, underneath the artwork.
pub(crate) fn draw_artwork(
    surface: &mut RasterSurface,
    art: &Pixmap,
    offset: (f32, f32),
    shadow: Option<&ShadowSpec>,
) {
    let scale = surface.scale();

    if let Some(spec) = shadow.filter(|spec| spec.is_visible()) {
        if let Some(shadow) = shadow_of(art, spec, scale) {
            let dx = (offset.0 + spec.offset.0) * scale;
            let dy = (offset.1 + spec.offset.1) * scale;
            blit(surface, &shadow, dx, dy);
        }
    }

    blit(surface, art, offset.0 * scale, offset.1 * scale);
}

fn blit(surface: &mut RasterSurface, art: &Pixmap, dx: f32, dy: f32) {
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    surface
        .pixmap_mut()
        .draw_pixmap(0, 0, art.as_ref(), &paint, Transform::from_translate(dx, dy), None);
}
