//! Glyph rasterization through resvg's text engine.
//!
//! Text is laid out by generating a one-element SVG document and rendering
//! it with the system font database. The result is a coverage pixmap that
//! the foreground layer colors afterwards, so one rasterization serves every
//! tinted copy an effect needs.

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree, fontdb};
use tracing::debug;

use crate::config::ContentSource;

/// Preferred stand-ins for the generic `sans-serif` family.
const SANS_SERIF_FALLBACKS: [&str; 4] = ["Arial", "Liberation Sans", "DejaVu Sans", "Noto Sans"];

// ============================================================================
// GlyphArt
// ============================================================================

/// A rasterized glyph at device resolution, covering the whole surface.
pub enum GlyphArt {
    /// Monochrome coverage in the alpha channel, to be filled by the caller.
    Coverage(Pixmap),

    /// Full-color artwork such as an emoji, drawn as is.
    Colored(Pixmap),
}

impl GlyphArt {
    pub fn pixmap(&self) -> &Pixmap {
        match self {
            Self::Coverage(pixmap) | Self::Colored(pixmap) => pixmap,
        }
    }
}

// ============================================================================
// GlyphRasterizer
// ============================================================================

/// Renders glyph strings centered on a square surface.
///
/// Holds the parsing options and the loaded font database, so create it
/// once and reuse it across renders.
pub struct GlyphRasterizer {
    options: Options<'static>,
}

impl Default for GlyphRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphRasterizer {
    /// Creates a rasterizer backed by the system fonts.
    pub fn new() -> Self {
        let mut options = Options::default();
        let db = options.fontdb_mut();
        db.load_system_fonts();
        configure_sans_serif(db);
        debug!(faces = db.len(), "Loaded system fonts");
        Self { options }
    }

    /// Rasterizes `glyph` centered on a `size` x `size` logical surface.
    ///
    /// Icons that have a Twemoji asset are drawn in color when the `twemoji`
    /// feature is enabled; everything else becomes coverage. Returns `None`
    /// for blank input or when nothing could be rendered.
    pub fn rasterize(
        &self,
        glyph: &str,
        style: &GlyphStyle<'_>,
        size: u32,
        scale: f32,
    ) -> Option<GlyphArt> {
        if glyph.trim().is_empty() {
            return None;
        }

        let device = (size as f32 * scale).round() as u32;
        let font_size = glyph_font_size(size, style.content);

        if style.content == ContentSource::Icon {
            if let Some(art) = render_emoji(glyph, font_size as f32 * scale, device) {
                return Some(GlyphArt::Colored(art));
            }
        }

        let document = text_document(glyph, style, size, font_size);
        let tree = Tree::from_str(&document, &self.options).ok()?;
        let mut pixmap = Pixmap::new(device, device)?;
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        Some(GlyphArt::Coverage(pixmap))
    }
}

/// Font settings for a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphStyle<'a> {
    pub content: ContentSource,
    pub family: &'a str,
    pub weight: u16,
}

/// Font size for a glyph on an icon of side `size`.
///
/// Text uses 55% of the side and icons 65%, rounded down.
///
/// ```
/// use favicon_studio::ContentSource;
/// use favicon_studio::layer::glyph_font_size;
///
/// assert_eq!(glyph_font_size(32, ContentSource::Text), 17);
/// assert_eq!(glyph_font_size(32, ContentSource::Icon), 20);
/// ```
pub fn glyph_font_size(size: u32, content: ContentSource) -> u32 {
    let ratio = match content {
        ContentSource::Icon => 0.65,
        _ => 0.55,
    };
    (size as f64 * ratio).floor() as u32
}

fn configure_sans_serif(db: &mut fontdb::Database) {
    let has_family = |db: &fontdb::Database, name: &str| {
        db.faces()
            .any(|face| face.families.iter().any(|(family, _)| family == name))
    };

    let fallback = SANS_SERIF_FALLBACKS
        .iter()
        .find(|name| has_family(db, name))
        .map(|name| name.to_string())
        .or_else(|| {
            db.faces()
                .next()
                .and_then(|face| face.families.first())
                .map(|(family, _)| family.clone())
        });

    if let Some(family) = fallback {
        db.set_sans_serif_family(family);
    }
}

/// Builds the SVG document that centers `glyph` on the surface.
fn text_document(glyph: &str, style: &GlyphStyle<'_>, size: u32, font_size: u32) -> String {
    let center = size as f32 / 2.0;
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#,
            r#"<text x="{center}" y="{center}" text-anchor="middle" dominant-baseline="central" "#,
            r#"font-family="{family}, sans-serif" font-weight="{weight}" font-size="{font_size}" fill="white">"#,
            "{text}</text></svg>",
        ),
        size = size,
        center = center,
        family = escape_xml(style.family),
        weight = style.weight,
        font_size = font_size,
        text = escape_xml(glyph),
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders a Twemoji asset `extent` device pixels wide, centered on a
/// `device` x `device` pixmap.
#[cfg(feature = "twemoji")]
fn render_emoji(emoji: &str, extent: f32, device: u32) -> Option<Pixmap> {
    use super::svg::{SvgSource, render_source};
    use crate::surface::rgba_image_to_pixmap;
    use resvg::tiny_skia::PixmapPaint;

    let source = SvgSource::from_emoji(emoji)?;
    let image = render_source(&source, extent.round().max(1.0) as u32)?;
    let emoji = rgba_image_to_pixmap(&image)?;

    let mut art = Pixmap::new(device, device)?;
    let x = (device as f32 - emoji.width() as f32) / 2.0;
    let y = (device as f32 - emoji.height() as f32) / 2.0;
    art.draw_pixmap(
        0,
        0,
        emoji.as_ref(),
        &PixmapPaint::default(),
        Transform::from_translate(x.round(), y.round()),
        None,
    );
    Some(art)
}

#[cfg(not(feature = "twemoji"))]
fn render_emoji(_emoji: &str, _extent: f32, _device: u32) -> Option<Pixmap> {
    None
}
