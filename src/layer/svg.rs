//! SVG rendering utilities using resvg/usvg.
//!
//! Used for Twemoji icons and for logos uploaded as vector files.

use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::surface::pixmap_to_rgba_image;

// ============================================================================
// SvgSource
// ============================================================================

/// A source for SVG data.
///
/// - Raw SVG markup strings
/// - Emoji characters (when the `twemoji` feature is enabled)
///
/// # Example
///
/// ```
/// use favicon_studio::SvgSource;
///
/// let raw = SvgSource::from_svg("<svg>...</svg>");
/// assert_eq!(raw.resolve(), Some("<svg>...</svg>"));
///
/// #[cfg(feature = "twemoji")]
/// let emoji = SvgSource::from_emoji("🚀").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgSource {
    /// Raw SVG markup string.
    Raw(String),

    /// An emoji character to be resolved via twemoji_assets.
    ///
    /// Only resolvable when the `twemoji` feature is enabled.
    Emoji(String),
}

impl SvgSource {
    /// Creates a source from raw SVG markup.
    pub fn from_svg(svg: impl Into<String>) -> Self {
        Self::Raw(svg.into())
    }

    /// Creates a source from an emoji character.
    ///
    /// Returns `None` if the emoji is not supported by twemoji_assets.
    #[cfg(feature = "twemoji")]
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        use twemoji_assets::svg::SvgTwemojiAsset;

        SvgTwemojiAsset::from_emoji(emoji)?;
        Some(Self::Emoji(emoji.to_string()))
    }

    /// Resolves this source to SVG markup.
    pub fn resolve(&self) -> Option<&str> {
        match self {
            Self::Raw(svg) => Some(svg.as_str()),
            #[cfg(feature = "twemoji")]
            Self::Emoji(emoji) => {
                use twemoji_assets::svg::SvgTwemojiAsset;
                let asset = SvgTwemojiAsset::from_emoji(emoji)?;
                Some(asset.as_ref())
            }
            #[cfg(not(feature = "twemoji"))]
            Self::Emoji(_) => None,
        }
    }
}

// ============================================================================
// SVG Rendering
// ============================================================================

/// Renders an SVG string to an RGBA image at the specified size.
///
/// The SVG is scaled to fit within `size x size` pixels while preserving
/// aspect ratio (the larger dimension will be `size`).
///
/// Returns `None` if the SVG cannot be parsed or rendered.
pub fn render_svg(svg_data: &str, size: u32) -> Option<RgbaImage> {
    let tree = Tree::from_str(svg_data, &Options::default()).ok()?;
    render_tree(&tree, size)
}

/// Renders SVG file contents to an RGBA image at the specified size.
///
/// Accepts gzip-compressed (`.svgz`) data as well as plain markup.
pub fn render_svg_bytes(data: &[u8], size: u32) -> Option<RgbaImage> {
    let tree = Tree::from_data(data, &Options::default()).ok()?;
    render_tree(&tree, size)
}

/// Renders an [`SvgSource`] to an RGBA image at the specified size.
pub fn render_source(source: &SvgSource, size: u32) -> Option<RgbaImage> {
    let svg_data = source.resolve()?;
    render_svg(svg_data, size)
}

fn render_tree(tree: &Tree, size: u32) -> Option<RgbaImage> {
    // Scale to fit within size x size
    let svg_size = tree.size();
    let scale = (size as f32) / svg_size.width().max(svg_size.height());
    let width = (svg_size.width() * scale).ceil() as u32;
    let height = (svg_size.height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(width, height)?;
    resvg::render(tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    Some(pixmap_to_rgba_image(&pixmap))
}

// ============================================================================
// Tests
// ============================================================================
