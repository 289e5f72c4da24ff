//! Raster surfaces that the composition engine draws into.
//!
//! A [`RasterSurface`] is a square, premultiplied RGBA pixel buffer with a
//! logical side length and a device scale factor. Drawing code works in
//! logical coordinates and applies [`RasterSurface::transform`], so a 32px
//! icon rendered at scale 2.0 produces a 64x64 pixel buffer.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use resvg::tiny_skia::{Color, ColorU8, IntSize, Pixmap, Transform};

/// A mutable square pixel buffer owned by a single render call.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    pixmap: Pixmap,

    /// Logical side length.
    size: u32,

    /// The display scale factor.
    ///
    /// - 1.0 for standard resolution (@1x)
    /// - 2.0 for retina/HiDPI (@2x)
    scale: f32,
}

impl RasterSurface {
    /// Creates a transparent surface at scale 1.0.
    ///
    /// Returns `None` if `size` is zero.
    pub fn new(size: u32) -> Option<Self> {
        Self::with_scale(size, 1.0)
    }

    /// Creates a transparent surface whose pixel side is `size * scale`.
    ///
    /// Returns `None` if the resulting buffer would be empty or the scale is
    /// not a positive finite number.
    pub fn with_scale(size: u32, scale: f32) -> Option<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }
        let device = (size as f32 * scale).round() as u32;
        let pixmap = Pixmap::new(device, device)?;
        Some(Self { pixmap, size, scale })
    }

    /// Returns the logical side length.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the display scale factor.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Returns the side length of the pixel buffer.
    pub fn device_size(&self) -> u32 {
        self.pixmap.width()
    }

    /// Maps logical coordinates to device pixels.
    pub fn transform(&self) -> Transform {
        Transform::from_scale(self.scale, self.scale)
    }

    /// Resets every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    pub(crate) fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Returns the straight-alpha color of a device pixel.
    ///
    /// Returns `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x >= self.pixmap.width() || y >= self.pixmap.height() {
            return None;
        }
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba([c.red(), c.green(), c.blue(), c.alpha()]))
    }

    /// Copies the surface into a straight-alpha `RgbaImage`.
    pub fn to_rgba_image(&self) -> RgbaImage {
        pixmap_to_rgba_image(&self.pixmap)
    }

    /// Encodes the surface as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        encode(&self.to_rgba_image(), ImageFormat::Png)
    }

    /// Encodes the surface as a single-image ICO container.
    pub fn encode_ico(&self) -> Result<Vec<u8>, image::ImageError> {
        encode(&self.to_rgba_image(), ImageFormat::Ico)
    }
}

/// Encodes a straight-alpha image in the given container format.
pub(crate) fn encode(image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format)?;
    Ok(buf.into_inner())
}

// ============================================================================
// Pixel Conversion
// ============================================================================

/// Converts a tiny-skia Pixmap to an `image::RgbaImage`.
pub(crate) fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let mut img = RgbaImage::new(width, pixmap.height());

    // tiny-skia stores premultiplied alpha
    for (i, pixel) in pixmap.pixels().iter().enumerate() {
        let c = pixel.demultiply();
        let x = i as u32 % width;
        let y = i as u32 / width;
        img.put_pixel(x, y, Rgba([c.red(), c.green(), c.blue(), c.alpha()]));
    }

    img
}

/// Converts a straight-alpha `RgbaImage` into a premultiplied Pixmap.
///
/// Returns `None` for empty images.
pub(crate) fn rgba_image_to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let mut pixmap = Pixmap::new(size.width(), size.height())?;

    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_size_follows_scale() {
        let surface = RasterSurface::with_scale(32, 2.0).unwrap();
        assert_eq!(surface.size(), 32);
        assert_eq!(surface.device_size(), 64);
        assert_eq!(surface.transform(), Transform::from_scale(2.0, 2.0));
    }

    #[test]
    fn invalid_surfaces() {
        assert!(RasterSurface::new(0).is_none());
        assert!(RasterSurface::with_scale(16, 0.0).is_none());
        assert!(RasterSurface::with_scale(16, f32::NAN).is_none());
    }

    #[test]
    fn new_surface_is_transparent() {
        let surface = RasterSurface::new(4).unwrap();
        assert_eq!(surface.pixel(0, 0), Some(Rgba([0, 0, 0, 0])));
        assert_eq!(surface.pixel(4, 0), None);
    }

    #[test]
    fn pixel_outside_row_does_not_wrap() {
        let mut surface = RasterSurface::new(4).unwrap();
        surface.pixmap_mut().fill(Color::from_rgba8(0, 0, 255, 255));

        assert_eq!(surface.pixel(3, 0), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(surface.pixel(4, 0), None);
        assert_eq!(surface.pixel(7, 2), None);
        assert_eq!(surface.pixel(0, 4), None);
        assert_eq!(surface.pixel(u32::MAX, 0), None);
    }

    #[test]
    fn rgba_pixmap_roundtrip_keeps_opaque_and_clear_pixels() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([10, 200, 30, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 0]));

        let pixmap = rgba_image_to_pixmap(&img).unwrap();
        let back = pixmap_to_rgba_image(&pixmap);

        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.get_pixel(0, 0).0, [10, 200, 30, 255]);
        assert_eq!(back.get_pixel(1, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn encodes_png_and_ico() {
        let mut surface = RasterSurface::new(16).unwrap();
        surface.pixmap_mut().fill(Color::from_rgba8(255, 0, 0, 255));

        let png = surface.encode_png().unwrap();
        assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(8, 8).0, [255, 0, 0, 255]);

        let ico = surface.encode_ico().unwrap();
        // ICO header: reserved 0, type 1, one image
        assert_eq!(&ico[..6], &[0, 0, 1, 0, 1, 0]);
    }
}
