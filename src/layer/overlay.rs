//! Decorative overlays drawn over the background fill.
//!
//! Textures are deterministic grids; patterns scatter a handful of random
//! shapes using the RNG carried by the [`RenderContext`]. Both are painted
//! in translucent white and respect the [`ClipRegion`](super::ClipRegion).

use std::ops::Range;

use rand::{Rng, RngCore};
use resvg::tiny_skia::{FillRule, Paint, Path, PathBuilder, Stroke};

use super::{Layer, RenderContext};
use crate::color::HexColor;
use crate::config::{Pattern, Texture};

/// Opacity of every overlay stroke and fill.
const OVERLAY_OPACITY: f32 = 0.1;

/// Grid pitch for textures, in logical pixels.
const TEXTURE_STEP: usize = 4;

const DOT_RADIUS: f32 = 1.0;

/// Number of shapes scattered by a pattern.
const PATTERN_SHAPES: usize = 5;

/// Radius of pattern circles and size of pattern triangles.
const SHAPE_EXTENT: Range<f32> = 5.0..15.0;

fn overlay_paint() -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(HexColor::WHITE.to_skia(OVERLAY_OPACITY));
    paint.anti_alias = true;
    paint
}

// ============================================================================
// Texture
// ============================================================================

impl Texture {
    /// Centers of the dots texture: every grid point whose coordinates sum
    /// to a multiple of twice the pitch.
    fn dot_centers(size: u32) -> impl Iterator<Item = (f32, f32)> {
        let size = size as usize;
        (0..size).step_by(TEXTURE_STEP).flat_map(move |x| {
            (0..size)
                .step_by(TEXTURE_STEP)
                .filter(move |y| (x + y) % (TEXTURE_STEP * 2) == 0)
                .map(move |y| (x as f32, y as f32))
        })
    }

    fn horizontal_lines(size: u32) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for y in (0..size as usize).step_by(TEXTURE_STEP) {
            pb.move_to(0.0, y as f32);
            pb.line_to(size as f32, y as f32);
        }
        pb.finish()
    }

    fn vertical_lines(size: u32) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for x in (0..size as usize).step_by(TEXTURE_STEP) {
            pb.move_to(x as f32, 0.0);
            pb.line_to(x as f32, size as f32);
        }
        pb.finish()
    }
}

impl Layer for Texture {
    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let size = ctx.size();
        let (surface, clip) = ctx.clipped_surface();
        let transform = surface.transform();
        let pixmap = surface.pixmap_mut();
        let paint = overlay_paint();
        let hairline = Stroke {
            width: 1.0,
            ..Stroke::default()
        };

        match self {
            Texture::None => {}
            Texture::Dots => {
                let mut pb = PathBuilder::new();
                for (x, y) in Self::dot_centers(size) {
                    pb.push_circle(x, y, DOT_RADIUS);
                }
                if let Some(path) = pb.finish() {
                    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, clip);
                }
            }
            Texture::Lines => {
                if let Some(path) = Self::horizontal_lines(size) {
                    pixmap.stroke_path(&path, &paint, &hairline, transform, clip);
                }
            }
            Texture::Grid => {
                // Two passes so crossings accumulate like separate strokes.
                for path in [Self::horizontal_lines(size), Self::vertical_lines(size)]
                    .into_iter()
                    .flatten()
                {
                    pixmap.stroke_path(&path, &paint, &hairline, transform, clip);
                }
            }
        }
    }
}

// ============================================================================
// Pattern
// ============================================================================

impl Pattern {
    /// Generates the shapes for this pattern on an icon of side `size`.
    ///
    /// Every shape is anchored anywhere on the icon and has an extent in
    /// `[5, 15)`: the radius of a circle, or the height and half-base of an
    /// upward-pointing triangle.
    pub(crate) fn shapes(&self, size: u32, rng: &mut dyn RngCore) -> Vec<Path> {
        if *self == Pattern::None {
            return Vec::new();
        }

        let size = size as f32;
        (0..PATTERN_SHAPES)
            .filter_map(|_| {
                let x = rng.gen_range(0.0..size);
                let y = rng.gen_range(0.0..size);
                let extent = rng.gen_range(SHAPE_EXTENT);
                match self {
                    Pattern::Circles => PathBuilder::from_circle(x, y, extent),
                    _ => {
                        let mut pb = PathBuilder::new();
                        pb.move_to(x, y);
                        pb.line_to(x + extent, y + extent);
                        pb.line_to(x - extent, y + extent);
                        pb.close();
                        pb.finish()
                    }
                }
            })
            .collect()
    }
}

impl Layer for Pattern {
    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let shapes = self.shapes(ctx.size(), ctx.rng());
        let (surface, clip) = ctx.clipped_surface();
        let transform = surface.transform();
        let pixmap = surface.pixmap_mut();
        let paint = overlay_paint();

        // One fill per shape so overlaps compound.
        for shape in &shapes {
            pixmap.fill_path(shape, &paint, FillRule::Winding, transform, clip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RasterSurface;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn render(layer: &dyn Layer, size: u32, seed: u64) -> RasterSurface {
        let mut surface = RasterSurface::new(size).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ctx = RenderContext::new(&mut surface, &mut rng);
        layer.transform(&mut ctx);
        surface
    }

    fn alpha(surface: &RasterSurface, x: u32, y: u32) -> u8 {
        surface.pixel(x, y).unwrap()[3]
    }

    #[test]
    fn dot_centers_follow_checkerboard() {
        let centers: Vec<_> = Texture::dot_centers(16).collect();
        assert!(centers.contains(&(0.0, 0.0)));
        assert!(centers.contains(&(4.0, 4.0)));
        assert!(centers.contains(&(8.0, 0.0)));
        assert!(!centers.contains(&(4.0, 0.0)));
        assert!(!centers.contains(&(0.0, 4.0)));
        assert_eq!(centers.len(), 8);
    }

    #[test]
    fn dots_are_faint_white() {
        let surface = render(&Texture::Dots, 16, 0);
        let dot = surface.pixel(4, 4).unwrap();
        assert!(dot[3] > 0 && dot[3] <= 26);
        assert_eq!(alpha(&surface, 6, 4), 0);
    }

    #[test]
    fn lines_are_horizontal_only() {
        let surface = render(&Texture::Lines, 16, 0);
        assert!(alpha(&surface, 10, 4) > 0);
        assert_eq!(alpha(&surface, 10, 6), 0);
    }

    #[test]
    fn grid_crossings_accumulate() {
        let surface = render(&Texture::Grid, 16, 0);
        let edge = alpha(&surface, 6, 4);
        let crossing = alpha(&surface, 4, 4);
        assert!(edge > 0);
        assert!(crossing > edge);
        assert_eq!(alpha(&surface, 6, 6), 0);
    }

    #[test]
    fn none_texture_draws_nothing() {
        let surface = render(&Texture::None, 16, 0);
        assert!(surface.to_rgba_image().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn pattern_shapes_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for shape in Pattern::Circles.shapes(64, &mut rng) {
            let b = shape.bounds();
            let radius = b.width() / 2.0;
            let (cx, cy) = (b.left() + radius, b.top() + radius);
            assert!((4.999..15.001).contains(&radius), "radius {radius}");
            assert!((-0.001..64.001).contains(&cx) && (-0.001..64.001).contains(&cy));
        }
        assert_eq!(Pattern::Triangles.shapes(64, &mut rng).len(), PATTERN_SHAPES);
        assert!(Pattern::None.shapes(64, &mut rng).is_empty());
    }

    #[test]
    fn seeded_patterns_are_reproducible() {
        let a = render(&Pattern::Circles, 64, 7);
        let b = render(&Pattern::Circles, 64, 7);
        assert_eq!(a, b);
        assert!(a.to_rgba_image().pixels().any(|p| p[3] > 0));
    }
}
