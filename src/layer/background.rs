//! Background layers: the rounded clip, the mode fill and the border stroke.

use resvg::tiny_skia::{
    FillRule, GradientStop, LinearGradient, Mask, Paint, Path, PathBuilder, Point, Rect, Shader,
    SpreadMode, Stroke, Transform,
};

use super::{ClipRegion, Layer, RenderContext};
use crate::color::HexColor;
use crate::config::{BackgroundMode, StyleConfig};

/// Minimum stroke width of the outline frame, in logical pixels.
const OUTLINE_MIN_WIDTH: f32 = 2.0;

/// Outline frame width as a fraction of the icon side.
const OUTLINE_WIDTH_RATIO: f32 = 0.05;

// ============================================================================
// Paths
// ============================================================================

/// Builds a rectangle whose corners are rounded with quadratic curves.
///
/// Each corner uses its sharp corner point as the control point, which gives
/// a slightly tighter curve than a circular arc. A radius of zero yields a
/// plain rectangle.
pub fn rounded_rect(left: f32, top: f32, right: f32, bottom: f32, radius: f32) -> Option<Path> {
    let r = radius.max(0.0);
    let mut pb = PathBuilder::new();
    pb.move_to(left + r, top);
    pb.line_to(right - r, top);
    pb.quad_to(right, top, right, top + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(left + r, bottom);
    pb.quad_to(left, bottom, left, bottom - r);
    pb.line_to(left, top + r);
    pb.quad_to(left, top, left + r, top);
    pb.close();
    pb.finish()
}

fn rect_path(x: f32, y: f32, width: f32, height: f32) -> Option<Path> {
    Rect::from_xywh(x, y, width, height).map(PathBuilder::from_rect)
}

fn solid_paint(color: HexColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia(1.0));
    paint.anti_alias = true;
    paint
}

fn corner_radius(size: f32, radius_percent: f32) -> f32 {
    size * radius_percent / 100.0
}

// ============================================================================
// ClipLayer
// ============================================================================

/// Restricts the background layers to the rounded icon shape.
///
/// # Emitted Properties
///
/// - [`ClipRegion`]: when `radius_percent > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipLayer {
    /// Corner radius as a percentage of the icon side.
    pub radius_percent: f32,
}

impl Layer for ClipLayer {
    fn transform(&self, _ctx: &mut RenderContext<'_>) {}

    fn emit(&self, ctx: &mut RenderContext<'_>) {
        if self.radius_percent <= 0.0 {
            return;
        }

        let size = ctx.size() as f32;
        let Some(path) = rounded_rect(0.0, 0.0, size, size, corner_radius(size, self.radius_percent))
        else {
            return;
        };

        let surface = ctx.surface();
        let device = surface.device_size();
        let Some(mut mask) = Mask::new(device, device) else {
            return;
        };
        mask.fill_path(&path, FillRule::Winding, true, surface.transform());

        ctx.set(ClipRegion(mask));
    }
}

// ============================================================================
// FillLayer
// ============================================================================

/// Paints the background according to the [`BackgroundMode`].
///
/// - `Gradient`: diagonal linear gradient from the top-left to the
///   bottom-right corner.
/// - `Outline`: no fill; a square frame stroked in the background color.
/// - Every other mode: a flat fill.
///
/// # Consumed Properties
///
/// - [`ClipRegion`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillLayer {
    pub mode: BackgroundMode,
    pub background: HexColor,
    pub gradient: (HexColor, HexColor),
}

impl FillLayer {
    pub fn from_config(config: &StyleConfig) -> Self {
        Self {
            mode: config.mode,
            background: config.background,
            gradient: config.gradient,
        }
    }
}

impl Layer for FillLayer {
    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let size = ctx.size() as f32;
        let (surface, clip) = ctx.clipped_surface();
        let transform = surface.transform();
        let pixmap = surface.pixmap_mut();

        match self.mode {
            BackgroundMode::Outline => {
                let width = OUTLINE_MIN_WIDTH.max(size * OUTLINE_WIDTH_RATIO);
                let inset = width / 2.0;
                let Some(path) = rect_path(inset, inset, size - width, size - width) else {
                    return;
                };
                let stroke = Stroke {
                    width,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &solid_paint(self.background), &stroke, transform, clip);
            }
            BackgroundMode::Gradient => {
                let Some(rect) = Rect::from_xywh(0.0, 0.0, size, size) else {
                    return;
                };
                let (start, end) = self.gradient;
                let Some(shader) = LinearGradient::new(
                    Point::from_xy(0.0, 0.0),
                    Point::from_xy(size, size),
                    vec![
                        GradientStop::new(0.0, start.to_skia(1.0)),
                        GradientStop::new(1.0, end.to_skia(1.0)),
                    ],
                    SpreadMode::Pad,
                    Transform::identity(),
                ) else {
                    return;
                };
                let paint = Paint {
                    shader,
                    anti_alias: true,
                    ..Paint::default()
                };
                pixmap.fill_rect(rect, &paint, transform, clip);
            }
            _ => {
                let Some(rect) = Rect::from_xywh(0.0, 0.0, size, size) else {
                    return;
                };
                let paint = Paint {
                    shader: Shader::SolidColor(self.background.to_skia(1.0)),
                    ..Paint::default()
                };
                pixmap.fill_rect(rect, &paint, transform, clip);
            }
        }
    }
}

// ============================================================================
// BorderLayer
// ============================================================================

/// Strokes a border just inside the icon edge, following the rounded corners.
///
/// # Consumed Properties
///
/// - [`ClipRegion`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderLayer {
    /// Stroke width in logical pixels. Nothing is drawn at zero.
    pub width: f32,
    pub color: HexColor,
    /// Corner radius as a percentage of the icon side.
    pub radius_percent: f32,
}

impl BorderLayer {
    pub fn from_config(config: &StyleConfig) -> Self {
        Self {
            width: config.border_width,
            color: config.border_color,
            radius_percent: config.border_radius,
        }
    }
}

impl Layer for BorderLayer {
    fn transform(&self, ctx: &mut RenderContext<'_>) {
        if self.width <= 0.0 {
            return;
        }

        let size = ctx.size() as f32;
        let offset = self.width / 2.0;
        let path = if self.radius_percent > 0.0 {
            let radius = corner_radius(size, self.radius_percent);
            rounded_rect(offset, offset, size - offset, size - offset, radius)
        } else {
            rect_path(offset, offset, size - self.width, size - self.width)
        };
        let Some(path) = path else {
            return;
        };

        let stroke = Stroke {
            width: self.width,
            ..Stroke::default()
        };
        let (surface, clip) = ctx.clipped_surface();
        let transform = surface.transform();
        surface
            .pixmap_mut()
            .stroke_path(&path, &solid_paint(self.color), &stroke, transform, clip);
    }
}
