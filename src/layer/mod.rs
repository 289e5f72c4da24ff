//! Layer infrastructure for favicon composition.
//!
//! A render is a fixed sequence of layers drawn into one [`RasterSurface`]:
//!
//! ```text
//! ┌────────────┐
//! │    Clip    │ ◄── emits ClipRegion when the corners are rounded
//! └─────┬──────┘
//!       ▼
//! ┌────────────┐
//! │    Fill    │ ◄── consumes ClipRegion
//! └─────┬──────┘
//!       ▼
//! ┌────────────┐
//! │   Border   │ ◄── consumes ClipRegion
//! └─────┬──────┘
//!       ▼
//! ┌────────────┐
//! │  Texture   │ ◄── consumes ClipRegion
//! └─────┬──────┘
//!       ▼
//! ┌────────────┐
//! │  Pattern   │ ◄── consumes ClipRegion, draws from the injected RNG
//! └─────┬──────┘
//!       ▼
//! ┌────────────┐
//! │ Foreground │ ◄── unclipped glyph or logo with its effect
//! └────────────┘
//! ```
//!
//! Layers communicate only through the typed property bag on
//! [`RenderContext`], never through state left behind on the surface.

pub mod background;
pub mod effect;
pub mod foreground;
pub mod glyph;
pub mod overlay;
pub mod svg;

pub use background::{BorderLayer, ClipLayer, FillLayer};
pub use effect::ShadowSpec;
pub use foreground::{ForegroundLayer, logo_extent};
pub use glyph::{GlyphArt, GlyphRasterizer, GlyphStyle, glyph_font_size};
pub use svg::SvgSource;

use std::any::{Any, TypeId};
use std::collections::HashMap;

use rand::RngCore;
use resvg::tiny_skia::Mask;

use crate::surface::RasterSurface;

// ============================================================================
// Render Context
// ============================================================================

/// Context that flows through the rendering pipeline.
///
/// Layers can read properties set by upstream layers and emit new properties
/// for downstream layers to consume.
pub struct RenderContext<'a> {
    surface: &'a mut RasterSurface,

    /// Randomness source for stochastic layers.
    rng: &'a mut dyn RngCore,

    /// Typed property bag for inter-layer communication.
    properties: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl<'a> RenderContext<'a> {
    /// Creates a context drawing into `surface`.
    pub fn new(surface: &'a mut RasterSurface, rng: &'a mut dyn RngCore) -> Self {
        Self {
            surface,
            rng,
            properties: HashMap::new(),
        }
    }

    /// Logical side length of the surface.
    pub fn size(&self) -> u32 {
        self.surface.size()
    }

    pub fn surface(&self) -> &RasterSurface {
        self.surface
    }

    pub fn surface_mut(&mut self) -> &mut RasterSurface {
        self.surface
    }

    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }

    /// Sets a typed property that downstream layers can read.
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) {
        self.properties.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Borrows the surface together with the active clip mask, if any.
    pub fn clipped_surface(&mut self) -> (&mut RasterSurface, Option<&Mask>) {
        let clip = self
            .properties
            .get(&TypeId::of::<ClipRegion>())
            .and_then(|b| b.downcast_ref::<ClipRegion>())
            .map(|region| &region.0);
        (&mut *self.surface, clip)
    }
}

// ============================================================================
// Common Properties
// ============================================================================

/// Device-space coverage mask of the rounded icon shape.
///
/// Emitted by [`ClipLayer`]. Background layers restrict their drawing to it;
/// the foreground ignores it.
pub struct ClipRegion(pub Mask);

// ============================================================================
// Layer Trait
// ============================================================================

/// A single stage of the composition pipeline.
///
/// The separation of [`transform`](Self::transform) and [`emit`](Self::emit)
/// gives property emission a canonical place and keeps the data flow
/// between layers explicit.
pub trait Layer {
    /// Draws this layer into the context's surface.
    fn transform(&self, ctx: &mut RenderContext<'_>);

    /// Emits properties for downstream layers. Called after `transform`.
    fn emit(&self, _ctx: &mut RenderContext<'_>) {}
}
