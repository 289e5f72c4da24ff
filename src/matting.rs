//! Logo upload and background removal.
//!
//! Background removal treats the mean color of the four corner pixels as the
//! backdrop and makes every pixel within `tolerance` of it fully transparent.
//! The cutoff is binary, with no feathering.
//!
//! The uploaded bitmap is kept for the whole session in a [`LogoSlot`]. Each
//! reprocess starts from that original, never from a previous result, so
//! repeated tolerance changes never compound.
//!
//! # Reprocessing
//!
//! A [`LogoSlot`] hands out [`ReprocessTicket`]s. A ticket owns everything
//! the work needs and can be moved to another task; its result is applied
//! with [`LogoSlot::complete`], which ignores tickets superseded by a later
//! upload, settings change or clear.
//!
//! ```
//! use favicon_studio::matting::{Completion, LogoSlot, RemovalSettings};
//! use image::{Rgba, RgbaImage};
//!
//! let mut logo = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
//! logo.put_pixel(4, 4, Rgba([200, 0, 0, 255]));
//!
//! let mut slot = LogoSlot::new(RemovalSettings::new(true, 30));
//! let ticket = slot.set_original(logo).unwrap();
//! let result = ticket.run();
//! assert_eq!(slot.complete(ticket, Ok(result)), Completion::Applied);
//!
//! let active = slot.active().unwrap();
//! assert_eq!(active.get_pixel(0, 0)[3], 0);
//! assert_eq!(active.get_pixel(4, 4)[3], 255);
//! ```

use std::sync::Arc;

use image::{Rgb, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::layer::svg::render_svg_bytes;

pub const TOLERANCE_MIN: u8 = 10;
pub const TOLERANCE_MAX: u8 = 100;
pub const DEFAULT_TOLERANCE: u8 = 30;

/// Side of the bitmap an uploaded SVG logo is rasterized to.
pub const SVG_LOGO_SIZE: u32 = 512;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum MattingError {
    /// The uploaded bytes are neither a raster image nor an SVG document.
    #[error("uploaded file is not a decodable image")]
    Decode(#[source] image::ImageError),

    /// The background-removal task did not finish.
    #[error("background removal failed")]
    Processing(#[source] tokio::task::JoinError),
}

// ============================================================================
// Background Removal
// ============================================================================

/// Returns a copy of `image` with its background made transparent.
///
/// The backdrop color is the per-channel mean of the four corner pixels,
/// rounded down. Pixels whose Euclidean RGB distance to it is strictly less
/// than `tolerance` get alpha 0; all others are copied unchanged.
pub fn remove_background(image: &RgbaImage, tolerance: u8) -> RgbaImage {
    let mut output = image.clone();
    let Some(backdrop) = corner_mean(image) else {
        return output;
    };

    let threshold = tolerance as f64;
    let mut cleared = 0usize;
    for pixel in output.pixels_mut() {
        if color_distance(pixel.0, backdrop) < threshold {
            pixel.0[3] = 0;
            cleared += 1;
        }
    }

    info!(
        width = image.width(),
        height = image.height(),
        tolerance,
        cleared,
        "Removed logo background"
    );
    output
}

/// Runs [`remove_background`] on the blocking thread pool.
pub async fn remove_background_async(
    image: Arc<RgbaImage>,
    tolerance: u8,
) -> Result<RgbaImage, MattingError> {
    info!(width = image.width(), height = image.height(), tolerance, "Starting background removal");
    tokio::task::spawn_blocking(move || remove_background(&image, tolerance))
        .await
        .map_err(MattingError::Processing)
}

/// Mean RGB of the four corner pixels, or `None` for an empty image.
///
/// Corners of different colors average to a color that may match none of
/// them; such images need a lower tolerance or no removal at all.
pub fn corner_mean(image: &RgbaImage) -> Option<Rgb<u8>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let corners = [(0, 0), (width - 1, 0), (0, height - 1), (width - 1, height - 1)];
    let mut sum = [0u32; 3];
    for (x, y) in corners {
        let pixel = image.get_pixel(x, y);
        for (total, channel) in sum.iter_mut().zip(pixel.0) {
            *total += channel as u32;
        }
    }

    let n = corners.len() as u32;
    Some(Rgb(sum.map(|total| (total / n) as u8)))
}

fn color_distance(pixel: [u8; 4], backdrop: Rgb<u8>) -> f64 {
    pixel
        .iter()
        .zip(backdrop.0)
        .map(|(&a, b)| {
            let d = a as f64 - b as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Decodes an uploaded logo file.
///
/// Any raster format the `image` crate reads is accepted; failing that, the
/// bytes are parsed as SVG and rasterized to fit [`SVG_LOGO_SIZE`].
pub fn decode_logo(bytes: &[u8]) -> Result<RgbaImage, MattingError> {
    match image::load_from_memory(bytes) {
        Ok(image) => Ok(image.to_rgba8()),
        Err(err) => match render_svg_bytes(bytes, SVG_LOGO_SIZE) {
            Some(image) => {
                debug!("Decoded logo as SVG");
                Ok(image)
            }
            None => Err(MattingError::Decode(err)),
        },
    }
}

// ============================================================================
// RemovalSettings
// ============================================================================

/// User settings for background removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct RemovalSettings {
    pub enabled: bool,

    /// Color distance threshold, 10-100.
    pub tolerance: u8,
}

impl Default for RemovalSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl RemovalSettings {
    /// Creates settings with the tolerance clamped to 10-100.
    pub fn new(enabled: bool, tolerance: u8) -> Self {
        Self {
            enabled,
            tolerance: tolerance.clamp(TOLERANCE_MIN, TOLERANCE_MAX),
        }
    }
}

// ============================================================================
// LogoAsset
// ============================================================================

/// An uploaded logo, either as uploaded or with its background removed.
#[derive(Debug, Clone, PartialEq)]
pub enum LogoAsset {
    Original(Arc<RgbaImage>),

    Processed {
        bitmap: Arc<RgbaImage>,

        /// The upload this was derived from.
        source: Arc<RgbaImage>,

        tolerance: u8,
    },
}

impl LogoAsset {
    /// The bitmap that renders should draw.
    pub fn active(&self) -> &RgbaImage {
        match self {
            Self::Original(bitmap) | Self::Processed { bitmap, .. } => bitmap,
        }
    }

    /// The bitmap as uploaded.
    pub fn original(&self) -> &Arc<RgbaImage> {
        match self {
            Self::Original(original) | Self::Processed { source: original, .. } => original,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }
}

// ============================================================================
// LogoSlot
// ============================================================================

/// A pending background-removal request.
#[derive(Debug, Clone)]
pub struct ReprocessTicket {
    version: u64,
    original: Arc<RgbaImage>,
    tolerance: u8,
}

impl ReprocessTicket {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn tolerance(&self) -> u8 {
        self.tolerance
    }

    /// Runs the removal on the current thread.
    pub fn run(&self) -> RgbaImage {
        remove_background(&self.original, self.tolerance)
    }

    /// Runs the removal on the blocking thread pool.
    pub async fn run_async(&self) -> Result<RgbaImage, MattingError> {
        remove_background_async(Arc::clone(&self.original), self.tolerance).await
    }
}

/// Outcome of [`LogoSlot::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The processed bitmap is now active.
    Applied,

    /// Processing failed; the original bitmap is active.
    FellBack,

    /// A newer request was issued after this one; nothing changed.
    Stale,
}

/// The session's single logo slot.
///
/// Every change that invalidates in-flight work (upload, settings change,
/// clear, new request) bumps an internal version. Only a ticket carrying the
/// latest version can update the slot.
#[derive(Debug, Default)]
pub struct LogoSlot {
    asset: Option<LogoAsset>,
    settings: RemovalSettings,
    version: u64,
}

impl LogoSlot {
    pub fn new(settings: RemovalSettings) -> Self {
        Self {
            asset: None,
            settings,
            version: 0,
        }
    }

    pub fn settings(&self) -> RemovalSettings {
        self.settings
    }

    pub fn asset(&self) -> Option<&LogoAsset> {
        self.asset.as_ref()
    }

    /// The bitmap that renders should draw, if a logo is loaded.
    pub fn active(&self) -> Option<&RgbaImage> {
        self.asset.as_ref().map(LogoAsset::active)
    }

    pub fn is_loaded(&self) -> bool {
        self.asset.is_some()
    }

    /// Decodes and stores an uploaded file.
    ///
    /// On a decode error the slot is left untouched. Returns a ticket when
    /// background removal is enabled.
    pub fn upload(&mut self, bytes: &[u8]) -> Result<Option<ReprocessTicket>, MattingError> {
        let image = decode_logo(bytes)?;
        Ok(self.set_original(image))
    }

    /// Stores an already decoded logo.
    pub fn set_original(&mut self, image: RgbaImage) -> Option<ReprocessTicket> {
        info!(width = image.width(), height = image.height(), "Logo loaded");
        self.asset = Some(LogoAsset::Original(Arc::new(image)));
        self.version += 1;
        self.begin_reprocess()
    }

    /// Changes the removal settings.
    ///
    /// Disabling restores the original bitmap at once. Enabling, or changing
    /// the tolerance while enabled, returns a ticket for the new settings.
    pub fn set_removal(&mut self, settings: RemovalSettings) -> Option<ReprocessTicket> {
        let settings = RemovalSettings::new(settings.enabled, settings.tolerance);
        if settings == self.settings {
            return None;
        }
        self.settings = settings;
        self.version += 1;

        if !settings.enabled {
            self.restore_original();
            return None;
        }
        self.begin_reprocess()
    }

    /// Issues a ticket for the current settings, superseding older ones.
    ///
    /// Returns `None` when removal is disabled or no logo is loaded.
    pub fn begin_reprocess(&mut self) -> Option<ReprocessTicket> {
        if !self.settings.enabled {
            return None;
        }
        let original = Arc::clone(self.asset.as_ref()?.original());
        self.version += 1;
        debug!(version = self.version, tolerance = self.settings.tolerance, "Reprocess requested");

        Some(ReprocessTicket {
            version: self.version,
            original,
            tolerance: self.settings.tolerance,
        })
    }

    /// Applies the result of a ticket if it is still the latest request.
    pub fn complete(
        &mut self,
        ticket: ReprocessTicket,
        result: Result<RgbaImage, MattingError>,
    ) -> Completion {
        if ticket.version != self.version {
            warn!(
                ticket = ticket.version,
                latest = self.version,
                "Discarding stale background-removal result"
            );
            return Completion::Stale;
        }

        match result {
            Ok(bitmap) => {
                self.asset = Some(LogoAsset::Processed {
                    bitmap: Arc::new(bitmap),
                    source: ticket.original,
                    tolerance: ticket.tolerance,
                });
                Completion::Applied
            }
            Err(err) => {
                warn!(error = %err, "Background removal failed, using original logo");
                self.asset = Some(LogoAsset::Original(ticket.original));
                Completion::FellBack
            }
        }
    }

    /// Issues a ticket and completes it on the current thread.
    pub fn reprocess_now(&mut self) -> Option<Completion> {
        let ticket = self.begin_reprocess()?;
        let result = ticket.run();
        Some(self.complete(ticket, Ok(result)))
    }

    /// Removes the logo.
    pub fn clear(&mut self) {
        self.asset = None;
        self.version += 1;
        debug!("Logo cleared");
    }

    fn restore_original(&mut self) {
        if let Some(asset) = self.asset.take() {
            self.asset = Some(LogoAsset::Original(Arc::clone(asset.original())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;

    const BACKDROP: Rgba<u8> = Rgba([240, 240, 240, 255]);
    const INK: Rgba<u8> = Rgba([20, 60, 200, 255]);

    /// 16x16 light backdrop with an 8x8 blue square at (4, 4).
    fn framed_square() -> RgbaImage {
        RgbaImage::from_fn(16, 16, |x, y| {
            if (4..12).contains(&x) && (4..12).contains(&y) {
                INK
            } else {
                BACKDROP
            }
        })
    }

    fn assert_square_isolated(image: &RgbaImage) {
        for (x, y, pixel) in image.enumerate_pixels() {
            if (4..12).contains(&x) && (4..12).contains(&y) {
                assert_eq!(*pixel, INK, "center ({x}, {y})");
            } else {
                assert_eq!(pixel[3], 0, "background ({x}, {y})");
            }
        }
    }

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn removes_uniform_background() {
        assert_square_isolated(&remove_background(&framed_square(), 30));
    }

    #[test]
    fn input_is_not_mutated() {
        let input = framed_square();
        let _ = remove_background(&input, 30);
        assert_eq!(input, framed_square());
    }

    #[test]
    fn corner_mean_rounds_down() {
        let mut image = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([3, 10, 255, 255]));
        image.put_pixel(2, 2, Rgba([2, 1, 0, 255]));
        assert_eq!(corner_mean(&image), Some(Rgb([1, 2, 63])));
        assert_eq!(corner_mean(&RgbaImage::new(0, 0)), None);
    }

    #[test]
    fn tolerance_is_strict() {
        // Distance exactly 30 from the backdrop: (18, 24, 0) has length 30.
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([100, 100, 100, 255]));
        image.put_pixel(1, 1, Rgba([118, 124, 100, 255]));
        image.put_pixel(2, 2, Rgba([118, 123, 100, 255]));

        let out = remove_background(&image, 30);
        assert_eq!(out.get_pixel(1, 1)[3], 255);
        assert_eq!(out.get_pixel(2, 2)[3], 0);
        assert_eq!(out.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn mixed_corners_average_to_backdrop() {
        // Two black and two white corners average to mid gray.
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([127, 127, 127, 255]));
        image.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        image.put_pixel(3, 0, Rgba([0, 0, 0, 255]));
        image.put_pixel(0, 3, Rgba([255, 255, 255, 255]));
        image.put_pixel(3, 3, Rgba([255, 255, 255, 255]));

        let out = remove_background(&image, 10);
        assert_eq!(out.get_pixel(1, 1)[3], 0);
        assert_eq!(out.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn settings_clamp_tolerance() {
        assert_eq!(RemovalSettings::new(true, 0).tolerance, TOLERANCE_MIN);
        assert_eq!(RemovalSettings::new(true, 255).tolerance, TOLERANCE_MAX);
        assert_eq!(RemovalSettings::default(), RemovalSettings::new(false, 30));
    }

    #[test]
    fn upload_decodes_png() {
        let mut slot = LogoSlot::default();
        let ticket = slot.upload(&png_bytes(&framed_square())).unwrap();

        assert!(ticket.is_none(), "removal disabled by default");
        assert_eq!(slot.active(), Some(&framed_square()));
        assert!(!slot.asset().unwrap().is_processed());
    }

    #[test]
    fn upload_accepts_svg() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#00ff00"/></svg>"##;
        let mut slot = LogoSlot::default();
        slot.upload(svg).unwrap();

        let logo = slot.active().unwrap();
        assert_eq!(logo.dimensions(), (SVG_LOGO_SIZE, SVG_LOGO_SIZE));
        assert_eq!(logo.get_pixel(256, 256).0, [0, 255, 0, 255]);
    }

    #[test]
    fn undecodable_upload_leaves_slot_untouched() {
        let mut slot = LogoSlot::default();
        slot.set_original(framed_square());

        let err = slot.upload(b"definitely not an image").unwrap_err();
        assert!(matches!(err, MattingError::Decode(_)));
        assert_eq!(slot.active(), Some(&framed_square()));
    }

    #[test]
    fn reprocessing_always_starts_from_original() {
        let mut slot = LogoSlot::new(RemovalSettings::new(true, 30));
        let ticket = slot.set_original(framed_square()).unwrap();
        let result = ticket.run();
        assert_eq!(slot.complete(ticket, Ok(result)), Completion::Applied);

        for _ in 0..3 {
            assert_eq!(slot.reprocess_now(), Some(Completion::Applied));
            assert_square_isolated(slot.active().unwrap());
            assert_eq!(**slot.asset().unwrap().original(), framed_square());
        }
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut slot = LogoSlot::new(RemovalSettings::new(true, 30));
        slot.set_original(framed_square());

        let first = slot.begin_reprocess().unwrap();
        let second = slot.set_removal(RemovalSettings::new(true, 60)).unwrap();
        assert!(second.version() > first.version());

        let stale = first.run();
        assert_eq!(slot.complete(first, Ok(stale)), Completion::Stale);
        assert!(!slot.asset().unwrap().is_processed());

        let fresh = second.run();
        assert_eq!(slot.complete(second, Ok(fresh)), Completion::Applied);
        match slot.asset().unwrap() {
            LogoAsset::Processed { tolerance, .. } => assert_eq!(*tolerance, 60),
            other => panic!("expected processed asset, got {other:?}"),
        }
    }

    #[test]
    fn clear_invalidates_pending_ticket() {
        let mut slot = LogoSlot::new(RemovalSettings::new(true, 30));
        let ticket = slot.set_original(framed_square()).unwrap();
        slot.clear();

        let result = ticket.run();
        assert_eq!(slot.complete(ticket, Ok(result)), Completion::Stale);
        assert!(!slot.is_loaded());
        assert!(slot.begin_reprocess().is_none());
    }

    #[test]
    fn disabling_restores_original() {
        let mut slot = LogoSlot::new(RemovalSettings::new(true, 30));
        slot.set_original(framed_square());
        slot.reprocess_now();
        assert!(slot.asset().unwrap().is_processed());

        assert!(slot.set_removal(RemovalSettings::new(false, 30)).is_none());
        assert_eq!(slot.active(), Some(&framed_square()));
    }

    #[test]
    fn unchanged_settings_issue_no_ticket() {
        let mut slot = LogoSlot::new(RemovalSettings::new(true, 30));
        slot.set_original(framed_square());
        assert!(slot.set_removal(RemovalSettings::new(true, 30)).is_none());
    }

    #[tokio::test]
    async fn async_removal_matches_sync() {
        let image = Arc::new(framed_square());
        let async_result = remove_background_async(Arc::clone(&image), 30).await.unwrap();
        assert_eq!(async_result, remove_background(&image, 30));
    }

    #[tokio::test]
    async fn failed_processing_falls_back_to_original() {
        let mut slot = LogoSlot::new(RemovalSettings::new(true, 30));
        let ticket = slot.set_original(framed_square()).unwrap();

        let join_error = tokio::task::spawn_blocking(|| -> RgbaImage { panic!("encoder crashed") })
            .await
            .unwrap_err();
        let outcome = slot.complete(ticket, Err(MattingError::Processing(join_error)));

        assert_eq!(outcome, Completion::FellBack);
        assert_eq!(slot.active(), Some(&framed_square()));
    }

    #[tokio::test]
    async fn ticket_runs_on_blocking_pool() {
        let mut slot = LogoSlot::new(RemovalSettings::new(true, 30));
        let ticket = slot.set_original(framed_square()).unwrap();

        let result = ticket.run_async().await;
        assert_eq!(slot.complete(ticket, result), Completion::Applied);
        assert_square_isolated(slot.active().unwrap());
    }
}
