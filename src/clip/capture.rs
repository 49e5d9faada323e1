//! Scroll-and-capture loop.
//!
//! One visible-tab capture per viewport-high band, top to bottom, strictly
//! sequential. The original scroll position is restored whether the loop
//! succeeds or not.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::dataurl::DataUrl;
use crate::error::{Error, Result};

use super::geometry::{CaptureBand, ScrollOffset, SelectionRect, plan_bands};
use super::host::{PageControl, PageMetrics, VisibleTabCapture};

// ============================================================================
// Types
// ============================================================================

/// One decoded capture and the scroll offset it was taken at.
#[derive(Debug, Clone)]
pub struct CapturedSegment {
    /// Band this capture covers.
    pub band: CaptureBand,
    /// Scroll offset read back after scrolling.
    pub scroll: ScrollOffset,
    /// Decoded bitmap in device pixels.
    pub image: RgbaImage,
}

/// Progress after each finished segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureProgress {
    /// Segments captured so far.
    pub completed: usize,
    /// Segments planned.
    pub total: usize,
}

// ============================================================================
// SegmentedCapturer
// ============================================================================

/// Drives the scroll/settle/capture loop over a selection.
pub struct SegmentedCapturer<'a, P: ?Sized, C: ?Sized> {
    page: &'a P,
    capture: &'a C,
    settle_delay: Duration,
}

impl<'a, P, C> SegmentedCapturer<'a, P, C>
where
    P: PageControl + ?Sized,
    C: VisibleTabCapture + ?Sized,
{
    /// Creates a capturer that waits `settle_delay` after each scroll.
    #[must_use]
    pub fn new(page: &'a P, capture: &'a C, settle_delay: Duration) -> Self {
        Self {
            page,
            capture,
            settle_delay,
        }
    }

    /// Captures every band of `rect`.
    ///
    /// `metrics` is the snapshot taken before capture started; its scroll
    /// offset is what gets restored. `on_progress` is awaited after each
    /// segment.
    ///
    /// # Errors
    ///
    /// The first failing segment aborts the loop. No partial result is
    /// returned.
    pub async fn capture_region<F, Fut>(
        &self,
        rect: &SelectionRect,
        metrics: &PageMetrics,
        mut on_progress: F,
    ) -> Result<Vec<CapturedSegment>>
    where
        F: FnMut(CaptureProgress) -> Fut,
        Fut: Future<Output = ()>,
    {
        let bands = plan_bands(rect, &metrics.viewport);
        let total = bands.len();

        debug!(
            total,
            top = rect.top,
            height = rect.height(),
            viewport_height = metrics.viewport.height,
            "Starting segmented capture"
        );

        let mut segments = Vec::with_capacity(total);
        let mut outcome = Ok(());

        for band in &bands {
            match self.capture_band(band, metrics.scroll.x).await {
                Ok(segment) => {
                    segments.push(segment);
                    on_progress(CaptureProgress {
                        completed: band.index + 1,
                        total,
                    })
                    .await;
                }
                Err(e) => {
                    warn!(segment = band.index, error = %e, "Segment capture failed");
                    outcome = Err(e);
                    break;
                }
            }
        }

        if let Err(e) = self.page.scroll_to(metrics.scroll).await {
            warn!(
                scroll_y = metrics.scroll.y,
                error = %e,
                "Failed to restore scroll position"
            );
        }

        outcome.map(|()| segments)
    }

    async fn capture_band(&self, band: &CaptureBand, scroll_x: f64) -> Result<CapturedSegment> {
        self.page
            .scroll_to(ScrollOffset::new(scroll_x, band.scroll_y))
            .await?;

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let data = self
            .capture
            .capture_visible()
            .await
            .map_err(|e| Error::capture(band.index, e.to_string()))?;

        let scroll = self.page.scroll_position().await?;

        debug!(
            segment = band.index,
            requested_y = band.scroll_y,
            scroll_y = scroll.y,
            "Segment captured"
        );

        Ok(CapturedSegment {
            band: *band,
            scroll,
            image: decode_segment(band.index, &data)?,
        })
    }
}

/// Decodes a capture data URL into an RGBA bitmap.
fn decode_segment(segment: usize, data: &str) -> Result<RgbaImage> {
    if data.is_empty() {
        return Err(Error::EmptyCapture { segment });
    }

    let url = DataUrl::parse(data).map_err(|e| Error::capture(segment, e.to_string()))?;
    let image = image::load_from_memory(url.data())
        .map_err(|e| Error::capture(segment, format!("undecodable image: {e}")))?;

    Ok(image.to_rgba8())
}

// ============================================================================
// Tests
// ============================================================================
