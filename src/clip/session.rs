//! One screenshot clip from overlay mount to teardown.
//!
//! [`CaptureSession`] owns every element injected into the page and removes
//! them in a single [`teardown`](CaptureSession::teardown).
//! [`ScreenshotClipper`] drives selection, capture, compositing and saving on
//! top of it and runs that teardown on every exit path.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ClipperConfig;
use crate::error::{Error, Result};
use crate::identifiers::ElementId;
use crate::protocol::{Cursor, IndicatorTone};

use super::capture::SegmentedCapturer;
use super::compositor::composite;
use super::geometry::{SelectionRect, captures_needed};
use super::host::{OverlayHost, PageControl, PageMetrics, SnippetSink, VisibleTabCapture};
use super::scrape::image_clip_payload;
use super::selector::{RegionSelector, SelectorInput, SelectorStep};

// ============================================================================
// ClipOutcome
// ============================================================================

/// How a clip ended, when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOutcome {
    /// Saved; holds the backend's reply.
    Saved(Value),
    /// Escape pressed during selection.
    Cancelled,
    /// Selection below the minimum size.
    Discarded,
}

// ============================================================================
// CaptureSession
// ============================================================================

/// Injected UI state of one clip.
///
/// Elements are tracked behind a lock so progress updates issued while a
/// capture is running still land in the teardown list.
pub struct CaptureSession<'a> {
    overlay: &'a dyn OverlayHost,
    elements: Mutex<Vec<ElementId>>,
    indicator: Mutex<Option<ElementId>>,
    crosshair: bool,
    torn_down: bool,
}

impl<'a> CaptureSession<'a> {
    /// Mounts the overlay and switches to the crosshair cursor.
    ///
    /// # Errors
    ///
    /// Returns the overlay error. Anything already injected is removed first.
    pub async fn open(overlay: &'a dyn OverlayHost, document_height: f64) -> Result<Self> {
        let elements = overlay.mount(document_height).await?;
        debug!(elements = elements.len(), "Overlay mounted");

        let mut session = Self {
            overlay,
            elements: Mutex::new(elements),
            indicator: Mutex::new(None),
            crosshair: false,
            torn_down: false,
        };

        if let Err(e) = overlay.set_cursor(Cursor::Crosshair).await {
            session.teardown().await;
            return Err(e);
        }
        session.crosshair = true;

        Ok(session)
    }

    /// Takes ownership of an element injected after mount.
    pub fn track(&self, element: ElementId) {
        let mut elements = self.elements.lock();
        if !elements.contains(&element) {
            elements.push(element);
        }
    }

    /// Elements removed on teardown.
    #[must_use]
    pub fn elements(&self) -> Vec<ElementId> {
        self.elements.lock().clone()
    }

    /// Hides the selection UI so it does not appear in captures.
    pub async fn hide_selection_ui(&mut self) {
        for element in self.elements() {
            if let Err(e) = self.overlay.set_visible(&element, false).await {
                warn!(element = %element, error = %e, "Failed to hide overlay element");
            }
        }
        self.restore_cursor().await;
    }

    /// Creates or updates the status indicator.
    ///
    /// Every element the overlay hands back is tracked for teardown, including
    /// a replacement for an indicator that went missing. Failures are logged;
    /// the indicator is cosmetic.
    pub async fn indicate(&self, text: &str, tone: IndicatorTone) {
        let existing = self.indicator.lock().clone();
        match self
            .overlay
            .show_indicator(existing.as_ref(), text, tone)
            .await
        {
            Ok(id) => {
                self.track(id.clone());
                *self.indicator.lock() = Some(id);
            }
            Err(e) => warn!(text, error = %e, "Failed to update indicator"),
        }
    }

    /// Returns `true` once the status indicator exists.
    #[inline]
    #[must_use]
    pub fn has_indicator(&self) -> bool {
        self.indicator.lock().is_some()
    }

    /// Removes every injected element and restores the cursor.
    pub async fn teardown(mut self) {
        self.restore_cursor().await;

        let elements = std::mem::take(self.elements.get_mut());
        for element in elements {
            if let Err(e) = self.overlay.remove(&element).await {
                warn!(element = %element, error = %e, "Failed to remove overlay element");
            }
        }

        *self.indicator.get_mut() = None;
        self.torn_down = true;
        debug!("Capture session torn down");
    }

    async fn restore_cursor(&mut self) {
        if !self.crosshair {
            return;
        }
        if let Err(e) = self.overlay.set_cursor(Cursor::Default).await {
            warn!(error = %e, "Failed to restore cursor");
        }
        self.crosshair = false;
    }
}

impl Drop for CaptureSession<'_> {
    fn drop(&mut self) {
        let remaining = self.elements.get_mut().len();
        if !self.torn_down && remaining > 0 {
            warn!(
                elements = remaining,
                "Capture session dropped without teardown"
            );
        }
    }
}

// ============================================================================
// ScreenshotClipper
// ============================================================================

enum Selection {
    Finished(SelectionRect),
    Cancelled,
    Discarded,
}

/// Region screenshot flow: select, capture, stitch, save.
///
/// # Example
///
/// ```no_run
/// use web_clipper::clip::ScreenshotClipper;
/// use web_clipper::{ApiClient, ClipperConfig, ExtensionTab, Result};
///
/// # async fn example(tab: ExtensionTab) -> Result<()> {
/// let config = ClipperConfig::builder().token("jwt").build()?;
/// let api = ApiClient::new(&config)?;
///
/// let mut inputs = tab.selector_inputs();
/// let clipper = ScreenshotClipper::new(&tab, &tab, &tab, &api, &config);
/// let outcome = clipper.run(&mut inputs).await?;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
pub struct ScreenshotClipper<'a> {
    page: &'a dyn PageControl,
    capture: &'a dyn VisibleTabCapture,
    overlay: &'a dyn OverlayHost,
    sink: &'a dyn SnippetSink,
    config: &'a ClipperConfig,
}

impl<'a> ScreenshotClipper<'a> {
    /// Creates a clipper over the given page, capture, overlay and sink.
    #[must_use]
    pub fn new(
        page: &'a dyn PageControl,
        capture: &'a dyn VisibleTabCapture,
        overlay: &'a dyn OverlayHost,
        sink: &'a dyn SnippetSink,
        config: &'a ClipperConfig,
    ) -> Self {
        Self {
            page,
            capture,
            overlay,
            sink,
            config,
        }
    }

    /// Runs one clip, consuming selector inputs until the selection ends.
    ///
    /// Injected UI is removed and the scroll position restored whatever the
    /// result.
    ///
    /// # Errors
    ///
    /// Capture, encoding, save and transport errors, after the failure has
    /// been shown in the page indicator.
    pub async fn run(
        &self,
        inputs: &mut mpsc::UnboundedReceiver<SelectorInput>,
    ) -> Result<ClipOutcome> {
        let metrics = self.page.metrics().await?;
        let mut session = CaptureSession::open(self.overlay, metrics.document_height).await?;

        let result = self.drive(&mut session, &metrics, inputs).await;

        let linger = match &result {
            Ok(ClipOutcome::Saved(_)) => {
                session.indicate("✅ Saved!", IndicatorTone::Success).await;
                self.config.success_linger()
            }
            Err(e) => {
                warn!(error = %e, "Screenshot clip failed");
                session
                    .indicate(&format!("❌ {}", e.indicator_message()), IndicatorTone::Error)
                    .await;
                self.config.error_linger()
            }
            Ok(_) => Duration::ZERO,
        };

        if !linger.is_zero() && session.has_indicator() {
            tokio::time::sleep(linger).await;
        }

        session.teardown().await;
        result
    }

    async fn drive(
        &self,
        session: &mut CaptureSession<'_>,
        metrics: &PageMetrics,
        inputs: &mut mpsc::UnboundedReceiver<SelectorInput>,
    ) -> Result<ClipOutcome> {
        let rect = match self.select(inputs).await? {
            Selection::Finished(rect) => rect,
            Selection::Cancelled => return Ok(ClipOutcome::Cancelled),
            Selection::Discarded => return Ok(ClipOutcome::Discarded),
        };

        session.hide_selection_ui().await;

        let total = captures_needed(&rect, &metrics.viewport);
        session
            .indicate(&progress_text(0, total), IndicatorTone::Progress)
            .await;

        let capturer =
            SegmentedCapturer::new(self.page, self.capture, self.config.settle_delay());
        let segments = {
            let session: &CaptureSession<'_> = session;
            capturer
                .capture_region(&rect, metrics, move |progress| async move {
                    let text = progress_text(progress.completed, progress.total);
                    session.indicate(&text, IndicatorTone::Progress).await;
                })
                .await?
        };

        let compositor = composite(rect, metrics.viewport, &segments)?;
        let (width, height) = compositor.dimensions();
        let data_url = compositor.to_data_url(self.config.image_format())?;

        info!(
            width,
            height,
            segments = segments.len(),
            bytes = data_url.len(),
            "Screenshot stitched"
        );

        let payload = image_clip_payload(&data_url, metrics.url.as_str());
        let reply = self.sink.save(&payload).await?;

        Ok(ClipOutcome::Saved(reply))
    }

    async fn select(
        &self,
        inputs: &mut mpsc::UnboundedReceiver<SelectorInput>,
    ) -> Result<Selection> {
        let mut selector = RegionSelector::new(self.config.min_selection());

        loop {
            let input = inputs.recv().await.ok_or(Error::ConnectionClosed)?;

            match selector.handle(input) {
                SelectorStep::Ignored => {}
                SelectorStep::Started(feedback) | SelectorStep::Moved(feedback) => {
                    self.overlay.draw_selection(&feedback).await?;
                }
                SelectorStep::Finished(rect) => return Ok(Selection::Finished(rect)),
                SelectorStep::Discarded { .. } => return Ok(Selection::Discarded),
                SelectorStep::Cancelled => return Ok(Selection::Cancelled),
            }
        }
    }
}

fn progress_text(completed: usize, total: usize) -> String {
    format!("📸 Capturing screenshot... ({completed}/{total})")
}

// ============================================================================
// Tests
// ============================================================================
