//! In-memory page, capture, overlay and sink doubles shared by clip tests.

use std::io::Cursor;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::api::SavePayload;
use crate::dataurl::DataUrl;
use crate::error::{Error, Result};
use crate::identifiers::ElementId;
use crate::protocol::{Cursor as PageCursor, IndicatorTone};

use super::geometry::{ScrollOffset, Viewport};
use super::host::{OverlayHost, PageControl, PageMetrics, SnippetSink, VisibleTabCapture};
use super::selector::SelectionFeedback;

/// Installs a test subscriber honouring `RUST_LOG`; repeated calls are no-ops.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Encodes a solid-color PNG as a data URL.
pub(crate) fn png_data_url(width: u32, height: u32, color: [u8; 4]) -> String {
    let bitmap = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut bytes = Vec::new();
    bitmap
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    DataUrl::new("image/png", bytes).to_string()
}

// ============================================================================
// FakePage
// ============================================================================

/// Page that clamps vertical scroll to `[0, document_height - viewport_height]`.
pub(crate) struct FakePage {
    document_height: f64,
    viewport_width: f64,
    viewport_height: f64,
    dpr: f64,
    scroll: Mutex<ScrollOffset>,
    history: Mutex<Vec<f64>>,
}

impl FakePage {
    pub(crate) fn new(document_height: f64, viewport_height: f64) -> Self {
        Self {
            document_height,
            viewport_width: 40.0,
            viewport_height,
            dpr: 1.0,
            scroll: Mutex::new(ScrollOffset::default()),
            history: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_dpr(mut self, dpr: f64) -> Self {
        self.dpr = dpr;
        self
    }

    pub(crate) fn set_scroll(&self, y: f64) {
        self.scroll.lock().y = y;
    }

    pub(crate) fn scroll(&self) -> ScrollOffset {
        *self.scroll.lock()
    }

    /// Vertical targets passed to `scroll_to`, in call order.
    pub(crate) fn scroll_history(&self) -> Vec<f64> {
        self.history.lock().clone()
    }
}

#[async_trait]
impl PageControl for FakePage {
    async fn metrics(&self) -> Result<PageMetrics> {
        Ok(PageMetrics {
            scroll: self.scroll(),
            viewport: Viewport::new(self.viewport_width, self.viewport_height, self.dpr)?,
            document_height: self.document_height,
            url: "https://example.com/article".into(),
            title: "Example article".into(),
        })
    }

    async fn scroll_to(&self, offset: ScrollOffset) -> Result<()> {
        self.history.lock().push(offset.y);
        let max = (self.document_height - self.viewport_height).max(0.0);
        *self.scroll.lock() = ScrollOffset::new(offset.x, offset.y.clamp(0.0, max));
        Ok(())
    }

    async fn scroll_position(&self) -> Result<ScrollOffset> {
        Ok(self.scroll())
    }
}

// ============================================================================
// BandColorCapture
// ============================================================================

/// Captures a viewport-sized bitmap whose color encodes the band index.
pub(crate) struct BandColorCapture<'a> {
    page: &'a FakePage,
    pub(crate) fail: bool,
    calls: Mutex<usize>,
}

impl<'a> BandColorCapture<'a> {
    pub(crate) fn new(page: &'a FakePage) -> Self {
        Self {
            page,
            fail: false,
            calls: Mutex::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        *self.calls.lock()
    }

    pub(crate) fn color(index: usize) -> [u8; 4] {
        [(index as u8).wrapping_mul(40).wrapping_add(20), 120, 200, 255]
    }
}

#[async_trait]
impl VisibleTabCapture for BandColorCapture<'_> {
    async fn capture_visible(&self) -> Result<String> {
        let index = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls - 1
        };
        if self.fail {
            return Err(Error::protocol("capture rejected"));
        }
        let height = (self.page.viewport_height * self.page.dpr).round() as u32;
        let width = (self.page.viewport_width * self.page.dpr).round() as u32;
        Ok(png_data_url(width, height, Self::color(index)))
    }
}

// ============================================================================
// FakeOverlay
// ============================================================================

/// Overlay that tracks live element IDs and every indicator text.
#[derive(Default)]
pub(crate) struct FakeOverlay {
    pub(crate) live: Mutex<Vec<ElementId>>,
    pub(crate) next_id: Mutex<u32>,
    pub(crate) indicators: Mutex<Vec<(String, IndicatorTone)>>,
    pub(crate) drawn: Mutex<Vec<SelectionFeedback>>,
    pub(crate) cursors: Mutex<Vec<PageCursor>>,
    pub(crate) hidden: Mutex<Vec<ElementId>>,
    /// Number of upcoming `show_indicator` calls that fail.
    pub(crate) failing_indicators: Mutex<usize>,
    /// Answer every `show_indicator` with a new element, ignoring `existing`.
    pub(crate) fresh_indicators: bool,
}

impl FakeOverlay {
    fn allocate(&self) -> ElementId {
        let mut next = self.next_id.lock();
        *next += 1;
        let id = ElementId::new(format!("el-{next}"));
        self.live.lock().push(id.clone());
        id
    }

    pub(crate) fn live_elements(&self) -> Vec<ElementId> {
        self.live.lock().clone()
    }

    pub(crate) fn indicator_texts(&self) -> Vec<String> {
        self.indicators.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    pub(crate) fn last_tone(&self) -> Option<IndicatorTone> {
        self.indicators.lock().last().map(|(_, tone)| *tone)
    }
}

#[async_trait]
impl OverlayHost for FakeOverlay {
    async fn mount(&self, _document_height: f64) -> Result<Vec<ElementId>> {
        Ok((0..3).map(|_| self.allocate()).collect())
    }

    async fn set_visible(&self, element: &ElementId, visible: bool) -> Result<()> {
        if !visible {
            self.hidden.lock().push(element.clone());
        }
        Ok(())
    }

    async fn draw_selection(&self, feedback: &SelectionFeedback) -> Result<()> {
        self.drawn.lock().push(feedback.clone());
        Ok(())
    }

    async fn show_indicator(
        &self,
        existing: Option<&ElementId>,
        text: &str,
        tone: IndicatorTone,
    ) -> Result<ElementId> {
        {
            let mut failing = self.failing_indicators.lock();
            if *failing > 0 {
                *failing -= 1;
                return Err(Error::protocol("indicator host unavailable"));
            }
        }

        self.indicators.lock().push((text.to_string(), tone));
        Ok(match existing {
            Some(id) if !self.fresh_indicators => id.clone(),
            _ => self.allocate(),
        })
    }

    async fn remove(&self, element: &ElementId) -> Result<()> {
        self.live.lock().retain(|id| id != element);
        Ok(())
    }

    async fn set_cursor(&self, cursor: PageCursor) -> Result<()> {
        self.cursors.lock().push(cursor);
        Ok(())
    }
}

// ============================================================================
// FakeSink
// ============================================================================

/// Sink that records payloads and answers with a canned result.
pub(crate) struct FakeSink {
    pub(crate) saved: Mutex<Vec<SavePayload>>,
    reply: fn() -> Result<Value>,
}

impl FakeSink {
    pub(crate) fn ok() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            reply: || Ok(json!({ "_id": "abc123" })),
        }
    }

    pub(crate) fn failing(reply: fn() -> Result<Value>) -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            reply,
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.saved.lock().len()
    }
}

#[async_trait]
impl SnippetSink for FakeSink {
    async fn save(&self, payload: &SavePayload) -> Result<Value> {
        self.saved.lock().push(payload.clone());
        (self.reply)()
    }
}
