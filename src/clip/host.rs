//! Seams between the capture pipeline and the outside world.
//!
//! The pipeline never talks to the extension or the backend directly. It is
//! written against these traits, implemented by
//! [`ExtensionTab`](crate::browser::ExtensionTab) and
//! [`ApiClient`](crate::api::ApiClient) in production and by in-memory fakes
//! in tests.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;

use crate::api::SavePayload;
use crate::error::Result;
use crate::identifiers::ElementId;
use crate::protocol::{Cursor, IndicatorTone};

use super::geometry::{ScrollOffset, Viewport};
use super::selector::SelectionFeedback;

// ============================================================================
// PageMetrics
// ============================================================================

/// Snapshot of the page taken when a capture starts.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMetrics {
    /// Scroll offset at snapshot time.
    pub scroll: ScrollOffset,
    /// Viewport size and DPR.
    pub viewport: Viewport,
    /// Full scrollable document height in CSS px.
    pub document_height: f64,
    /// `location.href`.
    pub url: String,
    /// `document.title`.
    pub title: String,
}

// ============================================================================
// Traits
// ============================================================================

/// Scroll state of the captured page.
#[async_trait]
pub trait PageControl: Send + Sync {
    /// Reads scroll offset, viewport, document height, URL and title.
    async fn metrics(&self) -> Result<PageMetrics>;

    /// Scrolls the page to `offset`.
    ///
    /// The browser may clamp the target; read back the real position with
    /// [`scroll_position`](Self::scroll_position).
    async fn scroll_to(&self, offset: ScrollOffset) -> Result<()>;

    /// Reads the current scroll offset.
    async fn scroll_position(&self) -> Result<ScrollOffset>;
}

/// Visible-tab screenshot, owned by the hosting extension process.
#[async_trait]
pub trait VisibleTabCapture: Send + Sync {
    /// Captures what is currently shown and returns it as a data URL.
    ///
    /// An empty string means the capture produced nothing.
    async fn capture_visible(&self) -> Result<String>;
}

/// Injected selection UI.
#[async_trait]
pub trait OverlayHost: Send + Sync {
    /// Injects the info panel, the full-document overlay and the size label.
    ///
    /// Returns the IDs of every injected element.
    async fn mount(&self, document_height: f64) -> Result<Vec<ElementId>>;

    /// Shows or hides an injected element.
    async fn set_visible(&self, element: &ElementId, visible: bool) -> Result<()>;

    /// Redraws the selection box and its size label.
    async fn draw_selection(&self, feedback: &SelectionFeedback) -> Result<()>;

    /// Creates the status indicator, or updates `existing`.
    async fn show_indicator(
        &self,
        existing: Option<&ElementId>,
        text: &str,
        tone: IndicatorTone,
    ) -> Result<ElementId>;

    /// Removes an injected element together with its listeners.
    async fn remove(&self, element: &ElementId) -> Result<()>;

    /// Sets the page cursor.
    async fn set_cursor(&self, cursor: Cursor) -> Result<()>;
}

/// Destination for finished clips.
#[async_trait]
pub trait SnippetSink: Send + Sync {
    /// Saves a clip and returns the backend's JSON reply.
    async fn save(&self, payload: &SavePayload) -> Result<Value>;
}
