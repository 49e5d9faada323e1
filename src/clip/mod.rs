//! Region screenshot capture with scroll-stitching.
//!
//! The pipeline, in order:
//!
//! 1. [`RegionSelector`] turns overlay pointer input into a page-coordinate
//!    [`SelectionRect`].
//! 2. [`SegmentedCapturer`] scrolls through the selection one viewport at a
//!    time and captures each band.
//! 3. [`Compositor`] copies each band into a canvas of
//!    `width × dpr` by `height × dpr` and encodes it.
//! 4. [`ScreenshotClipper`] wraps the result in an `<img>` fragment and hands
//!    it to a [`SnippetSink`].
//!
//! The pipeline only sees the page through the traits in [`host`], so every
//! stage runs against in-memory fakes in tests.

// ============================================================================
// Submodules
// ============================================================================

/// Scroll-and-capture loop.
pub mod capture;

/// Canvas stitching and image encoding.
pub mod compositor;

/// Page-space geometry and band planning.
pub mod geometry;

/// Seams to the page, the extension and the backend.
pub mod host;

/// Text, bookmark and image clip payloads.
pub mod scrape;

/// Drag-to-select state machine.
pub mod selector;

/// Session lifecycle and the end-to-end screenshot flow.
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use capture::{CaptureProgress, CapturedSegment, SegmentedCapturer};
pub use compositor::{Compositor, ImageFormat, composite};
pub use geometry::{
    BlitOp, CaptureBand, DeviceRect, PagePoint, ScrollOffset, SelectionRect, Viewport,
    blit_for_band, canvas_size, captures_needed, plan_bands,
};
pub use host::{OverlayHost, PageControl, PageMetrics, SnippetSink, VisibleTabCapture};
pub use scrape::{Scraped, html_escape, image_clip_payload, image_fragment};
pub use selector::{RegionSelector, SelectionFeedback, SelectorInput, SelectorStep};
pub use session::{CaptureSession, ClipOutcome, ScreenshotClipper};
