//! Page-space geometry for region capture.
//!
//! Everything here is pure: page coordinates in CSS pixels go in, device
//! pixel rectangles for the compositor come out.
//!
//! Band planning and blit computation live here rather than in the
//! capturer/compositor so the tiling invariant can be checked without a
//! browser: for a selection of height `h` and viewport height `vh` there are
//! `ceil(h / vh)` bands, and their destination rows tile `[0, h × dpr)`
//! exactly once.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

// ============================================================================
// PagePoint
// ============================================================================

/// A point in page coordinates (document-relative, scroll included).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PagePoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl PagePoint {
    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// SelectionRect
// ============================================================================

/// Selected region in page coordinates.
///
/// Always normalized: `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    /// Top edge.
    pub top: f64,
    /// Left edge.
    pub left: f64,
    /// Right edge (exclusive).
    pub right: f64,
    /// Bottom edge (exclusive).
    pub bottom: f64,
}

impl SelectionRect {
    /// Builds the rectangle spanned by two drag corners, in any direction.
    #[must_use]
    pub fn from_corners(a: PagePoint, b: PagePoint) -> Self {
        Self {
            top: a.y.min(b.y),
            left: a.x.min(b.x),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Creates a rectangle from its origin and size.
    #[must_use]
    pub fn from_origin_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::from_corners(
            PagePoint::new(left, top),
            PagePoint::new(left + width, top + height),
        )
    }

    /// Width in CSS px.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height in CSS px.
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Returns `true` if both sides are at least `min` CSS px.
    #[inline]
    #[must_use]
    pub fn meets_minimum(&self, min: f64) -> bool {
        self.width() >= min && self.height() >= min
    }
}

// ============================================================================
// Viewport / ScrollOffset
// ============================================================================

/// Visible area of the page and its backing-store scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// `window.innerWidth`.
    pub width: f64,
    /// `window.innerHeight`.
    pub height: f64,
    /// `window.devicePixelRatio`.
    pub device_pixel_ratio: f64,
}

impl Viewport {
    /// Creates a viewport, rejecting non-positive dimensions.
    ///
    /// A missing or non-positive DPR falls back to 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if width or height is not positive.
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Result<Self> {
        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(Error::invalid_argument(format!(
                "viewport must have a positive size, got {width}x{height}"
            )));
        }

        let device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };

        Ok(Self {
            width,
            height,
            device_pixel_ratio,
        })
    }

    /// Converts a CSS length to device pixels, rounding to the nearest pixel.
    #[inline]
    #[must_use]
    pub fn to_device(&self, css: f64) -> u32 {
        let px = (css * self.device_pixel_ratio).round();
        if px <= 0.0 { 0 } else { px as u32 }
    }
}

/// Page scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    /// `window.scrollX`.
    pub x: f64,
    /// `window.scrollY`.
    pub y: f64,
}

impl ScrollOffset {
    /// Creates a scroll offset.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Band Planning
// ============================================================================

/// One viewport-high slice of the selection, captured in a single shot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureBand {
    /// Zero-based band index.
    pub index: usize,
    /// First page row this band is responsible for.
    pub start_y: f64,
    /// Row after the last page row this band is responsible for.
    pub end_y: f64,
    /// Scroll target, `max(0, start_y)`.
    pub scroll_y: f64,
}

/// Number of visible-tab captures needed: `ceil(height / viewport height)`.
#[must_use]
pub fn captures_needed(rect: &SelectionRect, viewport: &Viewport) -> usize {
    if rect.height() <= 0.0 {
        return 0;
    }
    (rect.height() / viewport.height).ceil() as usize
}

/// Splits the selection into viewport-high bands, top to bottom.
///
/// Band `i` starts at `top + i × vh`; the last band is cut at `bottom`.
#[must_use]
pub fn plan_bands(rect: &SelectionRect, viewport: &Viewport) -> Vec<CaptureBand> {
    (0..captures_needed(rect, viewport))
        .map(|index| {
            let start_y = band_edge(rect, viewport, index);
            let end_y = band_edge(rect, viewport, index + 1).min(rect.bottom);
            CaptureBand {
                index,
                start_y,
                end_y,
                scroll_y: start_y.max(0.0),
            }
        })
        .collect()
}

/// Page row where band `index` starts.
///
/// Shared by neighbouring bands so one band's end is bit-identical to the
/// next band's start.
#[inline]
fn band_edge(rect: &SelectionRect, viewport: &Viewport, index: usize) -> f64 {
    rect.top + index as f64 * viewport.height
}

// ============================================================================
// Device Rectangles
// ============================================================================

/// Rectangle in device (backing-store) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl DeviceRect {
    /// Row after the last row.
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// One source-to-destination copy performed by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitOp {
    /// Band the source bitmap belongs to.
    pub band: usize,
    /// Region of the captured bitmap.
    pub source: DeviceRect,
    /// Region of the output canvas.
    pub dest: DeviceRect,
}

/// Output canvas size in device pixels.
#[must_use]
pub fn canvas_size(rect: &SelectionRect, viewport: &Viewport) -> (u32, u32) {
    (viewport.to_device(rect.width()), viewport.to_device(rect.height()))
}

/// Computes the copy for a band captured at `actual` scroll.
///
/// The copied rows are the intersection of the selection, the band's own
/// range and the viewport actually shown at capture time. Browsers clamp
/// scroll at the document end, so the last viewport can overlap the previous
/// band; clipping to the band keeps destination ranges disjoint. Device rows
/// are derived from rounded edges so neighbouring bands meet exactly.
///
/// Returns `None` when the intersection is empty.
#[must_use]
pub fn blit_for_band(
    rect: &SelectionRect,
    band: &CaptureBand,
    actual: ScrollOffset,
    viewport: &Viewport,
) -> Option<BlitOp> {
    let top = rect.top.max(band.start_y).max(actual.y);
    let bottom = rect
        .bottom
        .min(band.end_y)
        .min(actual.y + viewport.height);

    if top >= bottom {
        return None;
    }

    let dest_y = viewport.to_device(top - rect.top);
    let dest_bottom = viewport.to_device(bottom - rect.top);
    let height = dest_bottom.saturating_sub(dest_y);
    let width = viewport.to_device(rect.width());

    if height == 0 || width == 0 {
        return None;
    }

    Some(BlitOp {
        band: band.index,
        source: DeviceRect {
            x: viewport.to_device(rect.left - actual.x),
            y: viewport.to_device(top - actual.y),
            width,
            height,
        },
        dest: DeviceRect {
            x: 0,
            y: dest_y,
            width,
            height,
        },
    })
}

// ============================================================================
// Tests
// ============================================================================
