//! Drag-to-select state machine.
//!
//! The selector is fed [`SelectorInput`] values decoded from overlay events
//! and answers each one with a [`SelectorStep`] telling the session what to
//! draw or whether the selection is over. It never touches the page itself.
//!
//! ```
//! use web_clipper::clip::{RegionSelector, SelectorInput, SelectorStep};
//! use web_clipper::protocol::PointerSample;
//!
//! let mut selector = RegionSelector::new(10.0);
//! let at = |x, y| PointerSample { page_x: x, page_y: y, ..Default::default() };
//!
//! selector.handle(SelectorInput::PointerDown(at(10.0, 10.0)));
//! selector.handle(SelectorInput::PointerMove(at(110.0, 60.0)));
//!
//! match selector.handle(SelectorInput::PointerUp(at(110.0, 60.0))) {
//!     SelectorStep::Finished(rect) => assert_eq!(rect.width(), 100.0),
//!     other => panic!("unexpected step: {other:?}"),
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, trace};

use crate::protocol::PointerSample;

use super::geometry::{PagePoint, SelectionRect};

// ============================================================================
// Constants
// ============================================================================

/// Size label offset to the right of the pointer.
const LABEL_OFFSET_X: f64 = 15.0;

/// Size label offset above the pointer.
const LABEL_OFFSET_Y: f64 = 30.0;

// ============================================================================
// SelectorInput
// ============================================================================

/// Input understood by the selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectorInput {
    /// Pointer pressed on the overlay.
    PointerDown(PointerSample),
    /// Pointer moved.
    PointerMove(PointerSample),
    /// Pointer released.
    PointerUp(PointerSample),
    /// Escape pressed.
    Escape,
}

// ============================================================================
// SelectionFeedback
// ============================================================================

/// What the overlay should draw for the current drag.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionFeedback {
    /// Selection box in page coordinates.
    pub rect: SelectionRect,
    /// `"{w} × {h}"` size label.
    pub label: String,
    /// Label x in viewport coordinates.
    pub label_x: f64,
    /// Label y in viewport coordinates.
    pub label_y: f64,
}

impl SelectionFeedback {
    fn new(rect: SelectionRect, pointer: &PointerSample) -> Self {
        Self {
            label: format!("{} × {}", rect.width().round(), rect.height().round()),
            label_x: pointer.page_x - pointer.scroll_x + LABEL_OFFSET_X,
            label_y: pointer.page_y - pointer.scroll_y - LABEL_OFFSET_Y,
            rect,
        }
    }
}

// ============================================================================
// SelectorStep
// ============================================================================

/// Selector reaction to one input.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorStep {
    /// Nothing to do.
    Ignored,
    /// Drag started; show the box.
    Started(SelectionFeedback),
    /// Drag continued; redraw the box.
    Moved(SelectionFeedback),
    /// Selection accepted.
    Finished(SelectionRect),
    /// Released below the minimum size; treated as an accidental click.
    Discarded {
        /// Final width.
        width: f64,
        /// Final height.
        height: f64,
    },
    /// Escape pressed.
    Cancelled,
}

impl SelectorStep {
    /// Returns `true` if the selection is over.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished(_) | Self::Discarded { .. } | Self::Cancelled
        )
    }
}

// ============================================================================
// RegionSelector
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Dragging { anchor: PagePoint, current: PagePoint },
    Done,
}

/// Tracks one drag from pointer-down to pointer-up in page coordinates.
#[derive(Debug, Clone)]
pub struct RegionSelector {
    state: State,
    min_size: f64,
}

impl RegionSelector {
    /// Creates a selector that discards selections smaller than `min_size`
    /// in either dimension.
    #[must_use]
    pub fn new(min_size: f64) -> Self {
        Self {
            state: State::Idle,
            min_size,
        }
    }

    /// Returns `true` once a terminal step has been produced.
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Returns `true` while the pointer is held down.
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, State::Dragging { .. })
    }

    /// Feeds one input.
    pub fn handle(&mut self, input: SelectorInput) -> SelectorStep {
        match (self.state, input) {
            (State::Done, _) => SelectorStep::Ignored,

            (_, SelectorInput::Escape) => {
                debug!("Selection cancelled");
                self.state = State::Done;
                SelectorStep::Cancelled
            }

            (_, SelectorInput::PointerDown(sample)) => {
                let point = page_point(&sample);
                trace!(x = point.x, y = point.y, "Selection anchored");
                self.state = State::Dragging {
                    anchor: point,
                    current: point,
                };
                SelectorStep::Started(SelectionFeedback::new(
                    SelectionRect::from_corners(point, point),
                    &sample,
                ))
            }

            (State::Dragging { anchor, .. }, SelectorInput::PointerMove(sample)) => {
                let current = page_point(&sample);
                self.state = State::Dragging { anchor, current };
                SelectorStep::Moved(SelectionFeedback::new(
                    SelectionRect::from_corners(anchor, current),
                    &sample,
                ))
            }

            (State::Dragging { anchor, .. }, SelectorInput::PointerUp(sample)) => {
                self.state = State::Done;
                let rect = SelectionRect::from_corners(anchor, page_point(&sample));

                if rect.meets_minimum(self.min_size) {
                    debug!(
                        top = rect.top,
                        left = rect.left,
                        width = rect.width(),
                        height = rect.height(),
                        "Selection finished"
                    );
                    SelectorStep::Finished(rect)
                } else {
                    debug!(
                        width = rect.width(),
                        height = rect.height(),
                        "Selection below minimum size, discarding"
                    );
                    SelectorStep::Discarded {
                        width: rect.width(),
                        height: rect.height(),
                    }
                }
            }

            (State::Idle, SelectorInput::PointerMove(_) | SelectorInput::PointerUp(_)) => {
                SelectorStep::Ignored
            }
        }
    }
}

#[inline]
fn page_point(sample: &PointerSample) -> PagePoint {
    PagePoint::new(sample.page_x, sample.page_y)
}

// ============================================================================
// Tests
// ============================================================================
