//! Event message types.
//!
//! Events are notifications sent from the remote end (extension) to the
//! local end (Rust) when the user interacts with the injected overlay.
//!
//! # Event Types
//!
//! | Module | Events |
//! |--------|--------|
//! | `overlay` | `pointerDown`, `pointerMove`, `pointerUp`, `keyDown` |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::RequestId;

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
///
/// # Format
///
/// ```json
/// {
///   "id": "event-uuid",
///   "type": "event",
///   "method": "module.eventName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: RequestId,

    /// Event type marker (always "event").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event name in `module.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

impl Event {
    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        match self.method.as_str() {
            "overlay.pointerDown" => ParsedEvent::PointerDown(self.pointer()),
            "overlay.pointerMove" => ParsedEvent::PointerMove(self.pointer()),
            "overlay.pointerUp" => ParsedEvent::PointerUp(self.pointer()),
            "overlay.keyDown" => ParsedEvent::KeyDown {
                key: self
                    .params
                    .get("key")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            },
            _ => ParsedEvent::Unknown {
                method: self.method.clone(),
                params: self.params.clone(),
            },
        }
    }

    /// Reads pointer coordinates from params.
    fn pointer(&self) -> PointerSample {
        PointerSample {
            page_x: self.get_f64("pageX"),
            page_y: self.get_f64("pageY"),
            scroll_x: self.get_f64("scrollX"),
            scroll_y: self.get_f64("scrollY"),
        }
    }

    /// Gets an f64 from params, 0 when absent.
    #[inline]
    fn get_f64(&self, key: &str) -> f64 {
        self.params
            .get(key)
            .and_then(|v| v.as_f64())
            .unwrap_or_default()
    }
}

// ============================================================================
// PointerSample
// ============================================================================

/// Pointer position reported with an overlay pointer event.
///
/// `page_x`/`page_y` already include the scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    /// Page x (CSS px).
    pub page_x: f64,
    /// Page y (CSS px).
    pub page_y: f64,
    /// `window.scrollX` at the time of the event.
    pub scroll_x: f64,
    /// `window.scrollY` at the time of the event.
    pub scroll_y: f64,
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone)]
pub enum ParsedEvent {
    /// Pointer pressed on the overlay.
    PointerDown(PointerSample),
    /// Pointer moved anywhere in the document.
    PointerMove(PointerSample),
    /// Pointer released anywhere in the document.
    PointerUp(PointerSample),
    /// Key pressed while the overlay is mounted.
    KeyDown {
        /// `KeyboardEvent.key`.
        key: String,
    },
    /// Unknown event type.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

// ============================================================================
// Tests
// ============================================================================
