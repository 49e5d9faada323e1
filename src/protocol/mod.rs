//! WebSocket protocol message types.
//!
//! This module defines the message format for communication between
//! local end (Rust) and remote end (extension).
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command request |
//! | `Response` | Remote → Local | Command response |
//! | `Event` | Remote → Local | Overlay input notification |
//!
//! # Command Naming
//!
//! Commands follow `module.methodName` format:
//!
//! - `tab.captureVisible`
//! - `page.scrollTo`
//! - `overlay.drawSelection`

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by module.
pub mod command;

/// Event message types.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, Cursor, IndicatorTone, OverlayCommand, PageCommand, TabCommand};
pub use event::{Event, ParsedEvent, PointerSample};
pub use request::{Request, Response, ResponseType};
