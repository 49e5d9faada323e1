//! WebSocket transport layer.
//!
//! This module handles communication between local end (Rust) and
//! remote end (extension) via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Clipper (Rust) │                              │  Extension      │
//! │                 │         WebSocket            │  (Background)   │
//! │  BridgeServer   │◄────────────────────────────►│                 │
//! │  → Connection   │      localhost:PORT          │  WebSocket      │
//! │                 │                              │  Client         │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `BridgeServer::bind` - Bind once on `127.0.0.1`
//! 2. Hand the WebSocket URL to the extension
//! 3. `BridgeServer::next_session` - Wait for the next clip's READY
//! 4. `Connection` - Send commands, receive responses/events
//! 5. `Connection::shutdown` - Close the session; go back to step 3
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `server` | Loopback listener handing out one session per clip |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// WebSocket server the extension connects to.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, EventHandler, ReadyData};
pub use server::BridgeServer;
