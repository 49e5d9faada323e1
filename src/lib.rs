//! Web Clipper - region screenshots with scroll-stitching.
//!
//! This library is the local end of a web clipper. A browser extension
//! connects to it over a localhost WebSocket and executes page, overlay and
//! capture commands; the library drives the clip and stores the result with
//! the backend REST API.
//!
//! # Architecture
//!
//! - **Local End (Rust)**: Runs the selection state machine, plans capture
//!   bands, stitches the bitmaps and talks to the backend
//! - **Remote End (Extension)**: Scrolls the page, captures the visible tab,
//!   draws the selection overlay and forwards pointer and key events
//!
//! Key design principles:
//!
//! - The clip pipeline sees the page only through the traits in
//!   [`clip::host`], so it runs unchanged against in-memory fakes
//! - Protocol uses `module.methodName` format
//! - Every injected element is owned by one [`clip::CaptureSession`] and
//!   removed on every exit path
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use web_clipper::transport::BridgeServer;
//! use web_clipper::{ApiClient, ClipperConfig, ExtensionTab, Result, ScreenshotClipper};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClipperConfig::builder()
//!         .api_url("http://localhost:5000")
//!         .token("jwt")
//!         .build()?;
//!     let api = ApiClient::new(&config)?;
//!
//!     // Wait for the extension to attach
//!     let server = BridgeServer::bind(0).await?;
//!     let tab = ExtensionTab::accept(&server, Duration::from_secs(300), &config).await?;
//!
//!     // Let the user drag a region, then capture and save it
//!     let mut inputs = tab.selector_inputs();
//!     let outcome = ScreenshotClipper::new(&tab, &tab, &tab, &api, &config)
//!         .run(&mut inputs)
//!         .await?;
//!     println!("{outcome:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Backend REST client, models and filters |
//! | [`browser`] | [`ExtensionTab`], the tab a clip runs in |
//! | [`clip`] | Selection, capture planning, stitching and the clip flow |
//! | [`config`] | [`ClipperConfig`] and its builder |
//! | [`dataurl`] | `data:` URL parsing and encoding |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | WebSocket message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Backend REST API.
///
/// Use [`ApiClient::new`] with a [`ClipperConfig`] to create a client.
pub mod api;

/// Browser side of a clip.
pub mod browser;

/// Region screenshot pipeline.
///
/// - [`RegionSelector`](clip::RegionSelector) - Drag-to-select
/// - [`SegmentedCapturer`](clip::SegmentedCapturer) - Scroll and capture
/// - [`Compositor`](clip::Compositor) - Stitch and encode
/// - [`ScreenshotClipper`] - End-to-end flow
pub mod clip;

/// Clipper configuration.
pub mod config;

/// `data:` URLs.
pub mod dataurl;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// WebSocket protocol message types.
///
/// Internal module defining command/response/event structures.
pub mod protocol;

/// WebSocket transport layer.
///
/// Internal module handling WebSocket server and connection management.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// API types
pub use api::{ApiClient, Category, SavePayload, Snippet, SnippetFilter, SnippetKind};

// Browser types
pub use browser::ExtensionTab;

// Clip types
pub use clip::{ClipOutcome, ImageFormat, ScreenshotClipper, SelectionRect};

// Configuration
pub use config::{ClipperConfig, ClipperConfigBuilder};

// Data URLs
pub use dataurl::DataUrl;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CategoryId, ElementId, RequestId, SessionId, SnippetId, TabId};
