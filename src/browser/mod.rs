//! Browser side of a clip.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ExtensionTab`] | Tab the clip runs in, driven over the extension bridge |
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use web_clipper::transport::BridgeServer;
//! use web_clipper::{ClipperConfig, ExtensionTab, Result};
//!
//! # async fn example() -> Result<()> {
//! let config = ClipperConfig::builder().build()?;
//! let server = BridgeServer::bind(0).await?;
//! println!("extension should connect to {}", server.ws_url());
//!
//! let tab = ExtensionTab::accept(&server, Duration::from_secs(300), &config).await?;
//! let payload = tab.scrape().await?;
//! println!("{} ({})", payload.source_url, payload.kind);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Extension-backed tab.
pub mod tab;

// ============================================================================
// Re-exports
// ============================================================================

pub use tab::ExtensionTab;
