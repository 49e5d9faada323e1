//! Error types for the web clipper.
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`].
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::InvalidArgument`], [`Error::Protocol`], [`Error::RequestTimeout`] |
//! | Capture | [`Error::Capture`], [`Error::EmptyCapture`], [`Error::InvalidSelection`], [`Error::DataUrl`] |
//! | Backend | [`Error::Save`], [`Error::Api`], [`Error::Unauthorized`], [`Error::NotAuthenticated`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Image`], [`Error::Http`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when [`ClipperConfig`](crate::ClipperConfig) validation fails.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Extension did not connect (or did not send READY) in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Invalid argument in command params.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Protocol violation or error response from the extension.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Capture Errors
    // ========================================================================
    /// Visible-tab capture of one segment failed.
    ///
    /// Fatal for the whole region capture; no partial image is produced.
    #[error("Capture of segment {segment} failed: {message}")]
    Capture {
        /// Zero-based segment index.
        segment: usize,
        /// Underlying failure.
        message: String,
    },

    /// Visible-tab capture returned no image data.
    #[error("Capture of segment {segment} returned no image")]
    EmptyCapture {
        /// Zero-based segment index.
        segment: usize,
    },

    /// Selection rectangle cannot be captured.
    #[error("Invalid selection: {message}")]
    InvalidSelection {
        /// Why the selection was rejected.
        message: String,
    },

    /// Malformed data URL.
    #[error("Invalid data URL: {message}")]
    DataUrl {
        /// Description of the parse failure.
        message: String,
    },

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// Save request was rejected or failed.
    #[error("Save failed: {}", .message.as_deref().unwrap_or("unknown error"))]
    Save {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Server-provided message, when available.
        message: Option<String>,
    },

    /// Non-success response from a backend endpoint.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided or generic message.
        message: String,
    },

    /// Token missing, expired or rejected (401/403).
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Server-provided message.
        message: String,
    },

    /// No token configured; the request was not sent.
    #[error("Not authenticated")]
    NotAuthenticated,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Image decode/encode error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a segment capture error.
    #[inline]
    pub fn capture(segment: usize, message: impl Into<String>) -> Self {
        Self::Capture {
            segment,
            message: message.into(),
        }
    }

    /// Creates an invalid selection error.
    #[inline]
    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::InvalidSelection {
            message: message.into(),
        }
    }

    /// Creates a data URL error.
    #[inline]
    pub fn data_url(message: impl Into<String>) -> Self {
        Self::DataUrl {
            message: message.into(),
        }
    }

    /// Creates a save error.
    #[inline]
    pub fn save(status: Option<u16>, message: Option<String>) -> Self {
        Self::Save { status, message }
    }

    /// Creates an API error.
    #[inline]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates an unauthorized error.
    #[inline]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error came from the capture stage.
    #[inline]
    #[must_use]
    pub fn is_capture_error(&self) -> bool {
        matches!(
            self,
            Self::Capture { .. } | Self::EmptyCapture { .. } | Self::DataUrl { .. }
        )
    }

    /// Returns `true` if the backend rejected or lacked credentials.
    #[inline]
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::NotAuthenticated)
    }
}

// ============================================================================
// User-Facing Messages
// ============================================================================

impl Error {
    /// Text shown in the inline failure indicator.
    #[must_use]
    pub fn indicator_message(&self) -> String {
        match self {
            Self::Capture { .. } | Self::EmptyCapture { .. } | Self::DataUrl { .. } => {
                "Screenshot could not be captured!".to_string()
            }
            Self::NotAuthenticated => "No session found!".to_string(),
            Self::Save {
                message: Some(message),
                ..
            } => format!("Save failed: {message}"),
            Self::Save { message: None, .. } => "Save failed: Unknown error".to_string(),
            Self::Unauthorized { message } => format!("Save failed: {message}"),
            Self::Http(_) => "Connection error!".to_string(),
            err if err.is_connection_error() || err.is_timeout() => {
                "Connection error!".to_string()
            }
            other => format!("Something went wrong: {other}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
