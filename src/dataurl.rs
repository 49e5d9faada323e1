//! `data:` URL parsing and encoding.
//!
//! Only the base64 form is supported, which is what `captureVisibleTab`
//! returns and what the backend stores inside `<img src>`.
//!
//! ```
//! use web_clipper::DataUrl;
//!
//! let url = DataUrl::new("image/png", vec![0x89, b'P', b'N', b'G']);
//! let text = url.to_string();
//! assert!(text.starts_with("data:image/png;base64,"));
//!
//! let parsed: DataUrl = text.parse().unwrap();
//! assert_eq!(parsed.mime(), "image/png");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";
const DEFAULT_MIME: &str = "text/plain";

// ============================================================================
// DataUrl
// ============================================================================

/// A decoded base64 data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime: String,
    data: Vec<u8>,
}

impl DataUrl {
    /// Wraps raw bytes with a MIME type.
    #[inline]
    #[must_use]
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            data,
        }
    }

    /// Parses a `data:<mime>;base64,<payload>` string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataUrl`] if the scheme, base64 marker or payload
    /// is missing or malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .trim()
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::data_url("missing data: scheme"))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::data_url("missing ',' separator"))?;

        let mime = header
            .strip_suffix(BASE64_MARKER)
            .ok_or_else(|| Error::data_url("only base64 data URLs are supported"))?;
        let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };

        if payload.is_empty() {
            return Err(Error::data_url("empty payload"));
        }

        let data = Base64Standard
            .decode(payload)
            .map_err(|e| Error::data_url(format!("bad base64 payload: {e}")))?;

        Ok(Self::new(mime, data))
    }

    /// Encodes bytes directly into data URL text.
    #[must_use]
    pub fn encode(mime: &str, data: &[u8]) -> String {
        format!("{SCHEME}{mime}{BASE64_MARKER},{}", Base64Standard.encode(data))
    }

    /// Returns the MIME type.
    #[inline]
    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Returns the decoded bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the URL and returns the decoded bytes.
    #[inline]
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns `true` if the MIME type is an image type.
    #[inline]
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

impl FromStr for DataUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(&self.mime, &self.data))
    }
}

// ============================================================================
// Tests
// ============================================================================
