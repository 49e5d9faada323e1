//! Clipper configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use web_clipper::ClipperConfig;
//!
//! # fn example() -> web_clipper::Result<()> {
//! let config = ClipperConfig::builder()
//!     .api_url("https://clipper.example.com")
//!     .token("eyJhbGciOi...")
//!     .settle_delay(Duration::from_millis(250))
//!     .build()?;
//!
//! assert_eq!(config.api_url().as_str(), "https://clipper.example.com/");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::clip::ImageFormat;
use crate::error::{Error, Result};

// ============================================================================
// Defaults
// ============================================================================

/// Backend used when no API URL is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Wait between scrolling and capturing, for the page to repaint.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Per-request timeout for bridge commands and HTTP calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Selections narrower or shorter than this (CSS px) are discarded.
pub const DEFAULT_MIN_SELECTION: f64 = 10.0;

/// How long the success indicator stays up before teardown.
pub const DEFAULT_SUCCESS_LINGER: Duration = Duration::from_millis(1500);

/// How long the failure indicator stays up before teardown.
pub const DEFAULT_ERROR_LINGER: Duration = Duration::from_millis(2000);

// ============================================================================
// ClipperConfig
// ============================================================================

/// Validated clipper settings.
///
/// Use [`ClipperConfig::builder()`] to create one.
#[derive(Debug, Clone)]
pub struct ClipperConfig {
    api_url: Url,
    token: Option<String>,
    settle_delay: Duration,
    request_timeout: Duration,
    min_selection: f64,
    image_format: ImageFormat,
    success_linger: Duration,
    error_linger: Duration,
}

impl ClipperConfig {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClipperConfigBuilder {
        ClipperConfigBuilder::new()
    }

    /// Backend base URL, always ending in `/`.
    #[inline]
    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Bearer token passed through to the backend.
    #[inline]
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Delay between scroll and capture.
    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Per-request timeout.
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Minimum selection width/height in CSS pixels.
    #[inline]
    #[must_use]
    pub fn min_selection(&self) -> f64 {
        self.min_selection
    }

    /// Output image format.
    #[inline]
    #[must_use]
    pub fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    /// Linger time of the success indicator.
    #[inline]
    #[must_use]
    pub fn success_linger(&self) -> Duration {
        self.success_linger
    }

    /// Linger time of the failure indicator.
    #[inline]
    #[must_use]
    pub fn error_linger(&self) -> Duration {
        self.error_linger
    }
}

// ============================================================================
// ClipperConfigBuilder
// ============================================================================

/// Builder for [`ClipperConfig`].
#[derive(Debug, Default, Clone)]
pub struct ClipperConfigBuilder {
    api_url: Option<String>,
    token: Option<String>,
    settle_delay: Option<Duration>,
    request_timeout: Option<Duration>,
    min_selection: Option<f64>,
    image_format: Option<ImageFormat>,
    success_linger: Option<Duration>,
    error_linger: Option<Duration>,
}

impl ClipperConfigBuilder {
    /// Creates a builder with every setting at its default.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend base URL.
    #[inline]
    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the bearer token.
    #[inline]
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the scroll settle delay.
    #[inline]
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    /// Sets the per-request timeout.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the minimum selection size in CSS pixels.
    #[inline]
    #[must_use]
    pub fn min_selection(mut self, px: f64) -> Self {
        self.min_selection = Some(px);
        self
    }

    /// Sets the output image format.
    #[inline]
    #[must_use]
    pub fn image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = Some(format);
        self
    }

    /// Sets how long the success and failure indicators linger.
    #[inline]
    #[must_use]
    pub fn indicator_linger(mut self, success: Duration, error: Duration) -> Self {
        self.success_linger = Some(success);
        self.error_linger = Some(error);
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the API URL is not an absolute http(s) URL
    /// - [`Error::Config`] if the request timeout is zero
    /// - [`Error::Config`] if the minimum selection is negative or not finite
    pub fn build(self) -> Result<ClipperConfig> {
        let api_url = Self::validate_api_url(self.api_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if request_timeout.is_zero() {
            return Err(Error::config("request timeout must be greater than zero"));
        }

        let min_selection = self.min_selection.unwrap_or(DEFAULT_MIN_SELECTION);
        if !min_selection.is_finite() || min_selection < 0.0 {
            return Err(Error::config(format!(
                "minimum selection must be a non-negative number, got {min_selection}"
            )));
        }

        let token = self.token.filter(|t| !t.trim().is_empty());

        Ok(ClipperConfig {
            api_url,
            token,
            settle_delay: self.settle_delay.unwrap_or(DEFAULT_SETTLE_DELAY),
            request_timeout,
            min_selection,
            image_format: self.image_format.unwrap_or_default(),
            success_linger: self.success_linger.unwrap_or(DEFAULT_SUCCESS_LINGER),
            error_linger: self.error_linger.unwrap_or(DEFAULT_ERROR_LINGER),
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClipperConfigBuilder {
    /// Parses the API URL and normalizes it to end with `/`.
    ///
    /// Endpoints are joined relative to this base, so a deployment under a
    /// path prefix keeps its prefix.
    fn validate_api_url(raw: &str) -> Result<Url> {
        let mut url = Url::parse(raw.trim())
            .map_err(|e| Error::config(format!("invalid API URL '{raw}': {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "API URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClipperConfig::builder().build().expect("defaults are valid");
        assert_eq!(config.api_url().as_str(), "http://localhost:3000/");
        assert_eq!(config.settle_delay(), Duration::from_millis(200));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.min_selection(), 10.0);
        assert_eq!(config.image_format(), ImageFormat::Png);
        assert!(config.token().is_none());
    }

    #[test]
    fn test_api_url_keeps_path_prefix() {
        let config = ClipperConfig::builder()
            .api_url("https://example.com/clipper")
            .build()
            .expect("valid");
        assert_eq!(config.api_url().as_str(), "https://example.com/clipper/");
        let joined = config.api_url().join("api/save").expect("join");
        assert_eq!(joined.as_str(), "https://example.com/clipper/api/save");
    }

    #[test]
    fn test_rejects_bad_api_url() {
        assert!(matches!(
            ClipperConfig::builder().api_url("not a url").build(),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            ClipperConfig::builder().api_url("ftp://example.com").build(),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = ClipperConfig::builder()
            .request_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_negative_min_selection() {
        assert!(ClipperConfig::builder().min_selection(-1.0).build().is_err());
        assert!(ClipperConfig::builder().min_selection(f64::NAN).build().is_err());
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let config = ClipperConfig::builder().token("   ").build().expect("valid");
        assert!(config.token().is_none());

        let config = ClipperConfig::builder().token("abc").build().expect("valid");
        assert_eq!(config.token(), Some("abc"));
    }
}
