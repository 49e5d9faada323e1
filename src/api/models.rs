//! Backend record types as they appear on the wire.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identifiers::{CategoryId, SnippetId};

// ============================================================================
// Constants
// ============================================================================

/// Color given to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

/// Icon given to categories created without one.
pub const DEFAULT_CATEGORY_ICON: &str = "📁";

// ============================================================================
// SnippetKind
// ============================================================================

/// Content type tag of a snippet.
///
/// Unknown server values are kept verbatim in [`SnippetKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SnippetKind {
    /// Plain text.
    #[default]
    Text,
    /// Selected HTML fragment.
    Html,
    /// Page bookmark.
    Link,
    /// Image or screenshot.
    Image,
    /// Anything else the server returned.
    Other(String),
}

impl SnippetKind {
    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
            Self::Link => "link",
            Self::Image => "image",
            Self::Other(other) => other,
        }
    }

    /// Returns `true` for kinds counted as text on the dashboard.
    #[inline]
    #[must_use]
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Html)
    }
}

impl From<&str> for SnippetKind {
    fn from(value: &str) -> Self {
        match value {
            "text" => Self::Text,
            "html" => Self::Html,
            "link" => Self::Link,
            "image" => Self::Image,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SnippetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SnippetKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SnippetKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from(value.as_str()))
    }
}

// ============================================================================
// Snippet
// ============================================================================

/// A saved clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Record ID.
    #[serde(rename = "_id")]
    pub id: SnippetId,

    /// Stored text or HTML.
    pub content: String,

    /// Page the clip came from.
    #[serde(rename = "sourceUrl", default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Content type.
    #[serde(rename = "type", default)]
    pub kind: SnippetKind,

    /// Assigned category, if any.
    #[serde(rename = "categoryId", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,

    /// Creation time as sent by the server (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

// ============================================================================
// Category
// ============================================================================

/// A user-defined snippet category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Record ID.
    #[serde(rename = "_id")]
    pub id: CategoryId,

    /// Display name.
    pub name: String,

    /// CSS color.
    #[serde(default = "default_color")]
    pub color: String,

    /// Emoji icon.
    #[serde(default = "default_icon")]
    pub icon: String,
}

/// Body for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCategory {
    /// Display name.
    pub name: String,
    /// CSS color.
    pub color: String,
    /// Emoji icon.
    pub icon: String,
}

impl NewCategory {
    /// Creates a category body with the default color and icon.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: default_color(),
            icon: default_icon(),
        }
    }

    /// Sets the color.
    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Sets the icon.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

fn default_icon() -> String {
    DEFAULT_CATEGORY_ICON.to_string()
}

// ============================================================================
// Requests / Responses
// ============================================================================

/// Body of `POST /api/save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePayload {
    /// Text or HTML to store.
    pub content: String,

    /// Page the clip came from.
    #[serde(rename = "sourceUrl")]
    pub source_url: String,

    /// Content type.
    #[serde(rename = "type")]
    pub kind: SnippetKind,
}

impl SavePayload {
    /// Creates a payload.
    #[must_use]
    pub fn new(content: impl Into<String>, source_url: impl Into<String>, kind: SnippetKind) -> Self {
        Self {
            content: content.into(),
            source_url: source_url.into(),
            kind,
        }
    }
}

/// Body of `POST /api/login` and `POST /api/register`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Credentials<'a> {
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
}

/// Reply of `POST /api/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for later calls.
    pub token: String,
    /// Canonical user name.
    pub username: String,
}

/// Reply of `GET /api/profile`: the signed-in account, password omitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// Account record ID.
    #[serde(rename = "_id")]
    pub id: String,
    /// User name.
    pub username: String,
}

/// Body of `PATCH /api/snippets/{id}/category`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CategoryAssignment<'a> {
    #[serde(rename = "categoryId")]
    pub(crate) category_id: Option<&'a CategoryId>,
}

// ============================================================================
// SnippetStats
// ============================================================================

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnippetStats {
    /// All snippets.
    pub total: u64,
    /// `image` snippets.
    pub images: u64,
    /// `link` snippets.
    pub links: u64,
    /// `text` and `html` snippets.
    pub texts: u64,
}

impl SnippetStats {
    /// Counts snippets locally, matching what `GET /api/stats` returns.
    #[must_use]
    pub fn from_snippets<'a>(snippets: impl IntoIterator<Item = &'a Snippet>) -> Self {
        snippets
            .into_iter()
            .fold(Self::default(), |mut stats, snippet| {
                stats.total += 1;
                match &snippet.kind {
                    SnippetKind::Image => stats.images += 1,
                    SnippetKind::Link => stats.links += 1,
                    kind if kind.is_textual() => stats.texts += 1,
                    _ => {}
                }
                stats
            })
    }
}

// ============================================================================
// Tests
// ============================================================================
