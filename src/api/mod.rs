//! Backend REST API: client, record models and dashboard filtering.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ApiClient`] | Authenticated HTTP calls (`reqwest`) |
//! | [`Snippet`], [`Category`] | Records returned by the server |
//! | [`SavePayload`] | Body of `POST /api/save` |
//! | [`SnippetFilter`] | Client-side search, kind and category filters |
//! | [`SnippetStats`] | Dashboard counters |

// ============================================================================
// Submodules
// ============================================================================

/// HTTP client.
pub mod client;

/// Search and filtering.
pub mod filter;

/// Wire models.
pub mod models;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::ApiClient;
pub use filter::{CategoryFilter, KindFilter, SnippetFilter};
pub use models::{
    Category, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON, LoginResponse, NewCategory,
    Profile, SavePayload, Snippet, SnippetKind, SnippetStats,
};
