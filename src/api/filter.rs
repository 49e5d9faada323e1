//! Dashboard search and filtering over fetched snippets.
//!
//! A snippet is shown when it matches the search text, the kind filter and
//! the category filter.

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::CategoryId;

use super::models::{Snippet, SnippetKind};

// ============================================================================
// Filter Types
// ============================================================================

/// Content type filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KindFilter {
    /// Any type.
    #[default]
    All,
    /// Exactly this type.
    Only(SnippetKind),
}

/// Category filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Any category, including none.
    #[default]
    All,
    /// Snippets without a category.
    Uncategorized,
    /// Snippets in this category.
    Category(CategoryId),
}

// ============================================================================
// SnippetFilter
// ============================================================================

/// Combined dashboard filter.
///
/// ```
/// use web_clipper::api::{KindFilter, SnippetFilter, SnippetKind};
///
/// let filter = SnippetFilter::new()
///     .search("Rust")
///     .kind(KindFilter::Only(SnippetKind::Link));
/// assert!(!filter.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SnippetFilter {
    /// Lowercased search text.
    search: String,
    kind: KindFilter,
    category: CategoryFilter,
}

impl SnippetFilter {
    /// Creates a filter that matches everything.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search text, matched as typed apart from case.
    ///
    /// Whitespace is significant: `"rust "` only matches where a space
    /// follows the word.
    #[must_use]
    pub fn search(mut self, text: impl AsRef<str>) -> Self {
        self.search = text.as_ref().to_lowercase();
        self
    }

    /// Sets the kind filter.
    #[must_use]
    pub fn kind(mut self, kind: KindFilter) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the category filter.
    #[must_use]
    pub fn category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    /// Returns `true` if the filter matches everything.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.kind == KindFilter::All
            && self.category == CategoryFilter::All
    }

    /// Returns `true` if `snippet` passes every criterion.
    #[must_use]
    pub fn matches(&self, snippet: &Snippet) -> bool {
        self.matches_search(snippet) && self.matches_kind(snippet) && self.matches_category(snippet)
    }

    /// Returns the matching snippets, in input order.
    #[must_use]
    pub fn apply<'a>(&self, snippets: &'a [Snippet]) -> Vec<&'a Snippet> {
        snippets.iter().filter(|s| self.matches(s)).collect()
    }

    fn matches_search(&self, snippet: &Snippet) -> bool {
        if self.search.is_empty() {
            return true;
        }

        snippet.content.to_lowercase().contains(&self.search)
            || snippet
                .source_url
                .as_deref()
                .is_some_and(|url| url.to_lowercase().contains(&self.search))
    }

    fn matches_kind(&self, snippet: &Snippet) -> bool {
        match &self.kind {
            KindFilter::All => true,
            KindFilter::Only(kind) => &snippet.kind == kind,
        }
    }

    fn matches_category(&self, snippet: &Snippet) -> bool {
        match &self.category {
            CategoryFilter::All => true,
            CategoryFilter::Uncategorized => snippet.category_id.is_none(),
            CategoryFilter::Category(id) => snippet.category_id.as_ref() == Some(id),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::SnippetId;

    fn snippet(
        id: &str,
        content: &str,
        url: Option<&str>,
        kind: SnippetKind,
        category: Option<&str>,
    ) -> Snippet {
        Snippet {
            id: SnippetId::new(id),
            content: content.to_string(),
            source_url: url.map(str::to_string),
            kind,
            category_id: category.map(CategoryId::new),
            timestamp: None,
        }
    }

    fn fixtures() -> Vec<Snippet> {
        vec![
            snippet("1", "Ownership in Rust", Some("https://doc.rust-lang.org/book"), SnippetKind::Html, Some("c1")),
            snippet("2", "<img src=\"data:image/png;base64,AA\" />", Some("https://example.com/gallery"), SnippetKind::Image, None),
            snippet("3", "Weekend reading", Some("https://blog.example.org/RUST-tips"), SnippetKind::Link, Some("c2")),
            snippet("4", "plain note", None, SnippetKind::Text, None),
        ]
    }

    fn ids(found: &[&Snippet]) -> Vec<String> {
        found.iter().map(|s| s.id.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let snippets = fixtures();
        let filter = SnippetFilter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&snippets).len(), 4);
    }

    #[test]
    fn test_search_is_case_insensitive_over_content_and_url() {
        let snippets = fixtures();
        let found = SnippetFilter::new().search("RuSt").apply(&snippets);
        assert_eq!(ids(&found), vec!["1", "3"]);
    }

    #[test]
    fn test_search_keeps_surrounding_spaces() {
        let snippets = fixtures();

        let found = SnippetFilter::new().search(" rust").apply(&snippets);
        assert_eq!(ids(&found), vec!["1"]);

        let blank = SnippetFilter::new().search("  ");
        assert!(!blank.is_empty());
        assert!(blank.apply(&snippets).is_empty());
    }

    #[test]
    fn test_kind_filter() {
        let snippets = fixtures();
        let found = SnippetFilter::new()
            .kind(KindFilter::Only(SnippetKind::Image))
            .apply(&snippets);
        assert_eq!(ids(&found), vec!["2"]);
    }

    #[test]
    fn test_category_filters() {
        let snippets = fixtures();

        let uncategorized = SnippetFilter::new()
            .category(CategoryFilter::Uncategorized)
            .apply(&snippets);
        assert_eq!(ids(&uncategorized), vec!["2", "4"]);

        let in_c2 = SnippetFilter::new()
            .category(CategoryFilter::Category(CategoryId::new("c2")))
            .apply(&snippets);
        assert_eq!(ids(&in_c2), vec!["3"]);
    }

    #[test]
    fn test_all_criteria_must_match() {
        let snippets = fixtures();
        let found = SnippetFilter::new()
            .search("rust")
            .kind(KindFilter::Only(SnippetKind::Link))
            .category(CategoryFilter::Category(CategoryId::new("c1")))
            .apply(&snippets);
        assert!(found.is_empty());
    }
}
