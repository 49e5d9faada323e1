//! Text and bookmark clips, and the HTML fragments stored for images.

// ============================================================================
// Imports
// ============================================================================

use crate::api::{SavePayload, SnippetKind};

// ============================================================================
// Scraped
// ============================================================================

/// What a one-click save captures from the page.
///
/// Decided once: a non-empty text selection wins, otherwise the page is
/// saved as a bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scraped {
    /// HTML of the selected range.
    Selection(String),
    /// Page title.
    Bookmark(String),
}

impl Scraped {
    /// Chooses between selection and bookmark mode.
    ///
    /// Whitespace-only selections count as no selection.
    #[must_use]
    pub fn choose(selection_html: Option<String>, title: impl Into<String>) -> Self {
        match selection_html {
            Some(html) if !html.trim().is_empty() => Self::Selection(html),
            _ => Self::Bookmark(title.into()),
        }
    }

    /// Snippet kind saved for this clip.
    #[must_use]
    pub fn kind(&self) -> SnippetKind {
        match self {
            Self::Selection(_) => SnippetKind::Html,
            Self::Bookmark(_) => SnippetKind::Link,
        }
    }

    /// Stored content.
    ///
    /// Selections are stored as-is. Bookmarks become a small card around the
    /// escaped page title.
    #[must_use]
    pub fn content(&self) -> String {
        match self {
            Self::Selection(html) => html.clone(),
            Self::Bookmark(title) => format!(
                "<div style=\"display:flex; align-items:center; gap:10px;\">\
                 <span style=\"font-size:24px;\">🔗</span>\
                 <span style=\"font-weight:bold; font-size:16px;\">{}</span>\
                 </div>\
                 <p style=\"color:#666; font-size:12px; margin-top:5px;\">Saved as a page bookmark.</p>",
                html_escape(title)
            ),
        }
    }

    /// Builds the save body.
    #[must_use]
    pub fn into_payload(self, source_url: impl Into<String>) -> SavePayload {
        SavePayload::new(self.content(), source_url, self.kind())
    }
}

// ============================================================================
// Image Fragments
// ============================================================================

/// `<img>` fragment stored for screenshots and saved images.
#[must_use]
pub fn image_fragment(src: &str) -> String {
    format!(
        "<img src=\"{}\" style=\"max-width: 100%; border-radius: 8px;\" />",
        html_escape(src)
    )
}

/// Save body for an image on `page_url`, referenced by its `src`.
#[must_use]
pub fn image_clip_payload(src: &str, page_url: impl Into<String>) -> SavePayload {
    SavePayload::new(image_fragment(src), page_url, SnippetKind::Image)
}

/// Escapes text for an HTML attribute or element body.
#[must_use]
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_wins() {
        let scraped = Scraped::choose(Some("<p>quote</p>".into()), "Title");
        assert_eq!(scraped, Scraped::Selection("<p>quote</p>".into()));
        assert_eq!(scraped.kind(), SnippetKind::Html);
        assert_eq!(scraped.content(), "<p>quote</p>");
    }

    #[test]
    fn test_blank_selection_is_bookmark() {
        let scraped = Scraped::choose(Some("  \n".into()), "Title");
        assert_eq!(scraped.kind(), SnippetKind::Link);

        let scraped = Scraped::choose(None, "Title");
        assert_eq!(scraped, Scraped::Bookmark("Title".into()));
    }

    #[test]
    fn test_bookmark_title_is_escaped() {
        let payload = Scraped::choose(None, "<script>alert(1)</script> & co").into_payload("https://example.com");
        assert_eq!(payload.kind, SnippetKind::Link);
        assert!(payload.content.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; co"));
        assert!(!payload.content.contains("<script>"));
        assert_eq!(payload.source_url, "https://example.com");
    }

    #[test]
    fn test_image_fragment() {
        assert_eq!(
            image_fragment("data:image/png;base64,AAAA"),
            "<img src=\"data:image/png;base64,AAAA\" style=\"max-width: 100%; border-radius: 8px;\" />"
        );
    }

    #[test]
    fn test_image_clip_payload_escapes_src() {
        let payload = image_clip_payload("https://cdn.example.com/a.png?x=1&y=\"2\"", "https://example.com/page");
        assert_eq!(payload.kind, SnippetKind::Image);
        assert!(payload.content.contains("x=1&amp;y=&quot;2&quot;"));
        assert_eq!(payload.source_url, "https://example.com/page");
    }
}
