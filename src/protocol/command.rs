//! Command definitions organized by module.
//!
//! Commands follow `module.methodName` format.
//!
//! # Command Modules
//!
//! | Module | Commands |
//! |--------|----------|
//! | `tab` | Visible-tab capture (background script) |
//! | `page` | Scroll, metrics, scrape (content script) |
//! | `overlay` | Injected selection UI (content script) |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::ElementId;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// Tab module commands.
    Tab(TabCommand),
    /// Page module commands.
    Page(PageCommand),
    /// Overlay module commands.
    Overlay(OverlayCommand),
}

impl Command {
    /// Returns the `module.methodName` this command serializes to.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Tab(TabCommand::CaptureVisible { .. }) => "tab.captureVisible",
            Self::Page(PageCommand::ScrollTo { .. }) => "page.scrollTo",
            Self::Page(PageCommand::GetMetrics) => "page.getMetrics",
            Self::Page(PageCommand::Scrape) => "page.scrape",
            Self::Overlay(OverlayCommand::Mount { .. }) => "overlay.mount",
            Self::Overlay(OverlayCommand::SetVisible { .. }) => "overlay.setVisible",
            Self::Overlay(OverlayCommand::DrawSelection { .. }) => "overlay.drawSelection",
            Self::Overlay(OverlayCommand::ShowIndicator { .. }) => "overlay.showIndicator",
            Self::Overlay(OverlayCommand::Remove { .. }) => "overlay.remove",
            Self::Overlay(OverlayCommand::SetCursor { .. }) => "overlay.setCursor",
        }
    }
}

// ============================================================================
// Tab Commands
// ============================================================================

/// Tab module commands, executed by the extension's background script.
///
/// Content scripts cannot capture the tab themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum TabCommand {
    /// Capture the visible part of the tab as a data URL.
    #[serde(rename = "tab.captureVisible")]
    CaptureVisible {
        /// `png` or `jpeg`.
        format: String,
        /// JPEG quality (0-100).
        #[serde(skip_serializing_if = "Option::is_none")]
        quality: Option<u8>,
    },
}

// ============================================================================
// Page Commands
// ============================================================================

/// Page module commands for scroll state and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum PageCommand {
    /// `window.scrollTo(x, y)`.
    #[serde(rename = "page.scrollTo")]
    ScrollTo {
        /// Horizontal page offset in CSS px.
        x: f64,
        /// Vertical page offset in CSS px.
        y: f64,
    },

    /// Read scroll offset, viewport size, DPR, document height, URL, title.
    #[serde(rename = "page.getMetrics")]
    GetMetrics,

    /// Read the current text selection (as HTML) or the page title.
    #[serde(rename = "page.scrape")]
    Scrape,
}

// ============================================================================
// Overlay Commands
// ============================================================================

/// Tone of the inline status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorTone {
    /// Work in progress.
    Progress,
    /// Finished successfully.
    Success,
    /// Failed.
    Error,
}

/// Mouse cursor applied to the page body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    /// Selection mode.
    Crosshair,
    /// Browser default.
    Default,
}

/// Overlay module commands for the injected selection UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum OverlayCommand {
    /// Inject info panel, full-document overlay and size label.
    ///
    /// The overlay forwards pointer and key events without blocking page
    /// scroll.
    #[serde(rename = "overlay.mount")]
    Mount {
        /// Overlay height in CSS px (full scrollable document).
        #[serde(rename = "documentHeight")]
        document_height: f64,
    },

    /// Show or hide an injected element.
    #[serde(rename = "overlay.setVisible")]
    SetVisible {
        /// Target element.
        #[serde(rename = "elementId")]
        element_id: ElementId,
        /// New visibility.
        visible: bool,
    },

    /// Draw the selection box and its size label.
    #[serde(rename = "overlay.drawSelection")]
    DrawSelection {
        /// Box left in page coordinates.
        left: f64,
        /// Box top in page coordinates.
        top: f64,
        /// Box width.
        width: f64,
        /// Box height.
        height: f64,
        /// Size label text.
        label: String,
        /// Label x in viewport coordinates.
        #[serde(rename = "labelX")]
        label_x: f64,
        /// Label y in viewport coordinates.
        #[serde(rename = "labelY")]
        label_y: f64,
    },

    /// Create or update the status indicator.
    #[serde(rename = "overlay.showIndicator")]
    ShowIndicator {
        /// Existing indicator to update; a new one is created when absent.
        #[serde(rename = "elementId", skip_serializing_if = "Option::is_none")]
        element_id: Option<ElementId>,
        /// Indicator text.
        text: String,
        /// Indicator tone.
        tone: IndicatorTone,
    },

    /// Remove an injected element and any listeners bound to it.
    #[serde(rename = "overlay.remove")]
    Remove {
        /// Target element.
        #[serde(rename = "elementId")]
        element_id: ElementId,
    },

    /// Set the page cursor.
    #[serde(rename = "overlay.setCursor")]
    SetCursor {
        /// Cursor to apply.
        cursor: Cursor,
    },
}

// ============================================================================
// Tests
// ============================================================================
