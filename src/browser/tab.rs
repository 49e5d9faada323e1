//! The tab a clip was started in, driven over the extension bridge.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tracing::{debug, trace};

use crate::api::SavePayload;
use crate::clip::{
    OverlayHost, PageControl, PageMetrics, Scraped, ScrollOffset, SelectionFeedback,
    SelectorInput, Viewport, VisibleTabCapture,
};
use crate::config::ClipperConfig;
use crate::error::{Error, Result};
use crate::identifiers::{ElementId, SessionId, TabId};
use crate::protocol::{
    Command, Cursor, IndicatorTone, OverlayCommand, PageCommand, ParsedEvent, Request, Response,
    TabCommand,
};
use crate::transport::{BridgeServer, Connection, ReadyData};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a tab.
pub(crate) struct TabInner {
    /// Tab ID.
    pub tab_id: TabId,
    /// Session ID.
    pub session_id: SessionId,
    /// Bridge to the extension.
    pub connection: Connection,
    /// Per-command timeout.
    pub request_timeout: Duration,
    /// Serializes visible-tab captures.
    pub capture_gate: AsyncMutex<()>,
}

// ============================================================================
// ExtensionTab
// ============================================================================

/// A handle to the browser tab hosting a clip.
///
/// Implements the page, capture and overlay seams of the clip pipeline by
/// sending commands to the extension. Cloning shares the same connection.
#[derive(Clone)]
pub struct ExtensionTab {
    pub(crate) inner: Arc<TabInner>,
}

impl fmt::Debug for ExtensionTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionTab")
            .field("tab_id", &self.inner.tab_id)
            .field("session_id", &self.inner.session_id)
            .finish_non_exhaustive()
    }
}

impl ExtensionTab {
    /// Creates a tab handle from an accepted connection.
    #[must_use]
    pub fn new(connection: Connection, ready: ReadyData, config: &ClipperConfig) -> Self {
        Self {
            inner: Arc::new(TabInner {
                tab_id: ready.tab_id,
                session_id: ready.session_id,
                connection,
                request_timeout: config.request_timeout(),
                capture_gate: AsyncMutex::new(()),
            }),
        }
    }

    /// Waits up to `wait` for the extension to start a clip.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionTimeout`] if no clip starts in time.
    pub async fn accept(
        server: &BridgeServer,
        wait: Duration,
        config: &ClipperConfig,
    ) -> Result<Self> {
        let (connection, ready) = server.next_session(wait).await?;
        debug!(tab_id = %ready.tab_id, session_id = %ready.session_id, "Extension tab attached");
        Ok(Self::new(connection, ready, config))
    }
}

// ============================================================================
// ExtensionTab - Accessors
// ============================================================================

impl ExtensionTab {
    /// Returns the tab ID.
    #[inline]
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.inner.tab_id
    }

    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.inner.session_id
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.inner.connection
    }
}

// ============================================================================
// ExtensionTab - Clips
// ============================================================================

impl ExtensionTab {
    /// Reads the current text selection, or the title when nothing is
    /// selected, and builds the one-click save body.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension rejects the command.
    pub async fn scrape(&self) -> Result<SavePayload> {
        let response = self.send_command(Command::Page(PageCommand::Scrape)).await?;

        let selection = response.get_str("selectionHtml").map(str::to_string);
        let scraped = Scraped::choose(selection, response.get_string("title"));
        debug!(kind = %scraped.kind(), "Scraped page");

        Ok(scraped.into_payload(response.get_string("url")))
    }

    /// Routes overlay events into selector input.
    ///
    /// Replaces any previous event handler on the connection. Keys other
    /// than `Escape` and unknown events are dropped.
    #[must_use]
    pub fn selector_inputs(&self) -> mpsc::UnboundedReceiver<SelectorInput> {
        let (tx, rx) = mpsc::unbounded_channel();

        self.inner
            .connection
            .set_event_handler(Box::new(move |event| {
                let input = match event.parse() {
                    ParsedEvent::PointerDown(sample) => SelectorInput::PointerDown(sample),
                    ParsedEvent::PointerMove(sample) => SelectorInput::PointerMove(sample),
                    ParsedEvent::PointerUp(sample) => SelectorInput::PointerUp(sample),
                    ParsedEvent::KeyDown { key } if key == "Escape" => SelectorInput::Escape,
                    other => {
                        trace!(?other, "Ignoring overlay event");
                        return;
                    }
                };

                if tx.send(input).is_err() {
                    trace!("Selector input receiver dropped");
                }
            }));

        rx
    }
}

// ============================================================================
// ExtensionTab - Internal
// ============================================================================

impl ExtensionTab {
    /// Sends a command and returns the response.
    ///
    /// Error responses become [`Error::Protocol`].
    pub(crate) async fn send_command(&self, command: Command) -> Result<Response> {
        let request = Request::new(self.inner.tab_id, command);
        let response = self
            .inner
            .connection
            .send_with_timeout(request, self.inner.request_timeout)
            .await?;

        if response.is_error() {
            return Err(Error::protocol(response.error_message()));
        }

        Ok(response)
    }

    /// Reads scroll offset and viewport from a `page.getMetrics` response.
    fn read_scroll(response: &Response) -> ScrollOffset {
        ScrollOffset::new(
            response.get_f64_or("scrollX", 0.0),
            response.get_f64_or("scrollY", 0.0),
        )
    }
}

// ============================================================================
// PageControl
// ============================================================================

#[async_trait]
impl PageControl for ExtensionTab {
    async fn metrics(&self) -> Result<PageMetrics> {
        let response = self
            .send_command(Command::Page(PageCommand::GetMetrics))
            .await?;

        let width = response.get_f64_or("innerWidth", 0.0);
        let height = response.get_f64_or("innerHeight", 0.0);
        let viewport = Viewport::new(
            width,
            height,
            response.get_f64_or("devicePixelRatio", 1.0),
        )?;

        Ok(PageMetrics {
            scroll: Self::read_scroll(&response),
            viewport,
            document_height: response.get_f64_or("scrollHeight", height),
            url: response.get_string("url"),
            title: response.get_string("title"),
        })
    }

    async fn scroll_to(&self, offset: ScrollOffset) -> Result<()> {
        self.send_command(Command::Page(PageCommand::ScrollTo {
            x: offset.x,
            y: offset.y,
        }))
        .await?;
        Ok(())
    }

    async fn scroll_position(&self) -> Result<ScrollOffset> {
        let response = self
            .send_command(Command::Page(PageCommand::GetMetrics))
            .await?;
        Ok(Self::read_scroll(&response))
    }
}

// ============================================================================
// VisibleTabCapture
// ============================================================================

#[async_trait]
impl VisibleTabCapture for ExtensionTab {
    async fn capture_visible(&self) -> Result<String> {
        let _gate = self.inner.capture_gate.lock().await;

        let response = self
            .send_command(Command::Tab(TabCommand::CaptureVisible {
                format: "png".to_string(),
                quality: None,
            }))
            .await?;

        Ok(response.get_string("data"))
    }
}

// ============================================================================
// OverlayHost
// ============================================================================

#[async_trait]
impl OverlayHost for ExtensionTab {
    async fn mount(&self, document_height: f64) -> Result<Vec<ElementId>> {
        let response = self
            .send_command(Command::Overlay(OverlayCommand::Mount { document_height }))
            .await?;

        let elements = response
            .result
            .as_ref()
            .and_then(|v| v.get("elements"))
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::protocol("overlay.mount returned no elements"))?
            .iter()
            .filter_map(|v| v.as_str())
            .map(ElementId::new)
            .collect();

        Ok(elements)
    }

    async fn set_visible(&self, element: &ElementId, visible: bool) -> Result<()> {
        self.send_command(Command::Overlay(OverlayCommand::SetVisible {
            element_id: element.clone(),
            visible,
        }))
        .await?;
        Ok(())
    }

    async fn draw_selection(&self, feedback: &SelectionFeedback) -> Result<()> {
        let rect = &feedback.rect;
        self.send_command(Command::Overlay(OverlayCommand::DrawSelection {
            left: rect.left,
            top: rect.top,
            width: rect.width(),
            height: rect.height(),
            label: feedback.label.clone(),
            label_x: feedback.label_x,
            label_y: feedback.label_y,
        }))
        .await?;
        Ok(())
    }

    async fn show_indicator(
        &self,
        existing: Option<&ElementId>,
        text: &str,
        tone: IndicatorTone,
    ) -> Result<ElementId> {
        let response = self
            .send_command(Command::Overlay(OverlayCommand::ShowIndicator {
                element_id: existing.cloned(),
                text: text.to_string(),
                tone,
            }))
            .await?;

        response
            .get_str("elementId")
            .map(ElementId::new)
            .ok_or_else(|| Error::protocol("overlay.showIndicator returned no elementId"))
    }

    async fn remove(&self, element: &ElementId) -> Result<()> {
        self.send_command(Command::Overlay(OverlayCommand::Remove {
            element_id: element.clone(),
        }))
        .await?;
        Ok(())
    }

    async fn set_cursor(&self, cursor: Cursor) -> Result<()> {
        self.send_command(Command::Overlay(OverlayCommand::SetCursor { cursor }))
            .await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::{SinkExt, StreamExt};
    use serde_json::{Value, from_str, json};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message;

    use crate::api::SnippetKind;
    use crate::clip::SelectionRect;
    use crate::identifiers::RequestId;

    #[test]
    fn test_tab_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<ExtensionTab>();
    }

    #[test]
    fn test_tab_is_debug() {
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_debug::<ExtensionTab>();
    }

    /// Reply the fake extension sends for a request.
    fn reply_for(request: &Value) -> Value {
        let id = &request["id"];
        let method = request["method"].as_str().unwrap_or_default();

        let result = match method {
            "page.getMetrics" => json!({
                "scrollX": 0,
                "scrollY": 150,
                "innerWidth": 1280,
                "innerHeight": 720,
                "devicePixelRatio": 2,
                "scrollHeight": 4000,
                "url": "https://example.com/article",
                "title": "Article"
            }),
            "page.scrape" => json!({
                "selectionHtml": "<b>quoted</b>",
                "title": "Article",
                "url": "https://example.com/article"
            }),
            "tab.captureVisible" => json!({ "data": "data:image/png;base64,AAAA" }),
            "overlay.mount" => json!({ "elements": ["panel", "overlay", "label"] }),
            "overlay.showIndicator" => json!({ "elementId": "indicator-1" }),
            "overlay.remove" => {
                return json!({
                    "id": id,
                    "type": "error",
                    "error": "no such element",
                    "message": "Element is gone"
                });
            }
            _ => json!({}),
        };

        json!({ "id": id, "type": "success", "result": result })
    }

    /// Connects a fake extension that answers by method and emits overlay
    /// events after the overlay is mounted.
    async fn spawn_fake_extension(ws_url: String) {
        tokio::spawn(async move {
            let (mut ws, _) = connect_async(ws_url).await.expect("connect");
            let ready = json!({
                "id": RequestId::ready(),
                "type": "success",
                "result": { "tabId": 11, "sessionId": 2 }
            });
            ws.send(Message::Text(ready.to_string().into()))
                .await
                .expect("send ready");

            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let request: Value = from_str(&text).expect("request json");
                let reply = reply_for(&request);
                ws.send(Message::Text(reply.to_string().into()))
                    .await
                    .expect("send reply");

                if request["method"] == "overlay.mount" {
                    let events = [
                        json!({ "method": "overlay.pointerDown", "params": { "pageX": 10, "pageY": 20, "scrollX": 0, "scrollY": 0 } }),
                        json!({ "method": "overlay.keyDown", "params": { "key": "Enter" } }),
                        json!({ "method": "overlay.keyDown", "params": { "key": "Escape" } }),
                    ];
                    for mut event in events {
                        event["id"] = json!(RequestId::generate());
                        event["type"] = json!("event");
                        ws.send(Message::Text(event.to_string().into()))
                            .await
                            .expect("send event");
                    }
                }
            }
        });
    }

    async fn attach() -> ExtensionTab {
        let server = BridgeServer::bind(0).await.expect("bind");
        spawn_fake_extension(server.ws_url()).await;

        let config = ClipperConfig::builder()
            .request_timeout(Duration::from_secs(5))
            .build()
            .expect("config");
        ExtensionTab::accept(&server, Duration::from_secs(5), &config)
            .await
            .expect("accept")
    }

    #[tokio::test]
    async fn test_metrics() {
        let tab = attach().await;
        assert_eq!(tab.tab_id().as_u32(), 11);
        assert_eq!(tab.session_id().as_u32(), 2);

        let metrics = tab.metrics().await.expect("metrics");
        assert_eq!(metrics.scroll, ScrollOffset::new(0.0, 150.0));
        assert_eq!(metrics.viewport.width, 1280.0);
        assert_eq!(metrics.viewport.height, 720.0);
        assert_eq!(metrics.viewport.device_pixel_ratio, 2.0);
        assert_eq!(metrics.document_height, 4000.0);
        assert_eq!(metrics.url, "https://example.com/article");
        assert_eq!(metrics.title, "Article");

        let position = tab.scroll_position().await.expect("position");
        assert_eq!(position.y, 150.0);

        tab.scroll_to(ScrollOffset::new(0.0, 800.0))
            .await
            .expect("scroll");
        tab.connection().shutdown();
    }

    #[tokio::test]
    async fn test_capture_and_scrape() {
        let tab = attach().await;

        let data = tab.capture_visible().await.expect("capture");
        assert_eq!(data, "data:image/png;base64,AAAA");

        let payload = tab.scrape().await.expect("scrape");
        assert_eq!(payload.kind, SnippetKind::Html);
        assert_eq!(payload.content, "<b>quoted</b>");
        assert_eq!(payload.source_url, "https://example.com/article");
        tab.connection().shutdown();
    }

    #[tokio::test]
    async fn test_overlay_commands_and_events() {
        let tab = attach().await;
        let mut inputs = tab.selector_inputs();

        let elements = tab.mount(4000.0).await.expect("mount");
        assert_eq!(
            elements,
            vec![
                ElementId::new("panel"),
                ElementId::new("overlay"),
                ElementId::new("label"),
            ]
        );

        match inputs.recv().await.expect("pointer down") {
            SelectorInput::PointerDown(sample) => {
                assert_eq!(sample.page_x, 10.0);
                assert_eq!(sample.page_y, 20.0);
            }
            other => panic!("unexpected input {other:?}"),
        }
        // Enter is dropped; Escape comes through.
        assert!(matches!(
            inputs.recv().await.expect("escape"),
            SelectorInput::Escape
        ));

        let feedback = SelectionFeedback {
            rect: SelectionRect::from_origin_size(10.0, 20.0, 100.0, 50.0),
            label: "100 × 50".to_string(),
            label_x: 25.0,
            label_y: -10.0,
        };
        tab.draw_selection(&feedback).await.expect("draw");
        tab.set_visible(&elements[0], false).await.expect("hide");
        tab.set_cursor(Cursor::Crosshair).await.expect("cursor");

        let indicator = tab
            .show_indicator(None, "📸 Capturing screenshot... (0/1)", IndicatorTone::Progress)
            .await
            .expect("indicator");
        assert_eq!(indicator, ElementId::new("indicator-1"));

        let err = tab.remove(&indicator).await.expect_err("remove fails");
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(err.to_string().contains("Element is gone"));
        tab.connection().shutdown();
    }
}
