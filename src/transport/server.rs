//! Loopback listener the clipper extension dials into.
//!
//! The extension opens one WebSocket per clip. [`BridgeServer`] stays bound
//! for the life of the process and hands out one [`Connection`] per clip, so
//! successive clips reuse the same `ws://127.0.0.1:<port>` URL.
//!
//! A peer that connects but fails the WebSocket upgrade or the READY
//! handshake is dropped and the server keeps waiting for the next one until
//! the deadline passes.

// ============================================================================
// Imports
// ============================================================================

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::Connection;
use super::connection::ReadyData;

// ============================================================================
// BridgeServer
// ============================================================================

/// Listener for extension sessions on `127.0.0.1`.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use web_clipper::Result;
/// use web_clipper::transport::BridgeServer;
///
/// # async fn example() -> Result<()> {
/// let server = BridgeServer::bind(0).await?;
/// println!("point the extension at {}", server.ws_url());
///
/// loop {
///     let (connection, ready) = server.next_session(Duration::from_secs(600)).await?;
///     println!("clip started in tab {}", ready.tab_id);
///     connection.shutdown();
/// }
/// # }
/// ```
pub struct BridgeServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl BridgeServer {
    /// Binds to `127.0.0.1:port`; port 0 lets the OS choose.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the port cannot be bound.
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await?;
        let addr = listener.local_addr()?;
        debug!(%addr, "Bridge listening");
        Ok(Self { listener, addr })
    }

    /// Bound address.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// URL the extension connects to.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Waits for the extension to start a clip.
    ///
    /// Peers that fail the upgrade or the READY handshake are skipped.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if no session is established within `wait`
    /// - [`Error::Io`] if the listener itself fails
    pub async fn next_session(&self, wait: Duration) -> Result<(Connection, ReadyData)> {
        let deadline = Instant::now() + wait;
        let timed_out = || Error::connection_timeout(wait.as_millis() as u64);

        loop {
            let (stream, peer) = timeout_at(deadline, self.listener.accept())
                .await
                .map_err(|_| timed_out())??;

            match timeout_at(deadline, Self::handshake(stream)).await {
                Ok(Ok((connection, ready))) => {
                    info!(%peer, tab_id = %ready.tab_id, session_id = %ready.session_id, "Extension session started");
                    return Ok((connection, ready));
                }
                Ok(Err(e)) => warn!(%peer, error = %e, "Dropping peer that failed the handshake"),
                Err(_) => return Err(timed_out()),
            }
        }
    }

    /// Upgrades `stream` and waits for READY.
    async fn handshake(stream: TcpStream) -> Result<(Connection, ReadyData)> {
        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        let (connection, ready_rx) = Connection::new(ws_stream);
        match connection.wait_ready(ready_rx).await {
            Ok(ready) => Ok((connection, ready)),
            Err(e) => {
                connection.shutdown();
                Err(e)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::SinkExt;
    use serde_json::json;
    use tokio::io::AsyncWriteExt;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message;

    use crate::identifiers::RequestId;

    /// Dials `ws_url` and sends READY for `tab_id`, keeping the socket open.
    fn start_clip(ws_url: String, tab_id: u32) {
        tokio::spawn(async move {
            let (mut ws, _) = connect_async(ws_url).await.expect("connect");
            let ready = json!({
                "id": RequestId::ready(),
                "type": "success",
                "result": { "tabId": tab_id, "sessionId": 1 }
            });
            ws.send(Message::Text(ready.to_string().into()))
                .await
                .expect("send ready");
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
    }

    #[tokio::test]
    async fn test_bind_loopback_url() {
        let server = BridgeServer::bind(0).await.expect("bind");

        assert!(server.addr().ip().is_loopback());
        assert_ne!(server.addr().port(), 0);
        assert_eq!(server.ws_url(), format!("ws://127.0.0.1:{}", server.addr().port()));
    }

    #[tokio::test]
    async fn test_successive_clips_share_one_listener() {
        let server = BridgeServer::bind(0).await.expect("bind");

        start_clip(server.ws_url(), 4);
        let (first, ready) = server
            .next_session(Duration::from_secs(5))
            .await
            .expect("first clip");
        assert_eq!(ready.tab_id.as_u32(), 4);
        first.shutdown();

        start_clip(server.ws_url(), 9);
        let (second, ready) = server
            .next_session(Duration::from_secs(5))
            .await
            .expect("second clip");
        assert_eq!(ready.tab_id.as_u32(), 9);
        second.shutdown();
    }

    #[tokio::test]
    async fn test_non_websocket_peer_is_skipped() {
        let server = BridgeServer::bind(0).await.expect("bind");
        let addr = server.addr();
        let ws_url = server.ws_url();

        tokio::spawn(async move {
            let mut raw = TcpStream::connect(addr).await.expect("raw connect");
            raw.write_all(b"GET / HTTP/1.1\r\n\r\n").await.expect("write");
            drop(raw);
            start_clip(ws_url, 12);
        });

        let (connection, ready) = server
            .next_session(Duration::from_secs(5))
            .await
            .expect("session after stray peer");
        assert_eq!(ready.tab_id.as_u32(), 12);
        connection.shutdown();
    }

    #[tokio::test]
    async fn test_times_out_without_extension() {
        let server = BridgeServer::bind(0).await.expect("bind");

        let err = server
            .next_session(Duration::from_millis(30))
            .await
            .err()
            .expect("nobody connects");
        assert!(matches!(err, Error::ConnectionTimeout { timeout_ms: 30 }));
    }
}
