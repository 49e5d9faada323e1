//! One extension session over WebSocket.
//!
//! A [`Connection`] is a cheap handle onto a background pump task that owns
//! the socket. Requests are matched to replies by [`RequestId`]; anything
//! the extension sends that is not a reply is an [`Event`] and goes to the
//! registered handler.
//!
//! The pump stops when the socket closes, errors, or every handle calls
//! [`Connection::shutdown`]. Requests still waiting at that point resolve to
//! [`Error::ConnectionClosed`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, SessionId, TabId};
use crate::protocol::{Event, Request, Response};

// ============================================================================
// Constants
// ============================================================================

/// Reply deadline used by [`Connection::send`].
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Requests allowed in flight at once.
const MAX_IN_FLIGHT: usize = 100;

/// How long the extension has to send READY after the upgrade.
const READY_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

/// Reply slots keyed by the request they answer.
type Waiters = FxHashMap<RequestId, oneshot::Sender<Result<Response>>>;

type Sink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Callback for extension events; runs on the pump task.
pub type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

// ============================================================================
// ReadyData
// ============================================================================

/// What the extension announces in READY.
#[derive(Debug, Clone, Copy)]
pub struct ReadyData {
    /// Tab the clip was started in.
    pub tab_id: TabId,
    /// Bridge session ID.
    pub session_id: SessionId,
}

impl ReadyData {
    /// Reads READY's result. A missing `sessionId` counts as session 1.
    fn from_response(response: &Response) -> Result<Self> {
        if response.is_error() {
            return Err(Error::protocol(format!(
                "READY handshake rejected: {}",
                response.error_message()
            )));
        }

        let tab_id = u32::try_from(response.get_u64("tabId"))
            .ok()
            .and_then(TabId::new)
            .ok_or_else(|| Error::protocol("READY handshake missing tabId"))?;
        let session_id = u32::try_from(response.get_u64("sessionId").max(1))
            .ok()
            .and_then(SessionId::new)
            .ok_or_else(|| Error::protocol("READY handshake has invalid sessionId"))?;

        Ok(Self { tab_id, session_id })
    }
}

// ============================================================================
// Shared State
// ============================================================================

/// State the pump and every handle see.
#[derive(Default)]
struct Shared {
    waiters: Mutex<Waiters>,
    on_event: Mutex<Option<EventHandler>>,
}

impl Shared {
    /// Hands `text` to its waiter or the event handler.
    fn dispatch(&self, text: &str) {
        if let Ok(response) = from_str::<Response>(text) {
            match self.waiters.lock().remove(&response.id) {
                Some(waiter) => {
                    let _ = waiter.send(Ok(response));
                }
                None => warn!(id = %response.id, "Reply to a request nobody is waiting on"),
            }
            return;
        }

        match from_str::<Event>(text) {
            Ok(event) => {
                trace!(method = %event.method, "Event received");
                if let Some(handler) = self.on_event.lock().as_ref() {
                    handler(event);
                }
            }
            Err(e) => warn!(len = text.len(), error = %e, "Unreadable message from extension"),
        }
    }

    /// Resolves every outstanding waiter with [`Error::ConnectionClosed`].
    fn close_all(&self) {
        let waiters: Vec<_> = self.waiters.lock().drain().map(|(_, w)| w).collect();
        if !waiters.is_empty() {
            debug!(count = waiters.len(), "Closing outstanding requests");
        }
        for waiter in waiters {
            let _ = waiter.send(Err(Error::ConnectionClosed));
        }
    }
}

// ============================================================================
// Pump
// ============================================================================

/// Work handed from handles to the pump.
enum Outbound {
    Request {
        request: Request,
        reply: oneshot::Sender<Result<Response>>,
    },
    Forget(RequestId),
    Close,
}

/// Owns the socket for one session.
struct Pump {
    sink: Sink,
    shared: Arc<Shared>,
}

impl Pump {
    async fn run(
        ws_stream: WebSocketStream<TcpStream>,
        mut outbound: mpsc::UnboundedReceiver<Outbound>,
        shared: Arc<Shared>,
    ) {
        let (sink, mut incoming) = ws_stream.split();
        let mut pump = Self { sink, shared };

        loop {
            tokio::select! {
                message = incoming.next() => match message {
                    Some(Ok(Message::Text(text))) => pump.shared.dispatch(&text),
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Extension closed the socket");
                        break;
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                },

                work = outbound.recv() => match work {
                    Some(Outbound::Request { request, reply }) => pump.write(request, reply).await,
                    Some(Outbound::Forget(id)) => {
                        pump.shared.waiters.lock().remove(&id);
                        debug!(?id, "Dropped expired request");
                    }
                    Some(Outbound::Close) | None => {
                        let _ = pump.sink.close().await;
                        break;
                    }
                },
            }
        }

        pump.shared.close_all();
        debug!("Pump stopped");
    }

    /// Registers the waiter, then writes; the reply can race the write.
    async fn write(&mut self, request: Request, reply: oneshot::Sender<Result<Response>>) {
        let id = request.id;
        let method = request.method();

        let json = match to_string(&request) {
            Ok(json) => json,
            Err(e) => {
                let _ = reply.send(Err(Error::Json(e)));
                return;
            }
        };

        self.shared.waiters.lock().insert(id, reply);

        match self.sink.send(Message::Text(json.into())).await {
            Ok(()) => trace!(?id, method, "Request written"),
            Err(e) => {
                if let Some(reply) = self.shared.waiters.lock().remove(&id) {
                    let _ = reply.send(Err(Error::connection(e.to_string())));
                }
            }
        }
    }
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to an extension session. Clones share the session.
#[derive(Clone)]
pub struct Connection {
    outbound: mpsc::UnboundedSender<Outbound>,
    shared: Arc<Shared>,
}

impl Connection {
    /// Starts the pump for `ws_stream`.
    ///
    /// The READY waiter exists before the pump reads anything, so an
    /// extension that sends READY right after the upgrade is never missed.
    /// Pass the returned receiver to [`Connection::wait_ready`].
    pub(crate) fn new(
        ws_stream: WebSocketStream<TcpStream>,
    ) -> (Self, oneshot::Receiver<Result<Response>>) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let shared = Arc::new(Shared::default());
        shared.waiters.lock().insert(RequestId::ready(), ready_tx);

        tokio::spawn(Pump::run(ws_stream, outbound_rx, Arc::clone(&shared)));

        (Self { outbound, shared }, ready_rx)
    }

    /// Waits for READY and reads the tab and session it names.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if READY does not arrive within 30s
    /// - [`Error::ChannelClosed`] if the socket closes first
    /// - [`Error::Protocol`] if READY is an error or lacks a tab ID
    pub(crate) async fn wait_ready(
        &self,
        ready_rx: oneshot::Receiver<Result<Response>>,
    ) -> Result<ReadyData> {
        let Ok(received) = timeout(READY_TIMEOUT, ready_rx).await else {
            self.shared.waiters.lock().remove(&RequestId::ready());
            return Err(Error::connection_timeout(READY_TIMEOUT.as_millis() as u64));
        };

        let ready = ReadyData::from_response(&received??)?;
        debug!(tab_id = %ready.tab_id, session_id = %ready.session_id, "READY received");
        Ok(ready)
    }

    /// Sends every later event to `handler`, replacing any earlier one.
    pub fn set_event_handler(&self, handler: EventHandler) {
        *self.shared.on_event.lock() = Some(handler);
    }

    /// Routes every later event into a channel.
    ///
    /// Replaces any earlier handler. Events are dropped once the receiver
    /// is gone.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.set_event_handler(Box::new(move |event| {
            if tx.send(event).is_err() {
                trace!("Event subscriber dropped");
            }
        }));
        rx
    }

    /// [`send_with_timeout`](Self::send_with_timeout) with
    /// [`DEFAULT_COMMAND_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// See [`send_with_timeout`](Self::send_with_timeout).
    pub async fn send(&self, request: Request) -> Result<Response> {
        self.send_with_timeout(request, DEFAULT_COMMAND_TIMEOUT).await
    }

    /// Sends `request` and waits up to `limit` for its reply.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the session is gone
    /// - [`Error::RequestTimeout`] if no reply arrives in time
    /// - [`Error::Protocol`] if too many requests are already in flight
    pub async fn send_with_timeout(&self, request: Request, limit: Duration) -> Result<Response> {
        let id = request.id;
        let method = request.method();

        let in_flight = self.pending_count();
        if in_flight >= MAX_IN_FLIGHT {
            warn!(in_flight, method, "Request rejected, too many in flight");
            return Err(Error::protocol(format!(
                "Too many pending requests: {in_flight}/{MAX_IN_FLIGHT}"
            )));
        }

        let (reply, reply_rx) = oneshot::channel();
        self.outbound
            .send(Outbound::Request { request, reply })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(limit, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                warn!(?id, method, "Request timed out");
                let _ = self.outbound.send(Outbound::Forget(id));
                Err(Error::request_timeout(id, limit.as_millis() as u64))
            }
        }
    }

    /// Requests waiting for a reply, READY included.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.waiters.lock().len()
    }

    /// Closes the socket; waiting requests fail with
    /// [`Error::ConnectionClosed`].
    pub fn shutdown(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

// ============================================================================
// Tests
// ============================================================================
