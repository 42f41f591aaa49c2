//! JSON-RPC 2.0 session over a persistent WebSocket.
//!
//! Lifecycle: disconnected -> connecting -> open -> disconnected, retried
//! forever with exponential backoff. `close()` is the only terminal
//! transition; it suppresses reconnection until `connect()` is called again.
//!
//! All correlation state (pending map, id counter) is owned by the instance,
//! so multiple sockets can coexist in one process.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use zknet_core::protocol::rpc::{classify, Incoming, RpcRequest};
use zknet_core::{Result, ZknetError};

/// Connection lifecycle events, delivered in arrival order to the single
/// owner of the event stream.
#[derive(Debug)]
pub enum TransportEvent {
    Opened,
    Closed,
    Notification {
        method: String,
        params: Option<Value>,
    },
}

/// Tunables; design defaults match the remote client's expectations.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-call deadline.
    pub call_timeout: Duration,
    /// First reconnect delay after a close.
    pub backoff_floor: Duration,
    /// Reconnect delay cap.
    pub backoff_ceiling: Duration,
    /// Multiplier applied per successive failed cycle.
    pub backoff_factor: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            backoff_floor: Duration::from_secs(1),
            backoff_ceiling: Duration::from_secs(30),
            backoff_factor: 1.5,
        }
    }
}

type PendingReply = oneshot::Sender<Result<Value>>;
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// JSON-RPC client over one upstream WebSocket.
#[derive(Clone)]
pub struct RpcSocket {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    cfg: TransportConfig,
    next_id: AtomicU64,
    pending: DashMap<u64, PendingReply>,
    /// Present exactly while a session is open; cleared on close.
    writer: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    shutdown: AtomicBool,
    supervising: AtomicBool,
    /// Interrupts the supervisor's backoff sleep.
    wake: Notify,
}

impl RpcSocket {
    /// Build a socket plus its event stream. Does not connect; call
    /// [`RpcSocket::connect`].
    pub fn new(
        url: impl Into<String>,
        cfg: TransportConfig,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            url: url.into(),
            cfg,
            next_id: AtomicU64::new(1),
            pending: DashMap::new(),
            writer: Mutex::new(None),
            events,
            shutdown: AtomicBool::new(false),
            supervising: AtomicBool::new(false),
            wake: Notify::new(),
        });
        (Self { inner }, events_rx)
    }

    /// (Re)start the connection supervisor. Idempotent while one is running.
    pub fn connect(&self) {
        self.inner.shutdown.store(false, Ordering::SeqCst);
        if self.inner.supervising.swap(true, Ordering::SeqCst) {
            // a supervisor is already running; skip whatever backoff delay
            // it may be sleeping on and dial now
            self.inner.wake.notify_one();
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(supervise(inner));
    }

    /// Close the socket and suppress reconnection until the next `connect()`.
    pub fn close(&self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);
        // Dropping the writer ends the session loop, which closes the socket
        // and rejects whatever is still pending.
        if let Ok(mut w) = self.inner.writer.lock() {
            *w = None;
        }
        // cancel a pending reconnect timer
        self.inner.wake.notify_one();
    }

    /// Socket is open right now.
    pub fn is_open(&self) -> bool {
        self.inner
            .writer
            .lock()
            .map(|w| w.is_some())
            .unwrap_or(false)
    }

    /// Correlated call. Fails immediately, without sending, when not open.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let tx = self
            .inner
            .writer
            .lock()
            .map_err(|_| ZknetError::Internal("writer lock poisoned".into()))?
            .clone()
            .ok_or(ZknetError::NotOpen)?;

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = RpcRequest::call(method, params, id).to_text()?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner.pending.insert(id, reply_tx);

        if tx.send(Message::text(frame)).is_err() {
            self.inner.pending.remove(&id);
            return Err(ZknetError::ConnectionClosed);
        }
        // must not hold the writer across the await: close() relies on the
        // last sender dropping to end the session loop
        drop(tx);

        match tokio::time::timeout(self.inner.cfg.call_timeout, reply_rx).await {
            Ok(Ok(outcome)) => outcome,
            // reply sender dropped without an answer: session tore down
            Ok(Err(_)) => Err(ZknetError::ConnectionClosed),
            Err(_) => {
                // a late reply for this id is now silently discarded
                self.inner.pending.remove(&id);
                Err(ZknetError::Timeout(method.to_owned()))
            }
        }
    }

    /// Fire-and-forget notification. Fails synchronously when not open.
    pub fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let tx = self
            .inner
            .writer
            .lock()
            .map_err(|_| ZknetError::Internal("writer lock poisoned".into()))?
            .clone()
            .ok_or(ZknetError::NotOpen)?;
        let frame = RpcRequest::notification(method, params).to_text()?;
        tx.send(Message::text(frame))
            .map_err(|_| ZknetError::ConnectionClosed)
    }
}

async fn supervise(inner: Arc<Inner>) {
    let mut delay = inner.cfg.backoff_floor;
    loop {
        if inner.shutdown.load(Ordering::SeqCst) {
            break;
        }
        match connect_async(&inner.url).await {
            Ok((ws, _)) => {
                if inner.shutdown.load(Ordering::SeqCst) {
                    break;
                }
                delay = inner.cfg.backoff_floor;
                run_session(&inner, ws).await;
            }
            Err(e) => {
                tracing::debug!(url = %inner.url, error = %e, "connect attempt failed");
            }
        }
        if inner.shutdown.load(Ordering::SeqCst) {
            break;
        }
        tracing::debug!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            // close() cancels the timer; connect() skips it
            _ = inner.wake.notified() => {}
        }
        delay = next_backoff(delay, &inner.cfg);
    }
    inner.supervising.store(false, Ordering::SeqCst);
}

fn next_backoff(current: Duration, cfg: &TransportConfig) -> Duration {
    current.mul_f64(cfg.backoff_factor).min(cfg.backoff_ceiling)
}

/// One open session: pump outbound frames, classify inbound ones. Returning
/// means the socket is gone, one way or another.
async fn run_session(inner: &Arc<Inner>, ws: WsStream) {
    let (mut to_remote, mut from_remote) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    if let Ok(mut w) = inner.writer.lock() {
        *w = Some(tx);
    }
    let _ = inner.events.send(TransportEvent::Opened);
    tracing::info!(url = %inner.url, "rpc socket open");

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                match outgoing {
                    Some(msg) => {
                        if to_remote.send(msg).await.is_err() {
                            break;
                        }
                    }
                    // writer dropped by close()
                    None => break,
                }
            }
            incoming = from_remote.next() => {
                match incoming {
                    Some(Ok(Message::Text(txt))) => inner.handle_frame(txt.as_str()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ignore non-text frames
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "socket read failed");
                        break;
                    }
                }
            }
        }
    }

    if let Ok(mut w) = inner.writer.lock() {
        *w = None;
    }
    inner.reject_all_pending(ZknetError::ConnectionClosed);
    let _ = inner.events.send(TransportEvent::Closed);
    tracing::info!(url = %inner.url, "rpc socket closed");
}

impl Inner {
    fn handle_frame(&self, raw: &str) {
        match classify(raw) {
            Ok(Incoming::Response { id, outcome }) => {
                // no pending entry: already timed out or stale, drop silently
                let Some((_, reply)) = self.pending.remove(&id) else {
                    return;
                };
                let _ = reply.send(outcome.map_err(|e| ZknetError::Rpc(e.message)));
            }
            Ok(Incoming::Notification { method, params }) => {
                let _ = self.events.send(TransportEvent::Notification { method, params });
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed frame ignored");
            }
        }
    }

    fn reject_all_pending(&self, err: ZknetError) {
        let ids: Vec<u64> = self.pending.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, reply)) = self.pending.remove(&id) {
                let _ = reply.send(Err(err.clone()));
            }
        }
    }
}
