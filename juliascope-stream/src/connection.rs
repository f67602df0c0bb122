//! The transport session to the remote renderer.
//!
//! A dedicated thread runs a small tokio runtime with one job: keep a
//! WebSocket to the renderer alive, forward outbound tile batches, decode
//! inbound messages, and reconnect with backoff when the link drops. The
//! UI thread never blocks — it talks to this thread through a
//! [`ConnectionHandle`] and polls decoded events once per frame, exactly
//! like any other worker queue.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use juliascope_core::TileKey;

use crate::backoff::Backoff;
use crate::cache::TilePixels;
use crate::decode::{decode_raw_frame, decode_tile_image};
use crate::protocol::{ServerMessage, TileRequest};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connection lifecycle state, as observed by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting\u{2026}",
            Self::Connected => "Connected",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            2 => Self::Connected,
            1 => Self::Connecting,
            _ => Self::Disconnected,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
        }
    }
}

/// Decoded event delivered to the UI thread.
#[derive(Debug)]
pub enum ConnEvent {
    /// The connection state changed. `Connected` is the cue to replay the
    /// current viewport/parameters through the scheduler.
    State(ConnState),

    /// A tile arrived and decoded successfully.
    Tile { key: TileKey, pixels: TilePixels },

    /// A full-frame RGBA buffer arrived (the no-tiling mode).
    Frame { pixels: TilePixels },
}

/// The UI thread's grip on the connection worker.
///
/// Dropping the handle closes the outbound channel, which winds the
/// worker down on its next loop turn.
pub struct ConnectionHandle {
    outbound: UnboundedSender<TileRequest>,
    events: mpsc::Receiver<ConnEvent>,
    state: Arc<AtomicU8>,
}

impl ConnectionHandle {
    /// Queue a request for transmission.
    ///
    /// While the connection is down the request is silently dropped — the
    /// post-reconnect replay re-derives everything from current state, so
    /// queuing would only deliver stale batches.
    pub fn send(&self, request: TileRequest) {
        if self.state() != ConnState::Connected {
            debug!("Dropping outbound request while not connected");
            return;
        }
        let _ = self.outbound.send(request);
    }

    /// Drain any events the worker has produced since the last poll.
    pub fn poll_events(&self) -> Vec<ConnEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = self.events.try_recv() {
            events.push(ev);
        }
        events
    }

    pub fn state(&self) -> ConnState {
        ConnState::from_u8(self.state.load(Ordering::Relaxed))
    }
}

/// Why a live session ended.
enum SessionEnd {
    /// Transport failed or the peer closed; reconnect.
    ConnectionLost,
    /// The UI dropped its handle; terminate the worker.
    HandleClosed,
}

/// Spawn the connection worker for `endpoint` (e.g. `ws://host:8700/ws`).
///
/// `notify` is invoked after each delivered event so the UI can schedule a
/// repaint; it runs on the worker thread and must be cheap.
pub fn spawn(endpoint: String, notify: impl Fn() + Send + 'static) -> ConnectionHandle {
    let (outbound_tx, outbound_rx) = unbounded_channel::<TileRequest>();
    let (event_tx, event_rx) = mpsc::channel::<ConnEvent>();
    let state = Arc::new(AtomicU8::new(ConnState::Disconnected.as_u8()));

    let worker_state = Arc::clone(&state);
    thread::Builder::new()
        .name("renderer-conn".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!("Failed to build connection runtime: {e}");
                    return;
                }
            };
            runtime.block_on(run(endpoint, outbound_rx, event_tx, worker_state, notify));
            debug!("Connection worker exiting");
        })
        .expect("Failed to spawn connection worker thread");

    ConnectionHandle {
        outbound: outbound_tx,
        events: event_rx,
        state,
    }
}

/// The connect/reconnect loop. Never terminates on its own while the UI
/// holds the handle; every failure path leads back to a backoff sleep and
/// another attempt.
async fn run(
    endpoint: String,
    mut outbound: UnboundedReceiver<TileRequest>,
    events: mpsc::Sender<ConnEvent>,
    state: Arc<AtomicU8>,
    notify: impl Fn(),
) {
    let mut backoff = Backoff::for_reconnect();

    loop {
        set_state(&state, ConnState::Connecting, &events, &notify);

        match connect_async(endpoint.as_str()).await {
            Ok((ws, _)) => {
                info!(%endpoint, "Connected to renderer");
                backoff.reset();

                // Anything queued while down is stale by definition.
                while outbound.try_recv().is_ok() {}

                set_state(&state, ConnState::Connected, &events, &notify);
                let end = run_session(ws, &mut outbound, &events, &notify).await;
                set_state(&state, ConnState::Disconnected, &events, &notify);

                if matches!(end, SessionEnd::HandleClosed) {
                    return;
                }
            }
            Err(e) => {
                warn!(%endpoint, "Connection attempt failed: {e}");
                set_state(&state, ConnState::Disconnected, &events, &notify);
            }
        }

        // The UI may have gone away while we were down.
        if matches!(
            outbound.try_recv(),
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected)
        ) {
            return;
        }

        let delay = backoff.next_delay();
        debug!(attempt = backoff.attempt(), ?delay, "Reconnecting after backoff");
        tokio::time::sleep(delay).await;
    }
}

/// Pump one live WebSocket session until it ends.
async fn run_session(
    ws: WsStream,
    outbound: &mut UnboundedReceiver<TileRequest>,
    events: &mpsc::Sender<ConnEvent>,
    notify: &impl Fn(),
) -> SessionEnd {
    let (mut sink, mut stream) = ws.split();

    // Canvas dimensions of the most recent request, used to validate
    // full-frame binary payloads.
    let mut frame_dims = (0u32, 0u32);

    loop {
        tokio::select! {
            req = outbound.recv() => match req {
                Some(req) => {
                    frame_dims = (req.params.width, req.params.height);
                    let text = match serde_json::to_string(&req) {
                        Ok(t) => t,
                        Err(e) => {
                            warn!("Failed to serialize request: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("Send failed, dropping connection: {e}");
                        return SessionEnd::ConnectionLost;
                    }
                }
                None => return SessionEnd::HandleClosed,
            },

            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if handle_text(&text, events).is_err() {
                        return SessionEnd::HandleClosed;
                    }
                    notify();
                }
                Some(Ok(Message::Binary(bytes))) => {
                    if handle_binary(&bytes, frame_dims, events).is_err() {
                        return SessionEnd::HandleClosed;
                    }
                    notify();
                }
                Some(Ok(Message::Close(_))) => {
                    info!("Renderer closed the connection");
                    return SessionEnd::ConnectionLost;
                }
                // Pings are answered by tungstenite itself; frames we do
                // not care about are skipped.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Receive failed, dropping connection: {e}");
                    return SessionEnd::ConnectionLost;
                }
                None => return SessionEnd::ConnectionLost,
            },
        }
    }
}

/// Decode one inbound text message and forward the result.
///
/// Malformed or unrecognized messages are logged and dropped — they never
/// affect connection state or the cache. `Err` only signals that the UI
/// side hung up.
fn handle_text(text: &str, events: &mpsc::Sender<ConnEvent>) -> Result<(), ()> {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(ServerMessage::Tile { x, y, lod, image }) => match decode_tile_image(&image) {
            Ok(pixels) => {
                let key = TileKey::new(x, y, lod);
                events
                    .send(ConnEvent::Tile { key, pixels })
                    .map_err(|_| ())?;
            }
            Err(e) => warn!(x, y, lod, "Skipping undecodable tile: {e}"),
        },
        Ok(ServerMessage::Error { message }) => {
            warn!("Renderer reported: {message}");
        }
        Ok(ServerMessage::Unknown) => {
            warn!("Dropping message with unrecognized type");
        }
        Err(e) => {
            warn!("Dropping malformed message: {e}");
        }
    }
    Ok(())
}

/// Validate and forward a full-frame binary payload.
fn handle_binary(
    bytes: &[u8],
    (width, height): (u32, u32),
    events: &mpsc::Sender<ConnEvent>,
) -> Result<(), ()> {
    if width == 0 || height == 0 {
        warn!("Dropping binary frame received before any request");
        return Ok(());
    }
    match decode_raw_frame(bytes, width, height) {
        Ok(pixels) => events.send(ConnEvent::Frame { pixels }).map_err(|_| ()),
        Err(e) => {
            warn!("Dropping binary frame: {e}");
            Ok(())
        }
    }
}

fn set_state(
    state: &Arc<AtomicU8>,
    new: ConnState,
    events: &mpsc::Sender<ConnEvent>,
    notify: &impl Fn(),
) {
    let old = ConnState::from_u8(state.swap(new.as_u8(), Ordering::Relaxed));
    if old != new {
        let _ = events.send(ConnEvent::State(new));
        notify();
    }
}
