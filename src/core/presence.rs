//! Presence connection manager.
//!
//! Owns the single live connection to the backend's real-time endpoint. The
//! lifecycle is an explicit `Disconnected -> Connecting -> Connected` state
//! machine keyed by the announced user id: re-running the activation with the
//! same identity is a no-op, a different identity tears the old connection
//! down first, and logout or shell teardown closes it instead of leaking a
//! live socket. The messaging surface borrows a [`PresenceSender`]; it can
//! transmit on the connection but never open a second one or change the
//! announced identity.

use crate::core::identity::UserIdentity;
use async_trait::async_trait;
use futures_util::SinkExt;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Event name of the first frame sent after a connection opens, registering
/// the local user with the backend's presence tracking.
pub const ANNOUNCE_EVENT: &str = "add-user";

#[derive(Serialize)]
struct AnnounceIdentity<'a> {
    event: &'static str,
    #[serde(rename = "userId")]
    user_id: &'a str,
}

/// Errors from opening or using the presence connection.
#[derive(Debug)]
pub enum PresenceError {
    /// The connection handshake failed.
    Connect {
        url: String,
        source: Box<dyn StdError + Send + Sync>,
    },

    /// An outbound frame could not be transmitted.
    Send(Box<dyn StdError + Send + Sync>),

    /// The announce frame could not be serialized.
    Encode(serde_json::Error),
}

impl fmt::Display for PresenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceError::Connect { url, source } => {
                write!(f, "Failed to connect to {}: {}", url, source)
            }
            PresenceError::Send(source) => write!(f, "Failed to send presence frame: {}", source),
            PresenceError::Encode(source) => {
                write!(f, "Failed to encode announce frame: {}", source)
            }
        }
    }
}

impl StdError for PresenceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PresenceError::Connect { source, .. } | PresenceError::Send(source) => {
                Some(source.as_ref())
            }
            PresenceError::Encode(source) => Some(source),
        }
    }
}

/// One live, bidirectional link to the real-time endpoint.
#[async_trait]
pub trait PresenceLink: Send {
    async fn send_text(&mut self, payload: String) -> Result<(), PresenceError>;
    async fn close(&mut self);
}

/// Opens presence links. Injected so tests can count opens and capture
/// announced frames without a network.
#[async_trait]
pub trait PresenceConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn PresenceLink>, PresenceError>;
}

/// Production connector over a WebSocket.
pub struct WsConnector;

struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PresenceLink for WsLink {
    async fn send_text(&mut self, payload: String) -> Result<(), PresenceError> {
        self.stream
            .send(Message::text(payload))
            .await
            .map_err(|source| PresenceError::Send(Box::new(source)))
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

#[async_trait]
impl PresenceConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn PresenceLink>, PresenceError> {
        let (stream, _response) =
            connect_async(url)
                .await
                .map_err(|source| PresenceError::Connect {
                    url: url.to_string(),
                    source: Box::new(source),
                })?;
        Ok(Box::new(WsLink { stream }))
    }
}

/// Connectivity indicator state. Rendering never blocks on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl PresenceStatus {
    pub fn label(self) -> &'static str {
        match self {
            PresenceStatus::Disconnected => "offline",
            PresenceStatus::Connecting => "connecting",
            PresenceStatus::Connected => "online",
        }
    }
}

/// Cloneable outbound half lent to the messaging surface.
#[derive(Clone)]
pub struct PresenceSender {
    outbound: mpsc::UnboundedSender<String>,
}

impl PresenceSender {
    /// Queue a frame for transmission. Returns false once the connection has
    /// been torn down.
    pub fn send(&self, payload: String) -> bool {
        self.outbound.send(payload).is_ok()
    }
}

/// The single live connection, owned exclusively by the manager.
pub struct ConnectionHandle {
    user_id: String,
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    pump: JoinHandle<()>,
}

impl ConnectionHandle {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn sender(&self) -> PresenceSender {
        PresenceSender {
            outbound: self.outbound.clone(),
        }
    }

    async fn close(self) {
        self.cancel.cancel();
        let _ = self.pump.await;
    }
}

fn spawn_pump(
    mut link: Box<dyn PresenceLink>,
    mut rx: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    link.close().await;
                    break;
                }
                payload = rx.recv() => match payload {
                    Some(payload) => {
                        if let Err(err) = link.send_text(payload).await {
                            warn!("Presence send failed: {err}");
                            link.close().await;
                            break;
                        }
                    }
                    None => {
                        link.close().await;
                        break;
                    }
                }
            }
        }
    })
}

enum LinkState {
    Disconnected,
    Connecting { user_id: String },
    Connected(ConnectionHandle),
}

/// Guarded state machine around the one presence connection per loaded
/// identity.
pub struct PresenceManager {
    connector: Arc<dyn PresenceConnector>,
    url: String,
    state: LinkState,
    status_tx: watch::Sender<PresenceStatus>,
    max_attempts: u32,
    base_delay: Duration,
}

impl PresenceManager {
    pub fn new(connector: Arc<dyn PresenceConnector>, url: String) -> Self {
        let (status_tx, _) = watch::channel(PresenceStatus::Disconnected);
        Self {
            connector,
            url,
            state: LinkState::Disconnected,
            status_tx,
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Override the connect retry budget (attempts and initial backoff).
    pub fn with_retry_policy(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_delay = base_delay;
        self
    }

    pub fn status(&self) -> PresenceStatus {
        *self.status_tx.borrow()
    }

    /// Subscribe to connectivity changes for the indicator in the shell.
    pub fn status_watch(&self) -> watch::Receiver<PresenceStatus> {
        self.status_tx.subscribe()
    }

    /// Read-only lend of the live handle, if any.
    pub fn handle(&self) -> Option<&ConnectionHandle> {
        match &self.state {
            LinkState::Connected(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn sender(&self) -> Option<PresenceSender> {
        self.handle().map(ConnectionHandle::sender)
    }

    /// Open the connection for `identity` and announce it, unless one is
    /// already connecting or connected for the same id. A different identity
    /// closes the old connection first; a handle is never reused across
    /// identities.
    ///
    /// Activation is conditional on a loaded identity with a non-empty id,
    /// never on render order: callers may invoke this on every pass.
    pub async fn ensure_connected(&mut self, identity: &UserIdentity) -> Result<(), PresenceError> {
        if identity.id.is_empty() {
            return Ok(());
        }
        let replaces_other_identity = match &self.state {
            LinkState::Connected(handle) if handle.user_id == identity.id => return Ok(()),
            LinkState::Connecting { user_id } if *user_id == identity.id => return Ok(()),
            LinkState::Disconnected => false,
            _ => true,
        };
        if replaces_other_identity {
            self.shutdown().await;
        }

        self.state = LinkState::Connecting {
            user_id: identity.id.clone(),
        };
        self.set_status(PresenceStatus::Connecting);

        let mut delay = self.base_delay;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.open_and_announce(&identity.id).await {
                Ok(handle) => {
                    self.state = LinkState::Connected(handle);
                    self.set_status(PresenceStatus::Connected);
                    info!(user_id = %identity.id, "presence connection announced");
                    return Ok(());
                }
                Err(err) if attempt < self.max_attempts => {
                    warn!(attempt, "Presence connect failed, retrying: {err}");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(err) => {
                    self.state = LinkState::Disconnected;
                    self.set_status(PresenceStatus::Disconnected);
                    return Err(err);
                }
            }
        }
    }

    /// Close the connection. Called when the identity goes away (logout) and
    /// on shell teardown.
    pub async fn shutdown(&mut self) {
        let previous = std::mem::replace(&mut self.state, LinkState::Disconnected);
        if let LinkState::Connected(handle) = previous {
            handle.close().await;
        }
        self.set_status(PresenceStatus::Disconnected);
    }

    async fn open_and_announce(&self, user_id: &str) -> Result<ConnectionHandle, PresenceError> {
        let mut link = self.connector.connect(&self.url).await?;
        let frame = serde_json::to_string(&AnnounceIdentity {
            event: ANNOUNCE_EVENT,
            user_id,
        })
        .map_err(PresenceError::Encode)?;
        link.send_text(frame).await?;

        let (outbound, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let pump = spawn_pump(link, rx, cancel.clone());
        Ok(ConnectionHandle {
            user_id: user_id.to_string(),
            outbound,
            cancel,
            pump,
        })
    }

    fn set_status(&self, status: PresenceStatus) {
        // send_replace updates the value even when no watcher is subscribed.
        self.status_tx.send_replace(status);
    }
}
