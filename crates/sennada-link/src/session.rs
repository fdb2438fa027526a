//! # Peer Session
//!
//! Owns the single connection to the desktop POS. Screens hold a cloned
//! [`Session`] and never touch the socket.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────┐  connect   ┌────────────┐  handshake ok   ┌──────┐          │
//! │   │ Idle │ ─────────► │ Connecting │ ──────────────► │ Open │          │
//! │   └──────┘            └────────────┘                 └──────┘          │
//! │                             │                         │    │            │
//! │                   refused / │ timeout        peer     │    │ transport  │
//! │                             ▼                closed / │    │ failure    │
//! │                        ┌───────┐            close()   ▼    ▼            │
//! │                        │ Error │ ◄──────────── ┌────────┐ ──┘          │
//! │                        └───────┘               │ Closed │               │
//! │                             │                  └────────┘               │
//! │                             └──── connect ────────┘ (operator only)    │
//! │                                                                         │
//! │  No automatic transition back to Open. The operator reconnects.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected address also ends in `Error`, after the current connection
//! has been closed.
//!
//! ## Events
//! Every lifecycle change and inbound message is delivered to subscribers
//! as a [`SessionEvent`], in the order the transport produced them.
//! Observers run on the connection's reader task and must not block.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::config::LinkConfig;
use crate::error::{SessionError, SessionResult};
use crate::protocol::{Command, PeerMessage};
use crate::settings::SettingsStore;
use crate::transport::{self, PeerSource, SharedSink, TransportEvent};

// =============================================================================
// State & Events
// =============================================================================

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Error,
}

/// Coarse category of a reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Connecting, sending, or the connection dropping.
    Transport,
    /// The operator's address could not be used.
    Address,
    /// Inbound text we could not understand. The connection stays open.
    MalformedMessage,
    /// The remembered address could not be saved.
    Settings,
}

impl From<&SessionError> for FailureKind {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::InvalidAddress(_) | SessionError::InvalidConfig(_) => {
                FailureKind::Address
            }
            SessionError::Settings(_) => FailureKind::Settings,
            SessionError::MalformedMessage(_) => FailureKind::MalformedMessage,
            _ => FailureKind::Transport,
        }
    }
}

/// Notification delivered to every subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionEvent {
    /// Handshake complete; `address` is the resolved peer URL.
    Connected { address: String },

    /// The connection ended.
    Disconnected { reason: Option<String> },

    /// Something failed. Never fatal.
    Error { kind: FailureKind, message: String },

    /// The peer announced a sale.
    #[serde(rename_all = "camelCase")]
    SaleStarted { sale_id: String },

    /// The operator cancelled the sale.
    #[serde(rename_all = "camelCase")]
    SaleCancelled { sale_id: Option<String> },

    /// Any other inbound message, for display.
    PeerMessage {
        kind: String,
        payload: Value,
        raw: String,
    },
}

impl SessionEvent {
    fn error(err: &SessionError) -> Self {
        SessionEvent::Error {
            kind: FailureKind::from(err),
            message: err.to_string(),
        }
    }
}

/// Receives session events.
///
/// Implemented for any `Fn(&SessionEvent) + Send + Sync` closure.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent) {
        self(event)
    }
}

/// Handle returned by [`Session::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Snapshot for status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub state: SessionState,
    /// Resolved URL of the open connection.
    pub peer_url: Option<String>,
    pub active_sale_id: Option<String>,
    /// Last address that connected, as the operator entered it.
    pub remote_address: Option<String>,
}

// =============================================================================
// Shared State
// =============================================================================

struct Connection {
    id: Uuid,
    url: String,
    sink: SharedSink,
    reader: Option<JoinHandle<()>>,
}

impl Connection {
    /// Called from the reader task itself, which is about to finish.
    fn detach(mut self) {
        self.reader = None;
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

struct Inner {
    state: SessionState,
    /// Id of the `connect` currently in flight.
    attempt: Option<Uuid>,
    connection: Option<Connection>,
    active_sale_id: Option<String>,
    remote_address: Option<String>,
}

struct Shared {
    inner: Mutex<Inner>,
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn SessionObserver>)>>,
    next_subscription: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers `event` to a snapshot of the observers. Never called with
    /// `inner` locked.
    fn emit(&self, event: SessionEvent) {
        let observers: Vec<Arc<dyn SessionObserver>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();

        for observer in observers {
            observer.on_event(&event);
        }
    }

    fn is_current(&self, id: Uuid) -> bool {
        self.lock()
            .connection
            .as_ref()
            .map_or(false, |c| c.id == id)
    }

    /// Removes connection `id` and moves to `state`. Returns `None` when
    /// `id` is no longer the live connection.
    fn end(&self, id: Uuid, state: SessionState) -> Option<Connection> {
        let mut inner = self.lock();
        if !inner.connection.as_ref().map_or(false, |c| c.id == id) {
            return None;
        }
        inner.state = state;
        inner.active_sale_id = None;
        inner.connection.take()
    }

    fn on_transport_event(&self, id: Uuid, event: TransportEvent) {
        match event {
            TransportEvent::Text(text) => self.on_text(id, text),
            TransportEvent::Closed { reason } => {
                if let Some(connection) = self.end(id, SessionState::Closed) {
                    connection.detach();
                    info!(connection_id = %id, ?reason, "Peer closed the connection");
                    self.emit(SessionEvent::Disconnected { reason });
                }
            }
            TransportEvent::Failed(err) => {
                if let Some(connection) = self.end(id, SessionState::Error) {
                    connection.detach();
                    self.report_failure(id, err);
                }
            }
        }
    }

    fn on_text(&self, id: Uuid, text: String) {
        if !self.is_current(id) {
            debug!(connection_id = %id, "Ignoring message from replaced connection");
            return;
        }

        match PeerMessage::parse(&text) {
            Ok(PeerMessage::SaleCreated { sale_id }) => {
                {
                    let mut inner = self.lock();
                    if !inner.connection.as_ref().map_or(false, |c| c.id == id) {
                        return;
                    }
                    inner.active_sale_id = Some(sale_id.clone());
                }
                info!(connection_id = %id, %sale_id, "Sale started on peer");
                self.emit(SessionEvent::SaleStarted { sale_id });
            }
            Ok(PeerMessage::Other { kind, payload }) => {
                debug!(connection_id = %id, %kind, "Peer message");
                self.emit(SessionEvent::PeerMessage {
                    kind,
                    payload,
                    raw: text,
                });
            }
            Err(err) => {
                warn!(connection_id = %id, %err, "Dropping malformed message");
                self.emit(SessionEvent::error(&err));
            }
        }
    }

    fn report_failure(&self, id: Uuid, err: SessionError) {
        warn!(connection_id = %id, %err, "Connection to peer failed");
        self.emit(SessionEvent::error(&err));
        self.emit(SessionEvent::Disconnected {
            reason: Some(err.to_string()),
        });
    }
}

/// Stops the reader and says goodbye to the peer.
async fn shutdown(connection: Connection) {
    let sink = connection.sink.clone();
    drop(connection);
    transport::close(&sink).await;
}

// =============================================================================
// Session
// =============================================================================

/// Handle to the peer session. Clones share the same connection.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
    config: Arc<LinkConfig>,
    settings: Arc<dyn SettingsStore>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates an idle session. The remembered address is loaded for
    /// pre-fill; nothing connects until [`Session::connect`].
    pub fn new(config: LinkConfig, settings: Arc<dyn SettingsStore>) -> Self {
        let remote_address = settings.load_remote_address().unwrap_or_else(|e| {
            warn!(%e, "Could not load remembered peer address");
            None
        });

        if let Some(address) = &remote_address {
            debug!(%address, "Restored remembered peer address");
        }

        Session {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: SessionState::Idle,
                    attempt: None,
                    connection: None,
                    active_sale_id: None,
                    remote_address,
                }),
                observers: RwLock::new(Vec::new()),
                next_subscription: AtomicU64::new(1),
            }),
            config: Arc::new(config),
            settings,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    pub fn active_sale_id(&self) -> Option<String> {
        self.shared.lock().active_sale_id.clone()
    }

    /// Last address that connected successfully, as entered.
    pub fn remote_address(&self) -> Option<String> {
        self.shared.lock().remote_address.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    pub fn status(&self) -> SessionStatus {
        let inner = self.shared.lock();
        SessionStatus {
            state: inner.state,
            peer_url: inner.connection.as_ref().map(|c| c.url.clone()),
            active_sale_id: inner.active_sale_id.clone(),
            remote_address: inner.remote_address.clone(),
        }
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Registers an observer for every future event.
    pub fn subscribe(&self, observer: impl SessionObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.shared.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.shared
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(observer)));
        id
    }

    /// Removes an observer. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self
            .shared
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        observers.len() != before
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Connects to `address`, replacing any existing connection.
    ///
    /// ## Flow
    /// 1. Close the previous connection, if any
    /// 2. Resolve the address (bare hosts get `ws://` and port 9000)
    /// 3. Handshake within the configured timeout
    /// 4. Remember `address` and emit `Connected`
    ///
    /// The previous connection is closed even when `address` is rejected.
    /// Every failure is also emitted as an `Error` event. Nothing is retried.
    #[instrument(skip(self), fields(connection_id = tracing::field::Empty))]
    pub async fn connect(&self, address: &str) -> SessionResult<()> {
        let resolved = self.config.peer.resolve(address);

        let attempt = Uuid::new_v4();
        tracing::Span::current().record("connection_id", tracing::field::display(attempt));

        let (previous, was_open) = {
            let mut inner = self.shared.lock();
            let was_open = inner.state == SessionState::Open;
            if resolved.is_ok() {
                inner.state = SessionState::Connecting;
                inner.attempt = Some(attempt);
            } else {
                inner.state = SessionState::Error;
                inner.attempt = None;
            }
            inner.active_sale_id = None;
            (inner.connection.take(), was_open)
        };

        self.retire(previous, was_open).await;

        let url = match resolved {
            Ok(url) => url,
            Err(err) => {
                warn!(%err, "Rejected peer address");
                self.shared.emit(SessionEvent::error(&err));
                return Err(err);
            }
        };

        info!(%url, "Connecting to peer");

        let (sink, source) = match transport::open(&url, self.config.peer.connect_timeout()).await
        {
            Ok(pair) => pair,
            Err(err) => {
                let current = {
                    let mut inner = self.shared.lock();
                    if inner.attempt == Some(attempt) {
                        inner.attempt = None;
                        inner.state = SessionState::Error;
                        true
                    } else {
                        false
                    }
                };
                if !current {
                    return Err(SessionError::Superseded);
                }
                warn!(%err, "Could not connect to peer");
                self.shared.emit(SessionEvent::error(&err));
                return Err(err);
            }
        };

        let registered = {
            let mut inner = self.shared.lock();
            if inner.attempt == Some(attempt) {
                inner.attempt = None;
                inner.state = SessionState::Open;
                inner.connection = Some(Connection {
                    id: attempt,
                    url: url.to_string(),
                    sink: sink.clone(),
                    reader: None,
                });
                inner.remote_address = Some(address.to_string());
                true
            } else {
                false
            }
        };

        if !registered {
            debug!("Connection superseded during handshake");
            transport::close(&sink).await;
            return Err(SessionError::Superseded);
        }

        if let Err(err) = self.settings.save_remote_address(address) {
            warn!(%err, "Could not remember peer address");
            self.shared.emit(SessionEvent::error(&err));
        }

        info!(%url, "Connected to peer");
        self.shared.emit(SessionEvent::Connected {
            address: url.to_string(),
        });

        let reader = self.spawn_reader(attempt, source);
        let mut inner = self.shared.lock();
        match inner.connection.as_mut() {
            Some(connection) if connection.id == attempt => connection.reader = Some(reader),
            // Already ended; the task finishes on its own
            _ => drop(reader),
        }

        Ok(())
    }

    /// Closes a connection taken out by `connect`.
    async fn retire(&self, previous: Option<Connection>, was_open: bool) {
        let Some(previous) = previous else {
            return;
        };
        info!(previous = %previous.id, "Closing previous connection");
        shutdown(previous).await;
        if was_open {
            self.shared.emit(SessionEvent::Disconnected {
                reason: Some("replaced".into()),
            });
        }
    }

    fn spawn_reader(&self, id: Uuid, source: PeerSource) -> JoinHandle<()> {
        let shared = Arc::downgrade(&self.shared);
        let span = info_span!("peer_connection", connection_id = %id);

        tokio::spawn(
            async move {
                transport::read_loop(source, move |event| {
                    if let Some(shared) = shared.upgrade() {
                        shared.on_transport_event(id, event);
                    }
                })
                .await;
                debug!("Reader finished");
            }
            .instrument(span),
        )
    }

    /// Sends one command to the peer.
    ///
    /// Fails with `NotConnected` unless the session is `Open`. A write
    /// failure ends the connection (`Error` then `Disconnected`).
    #[instrument(skip(self, command), fields(command = command.type_name()))]
    pub async fn send(&self, command: Command) -> SessionResult<()> {
        let (id, sink) = {
            let inner = self.shared.lock();
            match (inner.state, inner.connection.as_ref()) {
                (SessionState::Open, Some(connection)) => (connection.id, connection.sink.clone()),
                _ => {
                    warn!(state = ?inner.state, "Send attempted without an open connection");
                    return Err(SessionError::NotConnected);
                }
            }
        };

        let json = command.to_json()?;
        debug!(connection_id = %id, %json, "Sending command");

        if let Err(err) = transport::send_text(&sink, json).await {
            // Dropping the connection stops its reader
            if self.shared.end(id, SessionState::Error).is_some() {
                self.shared.report_failure(id, err.clone());
            }
            return Err(err);
        }

        Ok(())
    }

    /// Cancels the current sale.
    ///
    /// The local sale is cleared and `SaleCancelled` emitted even when the
    /// peer is unreachable.
    #[instrument(skip(self))]
    pub async fn cancel_sale(&self) {
        let sale_id = self.shared.lock().active_sale_id.take();

        match self.send(Command::CancelSale).await {
            Ok(()) => {}
            Err(SessionError::NotConnected) => debug!("Cancelled locally, peer not connected"),
            Err(err) => debug!(%err, "cancelSale not delivered"),
        }

        info!(?sale_id, "Sale cancelled");
        self.shared.emit(SessionEvent::SaleCancelled { sale_id });
    }

    /// Closes the connection. No-op when nothing is open or connecting.
    #[instrument(skip(self))]
    pub async fn close(&self) {
        let connection = {
            let mut inner = self.shared.lock();
            if inner.connection.is_none() && inner.attempt.is_none() {
                return;
            }
            inner.attempt = None;
            inner.state = SessionState::Closed;
            inner.active_sale_id = None;
            inner.connection.take()
        };

        if let Some(connection) = connection {
            info!(connection_id = %connection.id, "Closing connection");
            shutdown(connection).await;
            self.shared.emit(SessionEvent::Disconnected { reason: None });
        }
    }
}
