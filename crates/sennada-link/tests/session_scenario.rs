//! Drives a `Session` against a real local WebSocket peer.

use futures_util::{SinkExt, StreamExt};
use sennada_link::{
    Command, FailureKind, FileSettings, LinkConfig, MemorySettings, Session, SessionError,
    SessionEvent, SessionState, SettingsStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

// =============================================================================
// Test Peer
// =============================================================================

enum PeerAction {
    Send(String),
    Close,
    /// Drops the socket without a close handshake.
    Vanish,
}

/// Stand-in for the desktop POS: accepts one connection, records the text
/// frames it receives, and sends whatever the test asks it to.
struct TestPeer {
    address: String,
    received: mpsc::UnboundedReceiver<String>,
    actions: mpsc::UnboundedSender<PeerAction>,
}

impl TestPeer {
    async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let (received_tx, received) = mpsc::unbounded_channel();
        let (actions, mut actions_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            let (mut write, mut read) = ws.split();

            loop {
                tokio::select! {
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            let _ = received_tx.send(text.as_str().to_owned());
                        }
                        Some(Ok(_)) => {}
                        _ => break,
                    },
                    action = actions_rx.recv() => match action {
                        Some(PeerAction::Send(text)) => {
                            if write.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        Some(PeerAction::Close) | None => {
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        }
                        Some(PeerAction::Vanish) => break,
                    },
                }
            }
        });

        TestPeer {
            address,
            received,
            actions,
        }
    }

    fn send(&self, text: &str) {
        self.actions.send(PeerAction::Send(text.to_string())).unwrap();
    }

    fn close(&self) {
        self.actions.send(PeerAction::Close).unwrap();
    }

    fn vanish(&self) {
        self.actions.send(PeerAction::Vanish).unwrap();
    }

    /// Waits until the connection to this peer has ended.
    async fn wait_closed(&mut self) {
        loop {
            let next = timeout(Duration::from_secs(5), self.received.recv())
                .await
                .expect("peer still connected");
            if next.is_none() {
                return;
            }
        }
    }

    async fn next_received(&mut self) -> Value {
        let text = timeout(Duration::from_secs(5), self.received.recv())
            .await
            .expect("peer received nothing")
            .expect("peer channel closed");
        serde_json::from_str(&text).unwrap()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn new_session(settings: Arc<dyn SettingsStore>) -> Session {
    let mut config = LinkConfig::default();
    config.peer.connect_timeout_secs = 2;
    Session::new(config, settings)
}

fn record(session: &Session) -> mpsc::UnboundedReceiver<SessionEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    session.subscribe(move |event: &SessionEvent| {
        let _ = tx.send(event.clone());
    });
    rx
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no session event")
        .expect("event channel closed")
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_sale_round_trip() {
    let mut peer = TestPeer::spawn().await;
    let session = new_session(Arc::new(MemorySettings::new()));
    let mut events = record(&session);

    session.connect(&peer.address).await.unwrap();
    assert_eq!(session.state(), SessionState::Open);
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Connected {
            address: format!("ws://{}/", peer.address)
        }
    );

    session.send(Command::NewSale).await.unwrap();
    assert_eq!(peer.next_received().await, json!({"type": "newSale"}));

    peer.send(r#"{"type":"saleCreated","data":"7"}"#);
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::SaleStarted {
            sale_id: "7".into()
        }
    );
    assert_eq!(session.active_sale_id().as_deref(), Some("7"));

    session
        .send(Command::AddProduct("6130000000017".into()))
        .await
        .unwrap();
    assert_eq!(
        peer.next_received().await,
        json!({"type": "addProduct", "data": "6130000000017"})
    );

    session.cancel_sale().await;
    assert_eq!(peer.next_received().await, json!({"type": "cancelSale"}));
    assert_eq!(session.active_sale_id(), None);
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::SaleCancelled {
            sale_id: Some("7".into())
        }
    );
}

#[tokio::test]
async fn test_sale_created_emits_exactly_once() {
    let peer = TestPeer::spawn().await;
    let session = new_session(Arc::new(MemorySettings::new()));
    let mut events = record(&session);

    session.connect(&peer.address).await.unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::Connected { .. }
    ));

    peer.send(r#"{"type":"saleCreated","data":"42"}"#);
    peer.send(r#"{"type":"saleTotal","data":1250}"#);

    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::SaleStarted {
            sale_id: "42".into()
        }
    );
    match next_event(&mut events).await {
        SessionEvent::PeerMessage { kind, payload, raw } => {
            assert_eq!(kind, "saleTotal");
            assert_eq!(payload["data"], 1250);
            assert_eq!(raw, r#"{"type":"saleTotal","data":1250}"#);
        }
        other => panic!("expected PeerMessage, got {:?}", other),
    }
    assert_eq!(session.active_sale_id().as_deref(), Some("42"));
}

#[tokio::test]
async fn test_malformed_message_is_not_fatal() {
    let peer = TestPeer::spawn().await;
    let session = new_session(Arc::new(MemorySettings::new()));
    let mut events = record(&session);

    session.connect(&peer.address).await.unwrap();
    next_event(&mut events).await;

    peer.send("definitely not json");
    match next_event(&mut events).await {
        SessionEvent::Error { kind, .. } => assert_eq!(kind, FailureKind::MalformedMessage),
        other => panic!("expected Error, got {:?}", other),
    }

    // Still usable afterwards
    peer.send(r#"{"type":"saleCreated","data":"8"}"#);
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::SaleStarted {
            sale_id: "8".into()
        }
    );
    assert_eq!(session.state(), SessionState::Open);
}

#[tokio::test]
async fn test_refused_connection_reports_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    let settings = MemorySettings::new();
    let session = new_session(Arc::new(settings.clone()));
    let mut events = record(&session);

    let err = session.connect(&address).await.unwrap_err();
    assert!(err.is_transport_error(), "unexpected {:?}", err);
    assert_eq!(session.state(), SessionState::Error);
    match next_event(&mut events).await {
        SessionEvent::Error { kind, .. } => assert_eq!(kind, FailureKind::Transport),
        other => panic!("expected Error, got {:?}", other),
    }

    // A failed attempt is not remembered
    assert_eq!(settings.load_remote_address().unwrap(), None);
    assert_eq!(
        session.send(Command::LockApp).await,
        Err(SessionError::NotConnected)
    );
}

#[tokio::test]
async fn test_address_remembered_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    let peer = TestPeer::spawn().await;

    let session = new_session(Arc::new(FileSettings::new(&path)));
    session.connect(&peer.address).await.unwrap();
    session.close().await;

    // Next app launch: pre-filled, not connected
    let restarted = new_session(Arc::new(FileSettings::new(&path)));
    assert_eq!(
        restarted.remote_address().as_deref(),
        Some(peer.address.as_str())
    );
    assert_eq!(restarted.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_peer_close_clears_sale() {
    let peer = TestPeer::spawn().await;
    let session = new_session(Arc::new(MemorySettings::new()));
    let mut events = record(&session);

    session.connect(&peer.address).await.unwrap();
    next_event(&mut events).await;

    peer.send(r#"{"type":"saleCreated","data":"3"}"#);
    next_event(&mut events).await;
    assert_eq!(session.active_sale_id().as_deref(), Some("3"));

    peer.close();
    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::Disconnected { .. }
    ));
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.active_sale_id(), None);
    assert_eq!(
        session.send(Command::NewSale).await,
        Err(SessionError::NotConnected)
    );
}

#[tokio::test]
async fn test_connect_replaces_previous_connection() {
    let first = TestPeer::spawn().await;
    let mut second = TestPeer::spawn().await;
    let session = new_session(Arc::new(MemorySettings::new()));
    let mut events = record(&session);

    session.connect(&first.address).await.unwrap();
    next_event(&mut events).await;

    session.connect(&second.address).await.unwrap();
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Disconnected {
            reason: Some("replaced".into())
        }
    );
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Connected {
            address: format!("ws://{}/", second.address)
        }
    );

    session.send(Command::LockApp).await.unwrap();
    assert_eq!(second.next_received().await, json!({"type": "lockApp"}));
    assert_eq!(
        session.remote_address().as_deref(),
        Some(second.address.as_str())
    );
}

#[tokio::test]
async fn test_close_by_operator() {
    let peer = TestPeer::spawn().await;
    let session = new_session(Arc::new(MemorySettings::new()));
    let mut events = record(&session);

    session.connect(&peer.address).await.unwrap();
    next_event(&mut events).await;

    session.close().await;
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Disconnected { reason: None }
    );
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_peer_vanishing_mid_session() {
    let peer = TestPeer::spawn().await;
    let session = new_session(Arc::new(MemorySettings::new()));
    let mut events = record(&session);

    session.connect(&peer.address).await.unwrap();
    next_event(&mut events).await;

    peer.send(r#"{"type":"saleCreated","data":"11"}"#);
    next_event(&mut events).await;
    assert_eq!(session.active_sale_id().as_deref(), Some("11"));

    peer.vanish();
    match next_event(&mut events).await {
        SessionEvent::Error { kind, .. } => assert_eq!(kind, FailureKind::Transport),
        other => panic!("expected Error, got {:?}", other),
    }
    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::Disconnected { reason: Some(_) }
    ));

    assert_eq!(session.state(), SessionState::Error);
    assert_eq!(session.active_sale_id(), None);
    assert_eq!(
        session.send(Command::NewSale).await,
        Err(SessionError::NotConnected)
    );
}

#[tokio::test]
async fn test_newer_connect_supersedes_pending_handshake() {
    // Accepts TCP but never completes the WebSocket handshake
    let stalled = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let stalled_address = stalled.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (_socket, _) = stalled.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let mut peer = TestPeer::spawn().await;
    let session = new_session(Arc::new(MemorySettings::new()));
    let mut events = record(&session);

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.connect(&stalled_address).await })
    };
    while session.state() != SessionState::Connecting {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    session.connect(&peer.address).await.unwrap();

    let first = timeout(Duration::from_secs(5), pending)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, Err(SessionError::Superseded));
    assert_eq!(session.state(), SessionState::Open);

    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Connected {
            address: format!("ws://{}/", peer.address)
        }
    );
    assert!(events.try_recv().is_err());

    session.send(Command::NewSale).await.unwrap();
    assert_eq!(peer.next_received().await, json!({"type": "newSale"}));
}

#[tokio::test]
async fn test_invalid_address_closes_open_connection() {
    let mut peer = TestPeer::spawn().await;
    let session = new_session(Arc::new(MemorySettings::new()));
    let mut events = record(&session);

    session.connect(&peer.address).await.unwrap();
    next_event(&mut events).await;
    peer.send(r#"{"type":"saleCreated","data":"5"}"#);
    next_event(&mut events).await;

    let err = session.connect("http://10.0.0.9").await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidAddress(_)));

    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Disconnected {
            reason: Some("replaced".into())
        }
    );
    match next_event(&mut events).await {
        SessionEvent::Error { kind, .. } => assert_eq!(kind, FailureKind::Address),
        other => panic!("expected Error, got {:?}", other),
    }

    assert_eq!(session.state(), SessionState::Error);
    assert_eq!(session.status().peer_url, None);
    assert_eq!(session.active_sale_id(), None);
    assert_eq!(
        session.send(Command::LockApp).await,
        Err(SessionError::NotConnected)
    );
    peer.wait_closed().await;
}
