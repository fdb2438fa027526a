//! Connect screen against a real local WebSocket peer.

use futures_util::{SinkExt, StreamExt};
use sennada_companion::commands::session as link_commands;
use sennada_companion::{notice, AppPaths, Companion, Notice, NoticeLevel};
use sennada_link::SessionState;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

async fn next_notice(rx: &mut broadcast::Receiver<Notice>) -> Notice {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no notice")
        .expect("notice channel closed")
}

#[tokio::test]
async fn test_connect_and_start_sale() {
    let dir = tempfile::tempdir().unwrap();
    let app = Companion::start(AppPaths::in_dir(dir.path())).await.unwrap();
    let mut notices = app.notices.subscribe();

    // Desktop stand-in: answers newSale with a sale id
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let peer = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
        let mut received = Vec::new();
        while let Some(Ok(frame)) = ws.next().await {
            if let Message::Text(text) = frame {
                let text = text.as_str().to_owned();
                if text.contains("newSale") {
                    ws.send(Message::Text(r#"{"type":"saleCreated","data":"15"}"#.into()))
                        .await
                        .unwrap();
                }
                received.push(text);
                if received.len() == 2 {
                    break;
                }
            }
        }
        received
    });

    link_commands::use_scanned_address(&app.link, address.clone());
    let status = link_commands::connect(&app.link, None).await.unwrap();
    assert_eq!(status.state, SessionState::Open);

    let connected = next_notice(&mut notices).await;
    assert_eq!(connected.level, NoticeLevel::Success);
    assert_eq!(connected.title, notice::CONNECTED);

    link_commands::new_sale(&app.link, &app.notices).await.unwrap();
    let started = next_notice(&mut notices).await;
    assert_eq!(started.text.as_deref(), Some("N° 15"));
    assert_eq!(
        link_commands::session_status(&app.link)
            .active_sale_id
            .as_deref(),
        Some("15")
    );

    link_commands::send_scanned_barcode(&app.link, &app.notices, "6130000000017".into())
        .await
        .unwrap();

    let received = timeout(Duration::from_secs(5), peer).await.unwrap().unwrap();
    assert_eq!(
        received,
        vec![
            r#"{"type":"newSale"}"#.to_string(),
            r#"{"type":"addProduct","data":"6130000000017"}"#.to_string(),
        ]
    );

    // Remembered for the next launch
    app.shutdown().await;
    let relaunched = Companion::start(AppPaths::in_dir(dir.path())).await.unwrap();
    assert_eq!(relaunched.link.address_input(), address);
    relaunched.shutdown().await;
}
