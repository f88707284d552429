// tests/integration_tests.rs

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

use bingo_relay::{Registry, ServerConfig, WebsocketServer};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server(ping_interval: Duration) -> (String, Arc<Registry>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ping_interval,
    };
    let server = WebsocketServer::bind(config).await.unwrap();
    let url = format!("ws://{}", server.local_addr().unwrap());
    let registry = server.registry().clone();
    tokio::spawn(server.run());
    (url, registry)
}

async fn connect(url: &str) -> Client {
    let (client, _) = connect_async(url).await.unwrap();
    client
}

async fn send(client: &mut Client, frame: Value) {
    client.send(Message::Text(frame.to_string())).await.unwrap();
}

/// Next text frame as JSON, skipping control frames.
async fn recv(client: &mut Client) -> Value {
    timeout(Duration::from_secs(5), async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("connection ended: {:?}", other),
            }
        }
    })
    .await
    .expect("timed out waiting for a frame")
}

async fn wait_for_history(registry: &Registry, expected: Vec<i64>) {
    timeout(Duration::from_secs(5), async {
        while registry.current_history().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("history never converged");
}

#[tokio::test]
async fn test_draw_scenario_over_websocket() {
    let (url, registry) = start_server(Duration::from_secs(30)).await;

    let mut player = connect(&url).await;
    send(&mut player, json!({"type": "player-join", "playerKey": "p1"})).await;
    assert_eq!(recv(&mut player).await, json!({"type": "state", "lastNumbers": []}));

    let mut admin = connect(&url).await;
    send(&mut admin, json!({"type": "admin-join"})).await;
    assert_eq!(
        recv(&mut admin).await,
        json!({"type": "state", "players": ["p1"], "lastNumbers": []})
    );

    send(&mut admin, json!({"type": "new-number", "number": 7})).await;
    let number = json!({"type": "number", "number": 7});
    assert_eq!(recv(&mut player).await, number);
    assert_eq!(recv(&mut admin).await, number);
    wait_for_history(&registry, vec![7]).await;

    send(&mut admin, json!({"type": "reset-numbers"})).await;
    assert_eq!(recv(&mut player).await, json!({"type": "reset"}));
    assert_eq!(recv(&mut admin).await, json!({"type": "reset"}));
    wait_for_history(&registry, vec![]).await;

    send(&mut admin, json!({"type": "new-number", "number": 7})).await;
    assert_eq!(recv(&mut player).await, number);
    wait_for_history(&registry, vec![7]).await;
}

#[tokio::test]
async fn test_cartones_and_reports_are_unicast() {
    let (url, _registry) = start_server(Duration::from_secs(30)).await;

    let mut admin = connect(&url).await;
    send(&mut admin, json!({"type": "admin-join"})).await;
    recv(&mut admin).await;

    let mut player = connect(&url).await;
    send(&mut player, json!({"type": "player-join", "playerKey": "player-ana"})).await;
    recv(&mut player).await;
    assert_eq!(
        recv(&mut admin).await,
        json!({"type": "player-list", "players": ["player-ana"]})
    );

    // Malformed frames are dropped without a reply
    player.send(Message::Text("{not json".to_string())).await.unwrap();

    let cartones = json!([[1, 14, 27], [3, 22, 45]]);
    send(
        &mut admin,
        json!({"type": "assign-cartones", "playerKey": "player-ana", "cartones": cartones}),
    )
    .await;
    assert_eq!(
        recv(&mut player).await,
        json!({"type": "assign-cartones", "cartones": cartones})
    );
    assert_eq!(
        recv(&mut admin).await,
        json!({"type": "assign-confirm", "playerKey": "player-ana", "cartonesCount": 2})
    );

    send(&mut player, json!({"type": "report", "report": {"kind": "quintina"}})).await;
    assert_eq!(
        recv(&mut admin).await,
        json!({"type": "report", "report": {"kind": "quintina"}})
    );
}

#[tokio::test]
async fn test_disconnect_updates_admin_player_list() {
    let (url, registry) = start_server(Duration::from_secs(30)).await;

    let mut admin = connect(&url).await;
    send(&mut admin, json!({"type": "admin-join"})).await;
    recv(&mut admin).await;

    let mut player = connect(&url).await;
    send(&mut player, json!({"type": "player-join", "playerKey": "p1"})).await;
    recv(&mut player).await;
    recv(&mut admin).await;

    player.close(None).await.unwrap();
    assert_eq!(
        recv(&mut admin).await,
        json!({"type": "player-list", "players": []})
    );
    assert!(registry.snapshot_player_keys().await.is_empty());
}

#[tokio::test]
async fn test_unresponsive_player_is_evicted() {
    let (url, registry) = start_server(Duration::from_secs(1)).await;

    let mut admin = connect(&url).await;
    send(&mut admin, json!({"type": "admin-join"})).await;
    recv(&mut admin).await;

    // This client never reads again, so it never answers pings
    let mut player = connect(&url).await;
    send(&mut player, json!({"type": "player-join", "playerKey": "sleepy"})).await;
    assert_eq!(
        recv(&mut admin).await,
        json!({"type": "player-list", "players": ["sleepy"]})
    );

    // The admin keeps reading, which answers pings automatically
    assert_eq!(
        recv(&mut admin).await,
        json!({"type": "player-list", "players": []})
    );
    assert!(registry.snapshot_player_keys().await.is_empty());
    drop(player);
}

#[tokio::test]
async fn test_client_ping_is_answered_once() {
    let (url, _registry) = start_server(Duration::from_secs(30)).await;

    let mut client = connect(&url).await;
    client.send(Message::Ping(b"hola".to_vec())).await.unwrap();
    send(&mut client, json!({"type": "admin-join"})).await;

    let mut frames = Vec::new();
    timeout(Duration::from_secs(5), async {
        while let Some(Ok(frame)) = client.next().await {
            let is_text = frame.is_text();
            frames.push(frame);
            if is_text {
                break;
            }
        }
    })
    .await
    .expect("timed out waiting for the state frame");

    let pongs = frames
        .iter()
        .filter(|frame| matches!(frame, Message::Pong(payload) if payload == b"hola"))
        .count();
    assert_eq!(pongs, 1);
    assert!(frames.last().unwrap().is_text());
}
