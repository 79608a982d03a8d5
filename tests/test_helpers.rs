use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

use trivion::config::Config;
use trivion::server::TrivionServer;

pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Configuration with compressed timings for integration tests.
#[allow(dead_code)]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.game.countdown_secs = 1;
    config.game.podium_step_ms = 50;
    config.game.podium_finale_ms = 100;
    config.server.reconnect_window_secs = 5;
    config
}

#[allow(dead_code)]
pub fn create_test_server(config: Config) -> Arc<TrivionServer> {
    TrivionServer::new(Arc::new(config))
}

/// Bind an ephemeral port and serve the full router on it, with the
/// reconnection sweeper running like in production.
#[allow(dead_code)]
pub async fn spawn_app(server: Arc<TrivionServer>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    server.spawn_reconnect_sweeper();
    let app = trivion::websocket::create_router("*").with_state(server);
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    addr
}

#[allow(dead_code)]
pub async fn ws_connect(addr: SocketAddr) -> WsStream {
    let url = format!("ws://{addr}/ws");
    let (stream, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("websocket connect");
    stream
}

#[allow(dead_code)]
pub async fn send_frame(ws: &mut WsStream, frame: Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

/// Receive the next frame, transparently answering heartbeat pings.
#[allow(dead_code)]
pub async fn recv_frame(ws: &mut WsStream) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(10), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            let value: Value = serde_json::from_str(&text).expect("frame is JSON");
            if value["tag"] == "ping_heartbeat" {
                send_frame(ws, json!({"tag": "pong_heartbeat"})).await;
                continue;
            }
            return value;
        }
    }
}

/// Skip frames until one with the wanted tag arrives.
#[allow(dead_code)]
pub async fn recv_until_tag(ws: &mut WsStream, tag: &str) -> Value {
    loop {
        let frame = recv_frame(ws).await;
        if frame["tag"] == tag {
            return frame;
        }
    }
}

/// Keep a connection alive for a while: read and discard frames, answering
/// heartbeat pings.
#[allow(dead_code)]
pub async fn pump(ws: &mut WsStream, duration: Duration) {
    let deadline = tokio::time::Instant::now() + duration;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return;
        }
        match tokio::time::timeout(remaining, ws.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                if let Ok(value) = serde_json::from_str::<Value>(&text) {
                    if value["tag"] == "ping_heartbeat" {
                        send_frame(ws, json!({"tag": "pong_heartbeat"})).await;
                    }
                }
            }
            Ok(Some(Ok(_))) => {}
            Ok(_) => return,
            Err(_) => return,
        }
    }
}
