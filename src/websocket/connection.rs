//! Per-connection socket plumbing.
//!
//! Each accepted socket is split into a send task (draining the bounded
//! outbound queue) and a receive task (parsing frames, answering heartbeat
//! probes, dispatching commands). A missed heartbeat, a closed socket, or a
//! queue overflow all end in the same disconnect path, which opens the
//! member's reconnection window.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use crate::protocol::{ClientFrame, ConnId, ServerFrame};
use crate::server::TrivionServer;

pub(super) async fn handle_socket(
    socket: WebSocket,
    server: Arc<TrivionServer>,
    addr: SocketAddr,
    url_room: Option<String>,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let conn_id: ConnId = Uuid::new_v4();
    let queue_capacity = server.config().server.outbound_queue_capacity;
    let (tx, mut rx) = mpsc::channel(queue_capacity);
    let closer = Arc::new(Notify::new());

    server.register_connection(conn_id, tx, closer.clone(), url_room);
    tracing::info!(%conn_id, client_addr = %addr, "WebSocket connection established");

    // Drain the outbound queue onto the socket.
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match String::from_utf8(frame.to_vec()) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(%conn_id, error = %e, "Outbound frame is not UTF-8");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Parse inbound frames, answer heartbeats, dispatch commands.
    let server_clone = server.clone();
    let recv_task = tokio::spawn(async move {
        let server = server_clone;
        let heartbeat_interval = server.config().server.heartbeat_interval();
        let heartbeat_timeout = server.config().server.heartbeat_timeout();
        let max_message_size = server.config().server.max_message_size;

        let mut heartbeat =
            tokio::time::interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_pong = Instant::now();

        loop {
            tokio::select! {
                () = closer.notified() => {
                    tracing::debug!(%conn_id, "Connection told to close");
                    break;
                }
                _ = heartbeat.tick() => {
                    if last_pong.elapsed() > heartbeat_timeout {
                        tracing::warn!(%conn_id, "Heartbeat timed out, closing connection");
                        break;
                    }
                    server.send_frame_to_conn(conn_id, &ServerFrame::PingHeartbeat);
                }
                msg = ws_receiver.next() => {
                    let msg = match msg {
                        Some(Ok(msg)) => msg,
                        Some(Err(e)) => {
                            tracing::warn!(%conn_id, "WebSocket error: {}", e);
                            break;
                        }
                        None => break,
                    };
                    match msg {
                        Message::Text(text) => {
                            if text.len() > max_message_size {
                                tracing::warn!(
                                    %conn_id,
                                    size = text.len(),
                                    max = max_message_size,
                                    "Frame exceeds size limit"
                                );
                                server.send_frame_to_conn(conn_id, &ServerFrame::Error {
                                    message: format!(
                                        "Frame too large ({} bytes, max {} bytes)",
                                        text.len(),
                                        max_message_size
                                    ),
                                });
                                continue;
                            }
                            let frame: ClientFrame = match serde_json::from_str(&text) {
                                Ok(frame) => frame,
                                Err(e) => {
                                    tracing::warn!(%conn_id, error = %e, "Rejected client frame");
                                    server.send_frame_to_conn(conn_id, &ServerFrame::Error {
                                        message: "Unknown or malformed frame".to_string(),
                                    });
                                    continue;
                                }
                            };
                            if matches!(frame, ClientFrame::PongHeartbeat) {
                                last_pong = Instant::now();
                                continue;
                            }
                            server.handle_frame(conn_id, frame).await;
                        }
                        Message::Pong(_) => {
                            // Protocol-level pongs count like pong_heartbeat.
                            last_pong = Instant::now();
                        }
                        Message::Close(_) => {
                            tracing::info!(%conn_id, "WebSocket connection closed by client");
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
    });

    // Whichever side finishes first tears the connection down.
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }
    server.handle_disconnect(conn_id).await;
}
