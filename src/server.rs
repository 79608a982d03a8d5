//! Server orchestration: connection table, room registry, reconnection
//! tracker, and the handlers that turn inbound frames into room mutations.
//!
//! Handlers resolve the room through the registry, take that room's lock,
//! mutate and emit inside the critical section, and release. No handler
//! ever holds two room locks.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{mpsc, Notify};

use crate::broadcast::serialize_frame;
use crate::config::Config;
use crate::fabric::{fabric_from_config, spawn_fabric_pump};
use crate::protocol::{ConnId, GameError, MemberId, ServerFrame};
use crate::reconnect::ReconnectionTracker;
use crate::registry::RoomRegistry;

mod game_service;
mod message_router;
mod reconnection_service;
mod room_service;

pub(crate) use room_service::Departure;

/// Which room and member a connection is attached to.
#[derive(Debug, Clone)]
pub struct Membership {
    pub room_code: String,
    pub member_id: MemberId,
}

/// Per-connection bookkeeping owned by the transport adapter.
pub struct ConnState {
    /// Bounded outbound queue drained by the connection's send task.
    pub tx: mpsc::Sender<Bytes>,
    /// Wakes the connection tasks so they shut down promptly.
    pub closer: Arc<Notify>,
    /// Attached room membership, if any.
    pub membership: Option<Membership>,
    /// Room code supplied in the connection URL, used as the default for
    /// `join_room` frames that omit one.
    pub url_room: Option<String>,
}

pub struct TrivionServer {
    registry: Arc<RoomRegistry>,
    connections: DashMap<ConnId, ConnState>,
    tracker: Arc<ReconnectionTracker>,
    config: Arc<Config>,
}

impl TrivionServer {
    /// Build the server and start the fabric pump. Must run inside a Tokio
    /// runtime.
    pub fn new(config: Arc<Config>) -> Arc<Self> {
        let tracker = Arc::new(ReconnectionTracker::new(config.server.reconnect_window()));

        let fabric_tx = if config.pubsub_url.is_some() {
            let fabric = fabric_from_config(config.pubsub_url.as_deref());
            Some(spawn_fabric_pump(fabric))
        } else {
            None
        };

        let registry = Arc::new(RoomRegistry::new(
            config.clone(),
            tracker.clone(),
            fabric_tx,
        ));

        Arc::new(Self {
            registry,
            connections: DashMap::new(),
            tracker,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<ReconnectionTracker> {
        &self.tracker
    }

    /// Register a freshly upgraded connection.
    pub fn register_connection(
        &self,
        conn_id: ConnId,
        tx: mpsc::Sender<Bytes>,
        closer: Arc<Notify>,
        url_room: Option<String>,
    ) {
        self.connections.insert(
            conn_id,
            ConnState {
                tx,
                closer,
                membership: None,
                url_room,
            },
        );
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub(crate) fn membership_of(&self, conn_id: ConnId) -> Option<Membership> {
        self.connections
            .get(&conn_id)
            .and_then(|c| c.membership.clone())
    }

    pub(crate) fn url_room_of(&self, conn_id: ConnId) -> Option<String> {
        self.connections.get(&conn_id).and_then(|c| c.url_room.clone())
    }

    pub(crate) fn set_membership(&self, conn_id: ConnId, room_code: String, member_id: MemberId) {
        if let Some(mut conn) = self.connections.get_mut(&conn_id) {
            conn.membership = Some(Membership {
                room_code,
                member_id,
            });
        }
    }

    pub(crate) fn clear_membership(&self, conn_id: ConnId) {
        if let Some(mut conn) = self.connections.get_mut(&conn_id) {
            conn.membership = None;
        }
    }

    /// Snapshot of a connection's sender and closer, cheap clones.
    pub(crate) fn conn_channel(&self, conn_id: ConnId) -> Option<(mpsc::Sender<Bytes>, Arc<Notify>)> {
        self.connections
            .get(&conn_id)
            .map(|c| (c.tx.clone(), c.closer.clone()))
    }

    /// Push a frame onto one connection's queue, outside any room lock.
    /// Overflow tells the connection to close; its disconnect handler opens
    /// the reconnection window if a member was attached.
    pub fn send_frame_to_conn(&self, conn_id: ConnId, frame: &ServerFrame) {
        let Some(bytes) = serialize_frame(frame) else {
            return;
        };
        if let Some(conn) = self.connections.get(&conn_id) {
            if conn.tx.try_send(bytes).is_err() {
                tracing::warn!(%conn_id, tag = frame.tag(), "Connection queue overflow");
                conn.closer.notify_one();
            }
        }
    }

    pub fn send_error_to_conn(&self, conn_id: ConnId, error: &GameError) {
        self.send_frame_to_conn(
            conn_id,
            &ServerFrame::Error {
                message: error.to_string(),
            },
        );
    }

    /// Tear down a connection that closed or timed out. The member, if any,
    /// keeps its seat and enters the reconnection window.
    pub async fn handle_disconnect(&self, conn_id: ConnId) {
        let Some((_, state)) = self.connections.remove(&conn_id) else {
            return;
        };
        let Some(membership) = state.membership else {
            tracing::debug!(%conn_id, "Connection closed");
            return;
        };

        if let Some(shared) = self.registry.find(&membership.room_code).await {
            let mut room = shared.lock().await;
            // No-op when the member already reattached elsewhere.
            room.detach_conn(conn_id);
        }
        tracing::info!(
            %conn_id,
            room_code = %membership.room_code,
            member_id = %membership.member_id,
            "Connection closed"
        );
    }
}
