//! Process-wide room registry.
//!
//! A coarse lock guards only the code → room map; each room carries its own
//! lock, so operations in distinct rooms proceed in parallel. No task ever
//! holds two room locks, and the map lock is always released before a room
//! lock is taken.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};

use crate::config::Config;
use crate::fabric::FabricEvent;
use crate::protocol::{room_codes, GameError, RoomSummary};
use crate::reconnect::ReconnectionTracker;
use crate::room::{Room, SharedRoom};

pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, SharedRoom>>,
    tracker: Arc<ReconnectionTracker>,
    fabric_tx: Option<mpsc::UnboundedSender<FabricEvent>>,
    config: Arc<Config>,
}

impl RoomRegistry {
    pub fn new(
        config: Arc<Config>,
        tracker: Arc<ReconnectionTracker>,
        fabric_tx: Option<mpsc::UnboundedSender<FabricEvent>>,
    ) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            tracker,
            fabric_tx,
            config,
        }
    }

    /// Create a room under a freshly allocated code. Codes are uniform
    /// random over the 36-character alphabet; after too many consecutive
    /// collisions allocation gives up with `CapacityExhausted`.
    pub async fn create(
        &self,
        name: &str,
        public: bool,
        password: Option<&str>,
    ) -> Result<(String, SharedRoom), GameError> {
        let attempts = self.config.game.code_allocation_attempts;
        let mut rooms = self.rooms.write().await;
        for _ in 0..attempts {
            let code = room_codes::generate_room_code();
            if rooms.contains_key(&code) {
                continue;
            }
            let room = Arc::new(Mutex::new(Room::new(
                code.clone(),
                name.to_string(),
                public,
                password,
                self.fabric_tx.clone(),
                self.tracker.clone(),
                self.config.clone(),
            )));
            rooms.insert(code.clone(), room.clone());
            tracing::info!(room_code = %code, room_name = %name, public, "Room created");
            return Ok((code, room));
        }
        tracing::error!(attempts, "Room code allocation exhausted");
        Err(GameError::CapacityExhausted)
    }

    pub async fn find(&self, code: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(code).cloned()
    }

    /// Remove a room from the registry, along with any reconnection slots
    /// pointing at it. The room's own lock is not taken here.
    pub async fn destroy(&self, code: &str) -> bool {
        let removed = self.rooms.write().await.remove(code).is_some();
        if removed {
            self.tracker.discard_room(code);
            tracing::info!(room_code = %code, "Room destroyed");
        }
        removed
    }

    /// Summaries of every public room. Room locks are taken one at a time,
    /// after the map lock has been released.
    pub async fn list_public(&self) -> Vec<RoomSummary> {
        let rooms: Vec<SharedRoom> = self.rooms.read().await.values().cloned().collect();
        let mut summaries = Vec::new();
        for shared in rooms {
            let room = shared.lock().await;
            if room.is_public() {
                summaries.push(room.summary());
            }
        }
        summaries.sort_by(|a, b| a.code.cmp(&b.code));
        summaries
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
