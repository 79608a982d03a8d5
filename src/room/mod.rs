//! Room state: one bounded session container.
//!
//! A room exclusively owns its members, question bank, logical clock, game
//! state and broadcast bus, and is always manipulated behind a single
//! `tokio::sync::Mutex`. Event emission happens inside that critical
//! section, which gives every subscriber the same total order of events.

pub mod members;
pub mod questions;

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex, Notify};

use crate::broadcast::RoomBus;
use crate::clock::LogicalClock;
use crate::config::Config;
use crate::fabric::FabricEvent;
use crate::game::GameState;
use crate::protocol::{
    ConnId, GameError, MemberId, Phase, RoomInfo, RoomSummary, Role, ServerFrame, StatePayload,
};
use crate::reconnect::ReconnectionTracker;
use crate::security::PasswordHash;

use members::MemberRegistry;
use questions::QuestionBank;

/// A room behind its lock; the only way rooms are shared.
pub type SharedRoom = Arc<Mutex<Room>>;

pub struct Room {
    code: String,
    name: String,
    public: bool,
    password: Option<PasswordHash>,
    created_at: DateTime<Utc>,
    pub clock: LogicalClock,
    pub members: MemberRegistry,
    pub questions: QuestionBank,
    pub game: GameState,
    bus: RoomBus,
    tracker: Arc<ReconnectionTracker>,
    config: Arc<Config>,
}

impl Room {
    pub fn new(
        code: String,
        name: String,
        public: bool,
        password: Option<&str>,
        fabric_tx: Option<mpsc::UnboundedSender<FabricEvent>>,
        tracker: Arc<ReconnectionTracker>,
        config: Arc<Config>,
    ) -> Self {
        let bus = RoomBus::new(code.clone(), fabric_tx);
        Self {
            code,
            name,
            public,
            password: password.map(PasswordHash::new),
            created_at: Utc::now(),
            clock: LogicalClock::new(),
            members: MemberRegistry::new(),
            questions: QuestionBank::new(),
            game: GameState::new(),
            bus,
            tracker,
            config,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            name: self.name.clone(),
            public: self.public,
            created_at: self.created_at,
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            name: self.name.clone(),
            players: self
                .members
                .iter()
                .filter(|m| m.role == Role::Player)
                .count(),
        }
    }

    /// Check a join attempt against the room's password, if any.
    pub fn verify_password(&self, attempt: Option<&str>) -> Result<(), GameError> {
        match (&self.password, attempt) {
            (None, _) => Ok(()),
            (Some(hash), Some(attempt)) if hash.verify(attempt) => Ok(()),
            (Some(_), _) => Err(GameError::BadPassword),
        }
    }

    /// Coherent snapshot for `state`, `welcome` and reconnect replay.
    pub fn state_payload(&self) -> StatePayload {
        let question = if self.game.phase == Phase::Question {
            self.questions
                .get(self.game.question_index)
                .map(|q| q.view())
        } else {
            None
        };
        StatePayload {
            phase: self.game.phase,
            members: self.members.snapshot(),
            question,
            question_index: self.game.question_index,
            total_questions: self.questions.count(),
        }
    }

    /// Attach a connection as the subscriber for `member_id`.
    pub fn subscribe(
        &mut self,
        member_id: MemberId,
        conn_id: ConnId,
        tx: mpsc::Sender<Bytes>,
        closer: Arc<Notify>,
    ) {
        self.bus.subscribe(member_id, conn_id, tx, closer);
    }

    /// Detach a connection: the member stays registered but enters the
    /// reconnection window. Returns the member id if one was attached.
    pub fn detach_conn(&mut self, conn_id: ConnId) -> Option<MemberId> {
        let member_id = self
            .members
            .iter()
            .find(|m| m.conn == Some(conn_id))
            .map(|m| m.id)?;
        if let Some(member) = self.members.find_mut(member_id) {
            member.conn = None;
        }
        self.bus.unsubscribe_conn(conn_id);
        self.tracker.open(member_id, &self.code);
        tracing::info!(
            room_code = %self.code,
            %member_id,
            "Member detached, reconnection window open"
        );
        Some(member_id)
    }

    /// Remove a member's subscription without opening a reconnection slot
    /// (permanent departures).
    pub fn unsubscribe_member(&mut self, member_id: MemberId) {
        self.bus.unsubscribe_member(member_id);
        self.tracker.discard(member_id);
    }

    pub fn subscriber_conns(&self) -> Vec<ConnId> {
        self.bus.subscriber_conns()
    }

    /// Broadcast a frame to every subscriber, advancing the logical clock.
    /// Returns the emission timestamp.
    pub fn emit(&mut self, frame: &ServerFrame) -> u64 {
        let ts = self.clock.tick();
        let dropped = self.bus.broadcast(frame);
        self.handle_dropped(dropped.into_iter());
        ts
    }

    /// Broadcast to everyone except the listed connections.
    pub fn emit_except(&mut self, excluded: &[ConnId], frame: &ServerFrame) -> u64 {
        let ts = self.clock.tick();
        let dropped = self.bus.broadcast_except(excluded, frame);
        self.handle_dropped(dropped.into_iter());
        ts
    }

    /// Broadcast a frame whose payload carries its own emission timestamp.
    pub fn emit_stamped<F>(&mut self, build: F) -> u64
    where
        F: FnOnce(u64) -> ServerFrame,
    {
        self.emit_stamped_except(&[], build)
    }

    /// Stamped broadcast that skips the listed connections.
    pub fn emit_stamped_except<F>(&mut self, excluded: &[ConnId], build: F) -> u64
    where
        F: FnOnce(u64) -> ServerFrame,
    {
        let ts = self.clock.tick();
        let frame = build(ts);
        let dropped = self.bus.broadcast_except(excluded, &frame);
        self.handle_dropped(dropped.into_iter());
        ts
    }

    /// Connections of members currently flagged as waiting.
    pub fn waiting_member_conns(&self) -> Vec<ConnId> {
        self.members
            .iter()
            .filter(|m| m.waiting)
            .filter_map(|m| m.conn)
            .collect()
    }

    /// Send a targeted frame to one connection. Targeted replies do not
    /// advance the room clock.
    pub fn emit_to(&mut self, conn_id: ConnId, frame: &ServerFrame) {
        let dropped = self.bus.send_to_conn(conn_id, frame);
        self.handle_dropped(dropped.into_iter());
    }

    /// A queue overflow is a disconnect: the member keeps its seat and
    /// enters the reconnection window.
    fn handle_dropped(&mut self, dropped: impl Iterator<Item = (MemberId, ConnId)>) {
        for (member_id, conn_id) in dropped {
            if let Some(member) = self.members.find_mut(member_id) {
                if member.conn == Some(conn_id) {
                    member.conn = None;
                    self.tracker.open(member_id, &self.code);
                    tracing::warn!(
                        room_code = %self.code,
                        %member_id,
                        "Subscriber dropped after queue overflow, reconnection window open"
                    );
                }
            }
        }
    }
}
