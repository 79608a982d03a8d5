//! Broadcast fan-out for room events.
//!
//! Frames emitted inside a room's critical section are serialized once and
//! the bytes pushed onto every subscriber's bounded queue, so all
//! subscribers observe the same order. A slow subscriber never blocks the
//! room: a full queue drops that subscriber and surfaces a disconnect.

use std::sync::Arc;

use bytes::Bytes;
use smallvec::SmallVec;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Notify;

use crate::fabric::FabricEvent;
use crate::protocol::{ConnId, MemberId, ServerFrame};

/// Subscribers dropped by one emission; stack-allocated for the common case
/// of none or one.
pub type DroppedSubscribers = SmallVec<[(MemberId, ConnId); 2]>;

/// One attached connection interested in a room's events.
struct Subscriber {
    member_id: MemberId,
    conn_id: ConnId,
    tx: mpsc::Sender<Bytes>,
    /// Wakes the owning connection task so a dropped subscriber's socket
    /// closes promptly instead of idling until the heartbeat timeout.
    closer: Arc<Notify>,
}

/// Typed fan-out for one room. Keyed by member identifier plus connection
/// handle; the administrator subscribes like everyone else.
pub struct RoomBus {
    room_code: String,
    subscribers: Vec<Subscriber>,
    fabric_tx: Option<mpsc::UnboundedSender<FabricEvent>>,
}

impl RoomBus {
    pub fn new(
        room_code: String,
        fabric_tx: Option<mpsc::UnboundedSender<FabricEvent>>,
    ) -> Self {
        Self {
            room_code,
            subscribers: Vec::new(),
            fabric_tx,
        }
    }

    pub fn subscribe(
        &mut self,
        member_id: MemberId,
        conn_id: ConnId,
        tx: mpsc::Sender<Bytes>,
        closer: Arc<Notify>,
    ) {
        // A reconnect replaces any stale subscription for the same member.
        self.subscribers.retain(|s| s.member_id != member_id);
        self.subscribers.push(Subscriber {
            member_id,
            conn_id,
            tx,
            closer,
        });
    }

    pub fn unsubscribe_conn(&mut self, conn_id: ConnId) {
        self.subscribers.retain(|s| s.conn_id != conn_id);
    }

    pub fn unsubscribe_member(&mut self, member_id: MemberId) {
        self.subscribers.retain(|s| s.member_id != member_id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Connection handles of every current subscriber.
    pub fn subscriber_conns(&self) -> Vec<ConnId> {
        self.subscribers.iter().map(|s| s.conn_id).collect()
    }

    /// Serialize `frame` once and deliver it to every subscriber in order.
    /// Returns the subscribers whose queues overflowed; they have already
    /// been unsubscribed and their connections told to close.
    #[must_use]
    pub fn broadcast(&mut self, frame: &ServerFrame) -> DroppedSubscribers {
        self.broadcast_except(&[], frame)
    }

    /// Like [`RoomBus::broadcast`], skipping the listed connections (used to
    /// keep `question` frames away from waiting members).
    #[must_use]
    pub fn broadcast_except(
        &mut self,
        excluded: &[ConnId],
        frame: &ServerFrame,
    ) -> DroppedSubscribers {
        let mut dropped = DroppedSubscribers::new();
        let Some(bytes) = serialize_frame(frame) else {
            return dropped;
        };

        for subscriber in &self.subscribers {
            if excluded.contains(&subscriber.conn_id) {
                continue;
            }
            match subscriber.tx.try_send(bytes.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                    tracing::warn!(
                        room_code = %self.room_code,
                        member_id = %subscriber.member_id,
                        tag = frame.tag(),
                        "Subscriber queue overflow, dropping subscriber"
                    );
                    subscriber.closer.notify_one();
                    dropped.push((subscriber.member_id, subscriber.conn_id));
                }
            }
        }
        if !dropped.is_empty() {
            self.subscribers
                .retain(|s| !dropped.iter().any(|(_, conn)| *conn == s.conn_id));
        }

        if let Some(fabric_tx) = &self.fabric_tx {
            let _ = fabric_tx.send(FabricEvent {
                room_code: self.room_code.clone(),
                tag: frame.tag(),
                frame: bytes,
            });
        }

        dropped
    }

    /// Deliver a frame to a single subscriber without touching the others.
    /// Returns the subscriber if its queue overflowed.
    pub fn send_to_conn(
        &mut self,
        conn_id: ConnId,
        frame: &ServerFrame,
    ) -> Option<(MemberId, ConnId)> {
        let bytes = serialize_frame(frame)?;
        let subscriber = self.subscribers.iter().find(|s| s.conn_id == conn_id)?;
        match subscriber.tx.try_send(bytes) {
            Ok(()) => None,
            Err(_) => {
                let dropped = (subscriber.member_id, subscriber.conn_id);
                subscriber.closer.notify_one();
                self.subscribers.retain(|s| s.conn_id != conn_id);
                Some(dropped)
            }
        }
    }
}

/// Serialize a frame to its wire bytes. Serialization of our own types only
/// fails on a bug; log and skip rather than poisoning the room.
pub fn serialize_frame(frame: &ServerFrame) -> Option<Bytes> {
    match serde_json::to_vec(frame) {
        Ok(bytes) => Some(Bytes::from(bytes)),
        Err(e) => {
            tracing::error!(tag = frame.tag(), error = %e, "Failed to serialize frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn subscriber_channel(capacity: usize) -> (mpsc::Sender<Bytes>, mpsc::Receiver<Bytes>) {
        mpsc::channel(capacity)
    }

    #[tokio::test]
    async fn frames_arrive_in_emission_order() {
        let mut bus = RoomBus::new("ABC123".into(), None);
        let (tx, mut rx) = subscriber_channel(8);
        bus.subscribe(Uuid::new_v4(), Uuid::new_v4(), tx, Arc::new(Notify::new()));

        for seconds in 1..=3 {
            let dropped = bus.broadcast(&ServerFrame::Countdown { seconds });
            assert!(dropped.is_empty());
        }

        for seconds in 1..=3u64 {
            let bytes = rx.recv().await.unwrap();
            let frame: ServerFrame = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(frame, ServerFrame::Countdown { seconds });
        }
    }

    #[tokio::test]
    async fn overflowing_subscriber_is_dropped_without_blocking_others() {
        let mut bus = RoomBus::new("ABC123".into(), None);
        let slow_member = Uuid::new_v4();
        let (slow_tx, _slow_rx) = subscriber_channel(1);
        let (fast_tx, mut fast_rx) = subscriber_channel(8);
        bus.subscribe(slow_member, Uuid::new_v4(), slow_tx, Arc::new(Notify::new()));
        bus.subscribe(Uuid::new_v4(), Uuid::new_v4(), fast_tx, Arc::new(Notify::new()));

        assert!(bus.broadcast(&ServerFrame::PingHeartbeat).is_empty());
        // The slow queue is now full; the next emission drops only that
        // subscriber.
        let dropped = bus.broadcast(&ServerFrame::PingHeartbeat);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].0, slow_member);
        assert_eq!(bus.subscriber_count(), 1);

        // The fast subscriber saw both frames.
        assert!(fast_rx.recv().await.is_some());
        assert!(fast_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn resubscribing_a_member_replaces_the_old_connection() {
        let mut bus = RoomBus::new("ABC123".into(), None);
        let member = Uuid::new_v4();
        let (old_tx, mut old_rx) = subscriber_channel(8);
        let (new_tx, mut new_rx) = subscriber_channel(8);
        bus.subscribe(member, Uuid::new_v4(), old_tx, Arc::new(Notify::new()));
        bus.subscribe(member, Uuid::new_v4(), new_tx, Arc::new(Notify::new()));
        assert_eq!(bus.subscriber_count(), 1);

        let _ = bus.broadcast(&ServerFrame::PingHeartbeat);
        assert!(new_rx.recv().await.is_some());
        assert!(old_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcasts_are_forwarded_to_the_fabric() {
        let (fabric_tx, mut fabric_rx) = mpsc::unbounded_channel();
        let mut bus = RoomBus::new("ABC123".into(), Some(fabric_tx));
        let _ = bus.broadcast(&ServerFrame::RoomClosed);

        let event = fabric_rx.recv().await.unwrap();
        assert_eq!(event.room_code, "ABC123");
        assert_eq!(event.tag, "room_closed");
    }
}
