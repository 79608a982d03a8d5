//! Reconnection slots.
//!
//! A disconnected member is not removed immediately: a slot with a short
//! deadline keeps their identity, score and seat reserved. A `reconnect`
//! within the window claims the slot; the sweeper removes members whose
//! slots expired.
//!
//! The tracker is shared by every room and uses a plain mutex so rooms can
//! open slots synchronously while holding their own lock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::protocol::MemberId;

/// Bookkeeping for one disconnected member.
#[derive(Debug, Clone)]
pub struct ReconnectionSlot {
    pub member_id: MemberId,
    pub room_code: String,
    pub deadline: Instant,
}

impl ReconnectionSlot {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Process-wide registry of reconnection slots.
pub struct ReconnectionTracker {
    slots: Mutex<HashMap<MemberId, ReconnectionSlot>>,
    window: Duration,
}

impl ReconnectionTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// Open (or refresh) a slot for a member that just lost its connection.
    /// Callable while holding the owning room's lock.
    pub fn open(&self, member_id: MemberId, room_code: &str) {
        let slot = ReconnectionSlot {
            member_id,
            room_code: room_code.to_string(),
            deadline: Instant::now() + self.window,
        };
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(member_id, slot);
        }
    }

    /// Claim a live slot for a reconnecting member. Expired slots are left
    /// in place for the sweeper, which owns the removal broadcast.
    pub fn claim(&self, member_id: MemberId) -> Option<ReconnectionSlot> {
        let mut slots = self.slots.lock().ok()?;
        match slots.get(&member_id) {
            Some(slot) if !slot.is_expired() => slots.remove(&member_id),
            _ => None,
        }
    }

    /// Drop a slot without claiming it (member left for good).
    pub fn discard(&self, member_id: MemberId) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.remove(&member_id);
        }
    }

    /// Drop every slot belonging to a room that is being destroyed.
    pub fn discard_room(&self, room_code: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.retain(|_, slot| slot.room_code != room_code);
        }
    }

    /// Remove and return every expired slot.
    pub fn take_expired(&self) -> Vec<ReconnectionSlot> {
        let Ok(mut slots) = self.slots.lock() else {
            return Vec::new();
        };
        let expired: Vec<MemberId> = slots
            .iter()
            .filter(|(_, slot)| slot.is_expired())
            .map(|(id, _)| *id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| slots.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test(start_paused = true)]
    async fn claim_succeeds_within_the_window() {
        let tracker = ReconnectionTracker::new(Duration::from_secs(10));
        let member = Uuid::new_v4();
        tracker.open(member, "ABC123");

        tokio::time::advance(Duration::from_secs(9)).await;
        let slot = tracker.claim(member).expect("slot still live");
        assert_eq!(slot.room_code, "ABC123");
        // The slot is gone once claimed.
        assert!(tracker.claim(member).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_slots_cannot_be_claimed_and_go_to_the_sweeper() {
        let tracker = ReconnectionTracker::new(Duration::from_secs(10));
        let member = Uuid::new_v4();
        tracker.open(member, "ABC123");

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(tracker.claim(member).is_none());

        let expired = tracker.take_expired();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].member_id, member);
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reopening_refreshes_the_deadline() {
        let tracker = ReconnectionTracker::new(Duration::from_secs(10));
        let member = Uuid::new_v4();
        tracker.open(member, "ABC123");
        tokio::time::advance(Duration::from_secs(8)).await;
        tracker.open(member, "ABC123");
        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(tracker.claim(member).is_some());
    }

    #[tokio::test]
    async fn discard_room_drops_only_that_rooms_slots() {
        let tracker = ReconnectionTracker::new(Duration::from_secs(10));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        tracker.open(a, "AAAAAA");
        tracker.open(b, "BBBBBB");
        tracker.discard_room("AAAAAA");
        assert!(tracker.claim(a).is_none());
        assert!(tracker.claim(b).is_some());
    }
}
