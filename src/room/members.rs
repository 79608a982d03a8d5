//! Member registry: who is in a room, with what role, score and presence.
//!
//! All operations run under the owning room's lock; snapshots are value
//! copies and safe to emit after the lock is released.

use std::collections::HashMap;

use uuid::Uuid;

use crate::config::GameConfig;
use crate::protocol::validation::validate_display_name;
use crate::protocol::{ConnId, GameError, MemberId, MemberView, Role};

/// One participant of one room.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub role: Role,
    /// Cumulative score within the current session.
    pub score: u32,
    /// Joined while a game was in progress; plays from the next lobby on.
    pub waiting: bool,
    /// Attached connection, `None` during the reconnection window.
    pub conn: Option<ConnId>,
    /// Points awarded by the most recent question.
    pub last_delta: u32,
    /// Logical timestamp of the latest answer that awarded points.
    pub last_award_ts: Option<u64>,
    /// Join order within the room, used as the final ranking tie-break.
    pub joined_seq: u64,
}

impl Member {
    pub fn view(&self) -> MemberView {
        MemberView {
            id: self.id,
            name: self.name.clone(),
            role: self.role,
            score: self.score,
            waiting: self.waiting,
            connected: self.conn.is_some(),
            last_delta: self.last_delta,
        }
    }

    /// A member eligible to answer in the current session: a non-waiting
    /// player. Presence is not required; disconnected players inside the
    /// grace window still count and are timed out by the deadline.
    pub fn is_active_player(&self) -> bool {
        self.role == Role::Player && !self.waiting
    }
}

/// Registry of the members of a single room.
#[derive(Debug, Default)]
pub struct MemberRegistry {
    members: HashMap<MemberId, Member>,
    next_seq: u64,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. Fails with `NameInvalid` on shape violations,
    /// `NameTaken` on a case-insensitive name clash, and `AdminExists` when
    /// a second administrator is requested.
    pub fn add(
        &mut self,
        name: &str,
        role: Role,
        conn: ConnId,
        waiting: bool,
        config: &GameConfig,
    ) -> Result<&Member, GameError> {
        validate_display_name(name, config)?;
        if self.find_by_name(name).is_some() {
            return Err(GameError::NameTaken);
        }
        if role.is_admin() && self.administrator().is_some() {
            return Err(GameError::AdminExists);
        }

        let id = Uuid::new_v4();
        let seq = self.next_seq;
        self.next_seq += 1;
        let member = Member {
            id,
            name: name.to_string(),
            role,
            score: 0,
            waiting,
            conn: Some(conn),
            last_delta: 0,
            last_award_ts: None,
            joined_seq: seq,
        };
        Ok(&*self.members.entry(id).or_insert(member))
    }

    pub fn remove(&mut self, id: MemberId) -> Option<Member> {
        self.members.remove(&id)
    }

    pub fn find(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    pub fn find_mut(&mut self, id: MemberId) -> Option<&mut Member> {
        self.members.get_mut(&id)
    }

    /// Case-insensitive lookup by display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Member> {
        self.members
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn administrator(&self) -> Option<&Member> {
        self.members.values().find(|m| m.role.is_admin())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Count of members eligible to answer this session.
    pub fn active_player_count(&self) -> usize {
        self.members.values().filter(|m| m.is_active_player()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Member> {
        self.members.values_mut()
    }

    /// Stable, join-ordered sequence of public member views.
    pub fn snapshot(&self) -> Vec<MemberView> {
        let mut members: Vec<&Member> = self.members.values().collect();
        members.sort_by_key(|m| m.joined_seq);
        members.into_iter().map(Member::view).collect()
    }

    pub fn set_waiting(&mut self, id: MemberId, waiting: bool) {
        if let Some(member) = self.members.get_mut(&id) {
            member.waiting = waiting;
        }
    }

    pub fn add_score(&mut self, id: MemberId, delta: u32) {
        if let Some(member) = self.members.get_mut(&id) {
            member.score += delta;
            member.last_delta = delta;
        }
    }

    /// Reset all per-session member state: scores, deltas, award stamps,
    /// waiting flags.
    pub fn reset_scores(&mut self) {
        for member in self.members.values_mut() {
            member.score = 0;
            member.last_delta = 0;
            member.last_award_ts = None;
            member.waiting = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> ConnId {
        Uuid::new_v4()
    }

    #[test]
    fn add_assigns_stable_ids_and_join_order() {
        let config = GameConfig::default();
        let mut registry = MemberRegistry::new();
        let alice = registry
            .add("Alice", Role::Player, conn(), false, &config)
            .unwrap()
            .id;
        let bob = registry
            .add("Bob", Role::Player, conn(), false, &config)
            .unwrap()
            .id;
        assert_ne!(alice, bob);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].name, "Alice");
        assert_eq!(snapshot[1].name, "Bob");
    }

    #[test]
    fn names_are_unique_case_insensitively() {
        let config = GameConfig::default();
        let mut registry = MemberRegistry::new();
        registry
            .add("Alice", Role::Player, conn(), false, &config)
            .unwrap();
        assert_eq!(
            registry
                .add("alice", Role::Player, conn(), false, &config)
                .err(),
            Some(GameError::NameTaken)
        );
        assert!(registry.find_by_name("ALICE").is_some());
    }

    #[test]
    fn at_most_one_administrator() {
        let config = GameConfig::default();
        let mut registry = MemberRegistry::new();
        registry
            .add("Host", Role::Administrator, conn(), false, &config)
            .unwrap();
        assert_eq!(
            registry
                .add("Rival", Role::Administrator, conn(), false, &config)
                .err(),
            Some(GameError::AdminExists)
        );
        // Removing the administrator frees the seat.
        let admin_id = registry.administrator().unwrap().id;
        registry.remove(admin_id);
        assert!(registry
            .add("Rival", Role::Administrator, conn(), false, &config)
            .is_ok());
    }

    #[test]
    fn reset_scores_clears_session_state() {
        let config = GameConfig::default();
        let mut registry = MemberRegistry::new();
        let id = registry
            .add("Alice", Role::Player, conn(), false, &config)
            .unwrap()
            .id;
        registry.add_score(id, 900);
        registry.set_waiting(id, true);
        registry.find_mut(id).unwrap().last_award_ts = Some(7);

        registry.reset_scores();
        let member = registry.find(id).unwrap();
        assert_eq!(member.score, 0);
        assert_eq!(member.last_delta, 0);
        assert_eq!(member.last_award_ts, None);
        assert!(!member.waiting);
    }

    #[test]
    fn active_players_exclude_waiting_and_admin() {
        let config = GameConfig::default();
        let mut registry = MemberRegistry::new();
        registry
            .add("Host", Role::Administrator, conn(), false, &config)
            .unwrap();
        registry
            .add("Alice", Role::Player, conn(), false, &config)
            .unwrap();
        let late = registry
            .add("Bob", Role::Player, conn(), true, &config)
            .unwrap()
            .id;
        assert_eq!(registry.active_player_count(), 1);
        registry.set_waiting(late, false);
        assert_eq!(registry.active_player_count(), 2);
    }
}
