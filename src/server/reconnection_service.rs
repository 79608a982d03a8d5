//! Reconnection handling: slot claims and the expiry sweeper.

use std::sync::Arc;

use crate::protocol::{ConnId, GameError, MemberId, ServerFrame};

use super::room_service::Departure;
use super::TrivionServer;

impl TrivionServer {
    /// `reconnect {member_id}`: swap the member's connection handle for the
    /// new one and replay a full state snapshot on it.
    pub(crate) async fn handle_reconnect(&self, conn_id: ConnId, member_id: MemberId) {
        if self.membership_of(conn_id).is_some() {
            self.send_error_to_conn(
                conn_id,
                &GameError::phase_violation("Leave your current room first"),
            );
            return;
        }
        let Some((tx, closer)) = self.conn_channel(conn_id) else {
            return;
        };

        let Some(slot) = self.tracker().claim(member_id) else {
            self.send_frame_to_conn(conn_id, &ServerFrame::ReconnectFailed);
            return;
        };
        let Some(shared) = self.registry().find(&slot.room_code).await else {
            self.send_frame_to_conn(conn_id, &ServerFrame::ReconnectFailed);
            return;
        };

        let mut room = shared.lock().await;
        let Some(member) = room.members.find_mut(member_id) else {
            drop(room);
            self.send_frame_to_conn(conn_id, &ServerFrame::ReconnectFailed);
            return;
        };
        member.conn = Some(conn_id);
        let (name, score, waiting) = (member.name.clone(), member.score, member.waiting);

        room.subscribe(member_id, conn_id, tx, closer);
        room.emit_to(
            conn_id,
            &ServerFrame::ReconnectSuccess {
                member_id,
                name: name.clone(),
                room_code: slot.room_code.clone(),
                score,
                waiting,
            },
        );
        let state = room.state_payload();
        room.emit_to(conn_id, &ServerFrame::State(state));
        drop(room);

        self.set_membership(conn_id, slot.room_code.clone(), member_id);
        tracing::info!(
            room_code = %slot.room_code,
            %member_id,
            member_name = %name,
            "Member reconnected"
        );
    }

    /// Background task that removes members whose reconnection window
    /// expired. One sweeper per process.
    pub fn spawn_reconnect_sweeper(self: &Arc<Self>) {
        let server = self.clone();
        let interval = server.config().server.reconnect_sweep_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                for slot in server.tracker().take_expired() {
                    tracing::info!(
                        room_code = %slot.room_code,
                        member_id = %slot.member_id,
                        "Reconnection window expired, removing member"
                    );
                    let _ = server
                        .remove_member(&slot.room_code, slot.member_id, Departure::WindowExpired)
                        .await;
                }
            }
        });
    }
}
