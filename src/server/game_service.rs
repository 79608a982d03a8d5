//! Game command handlers: administrator controls and player answers.
//!
//! Every handler resolves the connection's membership, forwards to the
//! coordinator, and answers failures with a targeted `error` frame.

use crate::game::{self, Actor};
use crate::protocol::{ConnId, GameError, MemberId};

use super::room_service::Departure;
use super::TrivionServer;

impl TrivionServer {
    pub(crate) async fn handle_start_game(&self, conn_id: ConnId) {
        let Some(m) = self.membership_of(conn_id) else {
            self.send_error_to_conn(conn_id, &GameError::NotConnected);
            return;
        };
        let result =
            game::start_game(self.registry(), &m.room_code, Actor::Member(m.member_id)).await;
        if let Err(e) = result {
            self.send_error_to_conn(conn_id, &e);
        }
    }

    pub(crate) async fn handle_next(&self, conn_id: ConnId) {
        let Some(m) = self.membership_of(conn_id) else {
            self.send_error_to_conn(conn_id, &GameError::NotConnected);
            return;
        };
        let result = game::advance(self.registry(), &m.room_code, Actor::Member(m.member_id)).await;
        if let Err(e) = result {
            self.send_error_to_conn(conn_id, &e);
        }
    }

    pub(crate) async fn handle_show_leaderboard(&self, conn_id: ConnId) {
        let Some(m) = self.membership_of(conn_id) else {
            self.send_error_to_conn(conn_id, &GameError::NotConnected);
            return;
        };
        let result =
            game::show_leaderboard(self.registry(), &m.room_code, Actor::Member(m.member_id)).await;
        if let Err(e) = result {
            self.send_error_to_conn(conn_id, &e);
        }
    }

    pub(crate) async fn handle_end_game(&self, conn_id: ConnId) {
        let Some(m) = self.membership_of(conn_id) else {
            self.send_error_to_conn(conn_id, &GameError::NotConnected);
            return;
        };
        let result =
            game::end_game(self.registry(), &m.room_code, Actor::Member(m.member_id)).await;
        if let Err(e) = result {
            self.send_error_to_conn(conn_id, &e);
        }
    }

    pub(crate) async fn handle_back_to_lobby(&self, conn_id: ConnId) {
        let Some(m) = self.membership_of(conn_id) else {
            self.send_error_to_conn(conn_id, &GameError::NotConnected);
            return;
        };
        let result =
            game::back_to_lobby(self.registry(), &m.room_code, Actor::Member(m.member_id)).await;
        if let Err(e) = result {
            self.send_error_to_conn(conn_id, &e);
        }
    }

    pub(crate) async fn handle_remove_member(&self, conn_id: ConnId, target: MemberId) {
        let Some(m) = self.membership_of(conn_id) else {
            self.send_error_to_conn(conn_id, &GameError::NotConnected);
            return;
        };
        let result = self
            .remove_member(
                &m.room_code,
                target,
                Departure::Removed {
                    by: Actor::Member(m.member_id),
                    reason: "Removed by the administrator".to_string(),
                },
            )
            .await;
        if let Err(e) = result {
            self.send_error_to_conn(conn_id, &e);
        }
    }

    pub(crate) async fn handle_answer(&self, conn_id: ConnId, choice: u8, timestamp: u64) {
        let Some(m) = self.membership_of(conn_id) else {
            self.send_error_to_conn(conn_id, &GameError::NotConnected);
            return;
        };
        let result = game::submit_answer(
            self.registry(),
            &m.room_code,
            m.member_id,
            choice,
            timestamp,
        )
        .await;
        if let Err(e) = result {
            self.send_error_to_conn(conn_id, &e);
        }
    }
}
