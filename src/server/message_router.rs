//! Dispatch of inbound client frames to their handlers.

use crate::protocol::{ClientFrame, ConnId};

use super::TrivionServer;

impl TrivionServer {
    /// Route one parsed client frame. `pong_heartbeat` never reaches this
    /// point; the connection task consumes it.
    pub async fn handle_frame(&self, conn_id: ConnId, frame: ClientFrame) {
        match frame {
            ClientFrame::ListRooms => {
                self.handle_list_rooms(conn_id).await;
            }
            ClientFrame::CreateRoom {
                name,
                public,
                password,
            } => {
                self.handle_create_room(conn_id, name, public, password)
                    .await;
            }
            ClientFrame::JoinRoom {
                code,
                name,
                password,
                as_admin,
            } => {
                self.handle_join_room(conn_id, code, name, password, as_admin)
                    .await;
            }
            ClientFrame::LeaveRoom => {
                self.handle_leave_room(conn_id).await;
            }
            ClientFrame::Reconnect { member_id } => {
                self.handle_reconnect(conn_id, member_id).await;
            }
            ClientFrame::Answer { choice, timestamp } => {
                self.handle_answer(conn_id, choice, timestamp).await;
            }
            ClientFrame::GetState => {
                self.handle_get_state(conn_id).await;
            }
            ClientFrame::PongHeartbeat => {
                // Handled inline by the connection task.
            }
            ClientFrame::StartGame => {
                self.handle_start_game(conn_id).await;
            }
            ClientFrame::Next => {
                self.handle_next(conn_id).await;
            }
            ClientFrame::ShowLeaderboard => {
                self.handle_show_leaderboard(conn_id).await;
            }
            ClientFrame::EndGame => {
                self.handle_end_game(conn_id).await;
            }
            ClientFrame::BackToLobby => {
                self.handle_back_to_lobby(conn_id).await;
            }
            ClientFrame::RemoveMember { member_id } => {
                self.handle_remove_member(conn_id, member_id).await;
            }
        }
    }
}
