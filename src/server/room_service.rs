//! Room lifecycle handlers: listing, creation, joining, leaving, removal.

use crate::game::{self, Actor};
use crate::protocol::{
    room_codes, ConnId, GameError, MemberId, Phase, Role, ServerFrame, WelcomePayload,
};

use super::TrivionServer;

/// Why a member is being permanently removed.
pub(crate) enum Departure {
    /// The member asked to leave.
    Voluntary,
    /// The administrator removed them; carries the kick reason.
    Removed { by: Actor, reason: String },
    /// Their reconnection window expired.
    WindowExpired,
}

impl TrivionServer {
    pub(crate) async fn handle_list_rooms(&self, conn_id: ConnId) {
        let rooms = self.registry().list_public().await;
        self.send_frame_to_conn(conn_id, &ServerFrame::AvailableRooms { rooms });
    }

    pub(crate) async fn handle_create_room(
        &self,
        conn_id: ConnId,
        name: String,
        public: bool,
        password: Option<String>,
    ) {
        let name = name.trim().to_string();
        if name.is_empty() || name.chars().count() > 64 {
            self.send_error_to_conn(conn_id, &GameError::NameInvalid);
            return;
        }

        match self
            .registry()
            .create(&name, public, password.as_deref())
            .await
        {
            Ok((code, _room)) => {
                self.send_frame_to_conn(conn_id, &ServerFrame::RoomCreated { room: name, code });
            }
            Err(e) => self.send_error_to_conn(conn_id, &e),
        }
    }

    pub(crate) async fn handle_join_room(
        &self,
        conn_id: ConnId,
        code: Option<String>,
        name: String,
        password: Option<String>,
        as_admin: bool,
    ) {
        if self.membership_of(conn_id).is_some() {
            self.send_error_to_conn(
                conn_id,
                &GameError::phase_violation("Leave your current room first"),
            );
            return;
        }

        let code = match code.or_else(|| self.url_room_of(conn_id)) {
            Some(code) => code.trim().to_uppercase(),
            None => {
                self.send_error_to_conn(conn_id, &GameError::RoomNotFound);
                return;
            }
        };
        if !room_codes::is_valid_room_code(&code) {
            self.send_error_to_conn(conn_id, &GameError::RoomNotFound);
            return;
        }
        let Some((tx, closer)) = self.conn_channel(conn_id) else {
            return;
        };
        let Some(shared) = self.registry().find(&code).await else {
            self.send_error_to_conn(conn_id, &GameError::RoomNotFound);
            return;
        };

        let mut room = shared.lock().await;
        if let Err(e) = room.verify_password(password.as_deref()) {
            self.send_error_to_conn(conn_id, &e);
            return;
        }

        let role = if as_admin {
            Role::Administrator
        } else {
            Role::Player
        };
        // Players arriving mid-session sit out until the next lobby.
        let waiting = role == Role::Player && room.game.phase != Phase::Lobby;

        let game_config = room.config().game.clone();
        let member = match room.members.add(&name, role, conn_id, waiting, &game_config) {
            Ok(member) => member.view(),
            Err(e) => {
                self.send_error_to_conn(conn_id, &e);
                return;
            }
        };

        room.subscribe(member.id, conn_id, tx, closer);
        let welcome = ServerFrame::Welcome(Box::new(WelcomePayload {
            member: member.clone(),
            room: room.info(),
            state: room.state_payload(),
        }));
        room.emit_to(conn_id, &welcome);

        if waiting {
            room.emit_except(&[conn_id], &ServerFrame::WaitingMember {
                member: member.clone(),
            });
        } else {
            let members = room.members.snapshot();
            room.emit_except(&[conn_id], &ServerFrame::MemberJoined {
                member: member.clone(),
                members,
            });
        }
        drop(room);

        self.set_membership(conn_id, code.clone(), member.id);
        tracing::info!(
            room_code = %code,
            member_id = %member.id,
            member_name = %member.name,
            role = ?member.role,
            waiting,
            "Member joined room"
        );
    }

    pub(crate) async fn handle_leave_room(&self, conn_id: ConnId) {
        let Some(membership) = self.membership_of(conn_id) else {
            self.send_error_to_conn(conn_id, &GameError::NotConnected);
            return;
        };
        let result = self
            .remove_member(
                &membership.room_code,
                membership.member_id,
                Departure::Voluntary,
            )
            .await;
        if let Err(e) = result {
            self.send_error_to_conn(conn_id, &e);
        }
    }

    pub(crate) async fn handle_get_state(&self, conn_id: ConnId) {
        let Some(membership) = self.membership_of(conn_id) else {
            self.send_error_to_conn(conn_id, &GameError::NotConnected);
            return;
        };
        let Some(shared) = self.registry().find(&membership.room_code).await else {
            self.send_error_to_conn(conn_id, &GameError::RoomNotFound);
            return;
        };
        let mut room = shared.lock().await;
        let state = room.state_payload();
        room.emit_to(conn_id, &ServerFrame::State(state));
    }

    /// Permanently remove a member: broadcast `member_left`, collapse an
    /// all-answered question, and close or destroy the room when the
    /// administrator left or nobody remains.
    pub(crate) async fn remove_member(
        &self,
        code: &str,
        member_id: MemberId,
        departure: Departure,
    ) -> Result<(), GameError> {
        let shared = self
            .registry()
            .find(code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        let mut room = shared.lock().await;

        if let Departure::Removed { by, reason } = &departure {
            game::require_admin(&room, *by)?;
            let target = room.members.find(member_id).ok_or(GameError::NotConnected)?;
            if target.role.is_admin() {
                return Err(GameError::not_authorized(
                    "The administrator cannot be removed",
                ));
            }
            if let Some(conn) = target.conn {
                room.emit_to(conn, &ServerFrame::Kicked {
                    reason: reason.clone(),
                });
            }
        }

        let Some(member) = room.members.remove(member_id) else {
            return Err(GameError::NotConnected);
        };
        room.unsubscribe_member(member_id);
        let members = room.members.snapshot();
        room.emit(&ServerFrame::MemberLeft {
            name: member.name.clone(),
            members,
        });
        game::handle_departure(&mut room);

        let admin_left = member.role.is_admin();
        let now_empty = room.members.is_empty();
        drop(room);

        if let Some(conn) = member.conn {
            self.clear_membership(conn);
        }
        tracing::info!(
            room_code = %code,
            %member_id,
            member_name = %member.name,
            voluntary = matches!(departure, Departure::Voluntary),
            "Member removed from room"
        );

        // The session cannot continue without its administrator.
        if admin_left {
            self.close_room(code).await;
        } else if now_empty {
            self.registry().destroy(code).await;
        }
        Ok(())
    }

    /// Destroy a room: tell everyone, detach their connections, drop it
    /// from the registry.
    pub(crate) async fn close_room(&self, code: &str) {
        if let Some(shared) = self.registry().find(code).await {
            let mut room = shared.lock().await;
            room.emit(&ServerFrame::RoomClosed);
            let conns = room.subscriber_conns();
            drop(room);
            for conn in conns {
                self.clear_membership(conn);
            }
        }
        self.registry().destroy(code).await;
    }
}
