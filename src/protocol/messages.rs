use serde::{Deserialize, Serialize};

use super::types::{
    MemberId, MemberView, QuestionView, RankingEntry, RoomInfo, RoomSummary, StatePayload,
};

/// Frames sent from client to server.
///
/// Wire shape is `{tag, payload}`; tags unknown to this union are rejected
/// with a targeted `error` frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tag", content = "payload", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Request the public room listing.
    ListRooms,
    /// Create a room; the creator still joins via `join_room`.
    CreateRoom {
        name: String,
        #[serde(default = "default_public")]
        public: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    /// Join a room by code. `code` may be omitted when the connection URL
    /// already carried one.
    JoinRoom {
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        #[serde(default)]
        as_admin: bool,
    },
    /// Leave the current room permanently (no reconnection window).
    LeaveRoom,
    /// Resume a member identity within the grace window.
    Reconnect { member_id: MemberId },
    /// Submit an answer; `timestamp` echoes the latest logical clock value
    /// the client observed.
    Answer { choice: u8, timestamp: u64 },
    /// Request a full state snapshot on this connection.
    GetState,
    /// Reply to `ping_heartbeat`.
    PongHeartbeat,

    // Administrator commands.
    /// Begin the session: lobby -> countdown.
    StartGame,
    /// Advance past results: next question or the podium.
    Next,
    /// Skip straight to the leaderboard.
    ShowLeaderboard,
    /// Abort the session from any phase.
    EndGame,
    /// Leave the leaderboard and return to the lobby.
    BackToLobby,
    /// Remove a member from the room.
    RemoveMember { member_id: MemberId },
}

fn default_public() -> bool {
    true
}

/// Frames sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tag", content = "payload", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Public room listing.
    AvailableRooms { rooms: Vec<RoomSummary> },
    /// Room created; `room` is the display name.
    RoomCreated { room: String, code: String },
    /// Targeted reply to a successful join (boxed to reduce enum size).
    Welcome(Box<WelcomePayload>),
    /// Targeted reply to a successful reconnect.
    ReconnectSuccess {
        member_id: MemberId,
        name: String,
        room_code: String,
        score: u32,
        waiting: bool,
    },
    /// Targeted reply when the reconnection window has already closed.
    ReconnectFailed,
    /// Full room snapshot.
    State(StatePayload),
    /// Another member joined the lobby.
    MemberJoined {
        member: MemberView,
        members: Vec<MemberView>,
    },
    /// A member left permanently.
    MemberLeft {
        name: String,
        members: Vec<MemberView>,
    },
    /// A member joined mid-session and is waiting for the next game.
    WaitingMember { member: MemberView },
    /// Countdown to the next question.
    Countdown { seconds: u64 },
    /// A question opened.
    Question {
        question: QuestionView,
        /// 1-based question number.
        number: usize,
        total: usize,
        /// Logical timestamp of the emission; clients echo it in answers.
        timestamp: u64,
    },
    /// Progress while a question is open.
    PlayerAnswered { answered: usize, total: usize },
    /// Per-question results.
    Results {
        ranking: Vec<RankingEntry>,
        correct: u8,
        /// Answer count per option index.
        stats: [u32; 4],
    },
    /// The podium reveal is starting.
    PodiumStart,
    /// One podium position revealed, bottom-up.
    PodiumPosition { position: usize, member: MemberView },
    /// Reveal finished; full final ranking.
    PodiumComplete { ranking: Vec<RankingEntry> },
    /// Session over, room back in the lobby.
    GameEnded { members: Vec<MemberView> },
    /// The room was destroyed.
    RoomClosed,
    /// This member was removed by the administrator.
    Kicked { reason: String },
    /// Heartbeat probe; clients must answer `pong_heartbeat`.
    PingHeartbeat,
    /// Targeted error, sent only to the originating connection.
    Error { message: String },
}

/// Payload for the `welcome` frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WelcomePayload {
    pub member: MemberView,
    pub room: RoomInfo,
    pub state: StatePayload,
}

impl ServerFrame {
    /// Short tag name for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            ServerFrame::AvailableRooms { .. } => "available_rooms",
            ServerFrame::RoomCreated { .. } => "room_created",
            ServerFrame::Welcome(_) => "welcome",
            ServerFrame::ReconnectSuccess { .. } => "reconnect_success",
            ServerFrame::ReconnectFailed => "reconnect_failed",
            ServerFrame::State(_) => "state",
            ServerFrame::MemberJoined { .. } => "member_joined",
            ServerFrame::MemberLeft { .. } => "member_left",
            ServerFrame::WaitingMember { .. } => "waiting_member",
            ServerFrame::Countdown { .. } => "countdown",
            ServerFrame::Question { .. } => "question",
            ServerFrame::PlayerAnswered { .. } => "player_answered",
            ServerFrame::Results { .. } => "results",
            ServerFrame::PodiumStart => "podium_start",
            ServerFrame::PodiumPosition { .. } => "podium_position",
            ServerFrame::PodiumComplete { .. } => "podium_complete",
            ServerFrame::GameEnded { .. } => "game_ended",
            ServerFrame::RoomClosed => "room_closed",
            ServerFrame::Kicked { .. } => "kicked",
            ServerFrame::PingHeartbeat => "ping_heartbeat",
            ServerFrame::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_frames_use_tag_payload_shape() {
        let frame: ClientFrame = serde_json::from_value(json!({
            "tag": "join_room",
            "payload": {"code": "ABC123", "name": "Alice"}
        }))
        .unwrap();
        assert_eq!(
            frame,
            ClientFrame::JoinRoom {
                code: Some("ABC123".into()),
                name: "Alice".into(),
                password: None,
                as_admin: false,
            }
        );
    }

    #[test]
    fn unit_tags_need_no_payload() {
        let frame: ClientFrame = serde_json::from_value(json!({"tag": "list_rooms"})).unwrap();
        assert_eq!(frame, ClientFrame::ListRooms);

        let frame: ClientFrame =
            serde_json::from_value(json!({"tag": "pong_heartbeat"})).unwrap();
        assert_eq!(frame, ClientFrame::PongHeartbeat);
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let result = serde_json::from_value::<ClientFrame>(json!({"tag": "shrug"}));
        assert!(result.is_err());
    }

    #[test]
    fn server_frames_serialize_snake_case_tags() {
        let value = serde_json::to_value(ServerFrame::PlayerAnswered {
            answered: 1,
            total: 2,
        })
        .unwrap();
        assert_eq!(value["tag"], "player_answered");
        assert_eq!(value["payload"]["answered"], 1);

        let value = serde_json::to_value(ServerFrame::PingHeartbeat).unwrap();
        assert_eq!(value["tag"], "ping_heartbeat");
    }

    #[test]
    fn answer_carries_choice_and_clock_echo() {
        let frame: ClientFrame = serde_json::from_value(json!({
            "tag": "answer",
            "payload": {"choice": 2, "timestamp": 17}
        }))
        .unwrap();
        assert_eq!(
            frame,
            ClientFrame::Answer {
                choice: 2,
                timestamp: 17
            }
        );
    }
}
