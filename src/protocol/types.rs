use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for room members, stable across reconnects.
pub type MemberId = Uuid;
/// Unique identifier for a single WebSocket connection.
pub type ConnId = Uuid;

/// Length of generated room codes.
pub const ROOM_CODE_LENGTH: usize = 6;
/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// Role of a member within a room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Drives phase transitions; exactly one per room.
    Administrator,
    /// May submit answers.
    Player,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Administrator)
    }
}

/// Discrete stage of a room's game coordinator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Lobby,
    Countdown,
    Question,
    Results,
    Podium,
    Leaderboard,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Lobby => "lobby",
            Phase::Countdown => "countdown",
            Phase::Question => "question",
            Phase::Results => "results",
            Phase::Podium => "podium",
            Phase::Leaderboard => "leaderboard",
        };
        f.write_str(name)
    }
}

/// Public view of a member, safe to broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberView {
    pub id: MemberId,
    pub name: String,
    pub role: Role,
    pub score: u32,
    pub waiting: bool,
    pub connected: bool,
    /// Points awarded by the most recent question.
    pub last_delta: u32,
}

/// Public view of a question: what players see when it opens.
/// Never carries the correct index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionView {
    pub text: String,
    pub options: Vec<String>,
    /// Answer window in whole seconds.
    pub deadline: u64,
}

/// Full question as stored in a room's bank and exchanged with the admin API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    /// Index of the correct option, 0..=3.
    pub correct: u8,
    /// Answer window in whole seconds, 5..=60.
    pub time_limit: u64,
}

impl Question {
    pub fn view(&self) -> QuestionView {
        QuestionView {
            text: self.text.clone(),
            options: self.options.clone(),
            deadline: self.time_limit,
        }
    }
}

/// Summary of a public room for listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomSummary {
    pub code: String,
    pub name: String,
    pub players: usize,
}

/// Room header carried inside `welcome`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: String,
    pub name: String,
    pub public: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One row of a ranking, ordered best first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankingEntry {
    /// 1-based rank.
    pub position: usize,
    pub member_id: MemberId,
    pub name: String,
    pub score: u32,
    /// Points from the most recent question.
    pub delta: u32,
}

/// Coherent snapshot of a room, emitted as the `state` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatePayload {
    pub phase: Phase,
    pub members: Vec<MemberView>,
    /// Present only while a question is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    pub question_index: usize,
    pub total_questions: usize,
}
