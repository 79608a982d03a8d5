//! Wire protocol: frame unions, shared types, validation, room codes.
//!
//! Frames are text JSON of the shape `{tag, payload}`; the tag space is a
//! closed union on both directions. Unknown inbound tags fail to parse and
//! are answered with a targeted `error` frame.

pub mod errors;
pub mod messages;
pub mod room_codes;
pub mod types;
pub mod validation;

pub use errors::GameError;
pub use messages::{ClientFrame, ServerFrame, WelcomePayload};
pub use types::{
    ConnId, MemberId, MemberView, Phase, Question, QuestionView, RankingEntry, Role, RoomInfo,
    RoomSummary, StatePayload, OPTION_COUNT, ROOM_CODE_LENGTH,
};
