use thiserror::Error;

/// Errors raised by room and game operations.
///
/// Every variant maps to a targeted `error` frame on the originating
/// connection; none of them abort the room. The password variants keep the
/// product's Portuguese user copy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Display names must be 1-20 printable characters")]
    NameInvalid,

    #[error("That name is already taken in this room")]
    NameTaken,

    #[error("This room already has an administrator")]
    AdminExists,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Esta sala é protegida por senha; informe a senha correta")]
    BadPassword,

    #[error("{reason}")]
    PhaseViolation { reason: String },

    #[error("{reason}")]
    NotAuthorized { reason: String },

    #[error("You already answered this question")]
    AlreadyAnswered,

    #[error("Answer choice must be between 0 and 3")]
    OptionOutOfRange,

    #[error("No free room codes available, try again later")]
    CapacityExhausted,

    #[error("Join a room first")]
    NotConnected,

    #[error("{reason}")]
    QuestionInvalid { reason: String },
}

impl GameError {
    pub fn phase_violation(reason: impl Into<String>) -> Self {
        GameError::PhaseViolation {
            reason: reason.into(),
        }
    }

    pub fn not_authorized(reason: impl Into<String>) -> Self {
        GameError::NotAuthorized {
            reason: reason.into(),
        }
    }

    pub fn question_invalid(reason: impl Into<String>) -> Self {
        GameError::QuestionInvalid {
            reason: reason.into(),
        }
    }
}
