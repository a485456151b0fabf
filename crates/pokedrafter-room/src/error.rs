//! Error types for the room layer.

use pokedrafter_draft::DraftError;
use pokedrafter_protocol::{RoomId, UserId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// A room request failed validation.
    #[error("invalid room: {0}")]
    InvalidRoom(String),

    #[error("a room named {0:?} already exists")]
    NameTaken(String),

    /// The room has no free participant slots.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("user {0} already in room {1}")]
    AlreadyInRoom(UserId, RoomId),

    #[error("user {0} not in room {1}")]
    NotInRoom(UserId, RoomId),

    /// Only moderators may do this.
    #[error("user {0} is not a moderator of room {1}")]
    NotModerator(UserId, RoomId),

    /// Only the room's creator may do this.
    #[error("user {0} did not create room {1}")]
    NotCreator(UserId, RoomId),

    /// The room is in a state that doesn't allow this operation.
    /// For example, joining a room that is already drafting.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The room hasn't started a draft yet.
    #[error("room {0} has no draft")]
    NoDraft(RoomId),

    #[error(transparent)]
    Draft(#[from] DraftError),
}

impl RoomError {
    /// `true` for rejections of an invalid request, `false` for
    /// infrastructure failures underneath.
    pub fn is_domain(&self) -> bool {
        match self {
            Self::Draft(err) => err.is_domain(),
            _ => true,
        }
    }

    /// Stable name of the error, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "RoomNotFound",
            Self::InvalidRoom(_) => "InvalidRoom",
            Self::NameTaken(_) => "RoomNameTaken",
            Self::RoomFull(_) => "RoomFull",
            Self::AlreadyInRoom(..) => "AlreadyInRoom",
            Self::NotInRoom(..) => "NotInRoom",
            Self::NotModerator(..) => "NotModerator",
            Self::NotCreator(..) => "NotCreator",
            Self::InvalidState(_) => "InvalidRoomState",
            Self::NoDraft(_) => "NoDraft",
            Self::Draft(err) => err.kind(),
        }
    }
}
