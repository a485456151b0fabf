//! Error types for the draft layer.
//!
//! Two families live here and must not be confused:
//!
//! - **Domain rejections** ([`PickError`] and most [`DraftError`] variants)
//!   are deterministic: the request broke a draft rule and resubmitting it
//!   unchanged will fail the same way.
//! - **Infrastructure failures** ([`StoreError`], [`DraftError::Unavailable`])
//!   mean the draft could not be read or written. They are reported as-is
//!   and never retried inside this crate.

use pokedrafter_protocol::{DraftId, RoomId, TemplateId, UserId};

/// Why a pick was rejected. Checks run in declaration order; the first
/// failure wins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PickError {
    /// The draft is not accepting picks.
    #[error("draft {0} is not active")]
    NotActive(DraftId),

    /// Someone other than the current picker tried to pick.
    #[error("not {participant}'s turn to pick")]
    NotYourTurn {
        participant: UserId,
        current: Option<UserId>,
    },

    /// The entry is not on the draft board.
    #[error("{0} is not on the draft board")]
    UnknownEntry(String),

    /// The entry already belongs to a participant.
    #[error("{entry} was already picked by {by}")]
    AlreadyPicked { entry: String, by: UserId },

    /// The pick would push the participant's score past the point limit.
    #[error("{participant} has {score} points; {entry} costs {cost}, limit is {limit}")]
    PointLimitExceeded {
        participant: UserId,
        entry: String,
        score: u32,
        cost: u32,
        limit: u32,
    },

    /// The participant already holds `limit` picks.
    #[error("{participant} already has {limit} picks")]
    PickLimitExceeded { participant: UserId, limit: u32 },
}

impl PickError {
    /// Stable name of the rejection, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotActive(_) => "NotActive",
            Self::NotYourTurn { .. } => "NotYourTurn",
            Self::UnknownEntry(_) => "UnknownEntry",
            Self::AlreadyPicked { .. } => "AlreadyPicked",
            Self::PointLimitExceeded { .. } => "PointLimitExceeded",
            Self::PickLimitExceeded { .. } => "PickLimitExceeded",
        }
    }
}

/// Failures of the persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another writer stored a newer revision first.
    #[error("draft {id} changed underneath: expected revision {expected}, found {found}")]
    Conflict { id: DraftId, expected: u64, found: u64 },

    /// A document with this key already exists.
    #[error("duplicate document: {0}")]
    Duplicate(String),

    /// A replace targeted a document that doesn't exist.
    #[error("document missing: {0}")]
    Missing(String),

    /// A stored document could not be encoded or decoded.
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The SQLite backend failed.
    #[cfg(feature = "sqlite")]
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The blocking task running a database call panicked or was cancelled.
    #[error("store worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Errors returned by draft and template operations.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// A pick was rejected by the validator.
    #[error(transparent)]
    Pick(#[from] PickError),

    #[error("draft {0} not found")]
    NotFound(DraftId),

    #[error("template {0} not found")]
    TemplateNotFound(TemplateId),

    /// The room already references a draft.
    #[error("room {room} already has draft {draft}")]
    RoomAlreadyHasDraft { room: RoomId, draft: DraftId },

    /// A draft needs at least one participant to pick.
    #[error("room {0} has no participants to draft")]
    InsufficientParticipants(RoomId),

    /// The participant list names someone twice.
    #[error("participant {0} listed more than once")]
    DuplicateParticipant(UserId),

    /// A template request failed validation.
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// A board has an entry in two tiers.
    #[error("invalid draft board: {0}")]
    InvalidBoard(String),

    #[error("a template named {0:?} already exists")]
    TemplateNameTaken(String),

    /// Templates are frozen once a draft has been started from them.
    #[error("template {0} is in use by a draft")]
    TemplateInUse(TemplateId),

    #[error("{editor} does not own template {template}")]
    NotTemplateOwner { template: TemplateId, editor: UserId },

    /// A moderator edit would break a draft invariant.
    #[error("invalid draft update: {0}")]
    InvalidUpdate(String),

    /// The draft's actor is gone or its command channel is full.
    #[error("draft {0} is unavailable")]
    Unavailable(DraftId),

    /// The persistence backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DraftError {
    /// `true` for deterministic rejections of an invalid request, `false`
    /// for infrastructure failures.
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Unavailable(_) | Self::Store(_))
    }

    /// Stable name of the error, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pick(e) => e.kind(),
            Self::NotFound(_) => "NotFound",
            Self::TemplateNotFound(_) => "TemplateNotFound",
            Self::RoomAlreadyHasDraft { .. } => "RoomAlreadyHasDraft",
            Self::InsufficientParticipants(_) => "InsufficientParticipants",
            Self::DuplicateParticipant(_) => "DuplicateParticipant",
            Self::InvalidTemplate(_) => "InvalidTemplate",
            Self::InvalidBoard(_) => "InvalidBoard",
            Self::TemplateNameTaken(_) => "TemplateNameTaken",
            Self::TemplateInUse(_) => "TemplateInUse",
            Self::NotTemplateOwner { .. } => "NotTemplateOwner",
            Self::InvalidUpdate(_) => "InvalidUpdate",
            Self::Unavailable(_) | Self::Store(_) => "Unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_error_converts_and_keeps_kind() {
        let err: DraftError = PickError::UnknownEntry("Mew".into()).into();
        assert_eq!(err.kind(), "UnknownEntry");
        assert!(err.is_domain());
        assert_eq!(err.to_string(), "Mew is not on the draft board");
    }

    #[test]
    fn test_store_errors_are_not_domain_errors() {
        let err: DraftError = StoreError::Missing("draft D-1".into()).into();
        assert!(!err.is_domain());
        assert_eq!(err.kind(), "Unavailable");
        assert!(!DraftError::Unavailable(DraftId(1)).is_domain());
    }

    #[test]
    fn test_point_limit_message_names_the_numbers() {
        let err = PickError::PointLimitExceeded {
            participant: UserId(2),
            entry: "Foo".into(),
            score: 6,
            cost: 5,
            limit: 10,
        };
        assert_eq!(err.to_string(), "U-2 has 6 points; Foo costs 5, limit is 10");
    }
}
