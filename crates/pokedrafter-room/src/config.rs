//! Room configuration and lifecycle state.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Server-wide room settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Upper bound on participants per room. A room may ask for fewer.
    pub max_participants: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_participants: 16,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Open → Drafting
/// ```
///
/// - **Open**: accepting joins and leaves. Moderators can be changed.
/// - **Drafting**: a draft was started from a template. Membership is
///   frozen because the participant list became the draft's pick order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Open,
    Drafting,
}

impl RoomStatus {
    /// Returns `true` if membership may still change.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Drafting => write!(f, "Drafting"),
        }
    }
}
