//! Room records and the requests that create or edit them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use pokedrafter_draft::validate_name;
use pokedrafter_protocol::{DraftId, RoomId, UserId};
use serde::{Deserialize, Serialize};

use crate::{RoomConfig, RoomError, RoomStatus};

/// A room: a group of participants who will run one draft together.
///
/// The creator is always the first participant and a moderator.
/// `participants` is kept in join order; it becomes the draft's pick order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub creator: UserId,
    pub moderators: BTreeSet<UserId>,
    pub participants: Vec<UserId>,
    pub max_participants: usize,
    pub status: RoomStatus,
    /// Set once the room starts drafting.
    pub draft: Option<DraftId>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn is_participant(&self, user: UserId) -> bool {
        self.participants.contains(&user)
    }

    pub fn is_moderator(&self, user: UserId) -> bool {
        self.moderators.contains(&user)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants
    }
}

/// Request to create a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to the server's [`RoomConfig::max_participants`].
    #[serde(default)]
    pub max_participants: Option<usize>,
}

impl RoomSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            max_participants: None,
        }
    }

    /// Checks the name and resolves the participant cap.
    pub(crate) fn validate(&self, config: &RoomConfig) -> Result<usize, RoomError> {
        validate_name(&self.name).map_err(RoomError::InvalidRoom)?;
        let max = self.max_participants.unwrap_or(config.max_participants);
        check_capacity(max, 1, config)?;
        Ok(max)
    }
}

/// Moderator edit of room metadata. Absent fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub max_participants: Option<usize>,
}

impl RoomUpdate {
    pub(crate) fn validate(&self, room: &Room, config: &RoomConfig) -> Result<(), RoomError> {
        if let Some(name) = &self.name {
            validate_name(name).map_err(RoomError::InvalidRoom)?;
        }
        if let Some(max) = self.max_participants {
            check_capacity(max, room.participants.len().max(1), config)?;
        }
        Ok(())
    }
}

fn check_capacity(max: usize, at_least: usize, config: &RoomConfig) -> Result<(), RoomError> {
    if max < at_least || max > config.max_participants {
        return Err(RoomError::InvalidRoom(format!(
            "max_participants must be between {at_least} and {}, got {max}",
            config.max_participants
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults_to_config_capacity() {
        let config = RoomConfig::default();
        assert_eq!(RoomSpec::new("Friday League").validate(&config).unwrap(), 16);
    }

    #[test]
    fn test_spec_rejects_capacity_above_config() {
        let config = RoomConfig {
            max_participants: 8,
        };
        let mut spec = RoomSpec::new("Friday League");
        spec.max_participants = Some(9);
        assert!(matches!(
            spec.validate(&config),
            Err(RoomError::InvalidRoom(_))
        ));
        spec.max_participants = Some(0);
        assert!(spec.validate(&config).is_err());
    }

    #[test]
    fn test_spec_rejects_short_name() {
        let err = RoomSpec::new("FL").validate(&RoomConfig::default()).unwrap_err();
        assert!(matches!(err, RoomError::InvalidRoom(_)));
    }

    #[test]
    fn test_spec_deserializes_with_defaults() {
        let spec: RoomSpec = serde_json::from_str(r#"{"name":"Friday League"}"#).unwrap();
        assert_eq!(spec, RoomSpec::new("Friday League"));
    }
}
