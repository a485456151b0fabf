//! Draft templates: reusable board + limits + rules used to start drafts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pokedrafter_protocol::{TemplateId, UserId};
use serde::{Deserialize, Serialize};

use crate::{DraftBoard, DraftError};

/// Default point budget per participant.
pub const DEFAULT_POINT_LIMIT: u32 = 115;

/// Default number of picks per participant.
pub const DEFAULT_PICK_LIMIT: u32 = 12;

const NAME_MIN_CHARS: usize = 3;
const NAME_MAX_CHARS: usize = 50;

/// A named, reusable draft configuration.
///
/// Owned by its creator. Once a draft has been instantiated from it the
/// template is frozen; drafts copy what they need and never point back
/// at live template fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub creator: UserId,
    pub point_limit: u32,
    pub pick_limit: u32,
    #[serde(default)]
    pub rules: String,
    #[serde(default)]
    pub bans: Vec<String>,
    #[serde(default)]
    pub tera_bans: Vec<String>,
    #[serde(default)]
    pub tera_captains: BTreeMap<UserId, Vec<String>>,
    pub draft_board: DraftBoard,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a template.
///
/// Limits fall back to 115 points / 12 picks when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_point_limit")]
    pub point_limit: u32,
    #[serde(default = "default_pick_limit")]
    pub pick_limit: u32,
    #[serde(default)]
    pub rules: String,
    #[serde(default)]
    pub bans: Vec<String>,
    #[serde(default)]
    pub tera_bans: Vec<String>,
    #[serde(default)]
    pub tera_captains: BTreeMap<UserId, Vec<String>>,
    #[serde(default)]
    pub draft_board: DraftBoard,
}

fn default_point_limit() -> u32 {
    DEFAULT_POINT_LIMIT
}

fn default_pick_limit() -> u32 {
    DEFAULT_PICK_LIMIT
}

impl TemplateSpec {
    /// A spec with the given name and board and every other field at its
    /// default.
    pub fn new(name: impl Into<String>, draft_board: DraftBoard) -> Self {
        Self {
            name: name.into(),
            description: None,
            point_limit: DEFAULT_POINT_LIMIT,
            pick_limit: DEFAULT_PICK_LIMIT,
            rules: String::new(),
            bans: Vec::new(),
            tera_bans: Vec::new(),
            tera_captains: BTreeMap::new(),
            draft_board,
        }
    }

    /// Checks name length, limits, board and bans.
    pub fn validate(&self) -> Result<(), DraftError> {
        validate_name(&self.name).map_err(DraftError::InvalidTemplate)?;
        if self.point_limit == 0 {
            return Err(DraftError::InvalidTemplate(
                "point_limit must be greater than 0".into(),
            ));
        }
        if self.pick_limit == 0 {
            return Err(DraftError::InvalidTemplate(
                "pick_limit must be greater than 0".into(),
            ));
        }
        self.draft_board.validate()?;
        check_bans_off_board(&self.bans, &self.draft_board)
            .map_err(DraftError::InvalidTemplate)
    }

    /// Turns a validated spec into a template document.
    pub fn into_template(self, id: TemplateId, creator: UserId) -> DraftTemplate {
        let now = Utc::now();
        DraftTemplate {
            id,
            name: self.name,
            description: self.description,
            creator,
            point_limit: self.point_limit,
            pick_limit: self.pick_limit,
            rules: self.rules,
            bans: self.bans,
            tera_bans: self.tera_bans,
            tera_captains: self.tera_captains,
            draft_board: self.draft_board,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a template that has not been used yet.
///
/// Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub point_limit: Option<u32>,
    #[serde(default)]
    pub pick_limit: Option<u32>,
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub bans: Option<Vec<String>>,
    #[serde(default)]
    pub tera_bans: Option<Vec<String>>,
    #[serde(default)]
    pub tera_captains: Option<BTreeMap<UserId, Vec<String>>>,
    #[serde(default)]
    pub draft_board: Option<DraftBoard>,
}

impl DraftTemplate {
    /// Returns the template with `update` applied, validated as a whole.
    pub fn updated(&self, update: TemplateUpdate) -> Result<Self, DraftError> {
        let spec = TemplateSpec {
            name: update.name.unwrap_or_else(|| self.name.clone()),
            description: update.description.or_else(|| self.description.clone()),
            point_limit: update.point_limit.unwrap_or(self.point_limit),
            pick_limit: update.pick_limit.unwrap_or(self.pick_limit),
            rules: update.rules.unwrap_or_else(|| self.rules.clone()),
            bans: update.bans.unwrap_or_else(|| self.bans.clone()),
            tera_bans: update.tera_bans.unwrap_or_else(|| self.tera_bans.clone()),
            tera_captains: update
                .tera_captains
                .unwrap_or_else(|| self.tera_captains.clone()),
            draft_board: update
                .draft_board
                .unwrap_or_else(|| self.draft_board.clone()),
        };
        spec.validate()?;

        let mut next = spec.into_template(self.id, self.creator);
        next.created_at = self.created_at;
        Ok(next)
    }
}

/// Name rule shared by templates, drafts and rooms: 3 to 50 characters.
pub fn validate_name(name: &str) -> Result<(), String> {
    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(format!(
            "name must be {NAME_MIN_CHARS}-{NAME_MAX_CHARS} characters, got {len}"
        ));
    }
    Ok(())
}

/// Banned entries sit outside the tiers; a ban that is also pickable is a
/// contradiction.
pub(crate) fn check_bans_off_board(bans: &[String], board: &DraftBoard) -> Result<(), String> {
    match bans.iter().find(|entry| board.contains(entry)) {
        Some(entry) => Err(format!("banned entry {entry} is on the draft board")),
        None => Ok(()),
    }
}
