//! The draft record and its state transitions.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use pokedrafter_protocol::{DraftId, RoomId, TemplateId, UserId};
use serde::{Deserialize, Serialize};

use crate::template::{check_bans_off_board, validate_name};
use crate::{DraftBoard, DraftError, DraftTemplate, PickError, sequencer, validator};

// ---------------------------------------------------------------------------
// DraftStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a draft.
///
/// ```text
/// Drafting → Completed
/// ```
///
/// A draft is born `Drafting` when its room starts drafting and becomes
/// `Completed` once no participant has a legal pick left. `Completed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftStatus {
    Drafting,
    Completed,
}

impl DraftStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Drafting)
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drafting => write!(f, "Drafting"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// One live pick session scoped to one room.
///
/// Fields are read through accessors and only change through
/// [`submit_pick`](Self::submit_pick) and [`apply_update`](Self::apply_update),
/// which keep these invariants:
///
/// - every picked entry is on the board and picked by exactly one participant
/// - `player_scores[p]` is the sum of the tier costs of `picks[p]`
/// - `player_scores[p] <= point_limit` and `len(picks[p]) <= pick_limit`
/// - `current_pick` is a member of `pick_order` while drafting and `None`
///   once completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub(crate) id: DraftId,
    pub(crate) template: TemplateId,
    pub(crate) room: RoomId,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) rules: String,
    pub(crate) status: DraftStatus,
    pub(crate) point_limit: u32,
    pub(crate) pick_limit: u32,
    #[serde(default)]
    pub(crate) bans: Vec<String>,
    #[serde(default)]
    pub(crate) tera_bans: Vec<String>,
    #[serde(default)]
    pub(crate) tera_captains: BTreeMap<UserId, Vec<String>>,
    pub(crate) draft_board: DraftBoard,
    pub(crate) pick_order: Vec<UserId>,
    pub(crate) current_pick: Option<UserId>,
    pub(crate) picks: BTreeMap<UserId, Vec<String>>,
    pub(crate) player_scores: BTreeMap<UserId, u32>,
    pub(crate) revision: u64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// What an accepted pick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOutcome {
    pub cost: u32,
    pub score: u32,
    pub next_pick: Option<UserId>,
    pub completed: bool,
}

impl Draft {
    /// Starts a draft for `room` from `template`.
    ///
    /// Board, bans, tera bans and both limits are copied from the
    /// template. Tera captains are copied only for users who are
    /// participants of this draft. The pick order is `participants` as given (join
    /// order, never re-sorted) and the first participant is on the clock.
    ///
    /// # Errors
    /// - [`DraftError::InsufficientParticipants`] for an empty list
    /// - [`DraftError::DuplicateParticipant`] if someone is listed twice
    pub fn instantiate(
        id: DraftId,
        template: &DraftTemplate,
        room: RoomId,
        participants: &[UserId],
    ) -> Result<Self, DraftError> {
        let Some(first) = participants.first().copied() else {
            return Err(DraftError::InsufficientParticipants(room));
        };

        let mut seen = BTreeSet::new();
        if let Some(dup) = participants.iter().find(|p| !seen.insert(**p)) {
            return Err(DraftError::DuplicateParticipant(*dup));
        }

        let now = Utc::now();
        let mut draft = Self {
            id,
            template: template.id,
            room,
            name: template.name.clone(),
            description: template.description.clone(),
            rules: template.rules.clone(),
            status: DraftStatus::Drafting,
            point_limit: template.point_limit,
            pick_limit: template.pick_limit,
            bans: template.bans.clone(),
            tera_bans: template.tera_bans.clone(),
            tera_captains: template
                .tera_captains
                .iter()
                .filter(|(captain, _)| participants.contains(*captain))
                .map(|(captain, entries)| (*captain, entries.clone()))
                .collect(),
            draft_board: template.draft_board.clone(),
            pick_order: participants.to_vec(),
            current_pick: Some(first),
            picks: participants.iter().map(|p| (*p, Vec::new())).collect(),
            player_scores: participants.iter().map(|p| (*p, 0)).collect(),
            revision: 0,
            created_at: now,
            updated_at: now,
        };
        draft.settle();
        Ok(draft)
    }

    /// Validates and applies a pick as one transition.
    ///
    /// On success the entry is appended to the participant's picks, their
    /// score grows by the tier cost, and the turn advances. On error
    /// nothing changes.
    pub fn submit_pick(
        &mut self,
        participant: UserId,
        entry: &str,
    ) -> Result<PickOutcome, PickError> {
        let cost = validator::validate_pick(self, participant, entry)?;

        self.picks
            .entry(participant)
            .or_default()
            .push(entry.to_owned());
        let score = self.player_scores.entry(participant).or_insert(0);
        *score += cost;
        let score = *score;

        self.current_pick = sequencer::next_pick(&mut self.pick_order, participant);
        self.settle();

        Ok(PickOutcome {
            cost,
            score,
            next_pick: self.current_pick,
            completed: self.status == DraftStatus::Completed,
        })
    }

    /// Applies a moderator edit. Picks and scores are never touched.
    ///
    /// The edit is checked against the draft as a whole; if any field
    /// would break an invariant nothing is applied.
    pub fn apply_update(&mut self, update: DraftUpdate) -> Result<(), DraftError> {
        let mut next = self.clone();

        if let Some(name) = update.name {
            validate_name(&name).map_err(DraftError::InvalidUpdate)?;
            next.name = name;
        }
        if let Some(description) = update.description {
            next.description = Some(description);
        }
        if let Some(rules) = update.rules {
            next.rules = rules;
        }
        if let Some(order) = update.pick_order {
            self.check_pick_order(&order)?;
            next.pick_order = order;
        }
        if let Some(limit) = update.point_limit {
            let top = self.player_scores.values().copied().max().unwrap_or(0);
            if limit == 0 || limit < top {
                return Err(DraftError::InvalidUpdate(format!(
                    "point_limit {limit} must be positive and at least {top}"
                )));
            }
            next.point_limit = limit;
        }
        if let Some(limit) = update.pick_limit {
            let most = self.picks.values().map(Vec::len).max().unwrap_or(0);
            if limit == 0 || (limit as usize) < most {
                return Err(DraftError::InvalidUpdate(format!(
                    "pick_limit {limit} must be positive and at least {most}"
                )));
            }
            next.pick_limit = limit;
        }
        if let Some(board) = update.draft_board {
            board.validate()?;
            self.check_board_keeps_picks(&board)?;
            next.draft_board = board;
        }
        if let Some(bans) = update.bans {
            next.bans = bans;
        }
        if let Some(tera_bans) = update.tera_bans {
            next.tera_bans = tera_bans;
        }
        if let Some(captains) = update.tera_captains {
            if let Some(outsider) = captains.keys().find(|p| !self.pick_order.contains(p)) {
                return Err(DraftError::InvalidUpdate(format!(
                    "tera captain {outsider} is not a participant"
                )));
            }
            next.tera_captains = captains;
        }
        check_bans_off_board(&next.bans, &next.draft_board).map_err(DraftError::InvalidUpdate)?;

        next.settle();
        *self = next;
        Ok(())
    }

    fn check_pick_order(&self, order: &[UserId]) -> Result<(), DraftError> {
        let proposed: BTreeSet<UserId> = order.iter().copied().collect();
        let current: BTreeSet<UserId> = self.pick_order.iter().copied().collect();
        if proposed.len() != order.len() || proposed != current {
            return Err(DraftError::InvalidUpdate(
                "pick_order must be a reordering of the current participants".into(),
            ));
        }
        Ok(())
    }

    fn check_board_keeps_picks(&self, board: &DraftBoard) -> Result<(), DraftError> {
        for entry in self.picks.values().flatten() {
            if board.tier_cost(entry) != self.draft_board.tier_cost(entry) {
                return Err(DraftError::InvalidUpdate(format!(
                    "picked entry {entry} must stay in its tier"
                )));
            }
        }
        Ok(())
    }

    /// Completes the draft when nobody can pick, otherwise passes the turn
    /// over participants who have no legal pick left.
    fn settle(&mut self) {
        if self.status != DraftStatus::Drafting {
            return;
        }

        let anyone_can_pick = self
            .pick_order
            .iter()
            .any(|p| validator::has_legal_pick(self, *p));
        if !anyone_can_pick {
            self.status = DraftStatus::Completed;
            self.current_pick = None;
            return;
        }

        // The snake visits everyone within two passes.
        let mut steps = 2 * self.pick_order.len();
        while let Some(current) = self.current_pick {
            if steps == 0 || validator::has_legal_pick(self, current) {
                break;
            }
            steps -= 1;
            self.current_pick = sequencer::next_pick(&mut self.pick_order, current);
        }
    }

    /// Bumps the revision and modification time before a write.
    pub(crate) fn touch(&mut self) {
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    // -- accessors --

    pub fn id(&self) -> DraftId {
        self.id
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn rules(&self) -> &str {
        &self.rules
    }

    pub fn status(&self) -> DraftStatus {
        self.status
    }

    pub fn point_limit(&self) -> u32 {
        self.point_limit
    }

    pub fn pick_limit(&self) -> u32 {
        self.pick_limit
    }

    pub fn bans(&self) -> &[String] {
        &self.bans
    }

    pub fn tera_bans(&self) -> &[String] {
        &self.tera_bans
    }

    pub fn tera_captains(&self) -> &BTreeMap<UserId, Vec<String>> {
        &self.tera_captains
    }

    pub fn board(&self) -> &DraftBoard {
        &self.draft_board
    }

    pub fn pick_order(&self) -> &[UserId] {
        &self.pick_order
    }

    pub fn current_pick(&self) -> Option<UserId> {
        self.current_pick
    }

    pub fn picks(&self) -> &BTreeMap<UserId, Vec<String>> {
        &self.picks
    }

    /// The entries `participant` has picked, in pick order.
    pub fn picks_of(&self, participant: UserId) -> &[String] {
        self.picks.get(&participant).map_or(&[], Vec::as_slice)
    }

    pub fn player_scores(&self) -> &BTreeMap<UserId, u32> {
        &self.player_scores
    }

    pub fn score(&self, participant: UserId) -> u32 {
        self.player_scores.get(&participant).copied().unwrap_or(0)
    }

    /// Who picked `entry`, if anyone.
    pub fn picked_by(&self, entry: &str) -> Option<UserId> {
        self.picks
            .iter()
            .find(|(_, entries)| entries.iter().any(|e| e == entry))
            .map(|(p, _)| *p)
    }

    /// Incremented on every stored write; used for compare-and-swap.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// ---------------------------------------------------------------------------
// DraftUpdate
// ---------------------------------------------------------------------------

/// A moderator edit of draft metadata. Absent fields stay as they are.
///
/// There is deliberately no way to edit picks, scores or the current
/// picker through an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub bans: Option<Vec<String>>,
    #[serde(default)]
    pub tera_bans: Option<Vec<String>>,
    #[serde(default)]
    pub tera_captains: Option<BTreeMap<UserId, Vec<String>>>,
    #[serde(default)]
    pub pick_order: Option<Vec<UserId>>,
    #[serde(default)]
    pub point_limit: Option<u32>,
    #[serde(default)]
    pub pick_limit: Option<u32>,
    #[serde(default)]
    pub draft_board: Option<DraftBoard>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TemplateSpec;

    const A: UserId = UserId(1);
    const B: UserId = UserId(2);
    const C: UserId = UserId(3);

    fn template(point_limit: u32, pick_limit: u32) -> DraftTemplate {
        let board = DraftBoard::new([
            (19, vec!["Garchomp", "Kingambit", "Great Tusk"]),
            (10, vec!["Rotom-Wash", "Corviknight", "Toxapex"]),
            (5, vec!["Foo", "Bar", "Baz"]),
            (1, vec!["Rattata", "Pidgey", "Caterpie", "Weedle"]),
        ])
        .unwrap();
        let mut spec = TemplateSpec::new("Snake Cup", board);
        spec.point_limit = point_limit;
        spec.pick_limit = pick_limit;
        spec.bans = vec!["Koraidon".into()];
        spec.tera_bans = vec!["Garchomp".into()];
        spec.into_template(TemplateId(9), A)
    }

    fn draft() -> Draft {
        Draft::instantiate(DraftId(1), &template(115, 12), RoomId(7), &[A, B, C]).unwrap()
    }

    fn assert_invariants(d: &Draft) {
        let mut owners = BTreeMap::new();
        for (p, entries) in d.picks() {
            let sum: u32 = entries
                .iter()
                .map(|e| d.board().tier_cost(e).expect("picked entry on board"))
                .sum();
            assert_eq!(d.score(*p), sum, "score of {p}");
            assert!(d.score(*p) <= d.point_limit());
            assert!(entries.len() <= d.pick_limit() as usize);
            for e in entries {
                assert!(owners.insert(e.clone(), *p).is_none(), "{e} picked twice");
            }
        }
        match d.status() {
            DraftStatus::Drafting => {
                assert!(d.pick_order().contains(&d.current_pick().unwrap()))
            }
            DraftStatus::Completed => assert_eq!(d.current_pick(), None),
        }
    }

    #[test]
    fn test_instantiate_copies_template_and_keeps_join_order() {
        let d = Draft::instantiate(DraftId(1), &template(115, 12), RoomId(7), &[C, A, B]).unwrap();
        assert_eq!(d.pick_order(), &[C, A, B]);
        assert_eq!(d.current_pick(), Some(C));
        assert_eq!(d.room(), RoomId(7));
        assert_eq!(d.template(), TemplateId(9));
        assert_eq!(d.point_limit(), 115);
        assert_eq!(d.pick_limit(), 12);
        assert_eq!(d.bans(), &["Koraidon".to_string()]);
        assert_eq!(d.tera_bans(), &["Garchomp".to_string()]);
        assert_eq!(d.board().tier_cost("Foo"), Some(5));
        assert_eq!(d.status(), DraftStatus::Drafting);
        for p in [A, B, C] {
            assert!(d.picks_of(p).is_empty());
            assert_eq!(d.player_scores()[&p], 0);
        }
    }

    #[test]
    fn test_instantiate_rejects_empty_participants() {
        let result = Draft::instantiate(DraftId(1), &template(115, 12), RoomId(7), &[]);
        assert!(matches!(
            result,
            Err(DraftError::InsufficientParticipants(RoomId(7)))
        ));
    }

    #[test]
    fn test_instantiate_rejects_duplicate_participants() {
        let result = Draft::instantiate(DraftId(1), &template(115, 12), RoomId(7), &[A, B, A]);
        assert!(matches!(result, Err(DraftError::DuplicateParticipant(p)) if p == A));
    }

    #[test]
    fn test_instantiate_keeps_only_participant_tera_captains() {
        let mut t = template(115, 12);
        t.tera_captains.insert(A, vec!["Foo".into()]);
        t.tera_captains.insert(UserId(42), vec!["Bar".into()]);

        let d = Draft::instantiate(DraftId(1), &t, RoomId(7), &[A, B]).unwrap();
        assert_eq!(d.tera_captains().len(), 1);
        assert_eq!(d.tera_captains()[&A], vec!["Foo".to_string()]);
        assert!(!d.tera_captains().contains_key(&UserId(42)));

        // The participant-only rule holds for later edits too.
        let mut d = d;
        d.apply_update(DraftUpdate {
            rules: Some("Bo3".into()),
            ..DraftUpdate::default()
        })
        .unwrap();
        assert_eq!(d.tera_captains().len(), 1);
    }

    #[test]
    fn test_snake_order_scenario() {
        let mut d = draft();
        d.submit_pick(A, "Garchomp").unwrap();
        assert_eq!(d.current_pick(), Some(B));
        d.submit_pick(B, "Kingambit").unwrap();
        assert_eq!(d.current_pick(), Some(C));
        d.submit_pick(C, "Great Tusk").unwrap();
        assert_eq!(d.pick_order(), &[C, B, A]);
        assert_eq!(d.current_pick(), Some(C));
        d.submit_pick(C, "Toxapex").unwrap();
        assert_eq!(d.current_pick(), Some(B));
        assert_invariants(&d);
    }

    #[test]
    fn test_accepted_pick_updates_picks_and_score() {
        let mut d = draft();
        let outcome = d.submit_pick(A, "Foo").unwrap();
        assert_eq!(outcome.cost, 5);
        assert_eq!(outcome.score, 5);
        assert_eq!(outcome.next_pick, Some(B));
        assert!(!outcome.completed);
        assert_eq!(d.picks_of(A), &["Foo".to_string()]);
        assert_eq!(d.picked_by("Foo"), Some(A));
    }

    #[test]
    fn test_rejected_pick_leaves_draft_unchanged() {
        let mut d = draft();
        d.submit_pick(A, "Foo").unwrap();
        let before = d.clone();

        assert!(matches!(
            d.submit_pick(A, "Bar"),
            Err(PickError::NotYourTurn { .. })
        ));
        assert!(matches!(
            d.submit_pick(B, "Foo"),
            Err(PickError::AlreadyPicked { .. })
        ));
        assert!(matches!(
            d.submit_pick(B, "Mew"),
            Err(PickError::UnknownEntry(_))
        ));
        assert_eq!(d, before);
    }

    #[test]
    fn test_point_limit_rejection_keeps_state() {
        // point_limit 10; B reaches 6 points and then tries a 5-cost entry.
        let mut d = Draft::instantiate(DraftId(1), &template(10, 12), RoomId(7), &[A, B]).unwrap();
        d.submit_pick(A, "Rattata").unwrap();
        d.submit_pick(B, "Foo").unwrap();
        d.submit_pick(B, "Pidgey").unwrap();
        d.submit_pick(A, "Caterpie").unwrap();
        d.submit_pick(A, "Bar").unwrap();
        assert_eq!(d.current_pick(), Some(B));
        assert_eq!(d.score(B), 6);
        let before = d.clone();

        let err = d.submit_pick(B, "Baz").unwrap_err();
        assert!(matches!(
            err,
            PickError::PointLimitExceeded { score: 6, cost: 5, limit: 10, .. }
        ));
        assert_eq!(d, before);
    }

    #[test]
    fn test_draft_completes_when_everyone_hits_pick_limit() {
        let mut d = Draft::instantiate(DraftId(1), &template(115, 2), RoomId(7), &[A, B]).unwrap();
        d.submit_pick(A, "Foo").unwrap();
        d.submit_pick(B, "Bar").unwrap();
        d.submit_pick(B, "Baz").unwrap();
        let outcome = d.submit_pick(A, "Rattata").unwrap();
        assert!(outcome.completed);
        assert_eq!(d.status(), DraftStatus::Completed);
        assert_eq!(d.current_pick(), None);
        assert_invariants(&d);
    }

    #[test]
    fn test_participant_without_legal_pick_is_passed_over() {
        // Limit 20: A takes a 19-cost entry. Only 1-cost entries fit A
        // afterwards; once those are gone A is skipped.
        let mut d = Draft::instantiate(DraftId(1), &template(20, 12), RoomId(7), &[A, B]).unwrap();
        d.submit_pick(A, "Garchomp").unwrap();
        d.submit_pick(B, "Rattata").unwrap();
        d.submit_pick(B, "Pidgey").unwrap();
        d.submit_pick(A, "Caterpie").unwrap();
        // A has 20 points and can't pick again; A was last in [B, A], so
        // the order reverses to [A, B] and the turn passes to B.
        assert_eq!(d.score(A), 20);
        assert_eq!(d.status(), DraftStatus::Drafting);
        assert_eq!(d.current_pick(), Some(B));
        assert_invariants(&d);
    }

    #[test]
    fn test_instantiate_with_unaffordable_board_completes_immediately() {
        // 1-point limit: only the 1-cost tier is affordable, so still drafting.
        let d = Draft::instantiate(DraftId(1), &template(1, 12), RoomId(7), &[A]).unwrap();
        assert_eq!(d.status(), DraftStatus::Drafting);

        let board = DraftBoard::new([(19, vec!["Garchomp"])]).unwrap();
        let mut spec = TemplateSpec::new("Tiny Cup", board);
        spec.point_limit = 10;
        let t = spec.into_template(TemplateId(2), A);
        let d = Draft::instantiate(DraftId(2), &t, RoomId(8), &[A, B]).unwrap();
        assert_eq!(d.status(), DraftStatus::Completed);
        assert_eq!(d.current_pick(), None);
    }

    #[test]
    fn test_update_renames_without_touching_picks() {
        let mut d = draft();
        d.submit_pick(A, "Foo").unwrap();
        let picks = d.picks().clone();
        let scores = d.player_scores().clone();

        d.apply_update(DraftUpdate {
            name: Some("Snake Cup Finals".into()),
            bans: Some(vec!["Miraidon".into()]),
            ..DraftUpdate::default()
        })
        .unwrap();

        assert_eq!(d.name(), "Snake Cup Finals");
        assert_eq!(d.bans(), &["Miraidon".to_string()]);
        assert_eq!(d.picks(), &picks);
        assert_eq!(d.player_scores(), &scores);
    }

    #[test]
    fn test_update_rejects_pick_order_with_new_participant() {
        let mut d = draft();
        let before = d.clone();
        let err = d
            .apply_update(DraftUpdate {
                pick_order: Some(vec![A, B, UserId(99)]),
                ..DraftUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, DraftError::InvalidUpdate(_)));
        assert_eq!(d, before);
    }

    #[test]
    fn test_update_accepts_reordered_pick_order() {
        let mut d = draft();
        d.apply_update(DraftUpdate {
            pick_order: Some(vec![C, B, A]),
            ..DraftUpdate::default()
        })
        .unwrap();
        assert_eq!(d.pick_order(), &[C, B, A]);
        assert_eq!(d.current_pick(), Some(A));
    }

    #[test]
    fn test_update_rejects_limit_below_existing_score() {
        let mut d = draft();
        d.submit_pick(A, "Garchomp").unwrap();
        let err = d
            .apply_update(DraftUpdate {
                point_limit: Some(18),
                ..DraftUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, DraftError::InvalidUpdate(_)));
    }

    #[test]
    fn test_update_rejects_board_moving_picked_entry() {
        let mut d = draft();
        d.submit_pick(A, "Garchomp").unwrap();
        let board = DraftBoard::new([(18, vec!["Garchomp"]), (5, vec!["Foo"])]).unwrap();
        let err = d
            .apply_update(DraftUpdate {
                draft_board: Some(board),
                ..DraftUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, DraftError::InvalidUpdate(_)));
    }

    #[test]
    fn test_update_rejects_ban_of_board_entry() {
        let mut d = draft();
        let err = d
            .apply_update(DraftUpdate {
                bans: Some(vec!["Foo".into()]),
                ..DraftUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, DraftError::InvalidUpdate(_)));
    }

    #[test]
    fn test_update_rejects_outside_tera_captain() {
        let mut d = draft();
        let mut captains = BTreeMap::new();
        captains.insert(UserId(42), vec!["Garchomp".to_string()]);
        let err = d
            .apply_update(DraftUpdate {
                tera_captains: Some(captains),
                ..DraftUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, DraftError::InvalidUpdate(_)));
    }

    #[test]
    fn test_draft_survives_json_round_trip() {
        let mut d = draft();
        d.submit_pick(A, "Foo").unwrap();
        let json = serde_json::to_string(&d).unwrap();
        let back: Draft = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_invariants_hold_through_a_full_draft() {
        let mut d = Draft::instantiate(DraftId(1), &template(40, 4), RoomId(7), &[A, B, C]).unwrap();
        let entries: Vec<String> = d.board().entries().map(|(_, e)| e.to_owned()).collect();
        let mut guard = 0;
        while let Some(current) = d.current_pick() {
            guard += 1;
            assert!(guard < 100, "draft never finished");
            let entry = entries
                .iter()
                .rev()
                .find(|e| validator::validate_pick(&d, current, e).is_ok())
                .expect("current picker always has a legal pick")
                .clone();
            d.submit_pick(current, &entry).unwrap();
            assert_invariants(&d);
        }
        assert_eq!(d.status(), DraftStatus::Completed);
    }
}
