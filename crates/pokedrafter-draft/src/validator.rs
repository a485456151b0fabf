//! Pick validation.
//!
//! Pure functions over a [`Draft`]; nothing here mutates state. The order
//! of checks in [`validate_pick`] is part of the contract: callers rely on
//! the first failing check deciding the rejection.

use pokedrafter_protocol::UserId;

use crate::{Draft, DraftStatus, PickError};

/// Checks a proposed pick and returns the entry's tier cost.
///
/// Checks, first failure wins:
/// 1. the draft is drafting (`NotActive`)
/// 2. it is `participant`'s turn (`NotYourTurn`)
/// 3. the entry is on the board (`UnknownEntry`)
/// 4. nobody has picked the entry (`AlreadyPicked`)
/// 5. the cost fits the participant's remaining points (`PointLimitExceeded`)
/// 6. the participant is under the pick limit (`PickLimitExceeded`)
pub fn validate_pick(draft: &Draft, participant: UserId, entry: &str) -> Result<u32, PickError> {
    if draft.status() != DraftStatus::Drafting {
        return Err(PickError::NotActive(draft.id()));
    }

    if draft.current_pick() != Some(participant) {
        return Err(PickError::NotYourTurn {
            participant,
            current: draft.current_pick(),
        });
    }

    let cost = draft
        .board()
        .tier_cost(entry)
        .ok_or_else(|| PickError::UnknownEntry(entry.to_owned()))?;

    if let Some(by) = draft.picked_by(entry) {
        return Err(PickError::AlreadyPicked {
            entry: entry.to_owned(),
            by,
        });
    }

    let score = draft.score(participant);
    if score.saturating_add(cost) > draft.point_limit() {
        return Err(PickError::PointLimitExceeded {
            participant,
            entry: entry.to_owned(),
            score,
            cost,
            limit: draft.point_limit(),
        });
    }

    if draft.picks_of(participant).len() >= draft.pick_limit() as usize {
        return Err(PickError::PickLimitExceeded {
            participant,
            limit: draft.pick_limit(),
        });
    }

    Ok(cost)
}

/// Returns `true` if `participant` has at least one pick that would pass
/// checks 3 to 6, ignoring whose turn it is.
pub fn has_legal_pick(draft: &Draft, participant: UserId) -> bool {
    if draft.picks_of(participant).len() >= draft.pick_limit() as usize {
        return false;
    }
    let remaining = draft.point_limit().saturating_sub(draft.score(participant));
    draft
        .board()
        .entries()
        .any(|(cost, entry)| cost <= remaining && draft.picked_by(entry).is_none())
}
