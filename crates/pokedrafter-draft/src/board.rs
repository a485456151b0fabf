//! The draft board: pickable entries grouped into point-cost tiers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::DraftError;

/// Catalog of pickable entries, keyed by tier cost.
///
/// An entry name appears in at most one tier. Construction through
/// [`DraftBoard::new`] or [`DraftBoard::validate`] enforces this; a board
/// deserialized from a request must be validated before use.
///
/// Serializes as a plain JSON object: `{ "19": ["Garchomp"], "5": ["Rattata"] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftBoard {
    tiers: BTreeMap<u32, BTreeSet<String>>,
}

impl DraftBoard {
    /// Builds a board from `(cost, entries)` pairs.
    ///
    /// Pairs with the same cost are merged. Fails if an entry lands in two
    /// different tiers.
    pub fn new<I, E>(tiers: I) -> Result<Self, DraftError>
    where
        I: IntoIterator<Item = (u32, E)>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        let mut board = Self::default();
        for (cost, entries) in tiers {
            let tier = board.tiers.entry(cost).or_default();
            tier.extend(entries.into_iter().map(Into::into));
        }
        board.validate()?;
        Ok(board)
    }

    /// Checks that no entry appears in more than one tier.
    pub fn validate(&self) -> Result<(), DraftError> {
        let mut seen: BTreeMap<&str, u32> = BTreeMap::new();
        for (cost, entries) in &self.tiers {
            for entry in entries {
                if let Some(other) = seen.insert(entry.as_str(), *cost) {
                    return Err(DraftError::InvalidBoard(format!(
                        "{entry} appears in tiers {other} and {cost}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns the cost of the tier holding `entry`, if any.
    pub fn tier_cost(&self, entry: &str) -> Option<u32> {
        self.tiers
            .iter()
            .find(|(_, entries)| entries.contains(entry))
            .map(|(cost, _)| *cost)
    }

    /// Returns `true` if `entry` is on the board.
    pub fn contains(&self, entry: &str) -> bool {
        self.tier_cost(entry).is_some()
    }

    /// Iterates `(cost, entry)` pairs, cheapest tier first.
    pub fn entries(&self) -> impl Iterator<Item = (u32, &str)> {
        self.tiers.iter().flat_map(|(cost, entries)| {
            entries.iter().map(move |entry| (*cost, entry.as_str()))
        })
    }

    /// Returns the entries of one tier.
    pub fn tier(&self, cost: u32) -> Option<&BTreeSet<String>> {
        self.tiers.get(&cost)
    }

    /// Number of entries across all tiers.
    pub fn len(&self) -> usize {
        self.tiers.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
