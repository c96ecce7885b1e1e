use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use veles_types::AccountName;

/// Position a witness currently holds in the elected schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WitnessRank {
    /// One of the 19 highest-ranked witnesses. Only these may vote on
    /// worker matters.
    Top19,
    /// Elected but outside the top tier.
    Standby,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub owner: AccountName,
    pub rank: WitnessRank,
}

/// Read-only view of the witness schedule. The schedule subsystem owns
/// ranking; this set mirrors the outcome and answers rank queries. The
/// worker subsystem stores witness *names* in vote records and consults
/// this view at tally time, so a witness dropping out of the top tier
/// silently stops counting without any vote rewrite.
#[derive(Debug, Default, Clone)]
pub struct WitnessSet {
    witnesses: BTreeMap<AccountName, Witness>,
}

impl WitnessSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, owner: AccountName, rank: WitnessRank) {
        debug!(witness = %owner, ?rank, "witness registered");
        self.witnesses.insert(
            owner.clone(),
            Witness { owner, rank },
        );
    }

    pub fn get(&self, owner: &AccountName) -> Result<&Witness> {
        self.witnesses
            .get(owner)
            .ok_or_else(|| ChainError::MissingWitness(owner.clone()))
    }

    /// Applied when the schedule rotates.
    pub fn set_rank(&mut self, owner: &AccountName, rank: WitnessRank) -> Result<()> {
        let witness = self
            .witnesses
            .get_mut(owner)
            .ok_or_else(|| ChainError::MissingWitness(owner.clone()))?;
        debug!(witness = %owner, ?rank, "witness rank updated");
        witness.rank = rank;
        Ok(())
    }

    /// Rank query used by every tally. Non-witnesses count as not
    /// scheduled.
    pub fn is_top19(&self, owner: &AccountName) -> bool {
        matches!(
            self.witnesses.get(owner),
            Some(Witness {
                rank: WitnessRank::Top19,
                ..
            })
        )
    }
}
