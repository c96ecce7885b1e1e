//! Indexed entity containers for the worker subsystem.
//!
//! Rows are plain values in `BTreeMap`s; every secondary index is
//! maintained by the single `set_*_row` write path so a row and its
//! index entries can never diverge. Undo handling lives a level up in
//! the database, which records pre-images before calling back into
//! these setters.

use crate::objects::{Proposal, Techspec, VoteState};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use veles_types::{AccountName, PostId, Timepoint};

/// Primary key of a vote row: `(techspec post, approver)`.
pub type VoteKey = (PostId, AccountName);

#[derive(Debug, Default, Clone)]
pub struct WorkerStore {
    proposals: BTreeMap<PostId, Proposal>,
    techspecs: BTreeMap<PostId, Techspec>,
    /// proposal post → techspec posts referencing it
    techspecs_by_proposal: BTreeMap<PostId, BTreeSet<PostId>>,
    /// result post → techspec post
    techspec_by_result: BTreeMap<PostId, PostId>,
    /// armed cashouts, ordered for the payout tick
    techspecs_by_cashout: BTreeSet<(Timepoint, PostId)>,
    techspec_approves: BTreeMap<VoteKey, VoteState>,
    payment_approves: BTreeMap<VoteKey, VoteState>,
}

impl WorkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proposal(&self, post: PostId) -> Option<&Proposal> {
        self.proposals.get(&post)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Write a proposal row (`None` removes it). Returns the prior row.
    pub fn set_proposal_row(&mut self, post: PostId, row: Option<Proposal>) -> Option<Proposal> {
        match row {
            Some(row) => self.proposals.insert(post, row),
            None => self.proposals.remove(&post),
        }
    }

    pub fn techspec(&self, post: PostId) -> Option<&Techspec> {
        self.techspecs.get(&post)
    }

    pub fn techspecs(&self) -> impl Iterator<Item = &Techspec> {
        self.techspecs.values()
    }

    /// Write a techspec row (`None` removes it), keeping all three
    /// secondary indices in step. Returns the prior row.
    pub fn set_techspec_row(&mut self, post: PostId, row: Option<Techspec>) -> Option<Techspec> {
        let prior = match row {
            Some(row) => self.techspecs.insert(post, row),
            None => self.techspecs.remove(&post),
        };

        if let Some(old) = &prior {
            if let Some(set) = self.techspecs_by_proposal.get_mut(&old.worker_proposal_post) {
                set.remove(&post);
                if set.is_empty() {
                    self.techspecs_by_proposal.remove(&old.worker_proposal_post);
                }
            }
            if let Some(result) = old.worker_result_post {
                self.techspec_by_result.remove(&result);
            }
            if !old.next_cashout_time.is_never() {
                self.techspecs_by_cashout.remove(&(old.next_cashout_time, post));
            }
        }

        if let Some(new) = self.techspecs.get(&post) {
            self.techspecs_by_proposal
                .entry(new.worker_proposal_post)
                .or_default()
                .insert(post);
            if let Some(result) = new.worker_result_post {
                self.techspec_by_result.insert(result, post);
            }
            if !new.next_cashout_time.is_never() {
                self.techspecs_by_cashout.insert((new.next_cashout_time, post));
            }
        }

        prior
    }

    pub fn proposal_has_techspecs(&self, proposal_post: PostId) -> bool {
        self.techspecs_by_proposal
            .get(&proposal_post)
            .is_some_and(|set| !set.is_empty())
    }

    pub fn techspecs_for_proposal(&self, proposal_post: PostId) -> Vec<PostId> {
        self.techspecs_by_proposal
            .get(&proposal_post)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn techspec_by_result_post(&self, result_post: PostId) -> Option<PostId> {
        self.techspec_by_result.get(&result_post).copied()
    }

    /// Techspec posts whose cashout is due at `head`, in
    /// `(next_cashout_time, post)` order.
    pub fn due_cashouts(&self, head: Timepoint) -> Vec<PostId> {
        self.techspecs_by_cashout
            .iter()
            .take_while(|(cashout, _)| *cashout <= head)
            .map(|(_, post)| *post)
            .collect()
    }

    pub fn techspec_vote(&self, key: &VoteKey) -> Option<VoteState> {
        self.techspec_approves.get(key).copied()
    }

    pub fn payment_vote(&self, key: &VoteKey) -> Option<VoteState> {
        self.payment_approves.get(key).copied()
    }

    pub fn set_techspec_vote_row(
        &mut self,
        key: VoteKey,
        row: Option<VoteState>,
    ) -> Option<VoteState> {
        match row {
            Some(state) => self.techspec_approves.insert(key, state),
            None => self.techspec_approves.remove(&key),
        }
    }

    pub fn set_payment_vote_row(
        &mut self,
        key: VoteKey,
        row: Option<VoteState>,
    ) -> Option<VoteState> {
        match row {
            Some(state) => self.payment_approves.insert(key, state),
            None => self.payment_approves.remove(&key),
        }
    }

    pub fn techspec_votes_for(&self, post: PostId) -> Vec<(AccountName, VoteState)> {
        Self::votes_for(&self.techspec_approves, post)
    }

    pub fn payment_votes_for(&self, post: PostId) -> Vec<(AccountName, VoteState)> {
        Self::votes_for(&self.payment_approves, post)
    }

    pub fn techspec_vote_keys(&self) -> impl Iterator<Item = &VoteKey> {
        self.techspec_approves.keys()
    }

    pub fn payment_vote_keys(&self) -> impl Iterator<Item = &VoteKey> {
        self.payment_approves.keys()
    }

    fn votes_for(
        votes: &BTreeMap<VoteKey, VoteState>,
        post: PostId,
    ) -> Vec<(AccountName, VoteState)> {
        votes
            .range((
                Bound::Included((post, AccountName::new(""))),
                Bound::Unbounded,
            ))
            .take_while(|((p, _), _)| *p == post)
            .map(|((_, approver), state)| (approver.clone(), *state))
            .collect()
    }
}
