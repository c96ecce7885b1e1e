use serde::{Deserialize, Serialize};
use veles_types::{AccountName, Asset, PostId, Timepoint};

/// What kind of work a proposal requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalKind {
    /// Work to be specified, approved and then executed.
    Task,
    /// The result already exists; witnesses only approve payment.
    PremadeWork,
}

/// Worker-proposal lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProposalState {
    Created,
    /// An approved techspec is attached.
    Techspec,
    PaymentComplete,
    Closed,
}

/// Techspec lifecycle state. The declaration order is meaningful:
/// `state < Payment` selects everything that has not started paying,
/// and the four trailing variants are the closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TechspecState {
    Created,
    Approved,
    Work,
    Wip,
    Complete,
    Payment,
    PaymentComplete,
    Closed,
    ClosedByAuthor,
    ClosedByWitnesses,
    DisapprovedByWitnesses,
}

impl TechspecState {
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            TechspecState::Closed
                | TechspecState::ClosedByAuthor
                | TechspecState::ClosedByWitnesses
                | TechspecState::DisapprovedByWitnesses
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.is_closed() || matches!(self, TechspecState::PaymentComplete)
    }

    /// States in which the techspec's per-day consumption is counted
    /// into the global `worker_consumption_per_day`.
    pub fn claims_consumption(&self) -> bool {
        matches!(
            self,
            TechspecState::Approved
                | TechspecState::Work
                | TechspecState::Wip
                | TechspecState::Complete
                | TechspecState::Payment
        )
    }
}

/// Stored witness vote value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteState {
    Approve,
    Disapprove,
}

/// Vote value carried in an approve operation; `Abstain` withdraws a
/// stored vote instead of writing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOption {
    Approve,
    Disapprove,
    Abstain,
}

impl VoteOption {
    pub fn as_vote_state(&self) -> Option<VoteState> {
        match self {
            VoteOption::Approve => Some(VoteState::Approve),
            VoteOption::Disapprove => Some(VoteState::Disapprove),
            VoteOption::Abstain => None,
        }
    }
}

/// A community request for work, anchored in a top-level post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub post: PostId,
    pub kind: ProposalKind,
    pub state: ProposalState,
    /// Set when a techspec is approved, cleared on closure. For
    /// premade work it is set when payment is approved.
    pub approved_techspec_post: Option<PostId>,
}

/// A bid specifying scope, cost and payment schedule for a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Techspec {
    pub post: PostId,
    pub worker_proposal_post: PostId,
    pub state: TechspecState,
    pub worker: Option<AccountName>,
    pub worker_result_post: Option<PostId>,
    pub specification_cost: Asset,
    pub development_cost: Asset,
    pub payments_count: u16,
    /// Seconds between installments.
    pub payments_interval: u32,
    /// `Timepoint::NEVER` unless `state == Payment`.
    pub next_cashout_time: Timepoint,
    pub finished_payments_count: u16,
}

impl Techspec {
    pub fn total_cost(&self) -> Option<Asset> {
        self.specification_cost.checked_add(self.development_cost)
    }

    /// Whole payment period in seconds.
    pub fn payments_period_secs(&self) -> u64 {
        self.payments_interval as u64 * self.payments_count as u64
    }
}

/// Effective approve/disapprove counts over voters currently holding a
/// top-19 rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub approves: u32,
    pub disapproves: u32,
}

#[cfg(test)]
mod techspec_state_tests {
    use super::*;

    #[test]
    fn test_state_ordering_splits_at_payment() {
        for state in [
            TechspecState::Created,
            TechspecState::Approved,
            TechspecState::Work,
            TechspecState::Wip,
            TechspecState::Complete,
        ] {
            assert!(state < TechspecState::Payment, "{state:?}");
        }
        for state in [
            TechspecState::Payment,
            TechspecState::PaymentComplete,
            TechspecState::Closed,
            TechspecState::ClosedByAuthor,
        ] {
            assert!(state >= TechspecState::Payment, "{state:?}");
        }
    }

    #[test]
    fn test_closed_set() {
        assert!(TechspecState::ClosedByWitnesses.is_closed());
        assert!(TechspecState::DisapprovedByWitnesses.is_closed());
        assert!(!TechspecState::PaymentComplete.is_closed());
        assert!(TechspecState::PaymentComplete.is_terminal());
        assert!(!TechspecState::Payment.is_terminal());
    }

    #[test]
    fn test_consumption_claim_window() {
        assert!(!TechspecState::Created.claims_consumption());
        assert!(TechspecState::Approved.claims_consumption());
        assert!(TechspecState::Payment.claims_consumption());
        assert!(!TechspecState::PaymentComplete.claims_consumption());
        assert!(!TechspecState::ClosedByWitnesses.claims_consumption());
    }
}
