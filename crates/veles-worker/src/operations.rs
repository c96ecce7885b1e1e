//! Operation payloads and their stateless validation.
//!
//! Evaluators are a closed set dispatched by [`WorkerOperation`] tag so
//! exhaustiveness is machine-checked. `validate` inspects nothing but
//! the payload itself; state-dependent guards live in the evaluators.

use crate::objects::{ProposalKind, VoteOption};
use crate::{DAY_SECONDS, MAX_PERMLINK_LENGTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use veles_types::{AccountName, Asset, Symbol};

/// Malformed-payload failures, detected before any state lookup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyAccountName { field: &'static str },

    #[error("{field} must not be empty")]
    EmptyPermlink { field: &'static str },

    #[error("{field} is too long ({len} bytes)")]
    PermlinkTooLong { field: &'static str, len: usize },

    #[error("{field} must be denominated in the native token")]
    NonNativeCost { field: &'static str },

    #[error("{field} must not be negative")]
    NegativeCost { field: &'static str },

    #[error("payments count must be at least 1")]
    ZeroPaymentsCount,

    #[error("payments interval must be at least one day")]
    PaymentsIntervalTooShort,

    #[error("a single payment requires exactly a one-day interval")]
    SinglePaymentIntervalMismatch,

    #[error("worker can be assigned only by the techspec author")]
    AssignerNotTechspecAuthor,
}

fn check_account(name: &AccountName, field: &'static str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyAccountName { field });
    }
    Ok(())
}

fn check_permlink(permlink: &str, field: &'static str) -> Result<(), ValidationError> {
    if permlink.is_empty() {
        return Err(ValidationError::EmptyPermlink { field });
    }
    if permlink.len() > MAX_PERMLINK_LENGTH {
        return Err(ValidationError::PermlinkTooLong {
            field,
            len: permlink.len(),
        });
    }
    Ok(())
}

fn check_cost(cost: &Asset, field: &'static str) -> Result<(), ValidationError> {
    if cost.symbol() != Symbol::Vls {
        return Err(ValidationError::NonNativeCost { field });
    }
    if cost.is_negative() {
        return Err(ValidationError::NegativeCost { field });
    }
    Ok(())
}

fn check_schedule(payments_count: u16, payments_interval: u32) -> Result<(), ValidationError> {
    if payments_count == 0 {
        return Err(ValidationError::ZeroPaymentsCount);
    }
    if payments_interval < DAY_SECONDS {
        return Err(ValidationError::PaymentsIntervalTooShort);
    }
    if payments_count == 1 && payments_interval != DAY_SECONDS {
        return Err(ValidationError::SinglePaymentIntervalMismatch);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalOperation {
    pub author: AccountName,
    pub permlink: String,
    pub kind: ProposalKind,
}

impl ProposalOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account(&self.author, "author")?;
        check_permlink(&self.permlink, "permlink")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDeleteOperation {
    pub author: AccountName,
    pub permlink: String,
}

impl ProposalDeleteOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account(&self.author, "author")?;
        check_permlink(&self.permlink, "permlink")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechspecOperation {
    pub author: AccountName,
    pub permlink: String,
    pub worker_proposal_author: AccountName,
    pub worker_proposal_permlink: String,
    pub specification_cost: Asset,
    pub development_cost: Asset,
    pub payments_count: u16,
    pub payments_interval: u32,
}

impl TechspecOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account(&self.author, "author")?;
        check_permlink(&self.permlink, "permlink")?;
        check_account(&self.worker_proposal_author, "worker_proposal_author")?;
        check_permlink(&self.worker_proposal_permlink, "worker_proposal_permlink")?;
        check_cost(&self.specification_cost, "specification_cost")?;
        check_cost(&self.development_cost, "development_cost")?;
        check_schedule(self.payments_count, self.payments_interval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechspecDeleteOperation {
    pub author: AccountName,
    pub permlink: String,
}

impl TechspecDeleteOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account(&self.author, "author")?;
        check_permlink(&self.permlink, "permlink")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechspecApproveOperation {
    pub approver: AccountName,
    pub author: AccountName,
    pub permlink: String,
    pub state: VoteOption,
}

impl TechspecApproveOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account(&self.approver, "approver")?;
        check_account(&self.author, "author")?;
        check_permlink(&self.permlink, "permlink")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignOperation {
    pub assigner: AccountName,
    pub worker_techspec_author: AccountName,
    pub worker_techspec_permlink: String,
    /// `None` unassigns the current worker.
    pub worker: Option<AccountName>,
}

impl AssignOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account(&self.assigner, "assigner")?;
        check_account(&self.worker_techspec_author, "worker_techspec_author")?;
        check_permlink(&self.worker_techspec_permlink, "worker_techspec_permlink")?;
        if let Some(worker) = &self.worker {
            check_account(worker, "worker")?;
            // Unassignment authority is state-dependent; assignment is
            // the author's alone and that much is checkable here.
            if self.assigner != self.worker_techspec_author {
                return Err(ValidationError::AssignerNotTechspecAuthor);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultOperation {
    pub author: AccountName,
    pub permlink: String,
    pub worker_techspec_permlink: String,
}

impl ResultOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account(&self.author, "author")?;
        check_permlink(&self.permlink, "permlink")?;
        check_permlink(&self.worker_techspec_permlink, "worker_techspec_permlink")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPremadeOperation {
    pub author: AccountName,
    pub permlink: String,
    pub worker_proposal_author: AccountName,
    pub worker_proposal_permlink: String,
    pub specification_cost: Asset,
    pub development_cost: Asset,
    pub payments_count: u16,
    pub payments_interval: u32,
}

impl ResultPremadeOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account(&self.author, "author")?;
        check_permlink(&self.permlink, "permlink")?;
        check_account(&self.worker_proposal_author, "worker_proposal_author")?;
        check_permlink(&self.worker_proposal_permlink, "worker_proposal_permlink")?;
        check_cost(&self.specification_cost, "specification_cost")?;
        check_cost(&self.development_cost, "development_cost")?;
        check_schedule(self.payments_count, self.payments_interval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDeleteOperation {
    pub author: AccountName,
    pub permlink: String,
}

impl ResultDeleteOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account(&self.author, "author")?;
        check_permlink(&self.permlink, "permlink")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApproveOperation {
    pub approver: AccountName,
    pub worker_techspec_author: AccountName,
    pub worker_techspec_permlink: String,
    pub state: VoteOption,
}

impl PaymentApproveOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account(&self.approver, "approver")?;
        check_account(&self.worker_techspec_author, "worker_techspec_author")?;
        check_permlink(&self.worker_techspec_permlink, "worker_techspec_permlink")
    }
}

/// Tagged union of every worker operation. Dispatch is a single
/// exhaustive `match` in `Database::apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerOperation {
    Proposal(ProposalOperation),
    ProposalDelete(ProposalDeleteOperation),
    Techspec(TechspecOperation),
    TechspecDelete(TechspecDeleteOperation),
    TechspecApprove(TechspecApproveOperation),
    Assign(AssignOperation),
    Result(ResultOperation),
    ResultPremade(ResultPremadeOperation),
    ResultDelete(ResultDeleteOperation),
    PaymentApprove(PaymentApproveOperation),
}

impl WorkerOperation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            WorkerOperation::Proposal(op) => op.validate(),
            WorkerOperation::ProposalDelete(op) => op.validate(),
            WorkerOperation::Techspec(op) => op.validate(),
            WorkerOperation::TechspecDelete(op) => op.validate(),
            WorkerOperation::TechspecApprove(op) => op.validate(),
            WorkerOperation::Assign(op) => op.validate(),
            WorkerOperation::Result(op) => op.validate(),
            WorkerOperation::ResultPremade(op) => op.validate(),
            WorkerOperation::ResultDelete(op) => op.validate(),
            WorkerOperation::PaymentApprove(op) => op.validate(),
        }
    }

    /// Stable tag used for logging and metrics labels.
    pub fn tag(&self) -> &'static str {
        match self {
            WorkerOperation::Proposal(_) => "proposal",
            WorkerOperation::ProposalDelete(_) => "proposal_delete",
            WorkerOperation::Techspec(_) => "techspec",
            WorkerOperation::TechspecDelete(_) => "techspec_delete",
            WorkerOperation::TechspecApprove(_) => "techspec_approve",
            WorkerOperation::Assign(_) => "assign",
            WorkerOperation::Result(_) => "result",
            WorkerOperation::ResultPremade(_) => "result_premade",
            WorkerOperation::ResultDelete(_) => "result_delete",
            WorkerOperation::PaymentApprove(_) => "payment_approve",
        }
    }

    /// The account whose posting authority the host must have verified.
    pub fn required_posting_authority(&self) -> &AccountName {
        match self {
            WorkerOperation::Proposal(op) => &op.author,
            WorkerOperation::ProposalDelete(op) => &op.author,
            WorkerOperation::Techspec(op) => &op.author,
            WorkerOperation::TechspecDelete(op) => &op.author,
            WorkerOperation::TechspecApprove(op) => &op.approver,
            WorkerOperation::Assign(op) => &op.assigner,
            WorkerOperation::Result(op) => &op.author,
            WorkerOperation::ResultPremade(op) => &op.author,
            WorkerOperation::ResultDelete(op) => &op.author,
            WorkerOperation::PaymentApprove(op) => &op.approver,
        }
    }
}
