use crate::operations::ValidationError;
use thiserror::Error;
use veles_chain::ChainError;
use veles_types::PostId;

/// Worker-subsystem operation result type
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Typed evaluator failures. Every failure is fatal to the single
/// operation that raised it; the caller unwinds the operation's
/// mutations and records the reason code. The one exception is the
/// solvency veto, see [`WorkerError::is_solvency_veto`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkerError {
    /// Missing comment, account or witness, surfaced from the chain
    /// stores.
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("worker proposal not found for {0}")]
    MissingProposal(PostId),

    #[error("worker techspec not found for {0}")]
    MissingTechspec(PostId),

    #[error("no worker result recorded for {0}")]
    MissingWorkerResult(PostId),

    #[error("worker entries can be created only on a top-level post")]
    NotOnPost,

    #[error("post should be in its cashout window")]
    OutsideCashoutWindow,

    #[error("cannot edit a worker proposal with an approved techspec")]
    CannotEditApprovedProposal,

    #[error("cannot delete a worker proposal with techspecs")]
    HasDependentTechspecs,

    #[error("cannot change the type of a worker proposal with techspecs")]
    CannotChangeTypeWithTechspecs,

    #[error("this worker proposal already has an approved techspec")]
    ProposalAlreadyApproved,

    #[error("this worker proposal already has an approved result")]
    ProposalAlreadyHasApprovedResult,

    #[error("cannot create a techspec for a premade-work proposal")]
    TechspecForPremadeProposal,

    #[error("this techspec already serves another worker proposal")]
    TechspecUsedByAnotherProposal,

    #[error("this post is already used as a worker techspec")]
    PostAlreadyUsedAsTechspec,

    #[error("this post is already used as a worker result")]
    PostAlreadyUsedAsResult,

    #[error("a premade result can target only a premade-work proposal")]
    ResultRequiresPremadeProposal,

    #[error("a plain result cannot target a premade-work proposal")]
    ResultForPremadeProposal,

    #[error("you already voted for this object with this state")]
    VoteUnchanged,

    #[error("no vote to withdraw")]
    NoVoteToWithdraw,

    #[error("approver should be in the top 19 witnesses")]
    ApproverNotTop19,

    #[error("insufficient funds to approve worker techspec")]
    InsufficientFunds,

    #[error("approve term has expired")]
    ApproveTermExpired,

    #[error("techspec cannot be approved when paying or not finished")]
    TechspecCannotBeApprovedYet,

    #[error("cannot delete a paying worker techspec")]
    CannotDeletePayingTechspec,

    #[error("cannot delete a worker result for a paying techspec")]
    CannotDeletePayingResult,

    #[error("worker cannot be assigned to a premade-work proposal")]
    CannotAssignToPremade,

    #[error("cannot unassign a worker from finished or not started work")]
    CannotUnassignFromNonWork,

    #[error("worker can be unassigned only by the techspec author or themselves")]
    UnauthorizedUnassign,

    #[error("operation does not apply to {entity} in state {state}")]
    WrongStateForOperation { entity: &'static str, state: String },

    #[error("asset arithmetic overflow")]
    AmountOverflow,

    /// Malformed payload, detected before any state lookup.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl WorkerError {
    /// The solvency veto is the single soft failure: the vote row
    /// written before the veto is kept so witnesses need not re-vote
    /// once the fund is replenished, while the finalization itself is
    /// refused.
    pub fn is_solvency_veto(&self) -> bool {
        matches!(self, WorkerError::InsufficientFunds)
    }
}
