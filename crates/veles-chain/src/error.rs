use thiserror::Error;
use veles_types::{AccountName, PostId};

pub type Result<T> = std::result::Result<T, ChainError>;

/// Missing-entity failures raised by the chain-state stores.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("comment not found: @{author}/{permlink}")]
    MissingComment { author: AccountName, permlink: String },

    #[error("comment not found: {0}")]
    MissingCommentId(PostId),

    #[error("account not found: {0}")]
    MissingAccount(AccountName),

    #[error("witness not found: {0}")]
    MissingWitness(AccountName),

    #[error("balance adjustment overflow for {0}")]
    BalanceOverflow(AccountName),
}
