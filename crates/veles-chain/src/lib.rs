/*!
# Veles Chain State

The slice of host chain state the worker subsystem collaborates with.
Each store is an opaque, deterministic in-memory map owned exclusively
by the containing database:

- **comments**: `(author, permlink) → Comment` plus lookup by id
- **accounts**: account registry with liquid balances
- **witnesses**: the witness set with schedule ranks (top-19 gating)
- **properties**: the dynamic global property record (head time and the
  worker-fund counters) and the witness-median parameters

Iteration everywhere is over `BTreeMap`s so replicas visiting the same
records in the same order stay byte-identical.
*/

pub mod accounts;
pub mod comments;
pub mod error;
pub mod properties;
pub mod witnesses;

pub use accounts::{Account, AccountStore};
pub use comments::{Comment, CommentStore};
pub use error::{ChainError, Result};
pub use properties::{DynamicGlobalProperties, MedianWitnessParams};
pub use witnesses::{Witness, WitnessRank, WitnessSet};
