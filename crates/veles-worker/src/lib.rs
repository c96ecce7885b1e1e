/*!
# Veles Worker Subsystem

The worker-proposal funding subsystem of the Veles chain. Community
members propose work, bidders attach techspecs with costs and payment
schedules, the elected top-19 witnesses approve or disapprove, assigned
workers deliver results, and approved work is paid in installments from
the shared worker fund.

## Core pieces

- **objects**: the persisted records (`Proposal`, `Techspec`, vote
  rows) and their state enums
- **operations**: the tagged operation set with stateless payload
  validation
- **store**: indexed containers with the secondary keys the evaluators
  and the payout tick rely on
- **database**: chain-state collaborators, undo sessions and the
  `apply` / `process_block` entry points
- **evaluators**: one handler per operation kind
- **fund**: the solvency oracle gating techspec approval
- **tick**: the approve-term sweep and the per-block payout tick
- **metrics**: Prometheus counters and gauges

## Determinism

The subsystem runs synchronously inside block validation. Every
transition is a function of the ordered operation stream and the head
block time; replicas processing the same stream reach byte-identical
state. Evaluators never suspend, never read the wall clock and never
touch anything outside the database handed to them.

## Example

```rust
use veles_types::{AccountName, Timepoint};
use veles_worker::{Database, ProposalKind, ProposalOperation, WorkerOperation};

let mut db = Database::new();
let alice = AccountName::from("alice");
db.accounts_mut().create(alice.clone());
let now = Timepoint::from_secs(1_000);
db.comments_mut()
    .create_post(alice.clone(), "better-docs", now, now.plus_secs(7 * 86_400));

db.apply(&WorkerOperation::Proposal(ProposalOperation {
    author: alice,
    permlink: "better-docs".to_string(),
    kind: ProposalKind::Task,
}))
.unwrap();
```
*/

pub mod database;
pub mod error;
mod evaluators;
pub mod fund;
pub mod metrics;
pub mod objects;
pub mod operations;
pub mod store;
mod tick;

/// Size of the elected top witness tier.
pub const TOP_WITNESS_COUNT: u32 = 19;
/// Approvals required to finalize (11 of 19).
pub const MAJOR_VOTED_WITNESSES: u32 = 11;
/// Disapprovals required to close (17 of 19).
pub const SUPER_MAJOR_VOTED_WITNESSES: u32 = 17;
/// Seconds in one day, the payout accounting unit.
pub const DAY_SECONDS: u32 = 86_400;
/// Longest permlink an operation payload may carry.
pub const MAX_PERMLINK_LENGTH: usize = 256;

pub use database::{Database, WorkerConfig};
pub use error::{Result, WorkerError};
pub use fund::{check_solvency, consumption_per_day};
pub use objects::{
    Proposal, ProposalKind, ProposalState, Techspec, TechspecState, VoteOption, VoteState,
    VoteTally,
};
pub use operations::{
    AssignOperation, PaymentApproveOperation, ProposalDeleteOperation, ProposalOperation,
    ResultDeleteOperation, ResultOperation, ResultPremadeOperation, TechspecApproveOperation,
    TechspecDeleteOperation, TechspecOperation, ValidationError, WorkerOperation,
};
pub use store::WorkerStore;
