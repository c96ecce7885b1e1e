//! The worker database: chain-state collaborators, the worker entity
//! store, undo sessions and the operation entry point.
//!
//! Everything here is synchronous and deterministic. The host applies
//! operations in their canonical block order and calls
//! [`Database::process_block`] once per block; two replicas fed the
//! same stream reach byte-identical state.
//!
//! Undo discipline: every worker-entity mutation records its pre-image
//! into the open undo session. A failed operation therefore leaves no
//! partial state, and the host can wrap a whole block in a session of
//! its own to support fork switching.

use crate::error::{Result, WorkerError};
use crate::fund;
use crate::metrics;
use crate::objects::{
    Proposal, ProposalKind, ProposalState, Techspec, TechspecState, VoteState, VoteTally,
};
use crate::operations::WorkerOperation;
use crate::store::{VoteKey, WorkerStore};
use crate::{evaluators, tick};
use tracing::{debug, info, warn};
use veles_chain::{
    AccountStore, Comment, CommentStore, DynamicGlobalProperties, MedianWitnessParams,
    WitnessSet,
};
use veles_types::{AccountName, Asset, PostId, Timepoint};

/// Runtime-selectable policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// When on, the vote collection of a techspec is emptied as soon as
    /// a tally finalizes it (techspec approval, payment start). Closure
    /// always clears votes regardless of this flag.
    pub clear_votes_on_finalization: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            clear_votes_on_finalization: false,
        }
    }
}

/// Pre-image of a single mutated row, replayed in reverse on rollback.
#[derive(Debug, Clone)]
enum UndoRecord {
    Proposal {
        post: PostId,
        prior: Option<Proposal>,
    },
    Techspec {
        post: PostId,
        prior: Option<Techspec>,
    },
    TechspecVote {
        key: VoteKey,
        prior: Option<VoteState>,
    },
    PaymentVote {
        key: VoteKey,
        prior: Option<VoteState>,
    },
    Properties {
        prior: DynamicGlobalProperties,
    },
    Balance {
        account: AccountName,
        prior: Asset,
    },
}

#[derive(Debug, Default)]
struct UndoLog {
    records: Vec<UndoRecord>,
    /// Record-count marks of the open sessions, innermost last.
    sessions: Vec<usize>,
}

pub struct Database {
    comments: CommentStore,
    accounts: AccountStore,
    witnesses: WitnessSet,
    gpo: DynamicGlobalProperties,
    median_params: MedianWitnessParams,
    config: WorkerConfig,
    store: WorkerStore,
    undo: UndoLog,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Self::with_config(WorkerConfig::default())
    }

    pub fn with_config(config: WorkerConfig) -> Self {
        Self {
            comments: CommentStore::new(),
            accounts: AccountStore::new(),
            witnesses: WitnessSet::new(),
            gpo: DynamicGlobalProperties::default(),
            median_params: MedianWitnessParams::default(),
            config,
            store: WorkerStore::new(),
            undo: UndoLog::default(),
        }
    }

    // ---- host-side collaborator access -------------------------------

    pub fn comments(&self) -> &CommentStore {
        &self.comments
    }

    pub fn comments_mut(&mut self) -> &mut CommentStore {
        &mut self.comments
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut AccountStore {
        &mut self.accounts
    }

    pub fn witnesses(&self) -> &WitnessSet {
        &self.witnesses
    }

    pub fn witnesses_mut(&mut self) -> &mut WitnessSet {
        &mut self.witnesses
    }

    pub fn properties(&self) -> &DynamicGlobalProperties {
        &self.gpo
    }

    pub fn head_block_time(&self) -> Timepoint {
        self.gpo.head_block_time
    }

    pub fn median_params(&self) -> &MedianWitnessParams {
        &self.median_params
    }

    pub fn set_median_params(&mut self, params: MedianWitnessParams) {
        self.median_params = params;
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn store(&self) -> &WorkerStore {
        &self.store
    }

    /// Scoped modification of the global property record. The pre-image
    /// joins the open undo session, so property changes unwind together
    /// with the entity mutations around them.
    pub fn modify_properties(&mut self, f: impl FnOnce(&mut DynamicGlobalProperties)) {
        self.record(UndoRecord::Properties {
            prior: self.gpo.clone(),
        });
        f(&mut self.gpo);
        metrics::CONSUMPTION_PER_DAY.set(self.gpo.worker_consumption_per_day.amount());
    }

    // ---- undo sessions -----------------------------------------------

    pub fn begin_session(&mut self) {
        self.undo.sessions.push(self.undo.records.len());
    }

    /// Keep the innermost session's mutations. Nested commits squash
    /// into the parent session; committing the outermost session drops
    /// the retained pre-images.
    pub fn commit_session(&mut self) {
        self.undo.sessions.pop();
        if self.undo.sessions.is_empty() {
            self.undo.records.clear();
        }
    }

    /// Revert every mutation of the innermost session, newest first.
    pub fn rollback_session(&mut self) {
        let mark = self.undo.sessions.pop().unwrap_or(0);
        while self.undo.records.len() > mark {
            if let Some(record) = self.undo.records.pop() {
                self.revert(record);
            }
        }
    }

    fn record(&mut self, record: UndoRecord) {
        if !self.undo.sessions.is_empty() {
            self.undo.records.push(record);
        }
    }

    fn revert(&mut self, record: UndoRecord) {
        match record {
            UndoRecord::Proposal { post, prior } => {
                self.store.set_proposal_row(post, prior);
            }
            UndoRecord::Techspec { post, prior } => {
                self.store.set_techspec_row(post, prior);
            }
            UndoRecord::TechspecVote { key, prior } => {
                self.store.set_techspec_vote_row(key, prior);
            }
            UndoRecord::PaymentVote { key, prior } => {
                self.store.set_payment_vote_row(key, prior);
            }
            UndoRecord::Properties { prior } => {
                self.gpo = prior;
                metrics::CONSUMPTION_PER_DAY.set(self.gpo.worker_consumption_per_day.amount());
            }
            UndoRecord::Balance { account, prior } => {
                if self.accounts.set_balance(&account, prior).is_err() {
                    warn!(%account, "undo found no account to restore");
                }
            }
        }
    }

    // ---- operation entry point ---------------------------------------

    /// Validate and evaluate one operation inside its own undo session.
    ///
    /// A failure unwinds every mutation the evaluator made, with one
    /// carve-out: the solvency veto keeps the vote row written before
    /// the veto (see [`WorkerError::is_solvency_veto`]).
    pub fn apply(&mut self, op: &WorkerOperation) -> Result<()> {
        op.validate()?;

        self.begin_session();
        let outcome = self.evaluate(op);
        match &outcome {
            Ok(()) => {
                self.commit_session();
                metrics::OPERATIONS_APPLIED.with_label_values(&[op.tag()]).inc();
            }
            Err(error) if error.is_solvency_veto() => {
                self.commit_session();
                metrics::OPERATIONS_REJECTED.with_label_values(&[op.tag()]).inc();
                debug!(op = op.tag(), %error, "operation vetoed, vote retained");
            }
            Err(error) => {
                self.rollback_session();
                metrics::OPERATIONS_REJECTED.with_label_values(&[op.tag()]).inc();
                debug!(op = op.tag(), %error, "operation rejected");
            }
        }
        outcome
    }

    fn evaluate(&mut self, op: &WorkerOperation) -> Result<()> {
        match op {
            WorkerOperation::Proposal(op) => evaluators::apply_proposal(self, op),
            WorkerOperation::ProposalDelete(op) => evaluators::apply_proposal_delete(self, op),
            WorkerOperation::Techspec(op) => evaluators::apply_techspec(self, op),
            WorkerOperation::TechspecDelete(op) => evaluators::apply_techspec_delete(self, op),
            WorkerOperation::TechspecApprove(op) => {
                evaluators::apply_techspec_approve(self, op)
            }
            WorkerOperation::Assign(op) => evaluators::apply_assign(self, op),
            WorkerOperation::Result(op) => evaluators::apply_result(self, op),
            WorkerOperation::ResultPremade(op) => evaluators::apply_result_premade(self, op),
            WorkerOperation::ResultDelete(op) => evaluators::apply_result_delete(self, op),
            WorkerOperation::PaymentApprove(op) => {
                evaluators::apply_payment_approve(self, op)
            }
        }
    }

    /// Per-block hook, invoked by the host between operation
    /// application and block finalization: advances head time, closes
    /// techspecs whose approve term expired, then disburses due
    /// payouts.
    pub fn process_block(&mut self, head_time: Timepoint) -> Result<()> {
        self.begin_session();
        let outcome = self.process_block_inner(head_time);
        match &outcome {
            Ok(()) => self.commit_session(),
            Err(error) => {
                warn!(%error, "block tick failed, reverting");
                self.rollback_session();
            }
        }
        outcome
    }

    fn process_block_inner(&mut self, head_time: Timepoint) -> Result<()> {
        self.modify_properties(|gpo| gpo.head_block_time = head_time);
        tick::sweep_expired_techspecs(self)?;
        tick::process_cashouts(self)?;
        Ok(())
    }

    // ---- lookups ------------------------------------------------------

    pub fn get_comment(&self, author: &AccountName, permlink: &str) -> Result<&Comment> {
        Ok(self.comments.get(author, permlink)?)
    }

    pub fn get_comment_by_id(&self, id: PostId) -> Result<&Comment> {
        Ok(self.comments.get_by_id(id)?)
    }

    pub fn find_proposal(&self, post: PostId) -> Option<&Proposal> {
        self.store.proposal(post)
    }

    pub fn get_proposal(&self, post: PostId) -> Result<&Proposal> {
        self.store
            .proposal(post)
            .ok_or(WorkerError::MissingProposal(post))
    }

    pub fn find_techspec(&self, post: PostId) -> Option<&Techspec> {
        self.store.techspec(post)
    }

    pub fn get_techspec(&self, post: PostId) -> Result<&Techspec> {
        self.store
            .techspec(post)
            .ok_or(WorkerError::MissingTechspec(post))
    }

    pub fn get_techspec_by_result(&self, result_post: PostId) -> Result<&Techspec> {
        let post = self
            .store
            .techspec_by_result_post(result_post)
            .ok_or(WorkerError::MissingWorkerResult(result_post))?;
        self.get_techspec(post)
    }

    // ---- vote tallies -------------------------------------------------

    /// Effective techspec-approval tally: only voters currently in the
    /// top 19 count. Votes of witnesses who dropped out persist but are
    /// excluded here, which is the single source of truth for both
    /// thresholds.
    pub fn count_techspec_approves(&self, post: PostId) -> VoteTally {
        self.count_votes(self.store.techspec_votes_for(post))
    }

    /// Effective payment-approval tally, same filtering rules.
    pub fn count_payment_approves(&self, post: PostId) -> VoteTally {
        self.count_votes(self.store.payment_votes_for(post))
    }

    fn count_votes(&self, votes: Vec<(AccountName, VoteState)>) -> VoteTally {
        let mut tally = VoteTally::default();
        for (approver, state) in votes {
            if !self.witnesses.is_top19(&approver) {
                continue;
            }
            match state {
                VoteState::Approve => tally.approves += 1,
                VoteState::Disapprove => tally.disapproves += 1,
            }
        }
        tally
    }

    // ---- worker-entity mutation (undo-tracked) ------------------------

    pub(crate) fn put_proposal(&mut self, post: PostId, row: Proposal) {
        let prior = self.store.set_proposal_row(post, Some(row));
        self.record(UndoRecord::Proposal { post, prior });
    }

    pub(crate) fn modify_proposal(
        &mut self,
        post: PostId,
        f: impl FnOnce(&mut Proposal),
    ) -> Result<()> {
        let mut row = self
            .store
            .proposal(post)
            .cloned()
            .ok_or(WorkerError::MissingProposal(post))?;
        f(&mut row);
        self.put_proposal(post, row);
        Ok(())
    }

    pub(crate) fn remove_proposal(&mut self, post: PostId) -> Result<()> {
        let prior = self.store.set_proposal_row(post, None);
        if prior.is_none() {
            return Err(WorkerError::MissingProposal(post));
        }
        self.record(UndoRecord::Proposal { post, prior });
        Ok(())
    }

    pub(crate) fn put_techspec(&mut self, post: PostId, row: Techspec) {
        let prior = self.store.set_techspec_row(post, Some(row));
        self.record(UndoRecord::Techspec { post, prior });
    }

    pub(crate) fn modify_techspec(
        &mut self,
        post: PostId,
        f: impl FnOnce(&mut Techspec),
    ) -> Result<()> {
        let mut row = self
            .store
            .techspec(post)
            .cloned()
            .ok_or(WorkerError::MissingTechspec(post))?;
        f(&mut row);
        self.put_techspec(post, row);
        Ok(())
    }

    pub(crate) fn put_techspec_vote(&mut self, key: VoteKey, state: VoteState) {
        let prior = self.store.set_techspec_vote_row(key.clone(), Some(state));
        self.record(UndoRecord::TechspecVote { key, prior });
    }

    pub(crate) fn remove_techspec_vote(&mut self, key: VoteKey) {
        let prior = self.store.set_techspec_vote_row(key.clone(), None);
        self.record(UndoRecord::TechspecVote { key, prior });
    }

    pub(crate) fn put_payment_vote(&mut self, key: VoteKey, state: VoteState) {
        let prior = self.store.set_payment_vote_row(key.clone(), Some(state));
        self.record(UndoRecord::PaymentVote { key, prior });
    }

    pub(crate) fn remove_payment_vote(&mut self, key: VoteKey) {
        let prior = self.store.set_payment_vote_row(key.clone(), None);
        self.record(UndoRecord::PaymentVote { key, prior });
    }

    pub(crate) fn clear_techspec_votes(&mut self, post: PostId) {
        for (approver, _) in self.store.techspec_votes_for(post) {
            self.remove_techspec_vote((post, approver));
        }
    }

    pub(crate) fn clear_payment_votes(&mut self, post: PostId) {
        for (approver, _) in self.store.payment_votes_for(post) {
            self.remove_payment_vote((post, approver));
        }
    }

    pub(crate) fn adjust_balance(&mut self, name: &AccountName, delta: Asset) -> Result<()> {
        let prior = self.accounts.adjust_balance(name, delta)?;
        self.record(UndoRecord::Balance {
            account: name.clone(),
            prior,
        });
        Ok(())
    }

    // ---- shared transitions -------------------------------------------

    /// Close a techspec into a terminal closed state: release its claim
    /// on the fund (if any), reset the owning proposal, erase both vote
    /// collections and disarm the cashout schedule.
    pub(crate) fn close_techspec(&mut self, post: PostId, new_state: TechspecState) -> Result<()> {
        debug_assert!(new_state.is_closed());
        let techspec = self.get_techspec(post)?.clone();
        if self.techspec_claims_consumption(&techspec)? {
            self.release_active_techspec(&techspec)?;
        }
        self.clear_techspec_votes(post);
        self.clear_payment_votes(post);
        self.modify_techspec(post, |t| {
            t.state = new_state;
            t.next_cashout_time = Timepoint::NEVER;
            t.worker_result_post = None;
        })?;
        metrics::TECHSPECS_CLOSED
            .with_label_values(&[closed_state_label(new_state)])
            .inc();
        info!(techspec = %post, state = ?new_state, "⛔ techspec closed");
        Ok(())
    }

    /// Remove a techspec record entirely (pre-vote deletion path). An
    /// active techspec still releases its fund claim first so the
    /// global counters stay exact.
    pub(crate) fn remove_techspec(&mut self, post: PostId) -> Result<()> {
        let techspec = self.get_techspec(post)?.clone();
        if self.techspec_claims_consumption(&techspec)? {
            self.release_active_techspec(&techspec)?;
        }
        self.clear_techspec_votes(post);
        self.clear_payment_votes(post);
        let prior = self.store.set_techspec_row(post, None);
        self.record(UndoRecord::Techspec { post, prior });
        Ok(())
    }

    /// Whether this techspec's per-day share is currently counted into
    /// the global consumption counter. Task-path techspecs claim from
    /// approval onward; premade ones only once payment starts, since
    /// they never pass through techspec approval.
    pub(crate) fn techspec_claims_consumption(&self, techspec: &Techspec) -> Result<bool> {
        if !techspec.state.claims_consumption() {
            return Ok(false);
        }
        let proposal = self.get_proposal(techspec.worker_proposal_post)?;
        if proposal.kind == ProposalKind::PremadeWork {
            return Ok(techspec.state == TechspecState::Payment);
        }
        Ok(true)
    }

    fn release_active_techspec(&mut self, techspec: &Techspec) -> Result<()> {
        let consumption = fund::consumption_per_day(techspec)?;
        let reduced = self
            .gpo
            .worker_consumption_per_day
            .checked_sub(consumption)
            .ok_or(WorkerError::AmountOverflow)?;
        self.modify_properties(|gpo| gpo.worker_consumption_per_day = reduced);

        let proposal = self.get_proposal(techspec.worker_proposal_post)?.clone();
        if proposal.state == ProposalState::Techspec {
            self.modify_proposal(proposal.post, |p| {
                p.state = ProposalState::Created;
                p.approved_techspec_post = None;
            })?;
        }
        Ok(())
    }

    // ---- auditing -----------------------------------------------------

    /// Check the cross-entity invariants that must hold after every
    /// operation. Intended for fixtures and property tests; production
    /// hosts may call it behind a debug flag.
    pub fn validate_invariants(&self) -> std::result::Result<(), String> {
        // Active techspec per proposal, and the back-reference. "Active"
        // means holding a claim on the fund (or having fully paid out):
        // losing premade results park in Complete without a claim and do
        // not count.
        for proposal in self.store.proposals() {
            let active: Vec<PostId> = self
                .store
                .techspecs_for_proposal(proposal.post)
                .into_iter()
                .filter(|post| {
                    self.store.techspec(*post).is_some_and(|t| {
                        t.state == TechspecState::PaymentComplete
                            || self.techspec_claims_consumption(t).unwrap_or(false)
                    })
                })
                .collect();
            match proposal.state {
                ProposalState::Techspec | ProposalState::PaymentComplete => {
                    if active.len() != 1 {
                        return Err(format!(
                            "proposal {} in {:?} has {} active techspecs",
                            proposal.post,
                            proposal.state,
                            active.len()
                        ));
                    }
                    if proposal.approved_techspec_post != Some(active[0]) {
                        return Err(format!(
                            "proposal {} approved_techspec_post does not match active techspec {}",
                            proposal.post, active[0]
                        ));
                    }
                }
                ProposalState::Created | ProposalState::Closed => {
                    if !active.is_empty() {
                        return Err(format!(
                            "proposal {} in {:?} has active techspecs",
                            proposal.post, proposal.state
                        ));
                    }
                }
            }
        }

        // Global consumption equals the sum over claiming techspecs
        let mut expected: i64 = 0;
        for techspec in self.store.techspecs() {
            if self.techspec_claims_consumption(techspec).unwrap_or(false) {
                let share = fund::consumption_per_day(techspec)
                    .map_err(|e| format!("consumption of {}: {e}", techspec.post))?;
                expected += share.amount();
            }
            // Cashout sentinel is armed exactly while paying
            if techspec.next_cashout_time.is_never() != (techspec.state != TechspecState::Payment)
            {
                return Err(format!(
                    "techspec {} cashout sentinel inconsistent with {:?}",
                    techspec.post, techspec.state
                ));
            }
            // Result reference tracks the completed-or-later window
            let result_expected = matches!(
                techspec.state,
                TechspecState::Complete
                    | TechspecState::Payment
                    | TechspecState::PaymentComplete
            );
            if techspec.worker_result_post.is_some() != result_expected {
                return Err(format!(
                    "techspec {} result reference inconsistent with {:?}",
                    techspec.post, techspec.state
                ));
            }
        }
        if self.gpo.worker_consumption_per_day.amount() != expected {
            return Err(format!(
                "global consumption {} != sum of techspec claims {}",
                self.gpo.worker_consumption_per_day.amount(),
                expected
            ));
        }

        // No dangling vote rows
        for (post, approver) in self
            .store
            .techspec_vote_keys()
            .chain(self.store.payment_vote_keys())
        {
            if self.store.techspec(*post).is_none() {
                return Err(format!("vote by {approver} references missing techspec {post}"));
            }
        }
        Ok(())
    }
}

fn closed_state_label(state: TechspecState) -> &'static str {
    match state {
        TechspecState::Closed => "closed",
        TechspecState::ClosedByAuthor => "closed_by_author",
        TechspecState::ClosedByWitnesses => "closed_by_witnesses",
        TechspecState::DisapprovedByWitnesses => "disapproved_by_witnesses",
        _ => "other",
    }
}
