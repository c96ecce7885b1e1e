//! Shared fixture for worker-subsystem integration tests: a database
//! with a funded worker fund, helpers to seed accounts, posts and
//! top-19 witnesses, and one wrapper per operation.
#![allow(dead_code)]

use veles_chain::WitnessRank;
use veles_types::{AccountName, Asset, PostId, Timepoint};
use veles_worker::{
    AssignOperation, Database, PaymentApproveOperation, Proposal, ProposalDeleteOperation,
    ProposalKind, ProposalOperation, ResultDeleteOperation, ResultOperation,
    ResultPremadeOperation, Result as WorkerResult, Techspec, TechspecApproveOperation,
    TechspecDeleteOperation, TechspecOperation, TechspecState, VoteOption, WorkerConfig,
    WorkerOperation, DAY_SECONDS,
};

pub const DAY: u32 = DAY_SECONDS;

pub struct TestNet {
    pub db: Database,
}

impl TestNet {
    pub fn new() -> Self {
        Self::with_config(WorkerConfig::default())
    }

    pub fn with_config(config: WorkerConfig) -> Self {
        let mut db = Database::with_config(config);
        db.process_block(Timepoint::from_secs(1_600_000_000)).unwrap();
        // Generous reserve so approvals pass unless a test drains it
        db.modify_properties(|gpo| gpo.worker_fund_balance = Asset::vls(1_000));
        Self { db }
    }

    pub fn now(&self) -> Timepoint {
        self.db.head_block_time()
    }

    /// Advance head time and run the per-block hooks.
    pub fn advance(&mut self, secs: u32) {
        let next = self.now().plus_secs(secs);
        self.db.process_block(next).unwrap();
    }

    pub fn set_fund(&mut self, reserve: Asset) {
        self.db
            .modify_properties(|gpo| gpo.worker_fund_balance = reserve);
    }

    pub fn consumption(&self) -> Asset {
        self.db.properties().worker_consumption_per_day
    }

    pub fn balance(&self, name: &AccountName) -> Asset {
        self.db.accounts().balance(name).unwrap()
    }

    pub fn assert_invariants(&self) {
        if let Err(violation) = self.db.validate_invariants() {
            panic!("invariant violated: {violation}");
        }
    }

    // ---- universe seeding --------------------------------------------

    pub fn account(&mut self, name: &str) -> AccountName {
        let name = AccountName::from(name);
        self.db.accounts_mut().create(name.clone());
        name
    }

    /// `approver0..approverN` accounts registered as top-19 witnesses.
    pub fn create_approvers(&mut self, first: u32, count: u32) -> Vec<AccountName> {
        (first..count)
            .map(|i| {
                let name = self.account(&format!("approver{i}"));
                self.db
                    .witnesses_mut()
                    .register(name.clone(), WitnessRank::Top19);
                name
            })
            .collect()
    }

    pub fn post(&mut self, author: &AccountName, permlink: &str) -> PostId {
        let now = self.now();
        self.db
            .comments_mut()
            .create_post(author.clone(), permlink, now, now.plus_secs(7 * DAY))
    }

    pub fn reply(&mut self, author: &AccountName, permlink: &str, parent: &AccountName) -> PostId {
        let now = self.now();
        self.db.comments_mut().create_reply(
            author.clone(),
            permlink,
            parent.clone(),
            now,
            now.plus_secs(7 * DAY),
        )
    }

    pub fn post_id(&self, author: &AccountName, permlink: &str) -> PostId {
        self.db.comments().get(author, permlink).unwrap().id
    }

    // ---- record access ------------------------------------------------

    pub fn proposal_record(&self, author: &AccountName, permlink: &str) -> Proposal {
        self.db
            .get_proposal(self.post_id(author, permlink))
            .unwrap()
            .clone()
    }

    pub fn techspec_record(&self, author: &AccountName, permlink: &str) -> Techspec {
        self.db
            .get_techspec(self.post_id(author, permlink))
            .unwrap()
            .clone()
    }

    pub fn techspec_state(&self, author: &AccountName, permlink: &str) -> TechspecState {
        self.techspec_record(author, permlink).state
    }

    // ---- operations ---------------------------------------------------

    pub fn proposal(
        &mut self,
        author: &AccountName,
        permlink: &str,
        kind: ProposalKind,
    ) -> WorkerResult<()> {
        self.db.apply(&WorkerOperation::Proposal(ProposalOperation {
            author: author.clone(),
            permlink: permlink.to_string(),
            kind,
        }))
    }

    pub fn proposal_delete(&mut self, author: &AccountName, permlink: &str) -> WorkerResult<()> {
        self.db
            .apply(&WorkerOperation::ProposalDelete(ProposalDeleteOperation {
                author: author.clone(),
                permlink: permlink.to_string(),
            }))
    }

    /// Techspec payload used throughout the suites: 6 VLS specification,
    /// 60 VLS development, 40 daily payments.
    pub fn techspec_op(
        &self,
        author: &AccountName,
        permlink: &str,
        proposal_author: &AccountName,
        proposal_permlink: &str,
    ) -> TechspecOperation {
        TechspecOperation {
            author: author.clone(),
            permlink: permlink.to_string(),
            worker_proposal_author: proposal_author.clone(),
            worker_proposal_permlink: proposal_permlink.to_string(),
            specification_cost: Asset::vls(6),
            development_cost: Asset::vls(60),
            payments_count: 40,
            payments_interval: DAY,
        }
    }

    pub fn techspec(
        &mut self,
        author: &AccountName,
        permlink: &str,
        proposal_author: &AccountName,
        proposal_permlink: &str,
    ) -> WorkerResult<()> {
        let op = self.techspec_op(author, permlink, proposal_author, proposal_permlink);
        self.techspec_with(op)
    }

    pub fn techspec_with(&mut self, op: TechspecOperation) -> WorkerResult<()> {
        self.db.apply(&WorkerOperation::Techspec(op))
    }

    pub fn techspec_delete(&mut self, author: &AccountName, permlink: &str) -> WorkerResult<()> {
        self.db
            .apply(&WorkerOperation::TechspecDelete(TechspecDeleteOperation {
                author: author.clone(),
                permlink: permlink.to_string(),
            }))
    }

    pub fn techspec_approve(
        &mut self,
        approver: &AccountName,
        author: &AccountName,
        permlink: &str,
        state: VoteOption,
    ) -> WorkerResult<()> {
        self.db
            .apply(&WorkerOperation::TechspecApprove(TechspecApproveOperation {
                approver: approver.clone(),
                author: author.clone(),
                permlink: permlink.to_string(),
                state,
            }))
    }

    /// `approver<first>..approver<first+n>` all cast the same techspec
    /// vote.
    pub fn techspec_approve_by(
        &mut self,
        first: u32,
        n: u32,
        author: &AccountName,
        permlink: &str,
        state: VoteOption,
    ) {
        for i in first..first + n {
            let approver = AccountName::from(format!("approver{i}"));
            self.techspec_approve(&approver, author, permlink, state)
                .unwrap();
        }
    }

    pub fn assign(
        &mut self,
        assigner: &AccountName,
        techspec_author: &AccountName,
        techspec_permlink: &str,
        worker: Option<&AccountName>,
    ) -> WorkerResult<()> {
        self.db.apply(&WorkerOperation::Assign(AssignOperation {
            assigner: assigner.clone(),
            worker_techspec_author: techspec_author.clone(),
            worker_techspec_permlink: techspec_permlink.to_string(),
            worker: worker.cloned(),
        }))
    }

    pub fn result(
        &mut self,
        author: &AccountName,
        permlink: &str,
        techspec_permlink: &str,
    ) -> WorkerResult<()> {
        self.db.apply(&WorkerOperation::Result(ResultOperation {
            author: author.clone(),
            permlink: permlink.to_string(),
            worker_techspec_permlink: techspec_permlink.to_string(),
        }))
    }

    pub fn result_premade_op(
        &self,
        author: &AccountName,
        permlink: &str,
        proposal_author: &AccountName,
        proposal_permlink: &str,
    ) -> ResultPremadeOperation {
        ResultPremadeOperation {
            author: author.clone(),
            permlink: permlink.to_string(),
            worker_proposal_author: proposal_author.clone(),
            worker_proposal_permlink: proposal_permlink.to_string(),
            specification_cost: Asset::vls(6),
            development_cost: Asset::vls(60),
            payments_count: 2,
            payments_interval: DAY,
        }
    }

    pub fn result_premade(&mut self, op: ResultPremadeOperation) -> WorkerResult<()> {
        self.db.apply(&WorkerOperation::ResultPremade(op))
    }

    pub fn result_delete(&mut self, author: &AccountName, permlink: &str) -> WorkerResult<()> {
        self.db
            .apply(&WorkerOperation::ResultDelete(ResultDeleteOperation {
                author: author.clone(),
                permlink: permlink.to_string(),
            }))
    }

    pub fn payment_approve(
        &mut self,
        approver: &AccountName,
        techspec_author: &AccountName,
        techspec_permlink: &str,
        state: VoteOption,
    ) -> WorkerResult<()> {
        self.db
            .apply(&WorkerOperation::PaymentApprove(PaymentApproveOperation {
                approver: approver.clone(),
                worker_techspec_author: techspec_author.clone(),
                worker_techspec_permlink: techspec_permlink.to_string(),
                state,
            }))
    }

    pub fn payment_approve_by(
        &mut self,
        first: u32,
        n: u32,
        techspec_author: &AccountName,
        techspec_permlink: &str,
        state: VoteOption,
    ) {
        for i in first..first + n {
            let approver = AccountName::from(format!("approver{i}"));
            self.payment_approve(&approver, techspec_author, techspec_permlink, state)
                .unwrap();
        }
    }

    // ---- composite setups --------------------------------------------

    /// alice's task proposal plus bob's techspec, both on fresh posts.
    pub fn seed_task_with_techspec(&mut self) -> (AccountName, AccountName) {
        let alice = self.account("alice");
        let bob = self.account("bob");
        self.post(&alice, "alice-proposal");
        self.proposal(&alice, "alice-proposal", ProposalKind::Task)
            .unwrap();
        self.post(&bob, "bob-techspec");
        self.techspec(&bob, "bob-techspec", &alice, "alice-proposal")
            .unwrap();
        (alice, bob)
    }
}
