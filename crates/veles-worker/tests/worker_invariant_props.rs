//! Property tests over random operation sequences: the cross-entity
//! invariants must survive anything the operation surface allows, and
//! replaying a sequence on a fresh database must be deterministic.

mod common;

use common::{TestNet, DAY};
use proptest::prelude::*;
use veles_chain::{DynamicGlobalProperties, WitnessRank};
use veles_types::{AccountName, Asset, PostId};
use veles_worker::{
    AssignOperation, Database, PaymentApproveOperation, Proposal, ProposalDeleteOperation,
    ProposalKind, ProposalOperation, ResultDeleteOperation, ResultOperation,
    ResultPremadeOperation, Techspec, TechspecApproveOperation, TechspecDeleteOperation,
    VoteOption, VoteState, WorkerOperation,
};

const POSTS: usize = 6;
const WITNESSES: usize = 19;

#[derive(Debug, Clone)]
enum Action {
    Proposal { post: usize, premade: bool },
    ProposalDelete { post: usize },
    Techspec { post: usize, proposal: usize, count: u16 },
    TechspecDelete { post: usize },
    TechspecApprove { approver: usize, post: usize, vote: u8 },
    PaymentApprove { approver: usize, post: usize, vote: u8 },
    Assign { post: usize, unassign: bool, by_worker: bool },
    Result { post: usize, techspec: usize },
    ResultPremade { post: usize, proposal: usize },
    ResultDelete { post: usize },
    Advance { secs: u32 },
    Rotate { approver: usize, top: bool },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0..POSTS, any::<bool>())
            .prop_map(|(post, premade)| Action::Proposal { post, premade }),
        (0..POSTS).prop_map(|post| Action::ProposalDelete { post }),
        (0..POSTS, 0..POSTS, prop_oneof![Just(1u16), Just(2u16), Just(40u16)])
            .prop_map(|(post, proposal, count)| Action::Techspec { post, proposal, count }),
        (0..POSTS).prop_map(|post| Action::TechspecDelete { post }),
        (0..WITNESSES, 0..POSTS, 0..3u8)
            .prop_map(|(approver, post, vote)| Action::TechspecApprove { approver, post, vote }),
        (0..WITNESSES, 0..POSTS, 0..3u8)
            .prop_map(|(approver, post, vote)| Action::PaymentApprove { approver, post, vote }),
        (0..POSTS, any::<bool>(), any::<bool>())
            .prop_map(|(post, unassign, by_worker)| Action::Assign { post, unassign, by_worker }),
        (0..POSTS, 0..POSTS).prop_map(|(post, techspec)| Action::Result { post, techspec }),
        (0..POSTS, 0..POSTS)
            .prop_map(|(post, proposal)| Action::ResultPremade { post, proposal }),
        (0..POSTS).prop_map(|post| Action::ResultDelete { post }),
        (0u32..3 * DAY).prop_map(|secs| Action::Advance { secs }),
        (0..WITNESSES, any::<bool>()).prop_map(|(approver, top)| Action::Rotate { approver, top }),
    ]
}

fn permlink(i: usize) -> String {
    format!("post{i}")
}

fn vote_option(v: u8) -> VoteOption {
    match v % 3 {
        0 => VoteOption::Approve,
        1 => VoteOption::Disapprove,
        _ => VoteOption::Abstain,
    }
}

struct Universe {
    net: TestNet,
    alice: AccountName,
    bob: AccountName,
}

fn setup() -> Universe {
    let mut net = TestNet::new();
    net.create_approvers(0, WITNESSES as u32);
    let alice = net.account("alice");
    let bob = net.account("bob");
    for i in 0..POSTS {
        net.post(&alice, &permlink(i));
    }
    Universe { net, alice, bob }
}

fn apply_action(u: &mut Universe, action: &Action) {
    let alice = u.alice.clone();
    let bob = u.bob.clone();
    let approver = |i: usize| AccountName::from(format!("approver{i}"));

    match action {
        Action::Proposal { post, premade } => {
            let kind = if *premade {
                ProposalKind::PremadeWork
            } else {
                ProposalKind::Task
            };
            let _ = u.net.db.apply(&WorkerOperation::Proposal(ProposalOperation {
                author: alice,
                permlink: permlink(*post),
                kind,
            }));
        }
        Action::ProposalDelete { post } => {
            let _ = u
                .net
                .db
                .apply(&WorkerOperation::ProposalDelete(ProposalDeleteOperation {
                    author: alice,
                    permlink: permlink(*post),
                }));
        }
        Action::Techspec { post, proposal, count } => {
            let mut op = u
                .net
                .techspec_op(&alice, &permlink(*post), &alice, &permlink(*proposal));
            op.payments_count = *count;
            let _ = u.net.db.apply(&WorkerOperation::Techspec(op));
        }
        Action::TechspecDelete { post } => {
            let _ = u
                .net
                .db
                .apply(&WorkerOperation::TechspecDelete(TechspecDeleteOperation {
                    author: alice,
                    permlink: permlink(*post),
                }));
        }
        Action::TechspecApprove { approver: i, post, vote } => {
            let _ = u
                .net
                .db
                .apply(&WorkerOperation::TechspecApprove(TechspecApproveOperation {
                    approver: approver(*i),
                    author: alice,
                    permlink: permlink(*post),
                    state: vote_option(*vote),
                }));
        }
        Action::PaymentApprove { approver: i, post, vote } => {
            let _ = u
                .net
                .db
                .apply(&WorkerOperation::PaymentApprove(PaymentApproveOperation {
                    approver: approver(*i),
                    worker_techspec_author: alice,
                    worker_techspec_permlink: permlink(*post),
                    state: vote_option(*vote),
                }));
        }
        Action::Assign { post, unassign, by_worker } => {
            let (assigner, worker) = if *unassign {
                (if *by_worker { bob } else { alice.clone() }, None)
            } else {
                (alice.clone(), Some(bob))
            };
            let _ = u.net.db.apply(&WorkerOperation::Assign(AssignOperation {
                assigner,
                worker_techspec_author: alice,
                worker_techspec_permlink: permlink(*post),
                worker,
            }));
        }
        Action::Result { post, techspec } => {
            let _ = u.net.db.apply(&WorkerOperation::Result(ResultOperation {
                author: alice,
                permlink: permlink(*post),
                worker_techspec_permlink: permlink(*techspec),
            }));
        }
        Action::ResultPremade { post, proposal } => {
            let op: ResultPremadeOperation =
                u.net
                    .result_premade_op(&alice, &permlink(*post), &alice, &permlink(*proposal));
            let _ = u.net.db.apply(&WorkerOperation::ResultPremade(op));
        }
        Action::ResultDelete { post } => {
            let _ = u
                .net
                .db
                .apply(&WorkerOperation::ResultDelete(ResultDeleteOperation {
                    author: alice,
                    permlink: permlink(*post),
                }));
        }
        Action::Advance { secs } => {
            let next = u.net.now().plus_secs(*secs);
            let _ = u.net.db.process_block(next);
        }
        Action::Rotate { approver: i, top } => {
            let rank = if *top {
                WitnessRank::Top19
            } else {
                WitnessRank::Standby
            };
            let _ = u.net.db.witnesses_mut().set_rank(&approver(*i), rank);
        }
    }
}

type Snapshot = (
    Vec<Proposal>,
    Vec<Techspec>,
    Vec<(PostId, AccountName, VoteState)>,
    Vec<(PostId, AccountName, VoteState)>,
    DynamicGlobalProperties,
    Vec<Asset>,
);

fn snapshot(db: &Database, accounts: &[&AccountName]) -> Snapshot {
    let store = db.store();
    (
        store.proposals().cloned().collect(),
        store.techspecs().cloned().collect(),
        store
            .techspec_vote_keys()
            .map(|key| (key.0, key.1.clone(), store.techspec_vote(key).unwrap()))
            .collect(),
        store
            .payment_vote_keys()
            .map(|key| (key.0, key.1.clone(), store.payment_vote(key).unwrap()))
            .collect(),
        db.properties().clone(),
        accounts
            .iter()
            .map(|name| db.accounts().balance(name).unwrap())
            .collect(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invariants_hold_over_random_sequences(
        actions in prop::collection::vec(action_strategy(), 1..60)
    ) {
        let mut universe = setup();
        for action in &actions {
            apply_action(&mut universe, action);
            let check = universe.net.db.validate_invariants();
            prop_assert!(
                check.is_ok(),
                "invariant violated after {:?}: {:?}",
                action,
                check
            );
        }
    }

    #[test]
    fn prop_replay_is_deterministic(
        actions in prop::collection::vec(action_strategy(), 1..60)
    ) {
        let mut first = setup();
        let mut second = setup();
        for action in &actions {
            apply_action(&mut first, action);
            apply_action(&mut second, action);
        }
        let alice = first.alice.clone();
        let bob = first.bob.clone();
        prop_assert_eq!(
            snapshot(&first.net.db, &[&alice, &bob]),
            snapshot(&second.net.db, &[&alice, &bob])
        );
    }
}
