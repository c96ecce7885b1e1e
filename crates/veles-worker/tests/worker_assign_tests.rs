//! Worker assignment and unassignment authority.

mod common;

use common::TestNet;
use veles_chain::ChainError;
use veles_types::AccountName;
use veles_worker::{TechspecState, ValidationError, VoteOption, WorkerError};

/// Approved techspec by bob, not yet assigned.
fn seed_approved_techspec(net: &mut TestNet) -> (AccountName, AccountName) {
    net.create_approvers(0, 19);
    let (alice, bob) = net.seed_task_with_techspec();
    net.techspec_approve_by(0, 11, &bob, "bob-techspec", VoteOption::Approve);
    (alice, bob)
}

#[test]
fn test_assign_and_unassign_by_worker() {
    let mut net = TestNet::new();
    let (alice, bob) = seed_approved_techspec(&mut net);

    net.assign(&bob, &bob, "bob-techspec", Some(&alice)).unwrap();
    let techspec = net.techspec_record(&bob, "bob-techspec");
    assert_eq!(techspec.state, TechspecState::Work);
    assert_eq!(techspec.worker, Some(alice.clone()));

    // The worker may walk away on their own
    net.assign(&alice, &bob, "bob-techspec", None).unwrap();
    let techspec = net.techspec_record(&bob, "bob-techspec");
    assert_eq!(techspec.state, TechspecState::Approved);
    assert_eq!(techspec.worker, None);
    net.assert_invariants();
}

#[test]
fn test_unassign_by_techspec_author() {
    let mut net = TestNet::new();
    let (alice, bob) = seed_approved_techspec(&mut net);

    net.assign(&bob, &bob, "bob-techspec", Some(&alice)).unwrap();
    net.assign(&bob, &bob, "bob-techspec", None).unwrap();
    assert_eq!(
        net.techspec_state(&bob, "bob-techspec"),
        TechspecState::Approved
    );
}

#[test]
fn test_unassign_rejected_for_third_party() {
    let mut net = TestNet::new();
    let (alice, bob) = seed_approved_techspec(&mut net);
    let carol = net.account("carol");

    net.assign(&bob, &bob, "bob-techspec", Some(&alice)).unwrap();

    let err = net.assign(&carol, &bob, "bob-techspec", None).unwrap_err();
    assert_eq!(err, WorkerError::UnauthorizedUnassign);
}

#[test]
fn test_unassign_rejected_outside_work() {
    let mut net = TestNet::new();
    let (_alice, bob) = seed_approved_techspec(&mut net);

    let err = net.assign(&bob, &bob, "bob-techspec", None).unwrap_err();
    assert_eq!(err, WorkerError::CannotUnassignFromNonWork);
}

#[test]
fn test_assign_requires_approved_state() {
    let mut net = TestNet::new();
    let alice = net.account("alice");
    let (_, bob) = {
        let bob = net.account("bob");
        net.post(&alice, "alice-proposal");
        net.proposal(&alice, "alice-proposal", veles_worker::ProposalKind::Task)
            .unwrap();
        net.post(&bob, "bob-techspec");
        net.techspec(&bob, "bob-techspec", &alice, "alice-proposal")
            .unwrap();
        (alice.clone(), bob)
    };

    let err = net
        .assign(&bob, &bob, "bob-techspec", Some(&alice))
        .unwrap_err();
    assert!(matches!(err, WorkerError::WrongStateForOperation { .. }));
}

#[test]
fn test_assign_requires_existing_worker_account() {
    let mut net = TestNet::new();
    let (_alice, bob) = seed_approved_techspec(&mut net);
    let ghost = AccountName::from("ghost");

    let err = net
        .assign(&bob, &bob, "bob-techspec", Some(&ghost))
        .unwrap_err();
    assert_eq!(err, WorkerError::Chain(ChainError::MissingAccount(ghost)));
}

#[test]
fn test_assign_only_by_techspec_author() {
    let mut net = TestNet::new();
    let (alice, bob) = seed_approved_techspec(&mut net);
    let carol = net.account("carol");

    // Rejected before any state is touched
    let err = net
        .assign(&carol, &bob, "bob-techspec", Some(&alice))
        .unwrap_err();
    assert_eq!(
        err,
        WorkerError::Validation(ValidationError::AssignerNotTechspecAuthor)
    );
}

#[test]
fn test_reassignment_after_unassign() {
    let mut net = TestNet::new();
    let (alice, bob) = seed_approved_techspec(&mut net);
    let carol = net.account("carol");

    net.assign(&bob, &bob, "bob-techspec", Some(&alice)).unwrap();
    net.assign(&alice, &bob, "bob-techspec", None).unwrap();
    net.assign(&bob, &bob, "bob-techspec", Some(&carol)).unwrap();

    let techspec = net.techspec_record(&bob, "bob-techspec");
    assert_eq!(techspec.worker, Some(carol));
    assert_eq!(techspec.state, TechspecState::Work);
    net.assert_invariants();
}
