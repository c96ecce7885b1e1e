//! One evaluator per operation kind. Each consults the entity store,
//! checks its preconditions in a fixed order, mutates through the
//! database's undo-tracked primitives and returns a typed failure on
//! the first violated guard.

use crate::database::Database;
use crate::error::{Result, WorkerError};
use crate::fund;
use crate::metrics;
use crate::objects::{
    Proposal, ProposalKind, ProposalState, Techspec, TechspecState, VoteOption, VoteState,
};
use crate::operations::{
    AssignOperation, PaymentApproveOperation, ProposalDeleteOperation, ProposalOperation,
    ResultDeleteOperation, ResultOperation, ResultPremadeOperation, TechspecApproveOperation,
    TechspecDeleteOperation, TechspecOperation,
};
use crate::{MAJOR_VOTED_WITNESSES, SUPER_MAJOR_VOTED_WITNESSES};
use tracing::info;
use veles_chain::{Comment, WitnessRank};
use veles_types::Timepoint;

fn wrong_techspec_state(state: TechspecState) -> WorkerError {
    WorkerError::WrongStateForOperation {
        entity: "techspec",
        state: format!("{state:?}"),
    }
}

pub(crate) fn apply_proposal(db: &mut Database, op: &ProposalOperation) -> Result<()> {
    let post = db.get_comment(&op.author, &op.permlink)?.clone();
    if !post.is_post() {
        return Err(WorkerError::NotOnPost);
    }

    if let Some(proposal) = db.find_proposal(post.id) {
        if proposal.state != ProposalState::Created {
            return Err(WorkerError::CannotEditApprovedProposal);
        }
        // Techspecs are created against the proposal's type; flipping it
        // under them would strand premade accounting.
        if proposal.kind != op.kind && db.store().proposal_has_techspecs(post.id) {
            return Err(WorkerError::CannotChangeTypeWithTechspecs);
        }
        db.modify_proposal(post.id, |p| p.kind = op.kind)?;
        info!(proposal = %post.id, kind = ?op.kind, "worker proposal modified");
        return Ok(());
    }

    if !post.in_cashout_window() {
        return Err(WorkerError::OutsideCashoutWindow);
    }

    db.put_proposal(
        post.id,
        Proposal {
            post: post.id,
            kind: op.kind,
            state: ProposalState::Created,
            approved_techspec_post: None,
        },
    );
    info!(proposal = %post.id, author = %op.author, kind = ?op.kind, "worker proposal created");
    Ok(())
}

pub(crate) fn apply_proposal_delete(db: &mut Database, op: &ProposalDeleteOperation) -> Result<()> {
    let post = db.get_comment(&op.author, &op.permlink)?.clone();
    db.get_proposal(post.id)?;

    if db.store().proposal_has_techspecs(post.id) {
        return Err(WorkerError::HasDependentTechspecs);
    }

    db.remove_proposal(post.id)?;
    info!(proposal = %post.id, "worker proposal deleted");
    Ok(())
}

pub(crate) fn apply_techspec(db: &mut Database, op: &TechspecOperation) -> Result<()> {
    let post = db.get_comment(&op.author, &op.permlink)?.clone();
    if !post.is_post() {
        return Err(WorkerError::NotOnPost);
    }

    let proposal_post = db
        .get_comment(&op.worker_proposal_author, &op.worker_proposal_permlink)?
        .clone();
    let proposal = db
        .find_proposal(proposal_post.id)
        .ok_or(WorkerError::MissingProposal(proposal_post.id))?
        .clone();

    if proposal.state != ProposalState::Created {
        return Err(WorkerError::ProposalAlreadyApproved);
    }
    if proposal.kind == ProposalKind::PremadeWork {
        return Err(WorkerError::TechspecForPremadeProposal);
    }

    if let Some(existing) = db.find_techspec(post.id) {
        if existing.worker_proposal_post != proposal_post.id {
            return Err(WorkerError::TechspecUsedByAnotherProposal);
        }
        db.modify_techspec(post.id, |t| {
            t.specification_cost = op.specification_cost;
            t.development_cost = op.development_cost;
            t.payments_count = op.payments_count;
            t.payments_interval = op.payments_interval;
        })?;
        info!(techspec = %post.id, "worker techspec modified");
        return Ok(());
    }

    if !post.in_cashout_window() {
        return Err(WorkerError::OutsideCashoutWindow);
    }

    db.put_techspec(
        post.id,
        Techspec {
            post: post.id,
            worker_proposal_post: proposal_post.id,
            state: TechspecState::Created,
            worker: None,
            worker_result_post: None,
            specification_cost: op.specification_cost,
            development_cost: op.development_cost,
            payments_count: op.payments_count,
            payments_interval: op.payments_interval,
            next_cashout_time: Timepoint::NEVER,
            finished_payments_count: 0,
        },
    );
    info!(
        techspec = %post.id,
        proposal = %proposal_post.id,
        author = %op.author,
        "worker techspec created"
    );
    Ok(())
}

pub(crate) fn apply_techspec_delete(db: &mut Database, op: &TechspecDeleteOperation) -> Result<()> {
    let post = db.get_comment(&op.author, &op.permlink)?.clone();
    let techspec = db.get_techspec(post.id)?.clone();

    if techspec.state >= TechspecState::Payment {
        return Err(WorkerError::CannotDeletePayingTechspec);
    }

    // A techspec nobody voted on vanishes without trace; one with votes
    // leaves a closed record behind so the votes' history has an owner.
    let has_votes = !db.store().techspec_votes_for(post.id).is_empty();
    if has_votes {
        db.close_techspec(post.id, TechspecState::ClosedByAuthor)?;
    } else {
        db.remove_techspec(post.id)?;
        info!(techspec = %post.id, "worker techspec removed");
    }
    Ok(())
}

pub(crate) fn apply_techspec_approve(
    db: &mut Database,
    op: &TechspecApproveOperation,
) -> Result<()> {
    if db.witnesses().get(&op.approver)?.rank != WitnessRank::Top19 {
        return Err(WorkerError::ApproverNotTop19);
    }

    let post = db.get_comment(&op.author, &op.permlink)?.clone();
    let techspec = db.get_techspec(post.id)?.clone();
    let proposal = db.get_proposal(techspec.worker_proposal_post)?.clone();

    if proposal.state != ProposalState::Created {
        return Err(WorkerError::ProposalAlreadyApproved);
    }
    if techspec.state != TechspecState::Created {
        return Err(wrong_techspec_state(techspec.state));
    }

    let key = (post.id, op.approver.clone());
    let existing = db.store().techspec_vote(&key);

    let new_state = match op.state.as_vote_state() {
        None => {
            if existing.is_none() {
                return Err(WorkerError::NoVoteToWithdraw);
            }
            db.remove_techspec_vote(key);
            return Ok(());
        }
        Some(state) => state,
    };

    if existing == Some(new_state) {
        return Err(WorkerError::VoteUnchanged);
    }
    db.put_techspec_vote(key, new_state);
    metrics::VOTES_CAST
        .with_label_values(&["techspec", vote_label(new_state)])
        .inc();

    let tally = db.count_techspec_approves(post.id);

    match new_state {
        VoteState::Disapprove => {
            if tally.disapproves < SUPER_MAJOR_VOTED_WITNESSES {
                return Ok(());
            }
            db.close_techspec(post.id, TechspecState::ClosedByWitnesses)?;
        }
        VoteState::Approve => {
            if tally.approves < MAJOR_VOTED_WITNESSES {
                return Ok(());
            }

            fund::check_solvency(db.properties(), &techspec)?;

            let consumption = fund::consumption_per_day(&techspec)?;
            let increased = db
                .properties()
                .worker_consumption_per_day
                .checked_add(consumption)
                .ok_or(WorkerError::AmountOverflow)?;
            db.modify_properties(|gpo| gpo.worker_consumption_per_day = increased);

            db.modify_proposal(proposal.post, |p| {
                p.approved_techspec_post = Some(post.id);
                p.state = ProposalState::Techspec;
            })?;

            if db.config().clear_votes_on_finalization {
                db.clear_techspec_votes(post.id);
            }

            db.modify_techspec(post.id, |t| t.state = TechspecState::Approved)?;
            info!(
                techspec = %post.id,
                proposal = %proposal.post,
                consumption = %consumption,
                "✅ worker techspec approved"
            );
        }
    }
    Ok(())
}

/// Shared guard for both result operations: the result post must be a
/// top-level post not already serving as a techspec or another result.
fn check_result_post(db: &Database, post: &Comment) -> Result<()> {
    if !post.is_post() {
        return Err(WorkerError::NotOnPost);
    }
    if db.store().techspec_by_result_post(post.id).is_some() {
        return Err(WorkerError::PostAlreadyUsedAsResult);
    }
    if db.find_techspec(post.id).is_some() {
        return Err(WorkerError::PostAlreadyUsedAsTechspec);
    }
    Ok(())
}

pub(crate) fn apply_result(db: &mut Database, op: &ResultOperation) -> Result<()> {
    let post = db.get_comment(&op.author, &op.permlink)?.clone();
    check_result_post(db, &post)?;

    // The techspec post is resolved under the result author's name: only
    // the techspec author may attach a result.
    let techspec_post = db
        .get_comment(&op.author, &op.worker_techspec_permlink)?
        .clone();
    let techspec = db.get_techspec(techspec_post.id)?.clone();
    let proposal = db.get_proposal(techspec.worker_proposal_post)?.clone();

    if proposal.kind == ProposalKind::PremadeWork {
        return Err(WorkerError::ResultForPremadeProposal);
    }
    if techspec.state != TechspecState::Work && techspec.state != TechspecState::Wip {
        return Err(wrong_techspec_state(techspec.state));
    }

    db.modify_techspec(techspec_post.id, |t| {
        t.worker_result_post = Some(post.id);
        t.state = TechspecState::Complete;
    })?;
    info!(techspec = %techspec_post.id, result = %post.id, "worker result submitted");
    Ok(())
}

pub(crate) fn apply_result_premade(db: &mut Database, op: &ResultPremadeOperation) -> Result<()> {
    let post = db.get_comment(&op.author, &op.permlink)?.clone();
    check_result_post(db, &post)?;

    let proposal_post = db
        .get_comment(&op.worker_proposal_author, &op.worker_proposal_permlink)?
        .clone();
    let proposal = db.get_proposal(proposal_post.id)?.clone();

    if proposal.kind != ProposalKind::PremadeWork {
        return Err(WorkerError::ResultRequiresPremadeProposal);
    }
    if proposal.state != ProposalState::Created {
        return Err(WorkerError::ProposalAlreadyApproved);
    }

    // Premade work skips the techspec-approval phase entirely: the
    // record is born complete, authored and worked by the submitter.
    db.put_techspec(
        post.id,
        Techspec {
            post: post.id,
            worker_proposal_post: proposal_post.id,
            state: TechspecState::Complete,
            worker: Some(op.author.clone()),
            worker_result_post: Some(post.id),
            specification_cost: op.specification_cost,
            development_cost: op.development_cost,
            payments_count: op.payments_count,
            payments_interval: op.payments_interval,
            next_cashout_time: Timepoint::NEVER,
            finished_payments_count: 0,
        },
    );
    info!(
        techspec = %post.id,
        proposal = %proposal_post.id,
        worker = %op.author,
        "premade worker result submitted"
    );
    Ok(())
}

pub(crate) fn apply_result_delete(db: &mut Database, op: &ResultDeleteOperation) -> Result<()> {
    let post = db.get_comment(&op.author, &op.permlink)?.clone();
    let techspec = db.get_techspec_by_result(post.id)?.clone();

    if techspec.state >= TechspecState::Payment {
        return Err(WorkerError::CannotDeletePayingResult);
    }

    db.modify_techspec(techspec.post, |t| {
        t.worker_result_post = None;
        t.state = TechspecState::Wip;
    })?;
    info!(techspec = %techspec.post, result = %post.id, "worker result withdrawn");
    Ok(())
}

pub(crate) fn apply_payment_approve(db: &mut Database, op: &PaymentApproveOperation) -> Result<()> {
    if db.witnesses().get(&op.approver)?.rank != WitnessRank::Top19 {
        return Err(WorkerError::ApproverNotTop19);
    }

    let techspec_post = db
        .get_comment(&op.worker_techspec_author, &op.worker_techspec_permlink)?
        .clone();
    let techspec = db.get_techspec(techspec_post.id)?.clone();
    let proposal = db.get_proposal(techspec.worker_proposal_post)?.clone();

    match techspec.state {
        TechspecState::Wip
        | TechspecState::Work
        | TechspecState::Complete
        | TechspecState::Payment => {}
        other => return Err(wrong_techspec_state(other)),
    }

    if techspec.state == TechspecState::Complete {
        if proposal.kind == ProposalKind::PremadeWork && proposal.state != ProposalState::Created {
            return Err(WorkerError::ProposalAlreadyHasApprovedResult);
        }

        let result_post_id = techspec
            .worker_result_post
            .ok_or(WorkerError::MissingWorkerResult(techspec_post.id))?;
        let result_post = db.get_comment_by_id(result_post_id)?.clone();
        let deadline = result_post
            .created
            .plus_secs(db.median_params().worker_result_approve_term_sec);
        if db.head_block_time() > deadline {
            return Err(WorkerError::ApproveTermExpired);
        }
    } else if op.state == VoteOption::Approve {
        return Err(WorkerError::TechspecCannotBeApprovedYet);
    }

    let key = (techspec_post.id, op.approver.clone());
    let existing = db.store().payment_vote(&key);

    let new_state = match op.state.as_vote_state() {
        None => {
            if existing.is_none() {
                return Err(WorkerError::NoVoteToWithdraw);
            }
            db.remove_payment_vote(key);
            return Ok(());
        }
        Some(state) => state,
    };

    if existing == Some(new_state) {
        return Err(WorkerError::VoteUnchanged);
    }
    db.put_payment_vote(key, new_state);
    metrics::VOTES_CAST
        .with_label_values(&["payment", vote_label(new_state)])
        .inc();

    let tally = db.count_payment_approves(techspec_post.id);

    match new_state {
        VoteState::Disapprove => {
            if tally.disapproves < SUPER_MAJOR_VOTED_WITNESSES {
                return Ok(());
            }
            // Disapproval of an already-paying techspec is the harsher
            // verdict and gets its own terminal state.
            if techspec.state == TechspecState::Payment {
                db.close_techspec(techspec_post.id, TechspecState::DisapprovedByWitnesses)?;
            } else {
                db.close_techspec(techspec_post.id, TechspecState::ClosedByWitnesses)?;
            }
        }
        VoteState::Approve => {
            if tally.approves < MAJOR_VOTED_WITNESSES {
                return Ok(());
            }

            // Premade work skipped the techspec-approval phase, so its
            // claim on the fund is registered here, when paying starts.
            if proposal.kind == ProposalKind::PremadeWork {
                let consumption = fund::consumption_per_day(&techspec)?;
                let increased = db
                    .properties()
                    .worker_consumption_per_day
                    .checked_add(consumption)
                    .ok_or(WorkerError::AmountOverflow)?;
                db.modify_properties(|gpo| gpo.worker_consumption_per_day = increased);
            }

            let next_cashout = db.head_block_time().plus_secs(techspec.payments_interval);
            db.modify_techspec(techspec_post.id, |t| {
                t.next_cashout_time = next_cashout;
                t.state = TechspecState::Payment;
            })?;

            if proposal.kind == ProposalKind::PremadeWork {
                db.modify_proposal(proposal.post, |p| {
                    p.state = ProposalState::Techspec;
                    p.approved_techspec_post = Some(techspec_post.id);
                })?;
            }

            if db.config().clear_votes_on_finalization {
                db.clear_payment_votes(techspec_post.id);
            }

            info!(
                techspec = %techspec_post.id,
                next_cashout = %next_cashout,
                "✅ worker payment approved"
            );
        }
    }
    Ok(())
}

pub(crate) fn apply_assign(db: &mut Database, op: &AssignOperation) -> Result<()> {
    let techspec_post = db
        .get_comment(&op.worker_techspec_author, &op.worker_techspec_permlink)?
        .clone();
    let techspec = db.get_techspec(techspec_post.id)?.clone();

    let Some(worker) = &op.worker else {
        // Unassign
        if techspec.state != TechspecState::Work {
            return Err(WorkerError::CannotUnassignFromNonWork);
        }
        if op.assigner != techspec_post.author && Some(&op.assigner) != techspec.worker.as_ref() {
            return Err(WorkerError::UnauthorizedUnassign);
        }
        db.modify_techspec(techspec_post.id, |t| {
            t.worker = None;
            t.state = TechspecState::Approved;
        })?;
        info!(techspec = %techspec_post.id, "worker unassigned");
        return Ok(());
    };

    if techspec.state != TechspecState::Approved {
        return Err(wrong_techspec_state(techspec.state));
    }

    let proposal = db.get_proposal(techspec.worker_proposal_post)?.clone();
    if proposal.kind != ProposalKind::Task {
        return Err(WorkerError::CannotAssignToPremade);
    }

    db.accounts().get(worker)?;

    db.modify_techspec(techspec_post.id, |t| {
        t.worker = Some(worker.clone());
        t.state = TechspecState::Work;
    })?;
    info!(techspec = %techspec_post.id, worker = %worker, "worker assigned");
    Ok(())
}

fn vote_label(state: VoteState) -> &'static str {
    match state {
        VoteState::Approve => "approve",
        VoteState::Disapprove => "disapprove",
    }
}
