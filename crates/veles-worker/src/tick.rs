//! Per-block maintenance: the approve-term sweep and the payout tick.
//!
//! Both run from `Database::process_block` in a fixed order (sweep,
//! then payouts) as part of the host's deterministic execution order.
//! Witness-schedule rotation needs no sweep of its own: tallies filter
//! by the current schedule at count time, so votes of witnesses who
//! left the top tier simply stop counting.

use crate::database::Database;
use crate::error::{Result, WorkerError};
use crate::fund;
use crate::metrics;
use crate::objects::{ProposalState, TechspecState, VoteState};
use tracing::info;
use veles_types::{PostId, Timepoint};

/// Close techspecs that gathered at least one approval but failed to
/// reach the threshold within the approve term of their post.
pub(crate) fn sweep_expired_techspecs(db: &mut Database) -> Result<()> {
    let head = db.head_block_time();
    let term = db.median_params().techspec_approve_term_sec;

    let candidates: Vec<PostId> = db
        .store()
        .techspecs()
        .filter(|t| t.state == TechspecState::Created)
        .map(|t| t.post)
        .collect();

    for post in candidates {
        let created = db.get_comment_by_id(post)?.created;
        if head < created.plus_secs(term) {
            continue;
        }
        let has_approval = db
            .store()
            .techspec_votes_for(post)
            .iter()
            .any(|(_, state)| *state == VoteState::Approve);
        if !has_approval {
            continue;
        }
        info!(techspec = %post, "techspec approve term expired");
        db.close_techspec(post, TechspecState::Closed)?;
    }
    Ok(())
}

/// Disburse one installment to every paying techspec whose cashout is
/// due, advancing or completing its schedule.
pub(crate) fn process_cashouts(db: &mut Database) -> Result<()> {
    let head = db.head_block_time();
    for post in db.store().due_cashouts(head) {
        pay_installment(db, post)?;
    }
    Ok(())
}

fn pay_installment(db: &mut Database, post: PostId) -> Result<()> {
    let techspec = db.get_techspec(post)?.clone();
    let author = db.get_comment_by_id(post)?.author.clone();

    let count = techspec.payments_count as u32;
    let total = techspec.total_cost().ok_or(WorkerError::AmountOverflow)?;
    let installment = total.div_floor(count).ok_or(WorkerError::AmountOverflow)?;
    // The specification share of each installment goes to the techspec
    // author, the remainder to the worker.
    let author_share = techspec
        .specification_cost
        .div_floor(count)
        .ok_or(WorkerError::AmountOverflow)?;
    let worker_share = installment
        .checked_sub(author_share)
        .ok_or(WorkerError::AmountOverflow)?;

    let fund_after = db
        .properties()
        .worker_fund_balance
        .checked_sub(installment)
        .ok_or(WorkerError::AmountOverflow)?;
    db.modify_properties(|gpo| gpo.worker_fund_balance = fund_after);

    db.adjust_balance(&author, author_share)?;
    match &techspec.worker {
        Some(worker) => db.adjust_balance(worker, worker_share)?,
        // Unreachable through normal transitions; keep the money moving
        // to the author rather than stranding it in the fund.
        None => db.adjust_balance(&author, worker_share)?,
    }

    metrics::PAYOUTS_DISBURSED.inc();
    metrics::PAID_BASE_UNITS.inc_by(installment.amount().max(0) as u64);

    let finished = techspec.finished_payments_count + 1;
    if finished == techspec.payments_count {
        let consumption = fund::consumption_per_day(&techspec)?;
        let reduced = db
            .properties()
            .worker_consumption_per_day
            .checked_sub(consumption)
            .ok_or(WorkerError::AmountOverflow)?;
        db.modify_properties(|gpo| gpo.worker_consumption_per_day = reduced);

        db.modify_techspec(post, |t| {
            t.finished_payments_count = finished;
            t.state = TechspecState::PaymentComplete;
            t.next_cashout_time = Timepoint::NEVER;
        })?;
        db.modify_proposal(techspec.worker_proposal_post, |p| {
            p.state = ProposalState::PaymentComplete;
        })?;
        info!(
            techspec = %post,
            installment = %installment,
            payments = finished,
            "💸 final worker payment disbursed"
        );
    } else {
        db.modify_techspec(post, |t| {
            t.finished_payments_count = finished;
            t.next_cashout_time = t.next_cashout_time.plus_secs(t.payments_interval);
        })?;
        info!(
            techspec = %post,
            installment = %installment,
            payment = finished,
            of = techspec.payments_count,
            "💸 worker payment disbursed"
        );
    }
    Ok(())
}
