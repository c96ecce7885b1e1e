//! Solvency oracle: per-day consumption of a techspec and the
//! fund-coverage check run before a techspec may be approved.
//!
//! All projections are computed in `u128` so that
//! `cost × seconds` products cannot overflow the asset domain.

use crate::error::{Result, WorkerError};
use crate::objects::Techspec;
use crate::DAY_SECONDS;
use tracing::debug;
use veles_chain::DynamicGlobalProperties;
use veles_types::Asset;

/// Per-day share of the worker fund a techspec claims while it is
/// approved or paying.
///
/// The share is the total cost spread over the whole payment period,
/// clamped to the total cost so a single-day techspec never claims more
/// per day than it pays out overall.
pub fn consumption_per_day(techspec: &Techspec) -> Result<Asset> {
    let total = techspec.total_cost().ok_or(WorkerError::AmountOverflow)?;
    let period = techspec.payments_period_secs();
    if period == 0 || total.is_negative() {
        // Validation refuses both; reaching here means a corrupted row.
        return Err(WorkerError::AmountOverflow);
    }

    let per_day = total.amount() as u128 * DAY_SECONDS as u128 / period as u128;
    let clamped = per_day.min(total.amount() as u128);
    Ok(Asset::new(clamped as i64, total.symbol()))
}

/// Reject approval unless the reserve plus projected revenue covers the
/// projected outflow over this techspec's whole payment period.
pub fn check_solvency(gpo: &DynamicGlobalProperties, techspec: &Techspec) -> Result<()> {
    let period = techspec.payments_period_secs() as u128;
    let day = DAY_SECONDS as u128;

    let consumption = consumption_per_day(techspec)?;

    let revenue_funds = gpo.worker_revenue_per_day.amount().max(0) as u128 * period / day
        + gpo.worker_fund_balance.amount().max(0) as u128;
    let consumption_funds = (gpo.worker_consumption_per_day.amount().max(0) as u128
        + consumption.amount() as u128)
        * period
        / day;

    debug!(
        techspec = %techspec.post,
        revenue_funds,
        consumption_funds,
        "solvency check"
    );

    if revenue_funds < consumption_funds {
        return Err(WorkerError::InsufficientFunds);
    }
    Ok(())
}
