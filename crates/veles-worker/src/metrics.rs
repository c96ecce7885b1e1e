//! Prometheus metrics for the worker subsystem.
//!
//! Metrics are observational only; nothing reads them back, so they
//! cannot influence consensus state.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

/// Operations applied, by operation tag
pub static OPERATIONS_APPLIED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "veles_worker_operations_applied_total",
        "Worker operations applied successfully",
        &["op"]
    )
    .unwrap()
});

/// Operations rejected, by operation tag
pub static OPERATIONS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "veles_worker_operations_rejected_total",
        "Worker operations rejected by an evaluator",
        &["op"]
    )
    .unwrap()
});

/// Witness votes written, by collection and vote value
pub static VOTES_CAST: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "veles_worker_votes_cast_total",
        "Witness votes written",
        &["collection", "vote"]
    )
    .unwrap()
});

/// Techspec closures, by terminal state
pub static TECHSPECS_CLOSED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "veles_worker_techspecs_closed_total",
        "Techspecs moved to a terminal state",
        &["state"]
    )
    .unwrap()
});

/// Payout installments disbursed
pub static PAYOUTS_DISBURSED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "veles_worker_payouts_disbursed_total",
        "Payout installments disbursed"
    )
    .unwrap()
});

/// Amount disbursed, in base units
pub static PAID_BASE_UNITS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "veles_worker_paid_base_units_total",
        "Total amount disbursed from the worker fund, in base units"
    )
    .unwrap()
});

/// Current global per-day consumption, in base units
pub static CONSUMPTION_PER_DAY: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "veles_worker_consumption_per_day_base_units",
        "Global worker-fund consumption per day, in base units"
    )
    .unwrap()
});
