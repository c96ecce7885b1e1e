use serde::{Deserialize, Serialize};
use veles_types::{Asset, Symbol, Timepoint};

/// Dynamic global property record.
///
/// The worker subsystem reads all of it and mutates only the three fund
/// counters, always through the owning database's scoped-modify
/// primitive so the changes participate in undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_time: Timepoint,
    /// Worker-fund reserve available for payouts.
    pub worker_fund_balance: Asset,
    /// Inflow rate credited to the fund by emission.
    pub worker_revenue_per_day: Asset,
    /// Outflow rate claimed by approved and paying techspecs.
    pub worker_consumption_per_day: Asset,
}

impl Default for DynamicGlobalProperties {
    fn default() -> Self {
        Self {
            head_block_time: Timepoint::GENESIS,
            worker_fund_balance: Asset::zero(Symbol::Vls),
            worker_revenue_per_day: Asset::zero(Symbol::Vls),
            worker_consumption_per_day: Asset::zero(Symbol::Vls),
        }
    }
}

/// Parameters the witnesses publish and the chain medianizes. Defaults
/// match mainnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedianWitnessParams {
    /// How long a techspec may gather approvals before the sweep closes
    /// it.
    pub techspec_approve_term_sec: u32,
    /// How long after a result post witnesses may still approve payment.
    pub worker_result_approve_term_sec: u32,
}

impl Default for MedianWitnessParams {
    fn default() -> Self {
        Self {
            techspec_approve_term_sec: 14 * 86_400,
            worker_result_approve_term_sec: 5 * 86_400,
        }
    }
}
