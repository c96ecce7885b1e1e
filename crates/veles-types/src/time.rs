use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Second-resolution chain timestamp.
///
/// Block validation compares head-block time against stored timepoints;
/// the `NEVER` sentinel marks fields such as a techspec's
/// `next_cashout_time` that are unset until a state transition arms
/// them. `NEVER` is sticky under addition so arithmetic cannot
/// accidentally produce a real-looking time from the sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timepoint(i64);

impl Timepoint {
    pub const GENESIS: Timepoint = Timepoint(0);
    pub const NEVER: Timepoint = Timepoint(i64::MAX);

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub const fn secs(&self) -> i64 {
        self.0
    }

    pub const fn is_never(&self) -> bool {
        self.0 == i64::MAX
    }

    pub fn plus_secs(self, secs: u32) -> Timepoint {
        if self.is_never() {
            return Timepoint::NEVER;
        }
        Timepoint(self.0.saturating_add(secs as i64))
    }
}

impl fmt::Display for Timepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            return f.write_str("never");
        }
        match DateTime::from_timestamp(self.0, 0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            None => write!(f, "@{}", self.0),
        }
    }
}
