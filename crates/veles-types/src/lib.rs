/*!
# Veles Core Types

Value types shared by every Veles chain subsystem:

- **asset**: fixed-point token amounts with enforced symbols
- **id**: post identifiers and account names
- **time**: second-resolution timepoints with a "never" sentinel

All types are plain data with deterministic semantics. Nothing in this
crate reads the wall clock or any other ambient state, so the same
inputs always produce the same values on every replica.
*/

pub mod asset;
pub mod id;
pub mod time;

pub use asset::{Asset, ParseAssetError, Symbol, VELES_BASE_UNIT, VELES_DECIMALS};
pub use id::{AccountName, PostId};
pub use time::Timepoint;
