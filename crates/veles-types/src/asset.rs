use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const VELES_DECIMALS: u32 = 3;
pub const VELES_BASE_UNIT: i64 = 1_000; // 10^3

/// Currency symbol. Worker-fund amounts are denominated in the native
/// token only; other symbols exist so that validation has something to
/// reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// Native liquid token
    Vls,
    /// Chain-backed dollar
    Vbd,
}

impl Symbol {
    pub fn ticker(&self) -> &'static str {
        match self {
            Symbol::Vls => "VLS",
            Symbol::Vbd => "VBD",
        }
    }
}

/// Fixed-point token amount with 3 decimal places.
///
/// Arithmetic is explicit: `checked_*` operations return `None` on
/// overflow or on symbol mismatch, so mixing denominations cannot go
/// unnoticed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Asset {
    amount: i64,
    symbol: Symbol,
}

impl Asset {
    pub const fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub const fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    /// Whole native tokens, e.g. `Asset::vls(6)` is "6.000 VLS".
    pub const fn vls(whole: i64) -> Self {
        Self {
            amount: whole * VELES_BASE_UNIT,
            symbol: Symbol::Vls,
        }
    }

    /// Raw amount in base units (thousandths).
    pub const fn amount(&self) -> i64 {
        self.amount
    }

    pub const fn symbol(&self) -> Symbol {
        self.symbol
    }

    pub const fn is_negative(&self) -> bool {
        self.amount < 0
    }

    pub const fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn checked_add(&self, other: Asset) -> Option<Asset> {
        if self.symbol != other.symbol {
            return None;
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Asset::new(amount, self.symbol))
    }

    pub fn checked_sub(&self, other: Asset) -> Option<Asset> {
        if self.symbol != other.symbol {
            return None;
        }
        self.amount
            .checked_sub(other.amount)
            .map(|amount| Asset::new(amount, self.symbol))
    }

    /// Floor division of the amount, keeping the symbol.
    pub fn div_floor(&self, divisor: u32) -> Option<Asset> {
        if divisor == 0 {
            return None;
        }
        Some(Asset::new(
            self.amount.div_euclid(divisor as i64),
            self.symbol,
        ))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(
            f,
            "{}{}.{:03} {}",
            sign,
            abs / VELES_BASE_UNIT as u64,
            abs % VELES_BASE_UNIT as u64,
            self.symbol.ticker()
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseAssetError {
    #[error("malformed asset literal: {0}")]
    Malformed(String),
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}

impl FromStr for Asset {
    type Err = ParseAssetError;

    /// Parses the canonical display form, e.g. `"6.000 VLS"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseAssetError::Malformed(s.to_string());

        let (value, ticker) = s.trim().split_once(' ').ok_or_else(malformed)?;
        let symbol = match ticker {
            "VLS" => Symbol::Vls,
            "VBD" => Symbol::Vbd,
            other => return Err(ParseAssetError::UnknownSymbol(other.to_string())),
        };

        let (int_part, frac_part) = value.split_once('.').ok_or_else(malformed)?;
        if frac_part.len() != VELES_DECIMALS as usize {
            return Err(malformed());
        }
        let negative = int_part.starts_with('-');
        let whole: i64 = int_part.parse().map_err(|_| malformed())?;
        let frac: i64 = frac_part.parse().map_err(|_| malformed())?;
        let magnitude = whole.unsigned_abs() as i64 * VELES_BASE_UNIT + frac;
        let amount = if negative { -magnitude } else { magnitude };
        Ok(Asset::new(amount, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_token_constructor() {
        let a = Asset::vls(6);
        assert_eq!(a.amount(), 6_000);
        assert_eq!(a.symbol(), Symbol::Vls);
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Asset::vls(6);
        let b = Asset::vls(60);
        assert_eq!(a.checked_add(b), Some(Asset::vls(66)));
        assert_eq!(b.checked_sub(a), Some(Asset::vls(54)));

        // Symbol mismatch is not silently coerced
        let d = Asset::new(1_000, Symbol::Vbd);
        assert_eq!(a.checked_add(d), None);

        // Overflow surfaces as None
        let max = Asset::new(i64::MAX, Symbol::Vls);
        assert_eq!(max.checked_add(Asset::vls(1)), None);
    }

    #[test]
    fn test_div_floor() {
        let total = Asset::vls(66);
        assert_eq!(total.div_floor(40), Some(Asset::new(1_650, Symbol::Vls)));
        assert_eq!(total.div_floor(0), None);
    }

    #[test]
    fn test_display_round_trip() {
        let cases = [
            Asset::vls(6),
            Asset::new(1_650, Symbol::Vls),
            Asset::new(-2_500, Symbol::Vls),
            Asset::zero(Symbol::Vbd),
        ];
        for a in cases {
            let shown = a.to_string();
            assert_eq!(shown.parse::<Asset>().unwrap(), a, "round trip of {shown}");
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("6 VLS".parse::<Asset>().is_err());
        assert!("6.00 VLS".parse::<Asset>().is_err());
        assert!("6.000 XYZ".parse::<Asset>().is_err());
        assert!("six VLS".parse::<Asset>().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let a = Asset::new(1_650, Symbol::Vls);
        let json = serde_json::to_string(&a).unwrap();
        let back: Asset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
