//! Fixed-point money arithmetic.
//!
//! Amounts are `rust_decimal::Decimal` values with exactly two fraction
//! digits. Every derived amount (split shares, percentage shares) goes through
//! [`round`], which rounds half away from zero: 0.005 becomes 0.01 and
//! -0.005 becomes -0.01.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::core::errors::LedgerError;

pub type Money = Decimal;

pub const MONEY_SCALE: u32 = 2;
pub const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Largest amount accepted for a single expense or settlement.
pub fn max_amount() -> Money {
    Decimal::new(99_999_999_999, MONEY_SCALE)
}

/// Rounds to two decimals and pins the scale so `30` renders as `30.00`.
pub fn round(value: Decimal) -> Money {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, ROUNDING);
    rounded.rescale(MONEY_SCALE);
    rounded
}

pub fn has_money_scale(value: Decimal) -> bool {
    value.normalize().scale() <= MONEY_SCALE
}

/// Supported currency codes. A currency is a tag on balances; amounts in
/// different currencies are never combined or converted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
    Chf,
    Cny,
    Inr,
}

impl Currency {
    pub const ALL: [Currency; 9] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Cad,
        Currency::Aud,
        Currency::Chf,
        Currency::Cny,
        Currency::Inr,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Chf => "CHF",
            Currency::Cny => "CNY",
            Currency::Inr => "INR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| {
                LedgerError::invalid(
                    "currency",
                    "Unsupported Currency",
                    format!("Currency '{}' is not supported", s.trim()),
                )
            })
    }
}
