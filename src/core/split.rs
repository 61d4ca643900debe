//! Turns an expense total and a split strategy into per-participant shares.
//!
//! Every result satisfies `sum(shares) == total` exactly. Equal splits give the
//! remainder to the last listed participant; percentage splits move rounding
//! drift onto the largest shares. Both are deterministic but depend on
//! participant order.

use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

use crate::core::errors::LedgerError;
use crate::core::models::expense::{Split, SplitStrategy};
use crate::core::money::{self, Money};
use crate::core::validation;

/// A participant as submitted with the expense. Which of `amount` and
/// `percentage` is read depends on the strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareInput {
    pub user_id: String,
    pub amount: Option<Money>,
    pub percentage: Option<Decimal>,
}

impl ShareInput {
    pub fn participant(user_id: impl Into<String>) -> Self {
        ShareInput {
            user_id: user_id.into(),
            amount: None,
            percentage: None,
        }
    }

    pub fn exact(user_id: impl Into<String>, amount: Money) -> Self {
        ShareInput {
            user_id: user_id.into(),
            amount: Some(amount),
            percentage: None,
        }
    }

    pub fn percent(user_id: impl Into<String>, percentage: Decimal) -> Self {
        ShareInput {
            user_id: user_id.into(),
            amount: None,
            percentage: Some(percentage),
        }
    }
}

pub struct SplitCalculator;

impl SplitCalculator {
    pub fn calculate(total: Money, strategy: SplitStrategy, shares: &[ShareInput]) -> Result<Vec<Split>, LedgerError> {
        validation::validate_amount("amount", total)?;
        if shares.is_empty() {
            return Err(LedgerError::InvalidSplit("at least one split is required".to_string()));
        }
        let mut seen = HashSet::with_capacity(shares.len());
        for share in shares {
            if !seen.insert(share.user_id.as_str()) {
                return Err(LedgerError::InvalidSplit(format!(
                    "user {} appears more than once",
                    share.user_id
                )));
            }
        }

        let splits = match strategy {
            SplitStrategy::Equal => Self::equal(total, shares)?,
            SplitStrategy::Exact => Self::exact(total, shares)?,
            SplitStrategy::Percentage => Self::percentage(total, shares)?,
        };

        debug_assert_eq!(splits.iter().map(|s| s.amount).sum::<Decimal>(), total);
        Ok(splits)
    }

    fn equal(total: Money, shares: &[ShareInput]) -> Result<Vec<Split>, LedgerError> {
        let count = Decimal::from(shares.len());
        let per_user = money::round(total / count);
        let assigned_before_last = per_user * (count - Decimal::ONE);
        let last = money::round(total - assigned_before_last);
        if last.is_sign_negative() && !last.is_zero() {
            return Err(LedgerError::InvalidSplit(format!(
                "{} is too small to split among {} participants",
                total,
                shares.len()
            )));
        }

        let last_index = shares.len() - 1;
        Ok(shares
            .iter()
            .enumerate()
            .map(|(i, share)| Split {
                user_id: share.user_id.clone(),
                amount: if i == last_index { last } else { per_user },
                percentage: None,
            })
            .collect())
    }

    fn exact(total: Money, shares: &[ShareInput]) -> Result<Vec<Split>, LedgerError> {
        let mut splits = Vec::with_capacity(shares.len());
        let mut sum = Decimal::ZERO;
        for share in shares {
            let amount = share.amount.ok_or_else(|| {
                LedgerError::InvalidSplit(format!("missing amount for user {}", share.user_id))
            })?;
            validation::validate_amount("splits.amount", amount)?;
            sum += amount;
            splits.push(Split {
                user_id: share.user_id.clone(),
                amount: money::round(amount),
                percentage: None,
            });
        }
        if sum != total {
            return Err(LedgerError::InvalidSplit(format!(
                "split amounts sum to {} but the expense total is {}",
                sum, total
            )));
        }
        Ok(splits)
    }

    fn percentage(total: Money, shares: &[ShareInput]) -> Result<Vec<Split>, LedgerError> {
        let mut splits = Vec::with_capacity(shares.len());
        let mut percent_sum = Decimal::ZERO;
        let mut assigned = Decimal::ZERO;
        for share in shares {
            let percentage = share.percentage.ok_or_else(|| {
                LedgerError::InvalidSplit(format!("missing percentage for user {}", share.user_id))
            })?;
            validation::validate_percentage(percentage)?;
            percent_sum += percentage;
            let amount = money::round(total * percentage / Decimal::ONE_HUNDRED);
            assigned += amount;
            splits.push(Split {
                user_id: share.user_id.clone(),
                amount,
                percentage: Some(percentage),
            });
        }
        if percent_sum != Decimal::ONE_HUNDRED {
            return Err(LedgerError::InvalidSplit(format!(
                "percentages sum to {} instead of 100",
                percent_sum
            )));
        }

        let drift = total - assigned;
        if !drift.is_zero() {
            debug!(%drift, "spreading percentage rounding drift over the largest shares");
            Self::spread_drift(&mut splits, drift);
        }
        Ok(splits)
    }

    /// Moves the drift one cent at a time onto the currently largest share,
    /// the last listed one on ties. The shares sum to a positive total, so a
    /// largest share never drops below zero.
    fn spread_drift(splits: &mut [Split], drift: Money) {
        let cent = Decimal::new(1, money::MONEY_SCALE);
        let step = if drift.is_sign_negative() { -cent } else { cent };
        let mut remaining = drift;
        while !remaining.is_zero() {
            let Some(largest) = splits
                .iter_mut()
                .rev()
                .reduce(|best, s| if s.amount > best.amount { s } else { best })
            else {
                return;
            };
            largest.amount += step;
            remaining -= step;
        }
    }
}
