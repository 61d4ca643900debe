use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::money::{Currency, Money};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    Equal,
    Exact,
    Percentage,
}

impl std::fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SplitStrategy::Equal => "equal",
            SplitStrategy::Exact => "exact",
            SplitStrategy::Percentage => "percentage",
        };
        write!(f, "{}", s)
    }
}

/// One participant's owed share of an expense.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Split {
    pub user_id: String,
    #[schema(value_type = String)]
    pub amount: Money,
    pub percentage: Option<Decimal>,
}

/// Immutable once created. `splits` always sums to `amount`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub paid_by: String,
    #[schema(value_type = String)]
    pub amount: Money,
    pub currency: Currency,
    pub description: String,
    pub split_strategy: SplitStrategy,
    pub splits: Vec<Split>,
    pub created_at: DateTime<Utc>,
}
