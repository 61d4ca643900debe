use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::money::{Currency, Money};

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Settlement {
    pub id: String,
    pub group_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    #[schema(value_type = String)]
    pub amount: Money,
    pub currency: Currency,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A payment proposed by debt simplification; nothing is recorded until a
/// settlement is actually created.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SettlementSuggestion {
    pub from_user_id: String,
    pub to_user_id: String,
    #[schema(value_type = String)]
    pub amount: Money,
    pub currency: Currency,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DebtSimplification {
    pub currency: Currency,
    /// Naive pairwise upper bound: debtors x creditors.
    pub original_transaction_count: usize,
    pub simplified_transaction_count: usize,
    pub savings: usize,
    pub suggestions: Vec<SettlementSuggestion>,
}
