use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::money::{Currency, Money};

/// Running balance for one (group, user, currency).
///
/// Positive means the user owes money into the group, negative means the
/// user is owed money.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserBalance {
    pub group_id: String,
    pub user_id: String,
    pub currency: Currency,
    #[schema(value_type = String)]
    pub balance: Money,
}

impl UserBalance {
    pub fn is_debtor(&self) -> bool {
        self.balance.is_sign_positive() && !self.balance.is_zero()
    }

    pub fn is_creditor(&self) -> bool {
        self.balance.is_sign_negative() && !self.balance.is_zero()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BalanceSummary {
    #[schema(value_type = String)]
    pub total_positive: Money,
    #[schema(value_type = String)]
    pub total_negative: Money,
    #[schema(value_type = String)]
    pub net_balance: Money,
    pub user_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceSheet {
    pub group_id: String,
    pub currency: Currency,
    pub balances: Vec<UserBalance>,
    pub summary: BalanceSummary,
}
