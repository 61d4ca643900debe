use crate::core::errors::LedgerError;
use crate::core::models::{
    balance::{BalanceSheet, BalanceSummary, UserBalance},
    expense::{Expense, SplitStrategy},
    group::{Group, GroupMember},
    settlement::{DebtSimplification, Settlement},
    user::User,
};
use crate::core::money::{Currency, Money};
use crate::core::simplify;
use crate::core::split::{ShareInput, SplitCalculator};
use crate::core::validation;
use crate::infrastructure::storage::{Storage, UnitOfWork};
use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Parsed request for [`LedgerService::create_expense`].
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub group_id: String,
    pub paid_by: String,
    pub amount: Money,
    pub currency: Option<String>,
    pub description: String,
    pub split_strategy: SplitStrategy,
    pub splits: Vec<ShareInput>,
}

/// Parsed request for [`LedgerService::create_settlement`].
#[derive(Clone, Debug)]
pub struct NewSettlement {
    pub group_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: Money,
    pub currency: Option<String>,
    pub description: Option<String>,
}

/// Clamps paging input: pages start at 1, limits outside `1..=100` fall back
/// to 10.
pub fn page_bounds(page: Option<usize>, limit: Option<usize>) -> (usize, usize) {
    let page = page.filter(|p| *p >= 1).unwrap_or(1);
    let limit = limit
        .filter(|l| (1..=MAX_PAGE_LIMIT).contains(l))
        .unwrap_or(DEFAULT_PAGE_LIMIT);
    (page, limit)
}

fn paginate<T>(items: Vec<T>, page: Option<usize>, limit: Option<usize>) -> Vec<T> {
    let (page, limit) = page_bounds(page, limit);
    items
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect()
}

pub struct LedgerService<S: Storage> {
    storage: S,
    default_currency: Currency,
}

impl<S: Storage> LedgerService<S> {
    pub fn new(storage: S, default_currency: Currency) -> Self {
        LedgerService {
            storage,
            default_currency,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn default_currency(&self) -> Currency {
        self.default_currency
    }

    fn currency(&self, code: Option<&str>) -> Result<Currency, LedgerError> {
        validation::parse_currency(code, self.default_currency)
    }

    async fn require_user(&self, user_id: &str) -> Result<User, LedgerError> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))
    }

    async fn require_group(&self, group_id: &str) -> Result<Group, LedgerError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))
    }

    /// Commits the unit of work, logging the failure when the commit itself is
    /// rejected by the backend.
    async fn commit(mut uow: Box<dyn UnitOfWork + '_>, operation: &str) -> Result<(), LedgerError> {
        uow.commit().await.map_err(|e| {
            error!("Commit failed during {}: {}", operation, e);
            e
        })
    }

    async fn require_member(uow: &mut dyn UnitOfWork, group_id: &str, user_id: &str) -> Result<(), LedgerError> {
        if uow.is_member(group_id, user_id).await? {
            Ok(())
        } else {
            Err(LedgerError::NotGroupMember(user_id.to_string()))
        }
    }

    // USERS

    pub async fn create_user(&self, name: &str, email: &str) -> Result<User, LedgerError> {
        validation::validate_name(name)?;
        validation::validate_email(email)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            created_at: Utc::now(),
        };
        let user = self.storage.create_user_if_not_exists(user).await.inspect_err(|e| {
            warn!("Could not register {}: {}", email, e);
        })?;
        info!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, LedgerError> {
        validation::validate_id("user_id", user_id)?;
        self.require_user(user_id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, LedgerError> {
        validation::validate_email(email)?;
        let email = email.trim().to_lowercase();
        self.storage
            .get_user_by_email(&email)
            .await?
            .ok_or(LedgerError::UserNotFound(email))
    }

    pub async fn list_users(&self, page: Option<usize>, limit: Option<usize>) -> Result<Vec<User>, LedgerError> {
        let users = self.storage.list_users().await?;
        Ok(paginate(users, page, limit))
    }

    pub async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, LedgerError> {
        validation::validate_id("user_id", user_id)?;
        self.require_user(user_id).await?;
        self.storage.get_user_groups(user_id).await
    }

    // GROUPS

    pub async fn create_group(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: &str,
    ) -> Result<Group, LedgerError> {
        validation::validate_name(name)?;
        if let Some(description) = description {
            validation::validate_description(description)?;
        }
        validation::validate_id("created_by", created_by)?;
        let creator = self.require_user(created_by).await?;

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.map(|d| d.trim().to_string()),
            created_by: creator.id.clone(),
            created_at: now,
            members: Vec::new(),
        };
        let member = GroupMember {
            user_id: creator.id.clone(),
            joined_at: now,
        };

        let mut uow = self.storage.begin().await?;
        uow.save_group(group.clone()).await?;
        uow.add_member(&group.id, member.clone()).await?;
        Self::commit(uow, "create_group").await?;

        info!("Created group {} '{}' by {}", group.id, group.name, creator.id);
        Ok(Group {
            members: vec![member],
            ..group
        })
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group, LedgerError> {
        validation::validate_id("group_id", group_id)?;
        self.require_group(group_id).await
    }

    pub async fn list_groups(&self, page: Option<usize>, limit: Option<usize>) -> Result<Vec<Group>, LedgerError> {
        let groups = self.storage.list_groups().await?;
        Ok(paginate(groups, page, limit))
    }

    pub async fn get_group_members(&self, group_id: &str) -> Result<Vec<User>, LedgerError> {
        let group = self.get_group(group_id).await?;
        try_join_all(group.members.iter().map(|m| self.require_user(&m.user_id))).await
    }

    pub async fn add_member(&self, group_id: &str, user_id: &str) -> Result<Group, LedgerError> {
        validation::validate_id("group_id", group_id)?;
        validation::validate_id("user_id", user_id)?;
        let group = self.require_group(group_id).await?;
        self.require_user(user_id).await?;
        if group.is_member(user_id) {
            warn!("User {} already in group {}", user_id, group_id);
            return Err(LedgerError::AlreadyGroupMember(user_id.to_string()));
        }

        let member = GroupMember {
            user_id: user_id.to_string(),
            joined_at: Utc::now(),
        };
        let mut uow = self.storage.begin().await?;
        uow.add_member(group_id, member.clone()).await?;
        Self::commit(uow, "add_member").await?;

        info!("Added user {} to group {}", user_id, group_id);
        let mut members = group.members;
        members.push(member);
        Ok(Group { members, ..group })
    }

    /// Removes a member. Their balances stay in the ledger.
    pub async fn remove_member(&self, group_id: &str, user_id: &str) -> Result<(), LedgerError> {
        validation::validate_id("group_id", group_id)?;
        validation::validate_id("user_id", user_id)?;
        let group = self.require_group(group_id).await?;
        if !group.is_member(user_id) {
            warn!("User {} is not in group {}", user_id, group_id);
            return Err(LedgerError::NotGroupMember(user_id.to_string()));
        }

        let mut uow = self.storage.begin().await?;
        uow.remove_member(group_id, user_id).await?;
        Self::commit(uow, "remove_member").await?;

        info!("Removed user {} from group {}", user_id, group_id);
        Ok(())
    }

    // EXPENSES

    /// Records an expense and moves the payer's credit and every participant's
    /// share into the ledger in one unit of work.
    pub async fn create_expense(&self, request: NewExpense) -> Result<Expense, LedgerError> {
        info!(
            "Creating {} expense in group {} paid by {} for {}",
            request.split_strategy, request.group_id, request.paid_by, request.amount
        );
        validation::validate_amount("amount", request.amount)?;
        validation::validate_description(&request.description)?;
        let currency = self.currency(request.currency.as_deref())?;
        validation::validate_id("group_id", &request.group_id)?;
        validation::validate_id("paid_by", &request.paid_by)?;

        let group = self.require_group(&request.group_id).await?;
        self.require_user(&request.paid_by).await?;
        if !self.storage.is_group_member(&group.id, &request.paid_by).await? {
            warn!("Payer {} not in group {}", request.paid_by, group.id);
            return Err(LedgerError::NotGroupMember(request.paid_by));
        }
        for share in &request.splits {
            if !self.storage.is_group_member(&group.id, &share.user_id).await? {
                warn!("User {} in splits not in group {}", share.user_id, group.id);
                return Err(LedgerError::NotGroupMember(share.user_id.clone()));
            }
        }

        let splits = SplitCalculator::calculate(request.amount, request.split_strategy, &request.splits)
            .inspect_err(|e| warn!("Rejected split for group {}: {}", group.id, e))?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: group.id.clone(),
            paid_by: request.paid_by,
            amount: request.amount,
            currency,
            description: request.description.trim().to_string(),
            split_strategy: request.split_strategy,
            splits,
            created_at: Utc::now(),
        };

        let mut uow = self.storage.begin().await?;
        if let Err(e) = Self::stage_expense(uow.as_mut(), &expense).await {
            match e {
                LedgerError::NotGroupMember(_) => warn!("Expense {} rejected: {}", expense.id, e),
                _ => error!("Rolling back expense {} in group {}: {}", expense.id, expense.group_id, e),
            }
            return Err(e);
        }
        Self::commit(uow, "create_expense").await?;

        info!(
            "Expense {} recorded in group {}: {} {} across {} splits",
            expense.id,
            expense.group_id,
            expense.amount,
            expense.currency,
            expense.splits.len()
        );
        Ok(expense)
    }

    async fn stage_expense(uow: &mut dyn UnitOfWork, expense: &Expense) -> Result<(), LedgerError> {
        // membership may have changed since the checks above
        let participants = std::iter::once(&expense.paid_by).chain(expense.splits.iter().map(|s| &s.user_id));
        for user_id in participants {
            Self::require_member(uow, &expense.group_id, user_id).await?;
        }
        uow.save_expense(expense.clone()).await?;
        for split in &expense.splits {
            uow.save_split(&expense.id, split.clone()).await?;
            uow.apply_delta(&expense.group_id, &split.user_id, expense.currency, split.amount)
                .await?;
        }
        uow.apply_delta(&expense.group_id, &expense.paid_by, expense.currency, -expense.amount)
            .await
    }

    pub async fn get_expense(&self, expense_id: &str) -> Result<Expense, LedgerError> {
        validation::validate_id("expense_id", expense_id)?;
        self.storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))
    }

    pub async fn list_group_expenses(
        &self,
        group_id: &str,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Expense>, LedgerError> {
        self.get_group(group_id).await?;
        let expenses = self.storage.list_group_expenses(group_id).await?;
        Ok(paginate(expenses, page, limit))
    }

    /// Expenses the user paid for, across all groups.
    pub async fn list_user_expenses(
        &self,
        user_id: &str,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Expense>, LedgerError> {
        self.get_user(user_id).await?;
        let expenses = self.storage.list_user_expenses(user_id).await?;
        Ok(paginate(expenses, page, limit))
    }

    // SETTLEMENTS

    /// Records a payment from a debtor to another member. The payer may not
    /// pay back more than their current balance in the currency.
    pub async fn create_settlement(&self, request: NewSettlement) -> Result<Settlement, LedgerError> {
        info!(
            "Creating settlement in group {} from {} to {} for {}",
            request.group_id, request.from_user_id, request.to_user_id, request.amount
        );
        if request.from_user_id == request.to_user_id {
            warn!("Rejected self settlement by {}", request.from_user_id);
            return Err(LedgerError::SelfSettlement);
        }
        validation::validate_amount("amount", request.amount)?;
        let currency = self.currency(request.currency.as_deref())?;
        if let Some(description) = request.description.as_deref() {
            validation::validate_description(description)?;
        }
        validation::validate_id("group_id", &request.group_id)?;
        validation::validate_id("from_user_id", &request.from_user_id)?;
        validation::validate_id("to_user_id", &request.to_user_id)?;

        let group = self.require_group(&request.group_id).await?;
        self.require_user(&request.from_user_id).await?;
        self.require_user(&request.to_user_id).await?;
        for user_id in [&request.from_user_id, &request.to_user_id] {
            if !self.storage.is_group_member(&group.id, user_id).await? {
                warn!("User {} not in group {}", user_id, group.id);
                return Err(LedgerError::NotGroupMember(user_id.clone()));
            }
        }

        let available = self
            .storage
            .get_balance(&group.id, &request.from_user_id, currency)
            .await?;
        if request.amount > available {
            warn!(
                "Settlement of {} exceeds balance {} of {} in group {}",
                request.amount, available, request.from_user_id, group.id
            );
            return Err(LedgerError::InsufficientDebt {
                available,
                requested: request.amount,
            });
        }

        let settlement = Settlement {
            id: Uuid::new_v4().to_string(),
            group_id: group.id.clone(),
            from_user_id: request.from_user_id,
            to_user_id: request.to_user_id,
            amount: request.amount,
            currency,
            description: request.description.map(|d| d.trim().to_string()),
            created_at: Utc::now(),
        };

        let mut uow = self.storage.begin().await?;
        if let Err(e) = Self::stage_settlement(uow.as_mut(), &settlement).await {
            match e {
                LedgerError::InsufficientDebt { .. } | LedgerError::NotGroupMember(_) => {
                    warn!("Settlement {} rejected: {}", settlement.id, e)
                }
                _ => error!("Rolling back settlement {} in group {}: {}", settlement.id, settlement.group_id, e),
            }
            return Err(e);
        }
        Self::commit(uow, "create_settlement").await?;

        info!(
            "Settlement {} recorded in group {}: {} pays {} {} {}",
            settlement.id,
            settlement.group_id,
            settlement.from_user_id,
            settlement.to_user_id,
            settlement.amount,
            settlement.currency
        );
        Ok(settlement)
    }

    async fn stage_settlement(uow: &mut dyn UnitOfWork, settlement: &Settlement) -> Result<(), LedgerError> {
        Self::require_member(uow, &settlement.group_id, &settlement.from_user_id).await?;
        Self::require_member(uow, &settlement.group_id, &settlement.to_user_id).await?;
        // another writer may have moved the balance since the fast-path check
        let available = uow
            .balance_for_update(&settlement.group_id, &settlement.from_user_id, settlement.currency)
            .await?;
        if settlement.amount > available {
            return Err(LedgerError::InsufficientDebt {
                available,
                requested: settlement.amount,
            });
        }
        uow.save_settlement(settlement.clone()).await?;
        uow.apply_delta(
            &settlement.group_id,
            &settlement.from_user_id,
            settlement.currency,
            -settlement.amount,
        )
        .await?;
        uow.apply_delta(
            &settlement.group_id,
            &settlement.to_user_id,
            settlement.currency,
            settlement.amount,
        )
        .await
    }

    pub async fn get_settlement(&self, settlement_id: &str) -> Result<Settlement, LedgerError> {
        validation::validate_id("settlement_id", settlement_id)?;
        self.storage
            .get_settlement(settlement_id)
            .await?
            .ok_or_else(|| LedgerError::SettlementNotFound(settlement_id.to_string()))
    }

    pub async fn list_group_settlements(
        &self,
        group_id: &str,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Settlement>, LedgerError> {
        self.get_group(group_id).await?;
        let settlements = self.storage.list_group_settlements(group_id).await?;
        Ok(paginate(settlements, page, limit))
    }

    /// Settlements the user paid or received, across all groups.
    pub async fn list_user_settlements(
        &self,
        user_id: &str,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Settlement>, LedgerError> {
        self.get_user(user_id).await?;
        let settlements = self.storage.list_user_settlements(user_id).await?;
        Ok(paginate(settlements, page, limit))
    }

    // BALANCES

    pub async fn get_balance(
        &self,
        group_id: &str,
        user_id: &str,
        currency: Option<&str>,
    ) -> Result<UserBalance, LedgerError> {
        let currency = self.currency(currency)?;
        self.get_group(group_id).await?;
        validation::validate_id("user_id", user_id)?;
        self.require_user(user_id).await?;
        let balance = self.storage.get_balance(group_id, user_id, currency).await?;
        Ok(UserBalance {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            currency,
            balance,
        })
    }

    pub async fn get_group_balances(
        &self,
        group_id: &str,
        currency: Option<&str>,
    ) -> Result<Vec<UserBalance>, LedgerError> {
        let currency = self.currency(currency)?;
        self.get_group(group_id).await?;
        self.storage.get_group_balances(group_id, currency).await
    }

    pub async fn get_balance_sheet(&self, group_id: &str, currency: Option<&str>) -> Result<BalanceSheet, LedgerError> {
        let currency = self.currency(currency)?;
        self.get_group(group_id).await?;
        let balances = self.storage.get_group_balances(group_id, currency).await?;

        let total_positive: Money = balances.iter().filter(|b| b.is_debtor()).map(|b| b.balance).sum();
        let total_negative: Money = balances.iter().filter(|b| b.is_creditor()).map(|b| b.balance).sum();
        let net_balance = total_positive + total_negative;
        if !net_balance.is_zero() {
            error!("Group {} {} balances do not net to zero: {}", group_id, currency, net_balance);
        }

        Ok(BalanceSheet {
            group_id: group_id.to_string(),
            currency,
            summary: BalanceSummary {
                total_positive,
                total_negative,
                net_balance,
                user_count: balances.len(),
            },
            balances,
        })
    }

    pub async fn simplify_debts(&self, group_id: &str, currency: Option<&str>) -> Result<DebtSimplification, LedgerError> {
        let currency = self.currency(currency)?;
        self.get_group(group_id).await?;
        let balances = self.storage.get_group_balances(group_id, currency).await?;

        let result = simplify::simplify(currency, &balances);
        for suggestion in &result.suggestions {
            debug!(
                "Suggest {} pays {} {} {}",
                suggestion.from_user_id, suggestion.to_user_id, suggestion.amount, currency
            );
        }
        let moved: Money = result.suggestions.iter().map(|s| s.amount).sum();
        info!(
            "Simplified debts for group {} in {}: {} payments instead of {}, moving {}",
            group_id,
            currency,
            result.simplified_transaction_count,
            result.original_transaction_count,
            moved
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_fall_back_to_defaults() {
        assert_eq!(page_bounds(None, None), (1, 10));
        assert_eq!(page_bounds(Some(0), Some(0)), (1, 10));
        assert_eq!(page_bounds(Some(3), Some(100)), (3, 100));
        assert_eq!(page_bounds(Some(2), Some(101)), (2, 10));
    }

    #[test]
    fn paginate_skips_whole_pages() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(items.clone(), Some(3), Some(10)), vec![21, 22, 23, 24, 25]);
        assert!(paginate(items.clone(), Some(4), Some(10)).is_empty());
        assert_eq!(paginate(items, None, Some(2)), vec![1, 2]);
    }

    #[test]
    fn paginate_huge_page_is_empty() {
        let items: Vec<u32> = (1..=5).collect();
        assert!(paginate(items, Some(usize::MAX), Some(10)).is_empty());
    }
}
