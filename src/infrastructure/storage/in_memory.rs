use crate::core::errors::LedgerError;
use crate::core::models::{
    balance::UserBalance,
    expense::{Expense, Split},
    group::{Group, GroupMember},
    settlement::Settlement,
    user::User,
};
use crate::core::money::{Currency, Money};
use crate::infrastructure::storage::{Storage, UnitOfWork};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct BalanceKey {
    group_id: String,
    user_id: String,
    currency: Currency,
}

impl BalanceKey {
    fn new(group_id: &str, user_id: &str, currency: Currency) -> Self {
        BalanceKey {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            currency,
        }
    }
}

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    users_by_email: HashMap<String, String>,
    groups: HashMap<String, Group>,
    expenses: HashMap<String, Expense>,
    splits: HashMap<String, Vec<Split>>,
    settlements: HashMap<String, Settlement>,
    balances: HashMap<BalanceKey, Money>,
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>, id: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)).then_with(|| id(a).cmp(id(b))));
}

impl Tables {
    fn expenses_where(&self, keep: impl Fn(&Expense) -> bool) -> Vec<Expense> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .values()
            .filter(|e| keep(*e))
            .map(|e| self.expense_with_splits(e))
            .collect();
        newest_first(&mut expenses, |e| e.created_at, |e| &e.id);
        expenses
    }

    fn settlements_where(&self, keep: impl Fn(&Settlement) -> bool) -> Vec<Settlement> {
        let mut settlements: Vec<Settlement> = self.settlements.values().filter(|s| keep(*s)).cloned().collect();
        newest_first(&mut settlements, |s| s.created_at, |s| &s.id);
        settlements
    }

    fn expense_with_splits(&self, expense: &Expense) -> Expense {
        Expense {
            splits: self.splits.get(&expense.id).cloned().unwrap_or_default(),
            ..expense.clone()
        }
    }
}

/// All tables sit behind a single lock. A unit of work holds the write half
/// for its whole life, so units of work are serialized against each other and
/// against readers.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user_if_not_exists(&self, user: User) -> Result<User, LedgerError> {
        let mut tables = self.tables.write().await;
        if tables.users_by_email.contains_key(&user.email) {
            return Err(LedgerError::EmailAlreadyRegistered(user.email));
        }
        tables.users_by_email.insert(user.email.clone(), user.id.clone());
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users_by_email
            .get(email)
            .and_then(|user_id| tables.users.get(user_id).cloned()))
    }

    async fn list_users(&self) -> Result<Vec<User>, LedgerError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        newest_first(&mut users, |u| u.created_at, |u| &u.id);
        Ok(users)
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.get(group_id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, LedgerError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        newest_first(&mut groups, |g| g.created_at, |g| &g.id);
        Ok(groups)
    }

    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, LedgerError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables
            .groups
            .values()
            .filter(|g| g.is_member(user_id))
            .cloned()
            .collect();
        newest_first(&mut groups, |g| g.created_at, |g| &g.id);
        Ok(groups)
    }

    async fn is_group_member(&self, group_id: &str, user_id: &str) -> Result<bool, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .get(group_id)
            .map(|g| g.is_member(user_id))
            .unwrap_or(false))
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .expenses
            .get(expense_id)
            .map(|expense| tables.expense_with_splits(expense)))
    }

    async fn list_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables.expenses_where(|e| e.group_id == group_id))
    }

    async fn list_user_expenses(&self, user_id: &str) -> Result<Vec<Expense>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables.expenses_where(|e| e.paid_by == user_id))
    }

    async fn get_settlement(&self, settlement_id: &str) -> Result<Option<Settlement>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables.settlements.get(settlement_id).cloned())
    }

    async fn list_group_settlements(&self, group_id: &str) -> Result<Vec<Settlement>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables.settlements_where(|s| s.group_id == group_id))
    }

    async fn list_user_settlements(&self, user_id: &str) -> Result<Vec<Settlement>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables.settlements_where(|s| s.from_user_id == user_id || s.to_user_id == user_id))
    }

    async fn get_balance(&self, group_id: &str, user_id: &str, currency: Currency) -> Result<Money, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .balances
            .get(&BalanceKey::new(group_id, user_id, currency))
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn get_group_balances(&self, group_id: &str, currency: Currency) -> Result<Vec<UserBalance>, LedgerError> {
        let tables = self.tables.read().await;
        let mut balances: Vec<UserBalance> = tables
            .balances
            .iter()
            .filter(|(key, _)| key.group_id == group_id && key.currency == currency)
            .map(|(key, balance)| UserBalance {
                group_id: key.group_id.clone(),
                user_id: key.user_id.clone(),
                currency: key.currency,
                balance: *balance,
            })
            .collect();
        balances.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(balances)
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, LedgerError> {
        let tables = self.tables.write().await;
        Ok(Box::new(InMemoryUnitOfWork {
            tables,
            journal: Vec::new(),
            committed: false,
        }))
    }
}

enum Staged {
    Group(Group),
    Member { group_id: String, member: GroupMember },
    RemoveMember { group_id: String, user_id: String },
    Expense(Expense),
    Split { expense_id: String, split: Split },
    Settlement(Settlement),
    Delta { key: BalanceKey, delta: Money },
}

pub struct InMemoryUnitOfWork<'a> {
    tables: RwLockWriteGuard<'a, Tables>,
    journal: Vec<Staged>,
    committed: bool,
}

impl InMemoryUnitOfWork<'_> {
    fn staged_group(&self, group_id: &str) -> Option<&Group> {
        self.journal.iter().rev().find_map(|op| match op {
            Staged::Group(group) if group.id == group_id => Some(group),
            _ => None,
        })
    }

    fn group_exists(&self, group_id: &str) -> bool {
        self.tables.groups.contains_key(group_id) || self.staged_group(group_id).is_some()
    }

    /// Membership as it will look after commit.
    fn will_be_member(&self, group_id: &str, user_id: &str) -> bool {
        let mut member = self
            .tables
            .groups
            .get(group_id)
            .or_else(|| self.staged_group(group_id))
            .map(|g| g.is_member(user_id))
            .unwrap_or(false);
        for op in &self.journal {
            match op {
                Staged::Member { group_id: g, member: m } if g == group_id && m.user_id == user_id => member = true,
                Staged::RemoveMember { group_id: g, user_id: u } if g == group_id && u == user_id => member = false,
                _ => {}
            }
        }
        member
    }

    fn apply(tables: &mut Tables, op: Staged) {
        match op {
            Staged::Group(group) => {
                tables.groups.insert(group.id.clone(), group);
            }
            Staged::Member { group_id, member } => {
                if let Some(group) = tables.groups.get_mut(&group_id) {
                    if !group.is_member(&member.user_id) {
                        group.members.push(member);
                    }
                }
            }
            Staged::RemoveMember { group_id, user_id } => {
                if let Some(group) = tables.groups.get_mut(&group_id) {
                    group.members.retain(|m| m.user_id != user_id);
                }
            }
            Staged::Expense(expense) => {
                tables.expenses.insert(expense.id.clone(), Expense { splits: Vec::new(), ..expense });
            }
            Staged::Split { expense_id, split } => {
                tables.splits.entry(expense_id).or_default().push(split);
            }
            Staged::Settlement(settlement) => {
                tables.settlements.insert(settlement.id.clone(), settlement);
            }
            Staged::Delta { key, delta } => {
                *tables.balances.entry(key).or_insert(Decimal::ZERO) += delta;
            }
        }
    }

    fn ensure_open(&self) -> Result<(), LedgerError> {
        if self.committed {
            return Err(LedgerError::StorageError("unit of work already committed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<'a> UnitOfWork for InMemoryUnitOfWork<'a> {
    async fn save_group(&mut self, group: Group) -> Result<(), LedgerError> {
        self.ensure_open()?;
        self.journal.push(Staged::Group(group));
        Ok(())
    }

    async fn add_member(&mut self, group_id: &str, member: GroupMember) -> Result<(), LedgerError> {
        self.ensure_open()?;
        if !self.group_exists(group_id) {
            return Err(LedgerError::GroupNotFound(group_id.to_string()));
        }
        if self.will_be_member(group_id, &member.user_id) {
            return Err(LedgerError::AlreadyGroupMember(member.user_id));
        }
        self.journal.push(Staged::Member {
            group_id: group_id.to_string(),
            member,
        });
        Ok(())
    }

    async fn remove_member(&mut self, group_id: &str, user_id: &str) -> Result<(), LedgerError> {
        self.ensure_open()?;
        if !self.group_exists(group_id) {
            return Err(LedgerError::GroupNotFound(group_id.to_string()));
        }
        if !self.will_be_member(group_id, user_id) {
            return Err(LedgerError::NotGroupMember(user_id.to_string()));
        }
        self.journal.push(Staged::RemoveMember {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    async fn is_member(&mut self, group_id: &str, user_id: &str) -> Result<bool, LedgerError> {
        self.ensure_open()?;
        Ok(self.will_be_member(group_id, user_id))
    }

    async fn save_expense(&mut self, expense: Expense) -> Result<(), LedgerError> {
        self.ensure_open()?;
        self.journal.push(Staged::Expense(expense));
        Ok(())
    }

    async fn save_split(&mut self, expense_id: &str, split: Split) -> Result<(), LedgerError> {
        self.ensure_open()?;
        self.journal.push(Staged::Split {
            expense_id: expense_id.to_string(),
            split,
        });
        Ok(())
    }

    async fn save_settlement(&mut self, settlement: Settlement) -> Result<(), LedgerError> {
        self.ensure_open()?;
        self.journal.push(Staged::Settlement(settlement));
        Ok(())
    }

    async fn apply_delta(
        &mut self,
        group_id: &str,
        user_id: &str,
        currency: Currency,
        delta: Money,
    ) -> Result<(), LedgerError> {
        self.ensure_open()?;
        self.journal.push(Staged::Delta {
            key: BalanceKey::new(group_id, user_id, currency),
            delta,
        });
        Ok(())
    }

    async fn balance_for_update(
        &mut self,
        group_id: &str,
        user_id: &str,
        currency: Currency,
    ) -> Result<Money, LedgerError> {
        self.ensure_open()?;
        let key = BalanceKey::new(group_id, user_id, currency);
        let committed = self.tables.balances.get(&key).copied().unwrap_or(Decimal::ZERO);
        let pending: Money = self
            .journal
            .iter()
            .filter_map(|op| match op {
                Staged::Delta { key: k, delta } if *k == key => Some(*delta),
                _ => None,
            })
            .sum();
        Ok(committed + pending)
    }

    async fn commit(&mut self) -> Result<(), LedgerError> {
        self.ensure_open()?;
        let journal = std::mem::take(&mut self.journal);
        for op in journal {
            Self::apply(&mut self.tables, op);
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for InMemoryUnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.journal.is_empty() {
            warn!(staged = self.journal.len(), "unit of work dropped without commit, rolling back");
        }
    }
}
