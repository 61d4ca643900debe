use crate::core::errors::LedgerError;
use crate::core::models::{
    balance::UserBalance,
    expense::{Expense, Split},
    group::{Group, GroupMember},
    settlement::Settlement,
    user::User,
};
use crate::core::money::{Currency, Money};
use async_trait::async_trait;

/// Persistence for the directory, the recorded expenses and settlements, and
/// the running balance ledger.
///
/// Reads go straight through. Every write that touches the ledger happens
/// inside a [`UnitOfWork`] obtained from [`Storage::begin`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fails with `EmailAlreadyRegistered` when the email is taken.
    async fn create_user_if_not_exists(&self, user: User) -> Result<User, LedgerError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, LedgerError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, LedgerError>;
    /// Newest first.
    async fn list_users(&self) -> Result<Vec<User>, LedgerError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError>;
    /// Newest first.
    async fn list_groups(&self) -> Result<Vec<Group>, LedgerError>;
    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, LedgerError>;
    async fn is_group_member(&self, group_id: &str, user_id: &str) -> Result<bool, LedgerError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError>;
    /// Newest first.
    async fn list_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError>;
    /// Expenses the user paid for, newest first.
    async fn list_user_expenses(&self, user_id: &str) -> Result<Vec<Expense>, LedgerError>;
    async fn get_settlement(&self, settlement_id: &str) -> Result<Option<Settlement>, LedgerError>;
    /// Newest first.
    async fn list_group_settlements(&self, group_id: &str) -> Result<Vec<Settlement>, LedgerError>;
    /// Settlements the user paid or received, newest first.
    async fn list_user_settlements(&self, user_id: &str) -> Result<Vec<Settlement>, LedgerError>;
    /// Zero when no balance row exists yet.
    async fn get_balance(&self, group_id: &str, user_id: &str, currency: Currency) -> Result<Money, LedgerError>;
    /// Every balance row of the group in `currency`, ordered by user id.
    async fn get_group_balances(&self, group_id: &str, currency: Currency) -> Result<Vec<UserBalance>, LedgerError>;
    /// Opens an all-or-nothing unit of work.
    ///
    /// An implementation may hold exclusive access to the store until the unit
    /// of work is committed or dropped, so callers finish their plain reads
    /// before calling this.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, LedgerError>;
}

/// Staged writes that become visible together on [`UnitOfWork::commit`].
///
/// Dropping a unit of work without committing discards every staged write,
/// whether the caller returned early with an error or panicked.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn save_group(&mut self, group: Group) -> Result<(), LedgerError>;
    async fn add_member(&mut self, group_id: &str, member: GroupMember) -> Result<(), LedgerError>;
    async fn remove_member(&mut self, group_id: &str, user_id: &str) -> Result<(), LedgerError>;
    /// Membership as it will be after commit. No other writer can change it
    /// before then.
    async fn is_member(&mut self, group_id: &str, user_id: &str) -> Result<bool, LedgerError>;
    /// Stores the expense header; its splits are written through `save_split`.
    async fn save_expense(&mut self, expense: Expense) -> Result<(), LedgerError>;
    async fn save_split(&mut self, expense_id: &str, split: Split) -> Result<(), LedgerError>;
    async fn save_settlement(&mut self, settlement: Settlement) -> Result<(), LedgerError>;
    /// Adds a signed amount to a balance, creating the row at zero first.
    async fn apply_delta(
        &mut self,
        group_id: &str,
        user_id: &str,
        currency: Currency,
        delta: Money,
    ) -> Result<(), LedgerError>;
    /// Current balance including deltas staged in this unit of work. No other
    /// writer can change it before commit.
    async fn balance_for_update(&mut self, group_id: &str, user_id: &str, currency: Currency)
    -> Result<Money, LedgerError>;
    async fn commit(&mut self) -> Result<(), LedgerError>;
}

pub mod in_memory;
