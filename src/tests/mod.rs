mod group_tests;

use crate::core::models::{group::Group, user::User};
use crate::core::money::{Currency, Money};
use crate::core::services::LedgerService;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use rust_decimal::Decimal;

pub fn create_test_service() -> LedgerService<InMemoryStorage> {
    LedgerService::new(InMemoryStorage::new(), Currency::Usd)
}

pub async fn create_user<S: Storage>(service: &LedgerService<S>, name: &str) -> User {
    service
        .create_user(name, &format!("{}@example.com", name.to_lowercase()))
        .await
        .unwrap()
}

/// Creates one user per name; the first one creates the group.
pub async fn group_with_members<S: Storage>(service: &LedgerService<S>, names: &[&str]) -> (Group, Vec<User>) {
    let mut users = Vec::new();
    for name in names {
        users.push(create_user(service, name).await);
    }
    let group = service.create_group("Test Group", None, &users[0].id).await.unwrap();
    for user in &users[1..] {
        service.add_member(&group.id, &user.id).await.unwrap();
    }
    let group = service.get_group(&group.id).await.unwrap();
    (group, users)
}

pub async fn balance_of<S: Storage>(service: &LedgerService<S>, group: &Group, user: &User) -> Money {
    service.get_balance(&group.id, &user.id, None).await.unwrap().balance
}

pub async fn assert_zero_sum<S: Storage>(service: &LedgerService<S>, group: &Group, currency: Currency) {
    let balances = service
        .get_group_balances(&group.id, Some(currency.code()))
        .await
        .unwrap();
    let total: Decimal = balances.iter().map(|b| b.balance).sum();
    assert_eq!(total, Decimal::ZERO, "balances {:?} do not sum to zero", balances);
}
