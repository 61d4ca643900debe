use super::{balance_of, create_test_service, create_user, group_with_members};
use crate::core::errors::{ErrorKind, LedgerError};
use crate::core::models::expense::SplitStrategy;
use crate::core::services::NewExpense;
use crate::core::split::ShareInput;
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn test_create_group_adds_creator_as_member() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let alice = create_user(&service, "Alice").await;

    let group = service
        .create_group("Weekend Trip", Some("Cabin and food"), &alice.id)
        .await
        .unwrap();

    assert_eq!(group.name, "Weekend Trip");
    assert_eq!(group.description.as_deref(), Some("Cabin and food"));
    assert_eq!(group.created_by, alice.id);
    assert_eq!(group.members.len(), 1);
    assert_eq!(group.members[0].user_id, alice.id);

    let stored = service.get_group(&group.id).await.unwrap();
    assert!(stored.is_member(&alice.id));
    let groups = service.get_user_groups(&alice.id).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, group.id);
}

#[tokio::test]
async fn test_create_group_requires_existing_creator() {
    let _ = env_logger::try_init();
    let service = create_test_service();

    let err = service
        .create_group("Trip", None, &Uuid::new_v4().to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::UserNotFound(_)));
}

#[tokio::test]
async fn test_add_member() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let (group, users) = group_with_members(&service, &["Alice", "Bob"]).await;

    assert_eq!(group.members.len(), 2);
    let members = service.get_group_members(&group.id).await.unwrap();
    let names: Vec<&str> = members.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);

    let err = service.add_member(&group.id, &users[1].id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let err = service
        .add_member(&group.id, &Uuid::new_v4().to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::UserNotFound(_)));
}

#[tokio::test]
async fn test_remove_member_keeps_balances() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let (group, users) = group_with_members(&service, &["Alice", "Bob"]).await;
    let (alice, bob) = (&users[0], &users[1]);

    service
        .create_expense(NewExpense {
            group_id: group.id.clone(),
            paid_by: alice.id.clone(),
            amount: dec!(30.00),
            currency: None,
            description: "Dinner".to_string(),
            split_strategy: SplitStrategy::Exact,
            splits: vec![ShareInput::exact(bob.id.clone(), dec!(30.00))],
        })
        .await
        .unwrap();

    service.remove_member(&group.id, &bob.id).await.unwrap();

    let group = service.get_group(&group.id).await.unwrap();
    assert!(!group.is_member(&bob.id));
    assert_eq!(balance_of(&service, &group, bob).await, dec!(30.00));

    let err = service.remove_member(&group.id, &bob.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotGroupMember(_)));
}

#[tokio::test]
async fn test_unknown_group() {
    let _ = env_logger::try_init();
    let service = create_test_service();

    let err = service.get_group(&Uuid::new_v4().to_string()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = service
        .get_group_balances(&Uuid::new_v4().to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::GroupNotFound(_)));
}

#[tokio::test]
async fn test_list_groups() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let alice = create_user(&service, "Alice").await;
    for name in ["Flat", "Trip", "Office"] {
        service.create_group(name, None, &alice.id).await.unwrap();
    }

    let groups = service.list_groups(None, None).await.unwrap();
    assert_eq!(groups.len(), 3);
    assert!(groups.iter().all(|g| g.created_by == alice.id));
    assert_eq!(service.list_groups(Some(2), Some(2)).await.unwrap().len(), 1);
}
