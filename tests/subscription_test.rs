mod common;

use common::*;
use foodgram::domain::PageRequest;
use foodgram::models::subscription;
use foodgram::services::subscription_service::{is_subscribed, list_subscriptions};
use foodgram::services::{SubscriptionError, subscribe, unsubscribe};
use sea_orm::{EntityTrait, PaginatorTrait};

#[tokio::test]
async fn test_subscribe_returns_author_profile() {
    let db = setup_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;
    create_recipe(&db, bob, "Soup", &[]).await;
    create_recipe(&db, bob, "Stew", &[]).await;

    let profile = subscribe(&db, alice, bob, None).await.expect("subscribe failed");

    assert_eq!(profile.id, bob);
    assert_eq!(profile.username, "bob");
    assert!(profile.is_subscribed);
    assert_eq!(profile.recipes_count, 2);
    assert_eq!(profile.recipes.len(), 2);
    assert!(is_subscribed(&db, alice, bob).await.unwrap());
    // Not symmetric
    assert!(!is_subscribed(&db, bob, alice).await.unwrap());
}

#[tokio::test]
async fn test_self_subscription_is_rejected() {
    let db = setup_db().await;
    let alice = create_user(&db, "alice").await;

    let err = subscribe(&db, alice, alice, None).await.unwrap_err();

    assert_eq!(err, SubscriptionError::SelfSubscription);
    assert_eq!(subscription::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_subscription_is_rejected() {
    let db = setup_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;

    subscribe(&db, alice, bob, None).await.unwrap();
    let err = subscribe(&db, alice, bob, None).await.unwrap_err();

    assert_eq!(err, SubscriptionError::AlreadySubscribed);
    assert_eq!(subscription::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_author() {
    let db = setup_db().await;
    let alice = create_user(&db, "alice").await;

    assert_eq!(
        subscribe(&db, alice, 404, None).await.unwrap_err(),
        SubscriptionError::UserNotFound
    );
    assert_eq!(
        unsubscribe(&db, alice, 404).await.unwrap_err(),
        SubscriptionError::UserNotFound
    );
}

#[tokio::test]
async fn test_unsubscribe() {
    let db = setup_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;

    assert_eq!(
        unsubscribe(&db, alice, bob).await.unwrap_err(),
        SubscriptionError::NotSubscribed
    );

    subscribe(&db, alice, bob, None).await.unwrap();
    unsubscribe(&db, alice, bob).await.unwrap();

    assert!(!is_subscribed(&db, alice, bob).await.unwrap());
}

#[tokio::test]
async fn test_recipes_limit_truncates_but_count_is_total() {
    let db = setup_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;
    for name in ["Soup", "Stew", "Salad"] {
        create_recipe(&db, bob, name, &[]).await;
    }

    let profile = subscribe(&db, alice, bob, Some(1)).await.unwrap();

    assert_eq!(profile.recipes.len(), 1);
    assert_eq!(profile.recipes_count, 3);
    // Newest first
    assert_eq!(profile.recipes[0].name, "Salad");
}

#[tokio::test]
async fn test_oversized_recipes_limit_returns_everything() {
    let db = setup_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;
    create_recipe(&db, bob, "Soup", &[]).await;
    create_recipe(&db, bob, "Stew", &[]).await;

    let profile = subscribe(&db, alice, bob, Some(u64::MAX)).await.unwrap();
    assert_eq!(profile.recipes.len(), 2);

    let page = list_subscriptions(&db, alice, PageRequest::default(), Some(u64::MAX))
        .await
        .unwrap();
    assert_eq!(page.items[0].recipes.len(), 2);
}

#[tokio::test]
async fn test_list_subscriptions_is_paginated() {
    let db = setup_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;
    let carol = create_user(&db, "carol").await;
    let dave = create_user(&db, "dave").await;
    for author in [bob, carol, dave] {
        subscribe(&db, alice, author, None).await.unwrap();
    }
    // Someone else's subscriptions are not listed
    subscribe(&db, bob, carol, None).await.unwrap();

    let page = list_subscriptions(&db, alice, PageRequest::new(Some(1), Some(2)), None)
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].username, "bob");

    let page = list_subscriptions(&db, alice, PageRequest::new(Some(2), Some(2)), None)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].username, "dave");
}
