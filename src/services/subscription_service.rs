//! Subscription Service - directed follow relations between users

use sea_orm::*;
use serde::Serialize;
use std::fmt;

use crate::domain::{DomainError, PageRequest, Paginated, is_unique_violation};
use crate::models::recipe::{self, Entity as Recipe, RecipeShort};
use crate::models::subscription::{self, Entity as Subscription};
use crate::models::user::{self, Entity as User};

/// Error type for subscription operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    UserNotFound,
    SelfSubscription,
    AlreadySubscribed,
    NotSubscribed,
    Database(String),
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionError::UserNotFound => write!(f, "User not found"),
            SubscriptionError::SelfSubscription => write!(f, "You cannot subscribe to yourself"),
            SubscriptionError::AlreadySubscribed => {
                write!(f, "You are already subscribed to this user")
            }
            SubscriptionError::NotSubscribed => write!(f, "You are not subscribed to this user"),
            SubscriptionError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for SubscriptionError {}

impl From<DbErr> for SubscriptionError {
    fn from(e: DbErr) -> Self {
        SubscriptionError::Database(e.to_string())
    }
}

impl From<SubscriptionError> for DomainError {
    fn from(e: SubscriptionError) -> Self {
        match e {
            SubscriptionError::UserNotFound => DomainError::NotFound(e.to_string()),
            SubscriptionError::SelfSubscription => DomainError::SelfReference(e.to_string()),
            SubscriptionError::AlreadySubscribed => DomainError::Conflict(e.to_string()),
            SubscriptionError::NotSubscribed => DomainError::NotPresent(e.to_string()),
            SubscriptionError::Database(msg) => DomainError::Database(msg),
        }
    }
}

/// Profile of a followed user with a slice of their recipes
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionProfile {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the viewer follows this user
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: u64,
}

/// Start following `following_id`.
pub async fn subscribe(
    db: &DatabaseConnection,
    user_id: i32,
    following_id: i32,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionProfile, SubscriptionError> {
    if user_id == following_id {
        tracing::warn!("User {} tried to subscribe to themselves", user_id);
        return Err(SubscriptionError::SelfSubscription);
    }

    let txn = db.begin().await?;

    let Some(following) = User::find_by_id(following_id).one(&txn).await? else {
        txn.rollback().await?;
        return Err(SubscriptionError::UserNotFound);
    };

    let row = subscription::ActiveModel {
        user_id: Set(user_id),
        following_id: Set(following_id),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };

    match row.insert(&txn).await {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            txn.rollback().await?;
            tracing::warn!("User {} already follows {}", user_id, following_id);
            return Err(SubscriptionError::AlreadySubscribed);
        }
        Err(e) => {
            txn.rollback().await?;
            return Err(e.into());
        }
    }

    let profile = build_profile(&txn, user_id, following, recipes_limit).await?;
    txn.commit().await?;

    tracing::info!("User {} subscribed to {}", user_id, following_id);
    Ok(profile)
}

/// Stop following `following_id`. Removes exactly one relation.
pub async fn unsubscribe(
    db: &DatabaseConnection,
    user_id: i32,
    following_id: i32,
) -> Result<(), SubscriptionError> {
    let txn = db.begin().await?;

    if User::find_by_id(following_id).one(&txn).await?.is_none() {
        txn.rollback().await?;
        return Err(SubscriptionError::UserNotFound);
    }

    let result = Subscription::delete_many()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::FollowingId.eq(following_id))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(SubscriptionError::NotSubscribed);
    }

    txn.commit().await?;
    tracing::info!("User {} unsubscribed from {}", user_id, following_id);
    Ok(())
}

/// Everyone `user_id` follows, oldest subscription first
pub async fn list_subscriptions(
    db: &DatabaseConnection,
    user_id: i32,
    page: PageRequest,
    recipes_limit: Option<u64>,
) -> Result<Paginated<SubscriptionProfile>, DomainError> {
    let paginator = Subscription::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .order_by_asc(subscription::Column::Id)
        .paginate(db, page.limit);

    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page.index()).await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        // Cascades keep this in sync; a missing user means a concurrent delete
        if let Some(following) = User::find_by_id(row.following_id).one(db).await? {
            items.push(build_profile(db, user_id, following, recipes_limit).await?);
        }
    }

    Ok(Paginated { items, total })
}

/// Whether `user_id` follows `following_id`
pub async fn is_subscribed<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    following_id: i32,
) -> Result<bool, DbErr> {
    let count = Subscription::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::FollowingId.eq(following_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

async fn build_profile<C: ConnectionTrait>(
    conn: &C,
    viewer_id: i32,
    following: user::Model,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionProfile, DbErr> {
    let mut recipes_query = Recipe::find()
        .filter(recipe::Column::AuthorId.eq(following.id))
        .order_by_desc(recipe::Column::Id);
    if let Some(limit) = recipes_limit {
        // SQLite binds LIMIT as i64
        recipes_query = recipes_query.limit(limit.min(i64::MAX as u64));
    }
    let recipes = recipes_query.all(conn).await?;

    let recipes_count = Recipe::find()
        .filter(recipe::Column::AuthorId.eq(following.id))
        .count(conn)
        .await?;

    let is_subscribed = is_subscribed(conn, viewer_id, following.id).await?;

    Ok(SubscriptionProfile {
        email: following.email,
        id: following.id,
        username: following.username,
        first_name: following.first_name,
        last_name: following.last_name,
        is_subscribed,
        recipes: recipes.into_iter().map(RecipeShort::from).collect(),
        recipes_count,
    })
}
