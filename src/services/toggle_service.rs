//! Toggle Service - add/remove recipes in a user's cart or favorites
//!
//! Both operations run in a transaction. Duplicate adds are rejected by the
//! UNIQUE (owner_id, recipe_id, kind) constraint, not by a prior read.

use sea_orm::*;
use std::fmt;

use crate::domain::{DomainError, is_unique_violation};
use crate::models::membership::{self, Entity as Membership, ListKind};
use crate::models::recipe::{Entity as Recipe, RecipeShort};

/// Error type for toggle operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleError {
    /// The recipe itself does not exist
    RecipeNotFound,
    /// The recipe is already in the list
    AlreadyExists(ListKind),
    /// The recipe is not in the list
    NotFound(ListKind),
    Database(String),
}

impl fmt::Display for ToggleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleError::RecipeNotFound => write!(f, "Recipe not found"),
            ToggleError::AlreadyExists(kind) => {
                write!(f, "Recipe is already in your {}", kind.label())
            }
            ToggleError::NotFound(kind) => write!(f, "Recipe is not in your {}", kind.label()),
            ToggleError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ToggleError {}

impl From<DbErr> for ToggleError {
    fn from(e: DbErr) -> Self {
        ToggleError::Database(e.to_string())
    }
}

impl From<ToggleError> for DomainError {
    fn from(e: ToggleError) -> Self {
        match e {
            ToggleError::RecipeNotFound => DomainError::NotFound(e.to_string()),
            ToggleError::AlreadyExists(_) => DomainError::Conflict(e.to_string()),
            ToggleError::NotFound(_) => DomainError::NotPresent(e.to_string()),
            ToggleError::Database(msg) => DomainError::Database(msg),
        }
    }
}

/// Put `recipe_id` into the owner's `kind` list and return the short recipe view.
pub async fn toggle_add(
    db: &DatabaseConnection,
    owner_id: i32,
    recipe_id: i32,
    kind: ListKind,
) -> Result<RecipeShort, ToggleError> {
    let txn = db.begin().await?;

    let Some(recipe) = Recipe::find_by_id(recipe_id).one(&txn).await? else {
        txn.rollback().await?;
        return Err(ToggleError::RecipeNotFound);
    };

    let row = membership::ActiveModel {
        owner_id: Set(owner_id),
        recipe_id: Set(recipe_id),
        kind: Set(kind.as_str().to_owned()),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };

    match row.insert(&txn).await {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            txn.rollback().await?;
            tracing::warn!(
                "User {} tried to add recipe {} to {} twice",
                owner_id,
                recipe_id,
                kind
            );
            return Err(ToggleError::AlreadyExists(kind));
        }
        Err(e) => {
            txn.rollback().await?;
            return Err(e.into());
        }
    }

    txn.commit().await?;
    tracing::info!("User {} added recipe {} to {}", owner_id, recipe_id, kind);

    Ok(RecipeShort::from(recipe))
}

/// Take `recipe_id` out of the owner's `kind` list.
pub async fn toggle_remove(
    db: &DatabaseConnection,
    owner_id: i32,
    recipe_id: i32,
    kind: ListKind,
) -> Result<(), ToggleError> {
    let txn = db.begin().await?;

    if Recipe::find_by_id(recipe_id).one(&txn).await?.is_none() {
        txn.rollback().await?;
        return Err(ToggleError::RecipeNotFound);
    }

    let result = Membership::delete_many()
        .filter(membership::owned(owner_id, kind))
        .filter(membership::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        txn.rollback().await?;
        tracing::warn!(
            "User {} tried to remove recipe {} missing from {}",
            owner_id,
            recipe_id,
            kind
        );
        return Err(ToggleError::NotFound(kind));
    }

    txn.commit().await?;
    tracing::info!("User {} removed recipe {} from {}", owner_id, recipe_id, kind);

    Ok(())
}

/// Whether `recipe_id` is in the owner's `kind` list
pub async fn is_member<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
    recipe_id: i32,
    kind: ListKind,
) -> Result<bool, DbErr> {
    let count = Membership::find()
        .filter(membership::owned(owner_id, kind))
        .filter(membership::Column::RecipeId.eq(recipe_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Number of recipes in the owner's `kind` list
pub async fn count_members<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
    kind: ListKind,
) -> Result<u64, DbErr> {
    Membership::find()
        .filter(membership::owned(owner_id, kind))
        .count(conn)
        .await
}
