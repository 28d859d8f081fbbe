//! Shopping List Aggregator
//!
//! Sums ingredient amounts over every recipe in a user's cart and renders the
//! result as a plain-text list.

use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Serialize;

use crate::domain::DomainError;
use crate::models::membership::{self, Entity as Membership, ListKind};
use crate::models::{ingredient, recipe_ingredient};

pub const SHOPPING_LIST_FILENAME: &str = "ShoppingList.txt";

/// Total quantity of one ingredient across the cart
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ShoppingItem {
    pub ingredient_id: i32,
    pub name: String,
    pub total_amount: i64,
    pub measurement_unit: String,
}

/// Aggregate the owner's cart, one item per ingredient.
///
/// Items come back sorted by ingredient name then id; that order is a
/// convenience, not part of the contract.
pub async fn build_shopping_list<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
) -> Result<Vec<ShoppingItem>, DomainError> {
    let cart_recipes = Membership::find()
        .select_only()
        .column(membership::Column::RecipeId)
        .filter(membership::owned(owner_id, ListKind::Cart))
        .into_query();

    let items = recipe_ingredient::Entity::find()
        .select_only()
        .column_as(ingredient::Column::Id, "ingredient_id")
        .column_as(ingredient::Column::Name, "name")
        .column_as(
            Expr::col((
                recipe_ingredient::Entity,
                recipe_ingredient::Column::Amount,
            ))
            .sum(),
            "total_amount",
        )
        .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
        .join(
            JoinType::InnerJoin,
            recipe_ingredient::Relation::Ingredient.def(),
        )
        .filter(recipe_ingredient::Column::RecipeId.in_subquery(cart_recipes))
        .group_by(ingredient::Column::Id)
        .group_by(ingredient::Column::Name)
        .group_by(ingredient::Column::MeasurementUnit)
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Id)
        .into_model::<ShoppingItem>()
        .all(conn)
        .await?;

    tracing::debug!(
        "Shopping list for user {} has {} ingredients",
        owner_id,
        items.len()
    );

    Ok(items)
}

/// `"{name} - {amount} {unit}."` per item, newline separated. Empty input gives
/// an empty string.
pub fn render_shopping_list(items: &[ShoppingItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "{} - {} {}.",
                item.name, item.total_amount, item.measurement_unit
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
