//! SeaORM implementation of IngredientRepository

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::domain::{DomainError, Ingredient, IngredientRepository};
use crate::models::ingredient::{Column, Entity as IngredientEntity, Model};

/// SeaORM-based implementation of IngredientRepository
pub struct SeaOrmIngredientRepository {
    db: DatabaseConnection,
}

impl SeaOrmIngredientRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<Model> for Ingredient {
    fn from(i: Model) -> Self {
        Ingredient {
            id: i.id,
            name: i.name,
            measurement_unit: i.measurement_unit,
        }
    }
}

/// `%`, `_` and `\` match literally under `ESCAPE '\'`
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl IngredientRepository for SeaOrmIngredientRepository {
    async fn search(&self, name_prefix: Option<&str>) -> Result<Vec<Ingredient>, DomainError> {
        let mut query = IngredientEntity::find();

        // SQLite LIKE is case-insensitive for ASCII
        if let Some(prefix) = name_prefix.map(str::trim)
            && !prefix.is_empty()
        {
            let pattern = LikeExpr::new(format!("{}%", escape_like(prefix))).escape('\\');
            query = query.filter(Expr::col((IngredientEntity, Column::Name)).like(pattern));
        }

        let ingredients = query
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;

        Ok(ingredients.into_iter().map(Ingredient::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Ingredient>, DomainError> {
        let ingredient = IngredientEntity::find_by_id(id).one(&self.db).await?;
        Ok(ingredient.map(Ingredient::from))
    }
}
