use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IngredientQuery {
    /// Name prefix, case-insensitive
    pub name: Option<String>,
}

pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let prefix = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    Ok(Json(state.ingredient_repo.search(prefix).await?))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    state
        .ingredient_repo
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| DomainError::not_found("Ingredient"))
}
