use axum::{
    Json,
    extract::{OriginalUri, Path, RawQuery, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::api::current_user;
use crate::api::pagination::Page;
use crate::auth::Claims;
use crate::domain::{DomainError, PageRequest};
use crate::infrastructure::AppState;
use crate::models::{ListKind, RecipeShort};
use crate::services::recipe_service::{self, RecipeFilter, RecipeInput};
use crate::services::{
    SHOPPING_LIST_FILENAME, build_shopping_list, render_shopping_list, toggle_add, toggle_remove,
};

fn flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

/// Parses list filters. `tags` may repeat; unknown keys are ignored.
fn parse_list_query(raw: Option<&str>) -> Result<(RecipeFilter, PageRequest), DomainError> {
    let mut filter = RecipeFilter::default();
    let mut page = None;
    let mut limit = None;

    for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "tags" if !value.is_empty() => filter.tags.push(value.into_owned()),
            "author" => {
                let author = value.parse().map_err(|_| {
                    DomainError::validation("author", "A valid integer is required.")
                })?;
                filter.author = Some(author);
            }
            "is_favorited" => filter.is_favorited = flag(&value),
            "is_in_shopping_cart" => filter.is_in_shopping_cart = flag(&value),
            "page" => page = value.parse().ok(),
            "limit" => limit = value.parse().ok(),
            _ => {}
        }
    }

    Ok((filter, PageRequest::new(page, limit)))
}

pub async fn list_recipes(
    State(state): State<AppState>,
    claims: Option<Claims>,
    OriginalUri(uri): OriginalUri,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, DomainError> {
    let viewer = claims.as_ref().and_then(Claims::user_id);
    let (filter, request) = parse_list_query(query.as_deref())?;
    let recipes = recipe_service::list_recipes(state.db(), viewer, filter, request).await?;
    Ok(Json(Page::new(&uri, request, recipes)))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<RecipeInput>,
) -> Result<impl IntoResponse, DomainError> {
    let user_id = current_user(&claims)?;
    let recipe =
        recipe_service::create_recipe(state.db(), state.image_store.as_ref(), user_id, payload)
            .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    claims: Option<Claims>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    let viewer = claims.as_ref().and_then(Claims::user_id);
    Ok(Json(recipe_service::get_recipe(state.db(), viewer, id).await?))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<RecipeInput>,
) -> Result<impl IntoResponse, DomainError> {
    let recipe = recipe_service::update_recipe(
        state.db(),
        state.image_store.as_ref(),
        &claims,
        id,
        payload,
    )
    .await?;
    Ok(Json(recipe))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<StatusCode, DomainError> {
    recipe_service::delete_recipe(state.db(), state.image_store.as_ref(), &claims, id).await?;
    tracing::info!("Recipe {} deleted by user {}", id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to(
    state: &AppState,
    claims: &Claims,
    recipe_id: i32,
    kind: ListKind,
) -> Result<(StatusCode, Json<RecipeShort>), DomainError> {
    let user_id = current_user(claims)?;
    let recipe = toggle_add(state.db(), user_id, recipe_id, kind).await?;
    tracing::debug!("Recipe {} added to {} of user {}", recipe_id, kind, user_id);
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn remove_from(
    state: &AppState,
    claims: &Claims,
    recipe_id: i32,
    kind: ListKind,
) -> Result<StatusCode, DomainError> {
    let user_id = current_user(claims)?;
    toggle_remove(state.db(), user_id, recipe_id, kind).await?;
    tracing::debug!("Recipe {} removed from {} of user {}", recipe_id, kind, user_id);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added; returns the short recipe"),
        (status = 400, description = "Already in favorites"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Recipe not found")
    )
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShort>), DomainError> {
    add_to(&state, &claims, id, ListKind::Favorite).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 400, description = "Not in favorites"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Recipe not found")
    )
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<StatusCode, DomainError> {
    remove_from(&state, &claims, id, ListKind::Favorite).await
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added; returns the short recipe"),
        (status = 400, description = "Already in the shopping cart"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Recipe not found")
    )
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShort>), DomainError> {
    add_to(&state, &claims, id, ListKind::Cart).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 400, description = "Not in the shopping cart"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Recipe not found")
    )
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<StatusCode, DomainError> {
    remove_from(&state, &claims, id, ListKind::Cart).await
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    responses(
        (status = 200, description = "Plain-text shopping list attachment", content_type = "text/plain"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<impl IntoResponse, DomainError> {
    let user_id = current_user(&claims)?;
    let items = build_shopping_list(state.db(), user_id).await?;
    tracing::info!(
        "Shopping list for user {}: {} ingredients",
        user_id,
        items.len()
    );

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", SHOPPING_LIST_FILENAME),
        ),
    ];
    Ok((StatusCode::OK, headers, render_shopping_list(&items)))
}
