use axum::{
    Json,
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::api::current_user;
use crate::api::pagination::{Page, PageParams};
use crate::auth::Claims;
use crate::domain::DomainError;
use crate::services::{subscription_service, user_service};

#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct SetPasswordRequest {
    current_password: Option<String>,
    new_password: Option<String>,
}

pub async fn list_users(
    State(db): State<DatabaseConnection>,
    claims: Option<Claims>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, DomainError> {
    let viewer = claims.as_ref().and_then(Claims::user_id);
    let request = params.request();
    let users = user_service::list_users(&db, viewer, request).await?;
    Ok(Json(Page::new(&uri, request, users)))
}

pub async fn create_user(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<user_service::RegisterInput>,
) -> Result<impl IntoResponse, DomainError> {
    let user = user_service::register(&db, payload).await?;
    tracing::info!("Registered user {} ({})", user.id, user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(db): State<DatabaseConnection>,
    claims: Option<Claims>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    let viewer = claims.as_ref().and_then(Claims::user_id);
    Ok(Json(user_service::get_user(&db, viewer, id).await?))
}

pub async fn me(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> Result<impl IntoResponse, DomainError> {
    let user_id = current_user(&claims)?;
    Ok(Json(user_service::get_user(&db, Some(user_id), user_id).await?))
}

pub async fn set_password(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<StatusCode, DomainError> {
    let user_id = current_user(&claims)?;
    let current = payload.current_password.unwrap_or_default();
    let new = payload
        .new_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| DomainError::validation("new_password", "This field is required."))?;

    user_service::set_password(&db, user_id, &current, &new).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscriptions(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageParams>,
    Query(limit): Query<RecipesLimitQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let user_id = current_user(&claims)?;
    let request = params.request();
    let authors =
        subscription_service::list_subscriptions(&db, user_id, request, limit.recipes_limit)
            .await?;
    Ok(Json(Page::new(&uri, request, authors)))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    params(("id" = i32, Path, description = "Author to follow")),
    responses(
        (status = 201, description = "Subscribed; returns the author's profile"),
        (status = 400, description = "Self-subscription or already subscribed"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn subscribe(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
    Query(limit): Query<RecipesLimitQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let user_id = current_user(&claims)?;
    let profile = subscription_service::subscribe(&db, user_id, id, limit.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    params(("id" = i32, Path, description = "Author to unfollow")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn unsubscribe(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<StatusCode, DomainError> {
    let user_id = current_user(&claims)?;
    subscription_service::unsubscribe(&db, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
