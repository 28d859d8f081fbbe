use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{Claims, token_for};
use crate::domain::DomainError;
use crate::services::user_service;

#[derive(Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

pub async fn login(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, DomainError> {
    let email = payload
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| DomainError::validation("email", "This field is required."))?;
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| DomainError::validation("password", "This field is required."))?;

    tracing::info!("Login attempt for {}", email);
    let user = user_service::authenticate(&db, &email, &password).await?;
    let token = token_for(&user).map_err(DomainError::Internal)?;

    Ok((StatusCode::OK, Json(json!({ "auth_token": token }))))
}

/// Tokens are stateless; logout only acknowledges the caller.
pub async fn logout(claims: Claims) -> StatusCode {
    tracing::info!("User {} logged out", claims.sub);
    StatusCode::NO_CONTENT
}
