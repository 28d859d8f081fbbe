//! User Service - registration, credentials and profile views

use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password};
use crate::domain::{DomainError, PageRequest, Paginated, is_unique_violation};
use crate::models::user::{self, Entity as User};
use crate::services::subscription_service::is_subscribed;

const MAX_EMAIL_LEN: usize = 254;
const MAX_NAME_LEN: usize = 150;

/// Public user representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// Registration payload. Fields are optional so that a missing field is
/// reported per field rather than as a malformed body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

/// Result of a successful registration (never includes the password)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUser {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

fn required(field: &str, value: Option<String>, max_len: usize) -> Result<String, DomainError> {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        return Err(DomainError::validation(field, "This field is required."));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::validation(
            field,
            format!("Ensure this field has no more than {} characters.", max_len),
        ));
    }
    Ok(value)
}

fn valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
}

/// Create a regular user account
pub async fn register(
    db: &DatabaseConnection,
    input: RegisterInput,
) -> Result<RegisteredUser, DomainError> {
    let email = required("email", input.email, MAX_EMAIL_LEN)?.to_lowercase();
    let username = required("username", input.username, MAX_NAME_LEN)?;
    let first_name = required("first_name", input.first_name, MAX_NAME_LEN)?;
    let last_name = required("last_name", input.last_name, MAX_NAME_LEN)?;
    let password = input.password.unwrap_or_default();

    if password.is_empty() {
        return Err(DomainError::validation("password", "This field is required."));
    }
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(DomainError::validation("email", "Enter a valid email address."));
    }
    if !valid_username(&username) {
        return Err(DomainError::validation(
            "username",
            "Enter a valid username: letters, digits and @/./+/-/_ only.",
        ));
    }

    if User::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?
        .is_some()
    {
        return Err(DomainError::validation(
            "email",
            "A user with that email already exists.",
        ));
    }
    if User::find()
        .filter(user::Column::Username.eq(&username))
        .one(db)
        .await?
        .is_some()
    {
        return Err(DomainError::validation(
            "username",
            "A user with that username already exists.",
        ));
    }

    let password_hash = hash_password(&password).map_err(DomainError::Internal)?;
    let now = chrono::Utc::now().to_rfc3339();

    let new_user = user::ActiveModel {
        email: Set(email),
        username: Set(username),
        first_name: Set(first_name),
        last_name: Set(last_name),
        password_hash: Set(password_hash),
        role: Set("user".to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = match new_user.insert(db).await {
        Ok(model) => model,
        // Lost a race with a concurrent registration
        Err(e) if is_unique_violation(&e) => {
            return Err(DomainError::validation(
                "email",
                "A user with that email or username already exists.",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Registered user {} ({})", model.username, model.id);

    Ok(RegisteredUser {
        email: model.email,
        id: model.id,
        username: model.username,
        first_name: model.first_name,
        last_name: model.last_name,
    })
}

/// Check credentials for token login
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<user::Model, DomainError> {
    let invalid = || {
        DomainError::validation(
            "non_field_errors",
            "Unable to log in with provided credentials.",
        )
    };

    let Some(user) = User::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?
    else {
        tracing::warn!("Login attempt for unknown email");
        return Err(invalid());
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(user),
        _ => {
            tracing::warn!("Password verification failed for user: {}", user.username);
            Err(invalid())
        }
    }
}

/// Replace the password of `user_id` after checking the current one
pub async fn set_password(
    db: &DatabaseConnection,
    user_id: i32,
    current_password: &str,
    new_password: &str,
) -> Result<(), DomainError> {
    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;

    if !matches!(verify_password(current_password, &user.password_hash), Ok(true)) {
        return Err(DomainError::validation(
            "current_password",
            "Invalid password.",
        ));
    }
    if new_password.is_empty() {
        return Err(DomainError::validation(
            "new_password",
            "This field is required.",
        ));
    }

    let password_hash = hash_password(new_password).map_err(DomainError::Internal)?;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    active.update(db).await?;

    tracing::info!("Password changed for user {}", user_id);
    Ok(())
}

/// Build the public view of `user` as seen by `viewer_id`
pub async fn user_view<C: ConnectionTrait>(
    conn: &C,
    viewer_id: Option<i32>,
    user: user::Model,
) -> Result<UserView, DbErr> {
    let is_subscribed = match viewer_id {
        Some(viewer) => is_subscribed(conn, viewer, user.id).await?,
        None => false,
    };

    Ok(UserView {
        email: user.email,
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        is_subscribed,
    })
}

pub async fn get_user(
    db: &DatabaseConnection,
    viewer_id: Option<i32>,
    id: i32,
) -> Result<UserView, DomainError> {
    let user = User::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;

    Ok(user_view(db, viewer_id, user).await?)
}

pub async fn list_users(
    db: &DatabaseConnection,
    viewer_id: Option<i32>,
    page: PageRequest,
) -> Result<Paginated<UserView>, DomainError> {
    let paginator = User::find()
        .order_by_asc(user::Column::Id)
        .paginate(db, page.limit);

    let total = paginator.num_items().await?;
    let users = paginator.fetch_page(page.index()).await?;

    let mut items = Vec::with_capacity(users.len());
    for user in users {
        items.push(user_view(db, viewer_id, user).await?);
    }

    Ok(Paginated { items, total })
}
