pub mod auth;
pub mod error;
pub mod health;
pub mod ingredient;
pub mod pagination;
pub mod recipe;
pub mod tag;
pub mod user;

use axum::{
    Router,
    routing::{get, post},
};

use crate::auth::Claims;
use crate::domain::DomainError;
use crate::infrastructure::AppState;

/// ID of the authenticated caller
pub(crate) fn current_user(claims: &Claims) -> Result<i32, DomainError> {
    claims
        .user_id()
        .ok_or_else(|| DomainError::Unauthorized("Invalid token subject".to_string()))
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/token/login", post(auth::login))
        .route("/auth/token/logout", post(auth::logout))
        // Users
        .route("/users", get(user::list_users).post(user::create_user))
        .route("/users/me", get(user::me))
        .route("/users/set_password", post(user::set_password))
        .route("/users/subscriptions", get(user::subscriptions))
        .route("/users/:id", get(user::get_user))
        .route(
            "/users/:id/subscribe",
            post(user::subscribe).delete(user::unsubscribe),
        )
        // Catalogs
        .route("/tags", get(tag::list_tags))
        .route("/tags/:id", get(tag::get_tag))
        .route("/ingredients", get(ingredient::list_ingredients))
        .route("/ingredients/:id", get(ingredient::get_ingredient))
        // Recipes
        .route(
            "/recipes",
            get(recipe::list_recipes).post(recipe::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart",
            get(recipe::download_shopping_cart),
        )
        .route(
            "/recipes/:id",
            get(recipe::get_recipe)
                .patch(recipe::update_recipe)
                .delete(recipe::delete_recipe),
        )
        .route(
            "/recipes/:id/favorite",
            post(recipe::add_favorite).delete(recipe::remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart",
            post(recipe::add_to_cart).delete(recipe::remove_from_cart),
        )
        .with_state(state)
}
