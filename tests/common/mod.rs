#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use foodgram::auth;
use foodgram::db;
use foodgram::domain::{DecodedImage, DomainError, ImageStore};
use foodgram::infrastructure::AppState;
use foodgram::models::{ingredient, recipe, recipe_ingredient, recipe_tags, tag, user};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

// 1x1 transparent PNG
pub const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Image store that keeps URLs in memory
#[derive(Default)]
pub struct MemoryImageStore {
    pub saved: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn save(&self, image: DecodedImage) -> Result<String, DomainError> {
        let mut saved = self.saved.lock().unwrap();
        let url = format!("/media/recipes/test-{}.{}", saved.len(), image.extension);
        saved.push(url.clone());
        Ok(url)
    }

    async fn remove(&self, url: &str) -> Result<(), DomainError> {
        self.saved.lock().unwrap().retain(|u| u != url);
        Ok(())
    }
}

pub async fn setup_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

pub async fn setup_state() -> AppState {
    AppState::new(setup_db().await, Arc::new(MemoryImageStore::default()))
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> i32 {
    create_user_with_role(db, username, "user").await
}

pub async fn create_user_with_role(db: &DatabaseConnection, username: &str, role: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let model = user::ActiveModel {
        email: Set(format!("{}@example.com", username)),
        username: Set(username.to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        password_hash: Set(auth::hash_password("password123").expect("Failed to hash")),
        role: Set(role.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.expect("Failed to create user").id
}

pub async fn create_tag(db: &DatabaseConnection, slug: &str) -> i32 {
    let model = tag::ActiveModel {
        name: Set(slug.to_string()),
        color: Set("#E26C2D".to_string()),
        slug: Set(slug.to_string()),
        ..Default::default()
    };
    model.insert(db).await.expect("Failed to create tag").id
}

pub async fn create_ingredient(db: &DatabaseConnection, name: &str, unit: &str) -> i32 {
    let model = ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit: Set(unit.to_string()),
        ..Default::default()
    };
    model.insert(db).await.expect("Failed to create ingredient").id
}

/// Insert a recipe directly with the given `(ingredient_id, amount)` lines
pub async fn create_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    name: &str,
    ingredients: &[(i32, i32)],
) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let model = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(name.to_string()),
        image: Set("/media/recipes/seed.png".to_string()),
        text: Set("Mix and cook.".to_string()),
        cooking_time: Set(10),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create recipe");

    for (ingredient_id, amount) in ingredients {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(model.id),
            ingredient_id: Set(*ingredient_id),
            amount: Set(*amount),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to add ingredient");
    }

    model.id
}

pub async fn tag_recipe(db: &DatabaseConnection, recipe_id: i32, tag_id: i32) {
    let link = recipe_tags::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    };
    recipe_tags::Entity::insert(link)
        .exec_without_returning(db)
        .await
    .expect("Failed to tag recipe");
}

pub fn token_for(user_id: i32) -> String {
    auth::create_jwt(user_id, "user").expect("Failed to create token")
}
