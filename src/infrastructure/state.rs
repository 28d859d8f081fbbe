//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{ImageStore, IngredientRepository, TagRepository};
use crate::infrastructure::config::Config;
use crate::infrastructure::images::FsImageStore;
use crate::infrastructure::{SeaOrmIngredientRepository, SeaOrmTagRepository};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Tag catalog
    pub tag_repo: Arc<dyn TagRepository>,
    /// Ingredient catalog
    pub ingredient_repo: Arc<dyn IngredientRepository>,
    /// Recipe image storage
    pub image_store: Arc<dyn ImageStore>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, image_store: Arc<dyn ImageStore>) -> Self {
        let tag_repo = Arc::new(SeaOrmTagRepository::new(db.clone()));
        let ingredient_repo = Arc::new(SeaOrmIngredientRepository::new(db.clone()));

        Self {
            db,
            tag_repo,
            ingredient_repo,
            image_store,
        }
    }

    /// State backed by the filesystem media directory from `config`
    pub fn from_config(db: DatabaseConnection, config: &Config) -> Self {
        let store = FsImageStore::new(config.media_root.clone(), config.media_url.clone());
        Self::new(db, Arc::new(store))
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Implement FromRef to allow extracting DatabaseConnection from AppState
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
