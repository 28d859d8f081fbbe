//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::DomainError;

/// Tag data for API responses
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Repository trait for the read-only tag catalog
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Find all tags
    async fn find_all(&self) -> Result<Vec<Tag>, DomainError>;

    /// Find a tag by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Tag>, DomainError>;

    /// Find all tags whose ID is in `ids`
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Tag>, DomainError>;
}

/// Ingredient data for API responses
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

/// Repository trait for the read-only ingredient catalog
#[async_trait]
pub trait IngredientRepository: Send + Sync {
    /// Find ingredients, optionally restricted to names starting with
    /// `name_prefix` (case-insensitive)
    async fn search(&self, name_prefix: Option<&str>) -> Result<Vec<Ingredient>, DomainError>;

    /// Find an ingredient by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Ingredient>, DomainError>;
}

/// Raw image bytes decoded from an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// File extension without the dot, e.g. `png`
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Storage for recipe images
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an image and return the URL it is served from
    async fn save(&self, image: DecodedImage) -> Result<String, DomainError>;

    /// Drop a previously saved image. Unknown URLs are ignored.
    async fn remove(&self, url: &str) -> Result<(), DomainError>;
}
