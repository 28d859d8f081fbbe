//! SeaORM implementation of TagRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::domain::{DomainError, Tag, TagRepository};
use crate::models::tag::{Column, Entity as TagEntity, Model};

/// SeaORM-based implementation of TagRepository
pub struct SeaOrmTagRepository {
    db: DatabaseConnection,
}

impl SeaOrmTagRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<Model> for Tag {
    fn from(t: Model) -> Self {
        Tag {
            id: t.id,
            name: t.name,
            color: t.color,
            slug: t.slug,
        }
    }
}

#[async_trait]
impl TagRepository for SeaOrmTagRepository {
    async fn find_all(&self) -> Result<Vec<Tag>, DomainError> {
        let tags = TagEntity::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;

        Ok(tags.into_iter().map(Tag::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Tag>, DomainError> {
        let tag = TagEntity::find_by_id(id).one(&self.db).await?;
        Ok(tag.map(Tag::from))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Tag>, DomainError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let tags = TagEntity::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;

        Ok(tags.into_iter().map(Tag::from).collect())
    }
}
