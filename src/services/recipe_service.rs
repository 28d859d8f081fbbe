//! Recipe Service - create/update/delete recipes and build read views
//!
//! Every check on the payload, including that referenced tags and ingredients
//! exist, happens before the first write.

use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::auth::{Claims, may_modify};
use crate::domain::{DecodedImage, DomainError, ImageStore, PageRequest, Paginated, Tag};
use crate::infrastructure::images::decode_data_uri;
use crate::models::membership::{self, Entity as Membership, ListKind};
use crate::models::recipe::{self, Entity as Recipe};
use crate::models::user::Entity as User;
use crate::models::{ingredient, recipe_ingredient, recipe_tags, tag};
use crate::services::toggle_service::is_member;
use crate::services::user_service::{UserView, user_view};

const MAX_RECIPE_NAME_LEN: usize = 200;

/// `{id, amount}` entry of a recipe payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i32,
}

/// Create/update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeInput {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<i32>>,
    /// Base64 data URI
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

/// Ingredient line of a recipe read view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeIngredientView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe representation
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: i32,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Filter criteria for recipe listings
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches if it has any of them
    pub tags: Vec<String>,
    pub author: Option<i32>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

struct ValidatedRecipe {
    ingredients: Vec<IngredientAmount>,
    tags: Vec<i32>,
    image: Option<DecodedImage>,
    name: String,
    text: String,
    cooking_time: i32,
}

fn required_text(field: &str, value: Option<String>) -> Result<String, DomainError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DomainError::validation(field, "This field is required.")),
    }
}

fn validate(input: RecipeInput, image_required: bool) -> Result<ValidatedRecipe, DomainError> {
    let ingredients = input.ingredients.unwrap_or_default();
    if ingredients.is_empty() {
        return Err(DomainError::validation(
            "ingredients",
            "Add at least one ingredient.",
        ));
    }
    let mut seen = HashSet::new();
    for item in &ingredients {
        if !seen.insert(item.id) {
            return Err(DomainError::validation(
                "ingredients",
                format!("Ingredient {} is listed more than once.", item.id),
            ));
        }
        if item.amount < 1 {
            return Err(DomainError::validation(
                "ingredients",
                "Ingredient amount must be at least 1.",
            ));
        }
    }

    let tags = input.tags.unwrap_or_default();
    if tags.is_empty() {
        return Err(DomainError::validation("tags", "Add at least one tag."));
    }
    let mut seen = HashSet::new();
    if !tags.iter().all(|id| seen.insert(*id)) {
        return Err(DomainError::validation("tags", "Tags must be unique."));
    }

    let image = match input.image.filter(|s| !s.trim().is_empty()) {
        Some(data) => Some(decode_data_uri(&data)?),
        None if image_required => {
            return Err(DomainError::validation("image", "This field is required."));
        }
        None => None,
    };

    let name = required_text("name", input.name)?;
    if name.chars().count() > MAX_RECIPE_NAME_LEN {
        return Err(DomainError::validation(
            "name",
            format!(
                "Ensure this field has no more than {} characters.",
                MAX_RECIPE_NAME_LEN
            ),
        ));
    }
    let text = required_text("text", input.text)?;

    let cooking_time = input
        .cooking_time
        .ok_or_else(|| DomainError::validation("cooking_time", "This field is required."))?;
    if cooking_time < 1 {
        return Err(DomainError::validation(
            "cooking_time",
            "Ensure this value is greater than or equal to 1.",
        ));
    }

    Ok(ValidatedRecipe {
        ingredients,
        tags,
        image,
        name,
        text,
        cooking_time,
    })
}

/// Every referenced tag and ingredient must exist
async fn check_references<C: ConnectionTrait>(
    conn: &C,
    recipe: &ValidatedRecipe,
) -> Result<(), DomainError> {
    let found_tags = tag::Entity::find()
        .filter(tag::Column::Id.is_in(recipe.tags.iter().copied()))
        .count(conn)
        .await?;
    if found_tags != recipe.tags.len() as u64 {
        return Err(DomainError::validation("tags", "Unknown tag id."));
    }

    let found_ingredients = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(recipe.ingredients.iter().map(|i| i.id)))
        .count(conn)
        .await?;
    if found_ingredients != recipe.ingredients.len() as u64 {
        return Err(DomainError::validation(
            "ingredients",
            "Unknown ingredient id.",
        ));
    }

    Ok(())
}

async fn write_relations<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    recipe: &ValidatedRecipe,
) -> Result<(), DbErr> {
    let tag_rows = recipe.tags.iter().map(|tag_id| recipe_tags::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(*tag_id),
    });
    recipe_tags::Entity::insert_many(tag_rows)
        .exec_without_returning(conn)
        .await?;

    let ingredient_rows = recipe
        .ingredients
        .iter()
        .map(|item| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(item.id),
            amount: Set(item.amount),
            ..Default::default()
        });
    recipe_ingredient::Entity::insert_many(ingredient_rows)
        .exec_without_returning(conn)
        .await?;

    Ok(())
}

async fn find_recipe<C: ConnectionTrait>(conn: &C, id: i32) -> Result<recipe::Model, DomainError> {
    Recipe::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| DomainError::not_found("Recipe"))
}

/// Create a recipe authored by `author_id`
pub async fn create_recipe(
    db: &DatabaseConnection,
    images: &dyn ImageStore,
    author_id: i32,
    input: RecipeInput,
) -> Result<RecipeView, DomainError> {
    let mut recipe = validate(input, true)?;
    check_references(db, &recipe).await?;

    let image = recipe
        .image
        .take()
        .ok_or_else(|| DomainError::validation("image", "This field is required."))?;
    let image_url = images.save(image).await?;

    let now = chrono::Utc::now().to_rfc3339();
    let saved = async {
        let txn = db.begin().await?;
        let model = recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(recipe.name.clone()),
            image: Set(image_url.clone()),
            text: Set(recipe.text.clone()),
            cooking_time: Set(recipe.cooking_time),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        write_relations(&txn, model.id, &recipe).await?;
        txn.commit().await?;
        Ok::<_, DbErr>(model)
    }
    .await;

    let model = match saved {
        Ok(model) => model,
        Err(e) => {
            if let Err(cleanup) = images.remove(&image_url).await {
                tracing::warn!("Failed to remove orphaned image {}: {}", image_url, cleanup);
            }
            return Err(e.into());
        }
    };

    tracing::info!("User {} created recipe {}", author_id, model.id);
    Ok(recipe_view(db, Some(author_id), model).await?)
}

/// Replace a recipe's fields, tags and ingredients. Only the author or an
/// admin may do this; `image` may be omitted to keep the current one.
pub async fn update_recipe(
    db: &DatabaseConnection,
    images: &dyn ImageStore,
    claims: &Claims,
    recipe_id: i32,
    input: RecipeInput,
) -> Result<RecipeView, DomainError> {
    let existing = find_recipe(db, recipe_id).await?;
    if !may_modify(claims, existing.author_id) {
        tracing::warn!(
            "User {} may not modify recipe {}",
            claims.sub,
            recipe_id
        );
        return Err(DomainError::Forbidden);
    }

    let mut recipe = validate(input, false)?;
    check_references(db, &recipe).await?;

    let new_image_url = match recipe.image.take() {
        Some(image) => Some(images.save(image).await?),
        None => None,
    };
    let old_image_url = existing.image.clone();

    let saved = async {
        let txn = db.begin().await?;

        recipe_tags::Entity::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;

        let mut active: recipe::ActiveModel = existing.into();
        active.name = Set(recipe.name.clone());
        active.text = Set(recipe.text.clone());
        active.cooking_time = Set(recipe.cooking_time);
        if let Some(url) = &new_image_url {
            active.image = Set(url.clone());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&txn).await?;

        write_relations(&txn, recipe_id, &recipe).await?;
        txn.commit().await?;
        Ok::<_, DbErr>(model)
    }
    .await;

    let model = match saved {
        Ok(model) => model,
        Err(e) => {
            if let Some(url) = &new_image_url {
                if let Err(cleanup) = images.remove(url).await {
                    tracing::warn!("Failed to remove orphaned image {}: {}", url, cleanup);
                }
            }
            return Err(e.into());
        }
    };

    if new_image_url.is_some()
        && let Err(e) = images.remove(&old_image_url).await
    {
        tracing::warn!("Failed to remove replaced image {}: {}", old_image_url, e);
    }

    tracing::info!("Recipe {} updated", recipe_id);
    Ok(recipe_view(db, claims.user_id(), model).await?)
}

/// Delete a recipe; tag links, ingredient rows and memberships cascade.
pub async fn delete_recipe(
    db: &DatabaseConnection,
    images: &dyn ImageStore,
    claims: &Claims,
    recipe_id: i32,
) -> Result<(), DomainError> {
    let existing = find_recipe(db, recipe_id).await?;
    if !may_modify(claims, existing.author_id) {
        tracing::warn!(
            "User {} may not delete recipe {}",
            claims.sub,
            recipe_id
        );
        return Err(DomainError::Forbidden);
    }

    Recipe::delete_by_id(recipe_id).exec(db).await?;

    if let Err(e) = images.remove(&existing.image).await {
        tracing::warn!("Failed to remove image {}: {}", existing.image, e);
    }

    tracing::info!("Recipe {} deleted", recipe_id);
    Ok(())
}

pub async fn get_recipe(
    db: &DatabaseConnection,
    viewer_id: Option<i32>,
    recipe_id: i32,
) -> Result<RecipeView, DomainError> {
    let model = find_recipe(db, recipe_id).await?;
    Ok(recipe_view(db, viewer_id, model).await?)
}

/// Newest recipes first, filtered by `filter`. Membership filters only apply
/// when there is a viewer.
pub async fn list_recipes(
    db: &DatabaseConnection,
    viewer_id: Option<i32>,
    filter: RecipeFilter,
    page: PageRequest,
) -> Result<Paginated<RecipeView>, DomainError> {
    let mut query = Recipe::find();

    if !filter.tags.is_empty() {
        let tagged = recipe_tags::Entity::find()
            .select_only()
            .column(recipe_tags::Column::RecipeId)
            .join(JoinType::InnerJoin, recipe_tags::Relation::Tag.def())
            .filter(tag::Column::Slug.is_in(filter.tags))
            .into_query();
        query = query.filter(recipe::Column::Id.in_subquery(tagged));
    }

    if let Some(author) = filter.author {
        query = query.filter(recipe::Column::AuthorId.eq(author));
    }

    if let Some(viewer) = viewer_id {
        for (wanted, kind) in [
            (filter.is_favorited, ListKind::Favorite),
            (filter.is_in_shopping_cart, ListKind::Cart),
        ] {
            if wanted {
                let members = Membership::find()
                    .select_only()
                    .column(membership::Column::RecipeId)
                    .filter(membership::owned(viewer, kind))
                    .into_query();
                query = query.filter(recipe::Column::Id.in_subquery(members));
            }
        }
    }

    let paginator = query
        .order_by_desc(recipe::Column::Id)
        .paginate(db, page.limit);
    let total = paginator.num_items().await?;
    let models = paginator.fetch_page(page.index()).await?;

    let mut items = Vec::with_capacity(models.len());
    for model in models {
        items.push(recipe_view(db, viewer_id, model).await?);
    }

    Ok(Paginated { items, total })
}

/// Assemble the read view of `model` for `viewer_id`
pub async fn recipe_view<C: ConnectionTrait>(
    conn: &C,
    viewer_id: Option<i32>,
    model: recipe::Model,
) -> Result<RecipeView, DomainError> {
    let tags = model
        .find_related(tag::Entity)
        .order_by_asc(tag::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(Tag::from)
        .collect();

    let author = User::find_by_id(model.author_id)
        .one(conn)
        .await?
        .ok_or_else(|| DomainError::Internal(format!("Recipe {} has no author", model.id)))?;
    let author = user_view(conn, viewer_id, author).await?;

    let ingredients = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(model.id))
        .order_by_asc(recipe_ingredient::Column::Id)
        .find_also_related(ingredient::Entity)
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|(row, ingredient)| {
            ingredient.map(|i| RecipeIngredientView {
                id: i.id,
                name: i.name,
                measurement_unit: i.measurement_unit,
                amount: row.amount,
            })
        })
        .collect();

    let (is_favorited, is_in_shopping_cart) = match viewer_id {
        Some(viewer) => (
            is_member(conn, viewer, model.id, ListKind::Favorite).await?,
            is_member(conn, viewer, model.id, ListKind::Cart).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeView {
        id: model.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: model.name,
        image: model.image,
        text: model.text,
        cooking_time: model.cooking_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn valid_input() -> RecipeInput {
        RecipeInput {
            ingredients: Some(vec![IngredientAmount { id: 1, amount: 10 }]),
            tags: Some(vec![1]),
            image: Some(IMAGE.to_string()),
            name: Some("Pancakes".to_string()),
            text: Some("Mix and fry".to_string()),
            cooking_time: Some(15),
        }
    }

    fn field_of(err: DomainError) -> String {
        match err {
            DomainError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_input_passes() {
        let recipe = validate(valid_input(), true).unwrap();
        assert_eq!(recipe.name, "Pancakes");
        assert!(recipe.image.is_some());
    }

    #[test]
    fn test_empty_collections_rejected() {
        let mut input = valid_input();
        input.tags = Some(vec![]);
        assert_eq!(field_of(validate(input, true).err().unwrap()), "tags");

        let mut input = valid_input();
        input.ingredients = None;
        assert_eq!(field_of(validate(input, true).err().unwrap()), "ingredients");
    }

    #[test]
    fn test_duplicates_and_bounds_rejected() {
        let mut input = valid_input();
        input.ingredients = Some(vec![
            IngredientAmount { id: 1, amount: 1 },
            IngredientAmount { id: 1, amount: 2 },
        ]);
        assert_eq!(field_of(validate(input, true).err().unwrap()), "ingredients");

        let mut input = valid_input();
        input.cooking_time = Some(0);
        assert_eq!(field_of(validate(input, true).err().unwrap()), "cooking_time");

        let mut input = valid_input();
        input.ingredients = Some(vec![IngredientAmount { id: 1, amount: 0 }]);
        assert_eq!(field_of(validate(input, true).err().unwrap()), "ingredients");
    }

    #[test]
    fn test_image_optional_only_on_update() {
        let mut input = valid_input();
        input.image = None;
        assert_eq!(field_of(validate(input.clone(), true).err().unwrap()), "image");
        assert!(validate(input, false).unwrap().image.is_none());
    }
}
