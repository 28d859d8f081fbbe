use crate::auth::hash_password;
use crate::models::{ingredient, tag, user};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use serde::Deserialize;
use std::path::Path;

/// Demo tags plus an `admin`/`admin` account.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let admin_password =
        hash_password("admin").map_err(|e| DbErr::Custom(format!("hash failed: {}", e)))?;
    let now = chrono::Utc::now().to_rfc3339();

    let admin = user::ActiveModel {
        email: Set("admin@foodgram.local".to_owned()),
        username: Set("admin".to_owned()),
        first_name: Set("Admin".to_owned()),
        last_name: Set("Foodgram".to_owned()),
        password_hash: Set(admin_password),
        role: Set("admin".to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    user::Entity::insert(admin)
        .on_conflict(OnConflict::column(user::Column::Email).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    let tags = [
        ("Breakfast", "#E26C2D", "breakfast"),
        ("Lunch", "#49B64E", "lunch"),
        ("Dinner", "#8775D2", "dinner"),
    ];

    for (name, color, slug) in tags {
        let tag = tag::ActiveModel {
            name: Set(name.to_owned()),
            color: Set(color.to_owned()),
            slug: Set(slug.to_owned()),
            ..Default::default()
        };

        tag::Entity::insert(tag)
            .on_conflict(OnConflict::column(tag::Column::Slug).do_nothing().to_owned())
            .exec_without_returning(db)
            .await?;
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

/// Import ingredients from a JSON array of `{name, measurement_unit}`.
/// Returns the number of rows inserted; names already present are skipped.
pub async fn load_ingredients(db: &DatabaseConnection, path: &Path) -> Result<usize, DbErr> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DbErr::Custom(format!("Cannot read {}: {}", path.display(), e)))?;
    let records: Vec<IngredientRecord> = serde_json::from_str(&raw)
        .map_err(|e| DbErr::Custom(format!("Invalid ingredient file: {}", e)))?;

    let txn = db.begin().await?;
    let mut inserted = 0;

    for record in records {
        let exists = ingredient::Entity::find()
            .filter(ingredient::Column::Name.eq(&record.name))
            .filter(ingredient::Column::MeasurementUnit.eq(&record.measurement_unit))
            .one(&txn)
            .await?
            .is_some();
        if exists {
            continue;
        }

        ingredient::ActiveModel {
            name: Set(record.name),
            measurement_unit: Set(record.measurement_unit),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        inserted += 1;
    }

    txn.commit().await?;
    tracing::info!("Loaded {} ingredients from {}", inserted, path.display());
    Ok(inserted)
}
