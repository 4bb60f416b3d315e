//! AI model registry database operations

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use cropdoc_common::db::models::AiModel;
use cropdoc_common::{time, Error, Result};

fn model_from_row(row: &SqliteRow) -> Result<AiModel> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Failed to parse model id: {}", e)))?;

    let last_updated: Option<String> = row.get("last_updated");
    let last_updated = last_updated.map(|s| time::from_db(&s)).transpose()?;

    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(AiModel {
        id,
        name: row.get("name"),
        version: row.get("version"),
        model_type: row.get("model_type"),
        is_enabled: row.get::<i64, _>("is_enabled") != 0,
        accuracy: row.get("accuracy"),
        total_predictions: row.get("total_predictions"),
        last_updated,
        created_at: time::from_db(&created_at)?,
        updated_at: time::from_db(&updated_at)?,
    })
}

const MODEL_COLUMNS: &str = "id, name, version, model_type, is_enabled, accuracy, \
     total_predictions, last_updated, created_at, updated_at";

/// Insert or replace a model registration
pub async fn upsert(pool: &SqlitePool, model: &AiModel) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ai_models (
            id, name, version, model_type, is_enabled, accuracy,
            total_predictions, last_updated, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            version = excluded.version,
            model_type = excluded.model_type,
            is_enabled = excluded.is_enabled,
            accuracy = excluded.accuracy,
            last_updated = excluded.last_updated,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(model.id.to_string())
    .bind(&model.name)
    .bind(&model.version)
    .bind(&model.model_type)
    .bind(model.is_enabled as i64)
    .bind(model.accuracy)
    .bind(model.total_predictions)
    .bind(model.last_updated.map(time::to_db))
    .bind(time::to_db(model.created_at))
    .bind(time::to_db(model.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a model by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<AiModel>> {
    let row = sqlx::query(&format!("SELECT {} FROM ai_models WHERE id = ?", MODEL_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(model_from_row).transpose()
}

/// List all registered models, newest first
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<AiModel>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM ai_models ORDER BY created_at DESC",
        MODEL_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(model_from_row).collect()
}

/// Count a completed analysis against the enabled model
pub async fn increment_predictions(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE ai_models
        SET total_predictions = total_predictions + 1,
            last_updated = ?
        WHERE is_enabled = 1
        "#,
    )
    .bind(time::to_db(time::now()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a model registration
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM ai_models WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
