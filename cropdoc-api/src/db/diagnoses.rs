//! Diagnosis database operations
//!
//! All mutations of an existing record go through `update_pending`, whose
//! UPDATE is conditional on `status = 'PENDING'`. A zero-row result after a
//! successful read means the record left PENDING concurrently; callers map
//! that to `Conflict`.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use cropdoc_common::db::models::{Diagnosis, DiagnosisStatus};
use cropdoc_common::{time, Error, Result};

fn diagnosis_from_row(row: &SqliteRow) -> Result<Diagnosis> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Failed to parse diagnosis id: {}", e)))?;

    let farmer_id: String = row.get("farmer_id");
    let farmer_id = Uuid::parse_str(&farmer_id)
        .map_err(|e| Error::Internal(format!("Failed to parse farmer id: {}", e)))?;

    let status: String = row.get("status");
    let status = DiagnosisStatus::parse(&status)
        .ok_or_else(|| Error::Internal(format!("Unknown diagnosis status: {}", status)))?;

    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Diagnosis {
        id,
        farmer_id,
        image_url: row.get("image_url"),
        plant_name: row.get("plant_name"),
        disease_name: row.get("disease_name"),
        confidence: row.get("confidence"),
        status,
        treatment: row.get("treatment"),
        agronomist_notes: row.get("agronomist_notes"),
        created_at: time::from_db(&created_at)?,
        updated_at: time::from_db(&updated_at)?,
    })
}

const DIAGNOSIS_COLUMNS: &str = "id, farmer_id, image_url, plant_name, disease_name, \
     confidence, status, treatment, agronomist_notes, created_at, updated_at";

/// Insert a newly submitted diagnosis
pub async fn insert(pool: &SqlitePool, diagnosis: &Diagnosis) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO diagnoses (
            id, farmer_id, image_url, plant_name, disease_name,
            confidence, status, treatment, agronomist_notes, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(diagnosis.id.to_string())
    .bind(diagnosis.farmer_id.to_string())
    .bind(&diagnosis.image_url)
    .bind(&diagnosis.plant_name)
    .bind(&diagnosis.disease_name)
    .bind(diagnosis.confidence)
    .bind(diagnosis.status.as_str())
    .bind(&diagnosis.treatment)
    .bind(&diagnosis.agronomist_notes)
    .bind(time::to_db(diagnosis.created_at))
    .bind(time::to_db(diagnosis.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a diagnosis by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Diagnosis>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM diagnoses WHERE id = ?",
        DIAGNOSIS_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(diagnosis_from_row).transpose()
}

/// List a farmer's own diagnoses, newest first
pub async fn list_by_farmer(pool: &SqlitePool, farmer_id: Uuid) -> Result<Vec<Diagnosis>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM diagnoses WHERE farmer_id = ? ORDER BY created_at DESC",
        DIAGNOSIS_COLUMNS
    ))
    .bind(farmer_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(diagnosis_from_row).collect()
}

/// List all records still awaiting review
///
/// Ordering and low-confidence filtering are applied by the triage service.
pub async fn list_pending(pool: &SqlitePool) -> Result<Vec<Diagnosis>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM diagnoses WHERE status = 'PENDING'",
        DIAGNOSIS_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(diagnosis_from_row).collect()
}

/// Write back a record read as PENDING, conditional on it still being PENDING
///
/// Returns false when the guard failed (the record was finalized by a
/// concurrent writer between the caller's read and this write).
pub async fn update_pending(pool: &SqlitePool, diagnosis: &Diagnosis) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE diagnoses
        SET plant_name = ?,
            disease_name = ?,
            confidence = ?,
            status = ?,
            treatment = ?,
            agronomist_notes = ?,
            updated_at = ?
        WHERE id = ? AND status = 'PENDING'
        "#,
    )
    .bind(&diagnosis.plant_name)
    .bind(&diagnosis.disease_name)
    .bind(diagnosis.confidence)
    .bind(diagnosis.status.as_str())
    .bind(&diagnosis.treatment)
    .bind(&diagnosis.agronomist_notes)
    .bind(time::to_db(diagnosis.updated_at))
    .bind(diagnosis.id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
