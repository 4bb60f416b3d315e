//! Notification database operations

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use cropdoc_common::db::models::Notification;
use cropdoc_common::{time, uuid_utils, Error, Result};

fn notification_from_row(row: &SqliteRow) -> Result<Notification> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Failed to parse notification id: {}", e)))?;

    let account_id: String = row.get("account_id");
    let account_id = Uuid::parse_str(&account_id)
        .map_err(|e| Error::Internal(format!("Failed to parse account id: {}", e)))?;

    let deleted_at: Option<String> = row.get("deleted_at");
    let deleted_at = deleted_at.map(|s| time::from_db(&s)).transpose()?;

    let created_at: String = row.get("created_at");

    Ok(Notification {
        id,
        account_id,
        message: row.get("message"),
        read: row.get::<i64, _>("read") != 0,
        deleted_at,
        created_at: time::from_db(&created_at)?,
    })
}

/// Insert a notification for an account
pub async fn insert(pool: &SqlitePool, account_id: Uuid, message: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO notifications (id, account_id, message, read, created_at) VALUES (?, ?, ?, 0, ?)",
    )
    .bind(uuid_utils::generate().to_string())
    .bind(account_id.to_string())
    .bind(message)
    .bind(time::to_db(time::now()))
    .execute(pool)
    .await?;

    Ok(())
}

/// List an account's active (not soft-deleted) notifications, newest first
pub async fn list_active(pool: &SqlitePool, account_id: Uuid) -> Result<Vec<Notification>> {
    let rows = sqlx::query(
        r#"
        SELECT id, account_id, message, read, deleted_at, created_at
        FROM notifications
        WHERE account_id = ? AND deleted_at IS NULL
        ORDER BY created_at DESC
        "#,
    )
    .bind(account_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(notification_from_row).collect()
}

/// Mark a notification as read; scoped to the owning account
pub async fn mark_read(pool: &SqlitePool, account_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE notifications SET read = 1 WHERE id = ? AND account_id = ? AND deleted_at IS NULL",
    )
    .bind(id.to_string())
    .bind(account_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft-delete a notification; scoped to the owning account
pub async fn soft_delete(pool: &SqlitePool, account_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE notifications SET deleted_at = ? WHERE id = ? AND account_id = ? AND deleted_at IS NULL",
    )
    .bind(time::to_db(time::now()))
    .bind(id.to_string())
    .bind(account_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Purge notifications soft-deleted before `cutoff`
pub async fn purge_deleted_before(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM notifications WHERE deleted_at < ?")
        .bind(time::to_db(cutoff))
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
