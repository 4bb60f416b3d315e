//! Session token database operations

use sqlx::SqlitePool;
use uuid::Uuid;

use cropdoc_common::db::models::Session;
use cropdoc_common::{auth, time, Error, Result};

/// Issue a new session for an account
pub async fn create(pool: &SqlitePool, account_id: Uuid) -> Result<Session> {
    let now = time::now();
    let session = Session {
        token: auth::generate_token(),
        account_id,
        created_at: now,
        expires_at: auth::session_expiry(now),
    };

    sqlx::query(
        "INSERT INTO sessions (token, account_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session.token)
    .bind(session.account_id.to_string())
    .bind(time::to_db(session.created_at))
    .bind(time::to_db(session.expires_at))
    .execute(pool)
    .await?;

    Ok(session)
}

/// Resolve a token to its account id, ignoring expired sessions
pub async fn find_account_id(pool: &SqlitePool, token: &str) -> Result<Option<Uuid>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT account_id FROM sessions WHERE token = ? AND expires_at > ?")
            .bind(token)
            .bind(time::to_db(time::now()))
            .fetch_optional(pool)
            .await?;

    match row {
        Some((account_id,)) => {
            let id = Uuid::parse_str(&account_id)
                .map_err(|e| Error::Internal(format!("Failed to parse account id: {}", e)))?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}

/// Remove expired sessions (startup housekeeping)
pub async fn delete_expired(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(time::to_db(time::now()))
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
