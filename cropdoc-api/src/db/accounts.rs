//! Account database operations

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use cropdoc_common::db::models::Account;
use cropdoc_common::roles::Role;
use cropdoc_common::{time, Error, Result};

fn account_from_row(row: &SqliteRow) -> Result<Account> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Failed to parse account id: {}", e)))?;

    let role: String = row.get("role");
    let role = Role::parse(&role)
        .ok_or_else(|| Error::Internal(format!("Unknown role in database: {}", role)))?;

    let last_login_at: Option<String> = row.get("last_login_at");
    let last_login_at = last_login_at.map(|s| time::from_db(&s)).transpose()?;

    let created_at: String = row.get("created_at");

    Ok(Account {
        id,
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        is_active: row.get::<i64, _>("is_active") != 0,
        last_login_at,
        created_at: time::from_db(&created_at)?,
    })
}

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, role, is_active, last_login_at, created_at";

/// Insert a new account
///
/// A duplicate email maps to `Conflict` so the handler can answer 409.
pub async fn insert(pool: &SqlitePool, account: &Account) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts (id, name, email, password_hash, role, is_active, last_login_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(account.id.to_string())
    .bind(&account.name)
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(account.role.as_str())
    .bind(account.is_active as i64)
    .bind(account.last_login_at.map(time::to_db))
    .bind(time::to_db(account.created_at))
    .execute(pool)
    .await
    .map_err(|e| {
        if e.as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false)
        {
            Error::Conflict("Email already in use".to_string())
        } else {
            Error::Database(e)
        }
    })?;

    Ok(())
}

/// Load an account by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Account>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM accounts WHERE id = ?",
        ACCOUNT_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(account_from_row).transpose()
}

/// Load an account by email
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Account>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM accounts WHERE email = ?",
        ACCOUNT_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(account_from_row).transpose()
}

/// List all accounts, newest first
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Account>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM accounts ORDER BY created_at DESC",
        ACCOUNT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(account_from_row).collect()
}

/// Update name and/or email
pub async fn update_details(
    pool: &SqlitePool,
    id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET name = COALESCE(?, name),
            email = COALESCE(?, email)
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(id.to_string())
    .execute(pool)
    .await
    .map_err(|e| {
        if e.as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false)
        {
            Error::Conflict("Email already in use".to_string())
        } else {
            Error::Database(e)
        }
    })?;

    Ok(result.rows_affected() > 0)
}

/// Change an account's role
pub async fn update_role(pool: &SqlitePool, id: Uuid, role: Role) -> Result<bool> {
    let result = sqlx::query("UPDATE accounts SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Activate or deactivate an account
pub async fn update_status(pool: &SqlitePool, id: Uuid, is_active: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE accounts SET is_active = ? WHERE id = ?")
        .bind(is_active as i64)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a successful login
pub async fn update_last_login(pool: &SqlitePool, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE accounts SET last_login_at = ? WHERE id = ?")
        .bind(time::to_db(at))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Hard-delete an account (sessions and notifications cascade)
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
