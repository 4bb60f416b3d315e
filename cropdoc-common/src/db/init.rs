//! Database initialization
//!
//! Creates the database on first run with the default schema, enables the
//! pragmas every service relies on, and seeds the bootstrap admin account.
//! Safe to call multiple times; all schema statements are idempotent.

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

use crate::auth;
use crate::roles::Role;
use crate::{time, uuid_utils, Result};

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pragmas(&pool).await?;
    init_schema(&pool).await?;
    seed_default_admin(&pool).await?;

    Ok(pool)
}

/// Connect to a private in-memory database (test use)
///
/// A single connection keeps every query on the same in-memory instance.
pub async fn connect_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    configure_pragmas(&pool).await?;
    init_schema(&pool).await?;

    Ok(pool)
}

async fn configure_pragmas(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    // Wait out transient lock contention instead of failing immediately
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

/// Create all tables (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_accounts_table(pool).await?;
    create_sessions_table(pool).await?;
    create_diagnoses_table(pool).await?;
    create_notifications_table(pool).await?;
    create_articles_table(pool).await?;
    create_ai_models_table(pool).await?;
    Ok(())
}

async fn create_accounts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            last_login_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_diagnoses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS diagnoses (
            id TEXT PRIMARY KEY,
            farmer_id TEXT NOT NULL REFERENCES accounts(id),
            image_url TEXT NOT NULL,
            plant_name TEXT NOT NULL,
            disease_name TEXT,
            confidence REAL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            treatment TEXT,
            agronomist_notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_diagnoses_status ON diagnoses(status)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_diagnoses_farmer ON diagnoses(farmer_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_notifications_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            message TEXT NOT NULL,
            read INTEGER NOT NULL DEFAULT 0,
            deleted_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_notifications_account ON notifications(account_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_articles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id TEXT PRIMARY KEY,
            author_id TEXT,
            author_name TEXT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            excerpt TEXT NOT NULL,
            cover_image_url TEXT,
            source TEXT NOT NULL,
            external_url TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            published INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_ai_models_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ai_models (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            version TEXT NOT NULL,
            model_type TEXT NOT NULL,
            is_enabled INTEGER NOT NULL DEFAULT 1,
            accuracy REAL,
            total_predictions INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed the bootstrap admin account when no accounts exist yet
///
/// Email and password come from `CROPDOC_ADMIN_EMAIL` / `CROPDOC_ADMIN_PASSWORD`,
/// falling back to admin@cropdoc.local / admin.
pub async fn seed_default_admin(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let email = std::env::var("CROPDOC_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@cropdoc.local".to_string());
    let password =
        std::env::var("CROPDOC_ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    let password_hash = auth::hash_password(&password)?;
    let now = time::to_db(time::now());

    sqlx::query(
        r#"
        INSERT INTO accounts (id, name, email, password_hash, role, is_active, created_at)
        VALUES (?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(uuid_utils::generate().to_string())
    .bind("Administrator")
    .bind(&email)
    .bind(&password_hash)
    .bind(Role::Admin.as_str())
    .bind(&now)
    .execute(pool)
    .await?;

    info!("Seeded bootstrap admin account: {}", email);
    if std::env::var("CROPDOC_ADMIN_PASSWORD").is_err() {
        warn!("Bootstrap admin uses the default password; set CROPDOC_ADMIN_PASSWORD");
    }

    Ok(())
}
