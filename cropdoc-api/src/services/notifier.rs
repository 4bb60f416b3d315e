//! Best-effort notification delivery and retention cleanup
//!
//! Delivery failures are logged and swallowed: a notification must never
//! fail the transition that triggered it.

use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use cropdoc_common::{time, Result};

use crate::db;

/// Soft-deleted notifications older than this many days are purged
pub const CLEANUP_DAYS: i64 = 60;

/// How often the cleanup task runs
const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Deliver a notification, best-effort
pub async fn notify(pool: &SqlitePool, account_id: Uuid, message: &str) {
    if let Err(e) = db::notifications::insert(pool, account_id, message).await {
        warn!("Failed to deliver notification to {}: {}", account_id, e);
    }
}

/// Purge notifications soft-deleted more than `CLEANUP_DAYS` ago
pub async fn cleanup_notifications(pool: &SqlitePool) -> Result<u64> {
    let cutoff = time::now() - chrono::Duration::days(CLEANUP_DAYS);
    db::notifications::purge_deleted_before(pool, cutoff).await
}

/// Spawn the daily retention cleanup task
pub fn spawn_cleanup_task(pool: SqlitePool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match cleanup_notifications(&pool).await {
                Ok(purged) if purged > 0 => info!("Purged {} old notifications", purged),
                Ok(_) => {}
                Err(e) => warn!("Notification cleanup failed: {}", e),
            }
        }
    });
}
