//! Notification endpoints
//!
//! Every route is scoped to the authenticated account; there is no way to
//! read or delete another account's notifications.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use cropdoc_common::db::models::Notification;

use crate::api::auth::CurrentAccount;
use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = db::notifications::list_active(&state.db, account.id).await?;
    Ok(Json(notifications))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MarkReadResponse>> {
    if !db::notifications::mark_read(&state.db, account.id, id).await? {
        return Err(ApiError::NotFound(format!("Notification {} not found", id)));
    }

    Ok(Json(MarkReadResponse { success: true }))
}

/// DELETE /api/notifications/:id
pub async fn delete_notification(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !db::notifications::soft_delete(&state.db, account.id, id).await? {
        return Err(ApiError::NotFound(format!("Notification {} not found", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}
