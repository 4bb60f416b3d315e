//! Diagnosis lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use cropdoc_common::db::models::Diagnosis;

use crate::api::auth::CurrentAccount;
use crate::error::ApiResult;
use crate::services::triage::SortOrder;
use crate::services::{inference, lifecycle};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    pub plant_name: Option<String>,
    pub disease_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub treatment: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default)]
    pub low_confidence: bool,
}

/// POST /api/diagnoses
///
/// Creates a PENDING record and kicks off analysis in the background.
pub async fn submit(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(payload): Json<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<Diagnosis>)> {
    let diagnosis = lifecycle::submit(&state.db, &account, &payload.image_url).await?;
    inference::spawn_analysis(state.db.clone(), diagnosis.id);

    Ok((StatusCode::CREATED, Json(diagnosis)))
}

/// PATCH /api/diagnoses/:id
pub async fn annotate(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnnotateRequest>,
) -> ApiResult<Json<Diagnosis>> {
    let patch = lifecycle::AnnotatePatch {
        plant_name: payload.plant_name,
        disease_name: payload.disease_name,
    };
    let diagnosis = lifecycle::annotate(&state.db, &account, id, patch).await?;
    Ok(Json(diagnosis))
}

/// POST /api/diagnoses/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveRequest>,
) -> ApiResult<Json<Diagnosis>> {
    let diagnosis = lifecycle::approve(
        &state.db,
        &account,
        id,
        &payload.treatment,
        payload.notes.as_deref(),
    )
    .await?;
    Ok(Json(diagnosis))
}

/// POST /api/diagnoses/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectRequest>,
) -> ApiResult<Json<Diagnosis>> {
    let diagnosis = lifecycle::reject(&state.db, &account, id, &payload.reason).await?;
    Ok(Json(diagnosis))
}

/// GET /api/diagnoses/:id
pub async fn get_diagnosis(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Diagnosis>> {
    let diagnosis = lifecycle::get_visible(&state.db, &account, id).await?;
    Ok(Json(diagnosis))
}

/// GET /api/diagnoses
pub async fn list_own(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> ApiResult<Json<Vec<Diagnosis>>> {
    let diagnoses = lifecycle::list_own(&state.db, &account).await?;
    Ok(Json(diagnoses))
}

/// GET /api/diagnoses/pending?sort=newest|oldest|confidence&low_confidence=true
pub async fn list_pending(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Query(query): Query<PendingQuery>,
) -> ApiResult<Json<Vec<Diagnosis>>> {
    let queue =
        lifecycle::list_pending(&state.db, &account, query.sort, query.low_confidence).await?;
    Ok(Json(queue))
}
