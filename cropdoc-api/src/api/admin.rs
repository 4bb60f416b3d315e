//! Administration endpoints: user management and the AI-model registry

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use cropdoc_common::db::models::{Account, AiModel};
use cropdoc_common::roles::{can_perform, Action, Role};
use cropdoc_common::{auth, time, uuid_utils};

use crate::api::auth::CurrentAccount;
use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> ApiResult<Json<Vec<Account>>> {
    if !can_perform(Action::ListAccounts, &account) {
        return Err(ApiError::Forbidden("Admins only".to_string()));
    }

    let accounts = db::accounts::list_all(&state.db).await?;
    Ok(Json(accounts))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    if !can_perform(Action::CreateAccount, &account) {
        return Err(ApiError::Forbidden("Admins only".to_string()));
    }

    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "name, email and password are required".to_string(),
        ));
    }

    let created = Account {
        id: uuid_utils::generate(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: auth::hash_password(&payload.password)?,
        role: payload.role,
        is_active: payload.is_active.unwrap_or(true),
        last_login_at: None,
        created_at: time::now(),
    };
    db::accounts::insert(&state.db, &created).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /admin/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<Account>> {
    if !can_perform(Action::UpdateAccount { target_id: user_id }, &account) {
        return Err(ApiError::Forbidden("Admins only".to_string()));
    }
    if payload.name.is_none() && payload.email.is_none() {
        return Err(ApiError::Validation(
            "At least one of name, email is required".to_string(),
        ));
    }

    let updated = db::accounts::update_details(
        &state.db,
        user_id,
        payload.name.as_deref().map(str::trim),
        payload.email.as_deref().map(str::trim),
    )
    .await?;
    if !updated {
        return Err(ApiError::NotFound(format!("User {} not found", user_id)));
    }

    fetch_user(&state, user_id).await
}

/// PATCH /admin/users/:id/role
pub async fn update_user_role(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Account>> {
    if !can_perform(Action::ChangeAccountRole { target_id: user_id }, &account) {
        return Err(self_guard_error(&account, user_id, "change their own role"));
    }

    if !db::accounts::update_role(&state.db, user_id, payload.role).await? {
        return Err(ApiError::NotFound(format!("User {} not found", user_id)));
    }

    fetch_user(&state, user_id).await
}

/// PATCH /admin/users/:id/status
pub async fn update_user_status(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Account>> {
    if !can_perform(Action::SetAccountStatus { target_id: user_id }, &account) {
        return Err(ApiError::Forbidden("Admins only".to_string()));
    }

    if !db::accounts::update_status(&state.db, user_id, payload.is_active).await? {
        return Err(ApiError::NotFound(format!("User {} not found", user_id)));
    }

    fetch_user(&state, user_id).await
}

/// DELETE /admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !can_perform(Action::DeleteAccount { target_id: user_id }, &account) {
        return Err(self_guard_error(&account, user_id, "delete themselves"));
    }

    if !db::accounts::delete(&state.db, user_id).await? {
        return Err(ApiError::NotFound(format!("User {} not found", user_id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Distinguish the self-guard denial from a plain role denial
fn self_guard_error(account: &Account, target_id: Uuid, verb: &str) -> ApiError {
    if account.role == Role::Admin && account.is_active && target_id == account.id {
        ApiError::Forbidden(format!("Admins cannot {}", verb))
    } else {
        ApiError::Forbidden("Admins only".to_string())
    }
}

async fn fetch_user(state: &AppState, user_id: Uuid) -> ApiResult<Json<Account>> {
    let account = db::accounts::get(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))?;
    Ok(Json(account))
}

// ---------------------------------------------------------------------------
// AI-model registry
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateModelRequest {
    pub name: String,
    pub version: String,
    pub model_type: String,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateModelRequest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub model_type: Option<String>,
    pub is_enabled: Option<bool>,
    pub accuracy: Option<f64>,
}

/// GET /admin/models
pub async fn list_models(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> ApiResult<Json<Vec<AiModel>>> {
    if !can_perform(Action::ManageModels, &account) {
        return Err(ApiError::Forbidden("Admins only".to_string()));
    }

    let models = db::ai_models::list_all(&state.db).await?;
    Ok(Json(models))
}

/// POST /admin/models
pub async fn create_model(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(payload): Json<CreateModelRequest>,
) -> ApiResult<(StatusCode, Json<AiModel>)> {
    if !can_perform(Action::ManageModels, &account) {
        return Err(ApiError::Forbidden("Admins only".to_string()));
    }

    let name = payload.name.trim();
    let version = payload.version.trim();
    let model_type = payload.model_type.trim();
    if name.is_empty() || version.is_empty() || model_type.is_empty() {
        return Err(ApiError::Validation(
            "name, version and model_type are required".to_string(),
        ));
    }
    validate_accuracy(payload.accuracy)?;

    let now = time::now();
    let model = AiModel {
        id: uuid_utils::generate(),
        name: name.to_string(),
        version: version.to_string(),
        model_type: model_type.to_string(),
        is_enabled: payload.is_enabled.unwrap_or(true),
        accuracy: payload.accuracy,
        total_predictions: 0,
        last_updated: None,
        created_at: now,
        updated_at: now,
    };
    db::ai_models::upsert(&state.db, &model).await?;

    Ok((StatusCode::CREATED, Json(model)))
}

/// PATCH /admin/models/:id
pub async fn update_model(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(model_id): Path<Uuid>,
    Json(payload): Json<UpdateModelRequest>,
) -> ApiResult<Json<AiModel>> {
    if !can_perform(Action::ManageModels, &account) {
        return Err(ApiError::Forbidden("Admins only".to_string()));
    }
    validate_accuracy(payload.accuracy)?;

    let mut model = db::ai_models::get(&state.db, model_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Model {} not found", model_id)))?;

    if let Some(name) = payload.name {
        model.name = name.trim().to_string();
    }
    if let Some(version) = payload.version {
        model.version = version.trim().to_string();
    }
    if let Some(model_type) = payload.model_type {
        model.model_type = model_type.trim().to_string();
    }
    if let Some(is_enabled) = payload.is_enabled {
        model.is_enabled = is_enabled;
    }
    if let Some(accuracy) = payload.accuracy {
        model.accuracy = Some(accuracy);
    }
    model.updated_at = time::now();

    db::ai_models::upsert(&state.db, &model).await?;
    Ok(Json(model))
}

/// DELETE /admin/models/:id
pub async fn delete_model(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(model_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !can_perform(Action::ManageModels, &account) {
        return Err(ApiError::Forbidden("Admins only".to_string()));
    }

    if !db::ai_models::delete(&state.db, model_id).await? {
        return Err(ApiError::NotFound(format!("Model {} not found", model_id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn validate_accuracy(accuracy: Option<f64>) -> ApiResult<()> {
    if let Some(accuracy) = accuracy {
        if !(0.0..=100.0).contains(&accuracy) {
            return Err(ApiError::Validation(
                "accuracy must be between 0 and 100".to_string(),
            ));
        }
    }
    Ok(())
}
