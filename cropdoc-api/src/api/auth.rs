//! Authentication: bearer-token middleware and the register/login endpoints
//!
//! Tokens are opaque session ids stored in the database. The middleware
//! re-reads the session and account rows on every request, so role and
//! active-flag changes take effect on the caller's next request.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};

use cropdoc_common::db::models::Account;
use cropdoc_common::roles::Role;
use cropdoc_common::{auth, time, uuid_utils};

use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

/// The authenticated account, injected by `auth_middleware`
#[derive(Clone)]
pub struct CurrentAccount(pub Account);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAccount>()
            .cloned()
            .ok_or_else(|| {
                ApiError::Internal("Handler reached without auth middleware".to_string())
            })
    }
}

/// Authentication middleware for protected routes
///
/// Resolves `Authorization: Bearer <token>` to an account and stores it in
/// request extensions. Returns 401 when the token is missing, unknown, or
/// expired. Role/active checks are per-operation, not done here.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)?;
    let account = resolve_account(&state, &token).await?;

    request.extensions_mut().insert(CurrentAccount(account));
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Result<String, ApiError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated("Expected a bearer token".to_string()))
}

/// Resolve a token to its account, fresh from the database
async fn resolve_account(state: &AppState, token: &str) -> Result<Account, ApiError> {
    let account_id = db::sessions::find_account_id(&state.db, token)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid or expired token".to_string()))?;

    let account = db::accounts::get(&state.db, account_id)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Account no longer exists".to_string()))?;

    Ok(account)
}

/// Registration payload (farmer or agronomist self-signup)
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Login payload; `role` optionally asserts which portal the client used
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Issued token plus the sanitized account
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub account: Account,
}

/// POST /auth/register
///
/// Self-signup is limited to FARMER and AGRONOMIST; admins are created by
/// an existing admin.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "name, email and password are required".to_string(),
        ));
    }
    if payload.role == Role::Admin {
        return Err(ApiError::BadRequest("Invalid role selection".to_string()));
    }

    let now = time::now();
    let account = Account {
        id: uuid_utils::generate(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: auth::hash_password(&payload.password)?,
        role: payload.role,
        is_active: true,
        last_login_at: Some(now),
        created_at: now,
    };
    db::accounts::insert(&state.db, &account).await?;

    let session = db::sessions::create(&state.db, account.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: session.token,
            account,
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    login_with_required_role(&state, payload, None).await
}

/// POST /auth/admin/login
///
/// Same flow as login but only admits ADMIN accounts.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    login_with_required_role(&state, payload, Some(Role::Admin)).await
}

async fn login_with_required_role(
    state: &AppState,
    payload: LoginRequest,
    required_role: Option<Role>,
) -> ApiResult<Json<AuthResponse>> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let mut account = db::accounts::find_by_email(&state.db, payload.email.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid credentials".to_string()))?;

    if let Some(required) = required_role {
        if account.role != required {
            return Err(ApiError::Forbidden("Admins only".to_string()));
        }
    }
    if let Some(asserted) = payload.role {
        if account.role != asserted {
            return Err(ApiError::Forbidden("Role mismatch".to_string()));
        }
    }
    if !account.is_active {
        return Err(ApiError::Forbidden("Account is inactive".to_string()));
    }
    if !auth::verify_password(&payload.password, &account.password_hash) {
        return Err(ApiError::Unauthenticated("Invalid credentials".to_string()));
    }

    let now = time::now();
    db::accounts::update_last_login(&state.db, account.id, now).await?;
    account.last_login_at = Some(now);

    let session = db::sessions::create(&state.db, account.id).await?;
    Ok(Json(AuthResponse {
        token: session.token,
        account,
    }))
}

/// GET /auth/me
pub async fn me(CurrentAccount(account): CurrentAccount) -> Json<Account> {
    Json(account)
}
