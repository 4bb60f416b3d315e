//! cropdoc-api library - REST backend for the CropDoc platform
//!
//! Exposes the router and state for integration testing.

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod pagination;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Everything except /health and the login/register endpoints sits behind
/// the bearer-token middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, patch, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/auth/me", get(api::auth::me))
        .route(
            "/api/diagnoses",
            post(api::diagnoses::submit).get(api::diagnoses::list_own),
        )
        .route("/api/diagnoses/pending", get(api::diagnoses::list_pending))
        .route(
            "/api/diagnoses/:id",
            get(api::diagnoses::get_diagnosis).patch(api::diagnoses::annotate),
        )
        .route("/api/diagnoses/:id/approve", post(api::diagnoses::approve))
        .route("/api/diagnoses/:id/reject", post(api::diagnoses::reject))
        .route(
            "/api/articles",
            get(api::articles::list_articles).post(api::articles::create_article),
        )
        .route(
            "/api/articles/:id",
            get(api::articles::get_article)
                .put(api::articles::update_article)
                .delete(api::articles::delete_article),
        )
        .route("/api/notifications", get(api::notifications::list_notifications))
        .route("/api/notifications/:id/read", post(api::notifications::mark_read))
        .route(
            "/api/notifications/:id",
            delete(api::notifications::delete_notification),
        )
        .route(
            "/admin/users",
            get(api::admin::list_users).post(api::admin::create_user),
        )
        .route(
            "/admin/users/:id",
            patch(api::admin::update_user).delete(api::admin::delete_user),
        )
        .route("/admin/users/:id/role", patch(api::admin::update_user_role))
        .route("/admin/users/:id/status", patch(api::admin::update_user_status))
        .route(
            "/admin/models",
            get(api::admin::list_models).post(api::admin::create_model),
        )
        .route(
            "/admin/models/:id",
            patch(api::admin::update_model).delete(api::admin::delete_model),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/admin/login", post(api::auth::admin_login))
        .merge(api::health::health_routes());

    // Browser and mobile clients call from other origins
    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
