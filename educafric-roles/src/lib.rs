//! educafric-roles library - multi-role detection and management
//!
//! Detects which roles a phone number can claim from the school directory,
//! registers users holding several roles, and lets existing users add roles,
//! switch their active role and move between the schools they teach at.

use axum::Router;
use educafric_common::config::TomlConfig;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

/// Session settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthConfig {
    /// When false every protected request runs unrestricted
    pub require_auth: bool,
    pub session_ttl_hours: i64,
}

impl AuthConfig {
    pub fn disabled() -> Self {
        Self {
            require_auth: false,
            session_ttl_hours: 24,
        }
    }
}

impl From<&TomlConfig> for AuthConfig {
    fn from(config: &TomlConfig) -> Self {
        Self {
            require_auth: config.require_auth,
            session_ttl_hours: config.session_ttl_hours,
        }
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(db: SqlitePool, auth: AuthConfig) -> Self {
        Self { db, auth }
    }
}

/// Build application router
///
/// Onboarding, login and health are public; every `:userId` route goes
/// through the session middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require a session for the same user or a SiteAdmin)
    let protected = Router::new()
        .route("/user-roles/:userId", get(api::get_user_roles))
        .route(
            "/user-roles/:userId/:roleId/activation",
            post(api::set_role_activation),
        )
        .route("/add-role/:userId", post(api::add_role))
        .route("/teacher-schools/:userId", get(api::get_teacher_schools))
        .route("/switch-school/:userId", post(api::switch_school))
        .route("/switch-role/:userId", post(api::switch_role))
        .route("/role-history/:userId", get(api::role_history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_middleware,
        ));

    // Public routes
    let public = Router::new()
        .route("/detect-roles", post(api::detect_roles))
        .route("/register-multi-role", post(api::register_multi_role))
        .route("/login", post(api::login))
        .route("/logout", post(api::logout))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
