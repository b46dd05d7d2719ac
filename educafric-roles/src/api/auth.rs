//! Session authentication for educafric-roles
//!
//! Login issues a random token in the `educafric_session` cookie and stores
//! only its SHA-256. The middleware resolves the cookie into a
//! [`RequestContext`] that handlers receive as a request extension.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use educafric_common::api::{session_token_from_cookie_header, verify_password, SESSION_COOKIE_NAME};
use educafric_common::config::MAX_SESSION_TTL_HOURS;
use educafric_common::db::User;
use educafric_common::phone::normalize_phone;
use educafric_common::roles::Role;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::{sessions, user_roles, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Authenticated user behind a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
    pub is_site_admin: bool,
}

/// Identity attached to every protected request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestContext {
    /// Authentication disabled by configuration
    Unrestricted,
    Session(SessionUser),
}

impl RequestContext {
    /// Allow acting on `user_id` only as that user or as a SiteAdmin
    pub fn ensure_can_act_for(&self, user_id: i64) -> ApiResult<()> {
        match self {
            RequestContext::Unrestricted => Ok(()),
            RequestContext::Session(session)
                if session.user_id == user_id || session.is_site_admin =>
            {
                Ok(())
            }
            RequestContext::Session(session) => {
                warn!(
                    "User {} denied access to user {}",
                    session.user_id, user_id
                );
                Err(ApiError::Forbidden(
                    "Not allowed to act for this user".to_string(),
                ))
            }
        }
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(session_token_from_cookie_header)
        .map(str::to_string)
}

/// Session middleware for protected routes
///
/// Returns 401 when auth is required and the cookie is missing, unknown or
/// expired.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = if state.auth.require_auth {
        let token = session_token(request.headers())
            .ok_or_else(|| ApiError::Unauthorized("Missing session cookie".to_string()))?;

        let user = sessions::find_session_user(&state.db, &token)
            .await?
            .ok_or_else(|| {
                warn!("Rejected unknown or expired session");
                ApiError::Unauthorized("Invalid or expired session".to_string())
            })?;

        let held = user_roles::load_held_roles(&state.db, &user, true).await?;
        RequestContext::Session(SessionUser {
            user_id: user.id,
            is_site_admin: held.iter().any(|h| h.role == Role::SiteAdmin),
        })
    } else {
        RequestContext::Unrestricted
    };

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

fn session_cookie(token: &str, max_age_secs: i64) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE_NAME, token, max_age_secs
    ))
    .map_err(|e| ApiError::Internal(format!("Invalid cookie value: {}", e)))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: User,
}

/// POST /login
///
/// Accepts a phone number or an email plus the password.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;

    let user = if let Some(phone) = request.phone.as_deref().and_then(normalize_phone) {
        users::get_user_by_phone(&state.db, &phone).await?
    } else if let Some(email) = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        users::get_user_by_email(&state.db, email).await?
    } else {
        return Err(ApiError::BadRequest(
            "Phone number or email is required".to_string(),
        ));
    };

    let user = match user {
        Some(user) if verify_password(&request.password, &user.password_hash)? => user,
        _ => {
            warn!("Failed login attempt");
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    let ttl_hours = state.auth.session_ttl_hours;
    let token = sessions::create_session(&state.db, user.id, ttl_hours).await?;
    let cookie = session_cookie(&token, ttl_hours.clamp(0, MAX_SESSION_TTL_HOURS) * 3600)?;
    info!("User {} logged in", user.id);

    let mut response = Json(LoginResponse {
        message: "Logged in".to_string(),
        user,
    })
    .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// POST /logout
///
/// Always clears the cookie; deletes the session when one was presented.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = session_token(&headers) {
        sessions::delete_session(&state.db, &token).await?;
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, session_cookie("", 0)?);
    Ok(response)
}
