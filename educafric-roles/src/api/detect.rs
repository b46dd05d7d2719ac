//! Public onboarding endpoints: role detection and multi-role registration

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use educafric_common::roles::MultiRoleSuggestion;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::services::{detection, registration};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRolesRequest {
    pub phone_number: String,
    /// Accepted for compatibility; detection keys on the phone number only
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /detect-roles
pub async fn detect_roles(
    State(state): State<AppState>,
    payload: Result<Json<DetectRolesRequest>, JsonRejection>,
) -> ApiResult<Json<MultiRoleSuggestion>> {
    let Json(request) = payload?;
    let suggestion = detection::detect_potential_roles(&state.db, &request.phone_number).await?;
    Ok(Json(suggestion))
}

/// POST /register-multi-role
///
/// Returns 201 with the created user (without its password hash).
pub async fn register_multi_role(
    State(state): State<AppState>,
    payload: Result<Json<registration::RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<registration::RegisterResponse>)> {
    let Json(request) = payload?;
    let response = registration::register_multi_role(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
