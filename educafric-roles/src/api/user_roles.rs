//! Role membership endpoints for an existing user

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use educafric_common::db::{RoleSwitch, UserRoleRecord};

use crate::api::auth::RequestContext;
use crate::error::ApiResult;
use crate::services::membership::{
    self, ActivationRequest, AddRoleRequest, AddRoleResponse, RoleOptions, SwitchRoleRequest,
    SwitchRoleResponse,
};
use crate::AppState;

/// GET /user-roles/:userId
pub async fn get_user_roles(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<RoleOptions>> {
    let Path(user_id) = path?;
    context.ensure_can_act_for(user_id)?;
    Ok(Json(membership::role_options(&state.db, user_id).await?))
}

/// POST /add-role/:userId
pub async fn add_role(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AddRoleRequest>, JsonRejection>,
) -> ApiResult<Json<AddRoleResponse>> {
    let Path(user_id) = path?;
    context.ensure_can_act_for(user_id)?;
    let Json(request) = payload?;
    Ok(Json(membership::add_role(&state.db, user_id, request).await?))
}

/// POST /user-roles/:userId/:roleId/activation
pub async fn set_role_activation(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    path: Result<Path<(i64, i64)>, PathRejection>,
    payload: Result<Json<ActivationRequest>, JsonRejection>,
) -> ApiResult<Json<UserRoleRecord>> {
    let Path((user_id, role_id)) = path?;
    context.ensure_can_act_for(user_id)?;
    let Json(request) = payload?;
    let record = membership::set_role_active(&state.db, user_id, role_id, request.is_active).await?;
    Ok(Json(record))
}

/// POST /switch-role/:userId
pub async fn switch_role(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SwitchRoleRequest>, JsonRejection>,
) -> ApiResult<Json<SwitchRoleResponse>> {
    let Path(user_id) = path?;
    context.ensure_can_act_for(user_id)?;
    let Json(request) = payload?;
    let response = membership::switch_role(&state.db, user_id, request.new_role.as_deref()).await?;
    Ok(Json(response))
}

/// GET /role-history/:userId
pub async fn role_history(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<RoleSwitch>>> {
    let Path(user_id) = path?;
    context.ensure_can_act_for(user_id)?;
    Ok(Json(membership::role_history(&state.db, user_id).await?))
}
