//! Multi-school teacher endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};

use crate::api::auth::RequestContext;
use crate::error::ApiResult;
use crate::services::membership::{
    self, SwitchSchoolRequest, SwitchSchoolResponse, TeacherSchools,
};
use crate::AppState;

/// GET /teacher-schools/:userId
pub async fn get_teacher_schools(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<TeacherSchools>> {
    let Path(user_id) = path?;
    context.ensure_can_act_for(user_id)?;
    Ok(Json(membership::teacher_schools(&state.db, user_id).await?))
}

/// POST /switch-school/:userId
///
/// 403 when the school is not one of the user's affiliated schools.
pub async fn switch_school(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SwitchSchoolRequest>, JsonRejection>,
) -> ApiResult<Json<SwitchSchoolResponse>> {
    let Path(user_id) = path?;
    context.ensure_can_act_for(user_id)?;
    let Json(request) = payload?;
    let response = membership::switch_school(&state.db, user_id, request.school_id).await?;
    Ok(Json(response))
}
