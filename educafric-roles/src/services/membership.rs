//! Operations on an existing user's roles and schools

use std::str::FromStr;

use educafric_common::db::{RoleSwitch, School, User, UserRoleRecord};
use educafric_common::roles::{conflicting_held_role, Role};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::users::RoleChange;
use crate::db::{directory, user_roles, users};
use crate::error::{ApiError, ApiResult};
use crate::services::detection::{self, AvailableSchool};
use crate::services::registration::membership_for;

/// Context recorded for switches requested by the user
pub const MANUAL_SWITCH_CONTEXT: &str = "manual_switch";

/// Context recorded when deactivating a membership ends the active role
pub const ROLE_DEACTIVATED_CONTEXT: &str = "role_deactivated";

const TEACHER_POSITION: &str = "Enseignant";

pub(crate) async fn require_user(pool: &SqlitePool, user_id: i64) -> ApiResult<User> {
    users::get_user(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))
}

fn parse_role(raw: Option<&str>) -> ApiResult<Role> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(role) => Ok(Role::from_str(role)?),
        None => Err(ApiError::BadRequest("Role is required".to_string())),
    }
}

// ---------------------------------------------------------------------------
// Role options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryRole {
    pub id: i64,
    pub role: Role,
    pub school_id: Option<i64>,
    pub school_name: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleOptions {
    pub user_id: i64,
    pub primary_role: Role,
    pub active_role: Role,
    pub secondary_roles: Vec<SecondaryRole>,
    pub available_schools: Vec<AvailableSchool>,
}

/// Current roles of a user and the schools they could still join
pub async fn role_options(pool: &SqlitePool, user_id: i64) -> ApiResult<RoleOptions> {
    let user = require_user(pool, user_id).await?;
    let records = user_roles::list_user_roles(pool, user_id).await?;

    let mut secondary_roles = Vec::with_capacity(records.len());
    for record in &records {
        let school_name = match record.school_id {
            Some(school_id) => directory::get_school(pool, school_id).await?.map(|s| s.name),
            None => None,
        };
        secondary_roles.push(SecondaryRole {
            id: record.id,
            role: record.role,
            school_id: record.school_id,
            school_name,
            is_active: record.is_active,
            created_at: record.created_at.clone(),
        });
    }

    let held = user_roles::held_roles(&user, &records, true);
    let available_schools = detection::available_schools(pool, &user, &held).await;

    Ok(RoleOptions {
        user_id: user.id,
        primary_role: user.role,
        active_role: user.effective_role(),
        secondary_roles,
        available_schools,
    })
}

// ---------------------------------------------------------------------------
// Add role / activation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRoleRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub affiliation_id: Option<i64>,
    #[serde(default)]
    pub affiliation_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRoleResponse {
    pub message: String,
    pub role: UserRoleRecord,
    pub affiliation_name: Option<String>,
}

/// Attach a secondary role to an existing user
///
/// Conflicts are checked against every role the user holds, inactive ones
/// included, since deactivated memberships can be reactivated.
pub async fn add_role(
    pool: &SqlitePool,
    user_id: i64,
    request: AddRoleRequest,
) -> ApiResult<AddRoleResponse> {
    let role = parse_role(request.role.as_deref())?;
    if role == Role::SiteAdmin {
        return Err(ApiError::BadRequest(
            "SiteAdmin cannot be self-assigned".to_string(),
        ));
    }
    let affiliation_id = request
        .affiliation_id
        .ok_or_else(|| ApiError::BadRequest("Affiliation ID is required".to_string()))?;

    let user = require_user(pool, user_id).await?;
    let held = user_roles::load_held_roles(pool, &user, false).await?;
    let membership = membership_for(role, Some(affiliation_id));

    if let Some(existing) = conflicting_held_role(role, &held) {
        return Err(ApiError::Conflict(format!(
            "Role {} conflicts with held role {}",
            role, existing
        )));
    }
    if held
        .iter()
        .any(|h| h.role == membership.role && h.school_id == membership.school_id)
    {
        return Err(ApiError::Conflict(format!("Role {} is already held", role)));
    }

    if let Some(school_id) = membership.school_id {
        if directory::get_school(pool, school_id).await?.is_none() {
            return Err(ApiError::BadRequest(format!("Unknown school {}", school_id)));
        }
    }

    let record = user_roles::add_user_role(pool, user_id, membership).await?;
    info!("Added role {} (record {}) to user {}", role, record.id, user_id);

    Ok(AddRoleResponse {
        message: "Role added successfully".to_string(),
        role: record,
        affiliation_name: request.affiliation_name,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationRequest {
    pub is_active: bool,
}

/// Toggle one of the user's secondary roles
///
/// Deactivating the membership behind the active role, when no other held
/// role carries the same name, moves the user back to the primary role.
pub async fn set_role_active(
    pool: &SqlitePool,
    user_id: i64,
    role_id: i64,
    is_active: bool,
) -> ApiResult<UserRoleRecord> {
    let not_found =
        || ApiError::NotFound(format!("Role {} not found for user {}", role_id, user_id));

    let user = require_user(pool, user_id).await?;
    let mut records = user_roles::list_user_roles(pool, user_id).await?;
    let target = records
        .iter_mut()
        .find(|r| r.id == role_id)
        .ok_or_else(not_found)?;
    target.is_active = is_active;

    let active_role = user.effective_role();
    let still_held = user_roles::held_roles(&user, &records, true)
        .iter()
        .any(|h| h.role == active_role);
    let reset = (!is_active && !still_held).then_some(RoleChange {
        from_role: active_role,
        to_role: user.role,
        context: ROLE_DEACTIVATED_CONTEXT,
    });

    let record = user_roles::set_user_role_active(pool, user_id, role_id, is_active, reset)
        .await?
        .ok_or_else(not_found)?;

    info!(
        "Role record {} of user {} is now {}",
        role_id,
        user_id,
        if is_active { "active" } else { "inactive" }
    );
    if let Some(change) = reset {
        info!(
            "User {} moved back to role {} after {} was deactivated",
            user_id, change.to_role, change.from_role
        );
    }
    Ok(record)
}

// ---------------------------------------------------------------------------
// Teacher schools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchoolRef {
    pub id: i64,
    pub name: String,
}

impl From<School> for SchoolRef {
    fn from(school: School) -> Self {
        Self {
            id: school.id,
            name: school.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliatedSchool {
    pub id: i64,
    pub name: String,
    pub position: Option<String>,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSchools {
    pub current_school: Option<SchoolRef>,
    pub affiliated_schools: Vec<AffiliatedSchool>,
    pub can_manage_multiple: bool,
}

/// Schools a user may teach at, one entry per school
///
/// Sources, in order: teacher contacts with the user's phone, active Teacher
/// memberships, the primary school of a Teacher primary role.
async fn affiliated_teacher_schools(
    pool: &SqlitePool,
    user: &User,
) -> ApiResult<Vec<AffiliatedSchool>> {
    let current = user.school_id;
    let mut schools: Vec<AffiliatedSchool> = Vec::new();

    for contact in directory::find_teacher_contacts_by_phone(pool, &user.phone).await? {
        if schools.iter().all(|s| s.id != contact.school_id) {
            schools.push(AffiliatedSchool {
                id: contact.school_id,
                name: contact.school_name,
                position: contact.position,
                is_current: current == Some(contact.school_id),
            });
        }
    }

    let mut teaching_ids: Vec<i64> = user_roles::list_user_roles(pool, user.id)
        .await?
        .into_iter()
        .filter(|r| r.is_active && r.role == Role::Teacher)
        .filter_map(|r| r.school_id)
        .collect();
    if user.role == Role::Teacher {
        teaching_ids.extend(user.primary_school_id);
    }

    for school_id in teaching_ids {
        if schools.iter().any(|s| s.id == school_id) {
            continue;
        }
        if let Some(school) = directory::get_school(pool, school_id).await? {
            schools.push(AffiliatedSchool {
                id: school.id,
                name: school.name,
                position: Some(TEACHER_POSITION.to_string()),
                is_current: current == Some(school.id),
            });
        }
    }

    Ok(schools)
}

pub async fn teacher_schools(pool: &SqlitePool, user_id: i64) -> ApiResult<TeacherSchools> {
    let user = require_user(pool, user_id).await?;

    let current_school = match user.school_id {
        Some(school_id) => directory::get_school(pool, school_id).await?.map(SchoolRef::from),
        None => None,
    };
    let affiliated_schools = affiliated_teacher_schools(pool, &user).await?;

    Ok(TeacherSchools {
        current_school,
        can_manage_multiple: affiliated_schools.len() > 1,
        affiliated_schools,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchSchoolRequest {
    #[serde(default)]
    pub school_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchedUser {
    pub id: i64,
    pub name: String,
    pub role: Role,
    pub school_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchSchoolResponse {
    pub message: String,
    pub current_school: SchoolRef,
    pub user: SwitchedUser,
}

/// Make one of the user's affiliated schools the current one
pub async fn switch_school(
    pool: &SqlitePool,
    user_id: i64,
    school_id: Option<i64>,
) -> ApiResult<SwitchSchoolResponse> {
    let school_id =
        school_id.ok_or_else(|| ApiError::BadRequest("School ID is required".to_string()))?;
    let user = require_user(pool, user_id).await?;

    let affiliated = affiliated_teacher_schools(pool, &user).await?;
    let Some(school) = affiliated.into_iter().find(|s| s.id == school_id) else {
        return Err(ApiError::Forbidden(
            "User is not affiliated with this school".to_string(),
        ));
    };

    users::set_school(pool, user_id, school_id).await?;
    info!("User {} switched to school {}", user_id, school_id);

    Ok(SwitchSchoolResponse {
        message: "School switched successfully".to_string(),
        current_school: SchoolRef {
            id: school.id,
            name: school.name,
        },
        user: SwitchedUser {
            id: user.id,
            name: user.full_name(),
            role: user.role,
            school_id: Some(school_id),
        },
    })
}

// ---------------------------------------------------------------------------
// Active role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRoleRequest {
    #[serde(default)]
    pub new_role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRoleResponse {
    pub message: String,
    pub previous_role: Role,
    pub active_role: Role,
}

/// Change the role the user acts as, recording the switch
///
/// Switching to the role already active succeeds without a history entry.
pub async fn switch_role(
    pool: &SqlitePool,
    user_id: i64,
    new_role: Option<&str>,
) -> ApiResult<SwitchRoleResponse> {
    let to_role = parse_role(new_role)?;
    let user = require_user(pool, user_id).await?;

    let held = user_roles::load_held_roles(pool, &user, true).await?;
    if held.iter().all(|h| h.role != to_role) {
        return Err(ApiError::Forbidden(format!(
            "User does not hold role {}",
            to_role
        )));
    }

    let from_role = user.effective_role();
    if from_role != to_role {
        let change = RoleChange {
            from_role,
            to_role,
            context: MANUAL_SWITCH_CONTEXT,
        };
        users::switch_active_role(pool, user_id, change).await?;
        info!("User {} switched role {} -> {}", user_id, from_role, to_role);
    }

    Ok(SwitchRoleResponse {
        message: "Role switched successfully".to_string(),
        previous_role: from_role,
        active_role: to_role,
    })
}

pub async fn role_history(pool: &SqlitePool, user_id: i64) -> ApiResult<Vec<RoleSwitch>> {
    require_user(pool, user_id).await?;
    Ok(users::role_history(pool, user_id).await?)
}
