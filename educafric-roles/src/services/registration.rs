//! Multi-role user creation
//!
//! The first selected role becomes the user's primary role; every later one
//! becomes a secondary membership. All rows are written in one transaction.

use std::str::FromStr;

use educafric_common::api::hash_password;
use educafric_common::db::User;
use educafric_common::roles::{find_conflicting_pair, Role};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::users::{self, NewUser, NewUserRole};
use crate::db::directory;
use crate::error::{ApiError, ApiResult};
use crate::services::require_phone;

const DEFAULT_LANGUAGE: &str = "fr";

/// Account fields of a registration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default)]
    pub preferred_language: Option<String>,
}

/// A role the user confirmed from the detection step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedRole {
    pub role: String,
    #[serde(default)]
    pub affiliation_id: Option<i64>,
    #[serde(default)]
    pub affiliation_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_data: Option<UserData>,
    #[serde(default)]
    pub selected_roles: Vec<SelectedRole>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
    pub roles: Vec<SelectedRole>,
}

/// Turn a selected role into the membership it stores
///
/// School-bound roles keep the affiliation id as their school.
pub(crate) fn membership_for(role: Role, affiliation_id: Option<i64>) -> NewUserRole {
    NewUserRole {
        role,
        school_id: if role.is_school_bound() {
            affiliation_id
        } else {
            None
        },
    }
}

fn require_field(value: &str, name: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", name)));
    }
    Ok(trimmed.to_string())
}

/// Create a user holding every selected role
pub async fn register_multi_role(
    pool: &SqlitePool,
    request: RegisterRequest,
) -> ApiResult<RegisterResponse> {
    let (user_data, selected_roles) = match request.user_data {
        Some(data) if !request.selected_roles.is_empty() => (data, request.selected_roles),
        _ => {
            return Err(ApiError::BadRequest(
                "User data and selected roles are required".to_string(),
            ))
        }
    };

    let email = require_field(&user_data.email, "email")?;
    let first_name = require_field(&user_data.first_name, "firstName")?;
    let last_name = require_field(&user_data.last_name, "lastName")?;
    if user_data.password.is_empty() {
        return Err(ApiError::BadRequest("password is required".to_string()));
    }
    let phone = require_phone(&user_data.phone)?;

    let mut memberships: Vec<NewUserRole> = Vec::with_capacity(selected_roles.len());
    for selected in &selected_roles {
        let membership = membership_for(Role::from_str(&selected.role)?, selected.affiliation_id);
        if !memberships.contains(&membership) {
            memberships.push(membership);
        }
    }

    let roles: Vec<Role> = memberships.iter().map(|m| m.role).collect();
    if roles.contains(&Role::SiteAdmin) {
        return Err(ApiError::BadRequest(
            "SiteAdmin cannot be self-assigned".to_string(),
        ));
    }
    if let Some((a, b)) = find_conflicting_pair(&roles) {
        return Err(ApiError::BadRequest(format!(
            "Roles {} and {} cannot be held together",
            a, b
        )));
    }

    for school_id in memberships.iter().filter_map(|m| m.school_id) {
        if directory::get_school(pool, school_id).await?.is_none() {
            return Err(ApiError::BadRequest(format!("Unknown school {}", school_id)));
        }
    }

    if users::get_user_by_phone(pool, &phone).await?.is_some() {
        return Err(ApiError::Conflict(
            "User with this phone number already exists".to_string(),
        ));
    }
    if users::get_user_by_email(pool, &email).await?.is_some() {
        return Err(ApiError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let primary = memberships[0];
    let new_user = NewUser {
        email,
        password_hash: hash_password(&user_data.password)?,
        first_name,
        last_name,
        phone,
        role: primary.role,
        school_id: primary.school_id,
        preferred_language: user_data
            .preferred_language
            .filter(|lang| !lang.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
    };

    let user_id = match users::create_user_with_roles(pool, &new_user, &memberships[1..]).await {
        Ok(id) => id,
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::Conflict(
                "User with this phone number or email already exists".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let user = users::get_user(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("User {} missing after insert", user_id)))?;

    info!(
        "Registered user {} as {} with {} secondary role(s)",
        user.id,
        user.role,
        memberships.len() - 1
    );

    Ok(RegisterResponse {
        message: "Multi-role user created successfully".to_string(),
        user,
        roles: selected_roles,
    })
}
