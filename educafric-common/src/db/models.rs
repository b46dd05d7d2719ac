//! Database models

use crate::roles::Role;
use serde::Serialize;

/// User account; `role` is the primary role
///
/// `primary_school_id` is the school the primary role belongs to and never
/// changes. `school_id` is the current school, moved by school switches.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: Role,
    pub active_role: Option<Role>,
    pub school_id: Option<i64>,
    pub primary_school_id: Option<i64>,
    pub preferred_language: String,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Role the user is currently acting as
    pub fn effective_role(&self) -> Role {
        self.active_role.unwrap_or(self.role)
    }
}

/// Secondary role membership
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleRecord {
    pub id: i64,
    pub user_id: i64,
    pub role: Role,
    pub school_id: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub admin_phone: Option<String>,
    pub contact_phone: Option<String>,
}

/// One entry of a user's active-role history
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoleSwitch {
    pub id: i64,
    pub user_id: i64,
    pub from_role: Role,
    pub to_role: Role,
    pub context: String,
    pub switched_at: String,
}
