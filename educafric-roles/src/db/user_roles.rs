//! Secondary role memberships

use crate::db::users::{apply_role_change, NewUserRole, RoleChange};
use educafric_common::db::{User, UserRoleRecord};
use educafric_common::roles::HeldRole;
use educafric_common::{time, Result};
use sqlx::SqlitePool;

pub async fn add_user_role(
    pool: &SqlitePool,
    user_id: i64,
    new_role: NewUserRole,
) -> Result<UserRoleRecord> {
    let id = sqlx::query(
        "INSERT INTO user_roles (user_id, role, school_id, is_active, created_at) VALUES (?, ?, ?, 1, ?)",
    )
    .bind(user_id)
    .bind(new_role.role)
    .bind(new_role.school_id)
    .bind(time::now_rfc3339())
    .execute(pool)
    .await?
    .last_insert_rowid();

    let record = sqlx::query_as::<_, UserRoleRecord>("SELECT * FROM user_roles WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(record)
}

/// All secondary roles of a user, active or not, oldest first
pub async fn list_user_roles(pool: &SqlitePool, user_id: i64) -> Result<Vec<UserRoleRecord>> {
    let roles = sqlx::query_as::<_, UserRoleRecord>(
        "SELECT * FROM user_roles WHERE user_id = ? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(roles)
}

/// Toggle a membership's active flag
///
/// Returns `None` when `role_id` does not belong to `user_id`. A `reset`
/// change is applied to the user's active role in the same transaction.
pub async fn set_user_role_active(
    pool: &SqlitePool,
    user_id: i64,
    role_id: i64,
    is_active: bool,
    reset: Option<RoleChange<'_>>,
) -> Result<Option<UserRoleRecord>> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE user_roles SET is_active = ? WHERE id = ? AND user_id = ?")
        .bind(is_active)
        .bind(role_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    if let Some(change) = reset {
        apply_role_change(&mut *tx, user_id, change).await?;
    }

    let record = sqlx::query_as::<_, UserRoleRecord>("SELECT * FROM user_roles WHERE id = ?")
        .bind(role_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(record))
}

/// Primary role plus secondary roles, optionally only active ones
pub fn held_roles(user: &User, secondary: &[UserRoleRecord], active_only: bool) -> Vec<HeldRole> {
    std::iter::once(HeldRole::new(user.role, user.primary_school_id))
        .chain(
            secondary
                .iter()
                .filter(|r| r.is_active || !active_only)
                .map(|r| HeldRole::new(r.role, r.school_id)),
        )
        .collect()
}

/// Load and combine a user's roles
pub async fn load_held_roles(
    pool: &SqlitePool,
    user: &User,
    active_only: bool,
) -> Result<Vec<HeldRole>> {
    let secondary = list_user_roles(pool, user.id).await?;
    Ok(held_roles(user, &secondary, active_only))
}
