//! User accounts and active-role history

use educafric_common::db::{RoleSwitch, User};
use educafric_common::roles::Role;
use educafric_common::{time, Result};
use sqlx::{SqliteConnection, SqlitePool};

/// Fields of a user row about to be created
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: Role,
    pub school_id: Option<i64>,
    pub preferred_language: String,
}

/// Secondary role to attach to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewUserRole {
    pub role: Role,
    pub school_id: Option<i64>,
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_phone(pool: &SqlitePool, phone: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone = ?")
        .bind(phone)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Create a user and its secondary roles in one transaction
///
/// Returns the new user id. Either everything is written or nothing is.
pub async fn create_user_with_roles(
    pool: &SqlitePool,
    user: &NewUser,
    secondary_roles: &[NewUserRole],
) -> Result<i64> {
    let now = time::now_rfc3339();
    let mut tx = pool.begin().await?;

    let user_id = sqlx::query(
        r#"
        INSERT INTO users (
            email, password_hash, first_name, last_name, phone,
            role, school_id, primary_school_id, preferred_language, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.phone)
    .bind(user.role)
    .bind(user.school_id)
    .bind(user.school_id)
    .bind(&user.preferred_language)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for secondary in secondary_roles {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role, school_id, is_active, created_at) VALUES (?, ?, ?, 1, ?)",
        )
        .bind(user_id)
        .bind(secondary.role)
        .bind(secondary.school_id)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(user_id)
}

/// Set the user's current school
///
/// The primary role's school is left untouched.
pub async fn set_school(pool: &SqlitePool, user_id: i64, school_id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET school_id = ?, updated_at = ? WHERE id = ?")
        .bind(school_id)
        .bind(time::now_rfc3339())
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Active-role change to record in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChange<'a> {
    pub from_role: Role,
    pub to_role: Role,
    pub context: &'a str,
}

/// Set the active role and append the switch to the history
pub async fn switch_active_role(
    pool: &SqlitePool,
    user_id: i64,
    change: RoleChange<'_>,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    apply_role_change(&mut *tx, user_id, change).await?;
    tx.commit().await?;
    Ok(())
}

/// Write a role change on a connection the caller holds a transaction on
pub(crate) async fn apply_role_change(
    conn: &mut SqliteConnection,
    user_id: i64,
    change: RoleChange<'_>,
) -> Result<()> {
    let now = time::now_rfc3339();

    sqlx::query("UPDATE users SET active_role = ?, updated_at = ? WHERE id = ?")
        .bind(change.to_role)
        .bind(&now)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT INTO role_switches (user_id, from_role, to_role, context, switched_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(change.from_role)
    .bind(change.to_role)
    .bind(change.context)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Active-role history, oldest first
pub async fn role_history(pool: &SqlitePool, user_id: i64) -> Result<Vec<RoleSwitch>> {
    let switches = sqlx::query_as::<_, RoleSwitch>(
        "SELECT * FROM role_switches WHERE user_id = ? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(switches)
}
