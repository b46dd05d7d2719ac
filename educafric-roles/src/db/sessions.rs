//! Login sessions
//!
//! Only the SHA-256 of a token is stored; the raw token exists in the
//! client's cookie alone.

use educafric_common::api::auth::{generate_session_token, hash_session_token};
use educafric_common::db::User;
use educafric_common::{time, Result};
use sqlx::SqlitePool;

/// Create a session and return the raw token for the cookie
pub async fn create_session(pool: &SqlitePool, user_id: i64, ttl_hours: i64) -> Result<String> {
    let token = generate_session_token();

    sqlx::query(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(hash_session_token(&token))
    .bind(user_id)
    .bind(time::now_rfc3339())
    .bind(time::format_timestamp(time::expiry_after_hours(ttl_hours)))
    .execute(pool)
    .await?;

    Ok(token)
}

/// User owning an unexpired session
pub async fn find_session_user(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.*
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = ? AND s.expires_at > ?
        "#,
    )
    .bind(hash_session_token(token))
    .bind(time::now_rfc3339())
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_session_token(token))
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove expired sessions, returning how many were deleted
pub async fn purge_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(time::now_rfc3339())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
