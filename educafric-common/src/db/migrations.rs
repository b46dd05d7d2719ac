//! Database schema migrations
//!
//! Versioned migrations let existing databases pick up schema changes
//! without manual deletion or data loss.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the field already ran them
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Idempotent** - every migration must be safe to run twice
//! 4. **Use ALTER TABLE / CREATE INDEX IF NOT EXISTS** - preserve data

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    if current_version < 3 {
        migrate_v3(pool).await?;
        set_schema_version(pool, 3).await?;
        info!("✓ Migration v3 completed");
    }

    Ok(())
}

/// Migration v1: phone lookup indexes
///
/// Affiliation detection queries four directory tables by phone on every
/// registration attempt.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: phone lookup indexes");

    let statements = [
        "CREATE INDEX IF NOT EXISTS idx_schools_admin_phone ON schools(admin_phone)",
        "CREATE INDEX IF NOT EXISTS idx_schools_contact_phone ON schools(contact_phone)",
        "CREATE INDEX IF NOT EXISTS idx_teacher_contacts_phone ON teacher_contacts(phone)",
        "CREATE INDEX IF NOT EXISTS idx_students_emergency_phone ON students(emergency_phone)",
        "CREATE INDEX IF NOT EXISTS idx_parent_contacts_phone ON parent_contacts(phone)",
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

/// Migration v2: membership and session indexes
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: membership and session indexes");

    let statements = [
        "CREATE INDEX IF NOT EXISTS idx_user_roles_user ON user_roles(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_role_switches_user ON role_switches(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

/// Migration v3: separate the primary role's school from the current school
///
/// Databases created before v3 stored both in `users.school_id`. Existing rows
/// are backfilled from it, which is exact for users who never switched school.
async fn migrate_v3(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v3: users.primary_school_id");

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('users') WHERE name = 'primary_school_id'",
    )
    .fetch_one(pool)
    .await?;

    if has_column == 0 {
        sqlx::query(
            "ALTER TABLE users ADD COLUMN primary_school_id INTEGER REFERENCES schools(id) ON DELETE SET NULL",
        )
        .execute(pool)
        .await?;
        info!("Migration v3: Added primary_school_id to users table");

        sqlx::query("UPDATE users SET primary_school_id = school_id")
            .execute(pool)
            .await?;
    }

    Ok(())
}
