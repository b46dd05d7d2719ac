//! Directory lookups: schools, teacher contacts, students, parent contacts
//!
//! Phone arguments must already be normalized.

use educafric_common::db::School;
use educafric_common::Result;
use sqlx::SqlitePool;

/// Teacher contact joined with its school
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeacherContact {
    pub id: i64,
    pub school_id: i64,
    pub school_name: String,
    pub name: String,
    pub position: Option<String>,
}

/// Parent contact joined with the student and school
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParentContact {
    pub id: i64,
    pub parent_name: String,
    pub student_id: i64,
    pub student_name: String,
    pub class_name: Option<String>,
    pub school_id: i64,
    pub school_name: String,
}

/// Student whose emergency contact matched, joined with the school
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentContact {
    pub id: i64,
    pub name: String,
    pub class_name: Option<String>,
    pub school_id: i64,
    pub school_name: String,
}

pub async fn get_school(pool: &SqlitePool, school_id: i64) -> Result<Option<School>> {
    let school = sqlx::query_as::<_, School>(
        "SELECT id, name, kind, admin_phone, contact_phone FROM schools WHERE id = ?",
    )
    .bind(school_id)
    .fetch_optional(pool)
    .await?;

    Ok(school)
}

/// Schools whose director or administration contact is `phone`
pub async fn find_schools_by_contact(pool: &SqlitePool, phone: &str) -> Result<Vec<School>> {
    let schools = sqlx::query_as::<_, School>(
        r#"
        SELECT id, name, kind, admin_phone, contact_phone
        FROM schools
        WHERE admin_phone = ?1 OR contact_phone = ?1
        ORDER BY id
        "#,
    )
    .bind(phone)
    .fetch_all(pool)
    .await?;

    Ok(schools)
}

pub async fn find_teacher_contacts_by_phone(
    pool: &SqlitePool,
    phone: &str,
) -> Result<Vec<TeacherContact>> {
    let contacts = sqlx::query_as::<_, TeacherContact>(
        r#"
        SELECT t.id, t.school_id, s.name AS school_name, t.name, t.position
        FROM teacher_contacts t
        JOIN schools s ON s.id = t.school_id
        WHERE t.phone = ?
        ORDER BY t.id
        "#,
    )
    .bind(phone)
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}

pub async fn find_parent_contacts_by_phone(
    pool: &SqlitePool,
    phone: &str,
) -> Result<Vec<ParentContact>> {
    let contacts = sqlx::query_as::<_, ParentContact>(
        r#"
        SELECT p.id, p.parent_name, st.id AS student_id, st.name AS student_name,
               st.class_name, s.id AS school_id, s.name AS school_name
        FROM parent_contacts p
        JOIN students st ON st.id = p.student_id
        JOIN schools s ON s.id = st.school_id
        WHERE p.phone = ?
        ORDER BY p.id
        "#,
    )
    .bind(phone)
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}

pub async fn find_students_by_emergency_phone(
    pool: &SqlitePool,
    phone: &str,
) -> Result<Vec<StudentContact>> {
    let students = sqlx::query_as::<_, StudentContact>(
        r#"
        SELECT st.id, st.name, st.class_name, s.id AS school_id, s.name AS school_name
        FROM students st
        JOIN schools s ON s.id = st.school_id
        WHERE st.emergency_phone = ?
        ORDER BY st.id
        "#,
    )
    .bind(phone)
    .fetch_all(pool)
    .await?;

    Ok(students)
}
