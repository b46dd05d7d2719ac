//! Integration tests for educafric-roles API endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - Role detection from the school directory
//! - Multi-role registration
//! - Role options, add-role and activation
//! - Teacher schools and school switching
//! - Active role switching and history
//!
//! Every test runs against its own in-memory database with auth disabled.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use educafric_common::db::init_memory_database;
use educafric_roles::{build_router, AppState, AuthConfig};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method

const DIRECTOR_PHONE: &str = "+237690000010";
const TEACHER_PHONE: &str = "+237677000001";
const PARENT_PHONE: &str = "+237600000001";
const STUDENT_CONTACT_PHONE: &str = "+237699000555";
const UNKNOWN_PHONE: &str = "+237611223344";

/// Test helper: in-memory database seeded with a small school directory
///
/// - school 1 "Lycée Bilingue de Yaoundé": director and administration phones
/// - school 2 "Collège Saint-Michel", school 3 "École Publique de Douala"
/// - teacher contact at schools 1 and 2 sharing one phone
/// - student Junior Kamga (school 1) with parent contact Marie Kamga
/// - student Awa Njoya (school 3) with an emergency contact phone
async fn setup_test_db() -> SqlitePool {
    let pool = init_memory_database().await.expect("Should create database");

    let statements = [
        "INSERT INTO schools (id, name, admin_phone, contact_phone) VALUES (1, 'Lycée Bilingue de Yaoundé', '+237690000010', '+237690000011')",
        "INSERT INTO schools (id, name) VALUES (2, 'Collège Saint-Michel')",
        "INSERT INTO schools (id, name) VALUES (3, 'École Publique de Douala')",
        "INSERT INTO teacher_contacts (id, school_id, name, phone, position) VALUES (1, 1, 'Paul Mbarga', '+237677000001', 'Professeur de Mathématiques')",
        "INSERT INTO teacher_contacts (id, school_id, name, phone, position) VALUES (2, 2, 'Paul Mbarga', '+237677000001', NULL)",
        "INSERT INTO students (id, school_id, name, class_name, emergency_phone) VALUES (1, 1, 'Junior Kamga', '6ème A', '+237655000099')",
        "INSERT INTO students (id, school_id, name, class_name, emergency_phone) VALUES (2, 3, 'Awa Njoya', 'CM2', '+237699000555')",
        "INSERT INTO parent_contacts (id, student_id, parent_name, phone) VALUES (1, 1, 'Marie Kamga', '+237600000001')",
    ];
    for statement in statements {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Should seed directory");
    }

    pool
}

/// Test helper: Create app with test state (auth disabled)
fn setup_app(db: SqlitePool) -> Router {
    build_router(AppState::new(db, AuthConfig::disabled()))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn detect(app: &Router, phone: &str) -> Value {
    let (status, body) = send(
        app,
        json_request("POST", "/detect-roles", json!({ "phoneNumber": phone, "email": "x@educafric.cm" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "detect-roles failed: {}", body);
    body
}

/// Register a user and return its id
async fn register(app: &Router, phone: &str, email: &str, roles: Value) -> i64 {
    let (status, body) = send(app, registration_request(phone, email, roles)).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    body["user"]["id"].as_i64().expect("user id")
}

fn registration_request(phone: &str, email: &str, roles: Value) -> Request<Body> {
    json_request(
        "POST",
        "/register-multi-role",
        json!({
            "userData": {
                "email": email,
                "password": "motdepasse123",
                "firstName": "Paul",
                "lastName": "Mbarga",
                "phone": phone
            },
            "selectedRoles": roles
        }),
    )
}

fn suggestions_for<'a>(body: &'a Value, role: &str) -> Vec<&'a Value> {
    body["suggestedRoles"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["role"] == role)
        .collect()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(setup_test_db().await);

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "educafric-roles");
    assert!(body["version"].is_string());
}

// =============================================================================
// Detection
// =============================================================================

#[tokio::test]
async fn test_detect_unknown_phone_cannot_join() {
    let app = setup_app(setup_test_db().await);

    let body = detect(&app, UNKNOWN_PHONE).await;

    assert_eq!(body["canJoin"], false);
    assert_eq!(body["existingRoles"], json!([]));
    assert_eq!(body["suggestedRoles"], json!([]));
    assert_eq!(body["conflictingRoles"], json!([]));
}

#[tokio::test]
async fn test_detect_parent_contact() {
    let app = setup_app(setup_test_db().await);

    // Formatting differences are normalized away
    let body = detect(&app, "+237 600 000 001").await;

    assert_eq!(body["canJoin"], true);
    assert_eq!(
        body["suggestedRoles"],
        json!([{
            "role": "Parent",
            "reason": "Rejoindre en tant que parent de Junior Kamga (6ème A)",
            "affiliationId": 1,
            "affiliationName": "Lycée Bilingue de Yaoundé"
        }])
    );
}

#[tokio::test]
async fn test_detect_student_contact_suggests_only_student() {
    let app = setup_app(setup_test_db().await);

    let body = detect(&app, STUDENT_CONTACT_PHONE).await;

    let roles: Vec<&str> = body["suggestedRoles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["Student"]);
    assert_eq!(
        body["suggestedRoles"][0]["reason"],
        "Créer votre profil étudiant à École Publique de Douala"
    );
}

#[tokio::test]
async fn test_detect_school_director() {
    let app = setup_app(setup_test_db().await);

    let body = detect(&app, DIRECTOR_PHONE).await;

    let director = suggestions_for(&body, "Director");
    assert_eq!(director.len(), 1);
    assert_eq!(
        director[0]["reason"],
        "Rejoindre l'école Lycée Bilingue de Yaoundé en tant que Directeur"
    );
    assert_eq!(director[0]["affiliationId"], 1);
    assert_eq!(suggestions_for(&body, "Admin").len(), 1);
}

#[tokio::test]
async fn test_detect_teacher_at_two_schools() {
    let app = setup_app(setup_test_db().await);

    let body = detect(&app, TEACHER_PHONE).await;

    let teacher = suggestions_for(&body, "Teacher");
    let school_ids: Vec<i64> = teacher
        .iter()
        .map(|s| s["affiliationId"].as_i64().unwrap())
        .collect();
    assert_eq!(school_ids, vec![1, 2]);
    assert_eq!(
        teacher[0]["reason"],
        "Activer votre profil enseignant à Lycée Bilingue de Yaoundé"
    );
    assert_eq!(suggestions_for(&body, "Freelancer").len(), 2);
}

#[tokio::test]
async fn test_existing_teacher_gets_add_school_suggestion() {
    let app = setup_app(setup_test_db().await);
    register(
        &app,
        TEACHER_PHONE,
        "paul@educafric.cm",
        json!([{ "role": "Teacher", "affiliationId": 1, "affiliationName": "Lycée Bilingue de Yaoundé" }]),
    )
    .await;

    let body = detect(&app, TEACHER_PHONE).await;

    assert_eq!(body["existingRoles"], json!(["Teacher"]));
    let teacher = suggestions_for(&body, "Teacher");
    assert_eq!(teacher.len(), 1, "no duplicate Teacher proposal: {}", body);
    assert_eq!(teacher[0]["affiliationId"], 2);
    assert_eq!(
        teacher[0]["reason"],
        "Ajouter l'école Collège Saint-Michel à votre profil enseignant"
    );
}

#[tokio::test]
async fn test_detect_reports_conflicting_student_role() {
    let app = setup_app(setup_test_db().await);
    register(
        &app,
        STUDENT_CONTACT_PHONE,
        "awa.teacher@educafric.cm",
        json!([{ "role": "Teacher", "affiliationId": 3 }]),
    )
    .await;

    let body = detect(&app, STUDENT_CONTACT_PHONE).await;

    assert_eq!(body["canJoin"], false);
    assert_eq!(body["conflictingRoles"], json!(["Student"]));
    assert_eq!(body["suggestedRoles"], json!([]));
}

#[tokio::test]
async fn test_failing_lookup_does_not_hide_others() {
    let db = setup_test_db().await;
    sqlx::query(
        "INSERT INTO teacher_contacts (school_id, name, phone) VALUES (3, 'Marie Kamga', '+237600000001')",
    )
    .execute(&db)
    .await
    .unwrap();
    sqlx::query("DROP TABLE parent_contacts")
        .execute(&db)
        .await
        .unwrap();
    let app = setup_app(db);

    let body = detect(&app, PARENT_PHONE).await;

    assert!(suggestions_for(&body, "Parent").is_empty());
    assert_eq!(suggestions_for(&body, "Teacher").len(), 1);
}

#[tokio::test]
async fn test_detect_rejects_malformed_input() {
    let app = setup_app(setup_test_db().await);

    let (status, body) = send(
        &app,
        json_request("POST", "/detect-roles", json!({ "phoneNumber": "not a phone" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let request = Request::builder()
        .method("POST")
        .uri("/detect-roles")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_primary_and_secondary_roles() {
    let db = setup_test_db().await;
    let app = setup_app(db.clone());

    let (status, body) = send(
        &app,
        registration_request(
            TEACHER_PHONE,
            "paul@educafric.cm",
            json!([
                { "role": "Teacher", "affiliationId": 1, "affiliationName": "Lycée Bilingue de Yaoundé" },
                { "role": "Freelancer", "affiliationId": 1 },
                { "role": "Teacher", "affiliationId": 2 }
            ]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "Teacher");
    assert_eq!(body["user"]["schoolId"], 1);
    assert_eq!(body["user"]["primarySchoolId"], 1);
    assert_eq!(body["user"]["preferredLanguage"], "fr");
    assert!(body["user"].get("passwordHash").is_none());
    assert_eq!(body["roles"].as_array().unwrap().len(), 3);

    let user_id = body["user"]["id"].as_i64().unwrap();
    let secondary: Vec<(String, Option<i64>)> =
        sqlx::query_as("SELECT role, school_id FROM user_roles WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&db)
            .await
            .unwrap();
    assert_eq!(
        secondary,
        vec![("Freelancer".to_string(), None), ("Teacher".to_string(), Some(2))]
    );
}

#[tokio::test]
async fn test_register_duplicate_phone_conflicts() {
    let app = setup_app(setup_test_db().await);
    register(&app, PARENT_PHONE, "marie@educafric.cm", json!([{ "role": "Parent", "affiliationId": 1 }])).await;

    let (status, body) = send(
        &app,
        registration_request("00237600000001", "other@educafric.cm", json!([{ "role": "Parent", "affiliationId": 1 }])),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_rejects_invalid_role_sets() {
    let app = setup_app(setup_test_db().await);

    let cases = [
        json!([]),
        json!([{ "role": "Wizard", "affiliationId": 1 }]),
        json!([{ "role": "Student", "affiliationId": 3 }, { "role": "Teacher", "affiliationId": 3 }]),
        json!([{ "role": "SiteAdmin" }]),
        json!([{ "role": "Director", "affiliationId": 99 }]),
    ];

    for roles in cases {
        let (status, body) = send(
            &app,
            registration_request(UNKNOWN_PHONE, "new@educafric.cm", roles.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "roles {} gave {}", roles, body);
    }

    // Nothing was written
    let (status, _) = send(&app, get_request("/user-roles/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Role options / add-role / activation
// =============================================================================

#[tokio::test]
async fn test_user_roles_lists_available_schools() {
    let app = setup_app(setup_test_db().await);
    let user_id = register(
        &app,
        TEACHER_PHONE,
        "paul@educafric.cm",
        json!([{ "role": "Teacher", "affiliationId": 1 }, { "role": "Freelancer", "affiliationId": 1 }]),
    )
    .await;

    let (status, body) = send(&app, get_request(&format!("/user-roles/{}", user_id))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["primaryRole"], "Teacher");
    assert_eq!(body["activeRole"], "Teacher");
    assert_eq!(body["secondaryRoles"][0]["role"], "Freelancer");
    assert_eq!(body["secondaryRoles"][0]["isActive"], true);
    assert_eq!(
        body["availableSchools"],
        json!([{ "id": 2, "name": "Collège Saint-Michel", "canJoinAs": ["Teacher"] }])
    );
}

#[tokio::test]
async fn test_user_roles_unknown_or_invalid_user() {
    let app = setup_app(setup_test_db().await);

    let (status, _) = send(&app, get_request("/user-roles/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unparsable ids still get the JSON error body
    let (status, body) = send(&app, get_request("/user-roles/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].is_string());

    let (status, body) = send(
        &app,
        json_request("POST", "/user-roles/1/first/activation", json!({ "isActive": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_add_role() {
    let app = setup_app(setup_test_db().await);
    let user_id = register(&app, TEACHER_PHONE, "paul@educafric.cm", json!([{ "role": "Teacher", "affiliationId": 1 }])).await;
    let uri = format!("/add-role/{}", user_id);

    let (status, body) = send(
        &app,
        json_request("POST", &uri, json!({ "role": "Parent", "affiliationId": 1, "affiliationName": "Lycée Bilingue de Yaoundé" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"]["role"], "Parent");
    assert_eq!(body["role"]["schoolId"], Value::Null);
    assert_eq!(body["affiliationName"], "Lycée Bilingue de Yaoundé");

    // Teacher at a second school is a new membership
    let (status, body) = send(&app, json_request("POST", &uri, json!({ "role": "Teacher", "affiliationId": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"]["schoolId"], 2);

    // Same role again, conflicting role
    let (status, _) = send(&app, json_request("POST", &uri, json!({ "role": "Teacher", "affiliationId": 2 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, json_request("POST", &uri, json!({ "role": "Student", "affiliationId": 3 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Malformed requests
    let (status, _) = send(&app, json_request("POST", &uri, json!({ "role": "Parent" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, json_request("POST", &uri, json!({ "affiliationId": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, json_request("POST", "/add-role/999", json!({ "role": "Parent", "affiliationId": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_activation_toggle() {
    let app = setup_app(setup_test_db().await);
    let user_id = register(
        &app,
        TEACHER_PHONE,
        "paul@educafric.cm",
        json!([{ "role": "Teacher", "affiliationId": 1 }, { "role": "Parent", "affiliationId": 1 }]),
    )
    .await;

    let (_, options) = send(&app, get_request(&format!("/user-roles/{}", user_id))).await;
    let role_id = options["secondaryRoles"][0]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        json_request("POST", &format!("/user-roles/{}/{}/activation", user_id, role_id), json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isActive"], false);

    // An inactive role cannot become the active role
    let (status, _) = send(
        &app,
        json_request("POST", &format!("/switch-role/{}", user_id), json!({ "newRole": "Parent" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        json_request("POST", &format!("/user-roles/{}/999/activation", user_id), json!({ "isActive": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deactivating a role that is not the active one leaves the active role alone
    let (_, history) = send(&app, get_request(&format!("/role-history/{}", user_id))).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_deactivating_active_role_returns_to_primary() {
    let app = setup_app(setup_test_db().await);
    let user_id = register(
        &app,
        TEACHER_PHONE,
        "paul@educafric.cm",
        json!([{ "role": "Teacher", "affiliationId": 1 }, { "role": "Freelancer", "affiliationId": 1 }]),
    )
    .await;

    let (status, _) = send(
        &app,
        json_request("POST", &format!("/switch-role/{}", user_id), json!({ "newRole": "Freelancer" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, options) = send(&app, get_request(&format!("/user-roles/{}", user_id))).await;
    let role_id = options["secondaryRoles"][0]["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        json_request("POST", &format!("/user-roles/{}/{}/activation", user_id, role_id), json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, options) = send(&app, get_request(&format!("/user-roles/{}", user_id))).await;
    assert_eq!(options["activeRole"], "Teacher");
    assert_eq!(options["secondaryRoles"][0]["isActive"], false);

    let (_, history) = send(&app, get_request(&format!("/role-history/{}", user_id))).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["fromRole"], "Freelancer");
    assert_eq!(history[1]["toRole"], "Teacher");
    assert_eq!(history[1]["context"], "role_deactivated");
}

// =============================================================================
// Teacher schools
// =============================================================================

#[tokio::test]
async fn test_teacher_schools_and_switching() {
    let app = setup_app(setup_test_db().await);
    let user_id = register(&app, TEACHER_PHONE, "paul@educafric.cm", json!([{ "role": "Teacher", "affiliationId": 1 }])).await;

    let (status, body) = send(&app, get_request(&format!("/teacher-schools/{}", user_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentSchool"], json!({ "id": 1, "name": "Lycée Bilingue de Yaoundé" }));
    assert_eq!(body["canManageMultiple"], true);
    assert_eq!(
        body["affiliatedSchools"],
        json!([
            { "id": 1, "name": "Lycée Bilingue de Yaoundé", "position": "Professeur de Mathématiques", "isCurrent": true },
            { "id": 2, "name": "Collège Saint-Michel", "position": null, "isCurrent": false }
        ])
    );

    let uri = format!("/switch-school/{}", user_id);
    let (status, body) = send(&app, json_request("POST", &uri, json!({ "schoolId": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentSchool"]["id"], 2);
    assert_eq!(body["user"]["schoolId"], 2);

    let (_, body) = send(&app, get_request(&format!("/teacher-schools/{}", user_id))).await;
    assert_eq!(body["currentSchool"]["id"], 2);
}

#[tokio::test]
async fn test_switch_school_rejections() {
    let app = setup_app(setup_test_db().await);
    let user_id = register(&app, TEACHER_PHONE, "paul@educafric.cm", json!([{ "role": "Teacher", "affiliationId": 1 }])).await;
    let uri = format!("/switch-school/{}", user_id);

    let (status, _) = send(&app, json_request("POST", &uri, json!({ "schoolId": 3 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, json_request("POST", &uri, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, json_request("POST", "/switch-school/999", json!({ "schoolId": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_teacher_membership_counts_as_affiliation() {
    let app = setup_app(setup_test_db().await);
    // Parent phone has no teacher contact; the Teacher membership at school 3 is enough
    let user_id = register(
        &app,
        PARENT_PHONE,
        "marie@educafric.cm",
        json!([{ "role": "Parent", "affiliationId": 1 }, { "role": "Teacher", "affiliationId": 3 }]),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request("POST", &format!("/switch-school/{}", user_id), json!({ "schoolId": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["currentSchool"]["name"], "École Publique de Douala");
}

#[tokio::test]
async fn test_switching_school_keeps_primary_membership() {
    let app = setup_app(setup_test_db().await);
    let user_id = register(
        &app,
        TEACHER_PHONE,
        "paul@educafric.cm",
        json!([{ "role": "Teacher", "affiliationId": 1 }, { "role": "Teacher", "affiliationId": 2 }]),
    )
    .await;

    assert!(suggestions_for(&detect(&app, TEACHER_PHONE).await, "Teacher").is_empty());

    let (status, _) = send(
        &app,
        json_request("POST", &format!("/switch-school/{}", user_id), json!({ "schoolId": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Still teaching at both schools
    let body = detect(&app, TEACHER_PHONE).await;
    assert!(suggestions_for(&body, "Teacher").is_empty(), "{}", body);

    let (_, options) = send(&app, get_request(&format!("/user-roles/{}", user_id))).await;
    for school in options["availableSchools"].as_array().unwrap() {
        assert!(
            !school["canJoinAs"].as_array().unwrap().contains(&json!("Teacher")),
            "{}",
            school
        );
    }
}

#[tokio::test]
async fn test_switch_back_to_primary_school() {
    let app = setup_app(setup_test_db().await);
    // No teacher contact backs either school; only the memberships do
    let user_id = register(
        &app,
        PARENT_PHONE,
        "marie@educafric.cm",
        json!([{ "role": "Teacher", "affiliationId": 3 }, { "role": "Teacher", "affiliationId": 2 }]),
    )
    .await;
    let uri = format!("/switch-school/{}", user_id);

    let (status, _) = send(&app, json_request("POST", &uri, json!({ "schoolId": 2 }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get_request(&format!("/teacher-schools/{}", user_id))).await;
    let ids: Vec<i64> = body["affiliatedSchools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 3]);

    let (status, body) = send(&app, json_request("POST", &uri, json!({ "schoolId": 3 }))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["currentSchool"]["id"], 3);
}

#[tokio::test]
async fn test_add_role_duplicate_check_uses_primary_school() {
    let app = setup_app(setup_test_db().await);
    let user_id = register(
        &app,
        UNKNOWN_PHONE,
        "dir@educafric.cm",
        json!([{ "role": "Director", "affiliationId": 1 }, { "role": "Teacher", "affiliationId": 3 }]),
    )
    .await;

    let (status, _) = send(
        &app,
        json_request("POST", &format!("/switch-school/{}", user_id), json!({ "schoolId": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/add-role/{}", user_id);
    let (status, _) = send(&app, json_request("POST", &uri, json!({ "role": "Director", "affiliationId": 1 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, body) = send(&app, json_request("POST", &uri, json!({ "role": "Director", "affiliationId": 3 }))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["role"]["schoolId"], 3);
}

// =============================================================================
// Active role
// =============================================================================

#[tokio::test]
async fn test_switch_role_records_history() {
    let app = setup_app(setup_test_db().await);
    let user_id = register(
        &app,
        TEACHER_PHONE,
        "paul@educafric.cm",
        json!([{ "role": "Teacher", "affiliationId": 1 }, { "role": "Parent", "affiliationId": 1 }]),
    )
    .await;
    let uri = format!("/switch-role/{}", user_id);

    let (status, body) = send(&app, json_request("POST", &uri, json!({ "newRole": "Parent" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previousRole"], "Teacher");
    assert_eq!(body["activeRole"], "Parent");

    let (status, _) = send(&app, json_request("POST", &uri, json!({ "newRole": "Director" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, json_request("POST", &uri, json!({ "newRole": "Overlord" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, options) = send(&app, get_request(&format!("/user-roles/{}", user_id))).await;
    assert_eq!(options["activeRole"], "Parent");
    assert_eq!(options["primaryRole"], "Teacher");

    let (status, history) = send(&app, get_request(&format!("/role-history/{}", user_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["fromRole"], "Teacher");
    assert_eq!(history[0]["toRole"], "Parent");
    assert_eq!(history[0]["context"], "manual_switch");
}
