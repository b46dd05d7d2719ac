//! Affiliation detection
//!
//! A phone number is looked up in four directory sources. Each match becomes
//! an [`Affiliation`], which the suggestion filter in `educafric_common::roles`
//! turns into role proposals.

use educafric_common::db::User;
use educafric_common::roles::{
    analyze_affiliation, Affiliation, AffiliationDetails, AffiliationKind, HeldRole,
    MultiRoleSuggestion, Role,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::db::{directory, user_roles, users};
use crate::error::ApiResult;
use crate::services::require_phone;

const DIRECTOR_POSITION: &str = "Directeur";
const ADMIN_POSITION: &str = "Administrateur";
const TEACHER_POSITION: &str = "Enseignant";

/// School where the suggestion filter still proposes at least one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSchool {
    pub id: i64,
    pub name: String,
    pub can_join_as: Vec<Role>,
}

/// Collect every affiliation of a normalized phone number
///
/// A failing source is logged and skipped; the others still contribute.
pub async fn find_affiliations_by_phone(pool: &SqlitePool, phone: &str) -> Vec<Affiliation> {
    let mut affiliations = Vec::new();

    match directory::find_schools_by_contact(pool, phone).await {
        Ok(schools) => {
            for school in schools {
                let is_director = school.admin_phone.as_deref() == Some(phone);
                let (role, position) = if is_director {
                    (Role::Director, DIRECTOR_POSITION)
                } else {
                    (Role::Admin, ADMIN_POSITION)
                };

                affiliations.push(Affiliation {
                    kind: AffiliationKind::School,
                    id: school.id,
                    school_id: Some(school.id),
                    name: school.name.clone(),
                    role,
                    details: AffiliationDetails {
                        school_name: Some(school.name),
                        position: Some(position.to_string()),
                        ..Default::default()
                    },
                });
            }
        }
        Err(e) => warn!("School contact lookup failed for {}: {}", phone, e),
    }

    match directory::find_teacher_contacts_by_phone(pool, phone).await {
        Ok(contacts) => {
            for contact in contacts {
                affiliations.push(Affiliation {
                    kind: AffiliationKind::Teacher,
                    id: contact.id,
                    school_id: Some(contact.school_id),
                    name: contact.name.clone(),
                    role: Role::Teacher,
                    details: AffiliationDetails {
                        school_name: Some(contact.school_name),
                        teacher_name: Some(contact.name),
                        position: Some(
                            contact
                                .position
                                .unwrap_or_else(|| TEACHER_POSITION.to_string()),
                        ),
                        ..Default::default()
                    },
                });
            }
        }
        Err(e) => warn!("Teacher contact lookup failed for {}: {}", phone, e),
    }

    match directory::find_parent_contacts_by_phone(pool, phone).await {
        Ok(contacts) => {
            for contact in contacts {
                affiliations.push(Affiliation {
                    kind: AffiliationKind::Parent,
                    id: contact.id,
                    school_id: Some(contact.school_id),
                    name: contact.parent_name,
                    role: Role::Parent,
                    details: AffiliationDetails {
                        school_name: Some(contact.school_name),
                        student_name: Some(contact.student_name),
                        class_name: contact.class_name,
                        ..Default::default()
                    },
                });
            }
        }
        Err(e) => warn!("Parent contact lookup failed for {}: {}", phone, e),
    }

    match directory::find_students_by_emergency_phone(pool, phone).await {
        Ok(students) => {
            for student in students {
                affiliations.push(Affiliation {
                    kind: AffiliationKind::Student,
                    id: student.id,
                    school_id: Some(student.school_id),
                    name: student.name.clone(),
                    role: Role::Student,
                    details: AffiliationDetails {
                        school_name: Some(student.school_name),
                        student_name: Some(student.name),
                        class_name: student.class_name,
                        ..Default::default()
                    },
                });
            }
        }
        Err(e) => warn!("Student contact lookup failed for {}: {}", phone, e),
    }

    debug!("Found {} affiliations for {}", affiliations.len(), phone);
    affiliations
}

/// Roles a phone number could join as, given the roles its owner already holds
///
/// `existingRoles` is empty when no account owns the phone.
pub async fn detect_potential_roles(
    pool: &SqlitePool,
    phone_number: &str,
) -> ApiResult<MultiRoleSuggestion> {
    let phone = require_phone(phone_number)?;

    let held = match users::get_user_by_phone(pool, &phone).await? {
        Some(user) => user_roles::load_held_roles(pool, &user, true).await?,
        None => Vec::new(),
    };

    let affiliations = find_affiliations_by_phone(pool, &phone).await;
    Ok(MultiRoleSuggestion::from_affiliations(&affiliations, &held))
}

/// Schools reachable from the user's phone where something can still be joined
pub async fn available_schools(
    pool: &SqlitePool,
    user: &User,
    held: &[HeldRole],
) -> Vec<AvailableSchool> {
    let affiliations = find_affiliations_by_phone(pool, &user.phone).await;
    let mut schools: Vec<AvailableSchool> = Vec::new();

    for affiliation in &affiliations {
        let Some(school_id) = affiliation.school_id else {
            continue;
        };

        let analysis = analyze_affiliation(affiliation, held);
        if analysis.suggested.is_empty() {
            continue;
        }

        let index = match schools.iter().position(|s| s.id == school_id) {
            Some(index) => index,
            None => {
                schools.push(AvailableSchool {
                    id: school_id,
                    name: affiliation.display_name(),
                    can_join_as: Vec::new(),
                });
                schools.len() - 1
            }
        };

        for suggestion in analysis.suggested {
            if !schools[index].can_join_as.contains(&suggestion.role) {
                schools[index].can_join_as.push(suggestion.role);
            }
        }
    }

    schools
}
