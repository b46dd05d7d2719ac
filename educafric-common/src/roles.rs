//! Role model and multi-role suggestion rules
//!
//! Pure, synchronous logic shared by every service that reasons about a
//! user's roles:
//! - the closed set of platform roles and which of them are school-bound
//! - the candidate roles each affiliation type can lead to
//! - the conflict matrix (checked symmetrically)
//! - the suggestion filter turning affiliations into role proposals

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform role
///
/// Serialized (JSON and database TEXT) exactly as the platform spells it:
/// `"Teacher"`, `"SiteAdmin"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Role {
    SiteAdmin,
    Admin,
    Director,
    Teacher,
    Parent,
    Student,
    Freelancer,
    Commercial,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::SiteAdmin,
        Role::Admin,
        Role::Director,
        Role::Teacher,
        Role::Parent,
        Role::Student,
        Role::Freelancer,
        Role::Commercial,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SiteAdmin => "SiteAdmin",
            Role::Admin => "Admin",
            Role::Director => "Director",
            Role::Teacher => "Teacher",
            Role::Parent => "Parent",
            Role::Student => "Student",
            Role::Freelancer => "Freelancer",
            Role::Commercial => "Commercial",
        }
    }

    /// Roles whose membership records carry a school id
    pub fn is_school_bound(self) -> bool {
        matches!(self, Role::Teacher | Role::Director | Role::Admin)
    }

    /// Roles this role declares as mutually exclusive with it
    ///
    /// Sparse on purpose: only the pairs the platform actually forbids.
    /// Always query through [`Role::conflicts_with`], which checks both sides.
    fn declared_conflicts(self) -> &'static [Role] {
        match self {
            Role::Student => &[Role::Teacher, Role::Director, Role::Admin],
            Role::SiteAdmin => &[Role::Student],
            _ => &[],
        }
    }

    /// Symmetric conflict check
    pub fn conflicts_with(self, other: Role) -> bool {
        self.declared_conflicts().contains(&other) || other.declared_conflicts().contains(&self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s.trim())
            .ok_or_else(|| Error::InvalidInput(format!("Unknown role: {}", s)))
    }
}

/// Kind of record a phone number was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffiliationKind {
    /// School admin/director contact
    School,
    /// Teacher contact at a school
    Teacher,
    /// Parent contact of a student
    Parent,
    /// Student emergency contact
    Student,
}

impl AffiliationKind {
    /// Roles an affiliation of this kind can lead to, in proposal order
    pub fn candidate_roles(self) -> &'static [Role] {
        match self {
            AffiliationKind::School => &[Role::Director, Role::Admin],
            AffiliationKind::Teacher => &[Role::Teacher, Role::Freelancer],
            AffiliationKind::Parent => &[Role::Parent],
            AffiliationKind::Student => &[Role::Student],
        }
    }
}

/// Descriptive details of an affiliation, used to build reason strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// A discovered link between a phone number and an existing record
///
/// Computed per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliation {
    #[serde(rename = "type")]
    pub kind: AffiliationKind,
    /// Id of the matched record (school, teacher contact, parent contact, student)
    pub id: i64,
    /// School the record belongs to, when known
    pub school_id: Option<i64>,
    pub name: String,
    /// Role inferred from the record itself
    pub role: Role,
    pub details: AffiliationDetails,
}

impl Affiliation {
    /// Name shown next to a suggestion: the school when known, else the record
    pub fn display_name(&self) -> String {
        self.details
            .school_name
            .clone()
            .unwrap_or_else(|| self.name.clone())
    }

    /// Id a suggestion for `role` points at
    ///
    /// School-bound roles point at the school so that confirming the
    /// suggestion stores the right school id.
    pub fn target_id(&self, role: Role) -> i64 {
        if role.is_school_bound() {
            self.school_id.unwrap_or(self.id)
        } else {
            self.id
        }
    }

    fn join_reason(&self, role: Role) -> String {
        match self.kind {
            AffiliationKind::School => {
                let title = if role == Role::Director {
                    "Directeur"
                } else {
                    "Administrateur"
                };
                format!(
                    "Rejoindre l'école {} en tant que {}",
                    self.display_name(),
                    title
                )
            }
            AffiliationKind::Teacher => {
                format!("Activer votre profil enseignant à {}", self.display_name())
            }
            AffiliationKind::Parent => {
                let student = self
                    .details
                    .student_name
                    .clone()
                    .unwrap_or_else(|| self.name.clone());
                match &self.details.class_name {
                    Some(class_name) => format!(
                        "Rejoindre en tant que parent de {} ({})",
                        student, class_name
                    ),
                    None => format!("Rejoindre en tant que parent de {}", student),
                }
            }
            AffiliationKind::Student => {
                format!("Créer votre profil étudiant à {}", self.display_name())
            }
        }
    }

    fn add_school_reason(&self) -> String {
        format!(
            "Ajouter l'école {} à votre profil enseignant",
            self.display_name()
        )
    }
}

/// A role a user already holds, with the school it is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldRole {
    pub role: Role,
    pub school_id: Option<i64>,
}

impl HeldRole {
    pub fn new(role: Role, school_id: Option<i64>) -> Self {
        Self { role, school_id }
    }
}

/// A proposed role returned to the client for confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSuggestion {
    pub role: Role,
    pub reason: String,
    pub affiliation_id: i64,
    pub affiliation_name: String,
}

/// Outcome of filtering one affiliation's candidate roles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAnalysis {
    pub suggested: Vec<RoleSuggestion>,
    pub conflicting: Vec<Role>,
}

/// First held role that `role` conflicts with
pub fn conflicting_held_role(role: Role, held: &[HeldRole]) -> Option<Role> {
    held.iter()
        .map(|h| h.role)
        .find(|existing| existing.conflicts_with(role))
}

/// First mutually exclusive pair within a role set
pub fn find_conflicting_pair(roles: &[Role]) -> Option<(Role, Role)> {
    roles.iter().enumerate().find_map(|(i, &a)| {
        roles[i + 1..]
            .iter()
            .find(|&&b| a.conflicts_with(b))
            .map(|&b| (a, b))
    })
}

/// Filter one affiliation's candidate roles against the roles a user holds
///
/// - held roles are skipped, except a teacher affiliation for a user who is
///   already a Teacher: that proposes adding the affiliation's school, unless
///   the user already teaches there
/// - roles conflicting with a held role go to `conflicting`
/// - everything else is suggested with a reason string
pub fn analyze_affiliation(affiliation: &Affiliation, held: &[HeldRole]) -> RoleAnalysis {
    let mut analysis = RoleAnalysis::default();

    for &role in affiliation.kind.candidate_roles() {
        if held.iter().any(|h| h.role == role) {
            if role == Role::Teacher && affiliation.kind == AffiliationKind::Teacher {
                let teaches_here = affiliation.school_id.is_some()
                    && held
                        .iter()
                        .any(|h| h.role == Role::Teacher && h.school_id == affiliation.school_id);

                if !teaches_here {
                    analysis.suggested.push(RoleSuggestion {
                        role,
                        reason: affiliation.add_school_reason(),
                        affiliation_id: affiliation.target_id(role),
                        affiliation_name: affiliation.display_name(),
                    });
                }
            }
            continue;
        }

        if conflicting_held_role(role, held).is_some() {
            analysis.conflicting.push(role);
            continue;
        }

        analysis.suggested.push(RoleSuggestion {
            role,
            reason: affiliation.join_reason(role),
            affiliation_id: affiliation.target_id(role),
            affiliation_name: affiliation.display_name(),
        });
    }

    analysis
}

/// Aggregated detection result returned by `detect-roles`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiRoleSuggestion {
    pub can_join: bool,
    pub existing_roles: Vec<Role>,
    pub suggested_roles: Vec<RoleSuggestion>,
    pub conflicting_roles: Vec<Role>,
}

impl MultiRoleSuggestion {
    /// Run the filter over every affiliation and merge the results
    ///
    /// Suggestions are deduplicated on `(role, affiliation_id)`, conflicts on role.
    pub fn from_affiliations(affiliations: &[Affiliation], held: &[HeldRole]) -> Self {
        let mut suggested_roles: Vec<RoleSuggestion> = Vec::new();
        let mut conflicting_roles: Vec<Role> = Vec::new();

        for affiliation in affiliations {
            let analysis = analyze_affiliation(affiliation, held);

            for suggestion in analysis.suggested {
                let duplicate = suggested_roles.iter().any(|s| {
                    s.role == suggestion.role && s.affiliation_id == suggestion.affiliation_id
                });
                if !duplicate {
                    suggested_roles.push(suggestion);
                }
            }

            for role in analysis.conflicting {
                if !conflicting_roles.contains(&role) {
                    conflicting_roles.push(role);
                }
            }
        }

        let mut existing_roles: Vec<Role> = Vec::new();
        for h in held {
            if !existing_roles.contains(&h.role) {
                existing_roles.push(h.role);
            }
        }

        Self {
            can_join: !suggested_roles.is_empty(),
            existing_roles,
            suggested_roles,
            conflicting_roles,
        }
    }
}
