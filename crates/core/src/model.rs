//! Row types for the five tenant tables.
//!
//! These are plain data: who may read or write them is decided by `hrms-auth`,
//! and persistence is owned by `hrms-infra`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::{CompanyAdminId, CompanyId, DepartmentId, HierarchyId, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Enumerations
// ─────────────────────────────────────────────────────────────────────────────

/// Role recorded on a user row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Superadmin,
    CompanyAdmin,
    Manager,
    Employee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Superadmin => "superadmin",
            UserRole::CompanyAdmin => "company_admin",
            UserRole::Manager => "manager",
            UserRole::Employee => "employee",
        }
    }
}

impl core::fmt::Display for UserRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(UserRole::Superadmin),
            "company_admin" => Ok(UserRole::CompanyAdmin),
            "manager" => Ok(UserRole::Manager),
            "employee" => Ok(UserRole::Employee),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

/// UI language preference stored on the profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Hu,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hu => "hu",
        }
    }
}

impl core::str::FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "hu" => Ok(Language::Hu),
            other => Err(DomainError::validation(format!("unsupported language '{other}'"))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rows
// ─────────────────────────────────────────────────────────────────────────────

/// A tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub access_time: Option<String>,
}

impl Company {
    pub fn new(
        id: CompanyId,
        name: &str,
        access_time: Option<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: non_empty("company name", name)?,
            created_at,
            access_time: access_time.filter(|t| !t.trim().is_empty()),
        })
    }
}

/// A user profile. `id` equals the identity provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub preferred_language: Option<Language>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
}

impl User {
    /// A bare profile as created by signup: no company, no role.
    pub fn new(id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            company_id: None,
            first_name: None,
            last_name: None,
            role: None,
            preferred_language: None,
            created_at,
            phone_number: None,
            date_of_birth: None,
            hire_date: None,
            job_title: None,
            department_id: None,
        }
    }

    pub fn with_company(mut self, company_id: CompanyId) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Grants one user admin rights over one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyAdmin {
    pub id: CompanyAdminId,
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub created_at: DateTime<Utc>,
}

impl CompanyAdmin {
    pub fn new(user_id: UserId, company_id: CompanyId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: CompanyAdminId::new(),
            user_id,
            company_id,
            created_at,
        }
    }
}

/// A department; belongs to exactly one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub company_id: CompanyId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Department {
    pub fn new(company_id: CompanyId, name: &str, created_at: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: DepartmentId::new(),
            company_id,
            name: non_empty("department name", name)?,
            created_at,
        })
    }

    pub fn rename(&mut self, name: &str) -> DomainResult<()> {
        self.name = non_empty("department name", name)?;
        Ok(())
    }
}

/// Directed edge employee → manager within a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeHierarchy {
    pub id: HierarchyId,
    pub employee_id: UserId,
    pub manager_id: UserId,
    pub company_id: CompanyId,
    pub created_at: DateTime<Utc>,
}

impl EmployeeHierarchy {
    pub fn new(
        employee_id: UserId,
        manager_id: UserId,
        company_id: CompanyId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if employee_id == manager_id {
            return Err(DomainError::validation("an employee cannot manage themselves"));
        }
        Ok(Self {
            id: HierarchyId::new(),
            employee_id,
            manager_id,
            company_id,
            created_at,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile patch
// ─────────────────────────────────────────────────────────────────────────────

/// Self-service profile edit.
///
/// Only personal fields are present: role, company and department are not
/// editable through this path, so a user cannot grant themselves access.
/// `Some("")` clears a text field; `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub preferred_language: Option<Language>,
}

impl ProfileUpdate {
    pub fn apply(&self, user: &mut User) {
        fn set(field: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                let v = v.trim();
                *field = if v.is_empty() { None } else { Some(v.to_string()) };
            }
        }

        set(&mut user.first_name, &self.first_name);
        set(&mut user.last_name, &self.last_name);
        set(&mut user.phone_number, &self.phone_number);
        set(&mut user.job_title, &self.job_title);
        if let Some(dob) = self.date_of_birth {
            user.date_of_birth = Some(dob);
        }
        if let Some(lang) = self.preferred_language {
            user.preferred_language = Some(lang);
        }
    }
}

fn non_empty(what: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity impls
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! impl_entity {
    ($row:ty, $id:ty) => {
        impl Entity for $row {
            type Id = $id;

            fn id(&self) -> Self::Id {
                self.id
            }
        }
    };
}

impl_entity!(Company, CompanyId);
impl_entity!(User, UserId);
impl_entity!(CompanyAdmin, CompanyAdminId);
impl_entity!(Department, DepartmentId);
impl_entity!(EmployeeHierarchy, HierarchyId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_name_is_trimmed_and_required() {
        let now = Utc::now();
        let c = Company::new(CompanyId::new(), "  Acme  ", Some(" ".into()), now).unwrap();
        assert_eq!(c.name, "Acme");
        assert_eq!(c.access_time, None);

        let err = Company::new(CompanyId::new(), "   ", None, now).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn hierarchy_rejects_self_management() {
        let u = UserId::new();
        let err = EmployeeHierarchy::new(u, u, CompanyId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn profile_update_touches_only_personal_fields() {
        let company = CompanyId::new();
        let mut user = User::new(UserId::new(), Utc::now())
            .with_company(company)
            .with_role(UserRole::Employee);
        user.job_title = Some("Clerk".into());

        let patch = ProfileUpdate {
            first_name: Some(" Anna ".into()),
            job_title: Some(String::new()),
            preferred_language: Some(Language::Hu),
            ..Default::default()
        };
        patch.apply(&mut user);

        assert_eq!(user.first_name.as_deref(), Some("Anna"));
        assert_eq!(user.job_title, None);
        assert_eq!(user.preferred_language, Some(Language::Hu));
        assert_eq!(user.role, Some(UserRole::Employee));
        assert_eq!(user.company_id, Some(company));
    }

    #[test]
    fn profile_update_rejects_role_field() {
        let json = serde_json::json!({ "first_name": "Eve", "role": "superadmin" });
        assert!(serde_json::from_value::<ProfileUpdate>(json).is_err());
    }

    #[test]
    fn role_round_trips_through_wire_names() {
        let role: UserRole = serde_json::from_str("\"company_admin\"").unwrap();
        assert_eq!(role, UserRole::CompanyAdmin);
        assert_eq!("manager".parse::<UserRole>().unwrap(), UserRole::Manager);
        assert!("owner".parse::<UserRole>().is_err());
    }
}
