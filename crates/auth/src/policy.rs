//! Static row-level policy catalogue.
//!
//! One [`PolicyRule`] per source policy. Rules for the same (table, action)
//! are OR-ed; a pair with no rule denies.

use serde::Serialize;

use crate::actor::Actor;
use crate::permissions::{Action, Table};
use crate::resource::Resource;

/// Condition a rule checks against the actor and row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Public.
    Always,
    /// The row is the actor's own user row.
    IsSelf,
    /// The row is an admin grant held by the actor.
    IsOwner,
    /// The actor administers the company scoping the row.
    AdminOfRowCompany,
    /// The actor's own role is superadmin.
    Superadmin,
}

impl Predicate {
    pub fn holds(&self, actor: &Actor, resource: &Resource) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::IsSelf => matches!(resource, Resource::User { id, .. } if *id == actor.id()),
            Predicate::IsOwner => {
                actor.is_resolved()
                    && matches!(resource, Resource::CompanyAdmin { user_id, .. } if *user_id == actor.id())
            }
            Predicate::AdminOfRowCompany => resource
                .tenant()
                .is_some_and(|company_id| actor.is_admin_of(company_id)),
            Predicate::Superadmin => actor.is_superadmin(),
        }
    }

    /// Whether the predicate can hold for an actor whose profile was not read.
    pub fn survives_unresolved(&self) -> bool {
        matches!(self, Predicate::Always | Predicate::IsSelf)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRule {
    pub name: &'static str,
    pub table: Table,
    pub action: Action,
    pub predicate: Predicate,
}

const fn rule(name: &'static str, table: Table, action: Action, predicate: Predicate) -> PolicyRule {
    PolicyRule {
        name,
        table,
        action,
        predicate,
    }
}

pub static POLICIES: &[PolicyRule] = &[
    // companies
    rule(
        "Companies are viewable by everyone.",
        Table::Companies,
        Action::Select,
        Predicate::Always,
    ),
    rule(
        "Company admins can update their company.",
        Table::Companies,
        Action::Update,
        Predicate::AdminOfRowCompany,
    ),
    // users
    rule(
        "Users can view their own profile.",
        Table::Users,
        Action::Select,
        Predicate::IsSelf,
    ),
    rule(
        "Users can update their own profile.",
        Table::Users,
        Action::Update,
        Predicate::IsSelf,
    ),
    rule(
        "Company admins can view all users in their company.",
        Table::Users,
        Action::Select,
        Predicate::AdminOfRowCompany,
    ),
    rule(
        "Superadmins can view all users.",
        Table::Users,
        Action::Select,
        Predicate::Superadmin,
    ),
    // company_admins
    rule(
        "Company admins can view their own company admin entries.",
        Table::CompanyAdmins,
        Action::Select,
        Predicate::IsOwner,
    ),
    rule(
        "Superadmins can view all company admin entries.",
        Table::CompanyAdmins,
        Action::Select,
        Predicate::Superadmin,
    ),
    rule(
        "Superadmins can add company admins.",
        Table::CompanyAdmins,
        Action::Insert,
        Predicate::Superadmin,
    ),
    // departments
    rule(
        "Company admins can view all departments in their company.",
        Table::Departments,
        Action::Select,
        Predicate::AdminOfRowCompany,
    ),
    rule(
        "Superadmins can view all departments.",
        Table::Departments,
        Action::Select,
        Predicate::Superadmin,
    ),
    rule(
        "Company admins can create departments in their company",
        Table::Departments,
        Action::Insert,
        Predicate::AdminOfRowCompany,
    ),
    rule(
        "Company admins can update departments in their company",
        Table::Departments,
        Action::Update,
        Predicate::AdminOfRowCompany,
    ),
    rule(
        "Company admins can delete departments in their company",
        Table::Departments,
        Action::Delete,
        Predicate::AdminOfRowCompany,
    ),
    // employee_hierarchy
    rule(
        "Company admins can view all hierarchy entries in their company.",
        Table::EmployeeHierarchy,
        Action::Select,
        Predicate::AdminOfRowCompany,
    ),
    rule(
        "Superadmins can view all hierarchy entries.",
        Table::EmployeeHierarchy,
        Action::Select,
        Predicate::Superadmin,
    ),
];

/// Rules governing one (table, action) pair, in catalogue order.
pub fn rules_for(table: Table, action: Action) -> impl Iterator<Item = &'static PolicyRule> {
    POLICIES
        .iter()
        .filter(move |r| r.table == table && r.action == action)
}
