use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hrms_core::{Company, CompanyAdmin, CompanyId, Department, EmployeeHierarchy, User, UserId};

use crate::permissions::{Table, TargetError};

/// The policy-relevant projection of a row.
///
/// Only the columns the predicates read are carried; profile fields never
/// influence a decision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum Resource {
    Company {
        id: CompanyId,
    },
    User {
        id: UserId,
        company_id: Option<CompanyId>,
    },
    CompanyAdmin {
        user_id: UserId,
        company_id: CompanyId,
    },
    Department {
        company_id: CompanyId,
    },
    EmployeeHierarchy {
        company_id: CompanyId,
    },
}

impl Resource {
    pub fn table(&self) -> Table {
        match self {
            Resource::Company { .. } => Table::Companies,
            Resource::User { .. } => Table::Users,
            Resource::CompanyAdmin { .. } => Table::CompanyAdmins,
            Resource::Department { .. } => Table::Departments,
            Resource::EmployeeHierarchy { .. } => Table::EmployeeHierarchy,
        }
    }

    /// Company that scopes this row. For a company row, the company itself.
    pub fn tenant(&self) -> Option<CompanyId> {
        match *self {
            Resource::Company { id } => Some(id),
            Resource::User { company_id, .. } => company_id,
            Resource::CompanyAdmin { company_id, .. }
            | Resource::Department { company_id }
            | Resource::EmployeeHierarchy { company_id } => Some(company_id),
        }
    }

    /// Build a hypothetical resource from loose attributes (used by the
    /// explain endpoint, which must not read the store).
    pub fn from_attrs(table: Table, attrs: &ResourceAttrs) -> Result<Self, TargetError> {
        let missing = |attribute| TargetError::MissingAttribute {
            table: table.as_str(),
            attribute,
        };

        Ok(match table {
            Table::Companies => Resource::Company {
                id: CompanyId::from_uuid(attrs.id.ok_or_else(|| missing("id"))?),
            },
            Table::Users => Resource::User {
                id: UserId::from_uuid(attrs.id.ok_or_else(|| missing("id"))?),
                company_id: attrs.company_id.map(CompanyId::from_uuid),
            },
            Table::CompanyAdmins => Resource::CompanyAdmin {
                user_id: UserId::from_uuid(attrs.user_id.ok_or_else(|| missing("user_id"))?),
                company_id: CompanyId::from_uuid(
                    attrs.company_id.ok_or_else(|| missing("company_id"))?,
                ),
            },
            Table::Departments => Resource::Department {
                company_id: CompanyId::from_uuid(
                    attrs.company_id.ok_or_else(|| missing("company_id"))?,
                ),
            },
            Table::EmployeeHierarchy => Resource::EmployeeHierarchy {
                company_id: CompanyId::from_uuid(
                    attrs.company_id.ok_or_else(|| missing("company_id"))?,
                ),
            },
        })
    }
}

/// Loose row attributes, as supplied in a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResourceAttrs {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
}

impl From<&Company> for Resource {
    fn from(row: &Company) -> Self {
        Resource::Company { id: row.id }
    }
}

impl From<&User> for Resource {
    fn from(row: &User) -> Self {
        Resource::User {
            id: row.id,
            company_id: row.company_id,
        }
    }
}

impl From<&CompanyAdmin> for Resource {
    fn from(row: &CompanyAdmin) -> Self {
        Resource::CompanyAdmin {
            user_id: row.user_id,
            company_id: row.company_id,
        }
    }
}

impl From<&Department> for Resource {
    fn from(row: &Department) -> Self {
        Resource::Department {
            company_id: row.company_id,
        }
    }
}

impl From<&EmployeeHierarchy> for Resource {
    fn from(row: &EmployeeHierarchy) -> Self {
        Resource::EmployeeHierarchy {
            company_id: row.company_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_row_is_its_own_tenant() {
        let c = CompanyId::new();
        assert_eq!(Resource::Company { id: c }.tenant(), Some(c));
    }

    #[test]
    fn from_attrs_requires_the_columns_predicates_read() {
        let attrs = ResourceAttrs {
            user_id: Some(Uuid::now_v7()),
            ..Default::default()
        };
        let err = Resource::from_attrs(Table::CompanyAdmins, &attrs).unwrap_err();
        assert_eq!(
            err,
            TargetError::MissingAttribute {
                table: "company_admins",
                attribute: "company_id"
            }
        );

        let user = Resource::from_attrs(
            Table::Users,
            &ResourceAttrs {
                id: Some(Uuid::now_v7()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(user.tenant(), None);
    }
}
