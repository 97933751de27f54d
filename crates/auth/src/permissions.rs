use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The five row-secured tables.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Companies,
    Users,
    CompanyAdmins,
    Departments,
    EmployeeHierarchy,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Companies,
        Table::Users,
        Table::CompanyAdmins,
        Table::Departments,
        Table::EmployeeHierarchy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Companies => "companies",
            Table::Users => "users",
            Table::CompanyAdmins => "company_admins",
            Table::Departments => "departments",
            Table::EmployeeHierarchy => "employee_hierarchy",
        }
    }
}

/// Row operation being authorized.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Select,
    Insert,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Select, Action::Insert, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Select => "select",
            Action::Insert => "insert",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// SQL keyword used in policy DDL.
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            Action::Select => "SELECT",
            Action::Insert => "INSERT",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("missing attribute '{attribute}' for table '{table}'")]
    MissingAttribute {
        table: &'static str,
        attribute: &'static str,
    },
}

impl core::str::FromStr for Table {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Table::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| TargetError::UnknownTable(s.to_string()))
    }
}

impl core::str::FromStr for Action {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == lower)
            .ok_or_else(|| TargetError::UnknownAction(s.to_string()))
    }
}

/// A (table, action) pair, rendered as `"table.action"` (e.g. `"departments.update"`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub table: Table,
    pub action: Action,
}

impl Permission {
    pub fn new(table: Table, action: Action) -> Self {
        Self { table, action }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.table.as_str(), self.action.as_str())
    }
}
