//! Row store boundary for the five tenant tables.
//!
//! A `RowStore` is the *unguarded* (service-role) view of the data: it
//! performs no authorization. Request handlers must go through
//! [`crate::guard::GuardedStore`], which evaluates the row policies before
//! every read and write.

#[cfg(test)]
pub(crate) mod failing;
pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryRowStore;
pub use postgres::PostgresRowStore;

use thiserror::Error;

use hrms_core::{
    Company, CompanyAdmin, CompanyAdminId, CompanyId, Department, DepartmentId, EmployeeHierarchy,
    HierarchyId, ProfileUpdate, User, UserId,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    /// Uniqueness or referential integrity violation.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Async CRUD over the five tables.
///
/// `company_id` filters on list operations narrow the result to one tenant;
/// `None` lists every row. Admin membership lookups are answered from an
/// index (company → users and user → companies), never from a table scan.
#[async_trait::async_trait]
pub trait RowStore: Send + Sync {
    // companies
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError>;
    async fn company(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;
    async fn insert_company(&self, row: Company) -> Result<Company, StoreError>;
    async fn update_company(&self, row: Company) -> Result<Company, StoreError>;
    /// Cascades admin grants, departments and hierarchy edges; detaches users.
    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError>;

    // users
    async fn list_users(&self, company_id: Option<CompanyId>) -> Result<Vec<User>, StoreError>;
    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn insert_user(&self, row: User) -> Result<User, StoreError>;
    /// Applies `patch` to the stored row, touching only the profile columns.
    async fn update_profile(&self, id: UserId, patch: &ProfileUpdate) -> Result<User, StoreError>;

    // company_admins
    async fn list_company_admins(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<CompanyAdmin>, StoreError>;
    async fn company_admin(&self, id: CompanyAdminId) -> Result<Option<CompanyAdmin>, StoreError>;
    async fn insert_company_admin(&self, row: CompanyAdmin) -> Result<CompanyAdmin, StoreError>;
    async fn delete_company_admin(&self, id: CompanyAdminId) -> Result<(), StoreError>;
    async fn companies_administered_by(&self, user_id: UserId) -> Result<Vec<CompanyId>, StoreError>;
    async fn admins_of(&self, company_id: CompanyId) -> Result<Vec<UserId>, StoreError>;

    // departments
    async fn list_departments(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<Department>, StoreError>;
    async fn department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError>;
    async fn insert_department(&self, row: Department) -> Result<Department, StoreError>;
    async fn update_department(&self, row: Department) -> Result<Department, StoreError>;
    /// Detaches users assigned to the department.
    async fn delete_department(&self, id: DepartmentId) -> Result<(), StoreError>;

    // employee_hierarchy
    async fn list_hierarchy(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<EmployeeHierarchy>, StoreError>;
    async fn hierarchy_edge(&self, id: HierarchyId)
    -> Result<Option<EmployeeHierarchy>, StoreError>;
    async fn insert_hierarchy_edge(
        &self,
        row: EmployeeHierarchy,
    ) -> Result<EmployeeHierarchy, StoreError>;
    async fn update_hierarchy_edge(
        &self,
        row: EmployeeHierarchy,
    ) -> Result<EmployeeHierarchy, StoreError>;
    async fn delete_hierarchy_edge(&self, id: HierarchyId) -> Result<(), StoreError>;
}
