//! A `RowStore` that delegates to [`InMemoryRowStore`] but can be told to
//! fail the lookups actor resolution and profile reads depend on.

use std::sync::atomic::{AtomicBool, Ordering};

use hrms_core::{
    Company, CompanyAdmin, CompanyAdminId, CompanyId, Department, DepartmentId, EmployeeHierarchy,
    HierarchyId, ProfileUpdate, User, UserId,
};

use super::{InMemoryRowStore, RowStore, StoreError};

#[derive(Default)]
pub(crate) struct FailingStore {
    inner: InMemoryRowStore,
    fail_user: AtomicBool,
    fail_grants: AtomicBool,
}

impl FailingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every `user(id)` call from now on returns a backend error.
    pub(crate) fn fail_user_lookups(&self) {
        self.fail_user.store(true, Ordering::SeqCst);
    }

    /// Every `companies_administered_by` call from now on returns a backend error.
    pub(crate) fn fail_grant_lookups(&self) {
        self.fail_grants.store(true, Ordering::SeqCst);
    }

    fn outage(flag: &AtomicBool, op: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!("{op}: connection reset")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RowStore for FailingStore {
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        self.inner.list_companies().await
    }

    async fn company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        self.inner.company(id).await
    }

    async fn insert_company(&self, row: Company) -> Result<Company, StoreError> {
        self.inner.insert_company(row).await
    }

    async fn update_company(&self, row: Company) -> Result<Company, StoreError> {
        self.inner.update_company(row).await
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
        self.inner.delete_company(id).await
    }

    async fn list_users(&self, company_id: Option<CompanyId>) -> Result<Vec<User>, StoreError> {
        self.inner.list_users(company_id).await
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Self::outage(&self.fail_user, "user")?;
        self.inner.user(id).await
    }

    async fn insert_user(&self, row: User) -> Result<User, StoreError> {
        self.inner.insert_user(row).await
    }

    async fn update_profile(&self, id: UserId, patch: &ProfileUpdate) -> Result<User, StoreError> {
        self.inner.update_profile(id, patch).await
    }

    async fn list_company_admins(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<CompanyAdmin>, StoreError> {
        self.inner.list_company_admins(company_id).await
    }

    async fn company_admin(&self, id: CompanyAdminId) -> Result<Option<CompanyAdmin>, StoreError> {
        self.inner.company_admin(id).await
    }

    async fn insert_company_admin(&self, row: CompanyAdmin) -> Result<CompanyAdmin, StoreError> {
        self.inner.insert_company_admin(row).await
    }

    async fn delete_company_admin(&self, id: CompanyAdminId) -> Result<(), StoreError> {
        self.inner.delete_company_admin(id).await
    }

    async fn companies_administered_by(&self, user_id: UserId) -> Result<Vec<CompanyId>, StoreError> {
        Self::outage(&self.fail_grants, "companies_administered_by")?;
        self.inner.companies_administered_by(user_id).await
    }

    async fn admins_of(&self, company_id: CompanyId) -> Result<Vec<UserId>, StoreError> {
        self.inner.admins_of(company_id).await
    }

    async fn list_departments(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<Department>, StoreError> {
        self.inner.list_departments(company_id).await
    }

    async fn department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError> {
        self.inner.department(id).await
    }

    async fn insert_department(&self, row: Department) -> Result<Department, StoreError> {
        self.inner.insert_department(row).await
    }

    async fn update_department(&self, row: Department) -> Result<Department, StoreError> {
        self.inner.update_department(row).await
    }

    async fn delete_department(&self, id: DepartmentId) -> Result<(), StoreError> {
        self.inner.delete_department(id).await
    }

    async fn list_hierarchy(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<EmployeeHierarchy>, StoreError> {
        self.inner.list_hierarchy(company_id).await
    }

    async fn hierarchy_edge(
        &self,
        id: HierarchyId,
    ) -> Result<Option<EmployeeHierarchy>, StoreError> {
        self.inner.hierarchy_edge(id).await
    }

    async fn insert_hierarchy_edge(
        &self,
        row: EmployeeHierarchy,
    ) -> Result<EmployeeHierarchy, StoreError> {
        self.inner.insert_hierarchy_edge(row).await
    }

    async fn update_hierarchy_edge(
        &self,
        row: EmployeeHierarchy,
    ) -> Result<EmployeeHierarchy, StoreError> {
        self.inner.update_hierarchy_edge(row).await
    }

    async fn delete_hierarchy_edge(&self, id: HierarchyId) -> Result<(), StoreError> {
        self.inner.delete_hierarchy_edge(id).await
    }
}
