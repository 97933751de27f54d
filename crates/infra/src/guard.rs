//! Row-level-secured view over a [`RowStore`].
//!
//! A `GuardedStore` is built per request for one resolved [`Actor`]. Every
//! read filters rows through the SELECT policies, and every write is checked
//! against the policies for its action before the store is touched.
//!
//! Visibility rules:
//! - list operations silently drop rows the actor may not SELECT;
//! - fetching, updating or deleting an invisible row is `NotFound`, so row
//!   existence is not disclosed;
//! - a visible row the actor may not modify is `Denied`;
//! - UPDATE is checked against both the current and the updated row;
//! - the policy check runs before payload validation, so an unauthorized
//!   write is `Denied` whatever its payload.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use hrms_auth::{authorize, allowed, Action, Actor, AuthzError, Resource};
use hrms_core::{
    Company, CompanyAdmin, CompanyAdminId, CompanyId, Department, DepartmentId, DomainError,
    EmployeeHierarchy, HierarchyId, ProfileUpdate, User, UserId,
};

use crate::store::{RowStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error(transparent)]
    Denied(#[from] AuthzError),

    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AccessError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => AccessError::NotFound,
            StoreError::Conflict(msg) => AccessError::Conflict(msg),
            StoreError::Backend(msg) => AccessError::Backend(msg),
        }
    }
}

impl From<DomainError> for AccessError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                AccessError::Validation(msg)
            }
            DomainError::NotFound => AccessError::NotFound,
            DomainError::Conflict(msg) => AccessError::Conflict(msg),
        }
    }
}

pub type AccessResult<T> = Result<T, AccessError>;

/// Changes to a company row. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub access_time: Option<String>,
}

/// Changes to a hierarchy edge. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct EdgePatch {
    pub employee_id: Option<UserId>,
    pub manager_id: Option<UserId>,
}

pub struct GuardedStore {
    store: Arc<dyn RowStore>,
    actor: Actor,
}

impl GuardedStore {
    pub fn new(store: Arc<dyn RowStore>, actor: Actor) -> Self {
        Self { store, actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    fn check(&self, action: Action, resource: &Resource) -> AccessResult<()> {
        authorize(&self.actor, action, resource).map_err(|e| {
            debug!(actor_id = %self.actor.id(), error = %e, "row policy denied");
            AccessError::Denied(e)
        })
    }

    fn can_see<T>(&self, row: &T) -> bool
    where
        for<'a> Resource: From<&'a T>,
    {
        allowed(&self.actor, Action::Select, &Resource::from(row))
    }

    fn visible<T>(&self, rows: Vec<T>) -> Vec<T>
    where
        for<'a> Resource: From<&'a T>,
    {
        rows.into_iter().filter(|r| self.can_see(r)).collect()
    }

    /// The row, if it exists and the actor may see it.
    fn expose<T>(&self, row: Option<T>) -> AccessResult<T>
    where
        for<'a> Resource: From<&'a T>,
    {
        row.filter(|r| self.can_see(r)).ok_or(AccessError::NotFound)
    }

    /// UPDATE check: the existing row (USING) and the new row (WITH CHECK).
    fn check_update<T>(&self, before: &T, after: &T) -> AccessResult<()>
    where
        for<'a> Resource: From<&'a T>,
    {
        self.check(Action::Update, &Resource::from(before))?;
        self.check(Action::Update, &Resource::from(after))
    }

    // ─────────────────────────────────────────────────────────────────────
    // companies
    // ─────────────────────────────────────────────────────────────────────

    pub async fn list_companies(&self) -> AccessResult<Vec<Company>> {
        Ok(self.visible(self.store.list_companies().await?))
    }

    pub async fn company(&self, id: CompanyId) -> AccessResult<Company> {
        self.expose(self.store.company(id).await?)
    }

    pub async fn create_company(
        &self,
        name: &str,
        access_time: Option<String>,
    ) -> AccessResult<Company> {
        let id = CompanyId::new();
        self.check(Action::Insert, &Resource::Company { id })?;
        let row = Company::new(id, name, access_time, Utc::now())?;
        Ok(self.store.insert_company(row).await?)
    }

    pub async fn update_company(&self, id: CompanyId, patch: CompanyPatch) -> AccessResult<Company> {
        let before = self.company(id).await?;
        self.check(Action::Update, &Resource::from(&before))?;
        let name = patch.name.as_deref().unwrap_or(&before.name);
        let access_time = patch.access_time.or_else(|| before.access_time.clone());
        let after = Company::new(before.id, name, access_time, before.created_at)?;

        self.check(Action::Update, &Resource::from(&after))?;
        Ok(self.store.update_company(after).await?)
    }

    pub async fn delete_company(&self, id: CompanyId) -> AccessResult<()> {
        let row = self.company(id).await?;
        self.check(Action::Delete, &Resource::from(&row))?;
        Ok(self.store.delete_company(id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // users
    // ─────────────────────────────────────────────────────────────────────

    pub async fn list_users(&self, company_id: Option<CompanyId>) -> AccessResult<Vec<User>> {
        Ok(self.visible(self.store.list_users(company_id).await?))
    }

    pub async fn user(&self, id: UserId) -> AccessResult<User> {
        self.expose(self.store.user(id).await?)
    }

    pub async fn update_profile(&self, id: UserId, patch: &ProfileUpdate) -> AccessResult<User> {
        let before = self.user(id).await?;
        let mut after = before.clone();
        patch.apply(&mut after);

        self.check_update(&before, &after)?;
        Ok(self.store.update_profile(id, patch).await?)
    }

    /// The actor's own user row, or `None` when it does not exist or is not
    /// visible. Store failures are returned, not folded into `None`.
    pub async fn own_profile(&self) -> AccessResult<Option<User>> {
        match self.user(self.actor.id()).await {
            Ok(user) => Ok(Some(user)),
            Err(AccessError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // company_admins
    // ─────────────────────────────────────────────────────────────────────

    pub async fn list_company_admins(
        &self,
        company_id: Option<CompanyId>,
    ) -> AccessResult<Vec<CompanyAdmin>> {
        Ok(self.visible(self.store.list_company_admins(company_id).await?))
    }

    pub async fn grant_admin(&self, user_id: UserId, company_id: CompanyId) -> AccessResult<CompanyAdmin> {
        let row = CompanyAdmin::new(user_id, company_id, Utc::now());
        self.check(Action::Insert, &Resource::from(&row))?;

        // Cross-company grants are accepted, but worth noticing.
        if let Ok(Some(user)) = self.store.user(user_id).await {
            if user.company_id != Some(company_id) {
                warn!(
                    user_id = %user_id,
                    company_id = %company_id,
                    user_company_id = ?user.company_id,
                    "admin grant for a user outside the company"
                );
            }
        }

        Ok(self.store.insert_company_admin(row).await?)
    }

    pub async fn revoke_admin(&self, id: CompanyAdminId) -> AccessResult<()> {
        let row = self.expose(self.store.company_admin(id).await?)?;
        self.check(Action::Delete, &Resource::from(&row))?;
        Ok(self.store.delete_company_admin(id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // departments
    // ─────────────────────────────────────────────────────────────────────

    pub async fn list_departments(
        &self,
        company_id: Option<CompanyId>,
    ) -> AccessResult<Vec<Department>> {
        Ok(self.visible(self.store.list_departments(company_id).await?))
    }

    pub async fn department(&self, id: DepartmentId) -> AccessResult<Department> {
        self.expose(self.store.department(id).await?)
    }

    pub async fn create_department(&self, company_id: CompanyId, name: &str) -> AccessResult<Department> {
        self.check(Action::Insert, &Resource::Department { company_id })?;
        let row = Department::new(company_id, name, Utc::now())?;
        Ok(self.store.insert_department(row).await?)
    }

    pub async fn rename_department(&self, id: DepartmentId, name: &str) -> AccessResult<Department> {
        let before = self.department(id).await?;
        self.check(Action::Update, &Resource::from(&before))?;
        let mut after = before.clone();
        after.rename(name)?;

        self.check(Action::Update, &Resource::from(&after))?;
        Ok(self.store.update_department(after).await?)
    }

    pub async fn delete_department(&self, id: DepartmentId) -> AccessResult<()> {
        let row = self.department(id).await?;
        self.check(Action::Delete, &Resource::from(&row))?;
        Ok(self.store.delete_department(id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // employee_hierarchy
    // ─────────────────────────────────────────────────────────────────────

    pub async fn list_hierarchy(
        &self,
        company_id: Option<CompanyId>,
    ) -> AccessResult<Vec<EmployeeHierarchy>> {
        Ok(self.visible(self.store.list_hierarchy(company_id).await?))
    }

    pub async fn create_edge(
        &self,
        employee_id: UserId,
        manager_id: UserId,
        company_id: CompanyId,
    ) -> AccessResult<EmployeeHierarchy> {
        self.check(Action::Insert, &Resource::EmployeeHierarchy { company_id })?;
        let row = EmployeeHierarchy::new(employee_id, manager_id, company_id, Utc::now())?;
        Ok(self.store.insert_hierarchy_edge(row).await?)
    }

    pub async fn update_edge(&self, id: HierarchyId, patch: EdgePatch) -> AccessResult<EmployeeHierarchy> {
        let before = self.expose(self.store.hierarchy_edge(id).await?)?;
        self.check(Action::Update, &Resource::from(&before))?;
        let mut after = EmployeeHierarchy::new(
            patch.employee_id.unwrap_or(before.employee_id),
            patch.manager_id.unwrap_or(before.manager_id),
            before.company_id,
            before.created_at,
        )?;
        after.id = before.id;

        self.check(Action::Update, &Resource::from(&after))?;
        Ok(self.store.update_hierarchy_edge(after).await?)
    }

    pub async fn delete_edge(&self, id: HierarchyId) -> AccessResult<()> {
        let row = self.expose(self.store.hierarchy_edge(id).await?)?;
        self.check(Action::Delete, &Resource::from(&row))?;
        Ok(self.store.delete_hierarchy_edge(id).await?)
    }
}
