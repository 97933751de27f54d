use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use hrms_core::{
    Company, CompanyAdmin, CompanyAdminId, CompanyId, Department, DepartmentId, EmployeeHierarchy,
    Entity, HierarchyId, ProfileUpdate, User, UserId,
};

use super::{RowStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    companies: HashMap<CompanyId, Company>,
    users: HashMap<UserId, User>,
    company_admins: HashMap<CompanyAdminId, CompanyAdmin>,
    departments: HashMap<DepartmentId, Department>,
    hierarchy: HashMap<HierarchyId, EmployeeHierarchy>,

    /// Reverse index: company → users holding an admin grant for it.
    admins_by_company: HashMap<CompanyId, BTreeSet<UserId>>,
    /// Forward index: user → companies it administers.
    companies_by_admin: HashMap<UserId, BTreeSet<CompanyId>>,
}

impl Tables {
    fn index_grant(&mut self, grant: &CompanyAdmin) {
        self.admins_by_company
            .entry(grant.company_id)
            .or_default()
            .insert(grant.user_id);
        self.companies_by_admin
            .entry(grant.user_id)
            .or_default()
            .insert(grant.company_id);
    }

    fn unindex_grant(&mut self, grant: &CompanyAdmin) {
        if let Some(users) = self.admins_by_company.get_mut(&grant.company_id) {
            users.remove(&grant.user_id);
            if users.is_empty() {
                self.admins_by_company.remove(&grant.company_id);
            }
        }
        if let Some(companies) = self.companies_by_admin.get_mut(&grant.user_id) {
            companies.remove(&grant.company_id);
            if companies.is_empty() {
                self.companies_by_admin.remove(&grant.user_id);
            }
        }
    }

    fn require_company(&self, id: CompanyId) -> Result<(), StoreError> {
        if self.companies.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Conflict(format!("company {id} does not exist")))
        }
    }

    fn require_user(&self, id: UserId) -> Result<(), StoreError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Conflict(format!("user {id} does not exist")))
        }
    }

    fn check_user_refs(&self, row: &User) -> Result<(), StoreError> {
        if let Some(company_id) = row.company_id {
            self.require_company(company_id)?;
        }
        if let Some(department_id) = row.department_id {
            if !self.departments.contains_key(&department_id) {
                return Err(StoreError::Conflict(format!(
                    "department {department_id} does not exist"
                )));
            }
        }
        Ok(())
    }

    fn check_edge_refs(&self, row: &EmployeeHierarchy) -> Result<(), StoreError> {
        self.require_company(row.company_id)?;
        self.require_user(row.employee_id)?;
        self.require_user(row.manager_id)
    }
}

/// In-memory row store for tests/dev.
///
/// Maintains the company ↔ admin indexes alongside the `company_admins` rows
/// so membership lookups never scan the grant table.
#[derive(Debug, Default)]
pub struct InMemoryRowStore {
    inner: RwLock<Tables>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

/// Rows in creation order, ids breaking ties.
fn sorted<T, F>(rows: impl Iterator<Item = T>, created: F) -> Vec<T>
where
    T: Entity,
    T::Id: Ord,
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    let mut out: Vec<T> = rows.collect();
    out.sort_by(|a, b| created(a).cmp(&created(b)).then_with(|| a.id().cmp(&b.id())));
    out
}

fn insert_new<K, V>(map: &mut HashMap<K, V>, key: K, row: V) -> Result<V, StoreError>
where
    K: Eq + std::hash::Hash + core::fmt::Display + Copy,
    V: Clone,
{
    if map.contains_key(&key) {
        return Err(StoreError::Conflict(format!("row {key} already exists")));
    }
    map.insert(key, row.clone());
    Ok(row)
}

fn replace<K, V>(map: &mut HashMap<K, V>, key: K, row: V) -> Result<V, StoreError>
where
    K: Eq + std::hash::Hash,
    V: Clone,
{
    match map.get_mut(&key) {
        Some(slot) => {
            *slot = row.clone();
            Ok(row)
        }
        None => Err(StoreError::NotFound),
    }
}

#[async_trait::async_trait]
impl RowStore for InMemoryRowStore {
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        let t = self.read()?;
        Ok(sorted(t.companies.values().cloned(), |c| c.created_at))
    }

    async fn company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.read()?.companies.get(&id).cloned())
    }

    async fn insert_company(&self, row: Company) -> Result<Company, StoreError> {
        let mut t = self.write()?;
        insert_new(&mut t.companies, row.id, row)
    }

    async fn update_company(&self, row: Company) -> Result<Company, StoreError> {
        let mut t = self.write()?;
        replace(&mut t.companies, row.id, row)
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
        let mut t = self.write()?;
        if t.companies.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }

        let grants: Vec<CompanyAdmin> = t
            .company_admins
            .values()
            .filter(|g| g.company_id == id)
            .cloned()
            .collect();
        for grant in &grants {
            t.company_admins.remove(&grant.id);
            t.unindex_grant(grant);
        }

        let removed_departments: BTreeSet<DepartmentId> = t
            .departments
            .values()
            .filter(|d| d.company_id == id)
            .map(|d| d.id)
            .collect();
        t.departments.retain(|_, d| d.company_id != id);
        t.hierarchy.retain(|_, e| e.company_id != id);

        for user in t.users.values_mut() {
            if user.company_id == Some(id) {
                user.company_id = None;
            }
            if user
                .department_id
                .is_some_and(|d| removed_departments.contains(&d))
            {
                user.department_id = None;
            }
        }
        Ok(())
    }

    async fn list_users(&self, company_id: Option<CompanyId>) -> Result<Vec<User>, StoreError> {
        let t = self.read()?;
        let rows = t
            .users
            .values()
            .filter(|u| company_id.is_none() || u.company_id == company_id)
            .cloned();
        Ok(sorted(rows, |u| u.created_at))
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn insert_user(&self, row: User) -> Result<User, StoreError> {
        let mut t = self.write()?;
        t.check_user_refs(&row)?;
        insert_new(&mut t.users, row.id, row)
    }

    async fn update_profile(&self, id: UserId, patch: &ProfileUpdate) -> Result<User, StoreError> {
        let mut t = self.write()?;
        let row = t.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        patch.apply(row);
        Ok(row.clone())
    }

    async fn list_company_admins(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<CompanyAdmin>, StoreError> {
        let t = self.read()?;
        let rows = t
            .company_admins
            .values()
            .filter(|g| company_id.is_none_or(|c| g.company_id == c))
            .cloned();
        Ok(sorted(rows, |g| g.created_at))
    }

    async fn company_admin(&self, id: CompanyAdminId) -> Result<Option<CompanyAdmin>, StoreError> {
        Ok(self.read()?.company_admins.get(&id).cloned())
    }

    async fn insert_company_admin(&self, row: CompanyAdmin) -> Result<CompanyAdmin, StoreError> {
        let mut t = self.write()?;
        t.require_company(row.company_id)?;
        t.require_user(row.user_id)?;
        let duplicate = t
            .admins_by_company
            .get(&row.company_id)
            .is_some_and(|users| users.contains(&row.user_id));
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "user {} is already an admin of company {}",
                row.user_id, row.company_id
            )));
        }
        let row = insert_new(&mut t.company_admins, row.id, row)?;
        t.index_grant(&row);
        Ok(row)
    }

    async fn delete_company_admin(&self, id: CompanyAdminId) -> Result<(), StoreError> {
        let mut t = self.write()?;
        let grant = t.company_admins.remove(&id).ok_or(StoreError::NotFound)?;
        t.unindex_grant(&grant);
        Ok(())
    }

    async fn companies_administered_by(&self, user_id: UserId) -> Result<Vec<CompanyId>, StoreError> {
        let t = self.read()?;
        Ok(t.companies_by_admin
            .get(&user_id)
            .map(|c| c.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn admins_of(&self, company_id: CompanyId) -> Result<Vec<UserId>, StoreError> {
        let t = self.read()?;
        Ok(t.admins_by_company
            .get(&company_id)
            .map(|u| u.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn list_departments(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<Department>, StoreError> {
        let t = self.read()?;
        let rows = t
            .departments
            .values()
            .filter(|d| company_id.is_none_or(|c| d.company_id == c))
            .cloned();
        Ok(sorted(rows, |d| d.created_at))
    }

    async fn department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError> {
        Ok(self.read()?.departments.get(&id).cloned())
    }

    async fn insert_department(&self, row: Department) -> Result<Department, StoreError> {
        let mut t = self.write()?;
        t.require_company(row.company_id)?;
        insert_new(&mut t.departments, row.id, row)
    }

    async fn update_department(&self, row: Department) -> Result<Department, StoreError> {
        let mut t = self.write()?;
        t.require_company(row.company_id)?;
        replace(&mut t.departments, row.id, row)
    }

    async fn delete_department(&self, id: DepartmentId) -> Result<(), StoreError> {
        let mut t = self.write()?;
        if t.departments.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        for user in t.users.values_mut() {
            if user.department_id == Some(id) {
                user.department_id = None;
            }
        }
        Ok(())
    }

    async fn list_hierarchy(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<EmployeeHierarchy>, StoreError> {
        let t = self.read()?;
        let rows = t
            .hierarchy
            .values()
            .filter(|e| company_id.is_none_or(|c| e.company_id == c))
            .cloned();
        Ok(sorted(rows, |e| e.created_at))
    }

    async fn hierarchy_edge(
        &self,
        id: HierarchyId,
    ) -> Result<Option<EmployeeHierarchy>, StoreError> {
        Ok(self.read()?.hierarchy.get(&id).cloned())
    }

    async fn insert_hierarchy_edge(
        &self,
        row: EmployeeHierarchy,
    ) -> Result<EmployeeHierarchy, StoreError> {
        let mut t = self.write()?;
        t.check_edge_refs(&row)?;
        insert_new(&mut t.hierarchy, row.id, row)
    }

    async fn update_hierarchy_edge(
        &self,
        row: EmployeeHierarchy,
    ) -> Result<EmployeeHierarchy, StoreError> {
        let mut t = self.write()?;
        t.check_edge_refs(&row)?;
        replace(&mut t.hierarchy, row.id, row)
    }

    async fn delete_hierarchy_edge(&self, id: HierarchyId) -> Result<(), StoreError> {
        let mut t = self.write()?;
        t.hierarchy.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hrms_core::UserRole;

    fn company(name: &str) -> Company {
        Company::new(CompanyId::new(), name, None, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn admin_indexes_follow_grants() {
        let store = InMemoryRowStore::new();
        let c = store.insert_company(company("Acme")).await.unwrap();
        let u = store.insert_user(User::new(UserId::new(), Utc::now())).await.unwrap();

        let grant = store
            .insert_company_admin(CompanyAdmin::new(u.id, c.id, Utc::now()))
            .await
            .unwrap();
        assert_eq!(store.admins_of(c.id).await.unwrap(), vec![u.id]);
        assert_eq!(store.companies_administered_by(u.id).await.unwrap(), vec![c.id]);

        let dup = store
            .insert_company_admin(CompanyAdmin::new(u.id, c.id, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(dup, StoreError::Conflict(_)));

        store.delete_company_admin(grant.id).await.unwrap();
        assert!(store.admins_of(c.id).await.unwrap().is_empty());
        assert!(store.companies_administered_by(u.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inserts_check_references() {
        let store = InMemoryRowStore::new();
        let orphan = Department::new(CompanyId::new(), "Ops", Utc::now()).unwrap();
        assert!(matches!(
            store.insert_department(orphan).await,
            Err(StoreError::Conflict(_))
        ));

        let user = User::new(UserId::new(), Utc::now()).with_company(CompanyId::new());
        assert!(matches!(store.insert_user(user).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn deleting_company_cascades() {
        let store = InMemoryRowStore::new();
        let c = store.insert_company(company("Acme")).await.unwrap();
        let d = store
            .insert_department(Department::new(c.id, "Ops", Utc::now()).unwrap())
            .await
            .unwrap();
        let mut emp = User::new(UserId::new(), Utc::now()).with_company(c.id);
        emp.department_id = Some(d.id);
        let emp = store.insert_user(emp).await.unwrap();
        let boss = store
            .insert_user(User::new(UserId::new(), Utc::now()).with_company(c.id))
            .await
            .unwrap();
        store
            .insert_company_admin(CompanyAdmin::new(boss.id, c.id, Utc::now()))
            .await
            .unwrap();
        store
            .insert_hierarchy_edge(EmployeeHierarchy::new(emp.id, boss.id, c.id, Utc::now()).unwrap())
            .await
            .unwrap();

        store.delete_company(c.id).await.unwrap();

        assert!(store.list_departments(None).await.unwrap().is_empty());
        assert!(store.list_hierarchy(None).await.unwrap().is_empty());
        assert!(store.list_company_admins(None).await.unwrap().is_empty());
        assert!(store.companies_administered_by(boss.id).await.unwrap().is_empty());
        let emp = store.user(emp.id).await.unwrap().unwrap();
        assert_eq!(emp.company_id, None);
        assert_eq!(emp.department_id, None);
    }

    #[tokio::test]
    async fn list_filters_by_company() {
        let store = InMemoryRowStore::new();
        let a = store.insert_company(company("A")).await.unwrap();
        let b = store.insert_company(company("B")).await.unwrap();
        for c in [a.id, a.id, b.id] {
            store
                .insert_user(User::new(UserId::new(), Utc::now()).with_company(c))
                .await
                .unwrap();
        }
        assert_eq!(store.list_users(Some(a.id)).await.unwrap().len(), 2);
        assert_eq!(store.list_users(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn profile_update_leaves_other_columns_alone() {
        let store = InMemoryRowStore::new();
        let c = store.insert_company(company("Acme")).await.unwrap();
        let d = store
            .insert_department(Department::new(c.id, "Ops", Utc::now()).unwrap())
            .await
            .unwrap();
        let mut emp = User::new(UserId::new(), Utc::now())
            .with_company(c.id)
            .with_role(UserRole::Employee);
        emp.department_id = Some(d.id);
        let emp = store.insert_user(emp).await.unwrap();

        // The department goes away between the caller's read and its write.
        store.delete_department(d.id).await.unwrap();

        let patch = ProfileUpdate {
            job_title: Some("Engineer".into()),
            ..Default::default()
        };
        let updated = store.update_profile(emp.id, &patch).await.unwrap();
        assert_eq!(updated.job_title.as_deref(), Some("Engineer"));
        assert_eq!(updated.department_id, None);
        assert_eq!(updated.company_id, Some(c.id));
        assert_eq!(updated.role, Some(UserRole::Employee));
        assert_eq!(store.user(emp.id).await.unwrap().unwrap(), updated);

        assert_eq!(
            store.update_profile(UserId::new(), &patch).await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = InMemoryRowStore::new();
        assert_eq!(
            store.update_company(company("Ghost")).await.unwrap_err(),
            StoreError::NotFound
        );
        assert_eq!(
            store.delete_hierarchy_edge(HierarchyId::new()).await.unwrap_err(),
            StoreError::NotFound
        );
    }
}
