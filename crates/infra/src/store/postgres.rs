//! Postgres-backed row store.
//!
//! Connects with a service-role login: the database's own row-level policies
//! are bypassed here, and enforcement happens in the guarded layer in front
//! of this store. The same policies can be installed in the database with
//! [`crate::rls::render_policies`].
//!
//! ## Error Mapping
//!
//! | PostgreSQL code | `StoreError` |
//! |---|---|
//! | `23505` unique violation | `Conflict` |
//! | `23503` foreign key violation | `Conflict` |
//! | `23514` check violation | `Conflict` |
//! | anything else | `Backend` |

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use hrms_core::{
    Company, CompanyAdmin, CompanyAdminId, CompanyId, Department, DepartmentId, EmployeeHierarchy,
    HierarchyId, Language, ProfileUpdate, User, UserId, UserRole,
};

use super::{RowStore, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_schema.sql");

const USER_COLUMNS: &str = "id, company_id, first_name, last_name, role, preferred_language, \
     created_at, phone_number, date_of_birth, hire_date, job_title, department_id";

pub struct PostgresRowStore {
    pool: PgPool,
}

impl PostgresRowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn delete_by_id(&self, op: &'static str, sql: &str, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn map_sqlx_error(op: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23505") | Some("23503") | Some("23514") => {
                StoreError::Conflict(format!("{op}: {}", db.message()))
            }
            _ => StoreError::Backend(format!("{op}: {err}")),
        },
        _ => StoreError::Backend(format!("{op}: {err}")),
    }
}

fn decode<T>(op: &str, value: Result<T, sqlx::Error>) -> Result<T, StoreError> {
    value.map_err(|e| StoreError::Backend(format!("{op}: failed to decode row: {e}")))
}

fn company_from_row(row: &PgRow) -> Result<Company, StoreError> {
    Ok(Company {
        id: CompanyId::from_uuid(decode("company", row.try_get("id"))?),
        name: decode("company", row.try_get("name"))?,
        created_at: decode("company", row.try_get("created_at"))?,
        access_time: decode("company", row.try_get("access_time"))?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: Option<String> = decode("user", row.try_get("role"))?;
    let language: Option<String> = decode("user", row.try_get("preferred_language"))?;
    let company_id: Option<Uuid> = decode("user", row.try_get("company_id"))?;
    let department_id: Option<Uuid> = decode("user", row.try_get("department_id"))?;

    Ok(User {
        id: UserId::from_uuid(decode("user", row.try_get("id"))?),
        company_id: company_id.map(CompanyId::from_uuid),
        first_name: decode("user", row.try_get("first_name"))?,
        last_name: decode("user", row.try_get("last_name"))?,
        role: role
            .map(|r| r.parse::<UserRole>())
            .transpose()
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        preferred_language: language
            .map(|l| l.parse::<Language>())
            .transpose()
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        created_at: decode::<DateTime<Utc>>("user", row.try_get("created_at"))?,
        phone_number: decode("user", row.try_get("phone_number"))?,
        date_of_birth: decode::<Option<NaiveDate>>("user", row.try_get("date_of_birth"))?,
        hire_date: decode::<Option<NaiveDate>>("user", row.try_get("hire_date"))?,
        job_title: decode("user", row.try_get("job_title"))?,
        department_id: department_id.map(DepartmentId::from_uuid),
    })
}

fn company_admin_from_row(row: &PgRow) -> Result<CompanyAdmin, StoreError> {
    Ok(CompanyAdmin {
        id: CompanyAdminId::from_uuid(decode("company_admin", row.try_get("id"))?),
        user_id: UserId::from_uuid(decode("company_admin", row.try_get("user_id"))?),
        company_id: CompanyId::from_uuid(decode("company_admin", row.try_get("company_id"))?),
        created_at: decode("company_admin", row.try_get("created_at"))?,
    })
}

fn department_from_row(row: &PgRow) -> Result<Department, StoreError> {
    Ok(Department {
        id: DepartmentId::from_uuid(decode("department", row.try_get("id"))?),
        company_id: CompanyId::from_uuid(decode("department", row.try_get("company_id"))?),
        name: decode("department", row.try_get("name"))?,
        created_at: decode("department", row.try_get("created_at"))?,
    })
}

fn edge_from_row(row: &PgRow) -> Result<EmployeeHierarchy, StoreError> {
    Ok(EmployeeHierarchy {
        id: HierarchyId::from_uuid(decode("hierarchy", row.try_get("id"))?),
        employee_id: UserId::from_uuid(decode("hierarchy", row.try_get("employee_id"))?),
        manager_id: UserId::from_uuid(decode("hierarchy", row.try_get("manager_id"))?),
        company_id: CompanyId::from_uuid(decode("hierarchy", row.try_get("company_id"))?),
        created_at: decode("hierarchy", row.try_get("created_at"))?,
    })
}

fn collect<T>(rows: Vec<PgRow>, f: fn(&PgRow) -> Result<T, StoreError>) -> Result<Vec<T>, StoreError> {
    rows.iter().map(f).collect()
}

#[async_trait::async_trait]
impl RowStore for PostgresRowStore {
    #[instrument(skip(self))]
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, created_at, access_time FROM companies ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_companies", e))?;
        collect(rows, company_from_row)
    }

    #[instrument(skip(self))]
    async fn company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        sqlx::query("SELECT id, name, created_at, access_time FROM companies WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("company", e))?
            .as_ref()
            .map(company_from_row)
            .transpose()
    }

    #[instrument(skip(self, row), fields(company_id = %row.id))]
    async fn insert_company(&self, row: Company) -> Result<Company, StoreError> {
        sqlx::query(
            "INSERT INTO companies (id, name, created_at, access_time) VALUES ($1, $2, $3, $4)",
        )
        .bind(row.id.as_uuid())
        .bind(&row.name)
        .bind(row.created_at)
        .bind(&row.access_time)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_company", e))?;
        Ok(row)
    }

    #[instrument(skip(self, row), fields(company_id = %row.id))]
    async fn update_company(&self, row: Company) -> Result<Company, StoreError> {
        let result = sqlx::query("UPDATE companies SET name = $2, access_time = $3 WHERE id = $1")
            .bind(row.id.as_uuid())
            .bind(&row.name)
            .bind(&row.access_time)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_company", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
        self.delete_by_id("delete_company", "DELETE FROM companies WHERE id = $1", *id.as_uuid())
            .await
    }

    #[instrument(skip(self))]
    async fn list_users(&self, company_id: Option<CompanyId>) -> Result<Vec<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::uuid IS NULL OR company_id = $1) ORDER BY created_at, id"
        );
        let rows = sqlx::query(&sql)
            .bind(company_id.map(Uuid::from))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        collect(rows, user_from_row)
    }

    #[instrument(skip(self))]
    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("user", e))?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    #[instrument(skip(self, row), fields(user_id = %row.id))]
    async fn insert_user(&self, row: User) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&sql)
            .bind(row.id.as_uuid())
            .bind(row.company_id.map(Uuid::from))
            .bind(&row.first_name)
            .bind(&row.last_name)
            .bind(row.role.map(|r| r.as_str()))
            .bind(row.preferred_language.map(|l| l.as_str()))
            .bind(row.created_at)
            .bind(&row.phone_number)
            .bind(row.date_of_birth)
            .bind(row.hire_date)
            .bind(&row.job_title)
            .bind(row.department_id.map(Uuid::from))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(row)
    }

    #[instrument(skip(self, patch))]
    async fn update_profile(&self, id: UserId, patch: &ProfileUpdate) -> Result<User, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_profile", e))?;

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        let mut row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_profile", e))?
            .as_ref()
            .map(user_from_row)
            .transpose()?
            .ok_or(StoreError::NotFound)?;
        patch.apply(&mut row);

        sqlx::query(
            "UPDATE users SET first_name = $2, last_name = $3, phone_number = $4, \
             date_of_birth = $5, job_title = $6, preferred_language = $7 WHERE id = $1",
        )
        .bind(row.id.as_uuid())
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.phone_number)
        .bind(row.date_of_birth)
        .bind(&row.job_title)
        .bind(row.preferred_language.map(|l| l.as_str()))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_profile", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_profile", e))?;
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn list_company_admins(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<CompanyAdmin>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, user_id, company_id, created_at FROM company_admins \
             WHERE ($1::uuid IS NULL OR company_id = $1) ORDER BY created_at, id",
        )
        .bind(company_id.map(Uuid::from))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_company_admins", e))?;
        collect(rows, company_admin_from_row)
    }

    #[instrument(skip(self))]
    async fn company_admin(&self, id: CompanyAdminId) -> Result<Option<CompanyAdmin>, StoreError> {
        sqlx::query("SELECT id, user_id, company_id, created_at FROM company_admins WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("company_admin", e))?
            .as_ref()
            .map(company_admin_from_row)
            .transpose()
    }

    #[instrument(skip(self, row), fields(user_id = %row.user_id, company_id = %row.company_id))]
    async fn insert_company_admin(&self, row: CompanyAdmin) -> Result<CompanyAdmin, StoreError> {
        sqlx::query(
            "INSERT INTO company_admins (id, user_id, company_id, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(row.id.as_uuid())
        .bind(row.user_id.as_uuid())
        .bind(row.company_id.as_uuid())
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_company_admin", e))?;
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn delete_company_admin(&self, id: CompanyAdminId) -> Result<(), StoreError> {
        self.delete_by_id(
            "delete_company_admin",
            "DELETE FROM company_admins WHERE id = $1",
            *id.as_uuid(),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn companies_administered_by(&self, user_id: UserId) -> Result<Vec<CompanyId>, StoreError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT company_id FROM company_admins WHERE user_id = $1 ORDER BY company_id",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("companies_administered_by", e))?;
        Ok(ids.into_iter().map(CompanyId::from_uuid).collect())
    }

    #[instrument(skip(self))]
    async fn admins_of(&self, company_id: CompanyId) -> Result<Vec<UserId>, StoreError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM company_admins WHERE company_id = $1 ORDER BY user_id",
        )
        .bind(company_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("admins_of", e))?;
        Ok(ids.into_iter().map(UserId::from_uuid).collect())
    }

    #[instrument(skip(self))]
    async fn list_departments(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<Department>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, company_id, name, created_at FROM departments \
             WHERE ($1::uuid IS NULL OR company_id = $1) ORDER BY created_at, id",
        )
        .bind(company_id.map(Uuid::from))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_departments", e))?;
        collect(rows, department_from_row)
    }

    #[instrument(skip(self))]
    async fn department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError> {
        sqlx::query("SELECT id, company_id, name, created_at FROM departments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("department", e))?
            .as_ref()
            .map(department_from_row)
            .transpose()
    }

    #[instrument(skip(self, row), fields(department_id = %row.id))]
    async fn insert_department(&self, row: Department) -> Result<Department, StoreError> {
        sqlx::query(
            "INSERT INTO departments (id, company_id, name, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(row.id.as_uuid())
        .bind(row.company_id.as_uuid())
        .bind(&row.name)
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_department", e))?;
        Ok(row)
    }

    #[instrument(skip(self, row), fields(department_id = %row.id))]
    async fn update_department(&self, row: Department) -> Result<Department, StoreError> {
        let result =
            sqlx::query("UPDATE departments SET company_id = $2, name = $3 WHERE id = $1")
                .bind(row.id.as_uuid())
                .bind(row.company_id.as_uuid())
                .bind(&row.name)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_department", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn delete_department(&self, id: DepartmentId) -> Result<(), StoreError> {
        self.delete_by_id(
            "delete_department",
            "DELETE FROM departments WHERE id = $1",
            *id.as_uuid(),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn list_hierarchy(
        &self,
        company_id: Option<CompanyId>,
    ) -> Result<Vec<EmployeeHierarchy>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, employee_id, manager_id, company_id, created_at FROM employee_hierarchy \
             WHERE ($1::uuid IS NULL OR company_id = $1) ORDER BY created_at, id",
        )
        .bind(company_id.map(Uuid::from))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_hierarchy", e))?;
        collect(rows, edge_from_row)
    }

    #[instrument(skip(self))]
    async fn hierarchy_edge(
        &self,
        id: HierarchyId,
    ) -> Result<Option<EmployeeHierarchy>, StoreError> {
        sqlx::query(
            "SELECT id, employee_id, manager_id, company_id, created_at \
             FROM employee_hierarchy WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("hierarchy_edge", e))?
        .as_ref()
        .map(edge_from_row)
        .transpose()
    }

    #[instrument(skip(self, row), fields(edge_id = %row.id))]
    async fn insert_hierarchy_edge(
        &self,
        row: EmployeeHierarchy,
    ) -> Result<EmployeeHierarchy, StoreError> {
        sqlx::query(
            "INSERT INTO employee_hierarchy (id, employee_id, manager_id, company_id, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(row.id.as_uuid())
        .bind(row.employee_id.as_uuid())
        .bind(row.manager_id.as_uuid())
        .bind(row.company_id.as_uuid())
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_hierarchy_edge", e))?;
        Ok(row)
    }

    #[instrument(skip(self, row), fields(edge_id = %row.id))]
    async fn update_hierarchy_edge(
        &self,
        row: EmployeeHierarchy,
    ) -> Result<EmployeeHierarchy, StoreError> {
        let result = sqlx::query(
            "UPDATE employee_hierarchy SET employee_id = $2, manager_id = $3, company_id = $4 \
             WHERE id = $1",
        )
        .bind(row.id.as_uuid())
        .bind(row.employee_id.as_uuid())
        .bind(row.manager_id.as_uuid())
        .bind(row.company_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_hierarchy_edge", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn delete_hierarchy_edge(&self, id: HierarchyId) -> Result<(), StoreError> {
        self.delete_by_id(
            "delete_hierarchy_edge",
            "DELETE FROM employee_hierarchy WHERE id = $1",
            *id.as_uuid(),
        )
        .await
    }
}
