//! Initial data loaded through the service-role path.
//!
//! Seeding writes straight to the [`RowStore`] and is not subject to row
//! policies. It is the only way companies and users are created.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use hrms_core::{Company, CompanyAdmin, Department, EmployeeHierarchy, User};

use crate::store::{RowStore, StoreError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid seed data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to insert seed row: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub companies: Vec<Company>,
    pub departments: Vec<Department>,
    pub users: Vec<User>,
    pub company_admins: Vec<CompanyAdmin>,
    pub hierarchy: Vec<EmployeeHierarchy>,
}

impl SeedData {
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Insert every row, parents before children.
    pub async fn apply(&self, store: &dyn RowStore) -> Result<(), SeedError> {
        for row in &self.companies {
            store.insert_company(row.clone()).await?;
        }
        for row in &self.departments {
            store.insert_department(row.clone()).await?;
        }
        for row in &self.users {
            store.insert_user(row.clone()).await?;
        }
        for row in &self.company_admins {
            store.insert_company_admin(row.clone()).await?;
        }
        for row in &self.hierarchy {
            store.insert_hierarchy_edge(row.clone()).await?;
        }

        info!(
            companies = self.companies.len(),
            departments = self.departments.len(),
            users = self.users.len(),
            company_admins = self.company_admins.len(),
            hierarchy = self.hierarchy.len(),
            "seed data applied"
        );
        Ok(())
    }
}
