use std::str::FromStr;

use serde::Deserialize;
use uuid::Uuid;

use hrms_auth::ResourceAttrs;
use hrms_core::{CompanyId, DomainError, UserId};
use hrms_infra::{CompanyPatch, EdgePatch};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub access_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub access_time: Option<String>,
}

impl From<UpdateCompanyRequest> for CompanyPatch {
    fn from(value: UpdateCompanyRequest) -> Self {
        CompanyPatch {
            name: value.name,
            access_time: value.access_time,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrantAdminRequest {
    pub user_id: UserId,
    pub company_id: CompanyId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDepartmentRequest {
    pub company_id: CompanyId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameDepartmentRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEdgeRequest {
    pub employee_id: UserId,
    pub manager_id: UserId,
    pub company_id: CompanyId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEdgeRequest {
    pub employee_id: Option<UserId>,
    pub manager_id: Option<UserId>,
}

impl From<UpdateEdgeRequest> for EdgePatch {
    fn from(value: UpdateEdgeRequest) -> Self {
        EdgePatch {
            employee_id: value.employee_id,
            manager_id: value.manager_id,
        }
    }
}

// -------------------------
// Query strings
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CompanyFilter {
    pub company_id: Option<CompanyId>,
}

/// `GET /authz/explain?table=..&action=..&id=..&user_id=..&company_id=..`
#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub table: String,
    pub action: String,
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
}

impl ExplainQuery {
    pub fn attrs(&self) -> ResourceAttrs {
        ResourceAttrs {
            id: self.id,
            user_id: self.user_id,
            company_id: self.company_id,
        }
    }
}

/// Parse a path segment into a typed id; malformed ids are a 400.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(|e| ApiError::BadRequest(e.to_string()))
}
