//! `hrms-core`: domain foundation building blocks.
//!
//! Identifiers, the row types of the five tenant tables, and the domain error
//! model. No authorization or storage concerns live here.

pub mod entity;
pub mod error;
pub mod id;
pub mod model;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CompanyAdminId, CompanyId, DepartmentId, HierarchyId, UserId};
pub use model::{
    Company, CompanyAdmin, Department, EmployeeHierarchy, Language, ProfileUpdate, User, UserRole,
};
