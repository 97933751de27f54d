use axum::{routing::get, Router};

pub mod companies;
pub mod company_admins;
pub mod departments;
pub mod hierarchy;
pub mod policies;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/me", get(system::me))
        .nest("/companies", companies::router())
        .nest("/users", users::router())
        .nest("/company-admins", company_admins::router())
        .nest("/departments", departments::router())
        .nest("/hierarchy", hierarchy::router())
        .nest("/policies", policies::router())
        .route("/authz/explain", get(policies::explain))
}
