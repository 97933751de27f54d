//! HTTP API: bearer-token authentication and row-level-secured CRUD routes.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
