//! Infrastructure layer: row stores, actor resolution, row-level security.
//!
//! - [`store`]: unguarded (service-role) CRUD over the five tenant tables
//! - [`resolver`]: authenticated id → [`hrms_auth::Actor`]
//! - [`guard`]: per-request, policy-enforcing view over a store
//! - [`rls`]: the same policies as Postgres DDL
//! - [`seed`]: initial data

pub mod guard;
pub mod resolver;
pub mod rls;
pub mod seed;
pub mod store;

pub use guard::{AccessError, AccessResult, CompanyPatch, EdgePatch, GuardedStore};
pub use resolver::ActorResolver;
pub use seed::{SeedData, SeedError};
pub use store::{InMemoryRowStore, PostgresRowStore, RowStore, StoreError};
