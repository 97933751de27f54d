//! `hrms-auth`: pure row-level authorization boundary (fail-closed).
//!
//! This crate is intentionally decoupled from HTTP and storage: callers
//! resolve the [`Actor`] and describe the row as a [`Resource`], and the
//! evaluator answers from the static policy catalogue alone.

pub mod actor;
pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod policy;
pub mod resource;

pub use actor::Actor;
pub use authorize::{
    allowed, authorize, explain_authorization, explain_named, AuthorizationExplanation,
    AuthzError, DenialKind,
};
pub use claims::{
    validate_claims, Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError,
};
pub use permissions::{Action, Permission, Table, TargetError};
pub use policy::{rules_for, PolicyRule, Predicate, POLICIES};
pub use resource::{Resource, ResourceAttrs};
