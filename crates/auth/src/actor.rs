use std::collections::BTreeSet;

use serde::Serialize;

use hrms_core::{CompanyId, User, UserId, UserRole};

/// The authenticated identity an authorization decision is made for.
///
/// An actor is resolved once per request from its own user row plus the
/// companies it administers, and passed explicitly to the evaluator. It must
/// not be cached across requests: admin membership can change between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    id: UserId,
    role: Option<UserRole>,
    company_id: Option<CompanyId>,
    admin_of: BTreeSet<CompanyId>,
    resolved: bool,
}

impl Actor {
    /// Build an actor from its own user row and its admin grants.
    pub fn resolved(user: &User, admin_of: impl IntoIterator<Item = CompanyId>) -> Self {
        Self {
            id: user.id,
            role: user.role,
            company_id: user.company_id,
            admin_of: admin_of.into_iter().collect(),
            resolved: true,
        }
    }

    /// Most-restrictive actor for an identity whose profile could not be read.
    ///
    /// Carries no role, company or admin grants, so only public and
    /// self-row predicates can hold for it.
    pub fn unresolved(id: UserId) -> Self {
        Self {
            id,
            role: None,
            company_id: None,
            admin_of: BTreeSet::new(),
            resolved: false,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn role(&self) -> Option<UserRole> {
        self.role
    }

    pub fn company_id(&self) -> Option<CompanyId> {
        self.company_id
    }

    pub fn admin_of(&self) -> &BTreeSet<CompanyId> {
        &self.admin_of
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Reads only the actor's own role; never consults other rows.
    pub fn is_superadmin(&self) -> bool {
        self.role == Some(UserRole::Superadmin)
    }

    pub fn is_admin_of(&self, company_id: CompanyId) -> bool {
        self.admin_of.contains(&company_id)
    }
}
