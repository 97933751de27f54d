use hrms_core::UserId;

/// Authenticated identity for a request.
///
/// Carries only what the identity provider vouches for. Role, company and
/// admin grants are resolved from the store per request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor_id: UserId,
}

impl ActorContext {
    pub fn new(actor_id: UserId) -> Self {
        Self { actor_id }
    }

    pub fn actor_id(&self) -> UserId {
        self.actor_id
    }
}
