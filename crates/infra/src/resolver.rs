//! Resolves an authenticated identity into an [`Actor`].

use std::sync::Arc;

use tracing::warn;

use hrms_auth::Actor;
use hrms_core::UserId;

use crate::store::RowStore;

/// Reads the caller's own user row and admin grants, once per request.
///
/// Failures never widen access: a missing profile or a backend error yields
/// [`Actor::unresolved`], and a failed admin lookup yields no admin grants.
#[derive(Clone)]
pub struct ActorResolver {
    store: Arc<dyn RowStore>,
}

impl ActorResolver {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, id: UserId) -> Actor {
        let user = match self.store.user(id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(actor_id = %id, "no profile row for authenticated identity; restricting to self access");
                return Actor::unresolved(id);
            }
            Err(e) => {
                warn!(actor_id = %id, error = %e, "profile lookup failed; restricting to self access");
                return Actor::unresolved(id);
            }
        };

        match self.store.companies_administered_by(id).await {
            Ok(companies) => Actor::resolved(&user, companies),
            Err(e) => {
                warn!(actor_id = %id, error = %e, "admin grant lookup failed; treating actor as holding none");
                Actor::resolved(&user, [])
            }
        }
    }
}
