//! Per-process service wiring shared by every handler.

use std::sync::Arc;

use hrms_infra::{ActorResolver, GuardedStore, RowStore};

use crate::context::ActorContext;

pub struct AppServices {
    store: Arc<dyn RowStore>,
    resolver: ActorResolver,
}

impl AppServices {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        let resolver = ActorResolver::new(store.clone());
        Self { store, resolver }
    }

    /// Resolve the caller and wrap the store in its row policies.
    ///
    /// Called once per request; admin grants are not cached across requests.
    pub async fn guarded(&self, ctx: &ActorContext) -> GuardedStore {
        let actor = self.resolver.resolve(ctx.actor_id()).await;
        GuardedStore::new(self.store.clone(), actor)
    }
}
