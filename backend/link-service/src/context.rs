//! Per-operation request context

use crate::db::Store;
use crate::error::{ApiError, Result};
use std::sync::Arc;

/// Everything a resolver needs to know about the operation it serves
///
/// Built fresh for every GraphQL operation by the HTTP handler and never
/// mutated afterwards. `user_id` is present only when the request carried a
/// valid bearer token.
#[derive(Clone)]
pub struct RequestContext {
    store: Arc<dyn Store>,
    user_id: Option<i32>,
}

impl RequestContext {
    pub fn new(store: Arc<dyn Store>, user_id: Option<i32>) -> Self {
        Self { store, user_id }
    }

    pub fn anonymous(store: Arc<dyn Store>) -> Self {
        Self::new(store, None)
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn store_handle(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    pub fn user_id(&self) -> Option<i32> {
        self.user_id
    }

    /// The caller's id, or `Unauthenticated` for anonymous operations
    pub fn require_user(&self) -> Result<i32> {
        self.user_id.ok_or(ApiError::Unauthenticated)
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
