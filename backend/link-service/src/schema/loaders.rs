//! DataLoader implementations for batching relation lookups
//!
//! A feed page resolving `postedBy` and `voters` for every link issues one
//! store query per relation instead of one per link. Loaders are created
//! for each operation, so nothing is shared between requests.

use async_graphql::dataloader::Loader;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::Store;
use crate::error::ApiError;
use crate::models::{Link, User};

/// Batches `Link.postedBy` lookups by user id
pub struct UserLoader {
    store: Arc<dyn Store>,
}

impl UserLoader {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Loader<i32> for UserLoader {
    type Value = User;
    type Error = Arc<ApiError>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Self::Value>, Self::Error> {
        let users = self.store.find_users_by_ids(keys).await.map_err(Arc::new)?;

        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }
}

/// Batches `Link.voters` lookups by link id
///
/// Links without votes are absent from the map.
pub struct VotersLoader {
    store: Arc<dyn Store>,
}

impl VotersLoader {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Loader<i32> for VotersLoader {
    type Value = Vec<User>;
    type Error = Arc<ApiError>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Self::Value>, Self::Error> {
        let rows = self.store.find_voters(keys).await.map_err(Arc::new)?;

        let mut voters: HashMap<i32, Vec<User>> = HashMap::new();
        for (link_id, user) in rows {
            voters.entry(link_id).or_default().push(user);
        }

        Ok(voters)
    }
}

/// Batches `User.links` lookups by poster id
pub struct PostedLinksLoader {
    store: Arc<dyn Store>,
}

impl PostedLinksLoader {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Loader<i32> for PostedLinksLoader {
    type Value = Vec<Link>;
    type Error = Arc<ApiError>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Self::Value>, Self::Error> {
        let links = self.store.find_links_by_posters(keys).await.map_err(Arc::new)?;

        let mut by_poster: HashMap<i32, Vec<Link>> = HashMap::new();
        for link in links {
            if let Some(owner) = link.posted_by_id {
                by_poster.entry(owner).or_default().push(link);
            }
        }

        Ok(by_poster)
    }
}
