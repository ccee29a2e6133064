//! User schema

use async_graphql::{dataloader::DataLoader, ComplexObject, Context, Result as GraphQLResult, SimpleObject};

use super::link::Link;
use super::loaders::PostedLinksLoader;
use super::{loader_error, service};
use crate::models;

/// Public view of a user; the password hash is never exposed
#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<models::User> for User {
    fn from(user: models::User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[ComplexObject]
impl User {
    /// Links posted by this user
    async fn links(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<Link>> {
        let loader = service::<DataLoader<PostedLinksLoader>>(ctx)?;
        let links = loader.load_one(self.id).await.map_err(loader_error)?;

        Ok(links.unwrap_or_default().into_iter().map(Link::from).collect())
    }
}
