//! Voting schema

use async_graphql::{Context, ErrorExtensions, Object, Result as GraphQLResult, SimpleObject};
use tracing::info;

use super::link::Link;
use super::request_context;
use super::user::User;
use crate::context::RequestContext;
use crate::error::{ApiError, Result};

#[derive(SimpleObject, Clone, Debug)]
pub struct Vote {
    pub link: Link,
    pub user: User,
}

#[derive(Default)]
pub struct VoteMutation;

#[Object]
impl VoteMutation {
    /// Record the caller's vote for a link
    ///
    /// Voting twice for the same link is a no-op. Returns null when the link
    /// does not exist.
    async fn vote(&self, ctx: &Context<'_>, link_id: i32) -> GraphQLResult<Option<Vote>> {
        let request = request_context(ctx)?;

        cast_vote(request, link_id).await.map_err(|e| e.extend())
    }
}

async fn cast_vote(request: &RequestContext, link_id: i32) -> Result<Option<Vote>> {
    let user_id = request.require_user()?;

    if !request.store().add_vote(link_id, user_id).await? {
        return Ok(None);
    }

    let link = request.store().find_link(link_id).await?;
    let user = request
        .store()
        .find_users_by_ids(&[user_id])
        .await?
        .into_iter()
        .next()
        .ok_or(ApiError::UserNotFound)?;

    info!(link_id, user_id, "Vote recorded");

    // The link may have been deleted between the vote and the read.
    Ok(link.map(|link| Vote {
        link: link.into(),
        user: user.into(),
    }))
}
