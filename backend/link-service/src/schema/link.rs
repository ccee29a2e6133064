//! Link feed schema and resolvers

use async_graphql::{
    dataloader::DataLoader, ComplexObject, Context, Enum, ErrorExtensions, InputObject, Object,
    Result as GraphQLResult, SimpleObject,
};
use chrono::{DateTime, Utc};
use tracing::info;

use super::loaders::{UserLoader, VotersLoader};
use super::user::User;
use super::{loader_error, request_context, service, LinkPolicy};
use crate::context::RequestContext;
use crate::error::{ApiError, Result};
use crate::models::{self, FeedQuery, LinkChanges, LinkOrder, LinkOrderField, NewLink, SortDirection};

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct Link {
    pub id: i32,
    pub description: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub posted_by_id: Option<i32>,
}

impl From<models::Link> for Link {
    fn from(link: models::Link) -> Self {
        Self {
            id: link.id,
            description: link.description,
            url: link.url,
            created_at: link.created_at,
            posted_by_id: link.posted_by_id,
        }
    }
}

#[ComplexObject]
impl Link {
    /// The user who posted this link, if any
    async fn posted_by(&self, ctx: &Context<'_>) -> GraphQLResult<Option<User>> {
        let Some(owner) = self.posted_by_id else {
            return Ok(None);
        };

        let loader = service::<DataLoader<UserLoader>>(ctx)?;
        let user = loader.load_one(owner).await.map_err(loader_error)?;

        Ok(user.map(User::from))
    }

    /// Users who voted for this link
    async fn voters(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<User>> {
        let loader = service::<DataLoader<VotersLoader>>(ctx)?;
        let voters = loader.load_one(self.id).await.map_err(loader_error)?;

        Ok(voters.unwrap_or_default().into_iter().map(User::from).collect())
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct Feed {
    pub links: Vec<Link>,
    /// Number of links matching the filter, regardless of skip/take
    pub count: i32,
}

#[derive(Enum, Copy, Clone, Debug, PartialEq, Eq)]
#[graphql(rename_items = "lowercase")]
pub enum Sort {
    Asc,
    Desc,
}

impl From<Sort> for SortDirection {
    fn from(sort: Sort) -> Self {
        match sort {
            Sort::Asc => SortDirection::Asc,
            Sort::Desc => SortDirection::Desc,
        }
    }
}

/// One ordering key; exactly one field must be set
#[derive(InputObject, Clone, Debug, Default)]
pub struct LinkOrderByInput {
    pub description: Option<Sort>,
    pub url: Option<Sort>,
    pub created_at: Option<Sort>,
}

impl TryFrom<LinkOrderByInput> for LinkOrder {
    type Error = ApiError;

    fn try_from(input: LinkOrderByInput) -> Result<Self> {
        let keys = [
            (LinkOrderField::Description, input.description),
            (LinkOrderField::Url, input.url),
            (LinkOrderField::CreatedAt, input.created_at),
        ];

        let mut set = keys
            .into_iter()
            .filter_map(|(field, sort)| sort.map(|sort| (field, sort)));

        match (set.next(), set.next()) {
            (Some((field, sort)), None) => Ok(LinkOrder {
                field,
                direction: sort.into(),
            }),
            _ => Err(ApiError::BadRequest(
                "each orderBy entry must set exactly one of description, url, createdAt".to_string(),
            )),
        }
    }
}

#[derive(Default)]
pub struct LinkQuery;

#[Object]
impl LinkQuery {
    /// Filtered, ordered page of links plus the size of the filtered set
    async fn feed(
        &self,
        ctx: &Context<'_>,
        filter: Option<String>,
        skip: Option<i32>,
        take: Option<i32>,
        order_by: Option<Vec<LinkOrderByInput>>,
    ) -> GraphQLResult<Feed> {
        let request = request_context(ctx)?;

        load_feed(request, filter, skip, take, order_by.unwrap_or_default())
            .await
            .map_err(|e| e.extend())
    }

    async fn link_by_id(&self, ctx: &Context<'_>, id: i32) -> GraphQLResult<Option<Link>> {
        let request = request_context(ctx)?;

        let link = request.store().find_link(id).await.map_err(|e| e.extend())?;
        Ok(link.map(Link::from))
    }
}

async fn load_feed(
    request: &RequestContext,
    filter: Option<String>,
    skip: Option<i32>,
    take: Option<i32>,
    order_by: Vec<LinkOrderByInput>,
) -> Result<Feed> {
    let order_by = order_by
        .into_iter()
        .map(LinkOrder::try_from)
        .collect::<Result<Vec<_>>>()?;
    let query = FeedQuery::new(filter, skip, take, order_by)?;

    let links = request.store().find_links(&query).await?;
    let count = request.store().count_links(&query).await?;

    Ok(Feed {
        links: links.into_iter().map(Link::from).collect(),
        count: i32::try_from(count).map_err(|e| ApiError::Internal(e.to_string()))?,
    })
}

#[derive(Default)]
pub struct LinkMutation;

#[Object]
impl LinkMutation {
    /// Post a new link owned by the caller
    async fn link(&self, ctx: &Context<'_>, description: String, url: String) -> GraphQLResult<Link> {
        let request = request_context(ctx)?;

        post_link(request, description, url)
            .await
            .map(Link::from)
            .map_err(|e| e.extend())
    }

    /// Replace a link's description and url; null when the link does not exist
    async fn update_link(
        &self,
        ctx: &Context<'_>,
        id: i32,
        description: String,
        url: String,
    ) -> GraphQLResult<Option<Link>> {
        let request = request_context(ctx)?;
        let policy = *service::<LinkPolicy>(ctx)?;

        change_link(request, policy, id, LinkChanges { description, url })
            .await
            .map(|link| link.map(Link::from))
            .map_err(|e| e.extend())
    }

    /// Delete a link; false when the link does not exist
    async fn delete_link(&self, ctx: &Context<'_>, id: i32) -> GraphQLResult<bool> {
        let request = request_context(ctx)?;
        let policy = *service::<LinkPolicy>(ctx)?;

        remove_link(request, policy, id).await.map_err(|e| e.extend())
    }
}

async fn post_link(request: &RequestContext, description: String, url: String) -> Result<models::Link> {
    let user_id = request.require_user()?;

    let link = request
        .store()
        .create_link(NewLink {
            description,
            url,
            posted_by_id: Some(user_id),
        })
        .await?;

    info!(link_id = link.id, user_id, "Link posted");
    Ok(link)
}

impl LinkPolicy {
    /// Check that the caller may change `link`
    ///
    /// Links without a poster can only be changed while enforcement is off.
    fn authorize(&self, request: &RequestContext, link: &models::Link) -> Result<()> {
        if !self.enforce_ownership {
            return Ok(());
        }

        let user_id = request.require_user()?;
        if link.posted_by_id != Some(user_id) {
            return Err(ApiError::Forbidden);
        }

        Ok(())
    }

    async fn guard(&self, request: &RequestContext, link_id: i32) -> Result<bool> {
        if !self.enforce_ownership {
            return Ok(true);
        }

        match request.store().find_link(link_id).await? {
            Some(link) => self.authorize(request, &link).map(|_| true),
            None => Ok(false),
        }
    }
}

async fn change_link(
    request: &RequestContext,
    policy: LinkPolicy,
    link_id: i32,
    changes: LinkChanges,
) -> Result<Option<models::Link>> {
    if !policy.guard(request, link_id).await? {
        return Ok(None);
    }

    let updated = request.store().update_link(link_id, changes).await?;
    if updated.is_some() {
        info!(link_id, user_id = ?request.user_id(), "Link updated");
    }

    Ok(updated)
}

async fn remove_link(request: &RequestContext, policy: LinkPolicy, link_id: i32) -> Result<bool> {
    if !policy.guard(request, link_id).await? {
        return Ok(false);
    }

    let deleted = request.store().delete_link(link_id).await?;
    if deleted {
        info!(link_id, user_id = ?request.user_id(), "Link deleted");
    }

    Ok(deleted)
}
