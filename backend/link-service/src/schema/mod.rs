//! GraphQL schema: link feed, authentication and voting

pub mod auth;
pub mod link;
pub mod loaders;
pub mod user;
pub mod vote;

use async_graphql::{
    dataloader::DataLoader, Context, EmptySubscription, ErrorExtensions, MergedObject,
    Result as GraphQLResult, Schema,
};
use crypto_core::{PasswordHasher, TokenService};
use std::sync::Arc;

use crate::config::GraphQLConfig;
use crate::context::RequestContext;
use crate::error::ApiError;

/// Root query object
#[derive(MergedObject, Default)]
pub struct QueryRoot(link::LinkQuery);

/// Root mutation object
#[derive(MergedObject, Default)]
pub struct MutationRoot(link::LinkMutation, auth::AuthMutation, vote::VoteMutation);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Who may change an existing link
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkPolicy {
    /// When false any caller may update or delete any link
    pub enforce_ownership: bool,
}

/// Build the schema with process-wide services attached
///
/// Per-operation data (the caller and the store loaders) is attached to each
/// request by [`prepare_request`].
pub fn build_schema(
    tokens: Arc<TokenService>,
    passwords: Arc<PasswordHasher>,
    config: &GraphQLConfig,
) -> AppSchema {
    let mut builder = Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(tokens)
        .data(passwords)
        .data(LinkPolicy {
            enforce_ownership: config.enforce_link_ownership,
        })
        .limit_depth(config.max_depth)
        .limit_complexity(config.max_complexity);

    if !config.introspection {
        builder = builder.disable_introspection();
    }

    builder.finish()
}

/// Attach a fresh request context and fresh DataLoaders to one operation
pub fn prepare_request(request: async_graphql::Request, context: RequestContext) -> async_graphql::Request {
    let store = context.store_handle();

    request
        .data(DataLoader::new(
            loaders::UserLoader::new(Arc::clone(&store)),
            tokio::task::spawn,
        ))
        .data(DataLoader::new(
            loaders::VotersLoader::new(Arc::clone(&store)),
            tokio::task::spawn,
        ))
        .data(DataLoader::new(
            loaders::PostedLinksLoader::new(store),
            tokio::task::spawn,
        ))
        .data(context)
}

pub(crate) fn request_context<'a>(ctx: &Context<'a>) -> GraphQLResult<&'a RequestContext> {
    ctx.data::<RequestContext>()
        .map_err(|_| ApiError::Internal("request context not available".to_string()).extend())
}

pub(crate) fn service<'a, T: Send + Sync + 'static>(ctx: &Context<'a>) -> GraphQLResult<&'a T> {
    ctx.data::<T>().map_err(|_| {
        ApiError::Internal(format!("{} not available", std::any::type_name::<T>())).extend()
    })
}

/// Convert a loader failure, which is shared between every waiting resolver
pub(crate) fn loader_error(err: Arc<ApiError>) -> async_graphql::Error {
    <ApiError as ErrorExtensions>::extend(&err)
}
