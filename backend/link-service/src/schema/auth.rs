//! Authentication schema and resolvers

use async_graphql::{Context, ErrorExtensions, Object, Result as GraphQLResult, SimpleObject};
use crypto_core::{PasswordHasher, TokenService};
use std::sync::Arc;
use tracing::{info, warn};

use super::user::User;
use super::{request_context, service};
use crate::context::RequestContext;
use crate::error::{ApiError, Result};
use crate::models::NewUser;

#[derive(SimpleObject, Clone, Debug)]
pub struct AuthPayload {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub user: User,
}

#[derive(Default)]
pub struct AuthMutation;

#[Object]
impl AuthMutation {
    async fn signup(
        &self,
        ctx: &Context<'_>,
        name: String,
        email: String,
        password: String,
    ) -> GraphQLResult<AuthPayload> {
        let request = request_context(ctx)?;
        let passwords = service::<Arc<PasswordHasher>>(ctx)?;
        let tokens = service::<Arc<TokenService>>(ctx)?;

        register(request, passwords, tokens, name, email, password)
            .await
            .map_err(|e| e.extend())
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> GraphQLResult<AuthPayload> {
        let request = request_context(ctx)?;
        let passwords = service::<Arc<PasswordHasher>>(ctx)?;
        let tokens = service::<Arc<TokenService>>(ctx)?;

        authenticate(request, passwords, tokens, email, password)
            .await
            .map_err(|e| e.extend())
    }
}

async fn register(
    request: &RequestContext,
    passwords: &Arc<PasswordHasher>,
    tokens: &TokenService,
    name: String,
    email: String,
    password: String,
) -> Result<AuthPayload> {
    // Argon2 is CPU-bound; keep it off the async workers.
    let hasher = Arc::clone(passwords);
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

    let created = request
        .store()
        .create_user(NewUser {
            name,
            email,
            password_hash,
        })
        .await;

    let user = match created {
        Err(ApiError::DuplicateEmail) => {
            warn!("Signup rejected: email already registered");
            return Err(ApiError::DuplicateEmail);
        }
        other => other?,
    };

    let token = tokens.issue(user.id)?;
    info!(user_id = user.id, "User signed up");

    Ok(AuthPayload {
        token,
        user: user.into(),
    })
}

async fn authenticate(
    request: &RequestContext,
    passwords: &Arc<PasswordHasher>,
    tokens: &TokenService,
    email: String,
    password: String,
) -> Result<AuthPayload> {
    let Some(user) = request.store().find_user_by_email(&email).await? else {
        warn!("Login failed: unknown email");
        return Err(ApiError::UserNotFound);
    };

    let hasher = Arc::clone(passwords);
    let stored_hash = user.password.clone();
    let valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash)).await??;

    if !valid {
        warn!(user_id = user.id, "Login failed: incorrect password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = tokens.issue(user.id)?;
    info!(user_id = user.id, "User logged in");

    Ok(AuthPayload {
        token,
        user: user.into(),
    })
}
