//! Bearer token middleware
//!
//! Resolves the `Authorization: Bearer <token>` header into a `Viewer`
//! stored in the request extensions. It never rejects a request: a missing,
//! malformed or invalid token yields an anonymous viewer, and resolvers that
//! need a logged-in caller reject on their own.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    Error, HttpMessage,
};
use crypto_core::TokenService;
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::sync::Arc;
use tracing::debug;

/// Identity of the caller as established by the bearer token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<i32>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Resolve a viewer from request headers
    pub fn from_headers(headers: &HeaderMap, tokens: &TokenService) -> Self {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Self::anonymous();
        };

        let Ok(raw) = value.to_str() else {
            debug!("Authorization header is not valid ASCII; treating request as anonymous");
            return Self::anonymous();
        };

        let Some(token) = raw.strip_prefix("Bearer ") else {
            debug!("Authorization header does not use the Bearer scheme; treating request as anonymous");
            return Self::anonymous();
        };

        match tokens.verify(token.trim()) {
            Ok(claims) => Self {
                user_id: Some(claims.user_id),
            },
            Err(e) => {
                debug!(error = %e, "Bearer token rejected; treating request as anonymous");
                Self::anonymous()
            }
        }
    }
}

pub struct BearerAuth {
    tokens: Arc<TokenService>,
}

impl BearerAuth {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthService {
            service,
            tokens: Arc::clone(&self.tokens),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: S,
    tokens: Arc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let viewer = Viewer::from_headers(req.headers(), &self.tokens);
        req.extensions_mut().insert(viewer);

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}
