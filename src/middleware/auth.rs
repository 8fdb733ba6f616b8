use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use http::request::Parts;
use http::{header, Method, Request};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::db::ProfileStore;
use crate::error::{AppResult, MarketError};
use crate::models::Role;
use crate::services::identity::IdentityProvider;

/// Authenticated caller injected by the auth middleware into request extensions.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: Role,
}

/// Paths that do not require a bearer token
const PUBLIC_PATHS: &[&str] = &["/health"];

#[derive(Clone)]
pub struct AuthLayer {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl AuthLayer {
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { identity, profiles }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            identity: self.identity.clone(),
            profiles: self.profiles.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn resolve_caller(
    identity: &dyn IdentityProvider,
    profiles: &dyn ProfileStore,
    token: Option<&str>,
) -> AppResult<AuthenticatedUser> {
    let token = token.ok_or(MarketError::Unauthenticated)?;
    let user_id = identity.authenticate(token).await?;

    let role = profiles
        .role_of(user_id)
        .await?
        .ok_or(MarketError::ProfileNotFound)?
        .parse::<Role>()?;

    Ok(AuthenticatedUser { user_id, role })
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        std::mem::swap(&mut self.inner, &mut inner);

        let identity = self.identity.clone();
        let profiles = self.profiles.clone();

        Box::pin(async move {
            // CORS preflights never carry credentials
            let path = req.uri().path();
            if req.method() == Method::OPTIONS || PUBLIC_PATHS.iter().any(|p| *p == path) {
                return inner.call(req).await;
            }

            let token = bearer_token(&req).map(str::to_string);
            match resolve_caller(identity.as_ref(), profiles.as_ref(), token.as_deref()).await {
                Ok(user) => {
                    tracing::debug!("Authenticated {} as {}", user.user_id, user.role);
                    req.extensions_mut().insert(user);
                    inner.call(req).await
                }
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(MarketError::Unauthenticated)
    }
}
