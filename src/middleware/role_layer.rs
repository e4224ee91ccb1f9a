use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use super::guards::authenticate;
use crate::{
    auth::{Claims, Role},
    error::AppError,
    state::AppState,
};

/// Authenticates the request (unless claims are already attached) and lets it
/// through only when the caller holds one of `allowed`.
#[derive(Clone)]
pub struct RequireRoleLayer {
    state: Arc<AppState>,
    allowed: &'static [Role],
}

impl RequireRoleLayer {
    pub fn new(state: Arc<AppState>, allowed: &'static [Role]) -> Self {
        Self { state, allowed }
    }
}

#[derive(Clone)]
pub struct RequireRole<S> {
    inner: S,
    state: Arc<AppState>,
    allowed: &'static [Role],
}

impl<S> Layer<S> for RequireRoleLayer {
    type Service = RequireRole<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRole {
            inner,
            state: Arc::clone(&self.state),
            allowed: self.allowed,
        }
    }
}

impl<S> Service<Request<Body>> for RequireRole<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let allowed = self.allowed;
        let state = Arc::clone(&self.state);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let claims = match req.extensions().get::<Claims>().cloned() {
                Some(claims) => claims,
                None => match authenticate(&state, req.headers()).await {
                    Ok(claims) => claims,
                    Err(err) => return Ok(err.into_response()),
                },
            };

            if !claims.has_any(allowed) {
                return Ok(AppError::forbidden("Missing required role").into_response());
            }

            req.extensions_mut().insert(claims);
            inner.call(req).await
        })
    }
}
