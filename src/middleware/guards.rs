use std::{marker::PhantomData, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::{
    auth::{Claims, RequiredRole},
    error::AppError,
    services::ServiceContext,
    state::AppState,
};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Resolves the caller from `Authorization: Bearer <jwt>` or, failing that,
/// from the `x-api-key` header.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Claims, AppError> {
    let services = ServiceContext::from_state(state);
    let auth = services.auth(&state.jwt);

    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let token = value
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::unauthorized("Missing/invalid Authorization header"))?;
        return auth.authenticate_bearer(token.trim()).await;
    }

    match headers.get(API_KEY_HEADER).and_then(|value| value.to_str().ok()) {
        Some(key) if !key.trim().is_empty() => auth.authenticate_api_key(key.trim()).await,
        _ => Err(AppError::unauthorized(
            "Missing credentials: send a Bearer token or an x-api-key header",
        )),
    }
}

impl FromRequestParts<Arc<AppState>> for Claims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>().cloned() {
            return Ok(claims);
        }

        let claims = authenticate(state, &parts.headers).await?;
        parts.extensions.insert(claims.clone());
        Ok(claims)
    }
}

pub type AuthGuard = Claims;

pub struct AuthRoleGuard<R: RequiredRole> {
    pub claims: Claims,
    _marker: PhantomData<R>,
}

impl<R> FromRequestParts<Arc<AppState>> for AuthRoleGuard<R>
where
    R: RequiredRole,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state).await?;

        if !claims.has_any(R::allowed()) {
            return Err(AppError::forbidden("Missing required role"));
        }

        Ok(Self {
            claims,
            _marker: PhantomData,
        })
    }
}
