use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::AdminRole,
    db::entities::api_key,
    middleware::AuthRoleGuard,
    response::{ApiResult, JsonApiResponse},
    routes::{CrudApiRouter, Method},
    services::{ServiceContext, api_key_service::IssueApiKey},
    state::AppState,
};

const BASE_PATH: &str = "/api-keys";

/// The stored key plus its raw value, which is never shown again.
#[derive(Debug, Serialize)]
pub struct IssuedApiKey {
    #[serde(flatten)]
    pub api_key: api_key::Model,
    pub key: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let service = ServiceContext::from_state(state.as_ref()).api_key();
    CrudApiRouter::new(service, BASE_PATH)
        .set_allowed_methods(&[
            Method::List,
            Method::Get,
            Method::Count,
            Method::Aggregate,
            Method::GroupBy,
        ])
        .with_roles::<AdminRole, AdminRole>(&state)
        .router()
        .route("/api-keys", post(issue_api_key))
        .route("/api-keys/{id}", delete(revoke_api_key))
        .with_state(state)
}

async fn issue_api_key(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Json(body): Json<IssueApiKey>,
) -> ApiResult<IssuedApiKey> {
    let service = ServiceContext::from_state(state.as_ref()).api_key();
    let (api_key, key) = service.issue(body).await?;
    JsonApiResponse::created(IssuedApiKey { api_key, key })
}

async fn revoke_api_key(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let service = ServiceContext::from_state(state.as_ref()).api_key();
    service.revoke(id).await?;
    JsonApiResponse::deleted()
}
