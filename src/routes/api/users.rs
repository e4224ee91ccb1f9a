use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AdminRole,
    db::entities::{UserRole, oauth_account, user},
    middleware::AuthRoleGuard,
    response::{ApiResult, JsonApiResponse},
    routes::CrudApiRouter,
    services::{ServiceContext, oauth_account_service::LinkAccount},
    state::AppState,
};

const BASE_PATH: &str = "/users";

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: UserRole,
}

pub fn router(state: Arc<AppState>) -> Router {
    let service = ServiceContext::from_state(state.as_ref()).user();
    CrudApiRouter::new(service, BASE_PATH)
        .with_roles::<AdminRole, AdminRole>(&state)
        .router()
        .route("/users/{id}/role", put(set_user_role))
        .route("/users/{id}/oauth-accounts", post(link_oauth_account))
        .with_state(state)
}

async fn set_user_role(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(id): Path<Uuid>,
    Json(body): Json<RoleRequest>,
) -> ApiResult<user::Model> {
    let service = ServiceContext::from_state(state.as_ref()).user();
    let updated = service.set_role(id, body.role).await?;
    JsonApiResponse::ok(updated)
}

async fn link_oauth_account(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(id): Path<Uuid>,
    Json(body): Json<LinkAccount>,
) -> ApiResult<oauth_account::Model> {
    let service = ServiceContext::from_state(state.as_ref()).oauth_account();
    let account = service.link(id, body).await?;
    JsonApiResponse::ok(account)
}
