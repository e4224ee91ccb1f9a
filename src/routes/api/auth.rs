use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{Claims, Role},
    db::entities::user,
    response::{ApiResult, JsonApiResponse},
    services::{ServiceContext, auth_service::SessionToken},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: user::Model,
    pub roles: Vec<Role>,
    pub session_id: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/session", post(open_session).delete(close_session))
        .route("/me", get(me))
        .with_state(state)
}

async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SessionRequest>,
) -> ApiResult<SessionToken> {
    let services = ServiceContext::from_state(state.as_ref());
    let token = services
        .auth(&state.jwt)
        .login_with_api_key(body.api_key.trim())
        .await?;
    JsonApiResponse::created(token)
}

async fn close_session(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> ApiResult<serde_json::Value> {
    let services = ServiceContext::from_state(state.as_ref());
    services.auth(&state.jwt).logout(&claims).await?;
    JsonApiResponse::deleted()
}

async fn me(State(state): State<Arc<AppState>>, claims: Claims) -> ApiResult<MeResponse> {
    let services = ServiceContext::from_state(state.as_ref());
    let user = services.auth(&state.jwt).me(&claims).await?;
    JsonApiResponse::ok(MeResponse {
        user,
        roles: claims.roles,
        session_id: claims.sid,
    })
}
