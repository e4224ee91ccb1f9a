use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, patch, post},
};
use uuid::Uuid;

use crate::{
    auth::{AnyRole, ManagerRole},
    db::entities::time_log,
    middleware::AuthRoleGuard,
    response::{ApiResult, JsonApiResponse},
    routes::{CrudApiRouter, base_api_router::READ_METHODS},
    services::{
        ServiceContext,
        clock_service::{Correction, ManualLog},
    },
    state::AppState,
};

const BASE_PATH: &str = "/time-logs";

pub fn router(state: Arc<AppState>) -> Router {
    let service = ServiceContext::from_state(state.as_ref()).time_log();
    CrudApiRouter::new(service, BASE_PATH)
        .set_allowed_methods(&READ_METHODS)
        .with_roles::<AnyRole, ManagerRole>(&state)
        .router()
        .route("/time-logs/manual", post(create_manual))
        .route("/time-logs/{id}", delete(soft_delete))
        .route("/time-logs/{id}/correct", patch(correct))
        .route("/time-logs/{id}/restore", post(restore))
        .with_state(state)
}

async fn create_manual(
    State(state): State<Arc<AppState>>,
    guard: AuthRoleGuard<ManagerRole>,
    Json(body): Json<ManualLog>,
) -> ApiResult<time_log::Model> {
    let created_by = guard.claims.user_id()?;
    let clock = ServiceContext::from_state(state.as_ref()).clock();
    let log = clock.create_manual(body, created_by).await?;
    JsonApiResponse::created(log)
}

async fn correct(
    State(state): State<Arc<AppState>>,
    guard: AuthRoleGuard<ManagerRole>,
    Path(id): Path<Uuid>,
    Json(body): Json<Correction>,
) -> ApiResult<time_log::Model> {
    let corrected_by = guard.claims.user_id()?;
    let clock = ServiceContext::from_state(state.as_ref()).clock();
    let log = clock.correct(id, body, corrected_by).await?;
    JsonApiResponse::ok(log)
}

async fn soft_delete(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<ManagerRole>,
    Path(id): Path<Uuid>,
) -> ApiResult<time_log::Model> {
    let clock = ServiceContext::from_state(state.as_ref()).clock();
    let log = clock.soft_delete(id).await?;
    JsonApiResponse::with_status(StatusCode::OK, "deleted", log)
}

async fn restore(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<ManagerRole>,
    Path(id): Path<Uuid>,
) -> ApiResult<time_log::Model> {
    let clock = ServiceContext::from_state(state.as_ref()).clock();
    let log = clock.restore(id).await?;
    JsonApiResponse::ok(log)
}
