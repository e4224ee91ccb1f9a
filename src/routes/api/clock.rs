use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::WorkerRole,
    db::entities::time_log,
    middleware::AuthRoleGuard,
    response::{ApiResult, JsonApiResponse},
    services::{ServiceContext, clock_service::ClockIn},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct EmployeeRequest {
    pub employee_id: Uuid,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/clock/in", post(clock_in))
        .route("/clock/out", post(clock_out))
        .route("/clock/break/start", post(start_break))
        .route("/clock/break/end", post(end_break))
        .with_state(state)
}

async fn clock_in(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<WorkerRole>,
    Json(body): Json<ClockIn>,
) -> ApiResult<time_log::Model> {
    let clock = ServiceContext::from_state(state.as_ref()).clock();
    let log = clock.clock_in(body).await?;
    JsonApiResponse::created(log)
}

async fn clock_out(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<WorkerRole>,
    Json(body): Json<EmployeeRequest>,
) -> ApiResult<time_log::Model> {
    let clock = ServiceContext::from_state(state.as_ref()).clock();
    let log = clock.clock_out(body.employee_id).await?;
    JsonApiResponse::ok(log)
}

async fn start_break(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<WorkerRole>,
    Json(body): Json<EmployeeRequest>,
) -> ApiResult<time_log::Model> {
    let clock = ServiceContext::from_state(state.as_ref()).clock();
    let log = clock.start_break(body.employee_id).await?;
    JsonApiResponse::created(log)
}

async fn end_break(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<WorkerRole>,
    Json(body): Json<EmployeeRequest>,
) -> ApiResult<time_log::Model> {
    let clock = ServiceContext::from_state(state.as_ref()).clock();
    let log = clock.end_break(body.employee_id).await?;
    JsonApiResponse::ok(log)
}
