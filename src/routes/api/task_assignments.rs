use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{AnyRole, ManagerRole, WorkerRole},
    db::entities::task_assignment,
    middleware::AuthRoleGuard,
    response::{ApiResult, JsonApiResponse},
    routes::{CrudApiRouter, base_api_router::READ_METHODS},
    services::{ServiceContext, task_assignment_service::StartAssignment},
    state::AppState,
};

const BASE_PATH: &str = "/task-assignments";

#[derive(Debug, Deserialize)]
pub struct UnitsRequest {
    pub units: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    pub units: Option<i32>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let service = ServiceContext::from_state(state.as_ref()).task_assignment();
    CrudApiRouter::new(service, BASE_PATH)
        .set_allowed_methods(&READ_METHODS)
        .with_roles::<AnyRole, ManagerRole>(&state)
        .router()
        .route("/task-assignments/start", post(start_assignment))
        .route("/task-assignments/{id}/units", put(record_units))
        .route("/task-assignments/{id}/complete", post(complete_assignment))
        .with_state(state)
}

async fn start_assignment(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<WorkerRole>,
    Json(body): Json<StartAssignment>,
) -> ApiResult<task_assignment::Model> {
    let service = ServiceContext::from_state(state.as_ref()).task_assignment();
    let assignment = service.start_assignment(body).await?;
    JsonApiResponse::created(assignment)
}

async fn record_units(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<WorkerRole>,
    Path(id): Path<Uuid>,
    Json(body): Json<UnitsRequest>,
) -> ApiResult<task_assignment::Model> {
    let service = ServiceContext::from_state(state.as_ref()).task_assignment();
    let assignment = service.record_units(id, body.units).await?;
    JsonApiResponse::ok(assignment)
}

async fn complete_assignment(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<WorkerRole>,
    Path(id): Path<Uuid>,
    Json(body): Json<CompleteRequest>,
) -> ApiResult<task_assignment::Model> {
    let service = ServiceContext::from_state(state.as_ref()).task_assignment();
    let assignment = service.complete_assignment(id, body.units).await?;
    JsonApiResponse::ok(assignment)
}
