use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};

use crate::{
    auth::{ManagerRole, ReportRole},
    db::entities::performance_metric,
    middleware::AuthRoleGuard,
    response::{ApiResult, JsonApiResponse},
    routes::{CrudApiRouter, base_api_router::READ_METHODS},
    services::{ServiceContext, performance_service::RollupRequest},
    state::AppState,
};

const BASE_PATH: &str = "/performance-metrics";

pub fn router(state: Arc<AppState>) -> Router {
    let service = ServiceContext::from_state(state.as_ref()).performance();
    CrudApiRouter::new(service, BASE_PATH)
        .set_allowed_methods(&READ_METHODS)
        .with_roles::<ReportRole, ManagerRole>(&state)
        .router()
        .route("/performance/rollup", post(rollup))
        .with_state(state)
}

async fn rollup(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<ReportRole>,
    Json(body): Json<RollupRequest>,
) -> ApiResult<performance_metric::Model> {
    let service = ServiceContext::from_state(state.as_ref()).performance();
    let metric = service.rollup(body).await?;
    JsonApiResponse::ok(metric)
}
