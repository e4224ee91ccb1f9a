use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;

use crate::{
    auth::{AnyRole, WorkerRole},
    db::entities::todo,
    middleware::AuthRoleGuard,
    response::{ApiResult, JsonApiResponse},
    routes::{CrudApiRouter, Method},
    services::ServiceContext,
    state::AppState,
};

const BASE_PATH: &str = "/todos";

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let service = ServiceContext::from_state(state.as_ref()).todo();
    CrudApiRouter::new(service, BASE_PATH)
        .set_allowed_methods(&[
            Method::List,
            Method::Get,
            Method::Patch,
            Method::Delete,
            Method::Count,
            Method::Aggregate,
            Method::GroupBy,
        ])
        .with_roles::<AnyRole, WorkerRole>(&state)
        .router()
        .route("/todos", post(create_todo))
        .with_state(state)
}

async fn create_todo(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<WorkerRole>,
    Json(body): Json<CreateTodoRequest>,
) -> ApiResult<todo::Model> {
    let service = ServiceContext::from_state(state.as_ref()).todo();
    let todo = service.create_todo(&body.title).await?;
    JsonApiResponse::created(todo)
}
