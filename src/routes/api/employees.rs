use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{AnyRole, ManagerRole, ReportRole},
    db::entities::employee,
    middleware::AuthRoleGuard,
    response::{ApiResult, JsonApiResponse},
    routes::{CrudApiRouter, Method},
    services::{
        ServiceContext,
        employee_service::{EmployeePatch, NewEmployee},
    },
    state::AppState,
    timekeeping::{HoursSummary, Period},
};

const BASE_PATH: &str = "/employees";

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub pin: String,
}

#[derive(Debug, Deserialize)]
pub struct HoursQuery {
    pub period: Option<Period>,
    pub date: Option<NaiveDate>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let service = ServiceContext::from_state(state.as_ref()).employee();
    CrudApiRouter::new(service, BASE_PATH)
        .set_allowed_methods(&[
            Method::List,
            Method::Get,
            Method::Count,
            Method::Aggregate,
            Method::GroupBy,
            Method::Delete,
        ])
        .with_roles::<AnyRole, ManagerRole>(&state)
        .router()
        .route("/employees", post(create_employee))
        .route("/employees/{id}", patch(update_employee))
        .route("/employees/{id}/pin", put(set_pin))
        .route("/employees/{id}/hours", get(hours_summary))
        .with_state(state)
}

async fn create_employee(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<ManagerRole>,
    Json(body): Json<NewEmployee>,
) -> ApiResult<employee::Model> {
    let service = ServiceContext::from_state(state.as_ref()).employee();
    let employee = service.create_employee(body).await?;
    JsonApiResponse::created(employee)
}

async fn update_employee(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<ManagerRole>,
    Path(id): Path<Uuid>,
    Json(body): Json<EmployeePatch>,
) -> ApiResult<employee::Model> {
    let service = ServiceContext::from_state(state.as_ref()).employee();
    let employee = service.update_employee(id, body).await?;
    JsonApiResponse::ok(employee)
}

async fn set_pin(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<ManagerRole>,
    Path(id): Path<Uuid>,
    Json(body): Json<PinRequest>,
) -> ApiResult<employee::Model> {
    let service = ServiceContext::from_state(state.as_ref()).employee();
    let employee = service.set_pin(id, &body.pin).await?;
    JsonApiResponse::ok(employee)
}

async fn hours_summary(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<ReportRole>,
    Path(id): Path<Uuid>,
    Query(query): Query<HoursQuery>,
) -> ApiResult<HoursSummary> {
    let period = query.period.unwrap_or(Period::Day);
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let clock = ServiceContext::from_state(state.as_ref()).clock();
    let summary = clock.hours_summary(id, period, date).await?;
    JsonApiResponse::ok(summary)
}
