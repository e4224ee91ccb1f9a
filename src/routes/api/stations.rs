use std::sync::Arc;

use axum::Router;

use crate::{
    auth::{AnyRole, ManagerRole},
    routes::CrudApiRouter,
    services::ServiceContext,
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    let service = ServiceContext::from_state(state.as_ref()).station();
    CrudApiRouter::new(service, "/stations")
        .with_roles::<AnyRole, ManagerRole>(&state)
        .router()
}
