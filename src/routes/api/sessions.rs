use std::sync::Arc;

use axum::Router;

use crate::{
    auth::AdminRole,
    routes::{CrudApiRouter, Method},
    services::ServiceContext,
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    let service = ServiceContext::from_state(state.as_ref()).session();
    CrudApiRouter::new(service, "/sessions")
        .set_allowed_methods(&[
            Method::List,
            Method::Get,
            Method::Count,
            Method::Aggregate,
            Method::GroupBy,
            Method::Delete,
        ])
        .with_roles::<AdminRole, AdminRole>(&state)
        .router()
}
