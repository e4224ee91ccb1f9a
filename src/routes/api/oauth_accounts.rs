use std::sync::Arc;

use axum::Router;

use crate::{auth::AdminRole, routes::CrudApiRouter, services::ServiceContext, state::AppState};

pub fn router(state: Arc<AppState>) -> Router {
    let service = ServiceContext::from_state(state.as_ref()).oauth_account();
    CrudApiRouter::new(service, "/oauth-accounts")
        .with_roles::<AdminRole, AdminRole>(&state)
        .router()
}
