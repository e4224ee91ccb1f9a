use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{
    api_keys, auth, clock, employees, oauth_accounts, performance, public, sessions, stations,
    task_assignments, task_types, time_logs, todos, users,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(public::router())
        .merge(auth::router(state.clone()))
        .merge(stations::router(state.clone()))
        .merge(task_types::router(state.clone()))
        .merge(task_assignments::router(state.clone()))
        .merge(employees::router(state.clone()))
        .merge(clock::router(state.clone()))
        .merge(time_logs::router(state.clone()))
        .merge(performance::router(state.clone()))
        .merge(users::router(state.clone()))
        .merge(api_keys::router(state.clone()))
        .merge(sessions::router(state.clone()))
        .merge(oauth_accounts::router(state.clone()))
        .merge(todos::router(state))
}
