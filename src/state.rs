use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{auth::jwt::JwtKeys, config::AppConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub jwt: JwtKeys,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection, jwt: JwtKeys) -> Arc<Self> {
        Arc::new(Self { config, db, jwt })
    }
}
