use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::prelude::Session;
use crate::db::entities::session;

#[derive(Clone)]
pub struct SessionDao {
    db: DatabaseConnection,
}

impl DaoBase for SessionDao {
    type Entity = Session;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl SessionDao {
    pub async fn open(
        &self,
        user_id: Uuid,
        expires_at: DateTime<FixedOffset>,
    ) -> DaoResult<session::Model> {
        let model = session::ActiveModel {
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn purge_expired(&self) -> DaoResult<u64> {
        let now = Utc::now().fixed_offset();
        self.delete_many(move |query| query.filter(session::Column::ExpiresAt.lte(now)))
            .await
    }
}
