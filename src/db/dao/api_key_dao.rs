use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::api_key;
use crate::db::entities::prelude::ApiKey;

#[derive(Clone)]
pub struct ApiKeyDao {
    db: DatabaseConnection,
}

impl DaoBase for ApiKeyDao {
    type Entity = ApiKey;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl ApiKeyDao {
    pub async fn find_by_key(&self, key: &str) -> DaoResult<Option<api_key::Model>> {
        let key = key.to_string();
        self.find_first(move |query| query.filter(api_key::Column::Key.eq(key)))
            .await
    }

    pub async fn create_key(
        &self,
        user_id: Uuid,
        name: &str,
        key: &str,
        expires_at: Option<chrono::DateTime<chrono::FixedOffset>>,
    ) -> DaoResult<api_key::Model> {
        let model = api_key::ActiveModel {
            name: Set(name.to_string()),
            key: Set(key.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            last_used_at: Set(None),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn touch_last_used(&self, id: Uuid) -> DaoResult<api_key::Model> {
        let now = Utc::now().fixed_offset();
        self.update(id, move |active| {
            active.last_used_at = Set(Some(now));
        })
        .await
    }
}
