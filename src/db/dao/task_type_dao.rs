use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, QueryFilter};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::prelude::TaskType;
use crate::db::entities::task_type;

#[derive(Clone)]
pub struct TaskTypeDao {
    db: DatabaseConnection,
}

impl DaoBase for TaskTypeDao {
    type Entity = TaskType;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl TaskTypeDao {
    pub async fn find_many_by_ids_on<C>(
        conn: &C,
        ids: Vec<Uuid>,
    ) -> DaoResult<Vec<task_type::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Self::find_all_on(conn, move |query| {
            query.filter(task_type::Column::Id.is_in(ids))
        })
        .await
    }
}
