use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::prelude::TaskAssignment;
use crate::db::entities::task_assignment;

#[derive(Clone)]
pub struct TaskAssignmentDao {
    db: DatabaseConnection,
}

impl DaoBase for TaskAssignmentDao {
    type Entity = TaskAssignment;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl TaskAssignmentDao {
    pub async fn find_open_for_employee_on<C>(
        conn: &C,
        employee_id: Uuid,
    ) -> DaoResult<Option<task_assignment::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        Self::find_first_on(conn, move |query| {
            query
                .filter(task_assignment::Column::EmployeeId.eq(employee_id))
                .filter(task_assignment::Column::EndTime.is_null())
        })
        .await
    }

    /// Assignments of one employee started inside `[from, to)`.
    pub async fn find_started_between_on<C>(
        conn: &C,
        employee_id: Uuid,
        from: DateTimeWithTimeZone,
        to: DateTimeWithTimeZone,
    ) -> DaoResult<Vec<task_assignment::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        Self::find_all_on(conn, move |query| {
            query
                .filter(task_assignment::Column::EmployeeId.eq(employee_id))
                .filter(task_assignment::Column::StartTime.gte(from))
                .filter(task_assignment::Column::StartTime.lt(to))
                .order_by_asc(task_assignment::Column::StartTime)
        })
        .await
    }
}
