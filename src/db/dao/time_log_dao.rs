use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, QueryFilter, QueryOrder, Select,
};
use uuid::Uuid;

use super::soft_delete::visible;
use super::{DaoBase, DaoResult};
use crate::db::entities::prelude::TimeLog;
use crate::db::entities::{TimeLogType, time_log};

#[derive(Clone)]
pub struct TimeLogDao {
    db: DatabaseConnection,
}

impl DaoBase for TimeLogDao {
    type Entity = TimeLog;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn open_logs(
    employee_id: Uuid,
    log_type: TimeLogType,
) -> impl FnOnce(Select<TimeLog>) -> Select<TimeLog> + Send {
    move |query| {
        visible(query)
            .filter(time_log::Column::EmployeeId.eq(employee_id))
            .filter(time_log::Column::LogType.eq(log_type))
            .filter(time_log::Column::EndTime.is_null())
    }
}

impl TimeLogDao {
    pub async fn find_open_on<C>(
        conn: &C,
        employee_id: Uuid,
        log_type: TimeLogType,
    ) -> DaoResult<Option<time_log::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        Self::find_first_on(conn, open_logs(employee_id, log_type)).await
    }

    pub async fn find_open(
        &self,
        employee_id: Uuid,
        log_type: TimeLogType,
    ) -> DaoResult<Option<time_log::Model>> {
        Self::find_open_on(self.db(), employee_id, log_type).await
    }

    /// Open WORK logs currently held at a station.
    pub async fn count_open_work_at_station_on<C>(conn: &C, station_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        Self::count_on(conn, move |query| {
            visible(query)
                .filter(time_log::Column::StationId.eq(station_id))
                .filter(time_log::Column::LogType.eq(TimeLogType::Work))
                .filter(time_log::Column::EndTime.is_null())
        })
        .await
    }

    /// Visible logs of one employee touching `[from, to)`, oldest first.
    /// Open logs are always included when they started before `to`.
    pub async fn find_in_window_on<C>(
        conn: &C,
        employee_id: Uuid,
        log_type: Option<TimeLogType>,
        from: DateTimeWithTimeZone,
        to: DateTimeWithTimeZone,
    ) -> DaoResult<Vec<time_log::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        Self::find_all_on(conn, move |query| {
            let query = visible(query)
                .filter(time_log::Column::EmployeeId.eq(employee_id))
                .filter(time_log::Column::StartTime.lt(to))
                .filter(
                    Condition::any()
                        .add(time_log::Column::EndTime.is_null())
                        .add(time_log::Column::EndTime.gt(from)),
                );
            let query = match log_type {
                Some(log_type) => query.filter(time_log::Column::LogType.eq(log_type)),
                None => query,
            };
            query.order_by_asc(time_log::Column::StartTime)
        })
        .await
    }

    pub async fn find_in_window(
        &self,
        employee_id: Uuid,
        log_type: Option<TimeLogType>,
        from: DateTimeWithTimeZone,
        to: DateTimeWithTimeZone,
    ) -> DaoResult<Vec<time_log::Model>> {
        Self::find_in_window_on(self.db(), employee_id, log_type, from, to).await
    }
}
