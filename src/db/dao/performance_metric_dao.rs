use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Select};
use uuid::Uuid;

use super::DaoBase;
use crate::db::entities::performance_metric;
use crate::db::entities::prelude::PerformanceMetric;

#[derive(Clone)]
pub struct PerformanceMetricDao {
    db: DatabaseConnection,
}

impl DaoBase for PerformanceMetricDao {
    type Entity = PerformanceMetric;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PerformanceMetricDao {
    /// Matches the `(employee_id, date, station_id)` key; a missing station
    /// matches only rows without one.
    pub fn by_key(
        employee_id: Uuid,
        date: NaiveDate,
        station_id: Option<Uuid>,
    ) -> impl FnOnce(Select<PerformanceMetric>) -> Select<PerformanceMetric> + Send {
        move |query| {
            let query = query
                .filter(performance_metric::Column::EmployeeId.eq(employee_id))
                .filter(performance_metric::Column::Date.eq(date));
            match station_id {
                Some(station_id) => {
                    query.filter(performance_metric::Column::StationId.eq(station_id))
                }
                None => query.filter(performance_metric::Column::StationId.is_null()),
            }
        }
    }
}
