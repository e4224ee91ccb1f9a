use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::Set;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::dao::{
        DaoBase, DaoContext, PerformanceMetricDao, TaskAssignmentDao, TaskTypeDao, TimeLogDao,
    },
    db::entities::{TimeLogType, performance_metric, task_assignment, task_type, time_log},
    error::AppError,
    services::crud_service::{CrudErrors, CrudService, not_found_as},
    timekeeping::{self, Window},
};

#[derive(Debug, Clone, Deserialize)]
pub struct RollupRequest {
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub station_id: Option<Uuid>,
    pub quality_score: Option<f64>,
}

/// Figures written into one metric row.
#[derive(Debug, Clone, PartialEq)]
pub struct DayFigures {
    pub hours_worked: f64,
    pub units_processed: i32,
    pub efficiency: Option<f64>,
    pub overtime_hours: f64,
}

/// Work logs, assignments and their task types of one employee-day, reduced
/// to the numbers a metric row stores. With a station, only logs at that
/// station and assignments of its task types count.
pub fn day_figures(
    logs: &[time_log::Model],
    assignments: &[task_assignment::Model],
    task_types: &[task_type::Model],
    station_id: Option<Uuid>,
    window: &Window,
    daily_limit: f64,
    now: DateTime<Utc>,
) -> DayFigures {
    let logs: Vec<time_log::Model> = logs
        .iter()
        .filter(|log| station_id.is_none() || log.station_id == station_id)
        .cloned()
        .collect();
    let hours_worked = timekeeping::worked_hours(&logs, window, now);

    let types: HashMap<Uuid, &task_type::Model> =
        task_types.iter().map(|kind| (kind.id, kind)).collect();
    let counted = assignments.iter().filter_map(|assignment| {
        let kind = types.get(&assignment.task_type_id)?;
        match station_id {
            Some(station_id) if kind.station_id != station_id => None,
            _ => Some((assignment.units_completed, kind.estimated_minutes_per_unit)),
        }
    });

    let mut units_processed = 0i32;
    let mut expected: Option<f64> = None;
    for (units, minutes_per_unit) in counted {
        units_processed = units_processed.saturating_add(units.max(0));
        if let Some(hours) = timekeeping::expected_hours(units, minutes_per_unit) {
            expected = Some(expected.unwrap_or_default() + hours);
        }
    }

    DayFigures {
        hours_worked,
        units_processed,
        efficiency: timekeeping::ratio(expected, hours_worked),
        overtime_hours: (hours_worked - daily_limit).max(0.0),
    }
}

#[derive(Clone)]
pub struct PerformanceService {
    metric_dao: PerformanceMetricDao,
    daos: DaoContext,
}

impl PerformanceService {
    pub fn new(daos: DaoContext) -> Self {
        Self {
            metric_dao: daos.performance_metric(),
            daos,
        }
    }

    /// Recomputes one employee-day (optionally per station) and upserts the
    /// metric row inside a single transaction.
    pub async fn rollup(
        &self,
        request: RollupRequest,
    ) -> Result<performance_metric::Model, AppError> {
        if let Some(score) = request.quality_score
            && !(0.0..=100.0).contains(&score)
        {
            return Err(AppError::bad_request(
                "quality_score must be between 0 and 100",
            ));
        }

        let employee = self
            .daos
            .employee()
            .find_by_id(request.employee_id)
            .await
            .map_err(not_found_as("Employee not found"))?;
        if let Some(station_id) = request.station_id {
            self.daos
                .station()
                .find_by_id(station_id)
                .await
                .map_err(not_found_as("Station not found"))?;
        }

        let window = Window::day(request.date);
        let daily_limit = employee.daily_hours_limit;
        let RollupRequest {
            employee_id,
            date,
            station_id,
            quality_score,
        } = request;

        let metric = self
            .daos
            .transaction(move |txn| {
                Box::pin(async move {
                    let from = window.start.fixed_offset();
                    let to = window.end.fixed_offset();
                    let logs = TimeLogDao::find_in_window_on(
                        txn,
                        employee_id,
                        Some(TimeLogType::Work),
                        from,
                        to,
                    )
                    .await?;
                    let assignments =
                        TaskAssignmentDao::find_started_between_on(txn, employee_id, from, to)
                            .await?;
                    let mut type_ids: Vec<Uuid> = assignments
                        .iter()
                        .map(|assignment| assignment.task_type_id)
                        .collect();
                    type_ids.sort_unstable();
                    type_ids.dedup();
                    let task_types = TaskTypeDao::find_many_by_ids_on(txn, type_ids).await?;

                    let figures = day_figures(
                        &logs,
                        &assignments,
                        &task_types,
                        station_id,
                        &window,
                        daily_limit,
                        Utc::now(),
                    );

                    let create = performance_metric::ActiveModel {
                        employee_id: Set(employee_id),
                        date: Set(date),
                        station_id: Set(station_id),
                        hours_worked: Set(figures.hours_worked),
                        units_processed: Set(figures.units_processed),
                        efficiency: Set(figures.efficiency),
                        quality_score: Set(quality_score),
                        overtime_hours: Set(figures.overtime_hours),
                        ..Default::default()
                    };
                    PerformanceMetricDao::upsert_on(
                        txn,
                        PerformanceMetricDao::by_key(employee_id, date, station_id),
                        create,
                        move |active| {
                            active.hours_worked = Set(figures.hours_worked);
                            active.units_processed = Set(figures.units_processed);
                            active.efficiency = Set(figures.efficiency);
                            active.overtime_hours = Set(figures.overtime_hours);
                            if quality_score.is_some() {
                                active.quality_score = Set(quality_score);
                            }
                        },
                    )
                    .await
                })
            })
            .await?;

        tracing::info!(
            employee_id = %metric.employee_id,
            date = %metric.date,
            hours_worked = metric.hours_worked,
            "performance rollup stored"
        );
        Ok(metric)
    }
}

impl CrudService for PerformanceService {
    type Dao = PerformanceMetricDao;

    fn dao(&self) -> &Self::Dao {
        &self.metric_dao
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Performance metric not found",
            conflict: "A metric for this employee, date and station already exists",
            ..CrudErrors::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{PerformanceService, RollupRequest, day_figures};
    use crate::{
        db::dao::DaoContext,
        db::entities::{TimeLogType, employee, time_log},
        error::AppError,
        test_helpers::fixtures,
        timekeeping::Window,
    };

    fn closed_log(employee_id: Uuid, station_id: Option<Uuid>, hours: i64) -> time_log::Model {
        let mut log = fixtures::open_log(Uuid::new_v4(), employee_id, TimeLogType::Work);
        log.station_id = station_id;
        log.start_time = fixtures::ts() + Duration::hours(8);
        log.end_time = Some(log.start_time + Duration::hours(hours));
        log
    }

    #[test]
    fn figures_sum_units_and_efficiency() {
        let employee_id = Uuid::new_v4();
        let station_id = Uuid::new_v4();
        let kind = fixtures::task_type(Uuid::new_v4(), station_id);
        let mut first = fixtures::assignment(Uuid::new_v4(), employee_id, kind.id);
        first.units_completed = 30;
        let mut second = fixtures::assignment(Uuid::new_v4(), employee_id, kind.id);
        second.units_completed = 10;

        let figures = day_figures(
            &[closed_log(employee_id, Some(station_id), 5)],
            &[first, second],
            &[kind],
            None,
            &Window::day(fixtures::date()),
            8.0,
            Utc::now(),
        );

        assert_eq!(figures.units_processed, 40);
        assert_eq!(figures.hours_worked, 5.0);
        // 40 units at 6 minutes each: 4 expected hours over 5 worked.
        assert_eq!(figures.efficiency, Some(0.8));
        assert_eq!(figures.overtime_hours, 0.0);
    }

    #[test]
    fn station_filter_drops_other_stations() {
        let employee_id = Uuid::new_v4();
        let here = Uuid::new_v4();
        let elsewhere = Uuid::new_v4();
        let local = fixtures::task_type(Uuid::new_v4(), here);
        let remote = fixtures::task_type(Uuid::new_v4(), elsewhere);
        let mut counted = fixtures::assignment(Uuid::new_v4(), employee_id, local.id);
        counted.units_completed = 5;
        let mut ignored = fixtures::assignment(Uuid::new_v4(), employee_id, remote.id);
        ignored.units_completed = 50;

        let figures = day_figures(
            &[
                closed_log(employee_id, Some(here), 2),
                closed_log(employee_id, Some(elsewhere), 3),
            ],
            &[counted, ignored],
            &[local, remote],
            Some(here),
            &Window::day(fixtures::date()),
            8.0,
            Utc::now(),
        );

        assert_eq!(figures.units_processed, 5);
        assert_eq!(figures.hours_worked, 2.0);
    }

    #[test]
    fn overtime_is_excess_over_daily_limit() {
        let employee_id = Uuid::new_v4();

        let figures = day_figures(
            &[closed_log(employee_id, None, 10)],
            &[],
            &[],
            None,
            &Window::day(fixtures::date()),
            8.0,
            Utc::now(),
        );

        assert_eq!(figures.overtime_hours, 2.0);
        assert_eq!(figures.efficiency, None);
    }

    #[tokio::test]
    async fn rollup_rejects_out_of_range_quality() {
        let service = PerformanceService::new(DaoContext::new(
            &MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        ));

        let err = service
            .rollup(RollupRequest {
                employee_id: Uuid::new_v4(),
                date: fixtures::date(),
                station_id: None,
                quality_score: Some(140.0),
            })
            .await
            .expect_err("score out of range should fail");

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn rollup_requires_employee() {
        let service = PerformanceService::new(DaoContext::new(
            &MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<employee::Model>::new()])
                .into_connection(),
        ));

        let err = service
            .rollup(RollupRequest {
                employee_id: Uuid::new_v4(),
                date: fixtures::date(),
                station_id: None,
                quality_score: None,
            })
            .await
            .expect_err("unknown employee should fail");

        assert_eq!(err.message(), "Employee not found");
    }
}
