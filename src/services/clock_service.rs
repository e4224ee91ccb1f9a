//! Clock-in/out, breaks and manual corrections of time logs.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, IsolationLevel, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::pin,
    config::WorkforceConfig,
    db::dao::{
        DaoBase, DaoContext, DaoLayerError, DaoResult, EmployeeDao, SoftDeleteDao,
        TaskAssignmentDao, TimeLogDao,
    },
    db::entities::{ClockMethod, EmployeeStatus, TimeLogType, employee, station, time_log},
    db::transaction::TransactionOptions,
    error::AppError,
    services::crud_service::not_found_as,
    timekeeping::{self, HoursSummary, Interval, Period, Window},
};

const EMPLOYEE_NOT_FOUND: &str = "Employee not found";
const TIME_LOG_NOT_FOUND: &str = "Time log not found";

#[derive(Debug, Clone, Deserialize)]
pub struct ClockIn {
    pub employee_id: Uuid,
    pub station_id: Option<Uuid>,
    #[serde(default = "default_method")]
    pub method: ClockMethod,
    pub pin: Option<String>,
}

fn default_method() -> ClockMethod {
    ClockMethod::Pin
}

#[derive(Debug, Clone, Deserialize)]
pub struct Correction {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualLog {
    pub employee_id: Uuid,
    pub station_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub log_type: TimeLogType,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct ClockService {
    daos: DaoContext,
    workforce: WorkforceConfig,
}

/// A rule check run inside a transaction: the outer error is a database
/// failure and rolls back, the inner one refuses the request.
type Checked<T> = DaoResult<Result<T, AppError>>;

/// Capacity, open-log and daily-limit checks of a clock-in, then the insert,
/// all on one transaction.
async fn open_work_log(
    txn: &DatabaseTransaction,
    employee_id: Uuid,
    station: Option<station::Model>,
    method: ClockMethod,
    daily_limit: Option<f64>,
    now: DateTime<Utc>,
) -> Checked<time_log::Model> {
    if let Some(station) = &station
        && let Some(capacity) = station.capacity
    {
        let occupied = TimeLogDao::count_open_work_at_station_on(txn, station.id).await?;
        if occupied >= u64::try_from(capacity).unwrap_or_default() {
            return Ok(Err(AppError::unprocessable("Station is at capacity")));
        }
    }

    if TimeLogDao::find_open_on(txn, employee_id, TimeLogType::Work)
        .await?
        .is_some()
    {
        return Ok(Err(AppError::unprocessable(
            "Employee is already clocked in",
        )));
    }

    if let Some(limit) = daily_limit {
        let window = Window::day(now.date_naive());
        let logs = TimeLogDao::find_in_window_on(
            txn,
            employee_id,
            Some(TimeLogType::Work),
            window.start.fixed_offset(),
            window.end.fixed_offset(),
        )
        .await?;
        if timekeeping::worked_hours(&logs, &window, now) >= limit {
            return Ok(Err(AppError::unprocessable(format!(
                "Daily hours limit of {limit} reached"
            ))));
        }
    }

    let task_id = TaskAssignmentDao::find_open_for_employee_on(txn, employee_id)
        .await?
        .map(|assignment| assignment.id);
    let station_id = station.map(|station| station.id);
    let log = TimeLogDao::create_on(
        txn,
        time_log::ActiveModel {
            employee_id: Set(employee_id),
            station_id: Set(station_id),
            log_type: Set(TimeLogType::Work),
            start_time: Set(now.fixed_offset()),
            end_time: Set(None),
            note: Set(None),
            corrected_by: Set(None),
            task_id: Set(task_id),
            clock_method: Set(method),
            deleted_at: Set(None),
            ..Default::default()
        },
    )
    .await?;

    if station_id.is_some() {
        EmployeeDao::set_last_station_on(txn, employee_id, station_id).await?;
    }
    Ok(Ok(log))
}

async fn open_break_log(
    txn: &DatabaseTransaction,
    employee_id: Uuid,
    started: DateTime<FixedOffset>,
) -> Checked<time_log::Model> {
    let Some(work) = TimeLogDao::find_open_on(txn, employee_id, TimeLogType::Work).await? else {
        return Ok(Err(AppError::unprocessable("Employee is not clocked in")));
    };
    if TimeLogDao::find_open_on(txn, employee_id, TimeLogType::Break)
        .await?
        .is_some()
    {
        return Ok(Err(AppError::unprocessable(
            "Employee is already on a break",
        )));
    }

    let log = TimeLogDao::create_on(
        txn,
        time_log::ActiveModel {
            employee_id: Set(employee_id),
            station_id: Set(work.station_id),
            log_type: Set(TimeLogType::Break),
            start_time: Set(started),
            end_time: Set(None),
            note: Set(None),
            corrected_by: Set(None),
            task_id: Set(None),
            clock_method: Set(work.clock_method),
            deleted_at: Set(None),
            ..Default::default()
        },
    )
    .await?;
    Ok(Ok(log))
}

fn interval_of(log: &time_log::Model) -> Interval {
    Interval::new(
        log.start_time.with_timezone(&Utc),
        log.end_time.map(|end| end.with_timezone(&Utc)),
    )
}

impl ClockService {
    pub fn new(daos: DaoContext, workforce: WorkforceConfig) -> Self {
        Self { daos, workforce }
    }

    fn time_logs(&self) -> TimeLogDao {
        self.daos.time_log()
    }

    fn serializable(&self) -> TransactionOptions {
        self.daos
            .transaction_options()
            .with_isolation(IsolationLevel::Serializable)
    }

    async fn find_employee(&self, id: Uuid) -> Result<employee::Model, AppError> {
        self.daos
            .employee()
            .find_by_id(id)
            .await
            .map_err(not_found_as(EMPLOYEE_NOT_FOUND))
    }

    async fn open_log(
        &self,
        employee_id: Uuid,
        log_type: TimeLogType,
    ) -> Result<Option<time_log::Model>, AppError> {
        Ok(self.time_logs().find_open(employee_id, log_type).await?)
    }

    /// Station the employee clocks in at; capacity is checked later, on the
    /// clock-in transaction.
    async fn active_station(&self, station_id: Uuid) -> Result<station::Model, AppError> {
        let station = self
            .daos
            .station()
            .find_by_id(station_id)
            .await
            .map_err(not_found_as("Station not found"))?;
        if !station.is_active {
            return Err(AppError::unprocessable("Station is not active"));
        }
        Ok(station)
    }

    pub async fn clock_in(&self, input: ClockIn) -> Result<time_log::Model, AppError> {
        if input.method == ClockMethod::Manual {
            return Err(AppError::bad_request(
                "MANUAL is reserved for corrections and back-filled logs",
            ));
        }

        let employee = self.find_employee(input.employee_id).await?;
        if employee.status != EmployeeStatus::Active {
            return Err(AppError::unprocessable("Employee is not active"));
        }

        if input.method == ClockMethod::Pin {
            let Some(candidate) = input.pin.as_deref() else {
                return Err(AppError::bad_request("PIN is required"));
            };
            if !pin::verify_pin(candidate, &employee.pin_hash)? {
                return Err(AppError::unauthorized("Invalid PIN"));
            }
        }

        let station = match input.station_id.or(employee.default_station_id) {
            Some(station_id) => Some(self.active_station(station_id).await?),
            None => None,
        };

        let employee_id = employee.id;
        let method = input.method;
        let daily_limit = self
            .workforce
            .enforce_daily_limit
            .then_some(employee.daily_hours_limit);
        let now = Utc::now();
        let log = self
            .daos
            .transaction_with(self.serializable(), move |txn| {
                Box::pin(open_work_log(
                    txn,
                    employee_id,
                    station,
                    method,
                    daily_limit,
                    now,
                ))
            })
            .await??;

        tracing::info!(employee_id = %employee.id, log_id = %log.id, "clocked in");
        Ok(log)
    }

    /// Closes the open WORK log and any open BREAK in one transaction.
    pub async fn clock_out(&self, employee_id: Uuid) -> Result<time_log::Model, AppError> {
        self.find_employee(employee_id).await?;
        let Some(work) = self.open_log(employee_id, TimeLogType::Work).await? else {
            return Err(AppError::unprocessable("Employee is not clocked in"));
        };

        let ended = Utc::now().fixed_offset();
        let closed = self
            .daos
            .transaction(move |txn| {
                Box::pin(async move {
                    if let Some(open_break) =
                        TimeLogDao::find_open_on(txn, employee_id, TimeLogType::Break).await?
                    {
                        TimeLogDao::update_on(txn, open_break.id, move |active| {
                            active.end_time = Set(Some(ended));
                        })
                        .await?;
                    }
                    TimeLogDao::update_on(txn, work.id, move |active| {
                        active.end_time = Set(Some(ended));
                    })
                    .await
                })
            })
            .await?;

        tracing::info!(employee_id = %employee_id, log_id = %closed.id, "clocked out");
        Ok(closed)
    }

    pub async fn start_break(&self, employee_id: Uuid) -> Result<time_log::Model, AppError> {
        self.find_employee(employee_id).await?;
        let started = Utc::now().fixed_offset();
        let log = self
            .daos
            .transaction_with(self.serializable(), move |txn| {
                Box::pin(open_break_log(txn, employee_id, started))
            })
            .await??;
        Ok(log)
    }

    pub async fn end_break(&self, employee_id: Uuid) -> Result<time_log::Model, AppError> {
        self.find_employee(employee_id).await?;
        let Some(open_break) = self.open_log(employee_id, TimeLogType::Break).await? else {
            return Err(AppError::unprocessable("Employee is not on a break"));
        };
        let ended = Utc::now().fixed_offset();
        Ok(self
            .time_logs()
            .update(open_break.id, move |active| {
                active.end_time = Set(Some(ended));
            })
            .await?)
    }

    fn validate_window(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Interval, AppError> {
        if end <= start {
            return Err(AppError::bad_request("end_time must be after start_time"));
        }
        let interval = Interval::closed(start.with_timezone(&Utc), end.with_timezone(&Utc));
        if interval.hours(Utc::now()) > self.workforce.max_shift_hours {
            return Err(AppError::unprocessable(format!(
                "A single log may not exceed {} hours",
                self.workforce.max_shift_hours
            )));
        }
        Ok(interval)
    }

    /// Fails when `interval` overlaps another visible log of the same type.
    async fn ensure_no_overlap(
        &self,
        employee_id: Uuid,
        log_type: TimeLogType,
        interval: Interval,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let candidates = self
            .time_logs()
            .find_in_window(
                employee_id,
                Some(log_type),
                interval.start.fixed_offset(),
                interval.end_or(now).fixed_offset(),
            )
            .await?;
        let clash = candidates
            .iter()
            .filter(|log| Some(log.id) != except)
            .any(|log| interval_of(log).overlaps(&interval, now));
        if clash {
            return Err(AppError::unprocessable(
                "Time log overlaps an existing entry",
            ));
        }
        Ok(())
    }

    pub async fn correct(
        &self,
        log_id: Uuid,
        correction: Correction,
        corrected_by: Uuid,
    ) -> Result<time_log::Model, AppError> {
        let log = self
            .time_logs()
            .find_visible_by_id(log_id)
            .await
            .map_err(not_found_as(TIME_LOG_NOT_FOUND))?;
        let interval = self.validate_window(correction.start_time, correction.end_time)?;
        self.ensure_no_overlap(log.employee_id, log.log_type, interval, Some(log.id))
            .await?;

        let updated = self
            .time_logs()
            .update(log.id, move |active| {
                active.start_time = Set(correction.start_time);
                active.end_time = Set(Some(correction.end_time));
                if let Some(note) = correction.note {
                    active.note = Set(Some(note));
                }
                active.clock_method = Set(ClockMethod::Manual);
                active.corrected_by = Set(Some(corrected_by));
            })
            .await?;

        tracing::info!(log_id = %updated.id, corrected_by = %corrected_by, "time log corrected");
        Ok(updated)
    }

    pub async fn create_manual(
        &self,
        input: ManualLog,
        created_by: Uuid,
    ) -> Result<time_log::Model, AppError> {
        let employee = self.find_employee(input.employee_id).await?;
        let interval = self.validate_window(input.start_time, input.end_time)?;
        if let Some(station_id) = input.station_id {
            self.daos
                .station()
                .find_by_id(station_id)
                .await
                .map_err(not_found_as("Station not found"))?;
        }
        self.ensure_no_overlap(employee.id, input.log_type, interval, None)
            .await?;

        Ok(self
            .time_logs()
            .create(time_log::ActiveModel {
                employee_id: Set(employee.id),
                station_id: Set(input.station_id),
                log_type: Set(input.log_type),
                start_time: Set(input.start_time),
                end_time: Set(Some(input.end_time)),
                note: Set(input.note),
                corrected_by: Set(Some(created_by)),
                task_id: Set(None),
                clock_method: Set(ClockMethod::Manual),
                deleted_at: Set(None),
                ..Default::default()
            })
            .await?)
    }

    pub async fn soft_delete(&self, log_id: Uuid) -> Result<time_log::Model, AppError> {
        self.time_logs()
            .soft_delete(log_id)
            .await
            .map_err(not_found_as(TIME_LOG_NOT_FOUND))
    }

    /// Brings a deleted log back, unless it would now overlap another entry.
    pub async fn restore(&self, log_id: Uuid) -> Result<time_log::Model, AppError> {
        let log = self
            .time_logs()
            .find_by_id(log_id)
            .await
            .map_err(not_found_as(TIME_LOG_NOT_FOUND))?;
        if log.deleted_at.is_none() {
            return Err(AppError::unprocessable("Time log is not deleted"));
        }
        self.ensure_no_overlap(log.employee_id, log.log_type, interval_of(&log), Some(log.id))
            .await?;
        self.time_logs()
            .restore(log_id)
            .await
            .map_err(|err| match err {
                DaoLayerError::NotFound { .. } => AppError::not_found(TIME_LOG_NOT_FOUND),
                other => other.into(),
            })
    }

    pub async fn hours_summary(
        &self,
        employee_id: Uuid,
        period: Period,
        date: NaiveDate,
    ) -> Result<HoursSummary, AppError> {
        let employee = self.find_employee(employee_id).await?;
        let window = period.window(date);
        let logs = self
            .time_logs()
            .find_in_window(
                employee.id,
                None,
                window.start.fixed_offset(),
                window.end.fixed_offset(),
            )
            .await?;
        Ok(timekeeping::summarize(
            &logs,
            period,
            date,
            employee.daily_hours_limit,
            employee.weekly_hours_limit,
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveTime, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{ClockIn, ClockService, Correction, ManualLog};
    use crate::{
        auth::pin,
        config::WorkforceConfig,
        db::dao::DaoContext,
        db::entities::{
            ClockMethod, EmployeeStatus, TimeLogType, employee, task_assignment, time_log,
        },
        error::AppError,
        test_helpers::fixtures,
    };

    fn service(mock: MockDatabase) -> ClockService {
        ClockService::new(
            DaoContext::new(&mock.into_connection()),
            WorkforceConfig::default(),
        )
    }

    fn employee_with_pin(id: Uuid, pin_code: &str) -> employee::Model {
        let mut model = fixtures::employee(id, "worker@example.com");
        model.pin_hash = pin::hash_pin(pin_code, 4).expect("hash should succeed");
        model
    }

    fn clock_in(employee_id: Uuid, station_id: Option<Uuid>, pin: Option<&str>) -> ClockIn {
        ClockIn {
            employee_id,
            station_id,
            method: ClockMethod::Pin,
            pin: pin.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn clock_in_rejects_wrong_pin() {
        let id = Uuid::new_v4();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![employee_with_pin(id, "4821")]]),
        );

        let err = service
            .clock_in(clock_in(id, None, Some("0000")))
            .await
            .expect_err("wrong pin should fail");

        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(err.message(), "Invalid PIN");
    }

    #[tokio::test]
    async fn clock_in_requires_pin_for_pin_method() {
        let id = Uuid::new_v4();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![employee_with_pin(id, "4821")]]),
        );

        let err = service
            .clock_in(clock_in(id, None, None))
            .await
            .expect_err("missing pin should fail");

        assert_eq!(err.message(), "PIN is required");
    }

    #[tokio::test]
    async fn clock_in_rejects_inactive_employee() {
        let id = Uuid::new_v4();
        let mut terminated = fixtures::employee(id, "gone@example.com");
        terminated.status = EmployeeStatus::Terminated;
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![terminated]]),
        );

        let err = service
            .clock_in(clock_in(id, None, Some("4821")))
            .await
            .expect_err("terminated employee should fail");

        assert_eq!(err.message(), "Employee is not active");
    }

    #[tokio::test]
    async fn clock_in_rejects_inactive_station() {
        let id = Uuid::new_v4();
        let station_id = Uuid::new_v4();
        let mut closed = fixtures::station(station_id, "Dock");
        closed.is_active = false;
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![employee_with_pin(id, "4821")]])
                .append_query_results([vec![closed]]),
        );

        let err = service
            .clock_in(clock_in(id, Some(station_id), Some("4821")))
            .await
            .expect_err("inactive station should fail");

        assert_eq!(err.message(), "Station is not active");
    }

    #[tokio::test]
    async fn clock_in_rejects_full_station() {
        let id = Uuid::new_v4();
        let station_id = Uuid::new_v4();
        let mut small = fixtures::station(station_id, "Dock");
        small.capacity = Some(2);
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![employee_with_pin(id, "4821")]])
                .append_query_results([vec![small]])
                .append_query_results([vec![std::collections::BTreeMap::from([(
                    "num_items",
                    sea_orm::Value::BigInt(Some(2)),
                )])]]),
        );

        let err = service
            .clock_in(clock_in(id, Some(station_id), Some("4821")))
            .await
            .expect_err("full station should fail");

        assert_eq!(err.message(), "Station is at capacity");
    }

    #[tokio::test]
    async fn second_clock_in_is_rejected() {
        let id = Uuid::new_v4();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![employee_with_pin(id, "4821")]])
                .append_query_results([vec![fixtures::open_log(
                    Uuid::new_v4(),
                    id,
                    TimeLogType::Work,
                )]]),
        );

        let err = service
            .clock_in(clock_in(id, None, Some("4821")))
            .await
            .expect_err("second clock-in should fail");

        assert_eq!(err.message(), "Employee is already clocked in");
    }

    #[tokio::test]
    async fn clock_in_stops_at_daily_limit() {
        let id = Uuid::new_v4();
        let mut employee = employee_with_pin(id, "4821");
        employee.daily_hours_limit = 1e-9;
        let mut earlier = fixtures::open_log(Uuid::new_v4(), id, TimeLogType::Work);
        let now = Utc::now();
        earlier.start_time = now.date_naive().and_time(NaiveTime::MIN).and_utc().fixed_offset();
        earlier.end_time = Some(now.fixed_offset());
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![employee]])
                .append_query_results([Vec::<time_log::Model>::new()])
                .append_query_results([vec![earlier]]),
        );

        let err = service
            .clock_in(clock_in(id, None, Some("4821")))
            .await
            .expect_err("limit should block clock-in");

        assert!(err.message().starts_with("Daily hours limit"));
    }

    #[tokio::test]
    async fn card_clock_in_creates_open_work_log() {
        let id = Uuid::new_v4();
        let log_id = Uuid::new_v4();
        let mut created = fixtures::open_log(log_id, id, TimeLogType::Work);
        created.clock_method = ClockMethod::Card;
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![fixtures::employee(id, "w@example.com")]])
                .append_query_results([Vec::<time_log::Model>::new()])
                .append_query_results([Vec::<time_log::Model>::new()])
                .append_query_results([Vec::<task_assignment::Model>::new()])
                .append_query_results([vec![created]]),
        );

        let log = service
            .clock_in(ClockIn {
                employee_id: id,
                station_id: None,
                method: ClockMethod::Card,
                pin: None,
            })
            .await
            .expect("clock-in should succeed");

        assert_eq!(log.id, log_id);
        assert!(log.end_time.is_none());
    }

    /// SQL of every statement run inside a transaction, in order.
    fn transaction_sql(log: &[sea_orm::Transaction]) -> Vec<String> {
        log.iter()
            .filter(|txn| txn.statements().first().is_some_and(|stmt| stmt.sql == "BEGIN"))
            .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
            .collect()
    }

    #[tokio::test]
    async fn clock_in_checks_and_inserts_in_one_transaction() {
        let id = Uuid::new_v4();
        let station_id = Uuid::new_v4();
        let mut dock = fixtures::station(station_id, "Dock");
        dock.capacity = Some(3);
        let mut employee = fixtures::employee(id, "w@example.com");
        let mut created = fixtures::open_log(Uuid::new_v4(), id, TimeLogType::Work);
        created.station_id = Some(station_id);
        created.clock_method = ClockMethod::Card;
        let mut moved = employee.clone();
        moved.last_station_id = Some(station_id);
        employee.default_station_id = Some(station_id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![employee.clone()]])
            .append_query_results([vec![dock]])
            .append_query_results([vec![std::collections::BTreeMap::from([(
                "num_items",
                sea_orm::Value::BigInt(Some(1)),
            )])]])
            .append_query_results([Vec::<time_log::Model>::new()])
            .append_query_results([Vec::<time_log::Model>::new()])
            .append_query_results([Vec::<task_assignment::Model>::new()])
            .append_query_results([vec![created]])
            .append_query_results([vec![employee]])
            .append_query_results([vec![moved]])
            .into_connection();
        let service = ClockService::new(DaoContext::new(&db), WorkforceConfig::default());

        let log = service
            .clock_in(ClockIn {
                employee_id: id,
                station_id: None,
                method: ClockMethod::Card,
                pin: None,
            })
            .await
            .expect("clock-in should succeed");

        assert_eq!(log.station_id, Some(station_id));
        let sql = transaction_sql(&db.into_transaction_log());
        assert_eq!(sql.first().map(String::as_str), Some("BEGIN"));
        assert_eq!(sql.last().map(String::as_str), Some("COMMIT"));
        let count = sql.iter().position(|sql| sql.contains("COUNT(*)"));
        let insert = sql.iter().position(|sql| sql.starts_with(r#"INSERT INTO "time_logs""#));
        let update = sql.iter().position(|sql| sql.starts_with(r#"UPDATE "employees""#));
        assert!(count.is_some() && count < insert && insert < update);
    }

    #[tokio::test]
    async fn refused_clock_in_writes_nothing() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::employee(id, "w@example.com")]])
            .append_query_results([vec![fixtures::open_log(
                Uuid::new_v4(),
                id,
                TimeLogType::Work,
            )]])
            .into_connection();
        let service = ClockService::new(DaoContext::new(&db), WorkforceConfig::default());

        let err = service
            .clock_in(ClockIn {
                employee_id: id,
                station_id: None,
                method: ClockMethod::Card,
                pin: None,
            })
            .await
            .expect_err("second clock-in should fail");

        assert_eq!(err.message(), "Employee is already clocked in");
        let sql = transaction_sql(&db.into_transaction_log());
        assert!(sql.iter().any(|sql| sql.starts_with("SELECT")));
        assert!(!sql.iter().any(|sql| sql.starts_with("INSERT")));
    }

    #[tokio::test]
    async fn break_opens_inside_transaction() {
        let id = Uuid::new_v4();
        let work = fixtures::open_log(Uuid::new_v4(), id, TimeLogType::Work);
        let on_break = fixtures::open_log(Uuid::new_v4(), id, TimeLogType::Break);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::employee(id, "w@example.com")]])
            .append_query_results([vec![work]])
            .append_query_results([Vec::<time_log::Model>::new()])
            .append_query_results([vec![on_break]])
            .into_connection();
        let service = ClockService::new(DaoContext::new(&db), WorkforceConfig::default());

        let log = service.start_break(id).await.expect("break should start");

        assert_eq!(log.log_type, TimeLogType::Break);
        let sql = transaction_sql(&db.into_transaction_log());
        assert_eq!(sql.iter().filter(|sql| sql.starts_with("SELECT")).count(), 2);
        assert_eq!(sql.iter().filter(|sql| sql.starts_with("INSERT")).count(), 1);
        assert_eq!(sql.last().map(String::as_str), Some("COMMIT"));
    }

    #[tokio::test]
    async fn clock_out_without_open_log_is_rejected() {
        let id = Uuid::new_v4();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![fixtures::employee(id, "w@example.com")]])
                .append_query_results([Vec::<time_log::Model>::new()]),
        );

        let err = service
            .clock_out(id)
            .await
            .expect_err("clock-out should fail");

        assert_eq!(err.message(), "Employee is not clocked in");
    }

    #[tokio::test]
    async fn second_break_is_rejected() {
        let id = Uuid::new_v4();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![fixtures::employee(id, "w@example.com")]])
                .append_query_results([vec![fixtures::open_log(
                    Uuid::new_v4(),
                    id,
                    TimeLogType::Work,
                )]])
                .append_query_results([vec![fixtures::open_log(
                    Uuid::new_v4(),
                    id,
                    TimeLogType::Break,
                )]]),
        );

        let err = service
            .start_break(id)
            .await
            .expect_err("second break should fail");

        assert_eq!(err.message(), "Employee is already on a break");
    }

    #[tokio::test]
    async fn correction_rejects_inverted_window() {
        let log_id = Uuid::new_v4();
        let log = fixtures::open_log(log_id, Uuid::new_v4(), TimeLogType::Work);
        let service =
            service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![log]]));

        let err = service
            .correct(
                log_id,
                Correction {
                    start_time: fixtures::ts() + Duration::hours(2),
                    end_time: fixtures::ts(),
                    note: None,
                },
                Uuid::new_v4(),
            )
            .await
            .expect_err("inverted window should fail");

        assert_eq!(err.message(), "end_time must be after start_time");
    }

    #[tokio::test]
    async fn correction_rejects_overlap_with_other_log() {
        let employee_id = Uuid::new_v4();
        let log_id = Uuid::new_v4();
        let log = fixtures::open_log(log_id, employee_id, TimeLogType::Work);
        let mut neighbour = fixtures::open_log(Uuid::new_v4(), employee_id, TimeLogType::Work);
        neighbour.start_time = fixtures::ts() + Duration::hours(3);
        neighbour.end_time = Some(fixtures::ts() + Duration::hours(6));
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![log.clone()]])
                .append_query_results([vec![log, neighbour]]),
        );

        let err = service
            .correct(
                log_id,
                Correction {
                    start_time: fixtures::ts(),
                    end_time: fixtures::ts() + Duration::hours(4),
                    note: Some("forgot to clock out".to_string()),
                },
                Uuid::new_v4(),
            )
            .await
            .expect_err("overlap should fail");

        assert_eq!(err.message(), "Time log overlaps an existing entry");
    }

    #[tokio::test]
    async fn manual_log_longer_than_max_shift_is_rejected() {
        let employee_id = Uuid::new_v4();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![fixtures::employee(employee_id, "w@example.com")]]),
        );

        let err = service
            .create_manual(
                ManualLog {
                    employee_id,
                    station_id: None,
                    log_type: TimeLogType::Work,
                    start_time: fixtures::ts(),
                    end_time: fixtures::ts() + Duration::hours(20),
                    note: None,
                },
                Uuid::new_v4(),
            )
            .await
            .expect_err("long shift should fail");

        assert!(matches!(err, AppError::Unprocessable(_)));
    }

    #[tokio::test]
    async fn restore_requires_deleted_log() {
        let log_id = Uuid::new_v4();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![
                fixtures::open_log(log_id, Uuid::new_v4(), TimeLogType::Work),
            ]]),
        );

        let err = service
            .restore(log_id)
            .await
            .expect_err("visible log cannot be restored");

        assert_eq!(err.message(), "Time log is not deleted");
    }

    #[test]
    fn clock_in_payload_defaults_to_pin() {
        let payload: ClockIn = serde_json::from_value(serde_json::json!({
            "employee_id": Uuid::nil(),
            "pin": "1234"
        }))
        .expect("payload should parse");

        assert_eq!(payload.method, ClockMethod::Pin);
    }
}
