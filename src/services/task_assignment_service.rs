use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{DatabaseTransaction, IsolationLevel, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, DaoContext, DaoResult, TaskAssignmentDao, TimeLogDao},
    db::entities::{EmployeeStatus, TimeLogType, task_assignment},
    error::AppError,
    services::crud_service::{CrudErrors, CrudService, not_found_as},
};

#[derive(Debug, Clone, Deserialize)]
pub struct StartAssignment {
    pub employee_id: Uuid,
    pub task_type_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct TaskAssignmentService {
    daos: DaoContext,
    assignment_dao: TaskAssignmentDao,
}

/// `units_completed` only ever grows.
fn check_units(assignment: &task_assignment::Model, units: i32) -> Result<(), AppError> {
    if assignment.end_time.is_some() {
        return Err(AppError::unprocessable("Task assignment is already completed"));
    }
    if units < 0 {
        return Err(AppError::bad_request("units must not be negative"));
    }
    if units < assignment.units_completed {
        return Err(AppError::unprocessable(format!(
            "units_completed cannot decrease (current {}, requested {units})",
            assignment.units_completed
        )));
    }
    Ok(())
}

/// Opens an assignment unless one is already open, and links it to the
/// employee's open WORK log. Runs on one transaction; the inner error
/// refuses the request.
async fn open_assignment(
    txn: &DatabaseTransaction,
    employee_id: Uuid,
    task_type_id: Uuid,
    notes: Option<String>,
    started: DateTime<FixedOffset>,
) -> DaoResult<Result<task_assignment::Model, AppError>> {
    if TaskAssignmentDao::find_open_for_employee_on(txn, employee_id)
        .await?
        .is_some()
    {
        return Ok(Err(AppError::unprocessable(
            "Employee already has an open task assignment",
        )));
    }

    let assignment = TaskAssignmentDao::create_on(
        txn,
        task_assignment::ActiveModel {
            employee_id: Set(employee_id),
            task_type_id: Set(task_type_id),
            start_time: Set(started),
            end_time: Set(None),
            units_completed: Set(0),
            notes: Set(notes),
            ..Default::default()
        },
    )
    .await?;

    if let Some(log) = TimeLogDao::find_open_on(txn, employee_id, TimeLogType::Work).await? {
        let task_id = assignment.id;
        TimeLogDao::update_on(txn, log.id, move |active| {
            active.task_id = Set(Some(task_id));
        })
        .await?;
    }
    Ok(Ok(assignment))
}

impl TaskAssignmentService {
    pub fn new(daos: DaoContext) -> Self {
        Self {
            assignment_dao: daos.task_assignment(),
            daos,
        }
    }

    pub async fn start_assignment(
        &self,
        input: StartAssignment,
    ) -> Result<task_assignment::Model, AppError> {
        let employee = self
            .daos
            .employee()
            .find_by_id(input.employee_id)
            .await
            .map_err(not_found_as("Employee not found"))?;
        if employee.status != EmployeeStatus::Active {
            return Err(AppError::unprocessable("Employee is not active"));
        }
        let task_type = self
            .daos
            .task_type()
            .find_by_id(input.task_type_id)
            .await
            .map_err(not_found_as("Task type not found"))?;
        if !task_type.is_active {
            return Err(AppError::unprocessable("Task type is not active"));
        }

        let (employee_id, task_type_id) = (employee.id, task_type.id);
        let notes = input.notes;
        let started = Utc::now().fixed_offset();
        let options = self
            .daos
            .transaction_options()
            .with_isolation(IsolationLevel::Serializable);
        let assignment = self
            .daos
            .transaction_with(options, move |txn| {
                Box::pin(open_assignment(
                    txn,
                    employee_id,
                    task_type_id,
                    notes,
                    started,
                ))
            })
            .await??;

        tracing::info!(
            assignment_id = %assignment.id,
            employee_id = %assignment.employee_id,
            "task assignment started"
        );
        Ok(assignment)
    }

    pub async fn record_units(
        &self,
        id: Uuid,
        units: i32,
    ) -> Result<task_assignment::Model, AppError> {
        let assignment = CrudService::find_by_id(self, id).await?;
        check_units(&assignment, units)?;
        CrudService::update(self, id, move |active| {
            active.units_completed = Set(units);
        })
        .await
    }

    pub async fn complete_assignment(
        &self,
        id: Uuid,
        final_units: Option<i32>,
    ) -> Result<task_assignment::Model, AppError> {
        let assignment = CrudService::find_by_id(self, id).await?;
        let units = final_units.unwrap_or(assignment.units_completed);
        check_units(&assignment, units)?;
        let ended = Utc::now().fixed_offset();
        CrudService::update(self, id, move |active| {
            active.units_completed = Set(units);
            active.end_time = Set(Some(ended));
        })
        .await
    }
}

impl CrudService for TaskAssignmentService {
    type Dao = TaskAssignmentDao;

    fn dao(&self) -> &Self::Dao {
        &self.assignment_dao
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Task assignment not found",
            ..CrudErrors::default()
        }
    }
}
