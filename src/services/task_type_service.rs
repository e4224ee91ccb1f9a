use sea_orm::IntoActiveModel;

use crate::{
    db::dao::{DaoBase, DaoLayerError, StationDao, TaskTypeDao},
    db::entities::task_type,
    error::AppError,
    services::crud_service::{CrudErrors, CrudOp, CrudService, active_value},
};

#[derive(Clone)]
pub struct TaskTypeService {
    task_type_dao: TaskTypeDao,
    station_dao: StationDao,
}

impl TaskTypeService {
    pub fn new(task_type_dao: TaskTypeDao, station_dao: StationDao) -> Self {
        Self {
            task_type_dao,
            station_dao,
        }
    }
}

#[async_trait::async_trait]
impl CrudService for TaskTypeService {
    type Dao = TaskTypeDao;

    fn dao(&self) -> &Self::Dao {
        &self.task_type_dao
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Task type not found",
            ..CrudErrors::default()
        }
    }

    async fn create<T>(&self, data: T) -> Result<task_type::Model, AppError>
    where
        T: IntoActiveModel<task_type::ActiveModel> + Send,
    {
        let active = data.into_active_model();
        if active_value(&active.name).is_none_or(|name| name.trim().is_empty()) {
            return Err(AppError::bad_request("Task type name is required"));
        }
        if let Some(Some(minutes)) = active_value(&active.estimated_minutes_per_unit)
            && *minutes <= 0.0
        {
            return Err(AppError::bad_request(
                "estimated_minutes_per_unit must be positive",
            ));
        }
        let Some(station_id) = active_value(&active.station_id).copied() else {
            return Err(AppError::bad_request("station_id is required"));
        };
        self.station_dao
            .find_by_id(station_id)
            .await
            .map_err(|err| match err {
                DaoLayerError::NotFound { .. } => AppError::bad_request("Station does not exist"),
                other => self.map_error(CrudOp::Find, other),
            })?;

        self.task_type_dao
            .create(active)
            .await
            .map_err(|err| self.map_error(CrudOp::Create, err))
    }
}
