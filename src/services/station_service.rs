use sea_orm::IntoActiveModel;
use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, StationDao},
    db::entities::station,
    error::AppError,
    services::crud_service::{CrudErrors, CrudOp, CrudService, active_value},
};

#[derive(Clone)]
pub struct StationService {
    station_dao: StationDao,
}

impl StationService {
    pub fn new(station_dao: StationDao) -> Self {
        Self { station_dao }
    }

    /// Rejects blank names, non-positive capacities and names another
    /// station already uses.
    async fn validate(
        &self,
        active: &station::ActiveModel,
        id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(Some(capacity)) = active_value(&active.capacity)
            && *capacity <= 0
        {
            return Err(AppError::bad_request("Station capacity must be positive"));
        }

        let Some(name) = active_value(&active.name) else {
            return match id {
                Some(_) => Ok(()),
                None => Err(AppError::bad_request("Station name is required")),
            };
        };
        if name.trim().is_empty() {
            return Err(AppError::bad_request("Station name is required"));
        }

        let existing = self
            .station_dao
            .find_by_name(name)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))?;
        match existing {
            Some(found) if Some(found.id) != id => {
                Err(AppError::conflict("A station with this name already exists"))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl CrudService for StationService {
    type Dao = StationDao;

    fn dao(&self) -> &Self::Dao {
        &self.station_dao
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Station not found",
            conflict: "A station with this name already exists",
            ..CrudErrors::default()
        }
    }

    async fn create<T>(&self, data: T) -> Result<station::Model, AppError>
    where
        T: IntoActiveModel<station::ActiveModel> + Send,
    {
        let active = data.into_active_model();
        self.validate(&active, None).await?;
        self.station_dao
            .create(active)
            .await
            .map_err(|err| self.map_error(CrudOp::Create, err))
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<station::Model, AppError>
    where
        F: for<'a> FnOnce(&'a mut station::ActiveModel) + Send,
    {
        let current = CrudService::find_by_id(self, id).await?;
        let mut active = current.into_active_model();
        apply(&mut active);
        self.validate(&active, Some(id)).await?;
        self.station_dao
            .update(id, move |target| *target = active)
            .await
            .map_err(|err| self.map_error(CrudOp::Update, err))
    }
}
