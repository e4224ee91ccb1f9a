use sea_orm::Select;
use uuid::Uuid;

use crate::{
    db::dao::{SoftDeleteDao, TimeLogDao, visible},
    db::entities::{prelude::TimeLog, time_log},
    error::AppError,
    services::crud_service::{CrudErrors, CrudOp, CrudService},
};

/// Read access to time logs. Soft-deleted rows never leave this service.
#[derive(Clone)]
pub struct TimeLogService {
    time_log_dao: TimeLogDao,
}

impl TimeLogService {
    pub fn new(time_log_dao: TimeLogDao) -> Self {
        Self { time_log_dao }
    }
}

#[async_trait::async_trait]
impl CrudService for TimeLogService {
    type Dao = TimeLogDao;

    fn dao(&self) -> &Self::Dao {
        &self.time_log_dao
    }

    fn list_scope(select: Select<TimeLog>) -> Select<TimeLog> {
        visible(select)
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Time log not found",
            ..CrudErrors::default()
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<time_log::Model, AppError> {
        self.time_log_dao
            .find_visible_by_id(id)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.time_log_dao
            .soft_delete(id)
            .await
            .map(|_| ())
            .map_err(|err| self.map_error(CrudOp::Delete, err))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::TimeLogService;
    use crate::{
        db::dao::{DaoBase, TimeLogDao},
        db::entities::{TimeLogType, time_log},
        error::AppError,
        services::crud_service::CrudService,
        test_helpers::fixtures,
    };

    #[tokio::test]
    async fn hidden_log_reads_as_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<time_log::Model>::new()])
            .into_connection();
        let service = TimeLogService::new(TimeLogDao::new(&db));

        let err = service
            .find_by_id(Uuid::new_v4())
            .await
            .expect_err("hidden log should be missing");

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.message(), "Time log not found");
    }

    #[tokio::test]
    async fn delete_is_soft() {
        let id = Uuid::new_v4();
        let log = fixtures::open_log(id, Uuid::new_v4(), TimeLogType::Work);
        let mut deleted = log.clone();
        deleted.deleted_at = Some(fixtures::ts());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![log.clone()]])
            .append_query_results([vec![log]])
            .append_query_results([vec![deleted]])
            .into_connection();
        let service = TimeLogService::new(TimeLogDao::new(&db));

        service.delete(id).await.expect("soft delete should succeed");
    }
}
