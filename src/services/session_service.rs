use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    db::dao::SessionDao,
    db::entities::session,
    error::AppError,
    services::crud_service::{CrudErrors, CrudOp, CrudService},
};

const MAX_SESSION_TTL_HOURS: u64 = 24 * 366;

#[derive(Clone)]
pub struct SessionService {
    session_dao: SessionDao,
}

impl SessionService {
    pub fn new(session_dao: SessionDao) -> Self {
        Self { session_dao }
    }

    pub async fn open(&self, user_id: Uuid, ttl_hours: u64) -> Result<session::Model, AppError> {
        let hours = ttl_hours.min(MAX_SESSION_TTL_HOURS) as i64;
        let expires_at = (Utc::now() + Duration::hours(hours)).fixed_offset();
        self.session_dao
            .open(user_id, expires_at)
            .await
            .map_err(|err| self.map_error(CrudOp::Create, err))
    }

    /// The session must exist and not have expired.
    pub async fn ensure_active(&self, id: Uuid) -> Result<session::Model, AppError> {
        let found = CrudService::find_by_id(self, id)
            .await
            .map_err(|err| match err {
                AppError::NotFound(_) => AppError::unauthorized("Session has been revoked"),
                other => other,
            })?;
        if found.expires_at <= Utc::now() {
            return Err(AppError::unauthorized("Session has expired"));
        }
        Ok(found)
    }

    pub async fn revoke(&self, id: Uuid) -> Result<(), AppError> {
        CrudService::delete(self, id).await
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let purged = self
            .session_dao
            .purge_expired()
            .await
            .map_err(|err| self.map_error(CrudOp::Delete, err))?;
        if purged > 0 {
            tracing::debug!(purged, "expired sessions removed");
        }
        Ok(purged)
    }
}

impl CrudService for SessionService {
    type Dao = SessionDao;

    fn dao(&self) -> &Self::Dao {
        &self.session_dao
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Session not found",
            ..CrudErrors::default()
        }
    }
}
