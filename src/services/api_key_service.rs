use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::api_key::generate_api_key,
    db::dao::{ApiKeyDao, DaoBase, UserDao},
    db::entities::api_key,
    error::AppError,
    services::crud_service::{CrudErrors, CrudOp, CrudService, not_found_as},
};

#[derive(Debug, Clone, Deserialize)]
pub struct IssueApiKey {
    pub user_id: Uuid,
    pub name: String,
    pub expires_at: Option<DateTime<FixedOffset>>,
}

#[derive(Clone)]
pub struct ApiKeyService {
    api_key_dao: ApiKeyDao,
    user_dao: UserDao,
}

impl ApiKeyService {
    pub fn new(api_key_dao: ApiKeyDao, user_dao: UserDao) -> Self {
        Self {
            api_key_dao,
            user_dao,
        }
    }

    /// Stores a fresh key for the user. The raw key is only ever returned here.
    pub async fn issue(&self, input: IssueApiKey) -> Result<(api_key::Model, String), AppError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("API key name is required"));
        }
        if let Some(expires_at) = input.expires_at
            && expires_at <= Utc::now()
        {
            return Err(AppError::bad_request("expires_at must be in the future"));
        }
        self.user_dao
            .find_by_id(input.user_id)
            .await
            .map_err(not_found_as("User not found"))?;

        let raw = generate_api_key();
        let model = self
            .api_key_dao
            .create_key(input.user_id, name, &raw, input.expires_at)
            .await
            .map_err(|err| self.map_error(CrudOp::Create, err))?;
        tracing::info!(api_key_id = %model.id, user_id = %model.user_id, "api key issued");
        Ok((model, raw))
    }

    /// Resolves a presented key, rejecting unknown and expired ones, and
    /// records its use.
    pub async fn verify(&self, raw: &str) -> Result<api_key::Model, AppError> {
        let Some(found) = self
            .api_key_dao
            .find_by_key(raw)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))?
        else {
            return Err(AppError::unauthorized("Invalid API key"));
        };
        if found
            .expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
        {
            return Err(AppError::unauthorized("API key has expired"));
        }
        self.api_key_dao
            .touch_last_used(found.id)
            .await
            .map_err(|err| self.map_error(CrudOp::Update, err))
    }

    pub async fn revoke(&self, id: Uuid) -> Result<(), AppError> {
        CrudService::delete(self, id).await?;
        tracing::info!(api_key_id = %id, "api key revoked");
        Ok(())
    }
}

impl CrudService for ApiKeyService {
    type Dao = ApiKeyDao;

    fn dao(&self) -> &Self::Dao {
        &self.api_key_dao
    }

    fn hidden_columns(&self) -> &'static [&'static str] {
        &["key"]
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "API key not found",
            conflict: "API key already exists",
            ..CrudErrors::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{ApiKeyService, IssueApiKey};
    use crate::{
        auth::api_key::API_KEY_PREFIX,
        db::dao::{ApiKeyDao, DaoBase, UserDao},
        db::entities::{UserRole, api_key, user},
        error::AppError,
        test_helpers::fixtures,
    };

    fn service(mock: MockDatabase) -> ApiKeyService {
        let db = mock.into_connection();
        ApiKeyService::new(ApiKeyDao::new(&db), UserDao::new(&db))
    }

    #[tokio::test]
    async fn issue_returns_raw_key_once() {
        let user_id = Uuid::new_v4();
        let stored = fixtures::api_key(Uuid::new_v4(), user_id, "stored");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![fixtures::user(
                    user_id,
                    "a@example.com",
                    UserRole::Admin,
                )]])
                .append_query_results([vec![stored]]),
        );

        let (model, raw) = service
            .issue(IssueApiKey {
                user_id,
                name: "kiosk".to_string(),
                expires_at: None,
            })
            .await
            .expect("issue should succeed");

        assert_eq!(model.user_id, user_id);
        assert!(raw.starts_with(API_KEY_PREFIX));
    }

    #[tokio::test]
    async fn issue_requires_existing_user() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let err = service
            .issue(IssueApiKey {
                user_id: Uuid::new_v4(),
                name: "kiosk".to_string(),
                expires_at: None,
            })
            .await
            .expect_err("unknown user should fail");

        assert_eq!(err.message(), "User not found");
    }

    #[tokio::test]
    async fn verify_rejects_unknown_key() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<api_key::Model>::new()]),
        );

        let err = service
            .verify("wf_nope")
            .await
            .expect_err("unknown key should fail");

        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn verify_rejects_expired_key() {
        let mut expired = fixtures::api_key(Uuid::new_v4(), Uuid::new_v4(), "wf_old");
        expired.expires_at = Some((Utc::now() - Duration::hours(1)).fixed_offset());
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![expired]]),
        );

        let err = service
            .verify("wf_old")
            .await
            .expect_err("expired key should fail");

        assert_eq!(err.message(), "API key has expired");
    }

    #[tokio::test]
    async fn verify_touches_last_used() {
        let key = fixtures::api_key(Uuid::new_v4(), Uuid::new_v4(), "wf_live");
        let mut touched = key.clone();
        touched.last_used_at = Some(Utc::now().fixed_offset());
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![key.clone()]])
                .append_query_results([vec![key]])
                .append_query_results([vec![touched]]),
        );

        let verified = service.verify("wf_live").await.expect("verify should succeed");

        assert!(verified.last_used_at.is_some());
    }
}
