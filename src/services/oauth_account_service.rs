use chrono::{DateTime, FixedOffset};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, DaoLayerError, OAuthAccountDao, UserDao},
    db::entities::oauth_account,
    error::AppError,
    services::crud_service::{
        CrudErrors, CrudOp, CrudService, active_value, not_found_as,
    },
};

#[derive(Debug, Clone, Deserialize)]
pub struct LinkAccount {
    pub provider: String,
    pub provider_user_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<FixedOffset>>,
}

#[derive(Clone)]
pub struct OAuthAccountService {
    oauth_account_dao: OAuthAccountDao,
    user_dao: UserDao,
}

impl OAuthAccountService {
    pub fn new(oauth_account_dao: OAuthAccountDao, user_dao: UserDao) -> Self {
        Self {
            oauth_account_dao,
            user_dao,
        }
    }

    /// Links a provider identity to `user_id`, refreshing tokens when the
    /// identity is already known. An identity never moves between users.
    pub async fn link(
        &self,
        user_id: Uuid,
        input: LinkAccount,
    ) -> Result<oauth_account::Model, AppError> {
        let provider = input.provider.trim().to_ascii_lowercase();
        let provider_user_id = input.provider_user_id.trim().to_string();
        if provider.is_empty() || provider_user_id.is_empty() {
            return Err(AppError::bad_request(
                "provider and provider_user_id are required",
            ));
        }
        self.user_dao
            .find_by_id(user_id)
            .await
            .map_err(not_found_as("User not found"))?;

        let existing = self
            .oauth_account_dao
            .find_first(OAuthAccountDao::by_provider_account(
                provider.clone(),
                provider_user_id.clone(),
            ))
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))?;
        if existing.is_some_and(|account| account.user_id != user_id) {
            return Err(AppError::conflict(
                "This provider account is linked to another user",
            ));
        }

        let create = oauth_account::ActiveModel {
            user_id: Set(user_id),
            provider: Set(provider.clone()),
            provider_user_id: Set(provider_user_id.clone()),
            access_token: Set(input.access_token.clone()),
            refresh_token: Set(input.refresh_token.clone()),
            expires_at: Set(input.expires_at),
            ..Default::default()
        };
        let LinkAccount {
            access_token,
            refresh_token,
            expires_at,
            ..
        } = input;
        self.oauth_account_dao
            .upsert(
                OAuthAccountDao::by_provider_account(provider, provider_user_id),
                create,
                move |active| {
                    active.access_token = Set(access_token);
                    active.refresh_token = Set(refresh_token);
                    active.expires_at = Set(expires_at);
                },
            )
            .await
            .map_err(|err| self.map_error(CrudOp::Update, err))
    }
}

#[async_trait::async_trait]
impl CrudService for OAuthAccountService {
    type Dao = OAuthAccountDao;

    fn dao(&self) -> &Self::Dao {
        &self.oauth_account_dao
    }

    fn hidden_columns(&self) -> &'static [&'static str] {
        &["access_token", "refresh_token"]
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "OAuth account not found",
            conflict: "This provider account is already linked",
            ..CrudErrors::default()
        }
    }

    async fn create<T>(&self, data: T) -> Result<oauth_account::Model, AppError>
    where
        T: IntoActiveModel<oauth_account::ActiveModel> + Send,
    {
        let active = data.into_active_model();
        let Some(user_id) = active_value(&active.user_id).copied() else {
            return Err(AppError::bad_request("user_id is required"));
        };
        self.user_dao
            .find_by_id(user_id)
            .await
            .map_err(|err| match err {
                DaoLayerError::NotFound { .. } => AppError::bad_request("User does not exist"),
                other => self.map_error(CrudOp::Find, other),
            })?;
        self.oauth_account_dao
            .create(active)
            .await
            .map_err(|err| self.map_error(CrudOp::Create, err))
    }
}
