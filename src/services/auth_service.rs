use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::{
        Claims,
        jwt::{self, JwtKeys},
        role_set,
    },
    config::{
        AuthConfig,
        defaults::{DEFAULT_ACCESS_TTL_SECS, DEFAULT_SESSION_TTL_HOURS},
    },
    db::dao::{DaoBase, DaoLayerError, UserDao},
    db::entities::user,
    error::AppError,
    services::{api_key_service::ApiKeyService, session_service::SessionService},
};

/// Lifetimes of access tokens and the sessions behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub access_ttl_secs: u64,
    pub session_ttl_hours: u64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS as u64,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS as u64,
        }
    }
}

impl From<Option<&AuthConfig>> for SessionPolicy {
    fn from(cfg: Option<&AuthConfig>) -> Self {
        cfg.map(|cfg| Self {
            access_ttl_secs: cfg.access_ttl_secs,
            session_ttl_hours: cfg.session_ttl_hours,
        })
        .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub session_id: Uuid,
    pub expires_at: DateTime<FixedOffset>,
    pub user: user::Model,
}

#[derive(Clone)]
pub struct AuthService<'a> {
    jwt: &'a JwtKeys,
    policy: SessionPolicy,
    users: UserDao,
    api_keys: ApiKeyService,
    sessions: SessionService,
}

fn parse_subject(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::unauthorized(format!("Token carries an invalid {what}")))
}

impl<'a> AuthService<'a> {
    pub fn new(
        jwt: &'a JwtKeys,
        policy: SessionPolicy,
        users: UserDao,
        api_keys: ApiKeyService,
        sessions: SessionService,
    ) -> Self {
        Self {
            jwt,
            policy,
            users,
            api_keys,
            sessions,
        }
    }

    async fn load_user(&self, id: Uuid) -> Result<user::Model, AppError> {
        self.users.find_by_id(id).await.map_err(|err| match err {
            DaoLayerError::NotFound { .. } => {
                AppError::unauthorized("User no longer exists")
            }
            other => AppError::from(other),
        })
    }

    /// Exchanges an API key for a session and a signed access token.
    pub async fn login_with_api_key(&self, raw_key: &str) -> Result<SessionToken, AppError> {
        self.sessions.purge_expired().await?;
        let key = self.api_keys.verify(raw_key).await?;
        let user = self.load_user(key.user_id).await?;
        let session = self
            .sessions
            .open(user.id, self.policy.session_ttl_hours)
            .await?;

        let claims = jwt::make_access_claims(
            &user.id,
            Some(&session.id),
            role_set(user.role),
            self.policy.access_ttl_secs as usize,
        );
        let access_token = jwt::encode_token(self.jwt, &claims)?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "session opened");
        Ok(SessionToken {
            access_token,
            token_type: "Bearer",
            expires_in: self.policy.access_ttl_secs,
            session_id: session.id,
            expires_at: session.expires_at,
            user,
        })
    }

    pub async fn logout(&self, claims: &Claims) -> Result<(), AppError> {
        let Some(sid) = claims.sid.as_deref() else {
            return Err(AppError::bad_request(
                "Only session tokens can be logged out",
            ));
        };
        let session_id = parse_subject(sid, "session id")?;
        self.sessions.revoke(session_id).await?;
        tracing::info!(session_id = %session_id, "session revoked");
        Ok(())
    }

    pub async fn me(&self, claims: &Claims) -> Result<user::Model, AppError> {
        let user_id = parse_subject(&claims.sub, "subject")?;
        self.load_user(user_id).await
    }

    /// Validates a bearer token; tokens bound to a session also need that
    /// session to be alive.
    pub async fn authenticate_bearer(&self, token: &str) -> Result<Claims, AppError> {
        let claims = jwt::decode_token(self.jwt, token)?;
        if let Some(sid) = claims.sid.as_deref() {
            let session_id = parse_subject(sid, "session id")?;
            self.sessions.ensure_active(session_id).await?;
        }
        Ok(claims)
    }

    /// Claims for a request authenticated by `x-api-key`; they carry no session.
    pub async fn authenticate_api_key(&self, raw_key: &str) -> Result<Claims, AppError> {
        let key = self.api_keys.verify(raw_key).await?;
        let user = self.load_user(key.user_id).await?;
        Ok(jwt::make_access_claims(
            &user.id,
            None,
            role_set(user.role),
            self.policy.access_ttl_secs as usize,
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{AuthService, SessionPolicy};
    use crate::{
        auth::{Role, jwt::JwtKeys},
        db::dao::{ApiKeyDao, DaoBase, SessionDao, UserDao},
        db::entities::{UserRole, api_key},
        error::AppError,
        services::{api_key_service::ApiKeyService, session_service::SessionService},
        test_helpers::fixtures,
    };

    const SECRET: &[u8] = b"auth-service-secret";

    fn service(keys: &JwtKeys, mock: MockDatabase) -> AuthService<'_> {
        let db = mock.into_connection();
        AuthService::new(
            keys,
            SessionPolicy::default(),
            UserDao::new(&db),
            ApiKeyService::new(ApiKeyDao::new(&db), UserDao::new(&db)),
            SessionService::new(SessionDao::new(&db)),
        )
    }

    #[tokio::test]
    async fn login_issues_session_bound_token() {
        let keys = JwtKeys::from_secret(SECRET);
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let key = fixtures::api_key(Uuid::new_v4(), user_id, "wf_live");
        let expires_at = (Utc::now() + Duration::hours(12)).fixed_offset();
        let service = service(
            &keys,
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([vec![key.clone()]])
                .append_query_results([vec![key.clone()]])
                .append_query_results([vec![key]])
                .append_query_results([vec![fixtures::user(
                    user_id,
                    "m@example.com",
                    UserRole::Manager,
                )]])
                .append_query_results([vec![fixtures::session(session_id, user_id, expires_at)]]),
        );

        let token = service
            .login_with_api_key("wf_live")
            .await
            .expect("login should succeed");

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.session_id, session_id);
        let claims = crate::auth::jwt::decode_token(&keys, &token.access_token)
            .expect("token should decode");
        assert_eq!(claims.sid, Some(session_id.to_string()));
        assert_eq!(claims.roles, vec![Role::Manager, Role::Worker]);
    }

    #[tokio::test]
    async fn login_rejects_unknown_key() {
        let keys = JwtKeys::from_secret(SECRET);
        let service = service(
            &keys,
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([Vec::<api_key::Model>::new()]),
        );

        let err = service
            .login_with_api_key("wf_missing")
            .await
            .expect_err("unknown key should fail");

        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn logout_needs_session_token() {
        let keys = JwtKeys::from_secret(SECRET);
        let service = service(&keys, MockDatabase::new(DatabaseBackend::Postgres));
        let claims = crate::auth::jwt::make_access_claims(
            &Uuid::new_v4(),
            None,
            vec![Role::Worker],
            60,
        );

        let err = service
            .logout(&claims)
            .await
            .expect_err("api-key claims cannot log out");

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn bearer_with_revoked_session_is_rejected() {
        let keys = JwtKeys::from_secret(SECRET);
        let claims = crate::auth::jwt::make_access_claims(
            &Uuid::new_v4(),
            Some(&Uuid::new_v4()),
            vec![Role::Worker],
            60,
        );
        let token = crate::auth::jwt::encode_token(&keys, &claims).expect("token should encode");
        let service = service(
            &keys,
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<crate::db::entities::session::Model>::new()]),
        );

        let err = service
            .authenticate_bearer(&token)
            .await
            .expect_err("revoked session should fail");

        assert_eq!(err.message(), "Session has been revoked");
    }

    #[test]
    fn policy_falls_back_to_defaults() {
        assert_eq!(SessionPolicy::from(None), SessionPolicy::default());
    }
}
