use anyhow::{Context, bail};

use crate::{
    config::AuthConfig,
    db::entities::{UserRole, user},
    services::ServiceContext,
};

use super::jwt::JwtKeys;

const BOOTSTRAP_KEY_NAME: &str = "bootstrap";

pub fn build_jwt(cfg: &AuthConfig) -> JwtKeys {
    JwtKeys::from_secret(cfg.jwt_secret.as_bytes())
}

/// Makes sure the configured admin user and its bootstrap API key exist.
pub async fn seed_admin(
    cfg: &AuthConfig,
    services: &ServiceContext,
) -> anyhow::Result<user::Model> {
    let users = services.user();
    let admin = match users
        .find_by_email(&cfg.admin_email)
        .await
        .map_err(|err| anyhow::anyhow!("{err}"))
        .context("looking up admin user")?
    {
        Some(existing) => {
            tracing::info!(email = %existing.email, "admin user already present");
            existing
        }
        None => {
            let created = users
                .create_user(
                    &cfg.admin_email,
                    Some("Administrator".to_string()),
                    UserRole::Admin,
                    None,
                )
                .await
                .map_err(|err| anyhow::anyhow!("{err}"))
                .context("seeding admin user")?;
            tracing::info!(email = %created.email, "seeded admin user");
            created
        }
    };

    let api_keys = services.daos().api_key();
    match api_keys
        .find_by_key(&cfg.admin_api_key)
        .await
        .context("looking up bootstrap api key")?
    {
        Some(key) if key.user_id == admin.id => {}
        Some(_) => bail!("bootstrap api key is already assigned to another user"),
        None => {
            api_keys
                .create_key(admin.id, BOOTSTRAP_KEY_NAME, &cfg.admin_api_key, None)
                .await
                .context("seeding bootstrap api key")?;
            tracing::info!(user_id = %admin.id, "seeded bootstrap api key");
        }
    }

    Ok(admin)
}
