use anyhow::{Result, bail};

use super::AppConfig;

const MIN_ADMIN_API_KEY_LEN: usize = 16;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if auth.admin_email.trim().is_empty() {
            errors.push("auth.admin_email must not be empty".to_string());
        }

        if auth.admin_api_key.len() < MIN_ADMIN_API_KEY_LEN {
            errors.push(format!(
                "auth.admin_api_key must be at least {MIN_ADMIN_API_KEY_LEN} characters"
            ));
        }

        if auth.jwt_secret.trim().is_empty() {
            errors.push("auth.jwt_secret must not be empty".to_string());
        }

        if auth.access_ttl_secs == 0 {
            errors.push("auth.access_ttl_secs must be > 0".to_string());
        }

        if auth.session_ttl_hours == 0 {
            errors.push("auth.session_ttl_hours must be > 0".to_string());
        }
    }

    let workforce = &cfg.workforce;
    if workforce.default_daily_hours_limit <= 0.0 || workforce.default_daily_hours_limit > 24.0 {
        errors.push("workforce.default_daily_hours_limit must be within (0, 24]".to_string());
    }

    if workforce.default_weekly_hours_limit < workforce.default_daily_hours_limit {
        errors.push(
            "workforce.default_weekly_hours_limit must be >= workforce.default_daily_hours_limit"
                .to_string(),
        );
    }

    if workforce.max_shift_hours <= 0.0 || workforce.max_shift_hours > 24.0 {
        errors.push("workforce.max_shift_hours must be within (0, 24]".to_string());
    }

    if workforce.min_pin_length < 4 {
        errors.push("workforce.min_pin_length must be >= 4".to_string());
    }

    if cfg.transaction.max_wait_ms == 0 {
        errors.push("transaction.max_wait_ms must be > 0".to_string());
    }

    if cfg.transaction.timeout_ms == 0 {
        errors.push("transaction.timeout_ms must be > 0".to_string());
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}
