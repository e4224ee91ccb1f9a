use std::sync::Arc;

use axum::Router;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

use crate::{
    auth::jwt::JwtKeys,
    config::{AppConfig, AuthConfig},
    routes::router,
    state::AppState,
};

pub const TEST_ADMIN_API_KEY: &str = "wf_test_bootstrap_key_000000";

pub fn test_config(secret: &[u8]) -> AppConfig {
    AppConfig {
        auth: Some(AuthConfig {
            jwt_secret: String::from_utf8_lossy(secret).into_owned(),
            admin_email: "admin@example.com".to_string(),
            admin_api_key: TEST_ADMIN_API_KEY.to_string(),
            access_ttl_secs: 900,
            session_ttl_hours: 12,
        }),
        ..AppConfig::default()
    }
}

pub fn test_state(db: DatabaseConnection, secret: &[u8]) -> Arc<AppState> {
    AppState::new(test_config(secret), db, JwtKeys::from_secret(secret))
}

pub fn test_router(secret: &[u8]) -> Router {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    router(test_state(db, secret))
}

/// Models with fixed timestamps for mock database results.
pub mod fixtures {
    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
    use uuid::Uuid;

    use crate::db::entities::{
        ClockMethod, EmployeeStatus, TimeLogType, UserRole, api_key, employee, performance_metric,
        session, station, task_assignment, task_type, time_log, todo, user,
    };

    pub fn ts() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    pub fn date() -> NaiveDate {
        ts().date_naive()
    }

    pub fn employee(id: Uuid, email: &str) -> employee::Model {
        employee::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            pin_hash: String::new(),
            daily_hours_limit: 8.0,
            weekly_hours_limit: 40.0,
            employee_code: None,
            phone_number: None,
            hire_date: None,
            status: EmployeeStatus::Active,
            default_station_id: None,
            last_station_id: None,
        }
    }

    pub fn station(id: Uuid, name: &str) -> station::Model {
        station::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            name: name.to_string(),
            description: None,
            capacity: None,
            is_active: true,
            zone: None,
        }
    }

    pub fn open_log(id: Uuid, employee_id: Uuid, log_type: TimeLogType) -> time_log::Model {
        time_log::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            deleted_at: None,
            employee_id,
            station_id: None,
            log_type,
            start_time: ts(),
            end_time: None,
            note: None,
            corrected_by: None,
            task_id: None,
            clock_method: ClockMethod::Pin,
        }
    }

    pub fn task_type(id: Uuid, station_id: Uuid) -> task_type::Model {
        task_type::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            name: "Picking".to_string(),
            station_id,
            description: None,
            estimated_minutes_per_unit: Some(6.0),
            is_active: true,
        }
    }

    pub fn assignment(id: Uuid, employee_id: Uuid, task_type_id: Uuid) -> task_assignment::Model {
        task_assignment::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            employee_id,
            task_type_id,
            start_time: ts(),
            end_time: None,
            units_completed: 0,
            notes: None,
        }
    }

    pub fn metric(id: Uuid, employee_id: Uuid) -> performance_metric::Model {
        performance_metric::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            employee_id,
            date: date(),
            station_id: None,
            hours_worked: 0.0,
            units_processed: 0,
            efficiency: None,
            quality_score: None,
            overtime_hours: 0.0,
        }
    }

    pub fn user(id: Uuid, email: &str, role: UserRole) -> user::Model {
        user::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            email: email.to_string(),
            name: None,
            image: None,
            role,
            employee_id: None,
        }
    }

    pub fn api_key(id: Uuid, user_id: Uuid, key: &str) -> api_key::Model {
        api_key::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            name: "default".to_string(),
            key: key.to_string(),
            user_id,
            expires_at: None,
            last_used_at: None,
        }
    }

    pub fn session(id: Uuid, user_id: Uuid, expires_at: DateTime<FixedOffset>) -> session::Model {
        session::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            user_id,
            expires_at,
        }
    }

    pub fn todo(title: &str) -> todo::Model {
        todo::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            title: title.to_string(),
            completed: false,
        }
    }
}
