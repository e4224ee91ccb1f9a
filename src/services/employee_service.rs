use chrono::NaiveDate;
use sea_orm::Set;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::{
    auth::pin,
    config::WorkforceConfig,
    db::dao::{DaoBase, EmployeeDao, StationDao},
    db::entities::{EmployeeStatus, employee},
    error::AppError,
    services::crud_service::{CrudErrors, CrudOp, CrudService},
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub pin: String,
    pub daily_hours_limit: Option<f64>,
    pub weekly_hours_limit: Option<f64>,
    pub employee_code: Option<String>,
    pub phone_number: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub status: Option<EmployeeStatus>,
    pub default_station_id: Option<Uuid>,
}

/// Fields an employee update may change. Absent fields stay as they are;
/// the nullable ones are cleared by an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmployeePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub daily_hours_limit: Option<f64>,
    pub weekly_hours_limit: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub employee_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub hire_date: Option<Option<NaiveDate>>,
    pub status: Option<EmployeeStatus>,
    #[serde(default, deserialize_with = "present")]
    pub default_station_id: Option<Option<Uuid>>,
}

/// Marks a key that was sent, so `null` reads as `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Clone)]
pub struct EmployeeService {
    employee_dao: EmployeeDao,
    station_dao: StationDao,
    workforce: WorkforceConfig,
}

fn validate_limits(daily: f64, weekly: f64) -> Result<(), AppError> {
    if !(daily > 0.0 && daily <= 24.0) {
        return Err(AppError::bad_request(
            "daily_hours_limit must be greater than 0 and at most 24",
        ));
    }
    if !(weekly > 0.0 && weekly <= 168.0) {
        return Err(AppError::bad_request(
            "weekly_hours_limit must be greater than 0 and at most 168",
        ));
    }
    if weekly < daily {
        return Err(AppError::bad_request(
            "weekly_hours_limit must not be below daily_hours_limit",
        ));
    }
    Ok(())
}

pub(crate) fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("A valid email is required"));
    }
    Ok(email)
}

impl EmployeeService {
    pub fn new(
        employee_dao: EmployeeDao,
        station_dao: StationDao,
        workforce: WorkforceConfig,
    ) -> Self {
        Self {
            employee_dao,
            station_dao,
            workforce,
        }
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), AppError> {
        let existing = self
            .employee_dao
            .find_by_email(email)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))?;
        match existing {
            Some(found) if Some(found.id) != except => Err(AppError::conflict(
                "An employee with this email already exists",
            )),
            _ => Ok(()),
        }
    }

    async fn ensure_code_free(&self, code: &str, except: Option<Uuid>) -> Result<(), AppError> {
        let existing = self
            .employee_dao
            .find_by_code(code)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))?;
        match existing {
            Some(found) if Some(found.id) != except => {
                Err(AppError::conflict("Employee code is already in use"))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_station(&self, station_id: Uuid) -> Result<(), AppError> {
        self.station_dao
            .find_by_id(station_id)
            .await
            .map(|_| ())
            .map_err(|err| match err {
                crate::db::dao::DaoLayerError::NotFound { .. } => {
                    AppError::bad_request("Default station does not exist")
                }
                other => self.map_error(CrudOp::Find, other),
            })
    }

    pub async fn create_employee(&self, input: NewEmployee) -> Result<employee::Model, AppError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::bad_request("Employee name is required"));
        }
        let email = normalize_email(&input.email)?;
        let daily = input
            .daily_hours_limit
            .unwrap_or(self.workforce.default_daily_hours_limit);
        let weekly = input
            .weekly_hours_limit
            .unwrap_or(self.workforce.default_weekly_hours_limit);
        validate_limits(daily, weekly)?;
        let pin_hash = pin::hash_pin(&input.pin, self.workforce.min_pin_length)?;

        self.ensure_email_free(&email, None).await?;
        if let Some(code) = input.employee_code.as_deref() {
            self.ensure_code_free(code, None).await?;
        }
        if let Some(station_id) = input.default_station_id {
            self.ensure_station(station_id).await?;
        }

        let model = employee::ActiveModel {
            name: Set(name),
            email: Set(email),
            pin_hash: Set(pin_hash),
            daily_hours_limit: Set(daily),
            weekly_hours_limit: Set(weekly),
            employee_code: Set(input.employee_code),
            phone_number: Set(input.phone_number),
            hire_date: Set(input.hire_date),
            status: Set(input.status.unwrap_or(EmployeeStatus::Active)),
            default_station_id: Set(input.default_station_id),
            last_station_id: Set(None),
            ..Default::default()
        };
        CrudService::create(self, model).await
    }

    pub async fn update_employee(
        &self,
        id: Uuid,
        patch: EmployeePatch,
    ) -> Result<employee::Model, AppError> {
        let current = CrudService::find_by_id(self, id).await?;

        let email = patch.email.as_deref().map(normalize_email).transpose()?;
        if let Some(email) = email.as_deref() {
            self.ensure_email_free(email, Some(id)).await?;
        }
        if let Some(Some(code)) = patch.employee_code.as_ref() {
            self.ensure_code_free(code, Some(id)).await?;
        }
        if let Some(Some(station_id)) = patch.default_station_id {
            self.ensure_station(station_id).await?;
        }
        if let Some(name) = patch.name.as_deref()
            && name.trim().is_empty()
        {
            return Err(AppError::bad_request("Employee name is required"));
        }
        validate_limits(
            patch.daily_hours_limit.unwrap_or(current.daily_hours_limit),
            patch.weekly_hours_limit.unwrap_or(current.weekly_hours_limit),
        )?;

        CrudService::update(self, id, move |active| {
            if let Some(name) = patch.name {
                active.name = Set(name.trim().to_string());
            }
            if let Some(email) = email {
                active.email = Set(email);
            }
            if let Some(limit) = patch.daily_hours_limit {
                active.daily_hours_limit = Set(limit);
            }
            if let Some(limit) = patch.weekly_hours_limit {
                active.weekly_hours_limit = Set(limit);
            }
            if let Some(code) = patch.employee_code {
                active.employee_code = Set(code);
            }
            if let Some(phone) = patch.phone_number {
                active.phone_number = Set(phone);
            }
            if let Some(hire_date) = patch.hire_date {
                active.hire_date = Set(hire_date);
            }
            if let Some(status) = patch.status {
                active.status = Set(status);
            }
            if let Some(station_id) = patch.default_station_id {
                active.default_station_id = Set(station_id);
            }
        })
        .await
    }

    pub async fn set_pin(&self, id: Uuid, new_pin: &str) -> Result<employee::Model, AppError> {
        let pin_hash = pin::hash_pin(new_pin, self.workforce.min_pin_length)?;
        self.employee_dao
            .set_pin_hash(id, pin_hash)
            .await
            .map_err(|err| self.map_error(CrudOp::Update, err))
    }
}

impl CrudService for EmployeeService {
    type Dao = EmployeeDao;

    fn dao(&self) -> &Self::Dao {
        &self.employee_dao
    }

    fn hidden_columns(&self) -> &'static [&'static str] {
        &["pin_hash"]
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Employee not found",
            conflict: "Employee email or code already exists",
            ..CrudErrors::default()
        }
    }
}
