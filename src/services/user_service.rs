use sea_orm::IntoActiveModel;
use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, DaoLayerError, EmployeeDao, UserDao},
    db::entities::{UserRole, user},
    error::AppError,
    services::{
        crud_service::{CrudErrors, CrudOp, CrudService, active_value},
        employee_service::normalize_email,
    },
};

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
    employee_dao: EmployeeDao,
}

impl UserService {
    pub fn new(user_dao: UserDao, employee_dao: EmployeeDao) -> Self {
        Self {
            user_dao,
            employee_dao,
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AppError> {
        self.user_dao
            .find_by_email(&email.trim().to_ascii_lowercase())
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))
    }

    pub async fn create_user(
        &self,
        email: &str,
        name: Option<String>,
        role: UserRole,
        employee_id: Option<Uuid>,
    ) -> Result<user::Model, AppError> {
        let email = normalize_email(email)?;
        self.ensure_email_free(&email, None).await?;
        if let Some(employee_id) = employee_id {
            self.ensure_employee_link(employee_id, None).await?;
        }
        self.user_dao
            .create_user(&email, name, role, employee_id)
            .await
            .map_err(|err| self.map_error(CrudOp::Create, err))
    }

    pub async fn set_role(&self, id: Uuid, role: UserRole) -> Result<user::Model, AppError> {
        let updated = self
            .user_dao
            .set_role(id, role)
            .await
            .map_err(|err| self.map_error(CrudOp::Update, err))?;
        tracing::info!(user_id = %id, role = role.as_str(), "user role changed");
        Ok(updated)
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), AppError> {
        let existing = self
            .user_dao
            .find_by_email(email)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))?;
        match existing {
            Some(found) if Some(found.id) != except => {
                Err(AppError::conflict("A user with this email already exists"))
            }
            _ => Ok(()),
        }
    }

    /// The employee exists and no other user is linked to it.
    async fn ensure_employee_link(
        &self,
        employee_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        self.employee_dao
            .find_by_id(employee_id)
            .await
            .map_err(|err| match err {
                DaoLayerError::NotFound { .. } => AppError::bad_request("Employee does not exist"),
                other => self.map_error(CrudOp::Find, other),
            })?;
        let linked = self
            .user_dao
            .find_by_employee(employee_id)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))?;
        match linked {
            Some(found) if Some(found.id) != except => Err(AppError::conflict(
                "Employee is already linked to another user",
            )),
            _ => Ok(()),
        }
    }

    async fn validate(
        &self,
        active: &mut user::ActiveModel,
        id: Option<Uuid>,
    ) -> Result<(), AppError> {
        match active_value(&active.email) {
            Some(email) => {
                let email = normalize_email(email)?;
                self.ensure_email_free(&email, id).await?;
                active.email = sea_orm::Set(email);
            }
            None if id.is_none() => return Err(AppError::bad_request("A valid email is required")),
            None => {}
        }
        if let Some(Some(employee_id)) = active_value(&active.employee_id).copied() {
            self.ensure_employee_link(employee_id, id).await?;
        }
        if id.is_none() && active.role.is_not_set() {
            active.role = sea_orm::Set(UserRole::default());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CrudService for UserService {
    type Dao = UserDao;

    fn dao(&self) -> &Self::Dao {
        &self.user_dao
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "User not found",
            conflict: "User email or employee link already exists",
            ..CrudErrors::default()
        }
    }

    async fn create<T>(&self, data: T) -> Result<user::Model, AppError>
    where
        T: IntoActiveModel<user::ActiveModel> + Send,
    {
        let mut active = data.into_active_model();
        self.validate(&mut active, None).await?;
        self.user_dao
            .create(active)
            .await
            .map_err(|err| self.map_error(CrudOp::Create, err))
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<user::Model, AppError>
    where
        F: for<'a> FnOnce(&'a mut user::ActiveModel) + Send,
    {
        let current = CrudService::find_by_id(self, id).await?;
        let mut active = current.into_active_model();
        apply(&mut active);
        if active.email.is_set() || active.employee_id.is_set() {
            let mut changed = user::ActiveModel {
                email: active.email.clone(),
                employee_id: active.employee_id.clone(),
                ..Default::default()
            };
            self.validate(&mut changed, Some(id)).await?;
            active.email = changed.email;
        }
        self.user_dao
            .update(id, move |target| *target = active)
            .await
            .map_err(|err| self.map_error(CrudOp::Update, err))
    }
}
