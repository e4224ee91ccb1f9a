use sea_orm::DatabaseConnection;

use crate::{
    auth::jwt::JwtKeys,
    config::{AppConfig, WorkforceConfig},
    db::dao::DaoContext,
    db::transaction::TransactionOptions,
    services::{
        api_key_service::ApiKeyService,
        auth_service::{AuthService, SessionPolicy},
        clock_service::ClockService,
        employee_service::EmployeeService,
        oauth_account_service::OAuthAccountService,
        performance_service::PerformanceService,
        session_service::SessionService,
        station_service::StationService,
        task_assignment_service::TaskAssignmentService,
        task_type_service::TaskTypeService,
        time_log_service::TimeLogService,
        todo_service::TodoService,
        user_service::UserService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
    workforce: WorkforceConfig,
    session_policy: SessionPolicy,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection, config: &AppConfig) -> Self {
        Self {
            daos: DaoContext::new(db)
                .with_transaction_options(TransactionOptions::from(&config.transaction)),
            workforce: config.workforce.clone(),
            session_policy: SessionPolicy::from(config.auth.as_ref()),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db, &state.config)
    }

    pub fn daos(&self) -> &DaoContext {
        &self.daos
    }

    pub fn employee(&self) -> EmployeeService {
        EmployeeService::new(
            self.daos.employee(),
            self.daos.station(),
            self.workforce.clone(),
        )
    }

    pub fn station(&self) -> StationService {
        StationService::new(self.daos.station())
    }

    pub fn time_log(&self) -> TimeLogService {
        TimeLogService::new(self.daos.time_log())
    }

    pub fn clock(&self) -> ClockService {
        ClockService::new(self.daos.clone(), self.workforce.clone())
    }

    pub fn task_type(&self) -> TaskTypeService {
        TaskTypeService::new(self.daos.task_type(), self.daos.station())
    }

    pub fn task_assignment(&self) -> TaskAssignmentService {
        TaskAssignmentService::new(self.daos.clone())
    }

    pub fn performance(&self) -> PerformanceService {
        PerformanceService::new(self.daos.clone())
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user(), self.daos.employee())
    }

    pub fn api_key(&self) -> ApiKeyService {
        ApiKeyService::new(self.daos.api_key(), self.daos.user())
    }

    pub fn session(&self) -> SessionService {
        SessionService::new(self.daos.session())
    }

    pub fn oauth_account(&self) -> OAuthAccountService {
        OAuthAccountService::new(self.daos.oauth_account(), self.daos.user())
    }

    pub fn todo(&self) -> TodoService {
        TodoService::new(self.daos.todo())
    }

    pub fn auth<'a>(&self, jwt: &'a JwtKeys) -> AuthService<'a> {
        AuthService::new(
            jwt,
            self.session_policy,
            self.daos.user(),
            self.api_key(),
            self.session(),
        )
    }
}
