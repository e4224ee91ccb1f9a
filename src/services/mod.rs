pub mod api_key_service;
pub mod auth_service;
pub mod clock_service;
pub mod context;
pub mod crud_service;
pub mod employee_service;
pub mod oauth_account_service;
pub mod performance_service;
pub mod session_service;
pub mod station_service;
pub mod task_assignment_service;
pub mod task_type_service;
pub mod time_log_service;
pub mod todo_service;
pub mod user_service;

pub use context::ServiceContext;
