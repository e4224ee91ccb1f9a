pub mod api_key_dao;
pub mod base;
pub mod base_traits;
mod context;
pub mod employee_dao;
pub mod error;
pub mod oauth_account_dao;
pub mod performance_metric_dao;
pub mod session_dao;
pub mod soft_delete;
pub mod station_dao;
pub mod task_assignment_dao;
pub mod task_type_dao;
pub mod time_log_dao;
pub mod todo_dao;
pub mod user_dao;

pub use api_key_dao::ApiKeyDao;
pub use base::{
    AggregateResult, ColumnFilter, CompareOp, DaoBase, DaoPager, FilterOp, GroupCount,
    PaginatedResponse, apply_filters,
};
pub use base_traits::{
    HasIdActiveModel, HasTimestampColumns, SoftDeleteActiveModel, SoftDeleteEntity,
    TimestampedActiveModel,
};
pub use context::DaoContext;
pub use employee_dao::EmployeeDao;
pub use error::{DaoLayerError, DaoResult};
pub use oauth_account_dao::OAuthAccountDao;
pub use performance_metric_dao::PerformanceMetricDao;
pub use session_dao::SessionDao;
pub use soft_delete::{SoftDeleteDao, visible};
pub use station_dao::StationDao;
pub use task_assignment_dao::TaskAssignmentDao;
pub use task_type_dao::TaskTypeDao;
pub use time_log_dao::TimeLogDao;
pub use todo_dao::TodoDao;
pub use user_dao::UserDao;
