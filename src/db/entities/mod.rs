#[allow(unused_imports)]
pub mod prelude {
    pub use super::api_key::Entity as ApiKey;
    pub use super::employee::Entity as Employee;
    pub use super::oauth_account::Entity as OAuthAccount;
    pub use super::performance_metric::Entity as PerformanceMetric;
    pub use super::session::Entity as Session;
    pub use super::station::Entity as Station;
    pub use super::task_assignment::Entity as TaskAssignment;
    pub use super::task_type::Entity as TaskType;
    pub use super::time_log::Entity as TimeLog;
    pub use super::todo::Entity as Todo;
    pub use super::user::Entity as User;
}

pub mod api_key;
pub mod employee;
pub mod enums;
pub mod oauth_account;
pub mod performance_metric;
pub mod session;
pub mod station;
pub mod task_assignment;
pub mod task_type;
pub mod time_log;
pub mod todo;
pub mod user;

pub use enums::{ClockMethod, EmployeeStatus, TimeLogType, UserRole};
