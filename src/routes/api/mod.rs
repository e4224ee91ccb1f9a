pub mod api_keys;
pub mod auth;
pub mod clock;
pub mod employees;
pub mod oauth_accounts;
pub mod performance;
pub mod public;
mod router;
pub mod sessions;
pub mod stations;
pub mod task_assignments;
pub mod task_types;
pub mod time_logs;
pub mod todos;
pub mod users;

pub use router::router;
