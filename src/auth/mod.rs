pub mod api_key;
pub mod bootstrap;
pub mod jwt;
pub mod pin;
mod types;

pub use types::{
    AdminRole, AnyRole, Claims, ManagerRole, ReportRole, RequiredRole, Role, WorkerRole, role_set,
};
