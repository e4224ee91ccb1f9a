mod guards;
mod json_error;
mod panic;
mod role_layer;

pub use guards::{API_KEY_HEADER, AuthGuard, AuthRoleGuard, authenticate};
pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;
pub use role_layer::RequireRoleLayer;
