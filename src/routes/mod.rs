pub mod api;
pub mod base_api_router;
pub mod base_router;
pub mod crud_api_router;
mod entry;
pub mod route_list;

pub use crud_api_router::{CrudApiRouter, Method};
pub use entry::{API_PREFIX, router};
