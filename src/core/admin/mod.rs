//! Protected admin area: dashboard, catalog, orders and user management

pub mod api;

pub use api::{AdminApiError, AdminApiState, admin_api_router};
