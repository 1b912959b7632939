//! Service layer: application state, HTTP routes and health reporting

pub mod app;
pub mod health;
pub mod routes;

pub use app::{AppState, GeneratedMatch, ServiceError};
pub use health::{HealthCheck, HealthStatus};
pub use routes::{create_router, ApiError};
