//! HTTP API for health, readiness, status, history, and metrics.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
