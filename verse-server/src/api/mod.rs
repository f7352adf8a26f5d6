//! HTTP API handlers for verse-server

pub mod error;
pub mod health;
pub mod poems;
pub mod progress;

pub use error::ApiError;
pub use health::health_routes;
pub use poems::poem_routes;
pub use progress::progress_routes;
