//! Simulated underwater vehicle API behind a request admission layer.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod sim;

pub use config::SimConfig;
pub use error::ApiError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
