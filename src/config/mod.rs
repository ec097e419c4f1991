//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SimConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the admission policy
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks
//! - Reload never resets per-client rate limit state

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    FilterConfig, ListenerConfig, LogFormat, ObservabilityConfig, PatternConfig, RateLimitConfig,
    SimConfig, SimulationConfig, TimeoutConfig, ValidationConfig,
};
pub use watcher::ConfigWatcher;
