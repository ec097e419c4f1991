//! Admission layer.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → dispatcher.rs (orchestrates, maps failures to status codes)
//!         → rate_limit.rs (per-IP sliding window + temporary block)
//!         → filter.rs (user agent, header names, declared size)
//!     → route handler
//!         → validation.rs (body structure, denylist patterns, numeric range)
//!     → headers.rs (hardening headers on every response)
//! ```
//!
//! # Design Decisions
//! - Cheapest state-only check first, metadata next, body last
//! - Fail closed: reject on any check failure
//! - Rejection messages never say which check fired

pub mod dispatcher;
pub mod filter;
pub mod headers;
pub mod rate_limit;
pub mod validation;

pub use dispatcher::{admission_middleware, AdmissionPolicy, ClientId, Dispatcher, RequestDescriptor};
pub use filter::RequestFilter;
pub use rate_limit::RateLimiter;
pub use validation::{InputValidator, PatternSet, ValidationOutcome};
