//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse CLI → Load config → Init logging/metrics → Bind → Serve
//!
//! Shutdown:
//!     signals.rs (SIGINT/SIGTERM) → Shutdown::trigger
//!     → server stops accepting, drains → physics loop exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
