//! Simulated vehicle.
//!
//! # Data Flow
//! ```text
//! HTTP handlers ──set control──▶ SharedVehicle ◀──step── engine.rs (every step_ms)
//!                 ◀──snapshot──
//! ```
//!
//! The vehicle is behind a single mutex; handlers and the engine each hold
//! it only for one short read or write.

pub mod engine;
pub mod params;
pub mod physics;
pub mod vehicle;

pub use engine::SimEngine;
pub use params::VehicleParams;
pub use vehicle::{Control, Controls, SharedVehicle, SimState, StatusReport};
