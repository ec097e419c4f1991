//! Vehicle state shared between the HTTP handlers and the physics loop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::sim::params::VehicleParams;
use crate::sim::physics::{self, rad2deg};

/// Kinematic state. Angles are in radians.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimState {
    pub pos: [f64; 3],
    pub vel: [f64; 3],
    pub omega: [f64; 3],
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

/// Last commanded control values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub pitch_fin: i64,
    pub yaw_fin: i64,
    pub prop: i64,
}

/// A single commandable control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    PitchFin,
    YawFin,
    Prop,
}

impl Control {
    /// JSON key used when reporting this control.
    pub fn key(&self) -> &'static str {
        match self {
            Control::PitchFin => "pitch_fin",
            Control::YawFin => "yaw_fin",
            Control::Prop => "prop",
        }
    }
}

impl Controls {
    pub fn set(&mut self, control: Control, value: i64) {
        match control {
            Control::PitchFin => self.pitch_fin = value,
            Control::YawFin => self.yaw_fin = value,
            Control::Prop => self.prop = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self { x: v[0], y: v[1], z: v[2] }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attitude {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub pos_m: Vec3,
    pub vel_mps: Vec3,
    pub att_deg: Attitude,
    pub controls: Controls,
}

#[derive(Debug, Default)]
struct Vehicle {
    state: SimState,
    controls: Controls,
}

/// Mutex-guarded vehicle, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct SharedVehicle {
    inner: Arc<Mutex<Vehicle>>,
}

impl SharedVehicle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vehicle> {
        // A panic mid-update leaves plain numbers behind, still safe to read.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> StatusReport {
        let vehicle = self.lock();
        let state = &vehicle.state;
        StatusReport {
            pos_m: state.pos.into(),
            vel_mps: state.vel.into(),
            att_deg: Attitude {
                yaw: rad2deg(state.yaw),
                pitch: rad2deg(state.pitch),
                roll: rad2deg(state.roll),
            },
            controls: vehicle.controls,
        }
    }

    pub fn controls(&self) -> Controls {
        self.lock().controls
    }

    pub fn set_control(&self, control: Control, value: i64) {
        self.lock().controls.set(control, value);
    }

    /// Integrate one step under the current controls.
    pub fn step(&self, params: &VehicleParams, dt: f64) {
        let mut vehicle = self.lock();
        let controls = vehicle.controls;
        physics::step(params, &mut vehicle.state, &controls, dt);
    }
}
