//! Physical constants of the simulated vehicle.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct VehicleParams {
    /// kg
    pub mass: f64,
    pub ixx: f64,
    pub iyy: f64,
    pub izz: f64,
    /// Water density, kg/m^3.
    pub rho: f64,
    /// Drag coefficient.
    pub cd: f64,
    /// Frontal reference area, m^2.
    pub area_ref: f64,
    /// Thrust at 100% propeller command, N.
    pub thrust_max: f64,
    pub fin_area: f64,
    pub fin_lift_slope: f64,
    pub fin_x: f64,
}

impl Default for VehicleParams {
    fn default() -> Self {
        let radius = 0.4572 / 2.0;
        Self {
            mass: 500.0,
            ixx: 90.0,
            iyy: 260.0,
            izz: 260.0,
            rho: 1025.0,
            cd: 0.1,
            area_ref: std::f64::consts::PI * radius * radius,
            thrust_max: 9000.0,
            fin_area: 0.0207,
            fin_lift_slope: 3.5,
            fin_x: -1.8,
        }
    }
}
