//! Explicit Euler integration of the vehicle state.

use crate::sim::params::VehicleParams;
use crate::sim::vehicle::{Controls, SimState};

/// Attitude rate per degree of fin deflection, as a fraction of the deflection per second.
const FIN_RATE_GAIN: f64 = 0.1;

pub fn clamp<T: PartialOrd>(x: T, lo: T, hi: T) -> T {
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}

pub fn deg2rad(d: f64) -> f64 {
    d.to_radians()
}

pub fn rad2deg(r: f64) -> f64 {
    r.to_degrees()
}

/// Quadratic drag opposing the velocity vector.
pub fn drag_force(params: &VehicleParams, vel: [f64; 3]) -> [f64; 3] {
    let speed = vel.iter().map(|v| v * v).sum::<f64>().sqrt();
    if speed < 1e-6 {
        return [0.0; 3];
    }
    let k = 0.5 * params.rho * params.cd * params.area_ref;
    [-k * speed * vel[0], -k * speed * vel[1], -k * speed * vel[2]]
}

/// Advance `state` by `dt` seconds under `controls`.
pub fn step(params: &VehicleParams, state: &mut SimState, controls: &Controls, dt: f64) {
    let thrust = params.thrust_max * (controls.prop as f64 / 100.0);
    let drag = drag_force(params, state.vel);

    let accel = [
        (thrust + drag[0]) / params.mass,
        drag[1] / params.mass,
        drag[2] / params.mass,
    ];

    for axis in 0..3 {
        state.vel[axis] += accel[axis] * dt;
    }
    for axis in 0..3 {
        state.pos[axis] += state.vel[axis] * dt;
    }

    state.yaw += deg2rad(controls.yaw_fin as f64) * dt * FIN_RATE_GAIN;
    state.pitch += deg2rad(controls.pitch_fin as f64) * dt * FIN_RATE_GAIN;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5, 0, 10), 5);
        assert_eq!(clamp(0, 0, 10), 0);
        assert_eq!(clamp(10, 0, 10), 10);
        assert_eq!(clamp(100, -30, 30), 30);
        assert_eq!(clamp(-100, -30, 30), -30);
    }

    #[test]
    fn test_angle_conversion() {
        assert!((deg2rad(180.0) - std::f64::consts::PI).abs() < 1e-9);
        assert!((rad2deg(std::f64::consts::FRAC_PI_2) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_zero_at_rest() {
        let params = VehicleParams::default();
        assert_eq!(drag_force(&params, [0.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_drag_opposes_motion() {
        let params = VehicleParams::default();
        let force = drag_force(&params, [1.0, 0.0, 0.0]);
        assert!(force[0] < 0.0);
        assert_eq!(force[1], 0.0);
        assert_eq!(force[2], 0.0);
    }

    #[test]
    fn test_thrust_accelerates_forward() {
        let params = VehicleParams::default();
        let mut state = SimState::default();
        let controls = Controls { prop: 100, ..Controls::default() };

        step(&params, &mut state, &controls, 0.01);
        assert!(state.vel[0] > 0.0);
        assert!(state.pos[0] > 0.0);

        let before = state.pos[0];
        for _ in 0..10 {
            step(&params, &mut state, &controls, 0.01);
        }
        assert!(state.pos[0] > before);
    }

    #[test]
    fn test_fins_change_attitude() {
        let params = VehicleParams::default();
        let mut state = SimState::default();
        let controls = Controls { pitch_fin: 10, yaw_fin: -10, prop: 0 };

        step(&params, &mut state, &controls, 0.01);
        assert!(state.pitch > 0.0);
        assert!(state.yaw < 0.0);
        assert_eq!(state.roll, 0.0);
    }
}
