//! Background physics loop.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::SimulationConfig;
use crate::sim::params::VehicleParams;
use crate::sim::vehicle::SharedVehicle;

pub struct SimEngine {
    vehicle: SharedVehicle,
    params: VehicleParams,
    step: Duration,
}

impl SimEngine {
    pub fn new(vehicle: SharedVehicle, config: &SimulationConfig) -> Self {
        Self {
            vehicle,
            params: config.vehicle.clone(),
            step: Duration::from_millis(config.step_ms.max(1)),
        }
    }

    /// Step the vehicle at a fixed rate until shutdown is signalled.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let dt = self.step.as_secs_f64();
        let mut ticker = time::interval(self.step);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(step_ms = self.step.as_millis() as u64, "Simulation loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.vehicle.step(&self.params, dt),
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Simulation loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::vehicle::Control;

    #[tokio::test]
    async fn test_engine_advances_and_stops() {
        let vehicle = SharedVehicle::new();
        vehicle.set_control(Control::Prop, 100);

        let config = SimulationConfig {
            step_ms: 5,
            ..SimulationConfig::default()
        };
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(SimEngine::new(vehicle.clone(), &config).run(rx));

        tokio::time::sleep(Duration::from_millis(60)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(vehicle.snapshot().pos_m.x > 0.0);
    }
}
