// src/simulator/drift.rs - Background sensor drift
use rand::Rng;
use std::time::Duration;

use crate::board::Sensors;
use crate::config::DriftConfig;
use crate::web::api::AppState;
use crate::board::{Envelope, ServerMessage};

const TEMPERATURE_MIN: f64 = 15.0;
const TEMPERATURE_MAX: f64 = 40.0;
const LIGHT_MIN: i64 = 0;
const LIGHT_MAX: i64 = 1023;

/// Periodically perturbs temperature and light and pushes the new readings
/// to every connected client.
#[derive(Debug, Clone)]
pub struct SensorDrift {
    interval: Duration,
    temperature_step: f64,
    light_step: i64,
}

impl SensorDrift {
    /// Steps outside what `Config::validate` accepts are reduced to a
    /// usable range: a non-finite temperature step disables temperature drift
    /// and the light step is capped at the full ADC span.
    pub fn new(config: &DriftConfig) -> Self {
        let temperature_step = if config.temperature_step.is_finite() {
            config.temperature_step.abs()
        } else {
            0.0
        };
        Self {
            interval: config.interval(),
            temperature_step,
            light_step: config.light_step.saturating_abs().min(LIGHT_MAX),
        }
    }

    /// Apply one bounded random step to the sensors, clamped to the physical
    /// range of each sensor.
    pub fn nudge<R: Rng>(&self, sensors: &mut Sensors, rng: &mut R) {
        let dt = rng.random_range(-self.temperature_step..=self.temperature_step);
        sensors.temperature = (sensors.temperature + dt).clamp(TEMPERATURE_MIN, TEMPERATURE_MAX);

        let dl = rng.random_range(-self.light_step..=self.light_step);
        sensors.light = sensors.light.saturating_add(dl).clamp(LIGHT_MIN, LIGHT_MAX);
    }

    fn drift(&self, sensors: &mut Sensors) {
        self.nudge(sensors, &mut rand::rng());
    }

    /// One drift step. Returns how many clients received the update.
    pub async fn tick(&self, state: &AppState) -> usize {
        let mut board = state.board.write().await;
        self.drift(&mut board.sensors);
        let sensors = board.sensors;
        tracing::debug!(
            "Sensors drifted: temperature={:.2} light={}",
            sensors.temperature,
            sensors.light
        );

        if state.clients.is_empty().await {
            return 0;
        }
        // Queued under the board guard so it cannot overtake a newer state_update.
        match Envelope::new(ServerMessage::SensorUpdate { sensors }).to_json() {
            Ok(payload) => state.clients.broadcast(&payload, None).await,
            Err(e) => {
                tracing::error!("Failed to encode sensor update: {}", e);
                0
            }
        }
    }

    /// Run forever, sleeping one interval before each step.
    pub async fn run(self, state: AppState) {
        tracing::info!("Sensor drift running every {:?}", self.interval);
        loop {
            tokio::time::sleep(self.interval).await;
            self.tick(&state).await;
        }
    }
}
