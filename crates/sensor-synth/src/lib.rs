//! Sensor Synthesis Library
//!
//! Synthetic telemetry for a simulated spacecraft. Each flight-dynamics state
//! is turned into a reading across 21 instrument channels (inertial,
//! navigation, environment, power, propulsion, communication) with
//! calibration bias, drift, noise and random failures.
//!
//! ```no_run
//! use flight_dynamics::{MissionParameters, Simulation};
//! use sensor_synth::{ExportFormat, SensorEngine};
//!
//! let params = MissionParameters::default();
//! let mut sim = Simulation::new(params.clone())?;
//! let mut sensors = SensorEngine::with_seed(params, 42);
//!
//! for _ in 0..60 {
//!     let state = sim.step(None).clone();
//!     sensors.generate_sensor_data(&state);
//! }
//! sensors.export_data("telemetry.csv", ExportFormat::Csv)?;
//! # Ok::<(), sensor_synth::SensorError>(())
//! ```

use thiserror::Error;

pub mod catalog;
pub mod engine;
pub mod export;
pub mod summary;
pub mod truth;

pub use catalog::{SensorCatalog, SensorConfig, SensorId};
pub use engine::{ChannelReading, Reading, SensorEngine, SensorState, SensorStatus};
pub use export::{load_readings, ExportFormat};
pub use summary::SensorSummary;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Sensor not found: {0}")]
    NotFound(String),
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("Parameter error: {0}")]
    Parameters(#[from] flight_dynamics::SimError),
    #[error("Malformed row: {0}")]
    MalformedRow(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("Timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

pub type Result<T> = std::result::Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use flight_dynamics::{MissionParameters, Simulation};
    use nalgebra::Vector3;

    #[test]
    fn test_error_display() {
        let err = SensorError::NotFound("warp_core".to_string());
        assert_eq!(err.to_string(), "Sensor not found: warp_core");

        let err = SensorError::UnsupportedFormat("parquet".to_string());
        assert_eq!(err.to_string(), "Unsupported export format: parquet");
    }

    #[test]
    fn test_flight_to_telemetry() {
        let params = MissionParameters::default();
        let mut sim = Simulation::new(params.clone()).unwrap();
        let mut sensors = SensorEngine::with_seed(params, 8);

        let burn = vec![Vector3::new(0.0, 10_000.0, 0.0); 10];
        sim.run_simulation(Some(30), &burn);
        let readings = sensors.generate_batch_data(sim.state_history());
        assert_eq!(readings.len(), 31);

        // burn visible on the propulsion channels, truth is exact
        let firing = readings[5].get(SensorId::ThrustMagnitude).unwrap();
        assert_eq!(firing.true_value, 10_000.0);
        let engine_temp = readings[5].get(SensorId::EngineTemperature).unwrap();
        assert_eq!(engine_temp.true_value, 525.0);

        let coasting = readings[20].get(SensorId::ThrustMagnitude).unwrap();
        assert_eq!(coasting.true_value, 0.0);

        let fuel = readings[30].get(SensorId::FuelLevel).unwrap();
        assert!((fuel.true_value - 499.0).abs() < 1e-9);

        // altitude stays near 400 km
        let altitude = readings[30].get(SensorId::Altitude).unwrap();
        assert!((altitude.true_value - 400_000.0).abs() < 1_000.0);

        let summary = sensors.summary();
        assert_eq!(summary[&SensorId::Altitude].count, 31);
    }
}
