//! Flight Dynamics Library
//!
//! Discrete-time spacecraft state integrator for a single body in Earth orbit:
//! point-mass gravity, exponential-atmosphere drag and fuel-limited thrust,
//! composed and advanced one explicit step at a time.

use thiserror::Error;

pub mod forces;
pub mod params;
pub mod simulation;
pub mod state;

pub use params::{MissionParameters, ParameterKey};
pub use simulation::{OrbitalElements, Simulation, SimulationStats};
pub use state::{SimulationState, TrajectoryRow};

/// Mean Earth radius (m)
pub const EARTH_RADIUS_M: f64 = 6.371e6;

/// Earth mass (kg)
pub const EARTH_MASS_KG: f64 = 5.972e24;

/// Newtonian gravitational constant (m³/kg/s²)
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674e-11;

/// Earth gravitational parameter μ = G·M (m³/s²)
pub const MU_EARTH: f64 = GRAVITATIONAL_CONSTANT * EARTH_MASS_KG;

/// Kármán line (m). Descending to or below it ends the mission.
pub const KARMAN_LINE_M: f64 = 100_000.0;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Circular orbital speed at radius `r` (m) from Earth's center.
pub fn circular_speed(r: f64) -> f64 {
    (MU_EARTH / r).sqrt()
}
