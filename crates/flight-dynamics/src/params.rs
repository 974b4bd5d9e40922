//! Mission parameters
//!
//! Physical and mission constants for one run. A parameter set is read-only
//! while a step executes and may be replaced between steps; every write goes
//! through [`MissionParameters::set`] against the fixed [`ParameterKey`] schema.

use crate::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Default per-sensor noise knob. Catalog noise fractions are scaled by
/// `sensor_noise_level / DEFAULT_SENSOR_NOISE_LEVEL`.
pub const DEFAULT_SENSOR_NOISE_LEVEL: f64 = 0.01;

/// Default sensor failure knob. Catalog failure probabilities are scaled by
/// `sensor_failure_rate / DEFAULT_SENSOR_FAILURE_RATE`.
pub const DEFAULT_SENSOR_FAILURE_RATE: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MissionParameters {
    // Mission
    /// Mission duration (s)
    pub mission_duration: f64,
    /// Integration step (s)
    pub time_step: f64,

    // Spacecraft
    /// Spacecraft mass (kg), constant over the run
    pub mass: f64,
    /// Maximum thrust (N)
    pub thrust: f64,
    /// Fuel load at reset (kg)
    pub fuel_capacity: f64,
    /// Fuel flow at full thrust (kg/s)
    pub fuel_consumption_rate: f64,

    // Orbit
    /// Altitude above mean Earth radius at reset (m)
    pub initial_altitude: f64,
    /// Nominal insertion speed (m/s). Reset always uses circular speed.
    pub initial_velocity: f64,
    /// Orbit inclination at reset (deg)
    pub orbital_inclination: f64,

    // Environment
    /// Base density of the exponential atmosphere (kg/m³)
    pub atmospheric_density: f64,
    pub drag_coefficient: f64,
    /// Cross-sectional area (m²)
    pub spacecraft_area: f64,

    // Sensors
    pub sensor_noise_level: f64,
    pub sensor_failure_rate: f64,
}

impl Default for MissionParameters {
    fn default() -> Self {
        Self {
            mission_duration: 3600.0,
            time_step: 1.0,
            mass: 1000.0,
            thrust: 10_000.0,
            fuel_capacity: 500.0,
            fuel_consumption_rate: 0.1,
            initial_altitude: 400_000.0,
            initial_velocity: 7800.0,
            orbital_inclination: 0.0,
            atmospheric_density: 1e-12,
            drag_coefficient: 2.2,
            spacecraft_area: 10.0,
            sensor_noise_level: DEFAULT_SENSOR_NOISE_LEVEL,
            sensor_failure_rate: DEFAULT_SENSOR_FAILURE_RATE,
        }
    }
}

/// Every parameter name that may be updated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKey {
    MissionDuration,
    TimeStep,
    Mass,
    Thrust,
    FuelCapacity,
    FuelConsumptionRate,
    InitialAltitude,
    InitialVelocity,
    OrbitalInclination,
    AtmosphericDensity,
    DragCoefficient,
    SpacecraftArea,
    SensorNoiseLevel,
    SensorFailureRate,
}

impl ParameterKey {
    pub const ALL: [ParameterKey; 14] = [
        ParameterKey::MissionDuration,
        ParameterKey::TimeStep,
        ParameterKey::Mass,
        ParameterKey::Thrust,
        ParameterKey::FuelCapacity,
        ParameterKey::FuelConsumptionRate,
        ParameterKey::InitialAltitude,
        ParameterKey::InitialVelocity,
        ParameterKey::OrbitalInclination,
        ParameterKey::AtmosphericDensity,
        ParameterKey::DragCoefficient,
        ParameterKey::SpacecraftArea,
        ParameterKey::SensorNoiseLevel,
        ParameterKey::SensorFailureRate,
    ];

    /// Field name as used in parameter files and update maps
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissionDuration => "mission_duration",
            Self::TimeStep => "time_step",
            Self::Mass => "mass",
            Self::Thrust => "thrust",
            Self::FuelCapacity => "fuel_capacity",
            Self::FuelConsumptionRate => "fuel_consumption_rate",
            Self::InitialAltitude => "initial_altitude",
            Self::InitialVelocity => "initial_velocity",
            Self::OrbitalInclination => "orbital_inclination",
            Self::AtmosphericDensity => "atmospheric_density",
            Self::DragCoefficient => "drag_coefficient",
            Self::SpacecraftArea => "spacecraft_area",
            Self::SensorNoiseLevel => "sensor_noise_level",
            Self::SensorFailureRate => "sensor_failure_rate",
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKey {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SimError::UnknownParameter(s.to_string()))
    }
}

impl MissionParameters {
    /// Load a parameter set from a JSON object. Missing fields take defaults,
    /// unknown fields are rejected.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading mission parameters from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let params: MissionParameters = serde_json::from_reader(reader)?;
        params.validate()?;

        Ok(params)
    }

    pub fn get(&self, key: ParameterKey) -> f64 {
        match key {
            ParameterKey::MissionDuration => self.mission_duration,
            ParameterKey::TimeStep => self.time_step,
            ParameterKey::Mass => self.mass,
            ParameterKey::Thrust => self.thrust,
            ParameterKey::FuelCapacity => self.fuel_capacity,
            ParameterKey::FuelConsumptionRate => self.fuel_consumption_rate,
            ParameterKey::InitialAltitude => self.initial_altitude,
            ParameterKey::InitialVelocity => self.initial_velocity,
            ParameterKey::OrbitalInclination => self.orbital_inclination,
            ParameterKey::AtmosphericDensity => self.atmospheric_density,
            ParameterKey::DragCoefficient => self.drag_coefficient,
            ParameterKey::SpacecraftArea => self.spacecraft_area,
            ParameterKey::SensorNoiseLevel => self.sensor_noise_level,
            ParameterKey::SensorFailureRate => self.sensor_failure_rate,
        }
    }

    /// Single write path for runtime updates. Does not validate; callers
    /// validate the resulting set before committing it.
    pub fn set(&mut self, key: ParameterKey, value: f64) {
        let slot = match key {
            ParameterKey::MissionDuration => &mut self.mission_duration,
            ParameterKey::TimeStep => &mut self.time_step,
            ParameterKey::Mass => &mut self.mass,
            ParameterKey::Thrust => &mut self.thrust,
            ParameterKey::FuelCapacity => &mut self.fuel_capacity,
            ParameterKey::FuelConsumptionRate => &mut self.fuel_consumption_rate,
            ParameterKey::InitialAltitude => &mut self.initial_altitude,
            ParameterKey::InitialVelocity => &mut self.initial_velocity,
            ParameterKey::OrbitalInclination => &mut self.orbital_inclination,
            ParameterKey::AtmosphericDensity => &mut self.atmospheric_density,
            ParameterKey::DragCoefficient => &mut self.drag_coefficient,
            ParameterKey::SpacecraftArea => &mut self.spacecraft_area,
            ParameterKey::SensorNoiseLevel => &mut self.sensor_noise_level,
            ParameterKey::SensorFailureRate => &mut self.sensor_failure_rate,
        };
        *slot = value;
    }

    /// Apply a batch of named updates. Every name is resolved and the
    /// resulting set validated before anything is committed, so a rejected
    /// batch leaves `self` untouched.
    pub fn apply_updates<I, K>(&mut self, updates: I) -> Result<Vec<(ParameterKey, f64)>>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut resolved = Vec::new();
        for (name, value) in updates {
            let key: ParameterKey = name.as_ref().parse()?;
            resolved.push((key, value));
        }

        let mut candidate = self.clone();
        for &(key, value) in &resolved {
            candidate.set(key, value);
        }
        candidate.validate()?;

        *self = candidate;
        Ok(resolved)
    }

    /// Reject values the integrator cannot run with.
    pub fn validate(&self) -> Result<()> {
        for key in ParameterKey::ALL {
            let value = self.get(key);
            if !value.is_finite() {
                return Err(invalid(key, "must be finite"));
            }
            let strictly_positive = matches!(
                key,
                ParameterKey::MissionDuration
                    | ParameterKey::TimeStep
                    | ParameterKey::Mass
                    | ParameterKey::Thrust
            );
            if strictly_positive && value <= 0.0 {
                return Err(invalid(key, "must be positive"));
            }
            if key != ParameterKey::OrbitalInclination && value < 0.0 {
                return Err(invalid(key, "must not be negative"));
            }
        }
        Ok(())
    }

    /// Default number of steps for a full mission. Zero when the time step or
    /// duration is unusable.
    pub fn mission_steps(&self) -> usize {
        if !(self.time_step > 0.0 && self.mission_duration.is_finite()) {
            return 0;
        }
        // tolerate ratios like 0.3 / 0.1 = 2.9999999999999996
        (self.mission_duration / self.time_step - 1e-9).ceil().max(0.0) as usize
    }

    /// Multiplier applied to every sensor's base noise fraction
    pub fn noise_scale(&self) -> f64 {
        self.sensor_noise_level / DEFAULT_SENSOR_NOISE_LEVEL
    }

    /// Multiplier applied to every sensor's failure probability
    pub fn failure_scale(&self) -> f64 {
        self.sensor_failure_rate / DEFAULT_SENSOR_FAILURE_RATE
    }
}

fn invalid(key: ParameterKey, reason: &str) -> SimError {
    SimError::InvalidParameter {
        name: key.as_str().to_string(),
        reason: reason.to_string(),
    }
}
