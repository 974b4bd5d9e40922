//! Sensor catalog
//!
//! Static per-channel configuration and the dependency order in which true
//! values are derived.

use crate::{Result, SensorError};
use flight_dynamics::MissionParameters;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Default drift random-walk step (unit per tick)
pub const DEFAULT_DRIFT_RATE: f64 = 0.001;

/// Default per-second failure probability
pub const DEFAULT_FAILURE_PROBABILITY: f64 = 0.0001;

/// Telemetry channel identifier. Declaration order is catalog order, which is
/// also the column order of every export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorId {
    // Inertial
    AccelerometerX,
    AccelerometerY,
    AccelerometerZ,
    GyroscopeX,
    GyroscopeY,
    GyroscopeZ,
    // Navigation
    GpsLatitude,
    GpsLongitude,
    Altitude,
    // Environment
    TemperatureInternal,
    TemperatureExternal,
    PressureCabin,
    RadiationLevel,
    // Power
    BatteryVoltage,
    SolarPanelCurrent,
    PowerConsumption,
    // Propulsion
    FuelLevel,
    ThrustMagnitude,
    EngineTemperature,
    // Communication
    SignalStrength,
    DataRate,
}

impl SensorId {
    pub const COUNT: usize = 21;

    pub const ALL: [SensorId; Self::COUNT] = [
        SensorId::AccelerometerX,
        SensorId::AccelerometerY,
        SensorId::AccelerometerZ,
        SensorId::GyroscopeX,
        SensorId::GyroscopeY,
        SensorId::GyroscopeZ,
        SensorId::GpsLatitude,
        SensorId::GpsLongitude,
        SensorId::Altitude,
        SensorId::TemperatureInternal,
        SensorId::TemperatureExternal,
        SensorId::PressureCabin,
        SensorId::RadiationLevel,
        SensorId::BatteryVoltage,
        SensorId::SolarPanelCurrent,
        SensorId::PowerConsumption,
        SensorId::FuelLevel,
        SensorId::ThrustMagnitude,
        SensorId::EngineTemperature,
        SensorId::SignalStrength,
        SensorId::DataRate,
    ];

    /// Position in catalog order
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorId::AccelerometerX => "accelerometer_x",
            SensorId::AccelerometerY => "accelerometer_y",
            SensorId::AccelerometerZ => "accelerometer_z",
            SensorId::GyroscopeX => "gyroscope_x",
            SensorId::GyroscopeY => "gyroscope_y",
            SensorId::GyroscopeZ => "gyroscope_z",
            SensorId::GpsLatitude => "gps_latitude",
            SensorId::GpsLongitude => "gps_longitude",
            SensorId::Altitude => "altitude",
            SensorId::TemperatureInternal => "temperature_internal",
            SensorId::TemperatureExternal => "temperature_external",
            SensorId::PressureCabin => "pressure_cabin",
            SensorId::RadiationLevel => "radiation_level",
            SensorId::BatteryVoltage => "battery_voltage",
            SensorId::SolarPanelCurrent => "solar_panel_current",
            SensorId::PowerConsumption => "power_consumption",
            SensorId::FuelLevel => "fuel_level",
            SensorId::ThrustMagnitude => "thrust_magnitude",
            SensorId::EngineTemperature => "engine_temperature",
            SensorId::SignalStrength => "signal_strength",
            SensorId::DataRate => "data_rate",
        }
    }

    /// Channels whose true value must be known before this one's.
    pub fn dependencies(&self) -> &'static [SensorId] {
        match self {
            SensorId::DataRate => &[SensorId::SignalStrength],
            SensorId::EngineTemperature => &[SensorId::ThrustMagnitude],
            _ => &[],
        }
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorId {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self> {
        SensorId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| SensorError::NotFound(s.to_string()))
    }
}

/// Static description of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub name: String,
    pub unit: String,
    /// Noise standard deviation as a fraction of the reading magnitude
    pub base_noise_level: f64,
    /// Standard deviation of the per-tick drift increment
    pub drift_rate: f64,
    /// Exponential failure rate (per second of simulated time)
    pub failure_probability: f64,
    /// Inclusive valid output range (min, max)
    pub measurement_range: (f64, f64),
    /// Decimal places kept in functional readings
    pub precision: u32,
    /// Nominal sample rate (Hz)
    pub sampling_rate: f64,
}

impl SensorConfig {
    fn new(name: &str, unit: &str, base_noise_level: f64, range: (f64, f64)) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            base_noise_level,
            drift_rate: DEFAULT_DRIFT_RATE,
            failure_probability: DEFAULT_FAILURE_PROBABILITY,
            measurement_range: range,
            precision: 3,
            sampling_rate: 1.0,
        }
    }

    fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn min(&self) -> f64 {
        self.measurement_range.0
    }

    pub fn max(&self) -> f64 {
        self.measurement_range.1
    }

    /// Clamp into the valid range and round to the configured precision.
    pub fn quantize(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min(), self.max());
        let factor = 10f64.powi(self.precision as i32);
        (clamped * factor).round() / factor
    }
}

/// Unscaled configuration for `id`.
pub fn default_config(id: SensorId) -> SensorConfig {
    use SensorId::*;
    match id {
        AccelerometerX => SensorConfig::new("Accelerometer X", "m/s²", 0.005, (-100.0, 100.0)),
        AccelerometerY => SensorConfig::new("Accelerometer Y", "m/s²", 0.005, (-100.0, 100.0)),
        AccelerometerZ => SensorConfig::new("Accelerometer Z", "m/s²", 0.005, (-100.0, 100.0)),
        GyroscopeX => SensorConfig::new("Gyroscope X", "rad/s", 0.001, (-10.0, 10.0)),
        GyroscopeY => SensorConfig::new("Gyroscope Y", "rad/s", 0.001, (-10.0, 10.0)),
        GyroscopeZ => SensorConfig::new("Gyroscope Z", "rad/s", 0.001, (-10.0, 10.0)),
        GpsLatitude => SensorConfig::new("GPS Latitude", "degrees", 0.00001, (-90.0, 90.0))
            .with_precision(6),
        GpsLongitude => SensorConfig::new("GPS Longitude", "degrees", 0.00001, (-180.0, 180.0))
            .with_precision(6),
        Altitude => SensorConfig::new("Altitude", "meters", 0.01, (100_000.0, 1_000_000.0)),
        TemperatureInternal => {
            SensorConfig::new("Internal Temperature", "°C", 0.1, (-50.0, 50.0))
        }
        TemperatureExternal => {
            SensorConfig::new("External Temperature", "°C", 0.5, (-273.0, 200.0))
        }
        PressureCabin => SensorConfig::new("Cabin Pressure", "Pa", 0.001, (50_000.0, 110_000.0)),
        RadiationLevel => SensorConfig::new("Radiation Level", "mSv/h", 0.05, (0.0, 10.0)),
        BatteryVoltage => SensorConfig::new("Battery Voltage", "V", 0.01, (20.0, 30.0)),
        SolarPanelCurrent => SensorConfig::new("Solar Panel Current", "A", 0.02, (0.0, 50.0)),
        PowerConsumption => SensorConfig::new("Power Consumption", "W", 0.01, (100.0, 2000.0)),
        FuelLevel => SensorConfig::new("Fuel Level", "kg", 0.01, (0.0, 500.0)),
        ThrustMagnitude => SensorConfig::new("Thrust Magnitude", "N", 0.02, (0.0, 10_000.0)),
        EngineTemperature => SensorConfig::new("Engine Temperature", "°C", 0.5, (0.0, 1000.0)),
        SignalStrength => SensorConfig::new("Signal Strength", "dBm", 0.1, (-120.0, -30.0)),
        DataRate => SensorConfig::new("Data Rate", "Mbps", 0.05, (0.0, 100.0)),
    }
}

/// Full channel table plus the order true values are evaluated in.
#[derive(Debug, Clone)]
pub struct SensorCatalog {
    configs: Vec<SensorConfig>,
    evaluation_order: Vec<SensorId>,
}

impl Default for SensorCatalog {
    fn default() -> Self {
        Self::with_scales(1.0, 1.0)
    }
}

impl SensorCatalog {
    /// Build the catalog with noise and failure knobs taken from `params`.
    pub fn from_parameters(params: &MissionParameters) -> Self {
        Self::with_scales(params.noise_scale(), params.failure_scale())
    }

    pub fn with_scales(noise_scale: f64, failure_scale: f64) -> Self {
        let configs = SensorId::ALL
            .iter()
            .map(|&id| {
                let mut config = default_config(id);
                config.base_noise_level *= noise_scale;
                config.failure_probability *= failure_scale;
                config
            })
            .collect();

        Self {
            configs,
            evaluation_order: topological_order(),
        }
    }

    pub fn get(&self, id: SensorId) -> &SensorConfig {
        &self.configs[id.index()]
    }

    /// Channels in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (SensorId, &SensorConfig)> {
        SensorId::ALL.iter().copied().zip(self.configs.iter())
    }

    /// Dependencies before dependents
    pub fn evaluation_order(&self) -> &[SensorId] {
        &self.evaluation_order
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

/// Kahn's algorithm over [`SensorId::dependencies`]; ties keep catalog order.
fn topological_order() -> Vec<SensorId> {
    let mut in_degree = [0usize; SensorId::COUNT];
    let mut dependents: Vec<Vec<SensorId>> = vec![Vec::new(); SensorId::COUNT];

    for id in SensorId::ALL {
        for dep in id.dependencies() {
            in_degree[id.index()] += 1;
            dependents[dep.index()].push(id);
        }
    }

    let mut ready: VecDeque<SensorId> = SensorId::ALL
        .iter()
        .copied()
        .filter(|id| in_degree[id.index()] == 0)
        .collect();
    let mut order = Vec::with_capacity(SensorId::COUNT);

    while let Some(id) = ready.pop_front() {
        order.push(id);
        for &next in &dependents[id.index()] {
            in_degree[next.index()] -= 1;
            if in_degree[next.index()] == 0 {
                ready.push_back(next);
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_complete() {
        let catalog = SensorCatalog::default();
        assert_eq!(catalog.len(), 21);
        for (i, (id, _)) in catalog.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_id_round_trip() {
        for id in SensorId::ALL {
            assert_eq!(id.as_str().parse::<SensorId>().unwrap(), id);
        }
        assert!(matches!(
            "warp_core".parse::<SensorId>(),
            Err(SensorError::NotFound(_))
        ));
    }

    #[test]
    fn test_dependencies_evaluated_first() {
        let catalog = SensorCatalog::default();
        let order = catalog.evaluation_order();
        assert_eq!(order.len(), SensorId::COUNT);

        let pos = |id: SensorId| order.iter().position(|&o| o == id).unwrap();
        for id in SensorId::ALL {
            for &dep in id.dependencies() {
                assert!(pos(dep) < pos(id), "{dep} must precede {id}");
            }
        }
    }

    #[test]
    fn test_origin_values() {
        let catalog = SensorCatalog::default();

        let lat = catalog.get(SensorId::GpsLatitude);
        assert_eq!(lat.precision, 6);
        assert_eq!(lat.measurement_range, (-90.0, 90.0));

        let alt = catalog.get(SensorId::Altitude);
        assert_eq!(alt.measurement_range, (100_000.0, 1_000_000.0));
        assert_eq!(alt.failure_probability, DEFAULT_FAILURE_PROBABILITY);
        assert_eq!(alt.drift_rate, DEFAULT_DRIFT_RATE);
    }

    #[test]
    fn test_scaling_from_parameters() {
        let mut params = MissionParameters::default();
        params.sensor_noise_level = 0.02;
        params.sensor_failure_rate = 0.0;
        let catalog = SensorCatalog::from_parameters(&params);

        let accel = catalog.get(SensorId::AccelerometerX);
        assert!((accel.base_noise_level - 0.01).abs() < 1e-12);
        assert_eq!(accel.failure_probability, 0.0);
    }

    #[test]
    fn test_quantize() {
        let config = default_config(SensorId::BatteryVoltage);
        assert_eq!(config.quantize(31.0), 30.0);
        assert_eq!(config.quantize(27.98765), 27.988);
        assert_eq!(config.quantize(-5.0), 20.0);
    }
}
