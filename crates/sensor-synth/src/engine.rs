//! Sensor engine
//!
//! Turns spacecraft states into imperfect instrument readings. Each channel
//! carries a fixed calibration bias, a random-walk drift, magnitude-scaled
//! noise and an exponential failure clock measured in simulated seconds.
//! A failed channel keeps reporting its last good value plus growing noise
//! until it is repaired.

use crate::catalog::{SensorCatalog, SensorId};
use crate::export::{self, ExportFormat};
use crate::summary::{self, SensorSummary};
use crate::truth;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use flight_dynamics::{MissionParameters, SimulationState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Standard deviation of the multiplicative calibration error
const CALIBRATION_SIGMA: f64 = 0.01;

/// Ceiling on the noise added to a failed channel's output
const FAILED_NOISE_CAP: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "FAILED")]
    Failed,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Ok => "OK",
            SensorStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorStatus {
    type Err = crate::SensorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "OK" => Ok(SensorStatus::Ok),
            "FAILED" => Ok(SensorStatus::Failed),
            other => Err(crate::SensorError::MalformedRow(format!(
                "unknown sensor status: {other}"
            ))),
        }
    }
}

/// One channel of one reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelReading {
    /// What the instrument reports
    pub value: f64,
    pub status: SensorStatus,
    /// Underlying physical value, kept for diagnostics
    pub true_value: f64,
}

/// All channels at one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub simulation_time: f64,
    /// Keyed in catalog order
    pub channels: BTreeMap<SensorId, ChannelReading>,
}

impl Reading {
    pub fn get(&self, id: SensorId) -> Option<&ChannelReading> {
        self.channels.get(&id)
    }
}

/// Mutable per-channel condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    pub drift_offset: f64,
    pub calibration_factor: f64,
    pub is_functional: bool,
    /// Last functional output, reported while failed
    pub last_measurement: f64,
    /// Simulated seconds until failure; infinite when the channel cannot fail
    pub failure_countdown: f64,
}

pub struct SensorEngine {
    params: MissionParameters,
    catalog: SensorCatalog,
    states: Vec<SensorState>,
    history: Vec<Reading>,
    rng: StdRng,
    epoch: DateTime<Utc>,
}

impl SensorEngine {
    /// Engine seeded from OS entropy, timestamped from now.
    pub fn new(params: MissionParameters) -> Self {
        Self::from_rng(params, StdRng::from_entropy())
    }

    /// Reproducible engine: the same seed and inputs yield the same readings.
    pub fn with_seed(params: MissionParameters, seed: u64) -> Self {
        Self::from_rng(params, StdRng::seed_from_u64(seed))
    }

    fn from_rng(params: MissionParameters, mut rng: StdRng) -> Self {
        let catalog = SensorCatalog::from_parameters(&params);
        let states = initial_states(&catalog, &mut rng);
        Self {
            params,
            catalog,
            states,
            history: Vec::new(),
            rng,
            epoch: Utc::now(),
        }
    }

    /// Pin the wall-clock instant that simulation time 0 maps to.
    pub fn with_epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn catalog(&self) -> &SensorCatalog {
        &self.catalog
    }

    pub fn parameters(&self) -> &MissionParameters {
        &self.params
    }

    pub fn history(&self) -> &[Reading] {
        &self.history
    }

    pub fn sensor_state(&self, id: SensorId) -> &SensorState {
        &self.states[id.index()]
    }

    /// Swap parameters between ticks. The time step applies from the next
    /// reading; noise and failure knobs apply from the next
    /// [`SensorEngine::reset_sensors`].
    pub fn set_parameters(&mut self, params: MissionParameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Produce one reading for `state` and append it to the history.
    pub fn generate_sensor_data(&mut self, state: &SimulationState) -> &Reading {
        let truths = truth::evaluate(self.catalog.evaluation_order(), state);
        let dt = self.params.time_step;

        let mut channels = BTreeMap::new();
        for i in 0..SensorId::COUNT {
            let id = self.catalog.evaluation_order()[i];
            let true_value = truths[id.index()];
            let (value, status) = self.apply_effects(id, true_value, dt, state.time);
            channels.insert(
                id,
                ChannelReading {
                    value,
                    status,
                    true_value,
                },
            );
        }

        let timestamp = self.timestamp_at(state.time);

        self.history.push(Reading {
            timestamp,
            simulation_time: state.time,
            channels,
        });
        &self.history[self.history.len() - 1]
    }

    /// Wall-clock time of `sim_time`, saturating at the ends of the
    /// representable range.
    fn timestamp_at(&self, sim_time: f64) -> DateTime<Utc> {
        let offset = Duration::microseconds((sim_time * 1e6).round() as i64);
        self.epoch.checked_add_signed(offset).unwrap_or_else(|| {
            warn!(
                "Timestamp for t={:.1}s is out of range, saturating",
                sim_time
            );
            if sim_time < 0.0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            }
        })
    }

    fn apply_effects(
        &mut self,
        id: SensorId,
        true_value: f64,
        dt: f64,
        sim_time: f64,
    ) -> (f64, SensorStatus) {
        let config = self.catalog.get(id);
        let sensor = &mut self.states[id.index()];

        sensor.failure_countdown -= dt;
        if sensor.is_functional && sensor.failure_countdown <= 0.0 {
            sensor.is_functional = false;
            warn!("Sensor {} failed at t={:.1}s", id, sim_time);
        }

        if !sensor.is_functional {
            let sigma = (true_value.abs() * 0.1).min(FAILED_NOISE_CAP);
            let value = sensor.last_measurement + gaussian(&mut self.rng, sigma);
            return (value, SensorStatus::Failed);
        }

        let mut value = true_value * sensor.calibration_factor;

        sensor.drift_offset += gaussian(&mut self.rng, config.drift_rate);
        value += sensor.drift_offset;

        let noise_sigma = value.abs() * config.base_noise_level;
        value += gaussian(&mut self.rng, noise_sigma);

        let value = config.quantize(value);
        sensor.last_measurement = value;
        (value, SensorStatus::Ok)
    }

    /// Readings for an ordered run of states. Channel condition carries over
    /// from one state to the next.
    pub fn generate_batch_data(&mut self, states: &[SimulationState]) -> Vec<Reading> {
        states
            .iter()
            .map(|state| self.generate_sensor_data(state).clone())
            .collect()
    }

    /// Per-channel statistics over the whole history. Empty before the first
    /// reading.
    pub fn summary(&self) -> BTreeMap<SensorId, SensorSummary> {
        summary::summarize(&self.catalog, &self.states, &self.history)
    }

    /// Rebuild the catalog from the current parameters, redraw every
    /// channel's calibration and failure clock, and drop the history.
    pub fn reset_sensors(&mut self) {
        self.catalog = SensorCatalog::from_parameters(&self.params);
        self.states = initial_states(&self.catalog, &mut self.rng);
        self.history.clear();
        info!("All sensors reset to initial state");
    }

    pub fn simulate_sensor_failure(&mut self, sensor_id: &str) -> Result<()> {
        let id: SensorId = sensor_id.parse()?;
        self.states[id.index()].is_functional = false;
        info!("Manually triggered failure for sensor {}", id);
        Ok(())
    }

    /// Bring a channel back: clears drift and draws a fresh calibration and
    /// failure clock.
    pub fn repair_sensor(&mut self, sensor_id: &str) -> Result<()> {
        let id: SensorId = sensor_id.parse()?;
        let failure_probability = self.catalog.get(id).failure_probability;

        let sensor = &mut self.states[id.index()];
        sensor.is_functional = true;
        sensor.drift_offset = 0.0;
        sensor.calibration_factor = 1.0 + gaussian(&mut self.rng, CALIBRATION_SIGMA);
        sensor.failure_countdown = failure_countdown(&mut self.rng, failure_probability);

        info!("Repaired sensor {}", id);
        Ok(())
    }

    /// Write the history to `path`. Returns the number of rows written; an
    /// empty history writes nothing.
    pub fn export_data<P: AsRef<Path>>(&self, path: P, format: ExportFormat) -> Result<usize> {
        let path = path.as_ref();
        if self.history.is_empty() {
            warn!("No sensor data to export");
            return Ok(0);
        }

        let rows = export::write_readings(path, format, &self.history)?;
        info!("Exported {} sensor readings to {:?}", rows, path);
        Ok(rows)
    }
}

fn initial_states(catalog: &SensorCatalog, rng: &mut StdRng) -> Vec<SensorState> {
    let states: Vec<SensorState> = catalog
        .iter()
        .map(|(_, config)| SensorState {
            drift_offset: 0.0,
            calibration_factor: 1.0 + gaussian(rng, CALIBRATION_SIGMA),
            is_functional: true,
            last_measurement: 0.0,
            failure_countdown: failure_countdown(rng, config.failure_probability),
        })
        .collect();
    debug!("Initialized {} sensor channels", states.len());
    states
}

/// Zero-mean normal draw. Non-positive or non-finite sigma yields 0.
fn gaussian(rng: &mut StdRng, sigma: f64) -> f64 {
    if !(sigma.is_finite() && sigma > 0.0) {
        return 0.0;
    }
    Normal::new(0.0, sigma)
        .map(|dist| dist.sample(rng))
        .unwrap_or(0.0)
}

/// Exponential time-to-failure for `rate`; infinite when the rate is zero
/// or invalid.
fn failure_countdown(rng: &mut StdRng, rate: f64) -> f64 {
    if !(rate.is_finite() && rate > 0.0) {
        return f64::INFINITY;
    }
    Exp::new(rate)
        .map(|dist| dist.sample(rng))
        .unwrap_or(f64::INFINITY)
}
