//! Force models
//!
//! Each model returns a force (N) in the inertial frame, evaluated against the
//! state at the start of a step. [`compose`] sums them into a
//! [`ForceBreakdown`] that keeps the individual contributions for logging.

use crate::params::MissionParameters;
use crate::state::SimulationState;
use crate::MU_EARTH;
use nalgebra::Vector3;

/// Above this altitude the atmosphere is ignored (m)
pub const DRAG_CEILING_M: f64 = 600_000.0;

/// Exponential atmosphere scale height (m)
pub const SCALE_HEIGHT_M: f64 = 8_000.0;

/// Thrust actually delivered during a step and what it cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustOutput {
    pub force: Vector3<f64>,
    /// Delivered magnitude (N), capped at the configured maximum
    pub magnitude: f64,
    /// Fuel burned over the step (kg)
    pub fuel_consumed: f64,
}

impl ThrustOutput {
    pub fn none() -> Self {
        Self {
            force: Vector3::zeros(),
            magnitude: 0.0,
            fuel_consumed: 0.0,
        }
    }
}

/// Individual force contributions for one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceBreakdown {
    pub gravity: Vector3<f64>,
    pub drag: Vector3<f64>,
    pub thrust: ThrustOutput,
}

impl ForceBreakdown {
    pub fn total(&self) -> Vector3<f64> {
        self.gravity + self.drag + self.thrust.force
    }
}

/// Point-mass gravity, directed toward Earth's center.
pub fn gravity(position: &Vector3<f64>, mass: f64) -> Vector3<f64> {
    let r = position.norm();
    if r == 0.0 {
        return Vector3::zeros();
    }

    let magnitude = MU_EARTH * mass / (r * r);
    -position / r * magnitude
}

/// Density of the exponential atmosphere at `altitude` (kg/m³).
/// Zero above [`DRAG_CEILING_M`].
pub fn atmospheric_density(altitude: f64, base_density: f64) -> f64 {
    if altitude > DRAG_CEILING_M {
        return 0.0;
    }
    base_density * (-altitude / SCALE_HEIGHT_M).exp()
}

/// Quadratic drag opposing velocity: ½·ρ·v²·Cd·A
pub fn drag(velocity: &Vector3<f64>, altitude: f64, params: &MissionParameters) -> Vector3<f64> {
    let density = atmospheric_density(altitude, params.atmospheric_density);
    let speed = velocity.norm();
    if density == 0.0 || speed == 0.0 {
        return Vector3::zeros();
    }

    let magnitude =
        0.5 * density * speed * speed * params.drag_coefficient * params.spacecraft_area;
    -velocity / speed * magnitude
}

/// Thrust along the commanded direction, capped at `params.thrust`.
/// Delivers nothing without fuel or with a zero command.
pub fn thrust(
    command: &Vector3<f64>,
    fuel_remaining: f64,
    params: &MissionParameters,
) -> ThrustOutput {
    if fuel_remaining <= 0.0 {
        return ThrustOutput::none();
    }

    let requested = command.norm();
    if requested == 0.0 || !requested.is_finite() {
        return ThrustOutput::none();
    }

    let magnitude = requested.min(params.thrust);
    let fuel_consumed =
        params.fuel_consumption_rate * (magnitude / params.thrust) * params.time_step;

    ThrustOutput {
        force: command / requested * magnitude,
        magnitude,
        fuel_consumed,
    }
}

/// Evaluate every force against `state`.
pub fn compose(
    state: &SimulationState,
    command: &Vector3<f64>,
    params: &MissionParameters,
) -> ForceBreakdown {
    ForceBreakdown {
        gravity: gravity(&state.position, params.mass),
        drag: drag(&state.velocity, state.altitude, params),
        thrust: thrust(command, state.fuel_remaining, params),
    }
}
