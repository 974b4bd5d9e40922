//! Spacecraft state integrator
//!
//! Owns the current state and the append-only history since the last reset.
//! Each step evaluates the force models once against the current state, then
//! advances velocity by forward Euler and position by the constant-acceleration
//! update `p + v·dt + ½·a·dt²`.
//!
//! The mission deactivates the first time altitude drops to the Kármán line,
//! fuel runs out, or elapsed time reaches the mission duration. An inactive
//! simulation stays frozen until [`Simulation::reset`].

use crate::forces;
use crate::params::{MissionParameters, ParameterKey};
use crate::state::{SimulationState, TrajectoryRow};
use crate::{circular_speed, Result, EARTH_RADIUS_M, KARMAN_LINE_M, MU_EARTH};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, info, warn};

/// Orbital elements derived from the current state.
///
/// Unbound trajectories (non-negative specific energy) report infinite
/// `semi_major_axis` and `period`; that is a valid outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub altitude: f64,
    pub speed: f64,
    /// ½v² − μ/r (J/kg)
    pub specific_energy: f64,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Orbital period (s)
    pub period: f64,
    /// Current radius (near-circular simplification)
    pub apoapsis: f64,
    /// Current radius (near-circular simplification)
    pub periapsis: f64,
}

impl OrbitalElements {
    pub fn is_bound(&self) -> bool {
        self.semi_major_axis.is_finite()
    }
}

/// Summary over the whole history since the last reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub total_time: f64,
    pub total_steps: usize,
    pub max_altitude: f64,
    pub min_altitude: f64,
    pub max_speed: f64,
    pub min_speed: f64,
    pub fuel_consumed: f64,
    pub is_active: bool,
    pub orbital_elements: OrbitalElements,
}

pub struct Simulation {
    params: MissionParameters,
    current: SimulationState,
    history: Vec<SimulationState>,
    running: bool,
}

/// Fraction of a time step within which elapsed time counts as having reached
/// the mission duration
const DURATION_TOLERANCE: f64 = 1e-9;

impl Default for Simulation {
    fn default() -> Self {
        Self::from_valid(MissionParameters::default())
    }
}

impl Simulation {
    /// Simulation reset onto the initial orbit. Rejects parameter sets that
    /// fail [`MissionParameters::validate`].
    pub fn new(params: MissionParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self::from_valid(params))
    }

    fn from_valid(params: MissionParameters) -> Self {
        let initial = initial_state(&params);
        let mut sim = Self {
            params,
            current: initial.clone(),
            history: vec![initial],
            running: false,
        };
        sim.reset();
        sim
    }

    pub fn parameters(&self) -> &MissionParameters {
        &self.params
    }

    pub fn current_state(&self) -> &SimulationState {
        &self.current
    }

    pub fn state_history(&self) -> &[SimulationState] {
        &self.history
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Re-seed a circular orbit at the configured altitude and inclination,
    /// dropping all history.
    pub fn reset(&mut self) {
        let initial = initial_state(&self.params);
        self.current = initial.clone();
        self.history.clear();
        self.history.push(initial);
        self.running = false;

        info!(
            "Simulation reset. Initial altitude: {:.1} km, speed {:.1} m/s",
            self.params.initial_altitude / 1000.0,
            self.current.speed
        );
    }

    /// Advance one time step. `None` means zero thrust.
    ///
    /// Returns the frozen current state without recording anything once the
    /// mission is inactive.
    pub fn step(&mut self, thrust_command: Option<Vector3<f64>>) -> &SimulationState {
        if !self.current.is_active {
            return &self.current;
        }

        let command = thrust_command.unwrap_or_else(Vector3::zeros);
        let dt = self.params.time_step;
        let breakdown = forces::compose(&self.current, &command, &self.params);
        let acceleration = breakdown.total() / self.params.mass;

        debug!(
            t = self.current.time,
            gravity = breakdown.gravity.norm(),
            drag = breakdown.drag.norm(),
            thrust = breakdown.thrust.magnitude,
            "force breakdown"
        );

        let velocity = self.current.velocity + acceleration * dt;
        let position =
            self.current.position + self.current.velocity * dt + acceleration * (0.5 * dt * dt);
        let fuel = (self.current.fuel_remaining - breakdown.thrust.fuel_consumed).max(0.0);
        let time = self.current.time + dt;

        let mut next = SimulationState::new(
            time,
            position,
            velocity,
            acceleration,
            breakdown.thrust.magnitude,
            fuel,
            true,
        );

        if let Some(reason) = self.termination_reason(&next) {
            warn!("Mission inactive at t={:.1}s: {}", next.time, reason);
            next.is_active = false;
        }

        self.current = next.clone();
        self.history.push(next);
        &self.current
    }

    fn termination_reason(&self, state: &SimulationState) -> Option<&'static str> {
        if state.altitude <= KARMAN_LINE_M {
            Some("altitude at or below Karman line")
        } else if state.fuel_remaining <= 0.0 {
            Some("fuel exhausted")
        } else if state.time + DURATION_TOLERANCE * self.params.time_step
            >= self.params.mission_duration
        {
            Some("mission duration reached")
        } else {
            None
        }
    }

    /// Step up to `steps` times (default: a full mission) with per-step thrust
    /// from `thrust_profile`, zero-padded when the profile is shorter. Stops
    /// early once the mission is inactive.
    pub fn run_simulation(
        &mut self,
        steps: Option<usize>,
        thrust_profile: &[Vector3<f64>],
    ) -> &[SimulationState] {
        self.run_until(steps, thrust_profile, |_| true)
    }

    /// Like [`Simulation::run_simulation`], but `keep_going` is consulted
    /// after every step and can interrupt the run.
    pub fn run_until<F>(
        &mut self,
        steps: Option<usize>,
        thrust_profile: &[Vector3<f64>],
        mut keep_going: F,
    ) -> &[SimulationState]
    where
        F: FnMut(&SimulationState) -> bool,
    {
        let steps = steps.unwrap_or_else(|| self.params.mission_steps());
        self.running = true;

        for i in 0..steps {
            if !self.current.is_active {
                break;
            }
            let command = thrust_profile.get(i).copied();
            let state = self.step(command);
            if !keep_going(state) {
                debug!("Run interrupted after {} steps", i + 1);
                break;
            }
        }

        self.running = false;
        &self.history
    }

    /// Apply named parameter updates. Unknown names or invalid values reject
    /// the whole batch. Changes take effect on the next step; initial-orbit
    /// parameters only matter at the next reset.
    pub fn update_parameters<I, K>(&mut self, updates: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let applied = self.params.apply_updates(updates)?;
        for (key, value) in applied {
            info!("Updated parameter {} to {}", key, value);
        }
        Ok(())
    }

    /// Typed single-parameter update
    pub fn set_parameter(&mut self, key: ParameterKey, value: f64) -> Result<()> {
        self.update_parameters([(key.as_str(), value)])
    }

    /// Replace the whole parameter set between steps
    pub fn replace_parameters(&mut self, params: MissionParameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        info!("Mission parameters replaced");
        Ok(())
    }

    pub fn trajectory_data(&self) -> Vec<TrajectoryRow> {
        self.history.iter().map(SimulationState::to_row).collect()
    }

    pub fn orbital_elements(&self) -> OrbitalElements {
        orbital_elements(&self.current)
    }

    pub fn stats(&self) -> SimulationStats {
        let (mut max_altitude, mut min_altitude) = (f64::NEG_INFINITY, f64::INFINITY);
        let (mut max_speed, mut min_speed) = (f64::NEG_INFINITY, f64::INFINITY);
        for state in &self.history {
            max_altitude = max_altitude.max(state.altitude);
            min_altitude = min_altitude.min(state.altitude);
            max_speed = max_speed.max(state.speed);
            min_speed = min_speed.min(state.speed);
        }

        SimulationStats {
            total_time: self.current.time,
            total_steps: self.history.len(),
            max_altitude,
            min_altitude,
            max_speed,
            min_speed,
            fuel_consumed: self.params.fuel_capacity - self.current.fuel_remaining,
            is_active: self.current.is_active,
            orbital_elements: self.orbital_elements(),
        }
    }
}

/// Circular orbit at the configured altitude, starting on the +x axis with
/// the velocity tilted out of the equatorial plane by the inclination.
fn initial_state(params: &MissionParameters) -> SimulationState {
    let radius = EARTH_RADIUS_M + params.initial_altitude;
    let speed = circular_speed(radius);
    let inclination = params.orbital_inclination.to_radians();

    SimulationState::new(
        0.0,
        Vector3::new(radius, 0.0, 0.0),
        Vector3::new(0.0, speed * inclination.cos(), speed * inclination.sin()),
        Vector3::zeros(),
        0.0,
        params.fuel_capacity,
        true,
    )
}

/// Two-body elements of `state` about Earth.
pub fn orbital_elements(state: &SimulationState) -> OrbitalElements {
    let r_vec = state.position;
    let v_vec = state.velocity;
    let r = r_vec.norm();
    let v = v_vec.norm();

    let specific_energy = 0.5 * v * v - MU_EARTH / r;
    let semi_major_axis = if specific_energy < 0.0 {
        -MU_EARTH / (2.0 * specific_energy)
    } else {
        f64::INFINITY
    };
    let period = if semi_major_axis.is_finite() && semi_major_axis > 0.0 {
        2.0 * PI * (semi_major_axis.powi(3) / MU_EARTH).sqrt()
    } else {
        f64::INFINITY
    };

    // e = ((v² − μ/r)·r − (r·v)·v) / μ
    let e_vec = (r_vec * (v * v - MU_EARTH / r) - v_vec * r_vec.dot(&v_vec)) / MU_EARTH;

    OrbitalElements {
        altitude: state.altitude,
        speed: state.speed,
        specific_energy,
        semi_major_axis,
        eccentricity: e_vec.norm(),
        period,
        apoapsis: r,
        periapsis: r,
    }
}
