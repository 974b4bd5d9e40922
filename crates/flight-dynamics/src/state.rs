//! Spacecraft state snapshots

use crate::EARTH_RADIUS_M;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// One immutable snapshot of the spacecraft at a simulated instant.
///
/// `altitude` and `speed` are derived from `position` and `velocity` by
/// [`SimulationState::new`] and are never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Mission elapsed time (s)
    pub time: f64,
    /// Earth-centered inertial position (m)
    pub position: Vector3<f64>,
    /// Inertial velocity (m/s)
    pub velocity: Vector3<f64>,
    /// Acceleration applied during the step that produced this state (m/s²)
    pub acceleration: Vector3<f64>,
    /// Thrust magnitude applied during that step (N)
    pub thrust: f64,
    /// Fuel left (kg), never negative
    pub fuel_remaining: f64,
    /// Height above mean Earth radius (m)
    pub altitude: f64,
    /// |velocity| (m/s)
    pub speed: f64,
    pub is_active: bool,
}

impl SimulationState {
    pub fn new(
        time: f64,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        acceleration: Vector3<f64>,
        thrust: f64,
        fuel_remaining: f64,
        is_active: bool,
    ) -> Self {
        Self {
            time,
            position,
            velocity,
            acceleration,
            thrust,
            fuel_remaining: fuel_remaining.max(0.0),
            altitude: position.norm() - EARTH_RADIUS_M,
            speed: velocity.norm(),
            is_active,
        }
    }

    /// Distance from Earth's center (m)
    pub fn radius(&self) -> f64 {
        self.position.norm()
    }

    /// Flatten into a trajectory table row
    pub fn to_row(&self) -> TrajectoryRow {
        TrajectoryRow {
            time: self.time,
            position_x: self.position.x,
            position_y: self.position.y,
            position_z: self.position.z,
            velocity_x: self.velocity.x,
            velocity_y: self.velocity.y,
            velocity_z: self.velocity.z,
            acceleration_x: self.acceleration.x,
            acceleration_y: self.acceleration.y,
            acceleration_z: self.acceleration.z,
            thrust: self.thrust,
            fuel_remaining: self.fuel_remaining,
            altitude: self.altitude,
            speed: self.speed,
            is_active: self.is_active,
        }
    }
}

/// Flat trajectory row (one per state), column names match the dashboard's
/// trajectory table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    pub time: f64,
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub velocity_z: f64,
    pub acceleration_x: f64,
    pub acceleration_y: f64,
    pub acceleration_z: f64,
    pub thrust: f64,
    pub fuel_remaining: f64,
    pub altitude: f64,
    pub speed: f64,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_quantities() {
        let state = SimulationState::new(
            0.0,
            Vector3::new(EARTH_RADIUS_M + 400_000.0, 0.0, 0.0),
            Vector3::new(0.0, 3.0, 4.0),
            Vector3::zeros(),
            0.0,
            500.0,
            true,
        );

        assert!((state.altitude - 400_000.0).abs() < 1e-6);
        assert_eq!(state.speed, 5.0);
        assert_eq!(state.radius(), EARTH_RADIUS_M + 400_000.0);
    }

    #[test]
    fn test_fuel_clamped() {
        let state = SimulationState::new(
            1.0,
            Vector3::new(EARTH_RADIUS_M, 0.0, 0.0),
            Vector3::zeros(),
            Vector3::zeros(),
            0.0,
            -0.25,
            false,
        );
        assert_eq!(state.fuel_remaining, 0.0);
    }

    #[test]
    fn test_to_row() {
        let state = SimulationState::new(
            12.0,
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(4.0, 5.0, 6.0),
            Vector3::new(7.0, 8.0, 9.0),
            250.0,
            42.0,
            true,
        );
        let row = state.to_row();

        assert_eq!(row.time, 12.0);
        assert_eq!(row.position_z, 3.0);
        assert_eq!(row.velocity_x, 4.0);
        assert_eq!(row.acceleration_y, 8.0);
        assert_eq!(row.thrust, 250.0);
        assert_eq!(row.fuel_remaining, 42.0);
        assert_eq!(row.speed, state.speed);
        assert!(row.is_active);
    }
}
