//! Physical truth models
//!
//! Deterministic functions of the spacecraft state. Derived channels read
//! their upstream channel's value from the same tick.

use crate::catalog::SensorId;
use flight_dynamics::SimulationState;

/// Altitude the environment and comm models are normalized to (m)
const REFERENCE_ALTITUDE_M: f64 = 400_000.0;

/// Uncontrolled true values indexed by [`SensorId::index`]
pub type TruthTable = [f64; SensorId::COUNT];

/// True value of `id` at `state`. `upstream` must already hold every
/// dependency of `id`.
pub fn true_value(id: SensorId, state: &SimulationState, upstream: &TruthTable) -> f64 {
    use SensorId::*;
    let t = state.time;

    match id {
        AccelerometerX => state.acceleration.x,
        AccelerometerY => state.acceleration.y,
        AccelerometerZ => state.acceleration.z,
        // no attitude model: the craft is not rotating
        GyroscopeX | GyroscopeY | GyroscopeZ => 0.0,
        GpsLatitude => latitude_deg(state),
        GpsLongitude => state.position.y.atan2(state.position.x).to_degrees(),
        Altitude => state.altitude,
        TemperatureInternal => 20.0 + 0.01 * t,
        TemperatureExternal => -200.0,
        PressureCabin => 101_325.0,
        RadiationLevel => 0.1 * (1.0 + state.altitude / REFERENCE_ALTITUDE_M),
        BatteryVoltage => 28.0 - 0.00001 * t,
        SolarPanelCurrent => 40.0 * (0.8 + 0.2 * (t / 1000.0).sin()),
        PowerConsumption => 1200.0 + 200.0 * (t / 500.0).sin(),
        FuelLevel => state.fuel_remaining,
        ThrustMagnitude => state.thrust,
        EngineTemperature => 25.0 + 0.05 * upstream[ThrustMagnitude.index()],
        SignalStrength => -80.0 - (state.altitude / REFERENCE_ALTITUDE_M) * 20.0,
        DataRate => {
            let signal = upstream[SignalStrength.index()];
            50.0 * ((signal + 120.0) / 90.0).max(0.0)
        }
    }
}

/// Evaluate every channel in `order`.
pub fn evaluate(order: &[SensorId], state: &SimulationState) -> TruthTable {
    let mut table = [0.0; SensorId::COUNT];
    for &id in order {
        table[id.index()] = true_value(id, state, &table);
    }
    table
}

fn latitude_deg(state: &SimulationState) -> f64 {
    let r = state.radius();
    if r == 0.0 {
        return 0.0;
    }
    (state.position.z / r).clamp(-1.0, 1.0).asin().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SensorCatalog;
    use flight_dynamics::{Simulation, EARTH_RADIUS_M};
    use nalgebra::Vector3;

    fn state_at(position: Vector3<f64>, time: f64, thrust: f64) -> SimulationState {
        SimulationState::new(
            time,
            position,
            Vector3::new(0.0, 7600.0, 0.0),
            Vector3::new(-8.7, 0.0, 0.0),
            thrust,
            321.0,
            true,
        )
    }

    #[test]
    fn test_reference_orbit_values() {
        let sim = Simulation::default();
        let table = evaluate(SensorCatalog::default().evaluation_order(), sim.current_state());

        assert!((table[SensorId::SignalStrength.index()] + 100.0).abs() < 1e-9);
        // (-100 + 120) / 90 * 50
        assert!((table[SensorId::DataRate.index()] - 100.0 / 9.0).abs() < 1e-9);
        assert!((table[SensorId::RadiationLevel.index()] - 0.2).abs() < 1e-12);
        assert_eq!(table[SensorId::GpsLatitude.index()], 0.0);
        assert_eq!(table[SensorId::GpsLongitude.index()], 0.0);
        assert_eq!(table[SensorId::FuelLevel.index()], 500.0);
    }

    #[test]
    fn test_engine_temperature_follows_thrust() {
        let state = state_at(Vector3::new(EARTH_RADIUS_M + 400_000.0, 0.0, 0.0), 0.0, 2000.0);
        let table = evaluate(SensorCatalog::default().evaluation_order(), &state);

        assert_eq!(table[SensorId::ThrustMagnitude.index()], 2000.0);
        assert_eq!(table[SensorId::EngineTemperature.index()], 125.0);
    }

    #[test]
    fn test_position_derived_channels() {
        let r = EARTH_RADIUS_M + 400_000.0;
        let state = state_at(Vector3::new(0.0, r / 2f64.sqrt(), r / 2f64.sqrt()), 1000.0, 0.0);
        let table = evaluate(SensorCatalog::default().evaluation_order(), &state);

        assert!((table[SensorId::GpsLatitude.index()] - 45.0).abs() < 1e-9);
        assert!((table[SensorId::GpsLongitude.index()] - 90.0).abs() < 1e-9);
        assert!((table[SensorId::TemperatureInternal.index()] - 30.0).abs() < 1e-12);
        assert_eq!(table[SensorId::AccelerometerX.index()], -8.7);
        assert_eq!(table[SensorId::GyroscopeZ.index()], 0.0);
    }

    #[test]
    fn test_data_rate_floor() {
        let state = state_at(Vector3::new(EARTH_RADIUS_M + 2_000_000.0, 0.0, 0.0), 0.0, 0.0);
        let table = evaluate(SensorCatalog::default().evaluation_order(), &state);
        // -180 dBm is below the -120 floor
        assert_eq!(table[SensorId::DataRate.index()], 0.0);
    }
}
