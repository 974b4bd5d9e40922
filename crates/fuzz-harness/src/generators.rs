//! Domain strategies for property-based testing
//!
//! Values are plain SI floats (m, s, N, kg) so this crate stays independent of
//! the crates it tests.

use nalgebra::Vector3;
use proptest::prelude::*;

// ============================================================================
// Orbit Generators
// ============================================================================

/// Initial altitude (m), comfortably above the Kármán line up to high LEO
pub fn altitude_m() -> impl Strategy<Value = f64> {
    150_000.0f64..2_000_000.0
}

/// Orbital inclination (deg)
pub fn inclination_deg() -> impl Strategy<Value = f64> {
    0.0f64..=180.0
}

/// Integration time step (s)
pub fn time_step_s() -> impl Strategy<Value = f64> {
    0.1f64..10.0
}

// ============================================================================
// Thrust Generators
// ============================================================================

/// Commanded thrust component (N). Exceeds the default 10 kN cap so capping
/// gets exercised.
pub fn thrust_component() -> impl Strategy<Value = f64> {
    -15_000.0f64..15_000.0
}

/// Commanded thrust vector, occasionally zero
pub fn thrust_vector() -> impl Strategy<Value = Vector3<f64>> {
    prop_oneof![
        1 => Just(Vector3::zeros()),
        4 => (thrust_component(), thrust_component(), thrust_component())
            .prop_map(|(x, y, z)| Vector3::new(x, y, z)),
    ]
}

/// Per-step thrust profile of up to `max_len` commands
pub fn thrust_profile(max_len: usize) -> impl Strategy<Value = Vec<Vector3<f64>>> {
    prop::collection::vec(thrust_vector(), 0..=max_len)
}

// ============================================================================
// Sensor Generators
// ============================================================================

/// Index into a sensor catalog of `count` channels
pub fn sensor_index(count: usize) -> impl Strategy<Value = usize> {
    0..count
}

/// Noise fraction, from silent to ten times the default
pub fn noise_level() -> impl Strategy<Value = f64> {
    0.0f64..0.1
}

/// Per-step failure probability, from never to frequent
pub fn failure_rate() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 0.0f64..0.01, 0.01f64..0.5]
}

/// Generator seed
pub fn rng_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

// ============================================================================
// Composite Generators
// ============================================================================

/// Circular-orbit seed: (altitude m, inclination deg, time step s)
pub fn orbit_seed() -> impl Strategy<Value = (f64, f64, f64)> {
    (altitude_m(), inclination_deg(), time_step_s())
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_altitude_bounds(v in altitude_m()) {
            prop_assert!(v >= 150_000.0);
            prop_assert!(v < 2_000_000.0);
        }

        #[test]
        fn test_thrust_vector_finite(v in thrust_vector()) {
            prop_assert!(v.iter().all(|c| c.is_finite()));
            prop_assert!(v.norm() < 15_000.0 * 3f64.sqrt());
        }

        #[test]
        fn test_profile_length(p in thrust_profile(25)) {
            prop_assert!(p.len() <= 25);
        }

        #[test]
        fn test_sensor_index_bounds(i in sensor_index(21)) {
            prop_assert!(i < 21);
        }

        #[test]
        fn test_orbit_seed_bounds((alt, inc, dt) in orbit_seed()) {
            prop_assert!(alt >= 150_000.0);
            prop_assert!((0.0..=180.0).contains(&inc));
            prop_assert!(dt >= 0.1 && dt < 10.0);
        }
    }
}
