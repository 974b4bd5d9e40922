//! Netra Fuzz Harness
//!
//! Shared proptest strategies for the flight-dynamics and sensor-synth crates.
//!
//! # Usage
//!
//! ```rust
//! use fuzz_harness::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_fuzz_test(alt in altitude_m()) {
//!         prop_assert!(alt > 100_000.0);
//!     }
//! }
//! ```

pub mod generators;

pub mod prelude {
    pub use crate::generators::*;
    pub use proptest::prelude::*;
}

// Re-export proptest for convenience
pub use proptest;
