//! Conceptual sizing of small propeller-driven drones.
//!
//! The domain logic lives in the member crates re-exported here; this crate hosts the
//! command-line front-ends and the glue that turns a manifest into a finished run.

pub use drone_aero as aero;
pub use drone_config as config;
pub use drone_core::{constants, units, vector};
pub use drone_export as export;
pub use drone_propulsion as propulsion;
pub use drone_sizing as sizing;

pub mod run;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
