//! Wing geometry, flight condition and aerodynamic coefficient solving.
//!
//! The aerodynamic solver is an external collaborator reached through the [`AeroSolver`]
//! trait; [`AeroClient`] owns one explicitly opened solver and is handed to the sizing loop.

pub mod sizer;
pub mod solver;
pub mod wing;

pub use sizer::{WingAerodynamics, WingSizer};
pub use solver::{AeroClient, AeroCoefficients, AeroError, AeroSolver, PolarSolver};
pub use wing::{FlightCondition, WingGeometry, WingPlanform};
