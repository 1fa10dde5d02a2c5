//! Aircraft-level sizing: the design aggregate, its layout and mass model, and the
//! fixed-point loop that couples battery, motors and wing until nothing changes.

pub mod design;
pub mod facade;
pub mod iteration;
pub mod layout;
pub mod report;
pub mod requirement;
pub mod sweep;

use drone_aero::AeroError;
use drone_config::ConfigError;
use drone_propulsion::{MotorError, PropellerError};
use thiserror::Error;

pub use design::{
    Airframe, AircraftDesign, BatterySummary, DesignEvaluation, EngineReport, MassBreakdown,
};
pub use iteration::{SizingLoop, SizingOptions};
pub use layout::{FuselageGeometry, FuselageSpec, PayloadSpec, engine_span_m, engine_stations};
pub use report::{DesignChange, Diagnostic, PassRecord, SizingReport, SizingStatus};
pub use requirement::{EnduranceMode, FlightRequirement, endurance_time_h};
pub use sweep::{SweepPoint, velocity_sweep};

/// Fatal failures of a design run. Infeasible and non-converged designs are not errors;
/// they come back as a [`SizingStatus`] inside the report.
#[derive(Debug, Error)]
pub enum SizingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Propeller(#[from] PropellerError),
    #[error(transparent)]
    Motor(#[from] MotorError),
    #[error(transparent)]
    Aero(#[from] AeroError),
    #[error("invalid flight requirement: {0}")]
    InvalidRequirement(String),
    #[error("invalid design parameter {field}: {value}")]
    InvalidParameter { field: &'static str, value: f64 },
    #[error("design has no mass; centre of gravity is undefined")]
    MasslessDesign,
}
