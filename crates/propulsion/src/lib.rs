//! Propulsion models: propeller performance maps, brushless motor catalog, battery pack
//! sizing and the engine unit that couples a propeller with a catalog motor.

pub mod battery;
pub mod engine;
pub mod motor;
pub mod propeller;

pub use battery::{BatteryPack, CellSpec};
pub use engine::{
    Direction, DirectionHistory, EngineOperatingPoint, EngineStep, EngineUnit, SearchState,
};
pub use motor::{MotorCandidate, MotorCatalog, MotorError, MotorLoad};
pub use propeller::{
    PerformanceTable, PropellerError, PropellerMap, PropellerOperatingPoint, PropellerSample,
    PropellerSpec, THRUST_TOLERANCE_N,
};
