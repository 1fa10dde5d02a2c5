//! Off-design velocity sweep of a sized aircraft.

use drone_aero::{AeroClient, AeroSolver};
use drone_core::units::kmh_to_ms;
use drone_propulsion::MotorCatalog;
use serde::Serialize;

use crate::SizingError;
use crate::design::AircraftDesign;

/// One velocity of a sweep; engine columns describe the first engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub velocity_kmh: f64,
    pub drag_n: f64,
    pub thrust_per_engine_n: f64,
    /// Most thrust the propeller table offers at this speed.
    pub available_thrust_n: Option<f64>,
    pub rpm: f64,
    pub torque_nm: f64,
    pub voltage_v: f64,
    pub current_a: f64,
    /// Ends of the motor's voltage-limited torque/speed line at the pack voltage.
    pub no_load_speed_rev_s: f64,
    pub stall_torque_nm: f64,
    /// Torque at the motor's current rating.
    pub max_torque_nm: f64,
    pub valid: bool,
}

/// Evaluate `design` at each of `velocities_kmh` with its motors and battery as they are.
pub fn velocity_sweep<S: AeroSolver>(
    design: &AircraftDesign,
    catalog: &MotorCatalog,
    client: &mut AeroClient<S>,
    velocities_kmh: &[f64],
) -> Result<Vec<SweepPoint>, SizingError> {
    let mut points = Vec::with_capacity(velocities_kmh.len());
    let mut off_design = design.clone();
    for &velocity_kmh in velocities_kmh {
        if !(velocity_kmh.is_finite() && velocity_kmh > 0.0) {
            return Err(SizingError::InvalidRequirement(format!(
                "sweep velocity must be positive, got {velocity_kmh} km/h"
            )));
        }
        off_design.requirement.velocity_kmh = velocity_kmh;
        let drag_n = off_design.drag_n(catalog, client)?;
        let thrust_per_engine_n = drag_n / off_design.engines.len().max(1) as f64;
        let operating_points = off_design.operating_points(catalog, thrust_per_engine_n);
        let (Some(op), Some(engine)) = (operating_points.first(), off_design.engines.first()) else {
            return Err(SizingError::InvalidRequirement(
                "design has no engines".to_string(),
            ));
        };
        let motor = engine.motor(catalog);
        let (no_load_speed_rev_s, stall_torque_nm) = motor.torque_speed_limit(op.pack_voltage_v);
        points.push(SweepPoint {
            velocity_kmh,
            drag_n,
            thrust_per_engine_n,
            available_thrust_n: engine
                .propeller()
                .table()
                .available_thrust(kmh_to_ms(velocity_kmh)),
            rpm: op.rpm(),
            torque_nm: op.torque_nm(),
            voltage_v: op.voltage_v(),
            current_a: op.current_a(),
            no_load_speed_rev_s,
            stall_torque_nm,
            max_torque_nm: motor.max_torque_nm(),
            valid: operating_points.iter().all(|op| op.is_valid()),
        });
    }
    Ok(points)
}
