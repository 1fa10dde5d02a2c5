//! Wing area sizing from weight and the lift coefficients the wing is allowed to fly at.

use drone_core::units::dynamic_pressure;
use serde::Serialize;

use crate::solver::{AeroClient, AeroCoefficients, AeroError, AeroSolver};
use crate::wing::{FlightCondition, WingGeometry, WingPlanform};

#[derive(Debug, Clone, PartialEq)]
pub struct WingSizer {
    pub planform: WingPlanform,
    /// Lift coefficient the wing is sized to cruise at.
    pub design_cl: f64,
    pub cl_max: f64,
    /// When set, the wing must also hold the weight at this speed with `cl_max`.
    pub stall_speed_m_s: Option<f64>,
    /// Area changes smaller than this are not applied.
    pub area_tolerance_m2: f64,
    pub areal_mass_kg_m2: f64,
}

/// What the wing does at one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WingAerodynamics {
    pub geometry: WingGeometry,
    pub condition: FlightCondition,
    pub coefficients: AeroCoefficients,
    pub lift_n: f64,
    pub drag_n: f64,
}

impl WingSizer {
    pub fn required_area_m2(&self, weight_n: f64, density_kg_m3: f64, velocity_m_s: f64) -> f64 {
        let cruise = weight_n / (dynamic_pressure(density_kg_m3, velocity_m_s) * self.design_cl);
        match self.stall_speed_m_s {
            Some(stall) => {
                cruise.max(weight_n / (dynamic_pressure(density_kg_m3, stall) * self.cl_max))
            }
            None => cruise,
        }
    }

    /// New area when the required one differs from `current_m2` by at least the tolerance.
    pub fn resize(
        &self,
        current_m2: f64,
        weight_n: f64,
        density_kg_m3: f64,
        velocity_m_s: f64,
    ) -> Option<f64> {
        let required = self.required_area_m2(weight_n, density_kg_m3, velocity_m_s);
        ((required - current_m2).abs() >= self.area_tolerance_m2).then_some(required)
    }

    pub fn geometry(&self, area_m2: f64) -> WingGeometry {
        WingGeometry::from_area(area_m2, &self.planform)
    }

    pub fn structural_mass_kg(&self, area_m2: f64) -> f64 {
        area_m2 * self.areal_mass_kg_m2
    }

    /// Solve the wing at the lift coefficient that carries `weight_n` in level flight.
    pub fn aerodynamics<S: AeroSolver>(
        &self,
        client: &mut AeroClient<S>,
        area_m2: f64,
        weight_n: f64,
        density_kg_m3: f64,
        velocity_m_s: f64,
    ) -> Result<WingAerodynamics, AeroError> {
        let geometry = self.geometry(area_m2);
        let condition = FlightCondition::new(velocity_m_s, density_kg_m3, geometry.mac_m());
        let q = condition.dynamic_pressure();
        let coefficients = client.solve(&geometry, &condition, weight_n / (q * area_m2))?;
        Ok(WingAerodynamics {
            lift_n: q * area_m2 * coefficients.cl,
            drag_n: q * area_m2 * coefficients.cd,
            geometry,
            condition,
            coefficients,
        })
    }
}
