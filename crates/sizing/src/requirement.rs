//! Mission requirement driving a design run.

use drone_core::units::kmh_to_ms;
use serde::Serialize;

use crate::SizingError;

/// Whether the endurance target is a flight time (h) or a flight distance (km).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnduranceMode {
    Time,
    Range,
}

/// Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightRequirement {
    /// Hours in [`EnduranceMode::Time`], kilometres in [`EnduranceMode::Range`].
    pub endurance: f64,
    pub mode: EnduranceMode,
    pub velocity_kmh: f64,
    pub num_engines: usize,
    pub propeller_id: String,
    /// Carried through to reports; not used numerically.
    pub structural_material: Option<String>,
}

/// Flight time a pack sustains at a given draw; unbounded when nothing draws current.
pub fn endurance_time_h(capacity_ah: f64, current_a: f64) -> f64 {
    if current_a > 0.0 {
        capacity_ah / current_a
    } else {
        f64::INFINITY
    }
}

impl FlightRequirement {
    pub fn validate(&self) -> Result<(), SizingError> {
        if !(self.endurance.is_finite() && self.endurance > 0.0) {
            return Err(SizingError::InvalidRequirement(format!(
                "endurance must be positive, got {}",
                self.endurance
            )));
        }
        if !(self.velocity_kmh.is_finite() && self.velocity_kmh > 0.0) {
            return Err(SizingError::InvalidRequirement(format!(
                "cruise velocity must be positive, got {} km/h",
                self.velocity_kmh
            )));
        }
        if self.num_engines == 0 {
            return Err(SizingError::InvalidRequirement(
                "at least one engine is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn velocity_m_s(&self) -> f64 {
        kmh_to_ms(self.velocity_kmh)
    }

    /// Endurance achieved by `capacity_ah` at `current_a`, in the requirement's unit.
    pub fn achieved(&self, capacity_ah: f64, current_a: f64) -> f64 {
        let time_h = endurance_time_h(capacity_ah, current_a);
        match self.mode {
            EnduranceMode::Time => time_h,
            EnduranceMode::Range => self.velocity_kmh * time_h,
        }
    }

    /// `required / achieved`; zero when the achieved endurance is unbounded.
    pub fn capacity_factor(&self, capacity_ah: f64, current_a: f64) -> f64 {
        let achieved = self.achieved(capacity_ah, current_a);
        if achieved.is_infinite() {
            0.0
        } else {
            self.endurance / achieved
        }
    }
}
