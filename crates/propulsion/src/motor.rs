//! Brushless motor electrical model and the kV-ordered motor catalog.

use std::f64::consts::PI;
use std::fs::File;
use std::io;
use std::path::Path;

use drone_core::units::rpm_to_rev_s;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::propeller::PerformanceTable;

/// Errors raised while loading a motor catalog.
#[derive(Debug, Error)]
pub enum MotorError {
    #[error("failed to read motor catalog: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse motor catalog: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed motor catalog at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("motor catalog is empty")]
    EmptyCatalog,
}

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorCandidate {
    pub name: String,
    /// Speed constant (rpm/V).
    pub kv: f64,
    pub resistance_ohm: f64,
    pub length_m: f64,
    pub diameter_m: f64,
    pub max_current_a: f64,
    pub max_voltage_v: f64,
    pub mass_kg: f64,
}

/// Electrical state of a motor driven at one operating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotorLoad {
    pub voltage_v: f64,
    pub current_a: f64,
    pub current_valid: bool,
    pub voltage_valid: bool,
}

impl MotorLoad {
    pub fn is_valid(&self) -> bool {
        self.current_valid && self.voltage_valid
    }
}

impl MotorCandidate {
    /// Back-EMF constant in V·s per revolution.
    pub fn k_phi(&self) -> f64 {
        60.0 / self.kv
    }

    /// Terminal voltage needed to turn at `speed_rev_s` against `torque_nm`.
    pub fn voltage(&self, speed_rev_s: f64, torque_nm: f64) -> f64 {
        let k_phi = self.k_phi();
        speed_rev_s * k_phi + 2.0 * PI * self.resistance_ohm / k_phi * torque_nm
    }

    /// Winding current needed to produce `torque_nm`.
    pub fn current(&self, torque_nm: f64) -> f64 {
        2.0 * PI / self.k_phi() * torque_nm
    }

    /// Torque available at the current rating.
    pub fn max_torque_nm(&self) -> f64 {
        self.k_phi() * self.max_current_a / (2.0 * PI)
    }

    /// No-load speed (rev/s) and stall torque (N·m) of the line limiting operation at `voltage_v`.
    pub fn torque_speed_limit(&self, voltage_v: f64) -> (f64, f64) {
        let k_phi = self.k_phi();
        let no_load_speed = voltage_v / k_phi;
        let stall_torque = if self.resistance_ohm > 0.0 {
            no_load_speed / (self.resistance_ohm * 2.0 * PI / (k_phi * k_phi))
        } else {
            f64::INFINITY
        };
        (no_load_speed, stall_torque)
    }

    /// Evaluate the operating point against the current rating and the pack voltage.
    pub fn load(&self, speed_rev_s: f64, torque_nm: f64, pack_voltage_v: f64) -> MotorLoad {
        let voltage_v = self.voltage(speed_rev_s, torque_nm);
        let current_a = self.current(torque_nm);
        MotorLoad {
            voltage_v,
            current_a,
            current_valid: current_a <= self.max_current_a,
            voltage_valid: voltage_v <= pack_voltage_v,
        }
    }

    /// Highest voltage this motor needs anywhere in the propeller's tabulated envelope.
    pub fn envelope_voltage(&self, table: &PerformanceTable) -> Option<f64> {
        table
            .samples()
            .map(|s| self.voltage(rpm_to_rev_s(s.rpm), s.torque_nm))
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |current| current.max(v)))
            })
    }

    /// Smallest series-cell count covering the whole envelope.
    ///
    /// `None` when the envelope needs more than this motor's voltage rating.
    pub fn battery_cells_required(
        &self,
        table: &PerformanceTable,
        voltage_per_cell: f64,
    ) -> Option<u32> {
        let required = self.envelope_voltage(table)?;
        if !required.is_finite() || required > self.max_voltage_v || voltage_per_cell <= 0.0 {
            return None;
        }
        let cells = (required / voltage_per_cell - 1e-9).ceil().max(1.0);
        Some(cells as u32)
    }

    fn validate(&self, line: usize) -> Result<(), MotorError> {
        let malformed = |reason: &str| MotorError::Malformed {
            line,
            reason: format!("{} ({})", reason, self.name),
        };
        let values = [
            self.kv,
            self.resistance_ohm,
            self.length_m,
            self.diameter_m,
            self.max_current_a,
            self.max_voltage_v,
            self.mass_kg,
        ];
        if !values.iter().all(|v| v.is_finite()) {
            return Err(malformed("non-finite value"));
        }
        if self.kv <= 0.0 {
            return Err(malformed("kv must be positive"));
        }
        if self.resistance_ohm < 0.0 {
            return Err(malformed("resistance must not be negative"));
        }
        if self.max_current_a <= 0.0 || self.max_voltage_v <= 0.0 || self.mass_kg <= 0.0 {
            return Err(malformed("current, voltage and mass limits must be positive"));
        }
        Ok(())
    }
}

/// Read-only motor catalog sorted ascending by kV.
#[derive(Debug, Clone)]
pub struct MotorCatalog {
    motors: Vec<MotorCandidate>,
}

impl MotorCatalog {
    /// Validate and sort a list of candidates.
    pub fn new(mut motors: Vec<MotorCandidate>) -> Result<Self, MotorError> {
        if motors.is_empty() {
            return Err(MotorError::EmptyCatalog);
        }
        for (idx, motor) in motors.iter().enumerate() {
            motor.validate(idx + 1)?;
        }
        motors.sort_by(|a, b| a.kv.total_cmp(&b.kv));
        Ok(Self { motors })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MotorError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, MotorError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let mut motors = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record
                .position()
                .map(|pos| pos.line() as usize)
                .unwrap_or_default();
            let motor: MotorCandidate = record.deserialize(Some(&headers))?;
            motor.validate(line)?;
            motors.push(motor);
        }
        Self::new(motors)
    }

    pub fn len(&self) -> usize {
        self.motors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motors.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&MotorCandidate> {
        self.motors.get(idx)
    }

    /// Highest valid index.
    pub fn last_index(&self) -> usize {
        self.motors.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &MotorCandidate> + '_ {
        self.motors.iter()
    }

    pub fn as_slice(&self) -> &[MotorCandidate] {
        &self.motors
    }

    /// Catalog position of a motor by name (case-insensitive).
    pub fn position(&self, name: &str) -> Option<usize> {
        let upper = name.to_uppercase();
        self.motors
            .iter()
            .position(|motor| motor.name.to_uppercase() == upper)
    }
}

impl std::ops::Index<usize> for MotorCatalog {
    type Output = MotorCandidate;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.motors[idx]
    }
}
