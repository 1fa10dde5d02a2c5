//! What a sizing run hands back: the pass trace, the final evaluation and diagnostics.

use std::fmt;

use drone_propulsion::{Direction, SearchState};
use serde::Serialize;

use crate::design::DesignEvaluation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingStatus {
    /// Fixed point reached and every engine is inside its envelope.
    Converged,
    /// Fixed point reached but at least one engine is out of range.
    Infeasible,
    /// The pass limit was hit before a fixed point.
    NotConverged,
}

impl fmt::Display for SizingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SizingStatus::Converged => "converged",
            SizingStatus::Infeasible => "infeasible",
            SizingStatus::NotConverged => "not converged",
        };
        f.write_str(label)
    }
}

/// One mutation applied during a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DesignChange {
    WingArea {
        from_m2: f64,
        to_m2: f64,
    },
    Motor {
        engine: usize,
        from_idx: usize,
        to_idx: usize,
        direction: Direction,
    },
    Capacity {
        from_ah: f64,
        to_ah: f64,
    },
    Cells {
        from: u32,
        to: u32,
    },
}

impl fmt::Display for DesignChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignChange::WingArea { from_m2, to_m2 } => {
                write!(f, "wing area {from_m2:.3} -> {to_m2:.3} m²")
            }
            DesignChange::Motor {
                engine,
                from_idx,
                to_idx,
                direction,
            } => write!(
                f,
                "engine {engine}: motor {from_idx} -> {to_idx} ({direction:?})"
            ),
            DesignChange::Capacity { from_ah, to_ah } => {
                write!(f, "requested capacity {from_ah:.1} -> {to_ah:.1} Ah")
            }
            DesignChange::Cells { from, to } => write!(f, "series cells {from} -> {to}"),
        }
    }
}

/// State of the design at the end of one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassRecord {
    pub pass: usize,
    pub total_mass_kg: f64,
    pub wing_area_m2: f64,
    pub capacity_ah: f64,
    pub cells_in_series: u32,
    pub motor_indices: Vec<usize>,
    pub changes: Vec<DesignChange>,
    /// Engines whose move was held back by reversal damping.
    pub pending_engines: Vec<usize>,
}

impl PassRecord {
    pub fn is_fixed_point(&self) -> bool {
        self.changes.is_empty() && self.pending_engines.is_empty()
    }
}

/// Human-readable reasons a design is not clean.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    CurrentExceeded {
        engine: usize,
        motor: String,
        propeller: String,
        current_a: f64,
        limit_a: f64,
    },
    VoltageExceeded {
        engine: usize,
        motor: String,
        propeller: String,
        voltage_v: f64,
        pack_voltage_v: f64,
    },
    PropellerOutOfEnvelope {
        engine: usize,
        propeller: String,
        velocity_m_s: f64,
        requested_thrust_n: f64,
        table_thrust_n: f64,
    },
    MotorSearchExhausted {
        engine: usize,
        motor: String,
    },
    CellsUnavailable {
        cells_in_series: u32,
    },
    EnginesOutsideSpan {
        count: usize,
        semi_span_m: f64,
    },
    NonConvergence {
        passes: usize,
    },
}

impl Diagnostic {
    /// Everything the final evaluation has to complain about.
    pub fn collect(evaluation: &DesignEvaluation) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for engine in &evaluation.engines {
            let op = &engine.operating_point;
            if !op.load.current_valid {
                diagnostics.push(Diagnostic::CurrentExceeded {
                    engine: engine.index,
                    motor: engine.motor_name.clone(),
                    propeller: engine.propeller_id.clone(),
                    current_a: op.current_a(),
                    limit_a: op.max_current_a,
                });
            }
            if !op.load.voltage_valid {
                diagnostics.push(Diagnostic::VoltageExceeded {
                    engine: engine.index,
                    motor: engine.motor_name.clone(),
                    propeller: engine.propeller_id.clone(),
                    voltage_v: op.voltage_v(),
                    pack_voltage_v: op.pack_voltage_v,
                });
            }
            if !op.propeller.valid {
                diagnostics.push(Diagnostic::PropellerOutOfEnvelope {
                    engine: engine.index,
                    propeller: engine.propeller_id.clone(),
                    velocity_m_s: op.propeller.requested_velocity_m_s,
                    requested_thrust_n: op.propeller.requested_thrust_n,
                    table_thrust_n: op.thrust_n(),
                });
            }
            if engine.state == SearchState::Exhausted {
                diagnostics.push(Diagnostic::MotorSearchExhausted {
                    engine: engine.index,
                    motor: engine.motor_name.clone(),
                });
            }
        }
        if evaluation.cells_required.is_none() {
            diagnostics.push(Diagnostic::CellsUnavailable {
                cells_in_series: evaluation.battery.cells_in_series,
            });
        }
        if evaluation.engines_outside_span > 0 {
            diagnostics.push(Diagnostic::EnginesOutsideSpan {
                count: evaluation.engines_outside_span,
                semi_span_m: evaluation.wing.geometry.semi_span_m(),
            });
        }
        diagnostics
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::CurrentExceeded {
                engine,
                motor,
                propeller,
                current_a,
                limit_a,
            } => write!(
                f,
                "engine {engine} ({motor} with {propeller}) draws {current_a:.2} A, \
                 {:.2} A over its {limit_a:.2} A rating",
                current_a - limit_a
            ),
            Diagnostic::VoltageExceeded {
                engine,
                motor,
                propeller,
                voltage_v,
                pack_voltage_v,
            } => write!(
                f,
                "engine {engine} ({motor} with {propeller}) needs {voltage_v:.2} V, \
                 {:.2} V over the {pack_voltage_v:.2} V pack",
                voltage_v - pack_voltage_v
            ),
            Diagnostic::PropellerOutOfEnvelope {
                engine,
                propeller,
                velocity_m_s,
                requested_thrust_n,
                table_thrust_n,
            } => write!(
                f,
                "engine {engine}: propeller {propeller} cannot give {requested_thrust_n:.2} N \
                 at {velocity_m_s:.2} m/s (closest tabulated {table_thrust_n:.2} N)"
            ),
            Diagnostic::MotorSearchExhausted { engine, motor } => write!(
                f,
                "engine {engine}: no catalog motor beyond {motor} improves the operating point"
            ),
            Diagnostic::CellsUnavailable { cells_in_series } => write!(
                f,
                "no selected motor can cover its propeller envelope within its voltage rating; \
                 series cells left at {cells_in_series}"
            ),
            Diagnostic::EnginesOutsideSpan { count, semi_span_m } => write!(
                f,
                "{count} engine(s) sit outside the {semi_span_m:.3} m semi-span"
            ),
            Diagnostic::NonConvergence { passes } => {
                write!(f, "no fixed point after {passes} passes")
            }
        }
    }
}

/// Result of [`SizingLoop::run`](crate::SizingLoop::run).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingReport {
    pub status: SizingStatus,
    pub passes: usize,
    pub trace: Vec<PassRecord>,
    pub evaluation: DesignEvaluation,
    pub diagnostics: Vec<Diagnostic>,
}

impl SizingReport {
    pub fn is_valid(&self) -> bool {
        self.evaluation.is_valid
    }

    pub fn converged(&self) -> bool {
        self.status != SizingStatus::NotConverged
    }
}
