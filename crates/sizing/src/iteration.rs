//! The fixed-point sizing loop.
//!
//! Each pass: resize the wing for the current weight, let every engine nudge its motor
//! selection against the current drag, grow the battery for any endurance shortfall and
//! raise the series count for the most demanding motor. The loop stops on the first pass in
//! which nothing changed and no engine has a held-back move, or at the pass limit.

use drone_aero::{AeroClient, AeroSolver};
use drone_propulsion::{MotorCatalog, SearchState};

use crate::SizingError;
use crate::design::{AircraftDesign, DesignEvaluation};
use crate::report::{DesignChange, Diagnostic, PassRecord, SizingReport, SizingStatus};
use crate::sweep::{SweepPoint, velocity_sweep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingOptions {
    pub max_passes: usize,
}

impl Default for SizingOptions {
    fn default() -> Self {
        Self { max_passes: 200 }
    }
}

/// Drives one or more designs against a catalog with an opened aerodynamic solver.
pub struct SizingLoop<'c, S: AeroSolver> {
    catalog: &'c MotorCatalog,
    client: AeroClient<S>,
    options: SizingOptions,
}

impl<'c, S: AeroSolver> SizingLoop<'c, S> {
    /// Opens `solver`; it stays open until [`SizingLoop::close`] or drop.
    pub fn new(
        catalog: &'c MotorCatalog,
        solver: S,
        options: SizingOptions,
    ) -> Result<Self, SizingError> {
        let mut client = AeroClient::new(solver);
        client.open()?;
        Ok(Self {
            catalog,
            client,
            options,
        })
    }

    pub fn catalog(&self) -> &MotorCatalog {
        self.catalog
    }

    pub fn options(&self) -> SizingOptions {
        self.options
    }

    pub fn client(&self) -> &AeroClient<S> {
        &self.client
    }

    /// Run one pass, mutating `design`.
    pub fn step(
        &mut self,
        design: &mut AircraftDesign,
        pass: usize,
    ) -> Result<PassRecord, SizingError> {
        let catalog = self.catalog;
        self.client.invalidate();
        let mut changes = Vec::new();
        let mut pending_engines = Vec::new();

        let velocity = design.velocity_m_s();
        let resized = design.airframe.wing.resize(
            design.wing_area_m2,
            design.weight_n(catalog),
            design.airframe.air_density_kg_m3,
            velocity,
        );
        if let Some(area) = resized {
            changes.push(DesignChange::WingArea {
                from_m2: design.wing_area_m2,
                to_m2: area,
            });
            design.wing_area_m2 = area;
        }

        for index in 0..design.engines.len() {
            // Demand reflects the motors already swapped earlier in this pass.
            let thrust = design.thrust_per_engine_n(catalog, &mut self.client)?;
            let pack_voltage = design.battery.voltage_v();
            let step = design.engines[index].iterate(catalog, velocity, thrust, pack_voltage);
            if step.changed {
                changes.push(DesignChange::Motor {
                    engine: index,
                    from_idx: step.from_idx,
                    to_idx: step.to_idx,
                    direction: step.direction,
                });
            }
            if step.state == SearchState::Searching {
                pending_engines.push(index);
            }
        }

        let thrust = design.thrust_per_engine_n(catalog, &mut self.client)?;
        let current = design.total_current_a(catalog, thrust);
        let factor = design
            .requirement
            .capacity_factor(design.battery.capacity_ah(), current);
        let before = design.battery.capacity_requested_ah();
        if design.battery.grow_capacity(factor) {
            changes.push(DesignChange::Capacity {
                from_ah: before,
                to_ah: design.battery.capacity_requested_ah(),
            });
        }

        if let Some(required) = design.cells_required(catalog) {
            let before = design.battery.cells_in_series();
            if design.battery.raise_cells(required) {
                changes.push(DesignChange::Cells {
                    from: before,
                    to: required,
                });
            }
        }

        Ok(PassRecord {
            pass,
            total_mass_kg: design.total_mass_kg(catalog),
            wing_area_m2: design.wing_area_m2,
            capacity_ah: design.battery.capacity_ah(),
            cells_in_series: design.battery.cells_in_series(),
            motor_indices: design.engines.iter().map(|e| e.motor_idx()).collect(),
            changes,
            pending_engines,
        })
    }

    /// Iterate to a fixed point or the pass limit and evaluate the result.
    pub fn run(&mut self, design: &mut AircraftDesign) -> Result<SizingReport, SizingError> {
        let mut trace = Vec::new();
        let mut converged = false;
        for pass in 1..=self.options.max_passes {
            let record = self.step(design, pass)?;
            let fixed = record.is_fixed_point();
            trace.push(record);
            if fixed {
                converged = true;
                break;
            }
        }

        let evaluation = self.evaluate(design)?;
        let mut diagnostics = Diagnostic::collect(&evaluation);
        let status = if !converged {
            diagnostics.push(Diagnostic::NonConvergence {
                passes: trace.len(),
            });
            SizingStatus::NotConverged
        } else if !evaluation.is_valid {
            SizingStatus::Infeasible
        } else {
            SizingStatus::Converged
        };

        Ok(SizingReport {
            status,
            passes: trace.len(),
            trace,
            evaluation,
            diagnostics,
        })
    }

    pub fn evaluate(&mut self, design: &AircraftDesign) -> Result<DesignEvaluation, SizingError> {
        self.client.invalidate();
        design.evaluate(self.catalog, &mut self.client)
    }

    /// Off-design evaluation of `design` at each velocity, without resizing.
    pub fn sweep(
        &mut self,
        design: &AircraftDesign,
        velocities_kmh: &[f64],
    ) -> Result<Vec<SweepPoint>, SizingError> {
        velocity_sweep(design, self.catalog, &mut self.client, velocities_kmh)
    }

    pub fn close(mut self) -> Result<(), SizingError> {
        self.client.close()?;
        Ok(())
    }
}
