//! Discrete battery pack sizing from series cells and whole parallel groups.

use serde::{Deserialize, Serialize};

/// Slack absorbed before rounding a cell count up, so exact multiples stay exact.
const ROUNDING_SLACK: f64 = 1e-9;

/// Properties of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    pub capacity_ah: f64,
    pub voltage_v: f64,
    pub mass_kg: f64,
    pub volume_m3: f64,
}

/// A pack described by two mutable scalars; everything else is derived.
///
/// Both scalars only ever grow: [`grow_capacity`](Self::grow_capacity) and
/// [`raise_cells`](Self::raise_cells) refuse to shrink them.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryPack {
    cell: CellSpec,
    capacity_requested_ah: f64,
    cells_in_series: u32,
}

impl BatteryPack {
    pub fn new(cell: CellSpec, capacity_requested_ah: f64, cells_in_series: u32) -> Self {
        Self {
            cell,
            capacity_requested_ah: capacity_requested_ah.max(0.0),
            cells_in_series: cells_in_series.max(1),
        }
    }

    pub fn cell(&self) -> &CellSpec {
        &self.cell
    }

    pub fn capacity_requested_ah(&self) -> f64 {
        self.capacity_requested_ah
    }

    pub fn cells_in_series(&self) -> u32 {
        self.cells_in_series
    }

    /// Parallel groups needed to reach the requested capacity (at least one).
    pub fn parallel_groups(&self) -> u32 {
        let groups = (self.capacity_requested_ah / self.cell.capacity_ah - ROUNDING_SLACK).ceil();
        groups.max(1.0) as u32
    }

    /// Physical cells in the pack, saturating at `u32::MAX`.
    pub fn num_cells(&self) -> u32 {
        self.cells_in_series.saturating_mul(self.parallel_groups())
    }

    pub fn capacity_ah(&self) -> f64 {
        f64::from(self.num_cells()) / f64::from(self.cells_in_series) * self.cell.capacity_ah
    }

    pub fn voltage_v(&self) -> f64 {
        self.cell.voltage_v * f64::from(self.cells_in_series)
    }

    pub fn mass_kg(&self) -> f64 {
        self.cell.mass_kg * f64::from(self.num_cells())
    }

    pub fn energy_wh(&self) -> f64 {
        self.capacity_ah() * self.voltage_v()
    }

    /// Volume occupied by the cells alone (m³).
    pub fn cell_volume_m3(&self) -> f64 {
        self.cell.volume_m3 * f64::from(self.num_cells())
    }

    /// Grow the requested capacity for an endurance shortfall `factor = required / achieved`.
    ///
    /// The increment is rounded up to whole cell capacities. Returns `true` when the pack changed.
    pub fn grow_capacity(&mut self, factor: f64) -> bool {
        if !(factor > 1.0) || !factor.is_finite() {
            return false;
        }
        let cell_capacity = self.cell.capacity_ah;
        let increments =
            (self.capacity_ah() * (factor - 1.0) / cell_capacity - ROUNDING_SLACK).ceil();
        if increments <= 0.0 {
            return false;
        }
        self.capacity_requested_ah += increments * cell_capacity;
        true
    }

    /// Raise the series count to `required` if that is higher. Returns `true` when it changed.
    pub fn raise_cells(&mut self, required: u32) -> bool {
        if required > self.cells_in_series {
            self.cells_in_series = required;
            true
        } else {
            false
        }
    }
}
