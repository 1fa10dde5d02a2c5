//! Engine unit: one propeller map plus a motor selected from the catalog.
//!
//! The motor selection is a bounded hill-climb over the kV-ordered catalog. Within one
//! [`EngineUnit::iterate`] call the index only moves in one direction; across calls a
//! three-slot [`DirectionHistory`] suppresses reversals of a recent move. A suppressed move
//! leaves the engine [`SearchState::Searching`] so the caller keeps iterating.

use drone_core::units::rpm_to_rev_s;
use serde::Serialize;

use crate::motor::{MotorCandidate, MotorCatalog, MotorLoad};
use crate::propeller::{PropellerMap, PropellerOperatingPoint};

/// Direction of a change of the catalog index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Direction {
    Down,
    #[default]
    Hold,
    Up,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Down => Direction::Up,
            Direction::Hold => Direction::Hold,
            Direction::Up => Direction::Down,
        }
    }
}

/// Rolling record of the direction taken by the last three `iterate` calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionHistory {
    slots: [Direction; DirectionHistory::LEN],
}

impl DirectionHistory {
    pub const LEN: usize = 3;

    pub fn push(&mut self, direction: Direction) {
        self.slots.rotate_left(1);
        self.slots[Self::LEN - 1] = direction;
    }

    /// Oldest first.
    pub fn slots(&self) -> &[Direction; Self::LEN] {
        &self.slots
    }

    /// Latest non-`Hold` entry still inside the window.
    pub fn most_recent_move(&self) -> Option<Direction> {
        self.slots
            .iter()
            .rev()
            .copied()
            .find(|d| *d != Direction::Hold)
    }

    /// A move is allowed unless it reverses the most recent move in the window.
    pub fn permits(&self, direction: Direction) -> bool {
        direction == Direction::Hold || self.most_recent_move() != Some(direction.opposite())
    }
}

/// Where the motor search stands after the latest call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchState {
    /// A move is wanted but held back by damping.
    Searching,
    /// Infeasible and no rule can move further along the catalog.
    Exhausted,
    Feasible,
}

/// Propeller and motor state for one requested (velocity, thrust).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineOperatingPoint {
    pub motor_idx: usize,
    pub propeller: PropellerOperatingPoint,
    pub speed_rev_s: f64,
    pub load: MotorLoad,
    pub pack_voltage_v: f64,
    pub max_current_a: f64,
}

impl EngineOperatingPoint {
    pub fn rpm(&self) -> f64 {
        self.propeller.sample.rpm
    }

    pub fn torque_nm(&self) -> f64 {
        self.propeller.sample.torque_nm
    }

    pub fn thrust_n(&self) -> f64 {
        self.propeller.sample.thrust_n
    }

    pub fn voltage_v(&self) -> f64 {
        self.load.voltage_v
    }

    pub fn current_a(&self) -> f64 {
        self.load.current_a
    }

    pub fn motor_valid(&self) -> bool {
        self.load.is_valid()
    }

    pub fn is_valid(&self) -> bool {
        self.load.is_valid() && self.propeller.valid
    }

    /// Voltage above the pack voltage (positive when infeasible).
    pub fn voltage_overage_v(&self) -> f64 {
        self.load.voltage_v - self.pack_voltage_v
    }

    /// Current above the motor rating (positive when infeasible).
    pub fn current_overage_a(&self) -> f64 {
        self.load.current_a - self.max_current_a
    }
}

/// Outcome of one [`EngineUnit::iterate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStep {
    pub changed: bool,
    pub direction: Direction,
    pub from_idx: usize,
    pub to_idx: usize,
    pub state: SearchState,
}

impl EngineStep {
    /// The caller must run another pass: the index moved or a move is pending.
    pub fn needs_another_pass(&self) -> bool {
        self.changed || self.state == SearchState::Searching
    }
}

/// A propeller-motor pair.
#[derive(Debug, Clone)]
pub struct EngineUnit {
    propeller: PropellerMap,
    motor_idx: usize,
    history: DirectionHistory,
    state: SearchState,
}

impl EngineUnit {
    /// Create an engine; `motor_idx` is clamped into the catalog.
    pub fn new(propeller: PropellerMap, motor_idx: usize, catalog: &MotorCatalog) -> Self {
        Self {
            propeller,
            motor_idx: motor_idx.min(catalog.last_index()),
            history: DirectionHistory::default(),
            state: SearchState::Searching,
        }
    }

    pub fn propeller(&self) -> &PropellerMap {
        &self.propeller
    }

    pub fn motor_idx(&self) -> usize {
        self.motor_idx
    }

    pub fn history(&self) -> &DirectionHistory {
        &self.history
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn motor<'c>(&self, catalog: &'c MotorCatalog) -> &'c MotorCandidate {
        &catalog[self.motor_idx.min(catalog.last_index())]
    }

    /// Operating point of the currently selected motor.
    pub fn operating_point(
        &self,
        catalog: &MotorCatalog,
        velocity_m_s: f64,
        thrust_n: f64,
        pack_voltage_v: f64,
    ) -> EngineOperatingPoint {
        let propeller = self.propeller.lookup(velocity_m_s, thrust_n);
        Self::evaluate(catalog, self.motor_idx, propeller, pack_voltage_v)
    }

    /// Series cells this engine's motor needs over the full propeller envelope.
    pub fn battery_cells_required(
        &self,
        catalog: &MotorCatalog,
        voltage_per_cell: f64,
    ) -> Option<u32> {
        self.motor(catalog)
            .battery_cells_required(self.propeller.table(), voltage_per_cell)
    }

    /// Nudge the motor selection toward feasibility for the given demand.
    pub fn iterate(
        &mut self,
        catalog: &MotorCatalog,
        velocity_m_s: f64,
        thrust_n: f64,
        pack_voltage_v: f64,
    ) -> EngineStep {
        let propeller = self.propeller.lookup(velocity_m_s, thrust_n);
        self.motor_idx = self.motor_idx.min(catalog.last_index());
        let from_idx = self.motor_idx;
        let mut last = Direction::Hold;
        let mut blocked = false;

        loop {
            let op = Self::evaluate(catalog, self.motor_idx, propeller, pack_voltage_v);
            let wanted = Self::proposal(catalog, self.motor_idx, &op.load);
            if wanted == Direction::Hold {
                break;
            }
            if last == wanted.opposite() || !self.history.permits(wanted) {
                blocked = true;
                break;
            }
            self.motor_idx = match wanted {
                Direction::Up => (self.motor_idx + 1).min(catalog.last_index()),
                Direction::Down => self.motor_idx.saturating_sub(1),
                Direction::Hold => self.motor_idx,
            };
            last = wanted;
        }

        self.history.push(last);
        let op = Self::evaluate(catalog, self.motor_idx, propeller, pack_voltage_v);
        self.state = if op.load.is_valid() {
            SearchState::Feasible
        } else if blocked {
            SearchState::Searching
        } else {
            SearchState::Exhausted
        };

        EngineStep {
            changed: last != Direction::Hold,
            direction: last,
            from_idx,
            to_idx: self.motor_idx,
            state: self.state,
        }
    }

    fn evaluate(
        catalog: &MotorCatalog,
        motor_idx: usize,
        propeller: PropellerOperatingPoint,
        pack_voltage_v: f64,
    ) -> EngineOperatingPoint {
        let motor_idx = motor_idx.min(catalog.last_index());
        let motor = &catalog[motor_idx];
        let speed_rev_s = rpm_to_rev_s(propeller.sample.rpm);
        let load = motor.load(speed_rev_s, propeller.sample.torque_nm, pack_voltage_v);
        EngineOperatingPoint {
            motor_idx,
            propeller,
            speed_rev_s,
            load,
            pack_voltage_v,
            max_current_a: motor.max_current_a,
        }
    }

    /// Which way the selection rules want to move from `idx`.
    fn proposal(catalog: &MotorCatalog, idx: usize, load: &MotorLoad) -> Direction {
        let has_higher = idx < catalog.last_index();
        let has_lower = idx > 0;
        if !load.voltage_valid && load.current_valid && has_higher {
            Direction::Up
        } else if !load.current_valid && load.voltage_valid && has_lower {
            Direction::Down
        } else if !load.current_valid
            && !load.voltage_valid
            && has_lower
            && catalog[idx - 1].max_torque_nm() > catalog[idx].max_torque_nm()
        {
            Direction::Down
        } else {
            Direction::Hold
        }
    }
}
