//! The aircraft under design.
//!
//! Only four things are mutable: the battery's requested capacity and series count, the wing
//! area and each engine's motor index. Everything else is recomputed from them on demand.

use drone_aero::{AeroClient, AeroSolver, WingAerodynamics, WingGeometry, WingSizer};
use drone_core::units::{dynamic_pressure, weight_n};
use drone_core::vector::{ORIGIN, Vector3, weighted_mean};
use drone_propulsion::{
    BatteryPack, CellSpec, EngineOperatingPoint, EngineUnit, MotorCatalog, PropellerMap,
    SearchState,
};
use serde::Serialize;

use crate::SizingError;
use crate::layout::{FuselageGeometry, FuselageSpec, PayloadSpec, engine_span_m, engine_stations};
use crate::requirement::{FlightRequirement, endurance_time_h};

/// The parts of the aircraft the loop never changes.
#[derive(Debug, Clone)]
pub struct Airframe {
    pub payload: PayloadSpec,
    /// Fraction of the battery bay volume filled by cells.
    pub packing_factor: f64,
    pub wing: WingSizer,
    pub fuselage: FuselageSpec,
    pub air_density_kg_m3: f64,
}

fn positive(field: &'static str, value: f64) -> Result<(), SizingError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SizingError::InvalidParameter { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), SizingError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SizingError::InvalidParameter { field, value })
    }
}

impl Airframe {
    /// Reject dimensions and coefficients the sizing arithmetic cannot work with.
    pub fn validate(&self) -> Result<(), SizingError> {
        positive("payload.width_m", self.payload.width_m)?;
        positive("payload.length_m", self.payload.length_m)?;
        positive("payload.height_m", self.payload.height_m)?;
        non_negative("payload.mass_kg", self.payload.mass_kg)?;
        positive("battery.packing_factor", self.packing_factor)?;
        if self.packing_factor > 1.0 {
            return Err(SizingError::InvalidParameter {
                field: "battery.packing_factor",
                value: self.packing_factor,
            });
        }

        let planform = &self.wing.planform;
        positive("wing.aspect_ratio", planform.aspect_ratio)?;
        non_negative("wing.taper_ratio", planform.taper_ratio)?;
        non_negative("wing.thickness_ratio", planform.thickness_ratio)?;
        if !(planform.sweep_deg.is_finite() && planform.sweep_deg.abs() < 90.0) {
            return Err(SizingError::InvalidParameter {
                field: "wing.sweep_deg",
                value: planform.sweep_deg,
            });
        }
        non_negative("wing.min_span_m", planform.min_span_m)?;
        positive("envelope.max_width_m", planform.max_span_m)?;
        positive("wing.design_cl", self.wing.design_cl)?;
        positive("wing.cl_max", self.wing.cl_max)?;
        if let Some(stall) = self.wing.stall_speed_m_s {
            positive("wing.stall_speed", stall)?;
        }
        non_negative("sizing.area_tolerance_m2", self.wing.area_tolerance_m2)?;
        non_negative("wing.areal_mass_kg_m2", self.wing.areal_mass_kg_m2)?;

        non_negative("fuselage.drag_coefficient", self.fuselage.drag_coefficient)?;
        non_negative("fuselage.areal_mass_kg_m2", self.fuselage.areal_mass_kg_m2)?;
        positive("envelope.air_density_kg_m3", self.air_density_kg_m3)
    }
}

fn validate_cell(cell: &CellSpec) -> Result<(), SizingError> {
    positive("battery.cell_capacity_ah", cell.capacity_ah)?;
    positive("battery.cell_voltage_v", cell.voltage_v)?;
    positive("battery.cell_mass_kg", cell.mass_kg)?;
    non_negative("battery.cell_volume_m3", cell.volume_m3)
}

#[derive(Debug, Clone)]
pub struct AircraftDesign {
    pub requirement: FlightRequirement,
    pub airframe: Airframe,
    pub battery: BatteryPack,
    pub wing_area_m2: f64,
    pub engines: Vec<EngineUnit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MassBreakdown {
    pub battery_kg: f64,
    pub payload_kg: f64,
    pub motors_kg: f64,
    pub wing_kg: f64,
    pub fuselage_kg: f64,
}

impl MassBreakdown {
    pub fn total_kg(&self) -> f64 {
        self.battery_kg + self.payload_kg + self.motors_kg + self.wing_kg + self.fuselage_kg
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatterySummary {
    pub cells_in_series: u32,
    pub parallel_groups: u32,
    pub num_cells: u32,
    pub capacity_ah: f64,
    pub voltage_v: f64,
    pub mass_kg: f64,
    pub energy_wh: f64,
    pub length_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineReport {
    pub index: usize,
    pub motor_name: String,
    pub propeller_id: String,
    pub position: Vector3,
    pub state: SearchState,
    pub operating_point: EngineOperatingPoint,
    pub cells_required: Option<u32>,
}

/// Snapshot of every derived attribute of a design.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignEvaluation {
    pub mass: MassBreakdown,
    pub total_mass_kg: f64,
    pub center_of_gravity: Vector3,
    pub wing: WingAerodynamics,
    pub fuselage: FuselageGeometry,
    pub fuselage_drag_n: f64,
    pub total_drag_n: f64,
    pub thrust_per_engine_n: f64,
    pub engines: Vec<EngineReport>,
    pub battery: BatterySummary,
    pub total_current_a: f64,
    pub endurance_time_h: f64,
    pub endurance_range_km: f64,
    /// Highest series count any engine can state; `None` when none can.
    pub cells_required: Option<u32>,
    pub engines_outside_span: usize,
    pub is_valid: bool,
}

impl AircraftDesign {
    /// Build a design with `requirement.num_engines` identical engines.
    ///
    /// The wing's minimum span is raised to the span the engine stations need.
    pub fn new(
        requirement: FlightRequirement,
        mut airframe: Airframe,
        battery: BatteryPack,
        wing_area_m2: f64,
        propeller: PropellerMap,
        initial_motor_idx: usize,
        catalog: &MotorCatalog,
    ) -> Result<Self, SizingError> {
        requirement.validate()?;
        airframe.validate()?;
        validate_cell(battery.cell())?;
        let engine_span = engine_span_m(
            requirement.num_engines,
            propeller.spec().diameter_m(),
            airframe.payload.fuselage_radius_m(),
        );
        let planform = &mut airframe.wing.planform;
        planform.min_span_m = planform.min_span_m.max(engine_span);
        if !(wing_area_m2.is_finite() && wing_area_m2 > 0.0) {
            return Err(SizingError::InvalidRequirement(format!(
                "initial wing area must be positive, got {wing_area_m2} m²"
            )));
        }
        let engines = (0..requirement.num_engines)
            .map(|_| EngineUnit::new(propeller.clone(), initial_motor_idx, catalog))
            .collect();
        Ok(Self {
            requirement,
            airframe,
            battery,
            wing_area_m2,
            engines,
        })
    }

    pub fn velocity_m_s(&self) -> f64 {
        self.requirement.velocity_m_s()
    }

    pub fn dynamic_pressure(&self) -> f64 {
        dynamic_pressure(self.airframe.air_density_kg_m3, self.velocity_m_s())
    }

    /// Pack length with the payload cross-section.
    pub fn battery_length_m(&self) -> f64 {
        self.battery.cell_volume_m3()
            / self.airframe.packing_factor
            / self.airframe.payload.cross_section_m2()
    }

    pub fn fuselage_geometry(&self) -> FuselageGeometry {
        FuselageGeometry::around(&self.airframe.payload, self.battery_length_m())
    }

    pub fn wing_geometry(&self) -> WingGeometry {
        self.airframe.wing.geometry(self.wing_area_m2)
    }

    pub fn mass_breakdown(&self, catalog: &MotorCatalog) -> MassBreakdown {
        MassBreakdown {
            battery_kg: self.battery.mass_kg(),
            payload_kg: self.airframe.payload.mass_kg,
            motors_kg: self.engines.iter().map(|e| e.motor(catalog).mass_kg).sum(),
            wing_kg: self.airframe.wing.structural_mass_kg(self.wing_area_m2),
            fuselage_kg: self.fuselage_geometry().mass_kg(&self.airframe.fuselage),
        }
    }

    pub fn total_mass_kg(&self, catalog: &MotorCatalog) -> f64 {
        self.mass_breakdown(catalog).total_kg()
    }

    pub fn weight_n(&self, catalog: &MotorCatalog) -> f64 {
        weight_n(self.total_mass_kg(catalog))
    }

    /// Motor positions, in engine order.
    pub fn engine_positions(&self) -> Vec<Vector3> {
        let diameter = self
            .engines
            .iter()
            .map(|e| e.propeller().spec().diameter_m())
            .fold(0.0, f64::max);
        let fuselage = self.fuselage_geometry();
        let wing = self.wing_geometry();
        engine_stations(self.engines.len(), diameter, fuselage.radius_m)
            .into_iter()
            .map(|y| {
                if y == 0.0 {
                    [fuselage.nose_tip_x_m(), 0.0, 0.0]
                } else {
                    [wing.leading_edge_x_m(y), y, 0.0]
                }
            })
            .collect()
    }

    pub fn engines_outside_span(&self) -> usize {
        let semi_span = self.wing_geometry().semi_span_m();
        self.engine_positions()
            .iter()
            .filter(|p| p[1].abs() > semi_span)
            .count()
    }

    /// Mass-weighted mean of every component; `None` for a massless design.
    pub fn center_of_gravity(&self, catalog: &MotorCatalog) -> Option<Vector3> {
        let fuselage = self.fuselage_geometry();
        let wing = self.wing_geometry();
        let payload_cog = self.airframe.payload.center_of_gravity(fuselage.battery_length_m);
        let fuselage_cog = fuselage.center_of_gravity();
        let wing_cog = [wing.centroid_x_m(), 0.0, 0.0];
        let positions = self.engine_positions();

        let mut items = vec![
            (self.battery.mass_kg(), &ORIGIN),
            (self.airframe.payload.mass_kg, &payload_cog),
            (fuselage.mass_kg(&self.airframe.fuselage), &fuselage_cog),
            (self.airframe.wing.structural_mass_kg(self.wing_area_m2), &wing_cog),
        ];
        items.extend(
            self.engines
                .iter()
                .zip(positions.iter())
                .map(|(engine, position)| (engine.motor(catalog).mass_kg, position)),
        );
        weighted_mean(items)
    }

    pub fn wing_aerodynamics<S: AeroSolver>(
        &self,
        catalog: &MotorCatalog,
        client: &mut AeroClient<S>,
    ) -> Result<WingAerodynamics, SizingError> {
        Ok(self.airframe.wing.aerodynamics(
            client,
            self.wing_area_m2,
            self.weight_n(catalog),
            self.airframe.air_density_kg_m3,
            self.velocity_m_s(),
        )?)
    }

    pub fn fuselage_drag_n(&self) -> f64 {
        self.fuselage_geometry()
            .drag_n(&self.airframe.fuselage, self.dynamic_pressure())
    }

    pub fn drag_n<S: AeroSolver>(
        &self,
        catalog: &MotorCatalog,
        client: &mut AeroClient<S>,
    ) -> Result<f64, SizingError> {
        Ok(self.wing_aerodynamics(catalog, client)?.drag_n + self.fuselage_drag_n())
    }

    /// Drag shared equally between the engines.
    pub fn thrust_per_engine_n<S: AeroSolver>(
        &self,
        catalog: &MotorCatalog,
        client: &mut AeroClient<S>,
    ) -> Result<f64, SizingError> {
        Ok(self.drag_n(catalog, client)? / self.engines.len().max(1) as f64)
    }

    pub fn operating_points(
        &self,
        catalog: &MotorCatalog,
        thrust_per_engine_n: f64,
    ) -> Vec<EngineOperatingPoint> {
        let velocity = self.velocity_m_s();
        let pack_voltage = self.battery.voltage_v();
        self.engines
            .iter()
            .map(|e| e.operating_point(catalog, velocity, thrust_per_engine_n, pack_voltage))
            .collect()
    }

    pub fn total_current_a(&self, catalog: &MotorCatalog, thrust_per_engine_n: f64) -> f64 {
        self.operating_points(catalog, thrust_per_engine_n)
            .iter()
            .map(|op| op.current_a())
            .sum()
    }

    /// Series cells needed by the most demanding engine that can state a requirement.
    pub fn cells_required(&self, catalog: &MotorCatalog) -> Option<u32> {
        let voltage_per_cell = self.battery.cell().voltage_v;
        self.engines
            .iter()
            .filter_map(|e| e.battery_cells_required(catalog, voltage_per_cell))
            .max()
    }

    pub fn battery_summary(&self) -> BatterySummary {
        BatterySummary {
            cells_in_series: self.battery.cells_in_series(),
            parallel_groups: self.battery.parallel_groups(),
            num_cells: self.battery.num_cells(),
            capacity_ah: self.battery.capacity_ah(),
            voltage_v: self.battery.voltage_v(),
            mass_kg: self.battery.mass_kg(),
            energy_wh: self.battery.energy_wh(),
            length_m: self.battery_length_m(),
        }
    }

    /// Recompute every derived attribute of the current state.
    pub fn evaluate<S: AeroSolver>(
        &self,
        catalog: &MotorCatalog,
        client: &mut AeroClient<S>,
    ) -> Result<DesignEvaluation, SizingError> {
        let mass = self.mass_breakdown(catalog);
        let center_of_gravity = self
            .center_of_gravity(catalog)
            .ok_or(SizingError::MasslessDesign)?;
        let wing = self.wing_aerodynamics(catalog, client)?;
        let fuselage = self.fuselage_geometry();
        let fuselage_drag_n = self.fuselage_drag_n();
        let total_drag_n = wing.drag_n + fuselage_drag_n;
        let thrust_per_engine_n = total_drag_n / self.engines.len().max(1) as f64;

        let voltage_per_cell = self.battery.cell().voltage_v;
        let positions = self.engine_positions();
        let engines: Vec<EngineReport> = self
            .engines
            .iter()
            .zip(self.operating_points(catalog, thrust_per_engine_n))
            .zip(positions)
            .enumerate()
            .map(|(index, ((engine, operating_point), position))| EngineReport {
                index,
                motor_name: engine.motor(catalog).name.clone(),
                propeller_id: engine.propeller().spec().id().to_string(),
                position,
                state: engine.state(),
                operating_point,
                cells_required: engine.battery_cells_required(catalog, voltage_per_cell),
            })
            .collect();

        let total_current_a = engines.iter().map(|e| e.operating_point.current_a()).sum();
        let endurance_time_h = endurance_time_h(self.battery.capacity_ah(), total_current_a);
        let is_valid = engines.iter().all(|e| e.operating_point.is_valid());

        Ok(DesignEvaluation {
            total_mass_kg: mass.total_kg(),
            mass,
            center_of_gravity,
            wing,
            fuselage,
            fuselage_drag_n,
            total_drag_n,
            thrust_per_engine_n,
            engines,
            battery: self.battery_summary(),
            total_current_a,
            endurance_time_h,
            endurance_range_km: self.requirement.velocity_kmh * endurance_time_h,
            cells_required: self.cells_required(catalog),
            engines_outside_span: self.engines_outside_span(),
            is_valid,
        })
    }
}
