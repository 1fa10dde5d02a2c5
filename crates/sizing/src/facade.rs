//! Re-exported APIs for consumers of the sizing crate, plus construction from manifests.

pub use crate::design::{Airframe, AircraftDesign, DesignEvaluation};
pub use crate::iteration::{SizingLoop, SizingOptions};
pub use crate::report::{Diagnostic, SizingReport, SizingStatus};
pub use drone_aero::PolarSolver;
pub use drone_propulsion::MotorCatalog;

pub mod setup {
    use drone_aero::{PolarSolver, WingPlanform, WingSizer};
    use drone_config::{DesignConfig, EnduranceModeConfig, MissionConfig};
    use drone_core::units::kmh_to_ms;
    use drone_propulsion::{BatteryPack, CellSpec, MotorCatalog, PropellerMap};

    use crate::SizingError;
    use crate::design::{Airframe, AircraftDesign};
    use crate::iteration::SizingOptions;
    use crate::layout::{FuselageSpec, PayloadSpec};
    use crate::requirement::{EnduranceMode, FlightRequirement};

    pub fn requirement_from_config(mission: &MissionConfig) -> FlightRequirement {
        FlightRequirement {
            endurance: mission.endurance,
            mode: match mission.endurance_mode {
                EnduranceModeConfig::Time => EnduranceMode::Time,
                EnduranceModeConfig::Range => EnduranceMode::Range,
            },
            velocity_kmh: mission.velocity_kmh,
            num_engines: mission.num_engines,
            propeller_id: mission.propeller.clone(),
            structural_material: mission.structural_material.clone(),
        }
    }

    pub fn airframe_from_config(config: &DesignConfig) -> Airframe {
        let wing = &config.wing;
        Airframe {
            payload: PayloadSpec {
                width_m: config.payload.width_m,
                length_m: config.payload.length_m,
                height_m: config.payload.height_m,
                mass_kg: config.payload.mass_kg,
            },
            packing_factor: config.battery.packing_factor,
            wing: WingSizer {
                planform: WingPlanform {
                    aspect_ratio: wing.aspect_ratio,
                    taper_ratio: wing.taper_ratio,
                    sweep_deg: wing.sweep_deg,
                    twist_deg: wing.twist_deg,
                    incidence_deg: wing.incidence_deg,
                    thickness_ratio: wing.thickness_ratio,
                    min_span_m: 0.0,
                    max_span_m: config.envelope.max_width_m,
                },
                design_cl: wing.design_cl,
                cl_max: wing.cl_max,
                stall_speed_m_s: wing.stall_speed_kmh.map(kmh_to_ms),
                area_tolerance_m2: config.sizing.area_tolerance_m2,
                areal_mass_kg_m2: wing.areal_mass_kg_m2,
            },
            fuselage: FuselageSpec {
                drag_coefficient: config.fuselage.drag_coefficient,
                areal_mass_kg_m2: config.fuselage.areal_mass_kg_m2,
            },
            air_density_kg_m3: config.envelope.air_density_kg_m3,
        }
    }

    pub fn battery_from_config(config: &DesignConfig) -> BatteryPack {
        let battery = &config.battery;
        BatteryPack::new(
            CellSpec {
                capacity_ah: battery.cell_capacity_ah,
                voltage_v: battery.cell_voltage_v,
                mass_kg: battery.cell_mass_kg,
                volume_m3: battery.cell_volume_m3,
            },
            battery.initial_capacity_ah,
            battery.initial_cells,
        )
    }

    pub fn options_from_config(config: &DesignConfig) -> SizingOptions {
        SizingOptions {
            max_passes: config.sizing.max_passes,
        }
    }

    pub fn solver_from_config(config: &DesignConfig) -> PolarSolver {
        PolarSolver::new(config.wing.zero_lift_alpha_deg)
    }

    /// Load the motor catalog named by the manifest.
    pub fn load_catalog(config: &DesignConfig) -> Result<MotorCatalog, SizingError> {
        Ok(MotorCatalog::from_path(&config.data.motor_catalog)?)
    }

    /// Resolve the propeller table and assemble the initial design.
    pub fn design_from_config(
        config: &DesignConfig,
        catalog: &MotorCatalog,
    ) -> Result<AircraftDesign, SizingError> {
        let requirement = requirement_from_config(&config.mission);
        requirement.validate()?;
        let propeller = PropellerMap::load(&config.data.propeller_dir, &requirement.propeller_id)?;
        AircraftDesign::new(
            requirement,
            airframe_from_config(config),
            battery_from_config(config),
            config.wing.initial_area_m2,
            propeller,
            config.sizing.initial_motor_index,
            catalog,
        )
    }
}
