use drone_designer::config::{DesignConfig, EnduranceModeConfig, load_design};
use drone_designer::propulsion::{MotorCatalog, PropellerError};
use drone_designer::run::run_design;
use drone_designer::sizing::facade::setup;
use drone_designer::sizing::{
    AircraftDesign, Diagnostic, FuselageGeometry, PayloadSpec, SizingError, SizingLoop,
    SizingReport, SizingStatus, engine_span_m, engine_stations,
};

fn baseline() -> DesignConfig {
    load_design("configs/designs/baseline.toml").expect("baseline manifest")
}

fn bundled_catalog() -> MotorCatalog {
    MotorCatalog::from_path("configs/motors.csv").expect("motor catalog")
}

fn size(config: &DesignConfig, catalog: &MotorCatalog) -> (AircraftDesign, SizingReport) {
    let mut design = setup::design_from_config(config, catalog).expect("design");
    let mut sizing = SizingLoop::new(
        catalog,
        setup::solver_from_config(config),
        setup::options_from_config(config),
    )
    .expect("sizing loop");
    let report = sizing.run(&mut design).expect("run");
    (design, report)
}

fn assert_monotonic(report: &SizingReport) {
    for pair in report.trace.windows(2) {
        assert!(pair[1].capacity_ah >= pair[0].capacity_ah);
        assert!(pair[1].cells_in_series >= pair[0].cells_in_series);
    }
}

#[test]
fn time_requirement_is_met_within_one_cell() {
    let config = baseline();
    let catalog = bundled_catalog();
    let (design, report) = size(&config, &catalog);

    assert_eq!(report.status, SizingStatus::Converged, "{:?}", report.diagnostics);
    assert!(report.is_valid());
    assert!(report.passes < 20);
    let eval = &report.evaluation;
    assert!(eval.endurance_time_h >= 1.0 - 1e-6, "endurance {}", eval.endurance_time_h);
    let one_cell_h = design.battery.cell().capacity_ah / eval.total_current_a;
    assert!(eval.endurance_time_h <= 1.0 + one_cell_h + 1e-6);
    assert_monotonic(&report);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    // Recomputed bottom-up.
    assert!((eval.total_mass_kg - design.total_mass_kg(&catalog)).abs() < 1e-12);
    assert!((eval.mass.total_kg() - eval.total_mass_kg).abs() < 1e-12);
    assert!(eval.center_of_gravity[1].abs() < 1e-9);
    assert!(eval.center_of_gravity[0].is_finite());
    assert!((eval.wing.lift_n - eval.total_mass_kg * 9.80665).abs() < 1e-6);
    assert_eq!(eval.engines.len(), 4);
    for engine in &eval.engines {
        assert!(engine.operating_point.is_valid());
        assert!((engine.operating_point.thrust_n() - eval.thrust_per_engine_n).abs() <= 3.0);
    }
}

#[test]
fn range_requirement_is_met_within_one_cell() {
    let mut config = baseline();
    config.mission.endurance = 150.0;
    config.mission.endurance_mode = EnduranceModeConfig::Range;
    let catalog = bundled_catalog();
    let (design, report) = size(&config, &catalog);

    assert_eq!(report.status, SizingStatus::Converged, "{:?}", report.diagnostics);
    let eval = &report.evaluation;
    assert!(eval.endurance_range_km >= 150.0 - 1e-6, "range {}", eval.endurance_range_km);
    let one_cell_km = 100.0 * design.battery.cell().capacity_ah / eval.total_current_a;
    assert!(eval.endurance_range_km <= 150.0 + one_cell_km + 1e-6);
    assert_monotonic(&report);
}

#[test]
fn two_candidate_catalog_is_enough() {
    let bundled = bundled_catalog();
    let catalog = MotorCatalog::new(
        bundled
            .iter()
            .filter(|m| m.kv == 1000.0 || m.kv == 1800.0)
            .cloned()
            .collect(),
    )
    .expect("two motors");
    let (_, report) = size(&baseline(), &catalog);
    assert_eq!(report.status, SizingStatus::Converged, "{:?}", report.diagnostics);
    assert!(report.is_valid());
}

#[test]
fn starting_at_the_top_of_the_catalog_also_converges() {
    let mut config = baseline();
    config.sizing.initial_motor_index = 7;
    let (_, report) = size(&config, &bundled_catalog());
    assert!(report.converged());
    assert!(report.is_valid(), "{:?}", report.diagnostics);
}

#[test]
fn infeasible_catalog_terminates_with_diagnostics() {
    let bundled = bundled_catalog();
    let weak = MotorCatalog::new(
        bundled
            .iter()
            .cloned()
            .map(|mut m| {
                m.max_current_a = 2.0;
                m
            })
            .collect(),
    )
    .expect("weak catalog");
    let config = baseline();
    let (_, report) = size(&config, &weak);

    assert!(!report.is_valid());
    assert_ne!(report.status, SizingStatus::Converged);
    assert!(report.passes <= config.sizing.max_passes);
    assert!(report.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::CurrentExceeded { .. } | Diagnostic::VoltageExceeded { .. }
    )));
    let rendered: Vec<String> = report.diagnostics.iter().map(|d| d.to_string()).collect();
    assert!(rendered.iter().any(|line| line.contains("10x3")));
}

#[test]
fn damped_search_still_reaches_a_fixed_point() {
    let bundled = bundled_catalog();
    let tight = MotorCatalog::new(
        bundled
            .iter()
            .cloned()
            .map(|mut m| {
                m.max_current_a = 5.0;
                m
            })
            .collect(),
    )
    .expect("tight catalog");
    let (_, report) = size(&baseline(), &tight);
    assert!(report.converged(), "{:?}", report.diagnostics);
    assert_monotonic(&report);
    let last = report.trace.last().expect("at least one pass");
    assert!(last.is_fixed_point());
}

#[test]
fn one_more_pass_at_a_fixed_point_changes_nothing() {
    let config = baseline();
    let catalog = bundled_catalog();
    let mut design = setup::design_from_config(&config, &catalog).expect("design");
    let mut sizing = SizingLoop::new(
        &catalog,
        setup::solver_from_config(&config),
        setup::options_from_config(&config),
    )
    .expect("sizing loop");
    let report = sizing.run(&mut design).expect("run");
    assert!(report.converged());

    let record = sizing.step(&mut design, report.passes + 1).expect("extra pass");
    assert!(record.is_fixed_point(), "{:?}", record.changes);
    let again = sizing.evaluate(&design).expect("evaluate");
    assert_eq!(again.total_mass_kg, report.evaluation.total_mass_kg);
    assert_eq!(again.endurance_time_h, report.evaluation.endurance_time_h);
    assert_eq!(again.is_valid, report.evaluation.is_valid);
    sizing.close().expect("close");
}

#[test]
fn pass_limit_reports_non_convergence() {
    let mut config = baseline();
    config.sizing.max_passes = 1;
    let (_, report) = size(&config, &bundled_catalog());
    assert_eq!(report.status, SizingStatus::NotConverged);
    assert_eq!(report.passes, 1);
    assert!(!report.converged());
    assert!(report
        .diagnostics
        .contains(&Diagnostic::NonConvergence { passes: 1 }));
}

#[test]
fn unknown_propeller_aborts_the_run() {
    let mut config = baseline();
    config.mission.propeller = "7x4".to_string();
    let err = setup::design_from_config(&config, &bundled_catalog()).expect_err("missing table");
    assert!(matches!(
        err,
        SizingError::Propeller(PropellerError::NotFound { .. })
    ));
}

#[test]
fn degenerate_requirements_are_rejected() {
    let catalog = bundled_catalog();
    let mut config = baseline();
    config.mission.num_engines = 0;
    assert!(matches!(
        setup::design_from_config(&config, &catalog),
        Err(SizingError::InvalidRequirement(_))
    ));

    let mut config = baseline();
    config.mission.velocity_kmh = -5.0;
    assert!(matches!(
        setup::design_from_config(&config, &catalog),
        Err(SizingError::InvalidRequirement(_))
    ));
}

#[test]
fn sweep_reuses_the_sized_design() {
    let config = baseline();
    let run = run_design(&config, &[60.0, 80.0, 100.0]).expect("run");
    assert_eq!(run.sweep.len(), 3);
    let cruise = &run.sweep[2];
    assert!((cruise.thrust_per_engine_n - run.report.evaluation.thrust_per_engine_n).abs() < 1e-9);
    assert!(run.sweep.iter().all(|p| p.drag_n > 0.0));
    assert!(run.sweep.iter().all(|p| p.available_thrust_n.is_some()));
    assert_eq!(cruise.valid, run.report.is_valid());

    // A valid point sits under both the voltage line and the current limit of its motor.
    for p in run.sweep.iter().filter(|p| p.valid) {
        let speed = p.rpm / 60.0;
        assert!(speed < p.no_load_speed_rev_s);
        let line = p.stall_torque_nm * (1.0 - speed / p.no_load_speed_rev_s);
        assert!(p.torque_nm <= line + 1e-9, "{p:?}");
        assert!(p.torque_nm <= p.max_torque_nm + 1e-12, "{p:?}");
    }
}

#[test]
fn engine_stations_are_symmetric() {
    let d = 0.254;
    assert_eq!(engine_stations(1, d, 0.2), vec![0.0]);

    let three = engine_stations(3, d, 0.2);
    assert_eq!(three.len(), 3);
    assert_eq!(three[1], 0.0);
    assert!((three[2] - (0.2 + 0.75 * d)).abs() < 1e-12);
    assert_eq!(three[0], -three[2]);

    let four = engine_stations(4, d, 0.1);
    assert!((four[2] - (0.1 + 0.75 * d)).abs() < 1e-12);
    assert!((four[3] - four[2] - 1.5 * d).abs() < 1e-12);
    assert_eq!(four[0], -four[3]);

    // A slim fuselage never packs engines closer than the propeller spacing allows.
    let five = engine_stations(5, d, 0.01);
    assert!((five[3] - 1.5 * d).abs() < 1e-12);
}

#[test]
fn fuselage_wraps_payload_and_battery() {
    let payload = PayloadSpec {
        width_m: 0.2,
        length_m: 0.5,
        height_m: 0.2,
        mass_kg: 2.0,
    };
    let fuselage = FuselageGeometry::around(&payload, 0.1);
    assert!((fuselage.radius_m - 0.2).abs() < 1e-12);
    assert!((fuselage.nose_length_m - 0.7).abs() < 1e-12);
    assert!((fuselage.mid_length_m - 1.8).abs() < 1e-12);
    assert!((fuselage.tail_length_m - 1.5).abs() < 1e-12);
    assert!((fuselage.nose_tip_x_m() - 0.75).abs() < 1e-12);
    assert!((fuselage.center_of_gravity()[0] - (0.75 - 2.0)).abs() < 1e-12);
    assert!(fuselage.wetted_area_m2() > 2.0 * std::f64::consts::PI * 0.2 * 1.8);
    assert!((payload.center_of_gravity(0.1)[0] + 0.3).abs() < 1e-12);
}

#[test]
fn wing_span_covers_every_engine() {
    let config = baseline();
    let catalog = bundled_catalog();
    let (design, report) = size(&config, &catalog);

    let semi_span = report.evaluation.wing.geometry.semi_span_m();
    let diameter = design.engines[0].propeller().spec().diameter_m();
    for position in design.engine_positions() {
        assert!(position[1].abs() + 0.5 * diameter <= semi_span + 1e-9, "{position:?}");
    }
    assert_eq!(report.evaluation.engines_outside_span, 0);
    assert!(!report
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::EnginesOutsideSpan { .. })));
    // The wing keeps the area the weight asks for; only its aspect ratio grows.
    assert!((report.evaluation.wing.geometry.area_m2 - design.wing_area_m2).abs() < 1e-12);
}

#[test]
fn narrow_envelope_leaves_outer_engines_off_the_wing() {
    let mut config = baseline();
    config.envelope.max_width_m = 1.0;
    let (_, report) = size(&config, &bundled_catalog());

    assert!((report.evaluation.wing.geometry.span_m - 1.0).abs() < 1e-12);
    assert_eq!(report.evaluation.engines_outside_span, 2);
    assert!(report.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::EnginesOutsideSpan { count: 2, semi_span_m } if (semi_span_m - 0.5).abs() < 1e-12
    )));
}

#[test]
fn engine_span_reaches_the_outer_disc_edge() {
    let d = 0.254;
    assert!((engine_span_m(1, d, 0.2) - d).abs() < 1e-12);
    let outer = 0.2 + 0.75 * d + 1.5 * d;
    assert!((engine_span_m(4, d, 0.2) - 2.0 * (outer + 0.5 * d)).abs() < 1e-12);
    let payload = PayloadSpec {
        width_m: 0.2,
        length_m: 0.5,
        height_m: 0.2,
        mass_kg: 2.0,
    };
    assert!((payload.fuselage_radius_m() - 0.2).abs() < 1e-12);
}

#[test]
fn converged_wing_sits_within_the_area_tolerance() {
    let config = baseline();
    let catalog = bundled_catalog();
    let (design, report) = size(&config, &catalog);
    assert!(report.converged());

    let wing = &design.airframe.wing;
    let velocity = design.requirement.velocity_kmh / 3.6;
    let required = wing.required_area_m2(
        design.weight_n(&catalog),
        design.airframe.air_density_kg_m3,
        velocity,
    );
    assert!((required - design.wing_area_m2).abs() < wing.area_tolerance_m2);
    // Level flight: cl / design_cl == required / area.
    let cl = report.evaluation.wing.coefficients.cl;
    let bound = wing.design_cl * wing.area_tolerance_m2 / design.wing_area_m2;
    assert!((cl - wing.design_cl).abs() < bound + 1e-9, "cl {cl}");
}

#[test]
fn zero_capacity_cell_is_rejected_before_sizing() {
    let catalog = bundled_catalog();
    let mut config = baseline();
    config.battery.cell_capacity_ah = 0.0;
    assert!(matches!(
        setup::design_from_config(&config, &catalog),
        Err(SizingError::InvalidParameter { field: "battery.cell_capacity_ah", .. })
    ));
    assert!(run_design(&config, &[]).is_err());
}

#[test]
fn nonphysical_airframe_parameters_are_rejected() {
    let catalog = bundled_catalog();
    let rejected = |config: &DesignConfig| -> &'static str {
        match setup::design_from_config(config, &catalog) {
            Err(SizingError::InvalidParameter { field, .. }) => field,
            other => panic!("expected a parameter error, got {other:?}"),
        }
    };

    let mut config = baseline();
    config.battery.packing_factor = 1.5;
    assert_eq!(rejected(&config), "battery.packing_factor");

    let mut config = baseline();
    config.battery.cell_voltage_v = f64::NAN;
    assert_eq!(rejected(&config), "battery.cell_voltage_v");

    let mut config = baseline();
    config.payload.height_m = 0.0;
    assert_eq!(rejected(&config), "payload.height_m");

    let mut config = baseline();
    config.wing.aspect_ratio = -8.0;
    assert_eq!(rejected(&config), "wing.aspect_ratio");

    let mut config = baseline();
    config.wing.design_cl = 0.0;
    assert_eq!(rejected(&config), "wing.design_cl");

    let mut config = baseline();
    config.fuselage.drag_coefficient = -0.1;
    assert_eq!(rejected(&config), "fuselage.drag_coefficient");

    let mut config = baseline();
    config.envelope.air_density_kg_m3 = 0.0;
    assert_eq!(rejected(&config), "envelope.air_density_kg_m3");
}
