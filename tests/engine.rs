use std::sync::Arc;

use drone_designer::propulsion::{
    Direction, DirectionHistory, EngineUnit, MotorCandidate, MotorCatalog, PerformanceTable,
    PropellerMap, PropellerSample, PropellerSpec, SearchState,
};

/// Every lookup lands on the single cell: 100 rev/s at 0.05 N·m.
fn single_point_propeller() -> PropellerMap {
    let table = PerformanceTable::from_samples(vec![PropellerSample {
        velocity_m_s: 10.0,
        rpm: 6000.0,
        torque_nm: 0.05,
        thrust_n: 5.0,
    }])
    .expect("table");
    PropellerMap::new(PropellerSpec::parse("10x3").expect("spec"), Arc::new(table))
}

fn motor(kv: f64, resistance_ohm: f64, max_current_a: f64) -> MotorCandidate {
    MotorCandidate {
        name: format!("M{kv}"),
        kv,
        resistance_ohm,
        length_m: 0.04,
        diameter_m: 0.028,
        max_current_a,
        max_voltage_v: 50.0,
        mass_kg: 0.08,
    }
}

/// At 100 rev/s and 0.05 N·m: kV 500 needs ~12.3 V / 2.6 A, kV 1000 ~6.3 V / 5.2 A,
/// kV 2000 ~3.1 V / 10.5 A.
fn catalog(top_current_limit: f64) -> MotorCatalog {
    MotorCatalog::new(vec![
        motor(500.0, 0.1, 20.0),
        motor(1000.0, 0.06, 20.0),
        motor(2000.0, 0.01, top_current_limit),
    ])
    .expect("catalog")
}

const PACK_V: f64 = 4.0;

#[test]
fn history_keeps_the_last_three_calls() {
    let mut history = DirectionHistory::default();
    assert_eq!(history.most_recent_move(), None);
    history.push(Direction::Up);
    history.push(Direction::Hold);
    assert_eq!(history.slots(), &[Direction::Hold, Direction::Up, Direction::Hold]);
    assert!(!history.permits(Direction::Down));
    assert!(history.permits(Direction::Up));
    history.push(Direction::Down);
    assert_eq!(history.most_recent_move(), Some(Direction::Down));
    history.push(Direction::Hold);
    history.push(Direction::Hold);
    assert_eq!(history.most_recent_move(), Some(Direction::Down));
    history.push(Direction::Hold);
    assert_eq!(history.most_recent_move(), None);
    assert!(history.permits(Direction::Up));
}

#[test]
fn voltage_shortfall_climbs_the_catalog_in_one_call() {
    let catalog = catalog(20.0);
    let mut engine = EngineUnit::new(single_point_propeller(), 0, &catalog);
    let step = engine.iterate(&catalog, 10.0, 5.0, PACK_V);
    assert!(step.changed);
    assert_eq!(step.direction, Direction::Up);
    assert_eq!((step.from_idx, step.to_idx), (0, 2));
    assert_eq!(step.state, SearchState::Feasible);

    let again = engine.iterate(&catalog, 10.0, 5.0, PACK_V);
    assert!(!again.changed);
    assert_eq!(again.direction, Direction::Hold);
    assert_eq!(again.state, SearchState::Feasible);
    assert!(!again.needs_another_pass());
    assert!(engine.operating_point(&catalog, 10.0, 5.0, PACK_V).is_valid());
}

#[test]
fn reversals_are_damped_across_calls() {
    let climb = catalog(20.0);
    // Same motors, but the top one can no longer carry the current.
    let squeezed = catalog(5.0);
    let mut engine = EngineUnit::new(single_point_propeller(), 0, &climb);
    engine.iterate(&climb, 10.0, 5.0, PACK_V);
    assert_eq!(engine.motor_idx(), 2);

    // The Up move is still inside the three-slot window: the Down move is held back.
    for _ in 0..3 {
        let step = engine.iterate(&squeezed, 10.0, 5.0, PACK_V);
        assert!(!step.changed);
        assert_eq!(step.state, SearchState::Searching);
        assert!(step.needs_another_pass());
        assert_eq!(engine.motor_idx(), 2);
    }

    // Window cleared: step down once, then refuse to climb back within the same call.
    let step = engine.iterate(&squeezed, 10.0, 5.0, PACK_V);
    assert!(step.changed);
    assert_eq!(step.direction, Direction::Down);
    assert_eq!((step.from_idx, step.to_idx), (2, 1));
    assert_eq!(step.state, SearchState::Searching);

    // And the next call may not undo that Down move either.
    let step = engine.iterate(&squeezed, 10.0, 5.0, PACK_V);
    assert!(!step.changed);
    assert_eq!(engine.motor_idx(), 1);
    assert_eq!(step.state, SearchState::Searching);
}

#[test]
fn catalog_bounds_leave_the_engine_exhausted() {
    // Neither motor runs on 4 V; the search climbs to the top of the catalog and stops.
    let catalog = MotorCatalog::new(vec![motor(500.0, 0.1, 20.0), motor(1000.0, 0.06, 20.0)])
        .expect("catalog");
    let mut engine = EngineUnit::new(single_point_propeller(), 0, &catalog);
    let step = engine.iterate(&catalog, 10.0, 5.0, PACK_V);
    assert_eq!(step.to_idx, 1);
    assert_eq!(step.state, SearchState::Exhausted);
    let op = engine.operating_point(&catalog, 10.0, 5.0, PACK_V);
    assert!(!op.motor_valid());
    assert!(op.voltage_overage_v() > 2.0);
    assert!(op.current_overage_a() < 0.0);
}

#[test]
fn both_limits_violated_steps_down_only_toward_more_torque() {
    // kV 2000 violates both current (limit 5 A) and voltage at 3 V; the kV 1000 motor has the
    // larger torque capability, so the search steps down to it. There the voltage rule would
    // climb straight back, which the same call refuses.
    let catalog = MotorCatalog::new(vec![motor(1000.0, 0.06, 20.0), motor(2000.0, 0.01, 5.0)])
        .expect("catalog");
    let mut engine = EngineUnit::new(single_point_propeller(), 1, &catalog);
    let step = engine.iterate(&catalog, 10.0, 5.0, 3.0);
    assert_eq!(step.direction, Direction::Down);
    assert_eq!(engine.motor_idx(), 0);
    assert_eq!(step.state, SearchState::Searching);
    assert_eq!(engine.history().most_recent_move(), Some(Direction::Down));
}

#[test]
fn indices_stay_inside_the_catalog() {
    let catalog = catalog(20.0);
    let engine = EngineUnit::new(single_point_propeller(), 99, &catalog);
    assert_eq!(engine.motor_idx(), catalog.last_index());
    assert_eq!(engine.motor(&catalog).kv, 2000.0);
    assert_eq!(engine.battery_cells_required(&catalog, 3.7), Some(1));
}
