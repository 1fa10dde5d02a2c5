use drone_designer::propulsion::{
    PerformanceTable, PropellerError, PropellerMap, PropellerSample, PropellerSpec,
};

fn sample(rpm: f64, velocity_m_s: f64, thrust_n: f64) -> PropellerSample {
    PropellerSample {
        velocity_m_s,
        rpm,
        torque_nm: thrust_n * 0.01,
        thrust_n,
    }
}

/// Two rpm columns by three velocity rows; v_max = 10, T_max = 8.
fn small_table() -> PerformanceTable {
    PerformanceTable::from_samples(vec![
        sample(1000.0, 0.0, 2.0),
        sample(1000.0, 5.0, 1.0),
        sample(1000.0, 10.0, 0.5),
        sample(2000.0, 0.0, 8.0),
        sample(2000.0, 5.0, 6.0),
        sample(2000.0, 10.0, 4.0),
    ])
    .expect("small table")
}

#[test]
fn identifier_resolves_diameter_and_pitch() {
    let spec = PropellerSpec::parse("10x3").expect("10x3");
    assert!((spec.diameter_m() - 0.254).abs() < 1e-12);
    assert_eq!(spec.pitch_in(), 3.0);

    let spec = PropellerSpec::parse("9X4.5").expect("9X4.5");
    assert_eq!(spec.diameter_in(), 9.0);
    assert_eq!(spec.pitch_in(), 4.5);

    for bad in ["10", "ax3", "0x3", "10x-1", ""] {
        assert!(
            matches!(PropellerSpec::parse(bad), Err(PropellerError::InvalidIdentifier(_))),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn lookup_ties_resolve_to_first_cell_in_row_major_order() {
    let table = small_table();
    // (5, 1) and (5, 6) are both 2.5 N away; the 1000 rpm column comes first in row 1.
    let op = table.lookup(5.0, 3.5);
    assert_eq!(op.sample.rpm, 1000.0);
    assert_eq!(op.sample.thrust_n, 1.0);
    assert!(op.valid);
    assert!((op.thrust_error_n() + 2.5).abs() < 1e-12);
}

#[test]
fn lookup_picks_the_closest_cell() {
    let table = small_table();
    let op = table.lookup(9.0, 4.2);
    assert_eq!(op.sample.rpm, 2000.0);
    assert_eq!(op.sample.velocity_m_s, 10.0);
    assert!(op.valid);
}

#[test]
fn lookup_outside_the_envelope_is_invalid() {
    let table = small_table();
    assert!(!table.lookup(10.5, 1.0).valid, "velocity above table maximum");
    assert!(!table.lookup(5.0, 8.5).valid, "thrust above table maximum");
}

#[test]
fn lookup_rejects_cells_beyond_the_thrust_tolerance() {
    let table = PerformanceTable::from_samples(vec![
        sample(1000.0, 0.0, 0.0),
        sample(1000.0, 10.0, 0.0),
        sample(2000.0, 0.0, 10.0),
        sample(2000.0, 10.0, 10.0),
    ])
    .expect("table");
    let op = table.lookup(0.0, 5.0);
    assert_eq!(op.sample.rpm, 1000.0);
    assert!(!op.valid, "5 N gap exceeds the 3 N tolerance");
}

#[test]
fn blocks_are_sorted_by_rpm() {
    let table = PerformanceTable::from_samples(vec![
        sample(3000.0, 0.0, 9.0),
        sample(3000.0, 5.0, 7.0),
        sample(1000.0, 0.0, 2.0),
        sample(1000.0, 5.0, 1.0),
    ])
    .expect("table");
    assert_eq!(table.rpm_columns(), &[1000.0, 3000.0]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.max_thrust_n(), 9.0);
    assert_eq!(table.max_velocity_m_s(), 5.0);
    let first_row: Vec<f64> = table.samples().take(2).map(|s| s.rpm).collect();
    assert_eq!(first_row, vec![1000.0, 3000.0]);
}

#[test]
fn malformed_tables_fail_fast() {
    let ragged = PerformanceTable::from_samples(vec![
        sample(1000.0, 0.0, 2.0),
        sample(1000.0, 5.0, 1.0),
        sample(2000.0, 0.0, 8.0),
    ]);
    assert!(matches!(ragged, Err(PropellerError::Ragged { .. })));

    let repeated = PerformanceTable::from_samples(vec![
        sample(1000.0, 0.0, 2.0),
        sample(2000.0, 0.0, 8.0),
        sample(1000.0, 5.0, 1.0),
    ]);
    assert!(matches!(repeated, Err(PropellerError::Malformed { line: 3, .. })));

    assert!(matches!(
        PerformanceTable::from_samples(Vec::new()),
        Err(PropellerError::Empty)
    ));

    let nan = PerformanceTable::from_samples(vec![sample(1000.0, f64::NAN, 1.0)]);
    assert!(matches!(nan, Err(PropellerError::Malformed { .. })));
}

#[test]
fn csv_tables_ignore_extra_columns_and_report_bad_lines() {
    let csv = "rpm,velocity_m_s,advance_ratio,torque_nm,thrust_n,power_w\n\
               1000,0,0,0.01,1.0,1.0\n\
               1000,5,0.1,0.01,0.8,1.0\n\
               2000,0,0,0.04,4.0,8.0\n\
               2000,5,0.05,0.04,3.5,8.0\n";
    let table = PerformanceTable::from_reader(csv.as_bytes()).expect("csv table");
    assert_eq!(table.rpm_columns(), &[1000.0, 2000.0]);
    assert_eq!(table.row_count(), 2);

    let bad_rpm = "rpm,velocity_m_s,torque_nm,thrust_n\n1000,0,0.01,1.0\n0,5,0.01,0.8\n";
    match PerformanceTable::from_reader(bad_rpm.as_bytes()) {
        Err(PropellerError::Malformed { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected malformed line 3, got {other:?}"),
    }

    let not_a_number = "rpm,velocity_m_s,torque_nm,thrust_n\n1000,fast,0.01,1.0\n";
    assert!(matches!(
        PerformanceTable::from_reader(not_a_number.as_bytes()),
        Err(PropellerError::Csv(_))
    ));
}

#[test]
fn available_thrust_interpolates_each_column() {
    let table = small_table();
    let at_five = table.available_thrust(5.0).expect("inside envelope");
    assert!((at_five - 6.0).abs() < 1e-12);
    let at_mid = table.available_thrust(2.5).expect("inside envelope");
    assert!((at_mid - 7.0).abs() < 1e-12);
    assert!(table.available_thrust(11.0).is_none());
}

#[test]
fn bundled_tables_load_by_identifier() {
    let map = PropellerMap::load("configs/propellers", "10x3").expect("10x3 table");
    assert_eq!(map.spec().id(), "10x3");
    assert!(map.table().row_count() > 10);
    assert!(map.table().max_velocity_m_s() > 100.0 / 3.6);

    let wider = PropellerMap::load("configs/propellers", "12x6").expect("12x6 table");
    assert!(wider.spec().diameter_m() > map.spec().diameter_m());
}

#[test]
fn missing_table_is_a_lookup_failure() {
    match PropellerMap::load("configs/propellers", "7x4") {
        Err(PropellerError::NotFound { id, path }) => {
            assert_eq!(id, "7x4");
            assert!(path.ends_with("7x4.csv"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}
