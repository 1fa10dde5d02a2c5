use std::fs;

use drone_designer::config::load_design;
use drone_designer::export::report::{DesignReport, Metadata, write_json};
use drone_designer::export::sweep::{HEADER, Record, write_all};
use drone_designer::run::run_design;
use drone_designer::sizing::SweepPoint;

fn point(velocity_kmh: f64, available: Option<f64>, valid: bool) -> SweepPoint {
    SweepPoint {
        velocity_kmh,
        drag_n: 12.5,
        thrust_per_engine_n: 3.125,
        available_thrust_n: available,
        rpm: 6120.0,
        torque_nm: 0.0425,
        voltage_v: 9.87,
        current_a: 4.321,
        no_load_speed_rev_s: 140.0,
        stall_torque_nm: f64::INFINITY,
        max_torque_nm: 0.1592,
        valid,
    }
}

#[test]
fn sweep_rows_follow_the_header() {
    let mut out = Vec::new();
    let points = [point(80.0, Some(9.5), true), point(150.0, None, false)];
    write_all(&mut out, "baseline", &points).expect("write sweep");
    let text = String::from_utf8(out).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], HEADER);
    let columns = HEADER.split(',').count();
    let first: Vec<&str> = lines[1].split(',').collect();
    let second: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(first.len(), columns);
    assert_eq!(second.len(), columns);
    assert_eq!(first[0], "baseline");
    assert_eq!(first[1], "80.000");
    assert_eq!(first[4], "9.5000");
    assert_eq!(first[12], "true");
    assert_eq!(second[4], "");
    assert_eq!(second[12], "false");
}

#[test]
fn single_record_matches_header_order() {
    let mut out = Vec::new();
    let p = point(100.0, Some(4.0), true);
    Record {
        design: "quad",
        point: &p,
    }
    .write_to(&mut out)
    .expect("write record");
    let line = String::from_utf8(out).expect("utf8");
    assert_eq!(
        line.trim_end(),
        "quad,100.000,12.5000,3.1250,4.0000,6120.0,0.042500,9.8700,4.3210,140.000,inf,0.159200,true"
    );
}

#[test]
fn json_report_carries_metadata_and_evaluation() {
    let config = load_design("configs/designs/baseline.toml").expect("baseline");
    let run = run_design(&config, &[]).expect("run");
    assert!(run.sweep.is_empty());

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("baseline.json");
    let meta = Metadata {
        design: &config.name,
        generated_utc: "2026-01-01T00:00:00Z",
        motor_catalog: "configs/motors.csv",
        propeller_dir: "configs/propellers",
    };
    let document = DesignReport::new(&meta, &run.design.requirement, &run.report);
    write_json(&path, &document).expect("write json");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read json")).expect("parse json");
    assert_eq!(value["design"], "baseline");
    assert_eq!(value["status"], "converged");
    assert_eq!(value["valid"], true);
    assert_eq!(value["requirement"]["propeller_id"], "10x3");
    assert_eq!(value["passes"], run.report.passes);
    assert_eq!(
        value["trace"].as_array().map(Vec::len),
        Some(run.report.trace.len())
    );
    let engines = value["evaluation"]["engines"].as_array().expect("engines");
    assert_eq!(engines.len(), 4);
    assert!(value["evaluation"]["total_mass_kg"].as_f64().expect("mass") > 2.0);
    assert!(value["warnings"].as_array().expect("warnings").is_empty());
}
