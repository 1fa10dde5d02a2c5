//! Export helpers for CSV and JSON artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod sweep {
    use std::io::{self, Write};

    use drone_sizing::SweepPoint;

    pub const HEADER: &str = "design,velocity_kmh,drag_n,thrust_per_engine_n,available_thrust_n,rpm,torque_nm,voltage_v,current_a,no_load_speed_rev_s,stall_torque_nm,max_torque_nm,valid";

    /// Write the standard sweep CSV header.
    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// CSV row emitted by the sweep exporter.
    #[derive(Debug, Clone)]
    pub struct Record<'a> {
        pub design: &'a str,
        pub point: &'a SweepPoint,
    }

    impl<'a> Record<'a> {
        /// Serialize the record to CSV, matching the standard header ordering.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            let p = self.point;
            let available = p
                .available_thrust_n
                .map(|t| format!("{t:.4}"))
                .unwrap_or_default();
            writeln!(
                writer,
                "{},{:.3},{:.4},{:.4},{},{:.1},{:.6},{:.4},{:.4},{:.3},{:.6},{:.6},{}",
                self.design,
                p.velocity_kmh,
                p.drag_n,
                p.thrust_per_engine_n,
                available,
                p.rpm,
                p.torque_nm,
                p.voltage_v,
                p.current_a,
                p.no_load_speed_rev_s,
                p.stall_torque_nm,
                p.max_torque_nm,
                if p.valid { "true" } else { "false" },
            )
        }
    }

    /// Header plus one row per point.
    pub fn write_all(writer: &mut dyn Write, design: &str, points: &[SweepPoint]) -> io::Result<()> {
        write_header(writer)?;
        for point in points {
            Record { design, point }.write_to(writer)?;
        }
        writer.flush()
    }
}

pub mod report {
    use std::io::{self, Write};
    use std::path::Path;

    use drone_sizing::{FlightRequirement, SizingReport};
    use serde::Serialize;
    use serde_json::to_writer_pretty;

    /// Metadata describing the sizing run.
    #[derive(Debug)]
    pub struct Metadata<'a> {
        pub design: &'a str,
        pub generated_utc: &'a str,
        pub motor_catalog: &'a str,
        pub propeller_dir: &'a str,
    }

    /// JSON document written for one sized design.
    #[derive(Debug, Serialize)]
    pub struct DesignReport<'a> {
        pub design: &'a str,
        pub generated_utc: &'a str,
        pub motor_catalog: &'a str,
        pub propeller_dir: &'a str,
        pub requirement: &'a FlightRequirement,
        pub valid: bool,
        /// Rendered diagnostics, in the order the run produced them.
        pub warnings: Vec<String>,
        #[serde(flatten)]
        pub report: &'a SizingReport,
    }

    impl<'a> DesignReport<'a> {
        pub fn new(
            meta: &Metadata<'a>,
            requirement: &'a FlightRequirement,
            report: &'a SizingReport,
        ) -> Self {
            Self {
                design: meta.design,
                generated_utc: meta.generated_utc,
                motor_catalog: meta.motor_catalog,
                propeller_dir: meta.propeller_dir,
                requirement,
                valid: report.is_valid(),
                warnings: report.diagnostics.iter().map(|d| d.to_string()).collect(),
                report,
            }
        }
    }

    /// Pretty-printed JSON to any writer.
    pub fn write_to(writer: &mut dyn Write, report: &DesignReport<'_>) -> io::Result<()> {
        to_writer_pretty(&mut *writer, report).map_err(io::Error::other)?;
        writeln!(writer)?;
        writer.flush()
    }

    /// Pretty-printed JSON to `path` (`-` for stdout).
    pub fn write_json(path: &Path, report: &DesignReport<'_>) -> io::Result<()> {
        let mut writer = super::writer_for_path(path)?;
        write_to(writer.as_mut(), report)
    }
}
