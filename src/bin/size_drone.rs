use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use drone_designer::export::report::{DesignReport, Metadata, write_json};
use drone_designer::export::{sweep, writer_for_path};
use drone_designer::run::{DataOverrides, DesignRun, run_design, select_designs, sweep_velocities};
use drone_designer::sizing::{EnduranceMode, SizingStatus};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Size a drone from a design manifest (battery, motors, wing)"
)]
struct Cli {
    /// Manifest: TOML file, YAML list or directory of TOML files
    #[arg(long, default_value = "configs/designs/baseline.toml")]
    config: PathBuf,

    /// Only run the design with this name (case-insensitive)
    #[arg(long)]
    design: Option<String>,

    /// Motor catalog CSV (defaults to the manifest's)
    #[arg(long)]
    motors: Option<PathBuf>,

    /// Directory of propeller tables (defaults to the manifest's)
    #[arg(long)]
    propellers: Option<PathBuf>,

    /// Override the manifest's pass limit
    #[arg(long)]
    max_passes: Option<usize>,

    /// Write a JSON report per design ("-" for stdout)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write a velocity-sweep CSV of the sized designs ("-" for stdout)
    #[arg(long)]
    sweep: Option<PathBuf>,

    #[arg(long, default_value_t = 40.0)]
    sweep_min_kmh: f64,

    #[arg(long, default_value_t = 140.0)]
    sweep_max_kmh: f64,

    #[arg(long, default_value_t = 10.0)]
    sweep_step_kmh: f64,

    /// Fail unless every design converges to a valid fixed point
    #[arg(long)]
    strict: bool,

    /// Skip the per-pass trace
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let overrides = DataOverrides {
        motor_catalog: cli.motors.clone(),
        propeller_dir: cli.propellers.clone(),
        max_passes: cli.max_passes,
    };
    let configs = select_designs(&cli.config, cli.design.as_deref(), &overrides)?;
    let velocities = if cli.sweep.is_some() {
        sweep_velocities(cli.sweep_min_kmh, cli.sweep_max_kmh, cli.sweep_step_kmh)?
    } else {
        Vec::new()
    };

    let generated_utc = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let multiple = configs.len() > 1;
    let mut runs = Vec::with_capacity(configs.len());
    for config in &configs {
        let run = run_design(config, &velocities)?;
        print_run(&run, cli.quiet);
        if let Some(path) = &cli.report {
            let path = per_design_path(path, &run.config.name, multiple);
            let motor_catalog = run.config.data.motor_catalog.display().to_string();
            let propeller_dir = run.config.data.propeller_dir.display().to_string();
            let meta = Metadata {
                design: &run.config.name,
                generated_utc: &generated_utc,
                motor_catalog: &motor_catalog,
                propeller_dir: &propeller_dir,
            };
            let document = DesignReport::new(&meta, &run.design.requirement, &run.report);
            write_json(&path, &document)?;
            if path != Path::new("-") {
                println!("report written to {}", path.display());
            }
        }
        runs.push(run);
    }

    if let Some(path) = &cli.sweep {
        let mut writer = writer_for_path(path)?;
        sweep::write_header(writer.as_mut())?;
        for run in &runs {
            for point in &run.sweep {
                sweep::Record {
                    design: &run.config.name,
                    point,
                }
                .write_to(writer.as_mut())?;
            }
        }
        writer.flush()?;
    }

    if cli.strict {
        let failed: Vec<&str> = runs
            .iter()
            .filter(|run| run.report.status != SizingStatus::Converged)
            .map(|run| run.config.name.as_str())
            .collect();
        if !failed.is_empty() {
            return Err(anyhow::anyhow!(
                "designs without a valid fixed point: {}",
                failed.join(", ")
            ));
        }
    }
    Ok(())
}

fn per_design_path(path: &Path, name: &str, multiple: bool) -> PathBuf {
    if !multiple || path == Path::new("-") {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("json");
    path.with_file_name(format!("{stem}_{name}.{ext}"))
}

fn print_run(run: &DesignRun, quiet: bool) {
    let report = &run.report;
    let eval = &report.evaluation;
    let requirement = &run.design.requirement;

    println!("=== Design '{}' ===", run.config.name);
    if !quiet {
        for record in &report.trace {
            println!(
                "pass {:>3}: mass {:.3} kg, wing {:.3} m², {:.0} Ah, {}S, motors {:?}",
                record.pass,
                record.total_mass_kg,
                record.wing_area_m2,
                record.capacity_ah,
                record.cells_in_series,
                record.motor_indices
            );
            for change in &record.changes {
                println!("          {change}");
            }
            if !record.pending_engines.is_empty() {
                println!("          damped: engines {:?}", record.pending_engines);
            }
        }
    }

    println!("Status: {} after {} passes", report.status, report.passes);
    println!(
        "Mass: {:.3} kg (battery {:.3}, payload {:.3}, motors {:.3}, wing {:.3}, fuselage {:.3})",
        eval.total_mass_kg,
        eval.mass.battery_kg,
        eval.mass.payload_kg,
        eval.mass.motors_kg,
        eval.mass.wing_kg,
        eval.mass.fuselage_kg
    );
    println!(
        "CoG: x = {:.3} m, y = {:.3} m, z = {:.3} m",
        eval.center_of_gravity[0], eval.center_of_gravity[1], eval.center_of_gravity[2]
    );
    println!(
        "Battery: {}S{}P ({} cells), {:.1} Ah, {:.1} V, {:.3} kg, {:.3} m long",
        eval.battery.cells_in_series,
        eval.battery.parallel_groups,
        eval.battery.num_cells,
        eval.battery.capacity_ah,
        eval.battery.voltage_v,
        eval.battery.mass_kg,
        eval.battery.length_m
    );
    let geometry = &eval.wing.geometry;
    println!(
        "Wing: S = {:.3} m², b = {:.3} m, c_root = {:.3} m, c_tip = {:.3} m, CL = {:.3}, CD = {:.4}, alpha = {:.2} deg",
        geometry.area_m2,
        geometry.span_m,
        geometry.root_chord_m,
        geometry.tip_chord_m,
        eval.wing.coefficients.cl,
        eval.wing.coefficients.cd,
        eval.wing.coefficients.alpha_deg
    );
    println!(
        "Drag: {:.3} N total ({:.3} N per engine)",
        eval.total_drag_n, eval.thrust_per_engine_n
    );
    for engine in &eval.engines {
        let op = &engine.operating_point;
        println!(
            "Engine {} [{} + {}]: {:.0} rpm, {:.4} N·m, {:.2} N, {:.2} V, {:.2} A{}",
            engine.index,
            engine.motor_name,
            engine.propeller_id,
            op.rpm(),
            op.torque_nm(),
            op.thrust_n(),
            op.voltage_v(),
            op.current_a(),
            if op.is_valid() { "" } else { " (out of range)" }
        );
    }
    match requirement.mode {
        EnduranceMode::Time => println!(
            "Endurance: {:.3} h required {:.3} h ({:.1} km)",
            eval.endurance_time_h, requirement.endurance, eval.endurance_range_km
        ),
        EnduranceMode::Range => println!(
            "Range: {:.1} km required {:.1} km ({:.3} h)",
            eval.endurance_range_km, requirement.endurance, eval.endurance_time_h
        ),
    }
    println!("Valid: {}", eval.is_valid);
    for diagnostic in &report.diagnostics {
        eprintln!("warning: {diagnostic}");
    }
}
