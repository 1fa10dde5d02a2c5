//! Manifest-to-report glue shared by the binaries and the integration tests.

use std::path::{Path, PathBuf};

use drone_config::{ConfigError, DesignConfig, load_designs};
use drone_sizing::facade::setup;
use drone_sizing::{AircraftDesign, SizingError, SizingLoop, SizingReport, SweepPoint};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sizing(#[from] SizingError),
    #[error("design '{0}' not found in manifest")]
    NotFound(String),
    #[error("invalid sweep range {min}..{max} step {step} km/h")]
    SweepRange { min: f64, max: f64, step: f64 },
}

/// Command-line replacements for the manifest's data section.
#[derive(Debug, Clone, Default)]
pub struct DataOverrides {
    pub motor_catalog: Option<PathBuf>,
    pub propeller_dir: Option<PathBuf>,
    pub max_passes: Option<usize>,
}

impl DataOverrides {
    pub fn apply(&self, config: &mut DesignConfig) {
        if let Some(path) = &self.motor_catalog {
            config.data.motor_catalog = path.clone();
        }
        if let Some(dir) = &self.propeller_dir {
            config.data.propeller_dir = dir.clone();
        }
        if let Some(passes) = self.max_passes {
            config.sizing.max_passes = passes;
        }
    }
}

/// A design that has been through the sizing loop.
#[derive(Debug)]
pub struct DesignRun {
    pub config: DesignConfig,
    pub design: AircraftDesign,
    pub report: SizingReport,
    pub sweep: Vec<SweepPoint>,
}

/// Load the manifest at `path`, keep the design called `name` (case-insensitive) if given.
pub fn select_designs(
    path: &Path,
    name: Option<&str>,
    overrides: &DataOverrides,
) -> Result<Vec<DesignConfig>, RunError> {
    let mut configs = load_designs(path)?;
    if let Some(name) = name {
        configs.retain(|cfg| cfg.name.eq_ignore_ascii_case(name));
        if configs.is_empty() {
            return Err(RunError::NotFound(name.to_string()));
        }
    }
    for config in &mut configs {
        overrides.apply(config);
    }
    Ok(configs)
}

/// Evenly spaced velocities from `min` to `max` inclusive.
pub fn sweep_velocities(min: f64, max: f64, step: f64) -> Result<Vec<f64>, RunError> {
    if !(min > 0.0 && max >= min && step > 0.0 && min.is_finite() && max.is_finite()) {
        return Err(RunError::SweepRange { min, max, step });
    }
    let count = ((max - min) / step + 1e-9).floor() as usize + 1;
    Ok((0..count).map(|i| min + i as f64 * step).collect())
}

/// Size one design and optionally sweep the result over `sweep_kmh`.
pub fn run_design(config: &DesignConfig, sweep_kmh: &[f64]) -> Result<DesignRun, RunError> {
    let catalog = setup::load_catalog(config)?;
    let mut design = setup::design_from_config(config, &catalog)?;
    let mut sizing = SizingLoop::new(
        &catalog,
        setup::solver_from_config(config),
        setup::options_from_config(config),
    )?;
    let report = sizing.run(&mut design)?;
    let sweep = if sweep_kmh.is_empty() {
        Vec::new()
    } else {
        sizing.sweep(&design, sweep_kmh)?
    };
    sizing.close()?;
    Ok(DesignRun {
        config: config.clone(),
        design,
        report,
        sweep,
    })
}
