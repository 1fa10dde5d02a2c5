//! Configuration models and loaders for drone design manifests.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// A complete design manifest: mission requirement plus every tunable of the sizing model.
#[derive(Debug, Deserialize, Clone)]
pub struct DesignConfig {
    pub name: String,
    pub mission: MissionConfig,
    #[serde(default)]
    pub payload: PayloadConfig,
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub wing: WingConfig,
    #[serde(default)]
    pub fuselage: FuselageConfig,
    #[serde(default)]
    pub envelope: EnvelopeConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub data: DataConfig,
}

/// Top-level mission requirement.
#[derive(Debug, Deserialize, Clone)]
pub struct MissionConfig {
    /// Endurance in hours (`T`) or range in kilometres (`R`).
    pub endurance: f64,
    pub endurance_mode: EnduranceModeConfig,
    pub velocity_kmh: f64,
    /// Propeller identifier, `DxP` in inches.
    pub propeller: String,
    pub num_engines: usize,
    #[serde(default)]
    pub structural_material: Option<String>,
}

/// Whether the endurance figure is a flight time or a flight distance.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum EnduranceModeConfig {
    #[serde(rename = "T", alias = "time")]
    Time,
    #[serde(rename = "R", alias = "range")]
    Range,
}

/// Payload box carried inside the fuselage.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PayloadConfig {
    pub width_m: f64,
    pub length_m: f64,
    pub height_m: f64,
    pub mass_kg: f64,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            width_m: 0.2,
            length_m: 0.5,
            height_m: 0.2,
            mass_kg: 2.0,
        }
    }
}

/// Cell data and the starting point of the battery iteration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BatteryConfig {
    pub cell_capacity_ah: f64,
    pub cell_voltage_v: f64,
    pub cell_mass_kg: f64,
    pub cell_volume_m3: f64,
    /// Fraction of the pack volume occupied by cells.
    pub packing_factor: f64,
    pub initial_capacity_ah: f64,
    pub initial_cells: u32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            cell_capacity_ah: 3.0,
            cell_voltage_v: 3.7,
            cell_mass_kg: 0.048,
            cell_volume_m3: 1.654e-5,
            packing_factor: 0.75,
            initial_capacity_ah: 3.0,
            initial_cells: 3,
        }
    }
}

/// Wing planform and aerodynamic assumptions.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WingConfig {
    pub aspect_ratio: f64,
    pub taper_ratio: f64,
    pub sweep_deg: f64,
    pub twist_deg: f64,
    pub incidence_deg: f64,
    pub thickness_ratio: f64,
    pub design_cl: f64,
    pub cl_max: f64,
    #[serde(default)]
    pub stall_speed_kmh: Option<f64>,
    pub zero_lift_alpha_deg: f64,
    pub areal_mass_kg_m2: f64,
    pub initial_area_m2: f64,
    #[serde(default)]
    pub airfoil_root: Option<String>,
    #[serde(default)]
    pub airfoil_tip: Option<String>,
}

impl Default for WingConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 8.0,
            taper_ratio: 0.5,
            sweep_deg: 5.0,
            twist_deg: 2.0,
            incidence_deg: 0.0,
            thickness_ratio: 0.12,
            design_cl: 0.4,
            cl_max: 1.2,
            stall_speed_kmh: None,
            zero_lift_alpha_deg: -2.0,
            areal_mass_kg_m2: 1.0,
            initial_area_m2: 1.0,
            airfoil_root: None,
            airfoil_tip: None,
        }
    }
}

/// Fuselage drag and structure assumptions.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FuselageConfig {
    /// Drag coefficient referenced to the fuselage frontal area.
    pub drag_coefficient: f64,
    pub areal_mass_kg_m2: f64,
}

impl Default for FuselageConfig {
    fn default() -> Self {
        Self {
            drag_coefficient: 0.05,
            areal_mass_kg_m2: 0.25,
        }
    }
}

/// Outer dimensional limits and atmosphere.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Maximum wing span (m).
    pub max_width_m: f64,
    pub max_length_m: f64,
    pub max_height_m: f64,
    pub air_density_kg_m3: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            max_width_m: 3.0,
            max_length_m: 3.0,
            max_height_m: 0.2,
            air_density_kg_m3: 1.225,
        }
    }
}

/// Controls of the fixed-point iteration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SizingConfig {
    pub max_passes: usize,
    pub area_tolerance_m2: f64,
    pub initial_motor_index: usize,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            max_passes: 200,
            area_tolerance_m2: 0.1,
            initial_motor_index: 0,
        }
    }
}

/// Locations of the externally supplied catalogs.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub motor_catalog: PathBuf,
    pub propeller_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            motor_catalog: PathBuf::from("configs/motors.csv"),
            propeller_dir: PathBuf::from("configs/propellers"),
        }
    }
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("no design manifest found at {0}")]
    Empty(PathBuf),
}

/// Load a single design manifest (TOML or YAML, chosen by extension).
pub fn load_design<P: AsRef<Path>>(path: P) -> Result<DesignConfig, ConfigError> {
    let path = path.as_ref();
    if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Load design manifests from a YAML list, a single TOML file or a directory of TOML files.
pub fn load_designs<P: AsRef<Path>>(path: P) -> Result<Vec<DesignConfig>, ConfigError> {
    let path = path.as_ref();
    let designs: Vec<DesignConfig> = load_records(path)?;
    if designs.is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }
    Ok(designs)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}
