//! Tabulated propeller performance maps and operating-point lookup.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use drone_core::units::inch_to_m;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted gap between requested and realized thrust at the selected grid cell (N).
pub const THRUST_TOLERANCE_N: f64 = 3.0;

/// Errors raised while resolving or loading a propeller performance table.
#[derive(Debug, Error)]
pub enum PropellerError {
    #[error("propeller identifier '{0}' is not of the form DxP (inches)")]
    InvalidIdentifier(String),
    #[error("no performance table for propeller '{id}' (expected {})", .path.display())]
    NotFound { id: String, path: PathBuf },
    #[error("failed to read performance table: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse performance table: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed performance table at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("rpm block {rpm} has {len} samples, expected {expected}")]
    Ragged { rpm: f64, len: usize, expected: usize },
    #[error("performance table contains no samples")]
    Empty,
}

/// Diameter and pitch decoded from a `DxP` identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct PropellerSpec {
    id: String,
    diameter_in: f64,
    pitch_in: f64,
}

impl PropellerSpec {
    /// Parse an identifier such as `10x3` or `9x4.5` (inches).
    pub fn parse(id: &str) -> Result<Self, PropellerError> {
        let invalid = || PropellerError::InvalidIdentifier(id.to_string());
        let (diameter, pitch) = id
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let diameter_in: f64 = diameter.trim().parse().map_err(|_| invalid())?;
        let pitch_in: f64 = pitch.trim().parse().map_err(|_| invalid())?;
        if !(diameter_in.is_finite() && diameter_in > 0.0 && pitch_in.is_finite() && pitch_in > 0.0)
        {
            return Err(invalid());
        }
        Ok(Self {
            id: id.trim().to_string(),
            diameter_in,
            pitch_in,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn diameter_m(&self) -> f64 {
        inch_to_m(self.diameter_in)
    }

    pub fn diameter_in(&self) -> f64 {
        self.diameter_in
    }

    pub fn pitch_in(&self) -> f64 {
        self.pitch_in
    }
}

/// One grid cell of a performance table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropellerSample {
    pub velocity_m_s: f64,
    pub rpm: f64,
    pub torque_nm: f64,
    pub thrust_n: f64,
}

#[derive(Debug, Deserialize)]
struct SampleRecord {
    rpm: f64,
    velocity_m_s: f64,
    torque_nm: f64,
    thrust_n: f64,
}

impl SampleRecord {
    fn validate(self, line: usize) -> Result<PropellerSample, PropellerError> {
        let malformed = |reason: &str| PropellerError::Malformed {
            line,
            reason: reason.to_string(),
        };
        if ![self.rpm, self.velocity_m_s, self.torque_nm, self.thrust_n]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(malformed("non-finite value"));
        }
        if self.rpm <= 0.0 {
            return Err(malformed("rpm must be positive"));
        }
        if self.velocity_m_s < 0.0 {
            return Err(malformed("velocity must not be negative"));
        }
        Ok(PropellerSample {
            velocity_m_s: self.velocity_m_s,
            rpm: self.rpm,
            torque_nm: self.torque_nm,
            thrust_n: self.thrust_n,
        })
    }
}

/// Result of matching a requested (velocity, thrust) against the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropellerOperatingPoint {
    pub sample: PropellerSample,
    pub requested_velocity_m_s: f64,
    pub requested_thrust_n: f64,
    pub valid: bool,
}

impl PropellerOperatingPoint {
    /// Realized minus requested thrust (N).
    pub fn thrust_error_n(&self) -> f64 {
        self.sample.thrust_n - self.requested_thrust_n
    }
}

/// Velocity-row by rpm-column grid of propeller samples.
///
/// Row `i` holds the `i`-th sample of every rpm block; columns are ordered by ascending rpm.
/// Iteration order is row-major, which is also the tie-break order of [`lookup`](Self::lookup).
#[derive(Debug, Clone)]
pub struct PerformanceTable {
    rpm: Vec<f64>,
    rows: Vec<Vec<PropellerSample>>,
    max_velocity_m_s: f64,
    max_thrust_n: f64,
}

impl PerformanceTable {
    /// Load a table from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PropellerError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse a CSV table with `rpm, velocity_m_s, torque_nm, thrust_n` columns.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, PropellerError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let mut samples = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record
                .position()
                .map(|pos| pos.line() as usize)
                .unwrap_or_default();
            let row: SampleRecord = record.deserialize(Some(&headers))?;
            samples.push((line, row.validate(line)?));
        }
        Self::from_blocks(samples)
    }

    /// Build a table from samples listed block by block (consecutive equal rpm).
    pub fn from_samples(samples: Vec<PropellerSample>) -> Result<Self, PropellerError> {
        let numbered = samples
            .into_iter()
            .enumerate()
            .map(|(idx, sample)| {
                let record = SampleRecord {
                    rpm: sample.rpm,
                    velocity_m_s: sample.velocity_m_s,
                    torque_nm: sample.torque_nm,
                    thrust_n: sample.thrust_n,
                };
                record.validate(idx + 1).map(|s| (idx + 1, s))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_blocks(numbered)
    }

    fn from_blocks(samples: Vec<(usize, PropellerSample)>) -> Result<Self, PropellerError> {
        let mut blocks: Vec<(f64, Vec<PropellerSample>)> = Vec::new();
        for (line, sample) in samples {
            match blocks.last_mut() {
                Some((rpm, block)) if *rpm == sample.rpm => block.push(sample),
                _ => {
                    if blocks.iter().any(|(rpm, _)| *rpm == sample.rpm) {
                        return Err(PropellerError::Malformed {
                            line,
                            reason: format!("rpm block {} appears more than once", sample.rpm),
                        });
                    }
                    blocks.push((sample.rpm, vec![sample]));
                }
            }
        }
        if blocks.is_empty() {
            return Err(PropellerError::Empty);
        }
        blocks.sort_by(|a, b| a.0.total_cmp(&b.0));

        let expected = blocks[0].1.len();
        if let Some((rpm, block)) = blocks.iter().find(|(_, block)| block.len() != expected) {
            return Err(PropellerError::Ragged {
                rpm: *rpm,
                len: block.len(),
                expected,
            });
        }

        let rows: Vec<Vec<PropellerSample>> = (0..expected)
            .map(|i| blocks.iter().map(|(_, block)| block[i]).collect())
            .collect();
        let rpm = blocks.iter().map(|(rpm, _)| *rpm).collect();
        let samples = rows.iter().flatten();
        let max_velocity_m_s = samples
            .clone()
            .map(|s| s.velocity_m_s)
            .fold(f64::NEG_INFINITY, f64::max);
        let max_thrust_n = samples.map(|s| s.thrust_n).fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            rpm,
            rows,
            max_velocity_m_s,
            max_thrust_n,
        })
    }

    /// Rpm value of every column, ascending.
    pub fn rpm_columns(&self) -> &[f64] {
        &self.rpm
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn max_velocity_m_s(&self) -> f64 {
        self.max_velocity_m_s
    }

    pub fn max_thrust_n(&self) -> f64 {
        self.max_thrust_n
    }

    /// All samples in row-major order.
    pub fn samples(&self) -> impl Iterator<Item = &PropellerSample> + '_ {
        self.rows.iter().flatten()
    }

    /// Samples of one rpm column, in velocity-row order.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &PropellerSample> + '_ {
        self.rows.iter().filter_map(move |row| row.get(col))
    }

    /// Select the grid cell closest to the requested (velocity, thrust).
    ///
    /// The distance is `|Δv|/v_max + |ΔT|/T_max`; the first minimum in row-major order wins.
    pub fn lookup(&self, velocity_m_s: f64, thrust_n: f64) -> PropellerOperatingPoint {
        let v_scale = positive_or_one(self.max_velocity_m_s);
        let t_scale = positive_or_one(self.max_thrust_n);

        let mut best = self.rows[0][0];
        let mut best_error = f64::INFINITY;
        for sample in self.samples() {
            let error = (sample.velocity_m_s - velocity_m_s).abs() / v_scale
                + (sample.thrust_n - thrust_n).abs() / t_scale;
            if error < best_error {
                best_error = error;
                best = *sample;
            }
        }

        let valid = velocity_m_s <= self.max_velocity_m_s
            && thrust_n <= self.max_thrust_n
            && (best.thrust_n - thrust_n).abs() <= THRUST_TOLERANCE_N;

        PropellerOperatingPoint {
            sample: best,
            requested_velocity_m_s: velocity_m_s,
            requested_thrust_n: thrust_n,
            valid,
        }
    }

    /// Highest thrust any rpm column delivers at `velocity_m_s`, interpolating inside each block.
    pub fn available_thrust(&self, velocity_m_s: f64) -> Option<f64> {
        let mut best: Option<f64> = None;
        for col in 0..self.rpm.len() {
            let column: Vec<&PropellerSample> = self.column(col).collect();
            for pair in column.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let (lo, hi) = if a.velocity_m_s <= b.velocity_m_s {
                    (a, b)
                } else {
                    (b, a)
                };
                if velocity_m_s < lo.velocity_m_s || velocity_m_s > hi.velocity_m_s {
                    continue;
                }
                let span = hi.velocity_m_s - lo.velocity_m_s;
                let thrust = if span > 0.0 {
                    let t = (velocity_m_s - lo.velocity_m_s) / span;
                    lo.thrust_n + t * (hi.thrust_n - lo.thrust_n)
                } else {
                    lo.thrust_n.max(hi.thrust_n)
                };
                if best.map_or(true, |current| thrust > current) {
                    best = Some(thrust);
                }
            }
        }
        best
    }
}

fn positive_or_one(value: f64) -> f64 {
    if value > 0.0 { value } else { 1.0 }
}

/// A propeller identifier bound to its loaded performance table.
#[derive(Debug, Clone)]
pub struct PropellerMap {
    spec: PropellerSpec,
    table: Arc<PerformanceTable>,
}

impl PropellerMap {
    pub fn new(spec: PropellerSpec, table: Arc<PerformanceTable>) -> Self {
        Self { spec, table }
    }

    /// Resolve `id` to `<dir>/<id>.csv` and load it.
    pub fn load<P: AsRef<Path>>(dir: P, id: &str) -> Result<Self, PropellerError> {
        let spec = PropellerSpec::parse(id)?;
        let path = dir.as_ref().join(format!("{}.csv", spec.id()));
        if !path.is_file() {
            return Err(PropellerError::NotFound {
                id: spec.id().to_string(),
                path,
            });
        }
        let table = PerformanceTable::from_path(&path)?;
        Ok(Self::new(spec, Arc::new(table)))
    }

    pub fn spec(&self) -> &PropellerSpec {
        &self.spec
    }

    pub fn table(&self) -> &PerformanceTable {
        &self.table
    }

    pub fn lookup(&self, velocity_m_s: f64, thrust_n: f64) -> PropellerOperatingPoint {
        self.table.lookup(velocity_m_s, thrust_n)
    }
}
