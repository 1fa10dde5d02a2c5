//! Aerodynamic solver seam.
//!
//! The sizing loop only ever talks to an [`AeroClient`]: a solver that has to be opened before
//! use and closed afterwards, with a one-entry cache that the loop invalidates at the start of
//! each pass.

use std::f64::consts::PI;

use serde::Serialize;
use thiserror::Error;

use crate::wing::{FlightCondition, WingGeometry};

/// Lift, drag and trim angle for one wing at one condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AeroCoefficients {
    pub cl: f64,
    pub cd: f64,
    pub alpha_deg: f64,
}

#[derive(Debug, Error)]
pub enum AeroError {
    #[error("aerodynamic solver '{0}' used before it was opened")]
    NotOpen(String),
    #[error("invalid aerodynamic input: {0}")]
    InvalidInput(String),
    #[error("aerodynamic solver '{name}' failed: {reason}")]
    Solver { name: String, reason: String },
}

/// Anything that can turn a wing, a condition and a target lift coefficient into coefficients.
pub trait AeroSolver {
    fn name(&self) -> &str;

    /// Acquire whatever the solver needs. Called once by [`AeroClient::open`].
    fn open(&mut self) -> Result<(), AeroError> {
        Ok(())
    }

    fn solve(
        &mut self,
        geometry: &WingGeometry,
        condition: &FlightCondition,
        target_cl: f64,
    ) -> Result<AeroCoefficients, AeroError>;

    fn close(&mut self) -> Result<(), AeroError> {
        Ok(())
    }
}

/// Closed-form finite-wing polar: flat-plate skin friction with a thickness form factor,
/// empirical Oswald efficiency and a Helmbold lift slope.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarSolver {
    /// Section zero-lift angle (deg).
    pub zero_lift_alpha_deg: f64,
}

impl Default for PolarSolver {
    fn default() -> Self {
        Self {
            zero_lift_alpha_deg: -2.0,
        }
    }
}

/// Wetted area over reference area for a thin wing.
const WETTED_AREA_RATIO: f64 = 2.04;

impl PolarSolver {
    pub fn new(zero_lift_alpha_deg: f64) -> Self {
        Self {
            zero_lift_alpha_deg,
        }
    }

    /// Turbulent flat-plate friction coefficient.
    pub fn skin_friction(reynolds: f64) -> f64 {
        0.074 / reynolds.powf(0.2)
    }

    pub fn form_factor(thickness_ratio: f64) -> f64 {
        1.0 + 2.0 * thickness_ratio + 60.0 * thickness_ratio.powi(4)
    }

    pub fn oswald_efficiency(aspect_ratio: f64) -> f64 {
        (1.78 * (1.0 - 0.045 * aspect_ratio.powf(0.68)) - 0.64).clamp(0.3, 1.0)
    }

    /// Finite-wing lift slope (per rad).
    pub fn lift_slope(aspect_ratio: f64) -> f64 {
        2.0 * PI * aspect_ratio / (2.0 + (aspect_ratio * aspect_ratio + 4.0).sqrt())
    }

    pub fn zero_lift_drag(geometry: &WingGeometry, condition: &FlightCondition) -> f64 {
        Self::skin_friction(condition.reynolds)
            * Self::form_factor(geometry.thickness_ratio)
            * WETTED_AREA_RATIO
    }
}

fn check(name: &str, value: f64) -> Result<(), AeroError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AeroError::InvalidInput(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

impl AeroSolver for PolarSolver {
    fn name(&self) -> &str {
        "polar"
    }

    fn solve(
        &mut self,
        geometry: &WingGeometry,
        condition: &FlightCondition,
        target_cl: f64,
    ) -> Result<AeroCoefficients, AeroError> {
        check("wing area", geometry.area_m2)?;
        check("wing span", geometry.span_m)?;
        check("airspeed", condition.velocity_m_s)?;
        check("air density", condition.air_density_kg_m3)?;
        check("Reynolds number", condition.reynolds)?;
        if !target_cl.is_finite() {
            return Err(AeroError::InvalidInput(format!(
                "target lift coefficient must be finite, got {target_cl}"
            )));
        }

        let aspect_ratio = geometry.aspect_ratio();
        let efficiency = Self::oswald_efficiency(aspect_ratio);
        let cd0 = Self::zero_lift_drag(geometry, condition);
        let cd = cd0 + target_cl * target_cl / (PI * efficiency * aspect_ratio);
        let alpha_deg = self.zero_lift_alpha_deg
            + (target_cl / Self::lift_slope(aspect_ratio)).to_degrees()
            - geometry.incidence_deg;

        Ok(AeroCoefficients {
            cl: target_cl,
            cd,
            alpha_deg,
        })
    }
}

#[derive(Debug, Clone)]
struct CachedSolve {
    geometry: WingGeometry,
    condition: FlightCondition,
    target_cl: f64,
    result: AeroCoefficients,
}

/// Owns an opened solver. Dropping the client closes it.
#[derive(Debug)]
pub struct AeroClient<S: AeroSolver> {
    solver: S,
    open: bool,
    cache: Option<CachedSolve>,
    solver_calls: usize,
}

impl<S: AeroSolver> AeroClient<S> {
    /// Wrap a solver; it stays closed until [`AeroClient::open`].
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            open: false,
            cache: None,
            solver_calls: 0,
        }
    }

    /// Open the solver. Opening an open client is a no-op.
    pub fn open(&mut self) -> Result<(), AeroError> {
        if !self.open {
            self.solver.open()?;
            self.open = true;
        }
        Ok(())
    }

    /// Close the solver and drop the cache. Closing a closed client is a no-op.
    pub fn close(&mut self) -> Result<(), AeroError> {
        if self.open {
            self.open = false;
            self.cache = None;
            self.solver.close()?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Forget the cached solve; the next request reaches the solver.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Number of requests that actually reached the solver.
    pub fn solver_calls(&self) -> usize {
        self.solver_calls
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solve(
        &mut self,
        geometry: &WingGeometry,
        condition: &FlightCondition,
        target_cl: f64,
    ) -> Result<AeroCoefficients, AeroError> {
        if !self.open {
            return Err(AeroError::NotOpen(self.solver.name().to_string()));
        }
        if let Some(cached) = &self.cache {
            if cached.geometry == *geometry
                && cached.condition == *condition
                && cached.target_cl == target_cl
            {
                return Ok(cached.result);
            }
        }
        let result = self.solver.solve(geometry, condition, target_cl)?;
        self.solver_calls += 1;
        self.cache = Some(CachedSolve {
            geometry: geometry.clone(),
            condition: *condition,
            target_cl,
            result,
        });
        Ok(result)
    }
}

impl<S: AeroSolver> Drop for AeroClient<S> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
