//! Core units, constants, and shared primitives for the drone design workspace.

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Standard gravity at Earth's surface (m/s²).
    pub const G0: f64 = 9.80665;
    /// ISA sea-level air density (kg/m³).
    pub const SEA_LEVEL_AIR_DENSITY: f64 = 1.225;
    /// Dynamic viscosity of air at 15 °C (Pa·s).
    pub const AIR_DYNAMIC_VISCOSITY: f64 = 1.81e-5;
    /// Metres per inch.
    pub const METERS_PER_INCH: f64 = 0.0254;
    /// Seconds per minute, used for rpm <-> rev/s.
    pub const SECONDS_PER_MINUTE: f64 = 60.0;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::{G0, METERS_PER_INCH, SECONDS_PER_MINUTE};

    /// Convert kilometres per hour to metres per second.
    #[inline]
    pub fn kmh_to_ms(v: f64) -> f64 {
        v / 3.6
    }

    /// Convert metres per second to kilometres per hour.
    #[inline]
    pub fn ms_to_kmh(v: f64) -> f64 {
        v * 3.6
    }

    /// Convert inches to metres.
    #[inline]
    pub fn inch_to_m(v: f64) -> f64 {
        v * METERS_PER_INCH
    }

    /// Convert revolutions per minute to revolutions per second.
    #[inline]
    pub fn rpm_to_rev_s(rpm: f64) -> f64 {
        rpm / SECONDS_PER_MINUTE
    }

    /// Convert a mass in kilograms to a weight in newtons.
    #[inline]
    pub fn weight_n(mass_kg: f64) -> f64 {
        mass_kg * G0
    }

    /// Dynamic pressure (Pa) for a density and airspeed.
    #[inline]
    pub fn dynamic_pressure(density_kg_m3: f64, velocity_m_s: f64) -> f64 {
        0.5 * density_kg_m3 * velocity_m_s * velocity_m_s
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D position in metres (x forward, y starboard, z down).
    pub type Vector3 = [f64; 3];

    /// The design origin.
    pub const ORIGIN: Vector3 = [0.0, 0.0, 0.0];

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Weighted mean of positions; `None` when the weights sum to zero or less.
    pub fn weighted_mean<'a, I>(items: I) -> Option<Vector3>
    where
        I: IntoIterator<Item = (f64, &'a Vector3)>,
    {
        let mut total = 0.0;
        let mut moment = ORIGIN;
        for (weight, position) in items {
            total += weight;
            moment = add(&moment, &scale(position, weight));
        }
        if total > 0.0 {
            Some(scale(&moment, 1.0 / total))
        } else {
            None
        }
    }
}
