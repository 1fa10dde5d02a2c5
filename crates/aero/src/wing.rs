//! Trapezoidal wing planform and the flight condition it is evaluated at.

use drone_core::constants::AIR_DYNAMIC_VISCOSITY;
use drone_core::units::dynamic_pressure;
use serde::Serialize;

/// Shape parameters that stay fixed while the wing area is iterated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WingPlanform {
    pub aspect_ratio: f64,
    pub taper_ratio: f64,
    /// Leading-edge sweep (deg).
    pub sweep_deg: f64,
    pub twist_deg: f64,
    pub incidence_deg: f64,
    pub thickness_ratio: f64,
    /// Span the wing-mounted engines need (m); the span never drops below it.
    pub min_span_m: f64,
    /// Span limit (m). Wins over `min_span_m`.
    pub max_span_m: f64,
}

/// Concrete planform for one wing area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WingGeometry {
    pub area_m2: f64,
    pub span_m: f64,
    pub root_chord_m: f64,
    pub tip_chord_m: f64,
    pub sweep_deg: f64,
    pub twist_deg: f64,
    pub incidence_deg: f64,
    pub thickness_ratio: f64,
}

impl WingGeometry {
    /// Lay out `area_m2` with the planform's aspect ratio.
    ///
    /// The span is widened to the engine span when needed, then clipped to the span limit;
    /// either way the area is kept and the effective aspect ratio moves instead.
    pub fn from_area(area_m2: f64, planform: &WingPlanform) -> Self {
        let span_m = (planform.aspect_ratio * area_m2)
            .sqrt()
            .max(planform.min_span_m)
            .min(planform.max_span_m);
        let taper = planform.taper_ratio;
        let root_chord_m = 2.0 * area_m2 / (span_m * (1.0 + taper));
        Self {
            area_m2,
            span_m,
            root_chord_m,
            tip_chord_m: taper * root_chord_m,
            sweep_deg: planform.sweep_deg,
            twist_deg: planform.twist_deg,
            incidence_deg: planform.incidence_deg,
            thickness_ratio: planform.thickness_ratio,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.span_m * self.span_m / self.area_m2
    }

    pub fn taper_ratio(&self) -> f64 {
        self.tip_chord_m / self.root_chord_m
    }

    pub fn semi_span_m(&self) -> f64 {
        0.5 * self.span_m
    }

    /// Mean aerodynamic chord.
    pub fn mac_m(&self) -> f64 {
        let taper = self.taper_ratio();
        2.0 / 3.0 * self.root_chord_m * (1.0 + taper + taper * taper) / (1.0 + taper)
    }

    /// Spanwise station of the mean aerodynamic chord.
    pub fn mac_station_m(&self) -> f64 {
        let taper = self.taper_ratio();
        self.span_m / 6.0 * (1.0 + 2.0 * taper) / (1.0 + taper)
    }

    /// Distance the MAC leading edge sits behind the root leading edge.
    pub fn mac_leading_edge_offset_m(&self) -> f64 {
        self.mac_station_m() * self.sweep_deg.to_radians().tan()
    }

    /// Leading-edge x of the wing at lateral station `y` (root leading edge at x = 0).
    pub fn leading_edge_x_m(&self, y_m: f64) -> f64 {
        -y_m.abs() * self.sweep_deg.to_radians().tan()
    }

    /// Structural centroid, taken at 40 % of the MAC.
    pub fn centroid_x_m(&self) -> f64 {
        -(self.mac_leading_edge_offset_m() + 0.4 * self.mac_m())
    }
}

/// Airspeed, density and Reynolds number of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlightCondition {
    pub velocity_m_s: f64,
    pub air_density_kg_m3: f64,
    pub reynolds: f64,
}

impl FlightCondition {
    /// Condition with the Reynolds number based on `reference_length_m`.
    pub fn new(velocity_m_s: f64, air_density_kg_m3: f64, reference_length_m: f64) -> Self {
        Self {
            velocity_m_s,
            air_density_kg_m3,
            reynolds: air_density_kg_m3 * velocity_m_s * reference_length_m / AIR_DYNAMIC_VISCOSITY,
        }
    }

    pub fn dynamic_pressure(&self) -> f64 {
        dynamic_pressure(self.air_density_kg_m3, self.velocity_m_s)
    }
}
