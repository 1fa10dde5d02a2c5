//! Payload box, fuselage shell and engine stations.

use std::f64::consts::PI;

use drone_core::vector::Vector3;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadSpec {
    pub width_m: f64,
    pub length_m: f64,
    pub height_m: f64,
    pub mass_kg: f64,
}

impl PayloadSpec {
    /// The battery shares this cross-section.
    pub fn cross_section_m2(&self) -> f64 {
        self.width_m * self.height_m
    }

    /// Radius of the round fuselage enclosing the payload box cross-section.
    pub fn fuselage_radius_m(&self) -> f64 {
        (0.5 * self.height_m.powi(2) + 0.5 * self.width_m.powi(2)).sqrt()
    }

    /// Directly aft of a battery centred on the origin.
    pub fn center_of_gravity(&self, battery_length_m: f64) -> Vector3 {
        [-(0.5 * battery_length_m + 0.5 * self.length_m), 0.0, 0.0]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuselageSpec {
    /// Referenced to the frontal area.
    pub drag_coefficient: f64,
    pub areal_mass_kg_m2: f64,
}

/// Cone-cylinder-cone shell wrapped around the payload and battery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuselageGeometry {
    pub radius_m: f64,
    pub nose_length_m: f64,
    pub mid_length_m: f64,
    pub tail_length_m: f64,
    pub battery_length_m: f64,
}

fn cone_surface(radius: f64, length: f64) -> f64 {
    PI * radius * (radius * radius + length * length).sqrt()
}

impl FuselageGeometry {
    pub fn around(payload: &PayloadSpec, battery_length_m: f64) -> Self {
        let radius_m = payload.fuselage_radius_m();
        Self {
            radius_m,
            nose_length_m: 3.5 * radius_m,
            mid_length_m: 3.0 * (payload.length_m + battery_length_m),
            tail_length_m: 7.5 * radius_m,
            battery_length_m,
        }
    }

    pub fn length_m(&self) -> f64 {
        self.nose_length_m + self.mid_length_m + self.tail_length_m
    }

    pub fn wetted_area_m2(&self) -> f64 {
        cone_surface(self.radius_m, self.nose_length_m)
            + 2.0 * PI * self.radius_m * self.mid_length_m
            + cone_surface(self.radius_m, self.tail_length_m)
    }

    pub fn frontal_area_m2(&self) -> f64 {
        PI * self.radius_m * self.radius_m
    }

    pub fn mass_kg(&self, spec: &FuselageSpec) -> f64 {
        self.wetted_area_m2() * spec.areal_mass_kg_m2
    }

    pub fn drag_n(&self, spec: &FuselageSpec, dynamic_pressure: f64) -> f64 {
        dynamic_pressure * spec.drag_coefficient * self.frontal_area_m2()
    }

    pub fn nose_tip_x_m(&self) -> f64 {
        self.nose_length_m + 0.5 * self.battery_length_m
    }

    pub fn center_of_gravity(&self) -> Vector3 {
        [self.nose_tip_x_m() - 0.5 * self.length_m(), 0.0, 0.0]
    }
}

/// Lateral stations (m) of `count` engines of diameter `diameter_m`, ascending.
///
/// Stations are 1.5 D apart. With an odd count the middle engine sits on the centreline.
pub fn engine_stations(count: usize, diameter_m: f64, fuselage_radius_m: f64) -> Vec<f64> {
    let spacing = 1.5 * diameter_m;
    let (first, centre) = if count % 2 == 1 {
        ((fuselage_radius_m + 0.75 * diameter_m).max(spacing), true)
    } else {
        ((fuselage_radius_m + 0.75 * diameter_m).max(0.75 * diameter_m), false)
    };
    let pairs = count / 2;
    let mut stations = Vec::with_capacity(count);
    stations.extend((0..pairs).rev().map(|k| -(first + k as f64 * spacing)));
    if centre {
        stations.push(0.0);
    }
    stations.extend((0..pairs).map(|k| first + k as f64 * spacing));
    stations
}

/// Span that keeps every propeller disc of [`engine_stations`] inside the wing tips.
pub fn engine_span_m(count: usize, diameter_m: f64, fuselage_radius_m: f64) -> f64 {
    let outermost = engine_stations(count, diameter_m, fuselage_radius_m)
        .into_iter()
        .map(f64::abs)
        .fold(0.0, f64::max);
    2.0 * (outermost + 0.5 * diameter_m)
}
