/// Navigation utilities and calculations
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6372.8;

pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

pub fn haversine_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine(lat1, lon1, lat2, lon2) / 1.852
}

/// Great-circle distance between two `(lat, lon)` positions in nautical miles.
pub fn distance_nm(from: (f64, f64), to: (f64, f64)) -> f64 {
    haversine_nm(from.0, from.1, to.0, to.1)
}

pub fn heading_from_to(from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> i32 {
    let dlon = to_lon - from_lon;
    let y = dlon.to_radians().sin() * to_lat.to_radians().cos();
    let x = from_lat.to_radians().cos() * to_lat.to_radians().sin()
        - from_lat.to_radians().sin()
            * to_lat.to_radians().cos()
            * dlon.to_radians().cos();

    let bearing = y.atan2(x).to_degrees();
    normalize_heading(bearing.round() as i32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    #[default]
    Right,
}

/// Normalize heading to 0-359 range
pub fn normalize_heading(heading: i32) -> i32 {
    ((heading % 360) + 360) % 360
}
