//! Geographic coordinate types.
//! All coordinate math uses f64 for precision.
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the sphere in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, -180 to +180.
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Unit vector on the sphere.
    fn to_unit(self) -> (f64, f64, f64) {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        (lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_km(self, other: LatLon) -> f64 {
        let (ax, ay, az) = self.to_unit();
        let (bx, by, bz) = other.to_unit();
        let dot = (ax * bx + ay * by + az * bz).clamp(-1.0, 1.0);
        dot.acos() * EARTH_RADIUS_KM
    }
}

/// A named place, as carried by weather series and alert records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self { name: name.into(), lat, lon }
    }

    pub fn latlon(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn distance_to_self_is_zero() {
        let p = LatLon::new(41.0082, 28.9784);
        assert_abs_diff_eq!(p.distance_km(p), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = LatLon::new(39.0, 32.0);
        let b = LatLon::new(40.0, 32.0);
        let d = a.distance_km(b);
        assert!((d - 111.19).abs() < 0.1, "1° latitude = {d:.2} km, expected ≈111.19");
    }

    #[test]
    fn istanbul_to_ankara_is_about_350_km() {
        let istanbul = LatLon::new(41.0082, 28.9784);
        let ankara = LatLon::new(39.9334, 32.8597);
        let d = istanbul.distance_km(ankara);
        assert!(d > 340.0 && d < 360.0, "Istanbul–Ankara = {d:.1} km");
        assert_abs_diff_eq!(d, ankara.distance_km(istanbul), epsilon = 1e-9);
    }
}
