//! Geographic coordinates and great-circle distance.
//!
//! Every distance in this workspace is expressed in kilometres. Metres only
//! appear inside SQL where PostGIS requires them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors produced when validating coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude must be between -90 and 90 (got {0})")]
    LatitudeOutOfRange(f64),
    #[error("longitude must be between -180 and 180 (got {0})")]
    LongitudeOutOfRange(f64),
    #[error("coordinates must be finite numbers")]
    NotFinite,
}

/// A validated WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate and build a point.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] if either component is NaN/infinite or out
    /// of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(self, other)
    }
}

/// Haversine great-circle distance in kilometres.
#[must_use]
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// The legacy projected position some store rows still carry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyPosition {
    pub x: f64,
    pub y: f64,
}

/// Reference point for the default recommendation set (Seoul City Hall).
pub const DEFAULT_REFERENCE_POINT: (f64, f64) = (37.566_5, 126.978_0);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(
            Coordinates::new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            Coordinates::new(0.0, -180.5),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
        assert_eq!(
            Coordinates::new(f64::NAN, 0.0),
            Err(CoordinateError::NotFinite)
        );
    }

    #[test]
    fn test_accepts_boundaries() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = point(37.5, 127.0);
        assert!(p.distance_km(&p).abs() < 1e-9);
    }

    #[test]
    fn test_seoul_to_busan() {
        // City Hall to Busan Station is a little under 330 km as the crow flies.
        let seoul = point(37.5665, 126.9780);
        let busan = point(35.1151, 129.0415);
        let d = haversine_km(&seoul, &busan);
        assert!((315.0..340.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_one_degree_latitude() {
        let d = haversine_km(&point(37.0, 127.0), &point(38.0, 127.0));
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = point(37.49, 127.02);
        let b = point(37.55, 126.92);
        assert!((haversine_km(&a, &b) - haversine_km(&b, &a)).abs() < 1e-12);
    }
}
