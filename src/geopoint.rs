// src/geopoint.rs

use serde::{Deserialize, Serialize};

use crate::error::OutOfRangeError;
use crate::types::DistanceUnit;

/// Scale of the `double(16, 10)` coordinate columns.
pub const COORDINATE_SCALE: u32 = 10;

/// A resolved geographical point.
///
/// An entity that has not been geocoded yet carries `Option<GeoPoint>::None`, so
/// latitude and longitude are always present together.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new `GeoPoint` without range checks, the way geocoder output is taken.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    /// Creates a new `GeoPoint`, rejecting latitude outside [-90, 90] or longitude
    /// outside [-180, 180]. NaN is rejected as well.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, OutOfRangeError> {
        let point = GeoPoint::new(latitude, longitude);
        if point.is_in_range() {
            Ok(point)
        } else {
            Err(OutOfRangeError {
                latitude,
                longitude,
            })
        }
    }

    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Rounds both coordinates to `scale` decimal places, as a `DECIMAL(_, scale)` column stores them.
    pub fn round_to_scale(&self, scale: u32) -> Self {
        let factor = 10f64.powi(scale.min(i32::MAX as u32) as i32);
        if !factor.is_finite() {
            return *self;
        }
        GeoPoint {
            latitude: (self.latitude * factor).round() / factor,
            longitude: (self.longitude * factor).round() / factor,
        }
    }

    /// Great-circle distance to `other`, computed with the same arc-minute formula
    /// the generated SQL uses.
    pub fn distance_to(&self, other: &GeoPoint, unit: DistanceUnit) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlng = (self.longitude - other.longitude).to_radians();

        // Rounding can push identical points just above 1.0.
        let cos_angle =
            (lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlng.cos()).clamp(-1.0, 1.0);

        cos_angle.acos().to_degrees() * 60.0 * unit.factor()
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        GeoPoint::new(latitude, longitude)
    }
}
