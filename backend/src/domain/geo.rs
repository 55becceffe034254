//! Geographic coordinate value type and great-circle distance.
//!
//! Distances use the haversine formula on a spherical-earth approximation.
//! That is all the proximity ranking needs: the facility set is bounded and
//! ranked linearly, so no spatial index is involved.

use std::fmt;

/// Mean Earth radius in kilometres used by the spherical approximation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Validation errors raised by [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateValidationError {
    /// Latitude or longitude was NaN or infinite.
    NotFinite,
    /// Latitude lies outside [-90, 90] degrees.
    LatitudeOutOfRange,
    /// Longitude lies outside [-180, 180] degrees.
    LongitudeOutOfRange,
}

impl fmt::Display for CoordinateValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFinite => write!(f, "coordinate components must be finite"),
            Self::LatitudeOutOfRange => {
                write!(f, "latitude must lie within [-90, 90] degrees")
            }
            Self::LongitudeOutOfRange => {
                write!(f, "longitude must lie within [-180, 180] degrees")
            }
        }
    }
}

impl std::error::Error for CoordinateValidationError {}

/// Geographic coordinate in decimal degrees.
///
/// ## Invariants
/// - Both components are finite.
/// - Latitude in [-90, 90], longitude in [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    /// Validate and construct a coordinate from decimal degrees.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateValidationError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateValidationError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateValidationError::LatitudeOutOfRange);
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateValidationError::LongitudeOutOfRange);
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Great-circle distance to `other` in kilometres.
    ///
    /// Non-negative, symmetric, and zero only for coincident points.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let half_chord = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos()
                * other.lat.to_radians().cos()
                * (d_lng / 2.0).sin().powi(2);

        // Rounding can push the intermediate a hair above 1.0 for
        // near-antipodal pairs, where asin would return NaN.
        2.0 * EARTH_RADIUS_KM * half_chord.min(1.0).sqrt().asin()
    }
}
