use crate::core::constants::{EARTH_RADIUS, MAX_LATITUDE};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// Whether the latitude lies inside the square Web Mercator world.
    /// Coordinates outside of it cannot be projected meaningfully.
    pub fn is_projectable(&self) -> bool {
        self.lat.abs() <= MAX_LATITUDE
    }

    /// Wraps longitude to [-180, 180] range
    pub fn wrap_lng(lng: f64) -> f64 {
        let wrapped = lng % 360.0;
        if wrapped > 180.0 {
            wrapped - 360.0
        } else if wrapped < -180.0 {
            wrapped + 360.0
        } else {
            wrapped
        }
    }

    /// Converts to Web Mercator projection (EPSG:3857)
    pub fn to_mercator(&self) -> Point {
        let x = self.lng.to_radians() * EARTH_RADIUS;
        let y = ((PI / 4.0 + self.lat.to_radians() / 2.0).tan().ln()) * EARTH_RADIUS;
        Point::new(x, y)
    }

    /// Creates LatLng from Web Mercator coordinates
    pub fn from_mercator(point: Point) -> Self {
        let lng = (point.x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (point.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Self::new(lat, lng)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl FromStr for LatLng {
    type Err = crate::Error;

    /// Parses a `"lon,lat"` pair as used by the `--center` option.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let lng = parts
            .next()
            .and_then(|p| p.parse::<f64>().ok())
            .ok_or_else(|| crate::Error::ParseError(format!("invalid coordinate pair: {s:?}")))?;
        let lat = parts
            .next()
            .and_then(|p| p.parse::<f64>().ok())
            .ok_or_else(|| crate::Error::ParseError(format!("invalid coordinate pair: {s:?}")))?;
        if parts.next().is_some() {
            return Err(crate::Error::ParseError(format!(
                "expected \"lon,lat\", got {s:?}"
            )));
        }
        let coord = LatLng::new(lat, lng);
        if !coord.is_valid() {
            return Err(crate::Error::InvalidCoordinates(format!(
                "{lat}, {lng} is outside the valid range"
            )));
        }
        Ok(coord)
    }
}

/// Represents a point in device or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_creation() {
        let coord = LatLng::new(40.7128, -74.0060);
        assert_eq!(coord.lat, 40.7128);
        assert_eq!(coord.lng, -74.0060);
        assert!(coord.is_valid());
        assert!(coord.is_projectable());
    }

    #[test]
    fn test_mercator_round_trip() {
        let coord = LatLng::new(51.5074, -0.1278);
        let projected = coord.to_mercator();
        let back = LatLng::from_mercator(projected);

        assert!((back.lat - coord.lat).abs() < 1e-9);
        assert!((back.lng - coord.lng).abs() < 1e-9);
    }

    #[test]
    fn test_equator_projects_to_origin() {
        let projected = LatLng::new(0.0, 0.0).to_mercator();
        assert!(projected.x.abs() < 1e-9);
        assert!(projected.y.abs() < 1e-9);
    }

    #[test]
    fn test_pole_is_not_projectable() {
        assert!(!LatLng::new(90.0, 0.0).is_projectable());
        assert!(!LatLng::new(-89.0, 0.0).is_projectable());
        assert!(LatLng::new(85.0, 0.0).is_projectable());
    }

    #[test]
    fn test_center_parsing() {
        let coord: LatLng = "-122.4194,37.7749".parse().unwrap();
        assert_eq!(coord.lng, -122.4194);
        assert_eq!(coord.lat, 37.7749);

        assert!("".parse::<LatLng>().is_err());
        assert!("10".parse::<LatLng>().is_err());
        assert!("10,20,30".parse::<LatLng>().is_err());
        assert!("0,95".parse::<LatLng>().is_err());
    }

    #[test]
    fn test_wrap_lng() {
        assert_eq!(LatLng::wrap_lng(190.0), -170.0);
        assert_eq!(LatLng::wrap_lng(-190.0), 170.0);
        assert_eq!(LatLng::wrap_lng(45.0), 45.0);
    }
}
