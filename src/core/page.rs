use crate::core::constants::{METERS_PER_INCH, POINTS_PER_INCH};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A real-valued (width, height) pair.
///
/// Two unit interpretations exist: physical length in meters (page sizes on
/// the command line) and print points (page geometry handed to the
/// backends). Conversions between the two are pure; pixel dimensions are
/// derived from the point interpretation at a given resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: f64,
    pub height: f64,
}

impl MapSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both magnitudes are strictly positive
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Converts a physical size in meters to print points (via inches).
    /// Independent of dpi: page geometry is fixed in point space, pixel
    /// buffers are derived later from it.
    pub fn meters_to_points(&self) -> MapSize {
        self.scaled(POINTS_PER_INCH / METERS_PER_INCH)
    }

    /// Converts a size in print points back to meters
    pub fn points_to_meters(&self) -> MapSize {
        self.scaled(METERS_PER_INCH / POINTS_PER_INCH)
    }

    /// Derives pixel dimensions from a point-space size at `dpi`
    pub fn to_pixels(&self, dpi: f64) -> (u32, u32) {
        (
            (self.width * dpi / POINTS_PER_INCH).round() as u32,
            (self.height * dpi / POINTS_PER_INCH).round() as u32,
        )
    }

    pub fn scaled(&self, factor: f64) -> MapSize {
        MapSize::new(self.width * factor, self.height * factor)
    }
}

impl FromStr for MapSize {
    type Err = crate::Error;

    /// Parses a `"WxH"` pair as used by the `--size` and `--page-size`
    /// options, e.g. `800x600` or `0.297x0.210`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| crate::Error::ParseError(format!("expected WxH, got {s:?}")))?;
        let width = w
            .trim()
            .parse::<f64>()
            .map_err(|_| crate::Error::ParseError(format!("invalid size: {s:?}")))?;
        let height = h
            .trim()
            .parse::<f64>()
            .map_err(|_| crate::Error::ParseError(format!("invalid size: {s:?}")))?;
        let size = MapSize::new(width, height);
        if !size.is_valid() {
            return Err(crate::Error::ParseError(format!(
                "size must be positive: {s:?}"
            )));
        }
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_in_points() {
        let a4 = MapSize::new(0.297, 0.210);
        let points = a4.meters_to_points();

        // 0.297 m / 0.0254 * 72 = 841.88976...
        assert!((points.width - 841.8897637795276).abs() < 1e-9);
        assert!((points.height - 595.2755905511811).abs() < 1e-9);
    }

    #[test]
    fn test_unit_round_trip() {
        let size = MapSize::new(0.297, 0.210);
        let back = size.meters_to_points().points_to_meters();

        assert!((back.width - size.width).abs() < 1e-12);
        assert!((back.height - size.height).abs() < 1e-12);
    }

    #[test]
    fn test_pixel_derivation() {
        let points = MapSize::new(720.0, 360.0);
        assert_eq!(points.to_pixels(72.0), (720, 360));
        assert_eq!(points.to_pixels(144.0), (1440, 720));
        assert_eq!(points.to_pixels(96.0), (960, 480));
    }

    #[test]
    fn test_size_parsing() {
        let size: MapSize = "800x600".parse().unwrap();
        assert_eq!(size, MapSize::new(800.0, 600.0));

        let paper: MapSize = "0.297x0.210".parse().unwrap();
        assert!((paper.width - 0.297).abs() < 1e-12);

        assert!("800".parse::<MapSize>().is_err());
        assert!("0x600".parse::<MapSize>().is_err());
        assert!("axb".parse::<MapSize>().is_err());
    }
}
