//! The coordinate/scale resolver.
//!
//! Turns a geographic center, a cartographic scale denominator, a physical
//! page size, and a tile-pyramid zoom level into a projected map extent and
//! a renderer scale factor. The scale factor is not a display zoom: it is
//! handed to the backends so that line widths, symbol radii, and other
//! styled dimensions grow with the physical output size, keeping symbology
//! visually consistent between a postcard and a poster at the same nominal
//! scale.

use crate::core::constants::{EARTH_CIRCUMFERENCE, STANDARD_PIXEL_SIZE, TILE_SIZE};
use crate::core::extent::Extent;
use crate::core::geo::{LatLng, Point};
use crate::core::page::MapSize;
use crate::{Error, Result};

/// The output of [`resolve`]: a Web Mercator extent and the symbology
/// scale factor to render it with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub extent: Extent,
    pub scale_factor: f64,
}

/// Resolves a page description into a map extent and scale factor.
///
/// `center` is a WGS84 lon/lat coordinate, reprojected to the working
/// Web Mercator reference before use. `page_size` is the physical page in
/// meters; its point-space counterpart (1 in = 0.0254 m, 72 pt/in) fixes
/// the page geometry independently of `dpi`, which only affects the pixel
/// buffers derived downstream by the raster backends.
///
/// Latitudes beyond the Mercator limit degenerate the extent (the
/// cos-correction tends to zero towards the poles) and are rejected rather
/// than clamped.
pub fn resolve(
    center: LatLng,
    scale_denominator: f64,
    page_size: MapSize,
    zoom: u32,
    dpi: f64,
) -> Result<Resolved> {
    if !center.is_valid() {
        return Err(Error::InvalidCoordinates(format!(
            "center {}, {} is outside the valid range",
            center.lat, center.lng
        )));
    }
    if !center.is_projectable() {
        return Err(Error::InvalidCoordinates(format!(
            "latitude {} is too close to the pole to project",
            center.lat
        )));
    }
    if scale_denominator <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "scale denominator must be positive, got {scale_denominator}"
        )));
    }
    if !page_size.is_valid() {
        return Err(Error::InvalidArgument(format!(
            "page size must be positive, got {}x{}",
            page_size.width, page_size.height
        )));
    }
    if dpi <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "dpi must be positive, got {dpi}"
        )));
    }

    let page_points = page_size.meters_to_points();
    let projected = center.to_mercator();

    // First-order correction for distance distortion away from the equator
    // under the Mercator projection.
    let projection_scale = center.lat.to_radians().cos();

    let extent = Extent::from_origin_and_size(Point::default(), page_size)
        .scaled(scale_denominator * projection_scale)
        .recentered_on(projected);

    // Reference scale of a `zoom`-level tile in the standard pyramid, and
    // the scale actually implied by the page, both expressed as true
    // cartographic scale denominators against the standardized 0.28 mm
    // rendering pixel.
    let reference_resolution = EARTH_CIRCUMFERENCE / 2_f64.powi(zoom as i32) / TILE_SIZE as f64;
    let reference_denominator = reference_resolution / STANDARD_PIXEL_SIZE;

    let actual_resolution = extent.width() / page_points.width;
    let actual_denominator = actual_resolution / STANDARD_PIXEL_SIZE;

    let scale_factor = actual_denominator / reference_denominator;

    let (px_width, px_height) = page_points.to_pixels(dpi);
    log::debug!(
        "resolved {:.1}x{:.1}pt page to extent {:.1}x{:.1} (scale factor {:.3}, {}x{} px at {} dpi)",
        page_points.width,
        page_points.height,
        extent.width(),
        extent.height(),
        scale_factor,
        px_width,
        px_height,
        dpi
    );

    Ok(Resolved {
        extent,
        scale_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4: MapSize = MapSize {
        width: 0.297,
        height: 0.210,
    };

    #[test]
    fn test_extent_is_positive_and_centered() {
        let resolved = resolve(LatLng::new(0.0, 0.0), 50000.0, A4, 10, 96.0).unwrap();

        assert!(resolved.extent.is_valid());
        assert!(resolved.extent.width() > 0.0);
        assert!(resolved.extent.height() > 0.0);
        assert!(resolved.extent.center().x.abs() < 1e-6);
        assert!(resolved.extent.center().y.abs() < 1e-6);

        // A4 at 1:50000 covers 0.297 m * 50000 = 14850 m of ground.
        assert!((resolved.extent.width() - 14850.0).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic() {
        let a = resolve(LatLng::new(47.3769, 8.5417), 25000.0, A4, 14, 300.0).unwrap();
        let b = resolve(LatLng::new(47.3769, 8.5417), 25000.0, A4, 14, 300.0).unwrap();

        assert_eq!(a.extent, b.extent);
        assert_eq!(a.scale_factor.to_bits(), b.scale_factor.to_bits());
    }

    #[test]
    fn test_scale_factor_near_one_when_scales_coincide() {
        // The true denominator of an A4 page at 1:50000 is ~63000, which the
        // tile pyramid matches between zoom 13 and 14.
        let resolved = resolve(LatLng::new(0.0, 0.0), 50000.0, A4, 13, 96.0).unwrap();
        assert!(resolved.scale_factor > 0.8 && resolved.scale_factor < 1.2);
    }

    #[test]
    fn test_scale_factor_doubles_per_zoom_level() {
        let z10 = resolve(LatLng::new(0.0, 0.0), 50000.0, A4, 10, 96.0).unwrap();
        let z11 = resolve(LatLng::new(0.0, 0.0), 50000.0, A4, 11, 96.0).unwrap();

        assert!((z11.scale_factor / z10.scale_factor - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_latitude_shrinks_ground_coverage() {
        let equator = resolve(LatLng::new(0.0, 0.0), 50000.0, A4, 13, 96.0).unwrap();
        let oslo = resolve(LatLng::new(59.91, 10.75), 50000.0, A4, 13, 96.0).unwrap();

        assert!(oslo.extent.width() < equator.extent.width());
        let expected = equator.extent.width() * 59.91_f64.to_radians().cos();
        assert!((oslo.extent.width() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_pole_adjacent_center_is_rejected() {
        assert!(resolve(LatLng::new(89.0, 0.0), 50000.0, A4, 10, 96.0).is_err());
        assert!(resolve(LatLng::new(-90.0, 0.0), 50000.0, A4, 10, 96.0).is_err());
    }

    #[test]
    fn test_degenerate_arguments_are_rejected() {
        assert!(resolve(LatLng::default(), 0.0, A4, 10, 96.0).is_err());
        assert!(resolve(LatLng::default(), -1.0, A4, 10, 96.0).is_err());
        assert!(resolve(LatLng::default(), 50000.0, MapSize::new(0.0, 0.2), 10, 96.0).is_err());
        assert!(resolve(LatLng::default(), 50000.0, A4, 10, 0.0).is_err());
    }

    #[test]
    fn test_zoom_zero_gives_largest_reference_scale() {
        let z0 = resolve(LatLng::default(), 50000.0, A4, 0, 96.0).unwrap();
        let z1 = resolve(LatLng::default(), 50000.0, A4, 1, 96.0).unwrap();

        // A larger reference scale means a smaller correction factor.
        assert!(z0.scale_factor < z1.scale_factor);
    }
}
