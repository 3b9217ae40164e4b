//! Core constants shared by the resolver and the rendering backends.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels of the web-map tile pyramid.
pub const TILE_SIZE: u32 = 256;

/// Spherical earth radius used by Web Mercator (EPSG:3857), in meters.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Equatorial circumference of the Web Mercator sphere, in meters.
pub const EARTH_CIRCUMFERENCE: f64 = 2.0 * std::f64::consts::PI * EARTH_RADIUS;

/// Latitude limit of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Length of one inch in meters.
pub const METERS_PER_INCH: f64 = 0.0254;

/// Print points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// The OGC standardized rendering pixel size (0.28 mm), in meters.
/// Cartographic scale denominators are defined against this pixel.
pub const STANDARD_PIXEL_SIZE: f64 = 0.00028;
