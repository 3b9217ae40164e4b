//! Projection of a map definition into a device-space display list.
//!
//! Every backend consumes the same display list, so raster and vector
//! output of the same test case are structurally identical: the backends
//! differ only in how they put the items on their surface.

use crate::core::extent::Extent;
use crate::map::Map;
use crate::style::{Color, Feature};

/// A drawing primitive in device coordinates (y grows downward).
/// Stroke widths, radii, and dash lengths already include the symbology
/// scale factor.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
        fill: Color,
        stroke: Color,
        stroke_width: f64,
    },
    PolyLine {
        points: Vec<(f64, f64)>,
        color: Color,
        width: f64,
        dash: Vec<f32>,
    },
    Polygon {
        /// Outer ring followed by hole rings
        rings: Vec<Vec<(f64, f64)>>,
        fill: Color,
        stroke: Color,
        stroke_width: f64,
    },
}

/// A fully projected page, ready for any backend
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub background: Color,
    pub items: Vec<DisplayItem>,
}

impl Scene {
    /// Projects `map` content inside `extent` onto a `width` x `height`
    /// device surface. `scale_factor` is the full symbology multiplier:
    /// the resolver's scale factor, times `dpi / 72` for pixel surfaces.
    pub fn build(map: &Map, extent: &Extent, width: f64, height: f64, scale_factor: f64) -> Scene {
        let items = map
            .layers
            .iter()
            .flat_map(|layer| project_layer(layer, extent, width, height, scale_factor))
            .collect();

        Scene {
            width,
            height,
            background: map.background,
            items,
        }
    }
}

/// Projects a single style layer into device-space display items. Exposed
/// separately so backends that attribute output to layers (the feature
/// grid) can keep the attribution.
pub fn project_layer(
    layer: &crate::style::StyleLayer,
    extent: &Extent,
    width: f64,
    height: f64,
    scale_factor: f64,
) -> Vec<DisplayItem> {
    let project = |lng: f64, lat: f64| -> (f64, f64) {
        let projected = crate::core::geo::LatLng::new(lat, lng).to_mercator();
        (
            (projected.x - extent.min.x) / extent.width() * width,
            (extent.max.y - projected.y) / extent.height() * height,
        )
    };

    let mut items = Vec::new();
    for feature in &layer.features {
        match feature {
            Feature::Point { coordinates, style } => {
                let (cx, cy) = project(coordinates[0], coordinates[1]);
                items.push(DisplayItem::Circle {
                    cx,
                    cy,
                    radius: style.radius as f64 * scale_factor,
                    fill: style.fill_color,
                    stroke: style.stroke_color,
                    stroke_width: style.stroke_width as f64 * scale_factor,
                });
            }
            Feature::LineString { coordinates, style } => {
                items.push(DisplayItem::PolyLine {
                    points: coordinates.iter().map(|c| project(c[0], c[1])).collect(),
                    color: style.color,
                    width: style.width as f64 * scale_factor,
                    dash: style
                        .dash_pattern
                        .iter()
                        .map(|d| d * scale_factor as f32)
                        .collect(),
                });
            }
            Feature::Polygon { coordinates, style } => {
                items.push(DisplayItem::Polygon {
                    rings: coordinates
                        .iter()
                        .map(|ring| ring.iter().map(|c| project(c[0], c[1])).collect())
                        .collect(),
                    fill: style.fill_color,
                    stroke: style.stroke_color,
                    stroke_width: style.stroke_width as f64 * scale_factor,
                });
            }
        }
    }
    items
}
