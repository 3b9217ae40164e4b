//! The PDF backend, built on printpdf. Emits one page per render whose
//! media box matches the map's point size. printpdf shapes carry no alpha,
//! so fully transparent paint is skipped and partial transparency renders
//! opaque; polygon holes are stroked but not carved out of the fill.

use crate::map::Map;
use crate::render::VectorBackend;
use crate::scene::{DisplayItem, Scene};
use crate::style::Color;
use crate::{Error, Result};
use printpdf::{
    Color as PdfColor, Line, LineDashPattern, Mm, PdfDocument, PdfLayerReference,
    Point as PdfPoint, Rgb,
};

const MM_PER_POINT: f64 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PdfRenderer;

impl VectorBackend for PdfRenderer {
    const NAME: &'static str = "pdf";
    const EXT: &'static str = ".pdf";

    fn render(&self, map: &Map, scale_factor: f64) -> Result<Vec<u8>> {
        let scene = Scene::build(map, &map.extent, map.size.width, map.size.height, scale_factor);

        let (doc, page, layer) = PdfDocument::new(
            &map.name,
            Mm(scene.width * MM_PER_POINT),
            Mm(scene.height * MM_PER_POINT),
            "map",
        );
        let layer = doc.get_page(page).get_layer(layer);

        // Background rectangle covering the page
        let corners = [
            (0.0, 0.0),
            (scene.width, 0.0),
            (scene.width, scene.height),
            (0.0, scene.height),
        ];
        layer.set_fill_color(pdf_color(scene.background));
        layer.add_shape(shape(&corners, scene.height, true, true, false));

        for item in &scene.items {
            match item {
                DisplayItem::Circle {
                    cx,
                    cy,
                    radius,
                    fill,
                    stroke,
                    stroke_width,
                } => {
                    let ring = circle_points(*cx, *cy, *radius);
                    paint_ring(&layer, &ring, scene.height, *fill, *stroke, *stroke_width);
                }
                DisplayItem::PolyLine {
                    points,
                    color,
                    width,
                    dash,
                } => {
                    if color.a == 0 || *width <= 0.0 || points.len() < 2 {
                        continue;
                    }
                    layer.set_outline_color(pdf_color(*color));
                    layer.set_outline_thickness(*width);
                    layer.set_line_dash_pattern(dash_pattern(dash));
                    layer.add_shape(shape(points, scene.height, false, false, true));
                    layer.set_line_dash_pattern(LineDashPattern::default());
                }
                DisplayItem::Polygon {
                    rings,
                    fill,
                    stroke,
                    stroke_width,
                } => {
                    for (index, ring) in rings.iter().enumerate() {
                        if index == 0 {
                            paint_ring(&layer, ring, scene.height, *fill, *stroke, *stroke_width);
                        } else if stroke.a > 0 && *stroke_width > 0.0 {
                            layer.set_outline_color(pdf_color(*stroke));
                            layer.set_outline_thickness(*stroke_width);
                            layer.add_shape(shape(ring, scene.height, true, false, true));
                        }
                    }
                }
            }
        }

        doc.save_to_bytes()
            .map_err(|e| Error::Render(format!("pdf serialization failed: {e}")))
    }
}

/// Fills and strokes one closed ring
fn paint_ring(
    layer: &PdfLayerReference,
    ring: &[(f64, f64)],
    height: f64,
    fill: Color,
    stroke: Color,
    stroke_width: f64,
) {
    let do_fill = fill.a > 0;
    let do_stroke = stroke.a > 0 && stroke_width > 0.0;
    if !do_fill && !do_stroke {
        return;
    }
    if do_fill {
        layer.set_fill_color(pdf_color(fill));
    }
    if do_stroke {
        layer.set_outline_color(pdf_color(stroke));
        layer.set_outline_thickness(stroke_width);
    }
    layer.add_shape(shape(ring, height, true, do_fill, do_stroke));
}

/// Builds a printpdf shape from device coordinates, flipping to the PDF
/// bottom-left origin
fn shape(points: &[(f64, f64)], height: f64, closed: bool, fill: bool, stroke: bool) -> Line {
    Line {
        points: points
            .iter()
            .map(|(x, y)| {
                (
                    PdfPoint::new(Mm(x * MM_PER_POINT), Mm((height - y) * MM_PER_POINT)),
                    false,
                )
            })
            .collect(),
        is_closed: closed,
        has_fill: fill,
        has_stroke: stroke,
        is_clipping_path: false,
    }
}

fn circle_points(cx: f64, cy: f64, radius: f64) -> Vec<(f64, f64)> {
    const SEGMENTS: usize = 32;
    (0..SEGMENTS)
        .map(|i| {
            let angle = i as f64 / SEGMENTS as f64 * std::f64::consts::TAU;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

fn pdf_color(color: Color) -> PdfColor {
    PdfColor::Rgb(Rgb::new(
        color.r as f64 / 255.0,
        color.g as f64 / 255.0,
        color.b as f64 / 255.0,
        None,
    ))
}

/// printpdf dash patterns are integer valued; the first on/off pair is
/// enough for the styles the harness draws
fn dash_pattern(dash: &[f32]) -> LineDashPattern {
    let mut pattern = LineDashPattern::default();
    if let Some(on) = dash.first() {
        pattern.dash_1 = Some((*on).round().max(1.0) as i64);
        let off = dash.get(1).copied().unwrap_or(*on);
        pattern.gap_1 = Some(off.round().max(1.0) as i64);
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extent::Extent;
    use crate::core::page::MapSize;
    use crate::style::StyleSheet;

    fn test_map() -> Map {
        let sheet = StyleSheet::from_json(
            r##"{
                "layers": [
                    {
                        "name": "area",
                        "features": [
                            {
                                "type": "Polygon",
                                "coordinates": [[[-0.005, -0.005], [0.005, -0.005], [0.005, 0.005], [-0.005, 0.005]]]
                            }
                        ]
                    }
                ]
            }"##,
        )
        .unwrap();
        let extent = Extent::from_coords(-1000.0, -1000.0, 1000.0, 1000.0);
        Map::from_style("t", &sheet, extent, MapSize::new(300.0, 300.0), 72.0)
    }

    #[test]
    fn test_output_is_a_pdf() {
        let bytes = PdfRenderer.render(&test_map(), 1.0).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_circle_approximation_is_closed_ring() {
        let ring = circle_points(10.0, 20.0, 5.0);
        assert_eq!(ring.len(), 32);
        assert!((ring[0].0 - 15.0).abs() < 1e-9);
        assert!((ring[0].1 - 20.0).abs() < 1e-9);
        // All points sit on the radius.
        for (x, y) in &ring {
            let r = ((x - 10.0).powi(2) + (y - 20.0).powi(2)).sqrt();
            assert!((r - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_dash_pattern_defaults_gap_to_dash() {
        let pattern = dash_pattern(&[4.0]);
        assert_eq!(pattern.dash_1, Some(4));
        assert_eq!(pattern.gap_1, Some(4));

        let empty = dash_pattern(&[]);
        assert_eq!(empty.dash_1, None);
    }
}
