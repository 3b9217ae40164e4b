//! The SVG backend: whole-page vector documents built with the `svg` crate.
//! Page size is embedded in points; coordinates use the same point space.

use crate::map::Map;
use crate::render::VectorBackend;
use crate::scene::{DisplayItem, Scene};
use crate::style::Color;
use crate::Result;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Path, Rectangle};
use svg::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SvgRenderer;

impl VectorBackend for SvgRenderer {
    const NAME: &'static str = "svg";
    const EXT: &'static str = ".svg";

    fn render(&self, map: &Map, scale_factor: f64) -> Result<Vec<u8>> {
        let scene = Scene::build(map, &map.extent, map.size.width, map.size.height, scale_factor);

        let mut document = Document::new()
            .set("width", format!("{}pt", round2(scene.width)))
            .set("height", format!("{}pt", round2(scene.height)))
            .set("viewBox", (0.0, 0.0, round2(scene.width), round2(scene.height)))
            .add(
                Rectangle::new()
                    .set("width", "100%")
                    .set("height", "100%")
                    .set("fill", scene.background.to_hex()),
            );

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
                    let mut circle = Circle::new()
                        .set("cx", round2(*cx))
                        .set("cy", round2(*cy))
                        .set("r", round2(*radius));
                    circle = paint(circle, Some(*fill), *stroke, *stroke_width);
                    document = document.add(circle);
                }
                DisplayItem::PolyLine {
                    points,
                    color,
                    width,
                    dash,
                } => {
                    let mut path = Path::new()
                        .set("d", line_data(points, false))
                        .set("fill", "none");
                    path = paint(path, None, *color, *width);
                    if !dash.is_empty() {
                        let pattern: Vec<String> =
                            dash.iter().map(|d| round2(*d as f64).to_string()).collect();
                        path = path.set("stroke-dasharray", pattern.join(","));
                    }
                    document = document.add(path);
                }
                DisplayItem::Polygon {
                    rings,
                    fill,
                    stroke,
                    stroke_width,
                } => {
                    let mut data = Data::new();
                    for ring in rings {
                        data = ring_data(data, ring);
                    }
                    let mut path = Path::new().set("d", data).set("fill-rule", "evenodd");
                    path = paint(path, Some(*fill), *stroke, *stroke_width);
                    document = document.add(path);
                }
            }
        }

        Ok(document.to_string().into_bytes())
    }
}

/// Applies fill and stroke attributes shared by every element kind
fn paint<T: svg::Node>(mut node: T, fill: Option<Color>, stroke: Color, stroke_width: f64) -> T {
    match fill {
        Some(color) => {
            node.assign("fill", color.to_hex());
            if color.a < 255 {
                node.assign("fill-opacity", opacity(color));
            }
        }
        None => {}
    }
    if stroke_width > 0.0 && stroke.a > 0 {
        node.assign("stroke", stroke.to_hex());
        node.assign("stroke-width", round2(stroke_width));
        if stroke.a < 255 {
            node.assign("stroke-opacity", opacity(stroke));
        }
    }
    node
}

fn line_data(points: &[(f64, f64)], close: bool) -> Data {
    let mut data = Data::new();
    for (index, (x, y)) in points.iter().enumerate() {
        if index == 0 {
            data = data.move_to((round2(*x), round2(*y)));
        } else {
            data = data.line_to((round2(*x), round2(*y)));
        }
    }
    if close {
        data = data.close();
    }
    data
}

fn ring_data(mut data: Data, ring: &[(f64, f64)]) -> Data {
    for (index, (x, y)) in ring.iter().enumerate() {
        if index == 0 {
            data = data.move_to((round2(*x), round2(*y)));
        } else {
            data = data.line_to((round2(*x), round2(*y)));
        }
    }
    data.close()
}

fn opacity(color: Color) -> f64 {
    (color.a as f64 / 255.0 * 1000.0).round() / 1000.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
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
                "background": "#e8f4ff",
                "layers": [
                    {
                        "name": "roads",
                        "features": [
                            {
                                "type": "LineString",
                                "coordinates": [[-0.005, 0.0], [0.005, 0.0]],
                                "style": {"color": "#333333", "width": 3.0}
                            }
                        ]
                    }
                ]
            }"##,
        )
        .unwrap();
        let extent = Extent::from_coords(-1000.0, -1000.0, 1000.0, 1000.0);
        Map::from_style("t", &sheet, extent, MapSize::new(400.0, 400.0), 72.0)
    }

    #[test]
    fn test_document_structure() {
        let bytes = SvgRenderer.render(&test_map(), 1.0).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("<svg"));
        assert!(text.contains("width=\"400pt\""));
        assert!(text.contains("fill=\"#e8f4ff\""));
        assert!(text.contains("stroke=\"#333333\""));
        assert!(text.contains("stroke-width=\"3\""));
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = SvgRenderer.render(&test_map(), 1.0).unwrap();
        let b = SvgRenderer.render(&test_map(), 1.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_scale_factor_changes_stroke_width_only() {
        let map = test_map();
        let plain = String::from_utf8(SvgRenderer.render(&map, 1.0).unwrap()).unwrap();
        let scaled = String::from_utf8(SvgRenderer.render(&map, 2.0).unwrap()).unwrap();

        assert!(plain.contains("stroke-width=\"3\""));
        assert!(scaled.contains("stroke-width=\"6\""));
        // Page geometry is unchanged.
        assert!(scaled.contains("width=\"400pt\""));
    }
}
