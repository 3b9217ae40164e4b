//! The PostScript backend: hand-emitted, DSC-conformant level 2 output.
//! PostScript has no alpha channel; fully transparent paint is skipped and
//! partial transparency renders opaque.

use crate::map::Map;
use crate::render::VectorBackend;
use crate::scene::{DisplayItem, Scene};
use crate::style::Color;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PsRenderer;

impl VectorBackend for PsRenderer {
    const NAME: &'static str = "ps";
    const EXT: &'static str = ".ps";

    fn render(&self, map: &Map, scale_factor: f64) -> Result<Vec<u8>> {
        let scene = Scene::build(map, &map.extent, map.size.width, map.size.height, scale_factor);
        let mut out = String::new();

        out.push_str("%!PS-Adobe-3.0\n");
        out.push_str("%%Creator: printmap\n");
        out.push_str(&format!(
            "%%BoundingBox: 0 0 {} {}\n",
            scene.width.ceil() as i64,
            scene.height.ceil() as i64
        ));
        out.push_str("%%Pages: 1\n%%EndComments\n%%Page: 1 1\ngsave\n");

        // Background
        out.push_str(&set_color(scene.background));
        out.push_str(&format!(
            "0 0 {} {} rectfill\n",
            num(scene.width),
            num(scene.height)
        ));

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
                    out.push_str(&format!(
                        "newpath {} {} {} 0 360 arc closepath\n",
                        num(*cx),
                        num(scene.height - cy),
                        num(*radius)
                    ));
                    fill_and_stroke(&mut out, *fill, *stroke, *stroke_width, false);
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
                    emit_path(&mut out, std::slice::from_ref(points), scene.height, false);
                    out.push_str(&set_color(*color));
                    out.push_str(&format!("{} setlinewidth\n", num(*width)));
                    if dash.is_empty() {
                        out.push_str("[] 0 setdash\n");
                    } else {
                        let pattern: Vec<String> =
                            dash.iter().map(|d| num(*d as f64)).collect();
                        out.push_str(&format!("[{}] 0 setdash\n", pattern.join(" ")));
                    }
                    out.push_str("stroke\n");
                }
                DisplayItem::Polygon {
                    rings,
                    fill,
                    stroke,
                    stroke_width,
                } => {
                    emit_path(&mut out, rings, scene.height, true);
                    fill_and_stroke(&mut out, *fill, *stroke, *stroke_width, true);
                }
            }
        }

        out.push_str("grestore\nshowpage\n%%EOF\n");
        Ok(out.into_bytes())
    }
}

fn emit_path(out: &mut String, rings: &[Vec<(f64, f64)>], height: f64, close: bool) {
    out.push_str("newpath\n");
    for ring in rings {
        for (index, (x, y)) in ring.iter().enumerate() {
            let op = if index == 0 { "moveto" } else { "lineto" };
            out.push_str(&format!("{} {} {op}\n", num(*x), num(height - y)));
        }
        if close {
            out.push_str("closepath\n");
        }
    }
}

/// Paints the current path: an even-odd fill preserved with gsave so the
/// same path can be stroked afterwards.
fn fill_and_stroke(out: &mut String, fill: Color, stroke: Color, stroke_width: f64, even_odd: bool) {
    let fill_op = if even_odd { "eofill" } else { "fill" };
    let do_fill = fill.a > 0;
    let do_stroke = stroke.a > 0 && stroke_width > 0.0;

    if do_fill {
        out.push_str(&set_color(fill));
        if do_stroke {
            out.push_str(&format!("gsave {fill_op} grestore\n"));
        } else {
            out.push_str(&format!("{fill_op}\n"));
        }
    }
    if do_stroke {
        out.push_str(&set_color(stroke));
        out.push_str(&format!("{} setlinewidth [] 0 setdash stroke\n", num(stroke_width)));
    }
    if !do_fill && !do_stroke {
        out.push_str("newpath\n");
    }
}

fn set_color(color: Color) -> String {
    format!(
        "{} {} {} setrgbcolor\n",
        channel(color.r),
        channel(color.g),
        channel(color.b)
    )
}

fn channel(value: u8) -> String {
    num(value as f64 / 255.0)
}

/// Formats a coordinate with a fixed four-decimal precision, trimmed, so
/// output is deterministic and diffs stay readable
fn num(value: f64) -> String {
    let mut text = format!("{value:.4}");
    while text.contains('.') && (text.ends_with('0') || text.ends_with('.')) {
        text.pop();
    }
    text
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
                        "name": "marker",
                        "features": [
                            {"type": "Point", "coordinates": [0.0, 0.0]}
                        ]
                    }
                ]
            }"##,
        )
        .unwrap();
        let extent = Extent::from_coords(-1000.0, -1000.0, 1000.0, 1000.0);
        Map::from_style("t", &sheet, extent, MapSize::new(200.0, 100.0), 72.0)
    }

    #[test]
    fn test_dsc_structure() {
        let bytes = PsRenderer.render(&test_map(), 1.0).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("%!PS-Adobe-3.0\n"));
        assert!(text.contains("%%BoundingBox: 0 0 200 100"));
        assert!(text.contains("showpage"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_y_axis_is_flipped() {
        // The marker sits at device center (100, 50); in PostScript's
        // bottom-left origin that is still (100, 50) on a 100pt page.
        let text = String::from_utf8(PsRenderer.render(&test_map(), 1.0).unwrap()).unwrap();
        assert!(text.contains("newpath 100 50 5 0 360 arc"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = PsRenderer.render(&test_map(), 1.0).unwrap();
        let b = PsRenderer.render(&test_map(), 1.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_number_trimming() {
        assert_eq!(num(100.0), "100");
        assert_eq!(num(0.5), "0.5");
        assert_eq!(num(1.0 / 3.0), "0.3333");
    }
}
