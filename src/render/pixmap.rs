//! The raster backend: tiny-skia rasterization into a 32-bit RGBA buffer,
//! persisted as PNG.

use crate::core::constants::POINTS_PER_INCH;
use crate::map::Map;
use crate::render::{RasterBackend, TileGrid};
use crate::scene::{DisplayItem, Scene};
use crate::style::Color;
use crate::{Error, Result};
use std::path::Path;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixmapRenderer;

impl PixmapRenderer {
    /// Rasterizes one device window of the map into its own pixmap
    fn render_window(
        &self,
        map: &Map,
        window: (u32, u32, u32, u32),
        full: (u32, u32),
        scale_factor: f64,
    ) -> Result<Pixmap> {
        let (x0, y0, x1, y1) = window;
        let (full_width, full_height) = full;
        let width = x1 - x0;
        let height = y1 - y0;

        let extent = map.extent.window(
            x0 as f64 / full_width as f64,
            y0 as f64 / full_height as f64,
            x1 as f64 / full_width as f64,
            y1 as f64 / full_height as f64,
        );
        let symbology = scale_factor * map.dpi / POINTS_PER_INCH;
        let scene = Scene::build(map, &extent, width as f64, height as f64, symbology);

        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| Error::Render(format!("zero-sized pixmap: {width}x{height}")))?;
        pixmap.fill(to_skia(scene.background));

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
                    let mut builder = PathBuilder::new();
                    builder.push_circle(*cx as f32, *cy as f32, *radius as f32);
                    if let Some(path) = builder.finish() {
                        fill_path(&mut pixmap, &path, *fill, FillRule::Winding);
                        stroke_path(&mut pixmap, &path, *stroke, *stroke_width, &[]);
                    }
                }
                DisplayItem::PolyLine {
                    points,
                    color,
                    width,
                    dash,
                } => {
                    if let Some(path) = poly_path(&[points.clone()], false) {
                        stroke_path(&mut pixmap, &path, *color, *width, dash);
                    }
                }
                DisplayItem::Polygon {
                    rings,
                    fill,
                    stroke,
                    stroke_width,
                } => {
                    if let Some(path) = poly_path(rings, true) {
                        fill_path(&mut pixmap, &path, *fill, FillRule::EvenOdd);
                        stroke_path(&mut pixmap, &path, *stroke, *stroke_width, &[]);
                    }
                }
            }
        }

        Ok(pixmap)
    }
}

impl RasterBackend for PixmapRenderer {
    const NAME: &'static str = "pixmap";
    const EXT: &'static str = ".png";

    type Image = image::RgbaImage;

    fn render(&self, map: &Map, scale_factor: f64) -> Result<Self::Image> {
        self.render_tiled(map, TileGrid::single(), scale_factor)
    }

    fn render_tiled(&self, map: &Map, tiles: TileGrid, scale_factor: f64) -> Result<Self::Image> {
        let (width, height) = map.pixel_size();
        if width == 0 || height == 0 {
            return Err(Error::Render(format!(
                "map has no pixel area: {width}x{height}"
            )));
        }

        let mut composite = image::RgbaImage::new(width, height);
        for row in 0..tiles.rows {
            for col in 0..tiles.cols {
                // Integer pixel boundaries so the tiles composite exactly,
                // even when the grid does not divide the page evenly.
                let x0 = col * width / tiles.cols;
                let x1 = (col + 1) * width / tiles.cols;
                let y0 = row * height / tiles.rows;
                let y1 = (row + 1) * height / tiles.rows;
                if x1 == x0 || y1 == y0 {
                    continue;
                }

                let pixmap =
                    self.render_window(map, (x0, y0, x1, y1), (width, height), scale_factor)?;
                let tile = to_rgba_image(&pixmap);
                image::imageops::replace(&mut composite, &tile, x0 as i64, y0 as i64);
            }
        }

        Ok(composite)
    }

    fn save(&self, image: &Self::Image, path: &Path) -> Result<()> {
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| Error::Render(format!("cannot write {}: {e}", path.display())))
    }
}

fn to_skia(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn to_rgba_image(pixmap: &Pixmap) -> image::RgbaImage {
    let mut image = image::RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, out) in pixmap.pixels().iter().zip(image.pixels_mut()) {
        let c = pixel.demultiply();
        *out = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}

fn poly_path(rings: &[Vec<(f64, f64)>], close: bool) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for ring in rings {
        let mut points = ring.iter();
        let (x, y) = points.next()?;
        builder.move_to(*x as f32, *y as f32);
        for (x, y) in points {
            builder.line_to(*x as f32, *y as f32);
        }
        if close {
            builder.close();
        }
    }
    builder.finish()
}

fn fill_path(pixmap: &mut Pixmap, path: &tiny_skia::Path, color: Color, rule: FillRule) {
    if color.a == 0 {
        return;
    }
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    pixmap.fill_path(path, &paint, rule, Transform::identity(), None);
}

fn stroke_path(
    pixmap: &mut Pixmap,
    path: &tiny_skia::Path,
    color: Color,
    width: f64,
    dash: &[f32],
) {
    if color.a == 0 || width <= 0.0 {
        return;
    }
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    let stroke = Stroke {
        width: width as f32,
        dash: if dash.is_empty() {
            None
        } else {
            StrokeDash::new(dash.to_vec(), 0.0)
        },
        ..Stroke::default()
    };
    pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extent::Extent;
    use crate::core::page::MapSize;
    use crate::style::StyleSheet;

    fn test_map(dpi: f64) -> Map {
        let sheet = StyleSheet::from_json(
            r##"{
                "background": "#ffffff",
                "layers": [
                    {
                        "name": "marker",
                        "features": [
                            {
                                "type": "Point",
                                "coordinates": [0.0, 0.0],
                                "style": {"fill_color": "#ff0000", "radius": 10.0, "stroke_width": 0.0}
                            }
                        ]
                    }
                ]
            }"##,
        )
        .unwrap();
        let extent = Extent::from_coords(-1000.0, -1000.0, 1000.0, 1000.0);
        Map::from_style("t", &sheet, extent, MapSize::new(64.0, 64.0), dpi)
    }

    #[test]
    fn test_background_and_marker_pixels() {
        let map = test_map(72.0);
        let image = PixmapRenderer.render(&map, 1.0).unwrap();

        assert_eq!(image.dimensions(), (64, 64));
        // Corner is background, center is the marker fill.
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(32, 32).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_dpi_scales_pixel_buffer() {
        let map = test_map(144.0);
        let image = PixmapRenderer.render(&map, 1.0).unwrap();
        assert_eq!(image.dimensions(), (128, 128));
        assert_eq!(image.get_pixel(64, 64).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_tiled_render_matches_untiled() {
        let map = test_map(72.0);
        let whole = PixmapRenderer.render(&map, 1.0).unwrap();
        let tiled = PixmapRenderer
            .render_tiled(&map, TileGrid::new(2, 2), 1.0)
            .unwrap();

        assert_eq!(whole.dimensions(), tiled.dimensions());
        // Compare the marker center and the corners; anti-aliased tile
        // seams are the only place the images may differ.
        assert_eq!(whole.get_pixel(0, 0), tiled.get_pixel(0, 0));
        assert_eq!(whole.get_pixel(63, 63), tiled.get_pixel(63, 63));
        assert_eq!(whole.get_pixel(40, 32), tiled.get_pixel(40, 32));
    }

    #[test]
    fn test_scale_factor_grows_marker() {
        let map = test_map(72.0);
        let plain = PixmapRenderer.render(&map, 1.0).unwrap();
        let scaled = PixmapRenderer.render(&map, 2.0).unwrap();

        // 18 px from center: outside a 10 px marker, inside a 20 px one.
        assert_eq!(plain.get_pixel(32 + 18, 32).0, [255, 255, 255, 255]);
        assert_eq!(scaled.get_pixel(32 + 18, 32).0, [255, 0, 0, 255]);
    }
}
