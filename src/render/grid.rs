//! The feature-grid backend: a coarse hit-grid recording which layer drew
//! each cell, serialized as JSON. Useful for cheap structural regression
//! diffs where pixel output would be too sensitive.

use crate::core::constants::POINTS_PER_INCH;
use crate::map::Map;
use crate::render::{RasterBackend, TileGrid};
use crate::scene::{project_layer, DisplayItem};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Device pixels covered by one grid cell
const CELL_SIZE: u32 = 4;

/// A rendered hit-grid. `cells` holds indices into `keys`, row-major;
/// key 0 is always the empty key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureGrid {
    pub cell_size: u32,
    pub cols: u32,
    pub rows: u32,
    pub keys: Vec<String>,
    pub cells: Vec<Vec<u16>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridRenderer;

impl GridRenderer {
    /// Fills one window of the cell matrix. Window coordinates are in
    /// cells; geometry is projected at cell resolution so coverage tests
    /// run against cell centers directly.
    fn render_window(
        &self,
        map: &Map,
        window: (u32, u32, u32, u32),
        full: (u32, u32),
        scale_factor: f64,
    ) -> Vec<Vec<u16>> {
        let (c0, r0, c1, r1) = window;
        let (full_cols, full_rows) = full;

        let extent = map.extent.window(
            c0 as f64 / full_cols as f64,
            r0 as f64 / full_rows as f64,
            c1 as f64 / full_cols as f64,
            r1 as f64 / full_rows as f64,
        );
        let width = (c1 - c0) as f64;
        let height = (r1 - r0) as f64;
        // Symbology in cell units: pixel symbology divided by the cell edge.
        let symbology = scale_factor * map.dpi / POINTS_PER_INCH / CELL_SIZE as f64;

        let mut cells = vec![vec![0u16; (c1 - c0) as usize]; (r1 - r0) as usize];
        for (index, layer) in map.layers.iter().enumerate() {
            let key = (index + 1) as u16;
            let items = project_layer(layer, &extent, width, height, symbology);
            for row in 0..(r1 - r0) {
                for col in 0..(c1 - c0) {
                    let x = col as f64 + 0.5;
                    let y = row as f64 + 0.5;
                    if items.iter().any(|item| covers(item, x, y)) {
                        cells[row as usize][col as usize] = key;
                    }
                }
            }
        }
        cells
    }
}

impl RasterBackend for GridRenderer {
    const NAME: &'static str = "grid";
    const EXT: &'static str = ".json";

    type Image = FeatureGrid;

    fn render(&self, map: &Map, scale_factor: f64) -> Result<Self::Image> {
        self.render_tiled(map, TileGrid::single(), scale_factor)
    }

    fn render_tiled(&self, map: &Map, tiles: TileGrid, scale_factor: f64) -> Result<Self::Image> {
        let (width, height) = map.pixel_size();
        let cols = width.div_ceil(CELL_SIZE);
        let rows = height.div_ceil(CELL_SIZE);
        if cols == 0 || rows == 0 {
            return Err(Error::Render(format!(
                "map has no cell area: {cols}x{rows}"
            )));
        }

        let mut cells = vec![vec![0u16; cols as usize]; rows as usize];
        for tile_row in 0..tiles.rows {
            for tile_col in 0..tiles.cols {
                let c0 = tile_col * cols / tiles.cols;
                let c1 = (tile_col + 1) * cols / tiles.cols;
                let r0 = tile_row * rows / tiles.rows;
                let r1 = (tile_row + 1) * rows / tiles.rows;
                if c1 == c0 || r1 == r0 {
                    continue;
                }

                let window = self.render_window(map, (c0, r0, c1, r1), (cols, rows), scale_factor);
                for (offset, row) in window.into_iter().enumerate() {
                    let target = &mut cells[r0 as usize + offset];
                    target[c0 as usize..c1 as usize].copy_from_slice(&row);
                }
            }
        }

        let mut keys = vec![String::new()];
        keys.extend(map.layers.iter().map(|layer| layer.name.clone()));

        Ok(FeatureGrid {
            cell_size: CELL_SIZE,
            cols,
            rows,
            keys,
            cells,
        })
    }

    fn save(&self, image: &Self::Image, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(image)?;
        std::fs::write(path, json)
            .map_err(|e| Error::Render(format!("cannot write {}: {e}", path.display())))
    }
}

/// Whether a display item covers the given device point
fn covers(item: &DisplayItem, x: f64, y: f64) -> bool {
    match item {
        DisplayItem::Circle {
            cx,
            cy,
            radius,
            stroke_width,
            ..
        } => {
            let reach = radius + stroke_width / 2.0;
            (x - cx).powi(2) + (y - cy).powi(2) <= reach * reach
        }
        DisplayItem::PolyLine { points, width, .. } => {
            let reach = (width / 2.0).max(0.5);
            points
                .windows(2)
                .any(|seg| segment_distance(seg[0], seg[1], (x, y)) <= reach)
        }
        DisplayItem::Polygon {
            rings,
            stroke_width,
            ..
        } => {
            if point_in_rings(rings, x, y) {
                return true;
            }
            let reach = (stroke_width / 2.0).max(0.5);
            rings.iter().any(|ring| {
                ring.windows(2)
                    .any(|seg| segment_distance(seg[0], seg[1], (x, y)) <= reach)
            })
        }
    }
}

/// Distance from a point to a line segment
fn segment_distance(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
    let (ax, ay) = a;
    let (bx, by) = b;
    let (px, py) = p;
    let (dx, dy) = (bx - ax, by - ay);
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Even-odd test against all rings, so holes subtract
fn point_in_rings(rings: &[Vec<(f64, f64)>], x: f64, y: f64) -> bool {
    let mut inside = false;
    for ring in rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = ring[i];
            let (xj, yj) = ring[j];
            if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
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
                        "name": "water",
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
        // The polygon covers roughly the middle of a ~2200 m extent.
        let extent = Extent::from_coords(-1100.0, -1100.0, 1100.0, 1100.0);
        Map::from_style("t", &sheet, extent, MapSize::new(64.0, 64.0), 72.0)
    }

    #[test]
    fn test_center_cells_hit_the_layer() {
        let map = test_map();
        let grid = GridRenderer.render(&map, 1.0).unwrap();

        assert_eq!(grid.cols, 16);
        assert_eq!(grid.rows, 16);
        assert_eq!(grid.keys, vec!["".to_string(), "water".to_string()]);
        // Center cell covered, corner cell empty.
        assert_eq!(grid.cells[8][8], 1);
        assert_eq!(grid.cells[0][0], 0);
    }

    #[test]
    fn test_tiled_grid_matches_untiled() {
        let map = test_map();
        let whole = GridRenderer.render(&map, 1.0).unwrap();
        let tiled = GridRenderer
            .render_tiled(&map, TileGrid::new(2, 2), 1.0)
            .unwrap();
        assert_eq!(whole, tiled);
    }

    #[test]
    fn test_grid_json_round_trip() {
        let map = test_map();
        let grid = GridRenderer.render(&map, 1.0).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        let back: FeatureGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_point_in_rings_respects_holes() {
        let outer = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let hole = vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)];
        let rings = vec![outer, hole];

        assert!(point_in_rings(&rings, 2.0, 2.0));
        assert!(!point_in_rings(&rings, 5.0, 5.0));
        assert!(!point_in_rings(&rings, 12.0, 5.0));
    }
}
