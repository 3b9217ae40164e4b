use crate::core::geo::Point;
use crate::core::page::MapSize;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An axis-aligned rectangle in projected map coordinates.
///
/// An extent is mutated only while the resolver constructs it (scale, then
/// recenter); afterwards it is treated as an immutable description of the
/// area a rendered map covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: Point,
    pub max: Point,
}

impl Extent {
    /// Creates a new extent from two corner points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates an extent from individual coordinates
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// Creates an extent anchored at `origin` spanning `size`
    pub fn from_origin_and_size(origin: Point, size: MapSize) -> Self {
        Self::new(origin, Point::new(origin.x + size.width, origin.y + size.height))
    }

    /// Gets the width of the extent
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Gets the height of the extent
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Gets the size of the extent
    pub fn size(&self) -> MapSize {
        MapSize::new(self.width(), self.height())
    }

    /// Gets the center point of the extent
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Checks that the extent is non-degenerate (min < max on both axes)
    pub fn is_valid(&self) -> bool {
        self.min.x < self.max.x && self.min.y < self.max.y
    }

    /// Returns the extent scaled by `factor` about its center
    pub fn scaled(&self, factor: f64) -> Extent {
        let center = self.center();
        let half_width = self.width() * factor / 2.0;
        let half_height = self.height() * factor / 2.0;
        Self::new(
            Point::new(center.x - half_width, center.y - half_height),
            Point::new(center.x + half_width, center.y + half_height),
        )
    }

    /// Returns the extent translated so that its centroid equals `center`
    pub fn recentered_on(&self, center: Point) -> Extent {
        let shift = center.subtract(&self.center());
        Self::new(self.min.add(&shift), self.max.add(&shift))
    }

    /// Returns the sub-extent covering a fractional device window. Fractions
    /// are in `[0, 1]` with y measured from the top, matching raster
    /// scanline order, so windows derived from pixel boundaries composite
    /// back into the untiled image exactly.
    pub fn window(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Extent {
        Self::from_coords(
            self.min.x + self.width() * x0,
            self.max.y - self.height() * y1,
            self.min.x + self.width() * x1,
            self.max.y - self.height() * y0,
        )
    }

    /// Returns the sub-extent of cell `(col, row)` in a `cols x rows` tile
    /// grid. Row 0 is the top row.
    pub fn tile(&self, col: u32, row: u32, cols: u32, rows: u32) -> Extent {
        debug_assert!(col < cols && row < rows);
        self.window(
            col as f64 / cols as f64,
            row as f64 / rows as f64,
            (col + 1) as f64 / cols as f64,
            (row + 1) as f64 / rows as f64,
        )
    }
}

impl FromStr for Extent {
    type Err = crate::Error;

    /// Parses a bounding box string in map coordinates, as used by the
    /// `--envelope` option. Accepts comma or whitespace separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<f64>()
                    .map_err(|_| crate::Error::ParseError(format!("invalid envelope: {s:?}")))
            })
            .collect::<Result<_, _>>()?;
        if parts.len() != 4 {
            return Err(crate::Error::ParseError(format!(
                "envelope needs four coordinates, got {}: {s:?}",
                parts.len()
            )));
        }
        let extent = Extent::from_coords(parts[0], parts[1], parts[2], parts[3]);
        if !extent.is_valid() {
            return Err(crate::Error::ParseError(format!(
                "degenerate envelope: {s:?}"
            )));
        }
        Ok(extent)
    }
}
