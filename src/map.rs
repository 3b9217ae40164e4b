//! The immutable map definition consumed by every rendering backend.

use crate::core::extent::Extent;
use crate::core::page::MapSize;
use crate::style::{Color, StyleLayer, StyleSheet};

/// Everything a backend needs to render one test case: the page geometry,
/// the projected extent it covers, and the styled content.
///
/// A map is read-only once constructed; backends share it by reference and
/// never mutate it.
#[derive(Debug, Clone)]
pub struct Map {
    /// Test name, used for output file naming
    pub name: String,
    /// Page size in print points (72 per inch)
    pub size: MapSize,
    /// Raster output resolution; vector backends always emit at 72 pt/in
    pub dpi: f64,
    /// The projected area the page covers
    pub extent: Extent,
    pub background: Color,
    pub layers: Vec<StyleLayer>,
}

impl Map {
    /// Builds a map definition from a loaded style sheet
    pub fn from_style(
        name: impl Into<String>,
        sheet: &StyleSheet,
        extent: Extent,
        size: MapSize,
        dpi: f64,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            dpi,
            extent,
            background: sheet.background,
            layers: sheet.layers.clone(),
        }
    }

    /// Pixel dimensions of the raster output for this map
    pub fn pixel_size(&self) -> (u32, u32) {
        self.size.to_pixels(self.dpi)
    }
}
