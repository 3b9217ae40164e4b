//! Map style definitions.
//!
//! A style sheet is a JSON document naming a background color, an optional
//! default extent (Web Mercator), and a list of layers. Each layer holds
//! geographic features (WGS84 lon/lat coordinates, GeoJSON axis order)
//! together with their point/line/polygon symbology.

use crate::core::extent::Extent;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An RGBA color, serialized as `#rrggbb` or `#rrggbbaa` hex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Parses a `#rrggbb` or `#rrggbbaa` hex color
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 && hex.len() != 8 {
            return Err(Error::ParseError(format!("invalid color: {s:?}")));
        }
        let byte = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| Error::ParseError(format!("invalid color: {s:?}")))
        };
        Ok(Self {
            r: byte(0..2)?,
            g: byte(2..4)?,
            b: byte(4..6)?,
            a: if hex.len() == 8 { byte(6..8)? } else { 255 },
        })
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Color::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Style for point features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointStyle {
    /// Fill color
    pub fill_color: Color,
    /// Border color
    pub stroke_color: Color,
    /// Border width
    pub stroke_width: f32,
    /// Point radius
    pub radius: f32,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            fill_color: Color::rgb(255, 0, 0),
            stroke_color: Color::rgb(255, 255, 255),
            stroke_width: 2.0,
            radius: 5.0,
        }
    }
}

/// Style for line features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineStyle {
    /// Line color
    pub color: Color,
    /// Line width
    pub width: f32,
    /// Line dash pattern (empty for solid line)
    pub dash_pattern: Vec<f32>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(0, 0, 255),
            width: 2.0,
            dash_pattern: Vec::new(),
        }
    }
}

/// Style for polygon features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonStyle {
    /// Fill color
    pub fill_color: Color,
    /// Border color
    pub stroke_color: Color,
    /// Border width
    pub stroke_width: f32,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            fill_color: Color::new(0, 255, 0, 100),
            stroke_color: Color::rgb(0, 200, 0),
            stroke_width: 2.0,
        }
    }
}

/// A styled geographic feature. Coordinates are WGS84 `[lng, lat]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Feature {
    Point {
        coordinates: [f64; 2],
        #[serde(default)]
        style: PointStyle,
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
        #[serde(default)]
        style: LineStyle,
    },
    Polygon {
        /// Outer ring followed by optional hole rings
        coordinates: Vec<Vec<[f64; 2]>>,
        #[serde(default)]
        style: PolygonStyle,
    },
}

/// A named group of features drawn in document order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleLayer {
    pub name: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// A complete map style document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    #[serde(default)]
    pub name: Option<String>,
    /// Page background color
    #[serde(default = "Color::white")]
    pub background: Color,
    /// Default envelope in Web Mercator coordinates, `[minx, miny, maxx, maxy]`
    #[serde(default)]
    pub extent: Option<[f64; 4]>,
    #[serde(default)]
    pub layers: Vec<StyleLayer>,
}

impl StyleSheet {
    /// Loads a style sheet from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| Error::Style(format!("{}: {e}", path.display())))
    }

    /// Parses a style sheet from a JSON string
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The style's default envelope, if it declares one
    pub fn default_extent(&self) -> Option<Extent> {
        self.extent
            .map(|[min_x, min_y, max_x, max_y]| Extent::from_coords(min_x, min_y, max_x, max_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        assert_eq!(Color::from_hex("#ff0000").unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(
            Color::from_hex("#00ff0080").unwrap(),
            Color::new(0, 255, 0, 128)
        );
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("red").is_err());
    }

    #[test]
    fn test_color_round_trip() {
        let color = Color::new(18, 52, 86, 255);
        assert_eq!(Color::from_hex(&color.to_hex()).unwrap(), color);

        let translucent = Color::new(18, 52, 86, 120);
        assert_eq!(Color::from_hex(&translucent.to_hex()).unwrap(), translucent);
    }

    #[test]
    fn test_style_sheet_parsing() {
        let sheet = StyleSheet::from_json(
            r##"{
                "name": "coastline",
                "background": "#e8f4ff",
                "extent": [-20000.0, -20000.0, 20000.0, 20000.0],
                "layers": [
                    {
                        "name": "water",
                        "features": [
                            {
                                "type": "Polygon",
                                "coordinates": [[[0.0, 0.0], [0.1, 0.0], [0.1, 0.1], [0.0, 0.1]]],
                                "style": {"fill_color": "#2a6fef"}
                            },
                            {"type": "Point", "coordinates": [0.05, 0.05]}
                        ]
                    }
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(sheet.name.as_deref(), Some("coastline"));
        assert_eq!(sheet.background, Color::rgb(232, 244, 255));
        assert_eq!(sheet.layers.len(), 1);
        assert_eq!(sheet.layers[0].features.len(), 2);
        assert!(sheet.default_extent().unwrap().is_valid());

        match &sheet.layers[0].features[0] {
            Feature::Polygon { style, .. } => {
                assert_eq!(style.fill_color, Color::rgb(42, 111, 239));
            }
            other => panic!("unexpected feature: {other:?}"),
        }
    }

    #[test]
    fn test_defaults_fill_in() {
        let sheet = StyleSheet::from_json(r#"{"layers": []}"#).unwrap();
        assert_eq!(sheet.background, Color::white());
        assert!(sheet.extent.is_none());
        assert!(sheet.name.is_none());
    }

    #[test]
    fn test_malformed_sheet_is_an_error() {
        assert!(StyleSheet::from_json("not json").is_err());
        assert!(StyleSheet::from_json(r#"{"background": "blue"}"#).is_err());
    }
}
