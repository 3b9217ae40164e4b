//! # printmap
//!
//! A print and benchmark harness for cartographic rendering backends.
//!
//! Given map style definitions, printmap resolves a geographic center, scale
//! denominator, and physical page size into a projected map extent, renders
//! the styled map through one or more backends (raster pixmap, SVG, PS, PDF,
//! feature grid), and writes deterministically named output files together
//! with a timing report.

pub mod core;
pub mod map;
pub mod render;
pub mod runner;
pub mod scene;
pub mod style;

// Re-export public API
pub use crate::core::{
    extent::Extent,
    geo::{LatLng, Point},
    page::MapSize,
    resolver::{resolve, Resolved},
};

pub use crate::map::Map;
pub use crate::render::{Renderer, RenderResult, ResultState};
pub use crate::runner::{report::Report, RunConfig, Runner};
pub use crate::style::StyleSheet;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Style error: {0}")]
    Style(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
