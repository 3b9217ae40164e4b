//! The sequential batch runner.
//!
//! Each test case is one (style, envelope, size, scale factor, tile grid,
//! backend) combination. Cases run strictly one after another; a failure is
//! terminal for its own case only and is aggregated into the report.

pub mod report;

use crate::core::constants::EARTH_CIRCUMFERENCE;
use crate::core::extent::Extent;
use crate::core::geo::LatLng;
use crate::core::page::MapSize;
use crate::core::resolver::resolve;
use crate::map::Map;
use crate::render::{RenderResult, Renderer, ResultState, TileGrid};
use crate::runner::report::Report;
use crate::style::StyleSheet;
use crate::Result;
use std::path::{Path, PathBuf};

/// Parameters of the print mode: the resolver derives the extent and the
/// symbology scale factor from a page description instead of an envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintOptions {
    /// Page center, WGS84 lon/lat
    pub center: LatLng,
    /// Cartographic scale, e.g. 50000 for 1:50000
    pub scale_denominator: f64,
    /// Physical page size in meters
    pub page_size: MapSize,
    /// Tile-pyramid zoom level the symbology was authored for
    pub zoom: u32,
    /// Raster output resolution
    pub dpi: f64,
}

/// The fixed, upfront-known batch of renders to execute
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    /// Output sizes in pixels (envelope mode); ignored in print mode
    pub sizes: Vec<MapSize>,
    pub scale_factors: Vec<f64>,
    /// Explicit envelopes; empty means the style's default extent, or the
    /// whole Web Mercator world if the style has none
    pub envelopes: Vec<Extent>,
    pub tiles: Vec<TileGrid>,
    pub iterations: usize,
    pub print: Option<PrintOptions>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./"),
            sizes: vec![MapSize::new(800.0, 600.0)],
            scale_factors: vec![1.0],
            envelopes: Vec::new(),
            tiles: vec![TileGrid::single()],
            iterations: 1,
            print: None,
        }
    }
}

/// The square Web Mercator world
fn world_extent() -> Extent {
    let half = EARTH_CIRCUMFERENCE / 2.0;
    Extent::from_coords(-half, -half, half, half)
}

pub struct Runner {
    config: RunConfig,
    renderers: Vec<Renderer>,
}

impl Runner {
    pub fn new(config: RunConfig, renderers: Vec<Renderer>) -> Self {
        Self { config, renderers }
    }

    /// Runs every test case for the given style files, feeding each result
    /// to the report as it completes. A style file that cannot be loaded
    /// aborts the run; everything else fails only its own case.
    pub fn run(&self, styles: &[PathBuf], report: &mut Report) -> Result<Vec<RenderResult>> {
        let mut results = Vec::new();
        for path in styles {
            self.run_style(path, report, &mut results)?;
        }
        Ok(results)
    }

    fn run_style(
        &self,
        path: &Path,
        report: &mut Report,
        results: &mut Vec<RenderResult>,
    ) -> Result<()> {
        let sheet = StyleSheet::load(path)?;
        let base_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        log::info!("testing style {base_name}");

        // Print mode resolves one extent per style; envelope mode iterates
        // the configured envelope list.
        let (extents, print_scale, size_dpi) = match self.config.print {
            Some(print) => {
                let resolved = resolve(
                    print.center,
                    print.scale_denominator,
                    print.page_size,
                    print.zoom,
                    print.dpi,
                )?;
                (
                    vec![resolved.extent],
                    resolved.scale_factor,
                    Some((print.page_size.meters_to_points(), print.dpi)),
                )
            }
            None => {
                let extents = if !self.config.envelopes.is_empty() {
                    self.config.envelopes.clone()
                } else {
                    vec![sheet.default_extent().unwrap_or_else(world_extent)]
                };
                (extents, 1.0, None)
            }
        };

        let sizes: Vec<(MapSize, f64)> = match size_dpi {
            // The page geometry is fixed; dpi only affects raster buffers.
            Some((points, dpi)) => vec![(points, dpi)],
            // Pixel sizes render at native resolution, one point per pixel.
            None => self.config.sizes.iter().map(|s| (*s, 72.0)).collect(),
        };

        for (extent_index, extent) in extents.iter().enumerate() {
            let name = if extents.len() > 1 {
                format!("{base_name}-box{}", extent_index + 1)
            } else {
                base_name.clone()
            };
            for (size, dpi) in &sizes {
                for cli_scale in &self.config.scale_factors {
                    let scale_factor = cli_scale * print_scale;
                    let map = Map::from_style(&name, &sheet, *extent, *size, *dpi);
                    for tiles in &self.config.tiles {
                        for renderer in &self.renderers {
                            if !tiles.is_single() && !renderer.supports_tiles() {
                                continue;
                            }
                            let result = self.run_case(renderer, &map, *tiles, scale_factor);
                            report.add(&result);
                            results.push(result);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn run_case(
        &self,
        renderer: &Renderer,
        map: &Map,
        tiles: TileGrid,
        scale_factor: f64,
    ) -> RenderResult {
        let outcome = renderer.render_to_file(
            map,
            tiles,
            scale_factor,
            &self.config.output_dir,
            self.config.iterations,
        );

        let mut result = RenderResult {
            state: ResultState::Ok,
            name: map.name.clone(),
            renderer_name: renderer.name(),
            scale_factor,
            size: renderer.device_size(map),
            tiles,
            image_path: None,
            iterations: self.config.iterations.max(1),
            duration: std::time::Duration::ZERO,
            error: None,
        };
        match outcome {
            Ok((path, duration)) => {
                result.image_path = Some(path);
                result.duration = duration;
            }
            Err(e) => {
                log::warn!("{} failed for {}: {e}", renderer.name(), map.name);
                result.state = ResultState::Fail;
                result.error = Some(e.to_string());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_extent_is_square_and_centered() {
        let world = world_extent();
        assert!(world.is_valid());
        assert!((world.width() - world.height()).abs() < 1e-6);
        assert!(world.center().x.abs() < 1e-9);
        // Half the equatorial circumference on each side of the origin.
        assert!((world.max.x - 20_037_508.34).abs() < 0.01);
    }

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.scale_factors, vec![1.0]);
        assert_eq!(config.iterations, 1);
        assert_eq!(config.tiles, vec![TileGrid::single()]);
        assert!(config.print.is_none());
    }
}
