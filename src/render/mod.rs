//! Rendering backends, dispatch, and output naming.
//!
//! Backends come in two capability sets. Raster backends produce a
//! fixed-size image that can be rendered once per tile and composited;
//! vector backends produce a whole-page serialized document in a single
//! pass. Which backends exist is fixed at build time through Cargo
//! features; selection among the compiled-in set happens at startup.

use crate::core::page::MapSize;
use crate::map::Map;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod pixmap;

#[cfg(feature = "grid")]
pub mod grid;
#[cfg(feature = "pdf")]
pub mod pdf;
#[cfg(feature = "ps")]
pub mod ps;
#[cfg(feature = "svg")]
pub mod svg;

/// A tile subdivision of the output, `cols x rows`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub cols: u32,
    pub rows: u32,
}

impl TileGrid {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    pub fn single() -> Self {
        Self::new(1, 1)
    }

    pub fn is_single(&self) -> bool {
        self.cols == 1 && self.rows == 1
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::single()
    }
}

impl std::fmt::Display for TileGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

impl FromStr for TileGrid {
    type Err = Error;

    /// Parses a `"NxM"` tile grid as used by the `--tiles` option
    fn from_str(s: &str) -> Result<Self> {
        let (cols, rows) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| Error::ParseError(format!("expected NxM, got {s:?}")))?;
        let cols = cols
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::ParseError(format!("invalid tile grid: {s:?}")))?;
        let rows = rows
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::ParseError(format!("invalid tile grid: {s:?}")))?;
        if cols == 0 || rows == 0 {
            return Err(Error::ParseError(format!(
                "tile grid must be at least 1x1: {s:?}"
            )));
        }
        Ok(Self::new(cols, rows))
    }
}

/// Backends producing a fixed-size image that supports per-tile rendering
pub trait RasterBackend {
    const NAME: &'static str;
    const EXT: &'static str;

    type Image;

    /// Renders the whole page in one pass
    fn render(&self, map: &Map, scale_factor: f64) -> Result<Self::Image>;

    /// Renders the page one tile at a time and composites the result
    fn render_tiled(&self, map: &Map, tiles: TileGrid, scale_factor: f64) -> Result<Self::Image>;

    fn save(&self, image: &Self::Image, path: &Path) -> Result<()>;
}

/// Backends producing a whole-page serialized document in a single pass
pub trait VectorBackend {
    const NAME: &'static str;
    const EXT: &'static str;

    /// Renders the page into an in-memory byte stream. The document's
    /// embedded page size matches the map size at 72 points per inch.
    fn render(&self, map: &Map, scale_factor: f64) -> Result<Vec<u8>>;

    fn save(&self, image: &[u8], path: &Path) -> Result<()> {
        std::fs::write(path, image).map_err(|e| {
            Error::Render(format!("cannot write {}: {e}", path.display()))
        })
    }
}

/// Pass/fail state of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultState {
    Ok,
    Fail,
}

/// One record per rendered (test, backend, size, tiles, scale factor)
/// combination. Created once per invocation, never mutated, consumed by
/// the report.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub state: ResultState,
    pub name: String,
    pub renderer_name: &'static str,
    pub scale_factor: f64,
    pub size: MapSize,
    pub tiles: TileGrid,
    pub image_path: Option<PathBuf>,
    pub iterations: usize,
    pub duration: std::time::Duration,
    pub error: Option<String>,
}

impl RenderResult {
    /// Average duration of one render iteration
    pub fn average_duration(&self) -> std::time::Duration {
        if self.iterations == 0 {
            self.duration
        } else {
            self.duration / self.iterations as u32
        }
    }
}

/// Formats a device dimension for a file name: the nominal size divided by
/// the scale factor, trimmed to at most two decimals so names stay stable
/// and readable.
fn format_dimension(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}")
}

/// Builds the deterministic output file name:
/// `<test>-<width>-<height>[-<tilesXxtilesY>]-<scale:1dp>-<backend><ext>`
/// where width and height are the rendered size divided by the scale
/// factor. Two runs with identical parameters produce identical names,
/// which makes output artifacts diffable across runs and backends.
pub fn image_file_name(
    test_name: &str,
    size: MapSize,
    tiles: TileGrid,
    scale_factor: f64,
    renderer_name: &str,
    ext: &str,
) -> String {
    let mut name = format!(
        "{}-{}-{}-",
        test_name,
        format_dimension(size.width / scale_factor),
        format_dimension(size.height / scale_factor)
    );
    if !tiles.is_single() {
        name.push_str(&format!("{tiles}-"));
    }
    name.push_str(&format!("{scale_factor:.1}-{renderer_name}{ext}"));
    name
}

/// The set of backends compiled into this build, selectable at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Pixmap(pixmap::PixmapRenderer),
    #[cfg(feature = "grid")]
    Grid(grid::GridRenderer),
    #[cfg(feature = "svg")]
    Svg(svg::SvgRenderer),
    #[cfg(feature = "ps")]
    Ps(ps::PsRenderer),
    #[cfg(feature = "pdf")]
    Pdf(pdf::PdfRenderer),
}

impl Renderer {
    pub fn name(&self) -> &'static str {
        match self {
            Renderer::Pixmap(_) => pixmap::PixmapRenderer::NAME,
            #[cfg(feature = "grid")]
            Renderer::Grid(_) => grid::GridRenderer::NAME,
            #[cfg(feature = "svg")]
            Renderer::Svg(_) => svg::SvgRenderer::NAME,
            #[cfg(feature = "ps")]
            Renderer::Ps(_) => ps::PsRenderer::NAME,
            #[cfg(feature = "pdf")]
            Renderer::Pdf(_) => pdf::PdfRenderer::NAME,
        }
    }

    pub fn ext(&self) -> &'static str {
        match self {
            Renderer::Pixmap(_) => pixmap::PixmapRenderer::EXT,
            #[cfg(feature = "grid")]
            Renderer::Grid(_) => grid::GridRenderer::EXT,
            #[cfg(feature = "svg")]
            Renderer::Svg(_) => svg::SvgRenderer::EXT,
            #[cfg(feature = "ps")]
            Renderer::Ps(_) => ps::PsRenderer::EXT,
            #[cfg(feature = "pdf")]
            Renderer::Pdf(_) => pdf::PdfRenderer::EXT,
        }
    }

    /// Whether the backend can be invoked once per tile. Vector documents
    /// represent the whole page in one pass.
    pub fn supports_tiles(&self) -> bool {
        match self {
            Renderer::Pixmap(_) => true,
            #[cfg(feature = "grid")]
            Renderer::Grid(_) => true,
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }

    /// The device size the backend renders at: pixel dimensions for the
    /// raster family, point dimensions for vector documents.
    pub fn device_size(&self, map: &Map) -> MapSize {
        match self {
            Renderer::Pixmap(_) => {
                let (w, h) = map.pixel_size();
                MapSize::new(w as f64, h as f64)
            }
            #[cfg(feature = "grid")]
            Renderer::Grid(_) => {
                let (w, h) = map.pixel_size();
                MapSize::new(w as f64, h as f64)
            }
            #[allow(unreachable_patterns)]
            _ => map.size,
        }
    }

    /// Renders one test case `iterations` times for benchmarking, persists
    /// the final image under `output_dir` (creating the directory if
    /// needed), and returns the output path together with the rendering
    /// time summed over all iterations. Saving is excluded from the timing.
    pub fn render_to_file(
        &self,
        map: &Map,
        tiles: TileGrid,
        scale_factor: f64,
        output_dir: &Path,
        iterations: usize,
    ) -> Result<(PathBuf, std::time::Duration)> {
        std::fs::create_dir_all(output_dir)?;
        let file_name = image_file_name(
            &map.name,
            self.device_size(map),
            tiles,
            scale_factor,
            self.name(),
            self.ext(),
        );
        let path = output_dir.join(file_name);
        let iterations = iterations.max(1);

        let duration = match self {
            Renderer::Pixmap(backend) => {
                let (image, duration) = timed_raster(backend, map, tiles, scale_factor, iterations)?;
                backend.save(&image, &path)?;
                duration
            }
            #[cfg(feature = "grid")]
            Renderer::Grid(backend) => {
                let (image, duration) = timed_raster(backend, map, tiles, scale_factor, iterations)?;
                backend.save(&image, &path)?;
                duration
            }
            #[cfg(feature = "svg")]
            Renderer::Svg(backend) => {
                let (image, duration) = timed_vector(backend, map, scale_factor, iterations)?;
                backend.save(&image, &path)?;
                duration
            }
            #[cfg(feature = "ps")]
            Renderer::Ps(backend) => {
                let (image, duration) = timed_vector(backend, map, scale_factor, iterations)?;
                backend.save(&image, &path)?;
                duration
            }
            #[cfg(feature = "pdf")]
            Renderer::Pdf(backend) => {
                let (image, duration) = timed_vector(backend, map, scale_factor, iterations)?;
                backend.save(&image, &path)?;
                duration
            }
        };

        Ok((path, duration))
    }
}

fn timed_raster<B: RasterBackend>(
    backend: &B,
    map: &Map,
    tiles: TileGrid,
    scale_factor: f64,
    iterations: usize,
) -> Result<(B::Image, std::time::Duration)> {
    let start = std::time::Instant::now();
    let mut image = raster_pass(backend, map, tiles, scale_factor)?;
    for _ in 1..iterations {
        image = raster_pass(backend, map, tiles, scale_factor)?;
    }
    Ok((image, start.elapsed()))
}

fn raster_pass<B: RasterBackend>(
    backend: &B,
    map: &Map,
    tiles: TileGrid,
    scale_factor: f64,
) -> Result<B::Image> {
    if tiles.is_single() {
        backend.render(map, scale_factor)
    } else {
        backend.render_tiled(map, tiles, scale_factor)
    }
}

fn timed_vector<B: VectorBackend>(
    backend: &B,
    map: &Map,
    scale_factor: f64,
    iterations: usize,
) -> Result<(Vec<u8>, std::time::Duration)> {
    let start = std::time::Instant::now();
    let mut image = backend.render(map, scale_factor)?;
    for _ in 1..iterations {
        image = backend.render(map, scale_factor)?;
    }
    Ok((image, start.elapsed()))
}
