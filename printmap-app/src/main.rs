use clap::Parser;
use printmap::{
    core::{extent::Extent, geo::LatLng, page::MapSize},
    render::{Renderer, TileGrid},
    runner::{report::Report, PrintOptions, RunConfig, Runner},
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Render and benchmark map styles across rendering backends
#[derive(Parser)]
#[command(name = "printmap", version, about, long_about = None)]
struct Cli {
    /// Style definition files to test
    #[arg(required = true)]
    styles: Vec<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output rendering duration
    #[arg(short, long)]
    duration: bool,

    /// Number of iterations for benchmarking
    #[arg(short, long, default_value_t = 1)]
    iterations: usize,

    /// Directory for output files
    #[arg(long, default_value = "./")]
    output_dir: PathBuf,

    /// Font search path
    #[arg(long, default_value = "fonts")]
    fonts: PathBuf,

    /// Input plugins search path
    #[arg(long, default_value = "plugins/input")]
    plugins: PathBuf,

    /// Log level (debug, warn, error, none)
    #[arg(long, default_value = "warn")]
    log: String,

    /// Scale factor (repeatable)
    #[arg(short = 's', long = "scale-factor", default_values_t = [1.0])]
    scale_factor: Vec<f64>,

    /// Bounding box in map coordinates, "minx,miny,maxx,maxy" (repeatable)
    #[arg(long)]
    envelope: Vec<Extent>,

    /// Size of output images in pixels, "WxH" (repeatable)
    #[arg(long)]
    size: Vec<MapSize>,

    /// Tile grid "NxM" for tile-capable backends (repeatable)
    #[arg(long)]
    tiles: Vec<TileGrid>,

    /// Render with the pixmap (PNG) backend
    #[arg(long)]
    pixmap: bool,

    /// Render with the SVG backend
    #[cfg(feature = "svg")]
    #[arg(long)]
    svg: bool,

    /// Render with the PostScript backend
    #[cfg(feature = "ps")]
    #[arg(long)]
    ps: bool,

    /// Render with the PDF backend
    #[cfg(feature = "pdf")]
    #[arg(long)]
    pdf: bool,

    /// Render with the feature-grid backend
    #[cfg(feature = "grid")]
    #[arg(long)]
    grid: bool,

    /// Page center as "lon,lat"; enables print mode
    #[arg(long)]
    center: Option<LatLng>,

    /// Cartographic scale denominator, e.g. 50000 for 1:50000
    #[arg(long)]
    scale_denominator: Option<f64>,

    /// Physical page size in meters, "WxH", e.g. 0.297x0.210 for A4
    #[arg(long)]
    page_size: Option<MapSize>,

    /// Tile-pyramid zoom level the styles were authored for (print mode)
    #[arg(long, default_value_t = 10)]
    zoom: u32,

    /// Raster output resolution in dots per inch
    #[arg(long, default_value_t = 96.0)]
    dpi: f64,
}

impl Cli {
    fn renderers(&self) -> Vec<Renderer> {
        let mut renderers = Vec::new();
        if self.pixmap {
            renderers.push(Renderer::Pixmap(Default::default()));
        }
        #[cfg(feature = "grid")]
        if self.grid {
            renderers.push(Renderer::Grid(Default::default()));
        }
        #[cfg(feature = "svg")]
        if self.svg {
            renderers.push(Renderer::Svg(Default::default()));
        }
        #[cfg(feature = "ps")]
        if self.ps {
            renderers.push(Renderer::Ps(Default::default()));
        }
        #[cfg(feature = "pdf")]
        if self.pdf {
            renderers.push(Renderer::Pdf(Default::default()));
        }
        if renderers.is_empty() {
            renderers.push(Renderer::Pixmap(Default::default()));
        }
        renderers
    }

    fn print_options(&self) -> Result<Option<PrintOptions>, String> {
        match (self.center, self.scale_denominator, self.page_size) {
            (None, None, None) => Ok(None),
            (Some(center), Some(scale_denominator), Some(page_size)) => Ok(Some(PrintOptions {
                center,
                scale_denominator,
                page_size,
                zoom: self.zoom,
                dpi: self.dpi,
            })),
            _ => Err(
                "print mode needs --center, --scale-denominator and --page-size together"
                    .to_string(),
            ),
        }
    }
}

fn init_logging(level: &str) -> Result<(), String> {
    let filter = match level {
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "none" => log::LevelFilter::Off,
        other => return Err(format!("unknown log level: {other}")),
    };
    env_logger::Builder::new().filter_level(filter).init();
    Ok(())
}

/// Search paths are external collaborators: they are validated and logged
/// here, never consulted as ambient global state by the library.
fn register_search_path(kind: &str, path: &std::path::Path) {
    if path.is_dir() {
        log::info!("registered {kind} search path {}", path.display());
    } else {
        log::debug!("{kind} search path {} not found, skipping", path.display());
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(message) = init_logging(&cli.log) {
        eprintln!("Error: {message}");
        return ExitCode::FAILURE;
    }
    register_search_path("font", &cli.fonts);
    register_search_path("plugin", &cli.plugins);

    let print = match cli.print_options() {
        Ok(print) => print,
        Err(message) => {
            eprintln!("Error: {message}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = RunConfig {
        output_dir: cli.output_dir.clone(),
        scale_factors: cli.scale_factor.clone(),
        envelopes: cli.envelope.clone(),
        iterations: cli.iterations,
        print,
        ..RunConfig::default()
    };
    if !cli.size.is_empty() {
        config.sizes = cli.size.clone();
    }
    if !cli.tiles.is_empty() {
        config.tiles = cli.tiles.clone();
    }

    let runner = Runner::new(config, cli.renderers());
    let mut report = if cli.verbose {
        Report::console(cli.duration)
    } else {
        Report::short(cli.duration)
    };

    match runner.run(&cli.styles, &mut report) {
        Ok(results) => {
            let failed = report.summarize(&results);
            ExitCode::from(failed.min(u8::MAX as usize) as u8)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
