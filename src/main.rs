use clap::{Parser, Subcommand};
use managed_image::config::{self, ConfigError};
use managed_image::engine::VariantEngine;
use managed_image::handlers::{self, FillAtParams, ReframeParams, ShowParams, SizeParams};
use managed_image::naming;
use managed_image::output;
use managed_image::storage::LocalStorage;
use managed_image::variant::VariantDescriptor;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "managed-image")]
#[command(about = "Content-addressed originals with authenticated, lazily generated variants")]
#[command(long_about = "\
Content-addressed originals with authenticated, lazily generated variants

Originals are stored as {dir}/{sha256}-{width}-{height}.{ext}. Every variant
is named by its original plus target size and crop window in percent:

  {dir}/{sha256}-{w}-{h}-{vw}-{vh}-{x1}-{x2}-{y1}-{y2}.{ext}

Resize commands print a variant URL carrying ?q={digest}. Nothing is
rendered until 'show' is asked for that path with that digest. A path with
the wrong digest is only served if its bytes already exist.

Run 'managed-image gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Original path plus target box.
#[derive(clap::Args, Clone)]
struct SizeArgs {
    /// Canonical path of the original
    image: String,
    width: i64,
    height: i64,
}

impl SizeArgs {
    fn params(&self) -> SizeParams {
        SizeParams {
            image: self.image.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Store an image file as an original
    Ingest {
        file: PathBuf,
        /// Directory to store under, e.g. site/abc
        #[arg(long)]
        dir: String,
    },
    /// Stretch to exact dimensions
    Resize(SizeArgs),
    /// Fit inside the box, preserving aspect ratio
    Fit(SizeArgs),
    /// Fill the box, cropping around an anchor
    Fill {
        #[command(flatten)]
        size: SizeArgs,
        /// Horizontal anchor in percent
        #[arg(long, default_value_t = 50.0)]
        x: f64,
        /// Vertical anchor in percent
        #[arg(long, default_value_t = 50.0)]
        y: f64,
    },
    /// Explicit crop window in integer percent
    Reframe {
        #[command(flatten)]
        size: SizeArgs,
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
    },
    /// Fetch (and generate if authorized) a variant's bytes
    Show {
        /// Canonical variant path
        path: String,
        /// Digest from the variant URL's q parameter
        #[arg(long, default_value = "")]
        q: String,
        /// Where to write the bytes (default: the path's file name)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate fit variants of an original in parallel
    Warm {
        image: String,
        /// Target boxes as WIDTHxHEIGHT
        #[arg(required = true, value_parser = parse_size)]
        sizes: Vec<(u32, u32)>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Ingest { file, dir } => {
            let engine = open_engine(&cli.config)?;
            let bytes = std::fs::read(&file)?;
            let filename = file
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            let original = engine.ingest(&dir, &filename, &bytes)?;
            if cli.json {
                output::print_json(&original)?;
            } else {
                output::print_original(&original);
            }
        }
        Command::Resize(size) => {
            let engine = open_engine(&cli.config)?;
            let d = handlers::resize(&engine, &size.params())?;
            print_descriptor(&d, cli.json)?;
        }
        Command::Fit(size) => {
            let engine = open_engine(&cli.config)?;
            let d = handlers::resize_to_fit(&engine, &size.params())?;
            print_descriptor(&d, cli.json)?;
        }
        Command::Fill { size, x, y } => {
            let engine = open_engine(&cli.config)?;
            let params = FillAtParams {
                image: size.image,
                width: size.width,
                height: size.height,
                x,
                y,
            };
            let d = handlers::resize_to_fill_at(&engine, &params)?;
            print_descriptor(&d, cli.json)?;
        }
        Command::Reframe {
            size,
            x1,
            y1,
            x2,
            y2,
        } => {
            let engine = open_engine(&cli.config)?;
            let params = ReframeParams {
                image: size.image,
                width: size.width,
                height: size.height,
                x1,
                x2,
                y1,
                y2,
            };
            let d = handlers::reframe(&engine, &params)?;
            print_descriptor(&d, cli.json)?;
        }
        Command::Show { path, q, out } => {
            let engine = open_engine(&cli.config)?;
            let delivery = handlers::show(&engine, &ShowParams { path: path.clone(), q })?;
            let dest = out.unwrap_or_else(|| {
                let (_, stem, ext) = naming::split_path(&path);
                PathBuf::from(format!("{}{}", stem, ext))
            });
            std::fs::write(&dest, &delivery.bytes)?;
            println!(
                "{}",
                output::format_delivery(&delivery, &dest.display().to_string())
            );
        }
        Command::Warm { image, sizes } => {
            let engine = open_engine(&cli.config)?;
            let original = engine.original(&image)?;
            let variants = sizes
                .iter()
                .map(|&(w, h)| original.resize_to_fit(w, h))
                .collect::<Result<Vec<_>, _>>()?;
            let report = engine.warm(&variants);
            output::print_warm_report(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config, size the thread pool, and open the local engine.
fn open_engine(path: &Path) -> Result<VariantEngine<LocalStorage>, ConfigError> {
    let config = config::load_config(path)?;
    init_thread_pool(&config.processing);
    VariantEngine::from_config(&config)
}

fn print_descriptor(d: &VariantDescriptor, json: bool) -> Result<(), serde_json::Error> {
    if json {
        output::print_json(d)
    } else {
        output::print_descriptor(d);
        Ok(())
    }
}

/// Parse `WIDTHxHEIGHT`.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", s))?;
    let parse = |v: &str| {
        v.parse::<u32>()
            .map_err(|e| format!("bad dimension {:?}: {}", v, e))
    };
    Ok((parse(w)?, parse(h)?))
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
