//! pyrblend - blend two overlapping images with a multi-band blender
//!
//! The second image is placed to the right of the first, shifted by a
//! fraction of its width, and the overlap is blended band by band.

use anyhow::{Context, Result};
use clap::Parser;
use pyrblend_ops::{blend_pair, BlendError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;

mod config;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "pyrblend")]
#[command(author, version, about = "Blend two overlapping images with a multi-band blender")]
#[command(long_about = "
Blends two images of equal size and type. The second image is placed
offset-ratio of its width to the right of the first one and the overlap is
blended with a Laplacian pyramid, giving a seam-free transition.

Examples:
  pyrblend left.png right.png                 # writes result.jpg
  pyrblend a.jpg b.jpg -o out.png -b 3
  pyrblend a.png b.png --offset-ratio 0.25 -v
  pyrblend a.png b.png --config blend.yaml

Exit codes: 0 ok, 1 size mismatch, 2 type mismatch, 3 other errors,
4 invalid arguments.
")]
struct Cli {
    /// First image (placed at the left edge)
    image1: PathBuf,

    /// Second image (placed offset-ratio of its width to the right)
    image2: PathBuf,

    /// Output image (format from extension: png, jpg)
    #[arg(short, long, default_value = "result.jpg")]
    output: PathBuf,

    /// Number of pyramid bands (reduced automatically for small images)
    #[arg(short, long)]
    bands: Option<u32>,

    /// Offset of the second image as a fraction of its width (0.0-1.0)
    #[arg(long)]
    offset_ratio: Option<f32>,

    /// JPEG quality (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Also write log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Process exit status for a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    SizeMismatch = 1,
    TypeMismatch = 2,
    Other = 3,
    Usage = 4,
}

impl Failure {
    fn classify(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<BlendError>() {
            Some(BlendError::DimensionMismatch { .. }) => Failure::SizeMismatch,
            Some(BlendError::FormatMismatch { .. }) => Failure::TypeMismatch,
            _ => Failure::Other,
        }
    }

    fn message(self, err: &anyhow::Error) -> String {
        match self {
            Failure::SizeMismatch => "Size of images does not match".to_string(),
            Failure::TypeMismatch => "Type of images does not match".to_string(),
            Failure::Other | Failure::Usage => format!("{err:#}"),
        }
    }
}

/// Exit status for a failed parse; `--help` and `--version` still succeed.
fn usage_status(err: &clap::Error) -> u8 {
    if err.use_stderr() { Failure::Usage as u8 } else { 0 }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap's own exit code for usage errors collides with TypeMismatch
            let _ = err.print();
            return ExitCode::from(usage_status(&err));
        }
    };
    match run(&cli) {
        Ok(()) => {
            eprintln!("Ok, blended image written to {}", cli.output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let failure = Failure::classify(&err);
            tracing::debug!(error = ?err, "Blend failed");
            eprintln!("{}", failure.message(&err));
            ExitCode::from(failure as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let _guard = init_logging(&config, cli.verbose, cli.log_file.as_deref())?;

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let mut options = config.pair;
    if let Some(bands) = cli.bands {
        options.blend.num_bands = bands;
    }
    if let Some(ratio) = cli.offset_ratio {
        options.offset_ratio = ratio;
    }
    let quality = cli.quality.unwrap_or(config.jpeg_quality);

    let image1 = read_image(&cli.image1)?;
    let image2 = read_image(&cli.image2)?;
    tracing::info!(
        width = image1.width(),
        height = image1.height(),
        channels = image1.channels(),
        format = %image1.format(),
        bands = options.blend.num_bands,
        offset_ratio = options.offset_ratio,
        "Blending"
    );

    let out = blend_pair(&image1, &image2, &options)?;

    let written = match pyrblend_io::Format::from_extension(&cli.output) {
        pyrblend_io::Format::Jpeg => {
            pyrblend_io::jpeg::write_with_quality(&cli.output, &out.image, quality)
        }
        _ => pyrblend_io::write(&cli.output, &out.image),
    };
    written.with_context(|| format!("Cannot write {}", cli.output.display()))?;

    tracing::info!(
        path = %cli.output.display(),
        width = out.image.width(),
        height = out.image.height(),
        "Wrote result"
    );
    Ok(())
}

fn read_image(path: &Path) -> Result<pyrblend_core::AnyImage> {
    pyrblend_io::read(path).with_context(|| format!("Cannot read {}", path.display()))
}

/// Installs the global subscriber; the returned guard flushes the log file on drop.
///
/// `RUST_LOG` wins over `-v`, which wins over the config file level.
fn init_logging(config: &Config, verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if verbose { "debug" } else { config.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr)
            .try_init()
            .context("Failed to install log subscriber")?;
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .with_context(|| format!("Invalid log file path {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(Some(guard))
}
