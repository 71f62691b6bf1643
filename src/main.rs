mod annotation;
mod display;
mod error;
mod interaction;
mod output;
mod render;
mod segmentation;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use display::WindowDisplay;
use error::SessionError;
use image::RgbImage;
use output::{ImageFileOutput, OutputSink};
use segmentation::SegmentationAdapter;
use session::{Session, SessionConfig};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Segment images interactively with a rectangle and scribbles.",
    long_about = None
)]
struct Args {
    /// The image to segment
    #[arg(short, long)]
    image: PathBuf,

    /// Path where to save the segmented image
    #[arg(short, long, default_value = "segmented.png")]
    output: PathBuf,

    /// Scribble brush radius in pixels
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(i32).range(0..=64))]
    brush_radius: i32,

    /// Engine sweeps per refinement call
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// Weight of the smoothness term between neighbouring pixels
    #[arg(long, default_value_t = 2.0)]
    smoothness: f64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let image = load_image(&args.image)?;
    let (width, height) = image.dimensions();
    tracing::info!("Loaded {} ({}x{})", args.image.display(), width, height);

    print_commands();

    let engine = segmentation::create_default_engine(args.iterations, args.smoothness);
    let output = ImageFileOutput::new(&args.output);
    tracing::info!("Output: {}", output.target().display());
    let config = SessionConfig {
        brush_radius: args.brush_radius,
    };

    let mut display =
        WindowDisplay::new(width, height).context("Failed to initialize display windows")?;

    let session = Session::new(
        image,
        SegmentationAdapter::new(engine),
        Box::new(output),
        config,
    );
    let summary = session.run(&mut display)?;

    tracing::info!(
        "Finished: {} engine call(s), {} refinement(s), {} failed, {} save(s)",
        summary.engine_calls,
        summary.refinements,
        summary.failed_refinements,
        summary.saved.len()
    );
    Ok(())
}

fn load_image(path: &Path) -> Result<RgbImage, SessionError> {
    image::open(path)
        .map(|decoded| decoded.to_rgb8())
        .map_err(|source| SessionError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })
}

fn print_commands() {
    tracing::info!("GrabCut segmentation");
    tracing::info!("Commands:");
    tracing::info!("  - Esc        ==> Exit.");
    tracing::info!("  - Left mouse ==> Draw rectangle or scribbles.");
    tracing::info!(
        "  - Space      ==> Switch between 'background' (default) and 'foreground' scribbles."
    );
    tracing::info!("  - Enter      ==> Confirm rectangle and update segmentation.");
    tracing::info!("  - s          ==> Save segmented image.");
}
