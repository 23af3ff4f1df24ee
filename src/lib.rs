//! Cocoshape: COCO annotations to typed shape annotations.
//!
//! Cocoshape reads COCO-style datasets (images, categories, and objects
//! whose segmentation is either vertex rings or a run-length mask) and
//! writes one annotation file per image made of typed shapes: rectangles,
//! and polygons with explicit exterior and interior rings.
//!
//! # Modules
//!
//! - [`ir`]: source records, shapes, and the annotation model with its file formats
//! - [`geometry`]: RLE decoding, boundary tracing, hole resolution, box reconciliation
//! - [`registry`]: class descriptors with generated display colors
//! - [`assemble`]: per-image annotation assembly
//! - [`conversion`]: the dataset driver and its report
//! - [`error`]: error types for cocoshape operations

pub mod assemble;
pub mod conversion;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod registry;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use error::CocoShapeError;

/// The cocoshape CLI application.
#[derive(Parser)]
#[command(name = "cocoshape")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert a directory of COCO datasets into a shape-annotation project.
    Convert(ConvertArgs),
}

/// Report output format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Source root with one directory per dataset.
    src: PathBuf,

    /// Destination project root.
    dst: PathBuf,

    /// Do not emit rectangle labels.
    #[arg(long, env = "COCOSHAPE_IGNORE_BBOX")]
    ignore_bbox: bool,

    /// Regenerate meta.json even if the destination already has one.
    #[arg(long, env = "COCOSHAPE_FORCE_META")]
    force_meta: bool,

    /// Annotation index file looked up first in each dataset.
    #[arg(long, env = "COCOSHAPE_INDEX_NAME", default_value = conversion::DEFAULT_INDEX_NAME)]
    index_name: String,

    /// Seed for class color generation.
    #[arg(long, env = "COCOSHAPE_COLOR_SEED", default_value_t = registry::DEFAULT_COLOR_SEED)]
    color_seed: u64,

    /// Output format for the report.
    #[arg(long, value_enum, default_value = "text")]
    output: ReportFormat,
}

/// Run the cocoshape CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocoShapeError> {
    let cli = Cli::parse();

    // A logger may already be installed when embedded in another binary.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        None => {
            println!("cocoshape {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("COCO annotations to typed shape annotations.");
            println!();
            println!("Run 'cocoshape --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), CocoShapeError> {
    let opts = conversion::ConvertOptions {
        ignore_bbox: args.ignore_bbox,
        force_meta: args.force_meta,
        index_name: args.index_name,
        color_seed: args.color_seed,
    };
    let report = conversion::convert(&args.src, &args.dst, &opts)?;

    match args.output {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
            println!("{json}");
        }
        ReportFormat::Text => print!("{report}"),
    }

    if report.counts.images_failed > 0 {
        Err(CocoShapeError::ConversionFailed {
            failed_images: report.counts.images_failed,
            report,
        })
    } else {
        Ok(())
    }
}
