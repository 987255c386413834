//! geo2coco: georeferenced imagery and building footprints in, COCO out.
//!
//! geo2coco scans a folder of georeferenced raster tiles, projects WGS84
//! building footprints into each tile's pixel grid, clips them to the
//! frame, and writes a COCO detection/segmentation dataset plus a
//! provenance mapping file.
//!
//! # Modules
//!
//! - [`dataset`]: Dataset model types (Dataset, Image, Annotation, etc.)
//!   and the COCO / mapping JSON writers
//! - [`geometry`]: Affine transforms, CRS reprojection, and frame clipping
//! - [`raster`]: Raster frame metadata loading (dimensions + world files)
//! - [`vector`]: Building footprint loading from CSV/WKT
//! - [`pipeline`]: The dataset assembler
//! - [`validation`]: Dataset validation and error reporting
//! - [`error`]: Error types for geo2coco operations

pub mod dataset;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod raster;
pub mod validation;
pub mod vector;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::Geo2CocoError;

use dataset::io_coco_json::{read_coco_json, write_coco_json};
use dataset::io_mapping_json::{mapping_path_for, write_mapping_json};
use dataset::DatasetInfo;
use pipeline::{ConvertConfig, PipelineOptions};

/// The geo2coco CLI application.
#[derive(Parser)]
#[command(name = "geo2coco")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert imagery and building footprints to a COCO dataset.
    Convert(ConvertArgs),
    /// Validate a COCO dataset for errors and warnings.
    Validate(ValidateArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory containing the raster tiles and their world files.
    #[arg(long)]
    images: PathBuf,

    /// CSV file with `building` and `geometry` (WKT POLYGON) columns.
    #[arg(long)]
    footprints: PathBuf,

    /// Output COCO JSON path. The provenance mapping is written next to
    /// it as `<stem>_mapping.json`.
    #[arg(long, default_value = "dataset.json")]
    output: PathBuf,

    /// Minimum clipped polygon area in squared pixels; results exactly
    /// at the threshold are kept.
    #[arg(long, default_value_t = geometry::DEFAULT_MIN_AREA)]
    min_area: f64,

    /// EPSG code of the raster tiles (world files carry no CRS).
    #[arg(long, default_value_t = geometry::EPSG_WGS84)]
    image_epsg: u32,

    /// EPSG code of the footprint geometry.
    #[arg(long, default_value_t = geometry::EPSG_WGS84)]
    vector_epsg: u32,

    /// Supercategory attached to every category record.
    #[arg(long, default_value = "building")]
    supercategory: String,

    /// Dataset description embedded in the COCO info block.
    #[arg(long)]
    description: Option<String>,

    /// Dataset contributor embedded in the COCO info block.
    #[arg(long)]
    contributor: Option<String>,

    /// Dataset version string embedded in the COCO info block.
    #[arg(long)]
    dataset_version: Option<String>,

    /// Dataset year embedded in the COCO info block.
    #[arg(long)]
    year: Option<u32>,

    /// Creation date embedded in the COCO info block. Supplied rather
    /// than sampled so that re-runs on identical inputs are
    /// byte-identical.
    #[arg(long)]
    date_created: Option<String>,

    /// Pretty-print the output JSON.
    #[arg(long)]
    pretty: bool,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// COCO JSON file to validate.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Fail annotations whose area is below this value.
    #[arg(long)]
    min_area: Option<f64>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the geo2coco CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), Geo2CocoError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            // No subcommand: print a version hint and exit successfully.
            println!("geo2coco {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Convert georeferenced imagery and building footprints to COCO.");
            println!();
            println!("Run 'geo2coco --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), Geo2CocoError> {
    let config = ConvertConfig {
        images_dir: args.images,
        csv_path: args.footprints,
        image_epsg: args.image_epsg,
        options: PipelineOptions {
            min_area: args.min_area,
            vector_epsg: args.vector_epsg,
            supercategory: Some(args.supercategory),
            info: DatasetInfo {
                description: args.description,
                version: args.dataset_version,
                year: args.year,
                contributor: args.contributor,
                date_created: args.date_created,
            },
        },
    };

    let assembled = pipeline::convert(&config)?;

    write_coco_json(&args.output, &assembled.dataset, args.pretty)?;
    let mapping_path = mapping_path_for(&args.output);
    write_mapping_json(&mapping_path, &assembled.mapping)?;

    println!(
        "Wrote {} image(s), {} annotation(s), {} categories to {}",
        assembled.dataset.images.len(),
        assembled.dataset.annotations.len(),
        assembled.dataset.categories.len(),
        args.output.display()
    );
    println!("Wrote provenance mapping to {}", mapping_path.display());
    println!("{}", assembled.summary);

    Ok(())
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), Geo2CocoError> {
    let dataset = read_coco_json(&args.input)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
        min_area: args.min_area,
    };
    let report = validation::validate_dataset(&dataset, &opts);

    match args.output.as_str() {
        "json" => {
            // Simple JSON output for programmatic use
            println!("{{");
            println!("  \"error_count\": {},", report.error_count());
            println!("  \"warning_count\": {},", report.warning_count());
            println!("  \"issues\": [");
            for (i, issue) in report.issues.iter().enumerate() {
                let comma = if i < report.issues.len() - 1 { "," } else { "" };
                println!("    {{");
                println!("      \"severity\": \"{:?}\",", issue.severity);
                println!("      \"code\": \"{:?}\",", issue.code);
                println!(
                    "      \"message\": \"{}\",",
                    issue.message.replace('"', "\\\"")
                );
                println!("      \"context\": \"{}\"", issue.context);
                println!("    }}{}", comma);
            }
            println!("  ]");
            println!("}}");
        }
        _ => {
            print!("{}", report);
        }
    }

    // Strict mode already promoted warnings to errors during validation.
    if report.is_ok() {
        Ok(())
    } else {
        Err(Geo2CocoError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    }
}
