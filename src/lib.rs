//! Augsync: synchronized augmentation of an image dataset and its records.
//!
//! Augsync grows the positive ("fractured") class of an image dataset by
//! writing transformed copies of existing positive images. Each new image is
//! recorded in the CSV table and in the COCO-style annotation store, with its
//! polygon annotations carried through the same geometric transform, so the
//! three stay consistent.
//!
//! # Modules
//!
//! - [`ir`]: Store record types and their CSV/JSON readers and writers
//! - [`transform`]: Paired pixel and point mappings for each transform
//! - [`project`]: Carrying annotation polygons through a transform
//! - [`naming`]: Sequential file name allocation
//! - [`augment`]: The run loop that keeps the three stores in step
//! - [`prune`]: Removing corrupted images and their table rows
//! - [`config`], [`logging`], [`error`]: Run setup and error types

pub mod augment;
pub mod config;
pub mod error;
pub mod ir;
pub mod logging;
pub mod naming;
pub mod project;
pub mod prune;
pub mod transform;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::AugmentError;

use config::AugmentConfig;
use transform::Transform;

/// The augsync CLI application.
#[derive(Parser)]
#[command(name = "augsync")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Generate augmented positive samples until the target count is met.
    Augment(AugmentArgs),
    /// Delete corrupted images and remove their table rows.
    Prune(PruneArgs),
}

/// Arguments for the augment subcommand. Flags override the config file.
#[derive(clap::Args)]
struct AugmentArgs {
    /// YAML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fractured count to reach.
    #[arg(long)]
    target: Option<usize>,

    /// Transform to apply, e.g. 'rotate:90', 'flip:horizontal', 'shear:0.2',
    /// 'brightness:0.8'. Repeat to build the list.
    #[arg(long = "transform", value_name = "KIND:VALUE")]
    transforms: Vec<Transform>,

    /// Input table CSV.
    #[arg(long)]
    table: Option<PathBuf>,

    /// Output table CSV.
    #[arg(long)]
    table_out: Option<PathBuf>,

    /// Input annotation store (COCO JSON).
    #[arg(long)]
    annotations: Option<PathBuf>,

    /// Output annotation store (COCO JSON).
    #[arg(long)]
    annotations_out: Option<PathBuf>,

    /// Directory of source images; augmented images are written here.
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Extension (and format) of written images, e.g. 'jpg' or 'png'.
    #[arg(long)]
    extension: Option<String>,

    /// Continue from existing output stores.
    #[arg(long)]
    resume: bool,

    /// Append log lines to this file.
    #[arg(long, conflicts_with = "no_log_file")]
    log_file: Option<PathBuf>,

    /// Log to stderr only.
    #[arg(long)]
    no_log_file: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    output: String,
}

impl AugmentArgs {
    fn apply_to(self, config: &mut AugmentConfig) {
        if let Some(target) = self.target {
            config.target = target;
        }
        if !self.transforms.is_empty() {
            config.transforms = self.transforms;
        }
        let paths = &mut config.paths;
        if let Some(p) = self.table {
            paths.table = p;
        }
        if let Some(p) = self.table_out {
            paths.table_out = p;
        }
        if let Some(p) = self.annotations {
            paths.annotations = p;
        }
        if let Some(p) = self.annotations_out {
            paths.annotations_out = p;
        }
        if let Some(p) = self.images_dir {
            paths.images_dir = p;
        }
        if self.log_file.is_some() {
            paths.log_file = self.log_file;
        }
        if self.no_log_file {
            paths.log_file = None;
        }
        if let Some(ext) = self.extension {
            config.naming.extension = ext.trim_start_matches('.').to_string();
        }
        if self.resume {
            config.resume = true;
        }
    }
}

/// Arguments for the prune subcommand.
#[derive(clap::Args)]
struct PruneArgs {
    /// File listing corrupted image names, one per line.
    #[arg(long, default_value = "corrupted_images.txt")]
    list: PathBuf,

    /// Directory the listed images live in.
    #[arg(long, default_value = "images/Non_fractured")]
    images_dir: PathBuf,

    /// Table CSV to remove the listed rows from.
    #[arg(long)]
    table: Option<PathBuf>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    output: String,
}

/// Run the augsync CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), AugmentError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Augment(args)) => run_augment(args),
        Some(Commands::Prune(args)) => run_prune(args),
        None => {
            println!("augsync {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Synchronized image augmentation for annotated datasets.");
            println!();
            println!("Run 'augsync --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the augment subcommand.
fn run_augment(args: AugmentArgs) -> Result<(), AugmentError> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => AugmentConfig::default(),
    };
    let output = args.output.clone();
    args.apply_to(&mut config);
    config.validate()?;

    logging::init_logging(config.paths.log_file.as_deref())?;

    let report = augment::run_augmentation(&config, &mut augment::TracingSink)?;
    print_report(&output, &report)
}

/// Execute the prune subcommand.
fn run_prune(args: PruneArgs) -> Result<(), AugmentError> {
    logging::init_logging(None)?;

    let names = prune::read_corrupted_list(&args.list)?;
    let report = prune::prune_corrupted(&names, &args.images_dir, args.table.as_deref())?;
    print_report(&args.output, &report)
}

fn print_report<R>(output: &str, report: &R) -> Result<(), AugmentError>
where
    R: serde::Serialize + std::fmt::Display,
{
    match output {
        "json" => {
            let json = serde_json::to_string_pretty(report).map_err(AugmentError::ReportRender)?;
            println!("{}", json);
        }
        _ => print!("{}", report),
    }
    Ok(())
}
