//! Slotframe CLI: command-line interface for placement, swatches, and export.
//!
//! Usage:
//!   slotframe swatch <IMAGE>          Print the representative swatch color
//!   slotframe resolve [OPTIONS]       Show the transform for a placement
//!   slotframe flatten <IMAGE> -o OUT  Bake one placement into a raster
//!   slotframe export <LAYOUT>         Flatten every slot of a layout
//!   slotframe info <DOCUMENT>         Show stored placements
//!   slotframe reset <DOCUMENT>        Reset all placements of a document

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use slotframe_common::config::{AppConfig, LoggingConfig};
use slotframe_placement_model::geometry::{FrameSize, NaturalSize};
use slotframe_placement_model::record::{PlacementRecord, DEFAULT_PERCENT};

mod commands;

#[derive(Parser)]
#[command(
    name = "slotframe",
    about = "Cover-fit image placement, swatch extraction and flatten export",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Placement document directory (overrides the config file)
    #[arg(long, global = true)]
    placements_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Placement record fields.
#[derive(Args, Debug, Clone, Copy)]
struct PlacementArgs {
    /// Horizontal offset percent (100 = no offset)
    #[arg(long, default_value_t = DEFAULT_PERCENT, allow_negative_numbers = true)]
    offset_x: f64,

    /// Vertical offset percent (100 = no offset)
    #[arg(long, default_value_t = DEFAULT_PERCENT, allow_negative_numbers = true)]
    offset_y: f64,

    /// Zoom percent on top of the cover fit (>= 100)
    #[arg(long, default_value_t = DEFAULT_PERCENT)]
    scale: f64,
}

impl PlacementArgs {
    fn record(&self) -> PlacementRecord {
        PlacementRecord::new(self.offset_x, self.offset_y, self.scale)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the representative swatch color of an image
    Swatch {
        /// Path to the image
        image: PathBuf,
    },

    /// Resolve a placement into its frame-local transform
    Resolve {
        /// Frame size, e.g. 800x600
        #[arg(long)]
        frame: FrameSize,

        /// Natural image size, e.g. 1600x800
        #[arg(long)]
        natural: NaturalSize,

        #[command(flatten)]
        placement: PlacementArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Flatten one image into a frame-sized raster
    Flatten {
        /// Path to the source image
        image: PathBuf,

        /// Frame size, e.g. 800x600
        #[arg(long)]
        frame: FrameSize,

        #[command(flatten)]
        placement: PlacementArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: png|jpeg (defaults to the configured format)
        #[arg(long)]
        format: Option<String>,
    },

    /// Flatten every slot listed in a layout manifest
    Export {
        /// Path to the layout JSON
        layout: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Placement document id (defaults to the layout's document_id)
        #[arg(long)]
        document: Option<String>,
    },

    /// Show stored placements for a document
    Info {
        /// Document id
        document: String,
    },

    /// Reset every placement of a document to the default
    Reset {
        /// Document id
        document: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if let Some(dir) = cli.placements_dir {
        config.placements_dir = dir;
    }

    // Initialize logging
    let logging = if cli.verbose {
        LoggingConfig {
            level: "debug".to_string(),
            ..config.logging.clone()
        }
    } else {
        config.logging.clone()
    };
    slotframe_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Swatch { image } => commands::swatch::run(&config, image).await,
        Commands::Resolve {
            frame,
            natural,
            placement,
            json,
        } => commands::resolve::run(frame, natural, placement.record(), json),
        Commands::Flatten {
            image,
            frame,
            placement,
            output,
            format,
        } => commands::flatten::run(&config, image, frame, placement.record(), output, format).await,
        Commands::Export {
            layout,
            output,
            document,
        } => commands::export::run(&config, layout, output, document).await,
        Commands::Info { document } => commands::info::run(&config, &document),
        Commands::Reset { document } => commands::reset::run(&config, &document),
    }
}
