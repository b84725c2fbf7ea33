//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::analyze::{self, Amount};
use super::items_cmd;
use super::inspect;
use super::output::{Output, OutputFormat};
use super::settings::Settings;
use crate::domain::Quantity;
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "craftcost")]
#[command(
    author,
    version,
    about = "Calculate the raw materials and crafting steps for an item from datapack recipes"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (default: config default_format, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Instance or datapack directory (falls back to ATM10_PATH, then 'instance')
    #[arg(long, global = true, env = "CRAFTCOST_DATAPACK_PATH")]
    pub datapack_path: Option<PathBuf>,

    /// Directory holding item index databases
    #[arg(long, global = true, env = "CRAFTCOST_INDEX_DIR")]
    pub index_dir: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "CRAFTCOST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the bill of materials for an item
    Analyze {
        /// Target item id (e.g. 'minecraft:stick')
        item: String,

        /// Target quantity; accepts integers, fractions and decimals (default: 1)
        #[arg(long, short = 'n', conflicts_with = "cube", allow_negative_numbers = true)]
        quantity: Option<Quantity>,

        /// Quantity as N^3 (e.g. 3 -> 27)
        #[arg(long)]
        cube: Option<u32>,

        /// Also print a Mermaid flowchart
        #[arg(long)]
        diagram: bool,

        /// Write the JSON bill of materials to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List the recipes that produce an item
    Recipe {
        /// Item id
        item: String,
    },

    /// Show the items a tag resolves to
    Tag {
        /// Tag id, with or without a leading '#'
        tag: String,
    },

    /// Report skipped records, tag cycles and unknown tags
    Check {
        /// Exit with failure when any problem is found
        #[arg(long)]
        strict: bool,
    },

    /// Search and manage the item index
    #[command(subcommand)]
    Items(items_cmd::ItemsCommands),
}

/// Routes library events to stderr
///
/// `RUST_LOG` wins when set; otherwise warnings only, or debug under --verbose.
fn init_tracing(verbose: bool) {
    let default = if verbose { "craftcost=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let format = cli.format.unwrap_or_else(|| config.default_format.into());
    let output = Output::new(format, cli.verbose);
    let settings = Settings::resolve(&config, cli.datapack_path.as_deref(), cli.index_dir.as_deref());

    output.verbose("craftcost starting");
    output.verbose_ctx("config", &format!("Dataset root: {}", settings.datapack_path.display()));

    match cli.command {
        Commands::Analyze {
            item,
            quantity,
            cube,
            diagram,
            output: out_file,
        } => {
            let amount = Amount::from_args(quantity, cube);
            analyze::run(&output, &settings, &item, amount, diagram, out_file.as_deref())?
        }

        Commands::Recipe { item } => inspect::recipe(&output, &settings, &item)?,
        Commands::Tag { tag } => inspect::tag(&output, &settings, &tag)?,
        Commands::Check { strict } => inspect::check(&output, &settings, strict)?,

        Commands::Items(cmd) => items_cmd::run(cmd, &output, &settings)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
