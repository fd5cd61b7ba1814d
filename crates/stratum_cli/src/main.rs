//! Stratum CLI
//!
//! Operator tools for a Stratum data node.
//!
//! # Commands
//!
//! - `inspect` - Bootstrap a node from a directory and print what it serves
//! - `load` - Run a segment loader on one path
//! - `loaders` - List the registered segment loaders

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Stratum data node tools.
#[derive(Parser)]
#[command(name = "stratum")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap a node from a directory and print its registry
    Inspect {
        /// Directory whose entries are loaded as segments
        #[arg(short, long)]
        bootstrap_dir: PathBuf,

        /// Node data directory (required for file mode)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Segment loader identifier
        #[arg(short, long, default_value = "properties")]
        loader: String,

        /// Storage mode (heap, file)
        #[arg(short, long, default_value = "heap")]
        mode: String,

        /// Instance identifier shown in the report
        #[arg(long, default_value = stratum_core::DEFAULT_INSTANCE_ID)]
        instance_id: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Load one segment path and print its metadata
    Load {
        /// Segment path
        path: PathBuf,

        /// Segment loader identifier
        #[arg(short, long, default_value = "properties")]
        loader: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List registered segment loaders
    Loaders,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect {
            bootstrap_dir,
            data_dir,
            loader,
            mode,
            instance_id,
            format,
        } => {
            let options = commands::inspect::InspectOptions {
                bootstrap_dir,
                data_dir,
                loader,
                mode: mode.parse()?,
                instance_id,
            };
            commands::inspect::run(&options, &format)?;
        }
        Commands::Load {
            path,
            loader,
            format,
        } => {
            commands::load::run(&path, &loader, &format)?;
        }
        Commands::Loaders => {
            commands::loaders::run();
        }
        Commands::Version => {
            println!("Stratum CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Stratum Core v{}", stratum_core::VERSION);
        }
    }

    Ok(())
}
