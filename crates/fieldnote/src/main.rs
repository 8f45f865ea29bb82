//! Fieldnote CLI - record geotagged field notes with photo attachments.
//!
//! Each sighting keeps the uploaded photo, a thumbnail, a display-size copy,
//! the GPS position found in the photo (if any) and free-text notes.
//!
//! # Usage
//!
//! ```bash
//! # Record a sighting
//! fieldnote --owner ada new heron.jpg --category bird --title "Grey heron"
//!
//! # Swap the photo and fix the title
//! fieldnote edit 3f1c... --image heron2.jpg --title "Great blue heron"
//!
//! # List your sightings, one per line
//! FIELDNOTE_OWNER=ada fieldnote list --format jsonl
//!
//! # View configuration
//! fieldnote config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Fieldnote - geotagged field notes with photo attachments.
#[derive(Parser, Debug)]
#[command(name = "fieldnote")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Owner identity attached to new sightings and used to scope listings
    #[arg(long, global = true, env = "FIELDNOTE_OWNER")]
    owner: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a new sighting from an image
    New(cli::new::NewArgs),

    /// Edit a sighting's notes, optionally replacing its image
    Edit(cli::edit::EditArgs),

    /// Delete a sighting and its stored images
    Delete(cli::delete::DeleteArgs),

    /// List sightings
    List(cli::list::ListArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_none() => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `fieldnote config path`."
            );
            fieldnote_core::Config::default()
        }
        Err(e) => return Err(e),
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Fieldnote v{}", fieldnote_core::VERSION);

    let context = cli::Context {
        config,
        config_path: cli.config,
        owner: cli.owner,
    };

    match cli.command {
        Commands::New(args) => cli::new::execute(args, context).await,
        Commands::Edit(args) => cli::edit::execute(args, context).await,
        Commands::Delete(args) => cli::delete::execute(args, context).await,
        Commands::List(args) => cli::list::execute(args, context).await,
        Commands::Config(args) => cli::config::execute(args, context).await,
    }
}
