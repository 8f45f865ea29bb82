//! The `fieldnote list` command.

use clap::{Args, ValueEnum};
use fieldnote_core::{FieldNotes, OutputFormat, OutputWriter};
use std::io;

use super::Context;

/// Listing format accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// A single JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<ListFormat> for OutputFormat {
    fn from(format: ListFormat) -> Self {
        match format {
            ListFormat::Json => OutputFormat::Json,
            ListFormat::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Arguments for the `list` command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ListFormat,
}

/// Execute the list command.
///
/// Lists the sightings of `--owner`; without an owner, the unowned ones.
pub async fn execute(args: ListArgs, context: Context) -> anyhow::Result<()> {
    let notes = FieldNotes::open(context.config).await?;
    let sightings = notes.service().list(context.owner.as_deref()).await?;
    tracing::debug!("Listing {} sighting(s)", sightings.len());

    let stdout = io::stdout();
    let mut writer = OutputWriter::new(stdout.lock(), true);
    writer.write_sightings(&sightings, args.format.into())?;
    writer.flush()?;
    Ok(())
}
