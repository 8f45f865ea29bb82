//! Command implementations and the plumbing they share.

pub mod config;
pub mod delete;
pub mod edit;
pub mod list;
pub mod new;

use anyhow::Context as _;
use clap::Args;
use fieldnote_core::{Config, OutputWriter, Reply, TextFields, Upload};
use std::io;
use std::path::{Path, PathBuf};

/// Global options resolved once in `main`.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    /// Explicit `--config` path, if any
    pub config_path: Option<PathBuf>,
    pub owner: Option<String>,
}

impl Context {
    /// The config file this invocation reads and writes.
    pub fn config_file(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(Config::default_path)
    }
}

/// Free-text fields shared by `new` and `edit`.
#[derive(Args, Debug, Default)]
pub struct TextArgs {
    /// Category, e.g. "bird"
    #[arg(long)]
    pub category: Option<String>,

    /// Short title
    #[arg(long)]
    pub title: Option<String>,

    /// Longer notes
    #[arg(long)]
    pub details: Option<String>,
}

impl From<TextArgs> for TextFields {
    fn from(args: TextArgs) -> Self {
        TextFields {
            category: args.category,
            title: args.title,
            details: args.details,
        }
    }
}

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Read an image file into an upload named after the file.
pub async fn read_upload(path: &Path) -> anyhow::Result<Upload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Upload::new(file_name, bytes))
}

/// Print a reply on stdout; an error reply fails the command.
pub fn emit(reply: &Reply) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut writer = OutputWriter::new(stdout.lock(), true);
    writer.write_reply(reply)?;
    writer.flush()?;

    match reply.kind() {
        None => Ok(()),
        Some(kind) => anyhow::bail!("request failed ({kind:?})"),
    }
}
