//! The `fieldnote edit` command.

use clap::Args;
use fieldnote_core::{EditRequest, FieldNotes, SightingId};
use std::path::PathBuf;

use super::{emit, read_upload, Context, TextArgs};

/// Arguments for the `edit` command.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Id of the sighting to edit
    pub id: SightingId,

    /// Replace the image (coordinates are re-read from the new one)
    #[arg(long)]
    pub image: Option<PathBuf>,

    #[command(flatten)]
    pub text: TextArgs,
}

/// Execute the edit command.
pub async fn execute(args: EditArgs, context: Context) -> anyhow::Result<()> {
    let upload = match &args.image {
        Some(path) => Some(read_upload(path).await?),
        None => None,
    };
    let notes = FieldNotes::open(context.config).await?;

    let reply = notes
        .service()
        .edit(EditRequest {
            id: args.id,
            upload,
            fields: args.text.into(),
        })
        .await;
    emit(&reply)
}
