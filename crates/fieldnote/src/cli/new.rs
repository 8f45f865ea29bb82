//! The `fieldnote new` command.

use clap::Args;
use fieldnote_core::{CreateRequest, FieldNotes};
use std::path::PathBuf;

use super::{emit, read_upload, Context, TextArgs};

/// Arguments for the `new` command.
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Image file to attach
    pub image: PathBuf,

    #[command(flatten)]
    pub text: TextArgs,
}

/// Execute the new command.
pub async fn execute(args: NewArgs, context: Context) -> anyhow::Result<()> {
    let upload = read_upload(&args.image).await?;
    let notes = FieldNotes::open(context.config).await?;

    let reply = notes
        .service()
        .create(CreateRequest {
            upload: Some(upload),
            fields: args.text.into(),
            owner: context.owner,
        })
        .await;

    if let Some(record) = reply.record() {
        tracing::info!("Recorded sighting {}", record.id);
    }
    emit(&reply)
}
