//! The `fieldnote delete` command.

use clap::Args;
use fieldnote_core::{FieldNotes, SightingId};

use super::{emit, Context};

/// Arguments for the `delete` command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Id of the sighting to delete
    pub id: SightingId,
}

/// Execute the delete command.
pub async fn execute(args: DeleteArgs, context: Context) -> anyhow::Result<()> {
    let notes = FieldNotes::open(context.config).await?;
    let reply = notes.service().delete(&args.id).await;
    emit(&reply)
}
