use haven_core::models::Coordinates;
use haven_core::CaptureOutcome;

use crate::commands::common::{open_queue, Context};
use crate::error::CliError;

pub async fn run_capture(
    latitude: f64,
    longitude: f64,
    believed_online: Option<bool>,
    ctx: &Context,
) -> Result<CaptureOutcome, CliError> {
    let position = Coordinates::new(latitude, longitude)?;
    let queue = open_queue(ctx).await?;

    let outcome = queue
        .capture_and_maybe_queue(position, believed_online.unwrap_or(ctx.online))
        .await;
    match outcome {
        CaptureOutcome::Queued(id) => println!("{id}"),
        CaptureOutcome::DeliverLive => println!("online: deliver live"),
    }

    Ok(outcome)
}
