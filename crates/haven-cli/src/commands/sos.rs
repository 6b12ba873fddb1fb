use std::sync::Arc;

use haven_core::config::MAX_COUNTDOWN_SECS;
use haven_core::geolocation::{FixedGeolocator, Geolocator, UnavailableGeolocator};
use haven_core::models::Coordinates;
use haven_core::sos::{SosOutcome, SosPhase, SosTrigger};
use tokio_util::sync::CancellationToken;

use crate::commands::common::{open_queue, stderr_feedback, CliQueue, Context};
use crate::error::CliError;

pub async fn run_sos(
    position: Option<(f64, f64)>,
    countdown: Option<u32>,
    ctx: &Context,
) -> Result<SosOutcome, CliError> {
    let countdown = countdown.unwrap_or(ctx.config.countdown_secs);
    if countdown > MAX_COUNTDOWN_SECS {
        return Err(CliError::Config(format!(
            "countdown must be at most {MAX_COUNTDOWN_SECS} seconds"
        )));
    }
    let position = position
        .map(|(latitude, longitude)| Coordinates::new(latitude, longitude))
        .transpose()?;

    let queue = Arc::new(open_queue(ctx).await?);
    let outcome = match position {
        Some(position) => trigger(queue, FixedGeolocator::new(position), countdown).await,
        None => {
            let geolocator = UnavailableGeolocator::new("no position given");
            trigger(queue, geolocator, countdown).await
        }
    };

    println!("{}", describe_outcome(&outcome));
    Ok(outcome)
}

async fn trigger<G: Geolocator>(
    queue: Arc<CliQueue>,
    geolocator: G,
    countdown: u32,
) -> SosOutcome {
    let sos = SosTrigger::new(queue, geolocator, stderr_feedback()).with_countdown(countdown);
    let mut phases = sos.subscribe();
    let cancel = CancellationToken::new();

    let activation = sos.activate(cancel.clone());
    tokio::pin!(activation);

    let mut listen_for_ctrl_c = true;
    loop {
        tokio::select! {
            outcome = &mut activation => return outcome,

            signal = tokio::signal::ctrl_c(), if listen_for_ctrl_c => {
                listen_for_ctrl_c = false;
                match signal {
                    Ok(()) => {
                        eprintln!("Cancelling SOS...");
                        cancel.cancel();
                    }
                    Err(error) => tracing::warn!("Ctrl-C handler unavailable: {error}"),
                }
            }

            Ok(()) = phases.changed() => {
                if let SosPhase::CountingDown(remaining) = *phases.borrow_and_update() {
                    eprintln!("Sending SOS in {remaining}s (Ctrl-C to cancel)");
                }
            }
        }
    }
}

pub fn describe_outcome(outcome: &SosOutcome) -> String {
    match outcome {
        SosOutcome::Cancelled => "SOS cancelled".to_string(),
        SosOutcome::AlreadyActive => "SOS already in progress".to_string(),
        SosOutcome::AlertSent {
            position,
            delivered,
        } => format!("Alert sent to {delivered} contact(s) from {position}"),
        SosOutcome::Queued(id) => format!("Offline: alert queued as {id}"),
        SosOutcome::LocationUnavailable { delivered } => {
            format!("Location unavailable; alert sent to {delivered} contact(s)")
        }
    }
}
