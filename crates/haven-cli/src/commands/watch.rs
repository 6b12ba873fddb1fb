use std::sync::Arc;
use std::time::Duration;

use haven_core::connectivity::ConnectivityMonitor;
use tokio::net::TcpStream;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::commands::common::{open_queue_with, Context};
use crate::error::CliError;

pub const DEFAULT_CHECK_ADDR: &str = "1.1.1.1:53";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Keep reconciling whenever the network comes back, until Ctrl-C.
pub async fn run_watch(
    check_addr: &str,
    interval_secs: u64,
    ctx: &Context,
) -> Result<usize, CliError> {
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("Stopping watch...");
                on_ctrl_c.cancel();
            }
            Err(error) => tracing::warn!("Ctrl-C handler unavailable: {error}"),
        }
    });

    eprintln!("Watching connectivity via {check_addr} (Ctrl-C to stop)");
    let pending = run_watch_until(check_addr, interval_secs, ctx, cancel).await?;
    println!("{pending} pending");
    Ok(pending)
}

/// Watch loop with an external stop signal. Returns the pending count left over.
pub async fn run_watch_until(
    check_addr: &str,
    interval_secs: u64,
    ctx: &Context,
    cancel: CancellationToken,
) -> Result<usize, CliError> {
    if interval_secs == 0 {
        return Err(CliError::Config("watch interval must be at least one second".into()));
    }

    let monitor = Arc::new(ConnectivityMonitor::new(false));
    let queue = open_queue_with(ctx, monitor.clone()).await?;

    if ctx.online {
        let every = Duration::from_secs(interval_secs);
        tokio::join!(
            queue.run_until_cancelled(cancel.clone()),
            track_connectivity(&monitor, check_addr, every, &cancel),
        );
    } else {
        tracing::info!("Offline mode forced; queued alerts stay pending");
        queue.run_until_cancelled(cancel).await;
    }

    Ok(queue.pending_count().await)
}

async fn track_connectivity(
    monitor: &ConnectivityMonitor,
    check_addr: &str,
    every: Duration,
    cancel: &CancellationToken,
) {
    let mut ticks = tokio::time::interval(every);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticks.tick() => {
                monitor.set_online(is_reachable(check_addr, CONNECT_TIMEOUT).await);
            }
        }
    }
}

/// Whether a TCP connection to `addr` opens within `limit`.
pub async fn is_reachable(addr: &str, limit: Duration) -> bool {
    match tokio::time::timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(error)) => {
            tracing::debug!(addr, "Connectivity check failed: {error}");
            false
        }
        Err(_) => {
            tracing::debug!(addr, "Connectivity check timed out");
            false
        }
    }
}
