use crate::commands::common::{format_status_lines, open_queue, Context, StatusReport};
use crate::error::CliError;

pub async fn run_status(as_json: bool, ctx: &Context) -> Result<StatusReport, CliError> {
    let queue = open_queue(ctx).await?;
    let total = queue.len().await;
    let pending = queue.pending_count().await;

    let report = StatusReport {
        online: queue.is_online(),
        total,
        pending,
        synced: total - pending,
        contacts: queue.contacts().await.len(),
        db_path: ctx.db_path.display().to_string(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_status_lines(&report) {
            println!("{line}");
        }
    }

    Ok(report)
}
