use haven_core::ReconcileSummary;

use crate::commands::common::{format_summary_lines, open_queue, Context};
use crate::error::CliError;

pub async fn run_reconcile(as_json: bool, ctx: &Context) -> Result<ReconcileSummary, CliError> {
    let queue = open_queue(ctx).await?;
    let summary = queue.reconcile().await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_summary_lines(&summary) {
            println!("{line}");
        }
    }

    Ok(summary)
}
