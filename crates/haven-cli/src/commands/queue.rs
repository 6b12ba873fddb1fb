use crate::commands::common::{
    format_record_lines, open_queue, record_to_list_item, Context, RecordListItem,
};
use crate::error::CliError;

pub async fn run_queue_list(
    pending_only: bool,
    as_json: bool,
    ctx: &Context,
) -> Result<(), CliError> {
    let queue = open_queue(ctx).await?;
    let records = queue
        .records()
        .await
        .into_iter()
        .filter(|record| !pending_only || !record.is_synced())
        .collect::<Vec<_>>();

    if as_json {
        let json_items = records
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<RecordListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if records.is_empty() {
        println!("Queue is empty");
    } else {
        for line in format_record_lines(&records) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_queue_clear_synced(ctx: &Context) -> Result<usize, CliError> {
    let queue = open_queue(ctx).await?;
    let removed = queue.prune_synced().await;
    println!("Removed {removed} synced record(s)");
    Ok(removed)
}
