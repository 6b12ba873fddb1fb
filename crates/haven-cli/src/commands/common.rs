use std::env;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use haven_core::config::HavenConfig;
use haven_core::connectivity::{ConnectivityMonitor, ConnectivitySignal};
use haven_core::db::{ContactRepository, Database, SqliteContactRepository};
use haven_core::delivery::LoggingSink;
use haven_core::feedback::{Feedback, FeedbackSink, TracingFeedback};
use haven_core::models::SkipReason;
use haven_core::storage::SqliteSlotStore;
use haven_core::{EmergencyContact, LocationRecord, OfflineAlertQueue, ReconcileSummary};
use serde::Serialize;

use crate::error::CliError;

pub type CliQueue = OfflineAlertQueue<LoggingSink>;

/// Everything a command needs to know about where and how it runs
#[derive(Debug, Clone)]
pub struct Context {
    pub db_path: PathBuf,
    pub config: HavenConfig,
    pub online: bool,
}

impl Context {
    pub fn resolve(
        cli_db_path: Option<PathBuf>,
        cli_config_path: Option<PathBuf>,
        offline: bool,
    ) -> Result<Self, CliError> {
        let config_path = resolve_config_path(cli_config_path);
        let config = HavenConfig::load_from_path(&config_path).map_err(|error| {
            CliError::Config(format!("{}: {error}", config_path.display()))
        })?;

        Ok(Self {
            db_path: resolve_db_path(cli_db_path),
            config,
            online: resolve_online(offline, env::var("HAVEN_OFFLINE").ok().as_deref()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RecordListItem {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
    pub captured_at_iso: String,
    pub relative_time: String,
    pub synced: bool,
    pub map_link: String,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub online: bool,
    pub total: usize,
    pub pending: usize,
    pub synced: usize,
    pub contacts: usize,
    pub db_path: String,
}

/// Feedback printed to stderr so stdout stays machine readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFeedback;

impl FeedbackSink for ConsoleFeedback {
    fn notify(&self, feedback: Feedback) {
        eprintln!("{}", format_feedback(&feedback));
    }
}

/// Where user feedback goes: console lines for a person at a terminal, the log otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutput {
    Console,
    Log,
}

impl FeedbackOutput {
    pub const fn for_terminal(interactive: bool) -> Self {
        if interactive {
            Self::Console
        } else {
            Self::Log
        }
    }

    pub fn sink(self) -> Arc<dyn FeedbackSink> {
        match self {
            Self::Console => Arc::new(ConsoleFeedback),
            Self::Log => Arc::new(TracingFeedback),
        }
    }
}

pub fn stderr_feedback() -> Arc<dyn FeedbackSink> {
    FeedbackOutput::for_terminal(io::stderr().is_terminal()).sink()
}

pub fn format_feedback(feedback: &Feedback) -> String {
    let marker = if feedback.is_destructive() { "!" } else { "*" };
    format!("{marker} {}: {}", feedback.title(), feedback.description())
}

pub fn open_contacts_database(db_path: &Path) -> Result<Database, CliError> {
    Ok(Database::open(db_path)?)
}

pub fn load_contacts(db_path: &Path) -> Result<Vec<EmergencyContact>, CliError> {
    let db = open_contacts_database(db_path)?;
    let contacts = SqliteContactRepository::new(db.connection()).list()?;
    Ok(contacts)
}

/// Open the persisted queue with the stored contacts, ready for use.
pub async fn open_queue(ctx: &Context) -> Result<CliQueue, CliError> {
    open_queue_with(ctx, Arc::new(ConnectivityMonitor::new(ctx.online))).await
}

pub async fn open_queue_with(
    ctx: &Context,
    connectivity: Arc<dyn ConnectivitySignal>,
) -> Result<CliQueue, CliError> {
    let contacts = load_contacts(&ctx.db_path)?;
    if contacts.is_empty() {
        tracing::warn!("No emergency contacts configured. Add one with `haven contacts add`.");
    }

    let store = SqliteSlotStore::new(Database::open(&ctx.db_path)?);
    let queue = OfflineAlertQueue::new(
        ctx.config.queue_config(),
        store,
        connectivity,
        LoggingSink,
        stderr_feedback(),
        contacts,
    );
    queue.initialize().await;
    Ok(queue)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("HAVEN_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("haven")
        .join("haven.db")
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> PathBuf {
    cli_config_path
        .or_else(|| env::var_os("HAVEN_CONFIG").map(PathBuf::from))
        .unwrap_or_else(default_config_path)
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("haven")
        .join("config.json")
}

/// Online unless `--offline` was passed or `HAVEN_OFFLINE` is truthy
pub fn resolve_online(offline_flag: bool, env_value: Option<&str>) -> bool {
    let env_offline = env_value.is_some_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    });
    !(offline_flag || env_offline)
}

pub fn record_to_list_item(record: &LocationRecord) -> RecordListItem {
    let now_ms = Utc::now().timestamp_millis();
    RecordListItem {
        id: record.id.to_string(),
        latitude: record.latitude,
        longitude: record.longitude,
        timestamp: record.captured_at,
        captured_at_iso: record.captured_label(),
        relative_time: format_relative_time(record.captured_at, now_ms),
        synced: record.is_synced(),
        map_link: record.map_link(),
    }
}

pub fn format_record_lines(records: &[LocationRecord]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    records
        .iter()
        .map(|record| {
            let short_id = short_id(&record.id.to_string());
            let status = if record.is_synced() {
                "synced"
            } else {
                "pending"
            };
            let position = format!("{:.6}, {:.6}", record.latitude, record.longitude);
            let relative_time = format_relative_time(record.captured_at, now_ms);
            format!("{short_id:<13}  {status:<7}  {position:<24}  {relative_time}")
        })
        .collect()
}

pub fn format_contact_lines(contacts: &[EmergencyContact]) -> Vec<String> {
    contacts
        .iter()
        .map(|contact| {
            let short_id = short_id(&contact.id.to_string());
            format!("{short_id:<13}  {contact}")
        })
        .collect()
}

pub fn format_summary_lines(summary: &ReconcileSummary) -> Vec<String> {
    if let Some(reason) = summary.skipped {
        let reason = match reason {
            SkipReason::Offline => "device is offline",
            SkipReason::NothingPending => "nothing pending",
        };
        return vec![format!("Skipped: {reason} ({} pending)", summary.pending)];
    }

    let mut lines = vec![
        format!("Attempted: {}", summary.attempted_records),
        format!("Synced:    {}", summary.synced),
        format!("Pending:   {}", summary.pending),
    ];
    if summary.failed_deliveries > 0 {
        lines.push(format!("Failed deliveries: {}", summary.failed_deliveries));
    }
    if summary.evicted > 0 {
        lines.push(format!("Evicted:   {}", summary.evicted));
    }
    lines
}

pub fn format_status_lines(report: &StatusReport) -> Vec<String> {
    vec![
        format!("Connectivity: {}", if report.online { "online" } else { "offline" }),
        format!(
            "Queue:        {} pending, {} synced, {} total",
            report.pending, report.synced, report.total
        ),
        format!("Contacts:     {}", report.contacts),
        format!("Database:     {}", report.db_path),
    ]
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}

pub fn normalize_contact_identifier(id: &str) -> Result<String, CliError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CliError::EmptyContactId);
    }
    Ok(id.to_string())
}

/// Find a contact by full ID or unique ID prefix.
pub fn resolve_contact<'a>(
    query: &str,
    contacts: &'a [EmergencyContact],
) -> Result<&'a EmergencyContact, CliError> {
    if let Some(contact) = contacts
        .iter()
        .find(|contact| contact.id.to_string() == query)
    {
        return Ok(contact);
    }

    let matching = contacts
        .iter()
        .filter(|contact| contact.id.to_string().starts_with(query))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::ContactNotFound(query.to_string())),
        [contact] => Ok(contact),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|contact| short_id(&contact.id.to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousContactId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}
