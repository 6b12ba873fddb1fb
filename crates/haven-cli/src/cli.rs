use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::commands::watch::DEFAULT_CHECK_ADDR;

#[derive(Parser)]
#[command(name = "haven")]
#[command(about = "Offline-first SOS alerts from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Treat the device as offline (also `HAVEN_OFFLINE=1`)
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hand a position fix to the queue
    Capture {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Connectivity the caller observed before the fix was taken
        #[arg(long)]
        believed_online: Option<bool>,
    },
    /// Trigger an SOS alert after a cancellable countdown
    Sos {
        /// Latitude in degrees (position unavailable when omitted)
        #[arg(long, allow_negative_numbers = true, requires = "lng")]
        lat: Option<f64>,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lng: Option<f64>,
        /// Countdown in seconds before the alert goes out
        #[arg(long, value_name = "SECONDS")]
        countdown: Option<u32>,
    },
    /// Deliver queued alerts to emergency contacts
    Reconcile {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or tidy the offline queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
    /// Manage emergency contacts
    Contacts {
        #[command(subcommand)]
        command: ContactCommands,
    },
    /// Reconcile automatically whenever the network comes back
    Watch {
        /// Address that must accept a TCP connection for the device to count as online
        #[arg(long, value_name = "HOST:PORT", default_value = DEFAULT_CHECK_ADDR)]
        check_addr: String,
        /// Seconds between connectivity checks
        #[arg(long, value_name = "SECONDS", default_value_t = 15)]
        interval: u64,
    },
    /// Show queue counts and connectivity
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum QueueCommands {
    /// List queued locations, oldest first
    List {
        /// Only show records that were not delivered yet
        #[arg(long)]
        pending: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove records that were already delivered
    ClearSynced,
}

#[derive(Subcommand)]
pub enum ContactCommands {
    /// Add an emergency contact
    Add {
        /// Contact name
        name: String,
        /// Phone number
        phone: String,
        /// Relationship, e.g. "Sister"
        #[arg(long, short)]
        relationship: Option<String>,
    },
    /// List emergency contacts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an emergency contact
    Remove {
        /// Contact ID or unique ID prefix
        id: String,
    },
    /// Add the starter contacts to an empty list
    Seed,
}
