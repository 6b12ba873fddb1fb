//! Haven CLI - offline-first SOS alerts from the terminal
//!
//! Captures positions, triggers SOS alerts and replays alerts that were queued
//! while the device had no connection.

mod cli;
mod commands;
mod error;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands, ContactCommands, QueueCommands};
use crate::commands::capture::run_capture;
use crate::commands::common::Context;
use crate::commands::completions::run_completions;
use crate::commands::contacts::{
    run_contacts_add, run_contacts_list, run_contacts_remove, run_contacts_seed,
};
use crate::commands::queue::{run_queue_clear_synced, run_queue_list};
use crate::commands::reconcile::run_reconcile;
use crate::commands::sos::run_sos;
use crate::commands::status::run_status;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("haven=info".parse().map_err(|error| {
                    CliError::Config(format!("invalid log directive: {error}"))
                })?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Commands::Completions { shell, output } = &command {
        return run_completions(*shell, output.as_deref());
    }

    let ctx = Context::resolve(cli.db_path, cli.config, cli.offline)?;
    match command {
        Commands::Capture {
            lat,
            lng,
            believed_online,
        } => {
            run_capture(lat, lng, believed_online, &ctx).await?;
        }
        Commands::Sos {
            lat,
            lng,
            countdown,
        } => {
            run_sos(lat.zip(lng), countdown, &ctx).await?;
        }
        Commands::Reconcile { json } => {
            run_reconcile(json, &ctx).await?;
        }
        Commands::Queue { command } => match command {
            QueueCommands::List { pending, json } => run_queue_list(pending, json, &ctx).await?,
            QueueCommands::ClearSynced => {
                run_queue_clear_synced(&ctx).await?;
            }
        },
        Commands::Contacts { command } => match command {
            ContactCommands::Add {
                name,
                phone,
                relationship,
            } => {
                run_contacts_add(&name, &phone, relationship, &ctx.db_path)?;
            }
            ContactCommands::List { json } => run_contacts_list(json, &ctx.db_path)?,
            ContactCommands::Remove { id } => {
                run_contacts_remove(&id, &ctx.db_path)?;
            }
            ContactCommands::Seed => {
                run_contacts_seed(&ctx.db_path)?;
            }
        },
        Commands::Watch {
            check_addr,
            interval,
        } => {
            run_watch(&check_addr, interval, &ctx).await?;
        }
        Commands::Status { json } => {
            run_status(json, &ctx).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
