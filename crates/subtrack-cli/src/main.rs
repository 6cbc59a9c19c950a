//! Subtrack CLI - Subscription expense tracker
//!
//! Usage:
//!   subtrack init                 Initialize database
//!   subtrack add --name ... ...   Record a subscription
//!   subtrack list --sort price    List with next payment dates
//!   subtrack report               Spending by category and period
//!   subtrack calendar             Month view of payment days
//!   subtrack watch                Run payment reminders

mod cli;
mod commands;
mod render;


use anyhow::Result;
use clap::Parser;
use subtrack_core::sort::SubscriptionFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    // init only ever touches the local database
    if let Commands::Init = cli.command {
        return commands::cmd_init(&cli.db, cli.no_encrypt);
    }

    let config = commands::load_config(cli.config.as_deref())?;
    let today = commands::resolve_today(cli.today.as_deref())?;
    let symbol = config.display.currency_symbol.clone();

    if let Commands::Watch { interval } = cli.command {
        let settings = commands::watch_settings(&config, interval)?;
        let store = commands::open_store(&config, &cli.db, cli.no_encrypt)?;
        return commands::cmd_watch(store, settings, &symbol).await;
    }

    let mut tracker = commands::open_tracker(&config, &cli.db, cli.no_encrypt).await?;

    match cli.command {
        Commands::Init | Commands::Watch { .. } => Ok(()),
        Commands::Status => commands::cmd_status(&config, &tracker, today).await,
        Commands::List {
            sort,
            desc,
            active,
            inactive,
            category,
            search,
            json,
        } => {
            let filter = SubscriptionFilter {
                active: match (active, inactive) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                category,
                search,
            };
            let sort = commands::sort_from_args(sort.as_deref(), desc);
            commands::cmd_list(&mut tracker, today, &filter, sort, json, &symbol)
        }
        Commands::Show { id, json } => commands::cmd_show(&tracker, &id, today, json, &symbol),
        Commands::Add(args) => commands::cmd_add(&mut tracker, &args, &symbol).await.map(|_| ()),
        Commands::Edit(args) => commands::cmd_edit(&mut tracker, &args).await.map(|_| ()),
        Commands::Delete { id, yes } => commands::cmd_delete(&mut tracker, &id, yes).await,
        Commands::Stats { json } => commands::cmd_stats(&tracker, json, &symbol),
        Commands::Report { top, json } => commands::cmd_report(&tracker, top, json, &symbol),
        Commands::Calendar { month, offset } => {
            let month = commands::resolve_month(month.as_deref(), offset, today)?;
            commands::cmd_calendar(&tracker, month, today, &symbol)
        }
        Commands::Remind { days } => {
            let lead_days = days.unwrap_or_else(|| config.reminders.lead_days.clone());
            commands::cmd_remind(&tracker, today, &lead_days, &symbol).map(|_| ())
        }
        Commands::Export { format, output } => {
            commands::cmd_export(&tracker, format, output.as_deref(), today).map(|_| ())
        }
        Commands::Import { file, yes } => {
            commands::cmd_import(&mut tracker, &file, yes).await.map(|_| ())
        }
        Commands::Clear { yes } => commands::cmd_clear(&mut tracker, yes).await.map(|_| ()),
    }
}
