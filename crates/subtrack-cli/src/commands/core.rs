//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` / `open_store` / `open_tracker` - Shared utilities to reach the records
//! - `resolve_today` - The date every view is computed against
//! - `confirm` - Interactive y/N prompt for destructive commands
//! - `cmd_init` - Initialize the local database
//! - `cmd_status` - Show store and configuration

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use subtrack_core::{config::Config, db::Database, RecordStore, Store, Tracker};

fn path_str(db_path: &Path) -> Result<&str> {
    db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))
}

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path = path_str(db_path)?;
    if no_encrypt {
        Database::new_unencrypted(path).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path).context("Failed to open database")
    }
}

pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    Config::load(config_path).context("Failed to load configuration")
}

/// Open the configured record store
pub fn open_store(config: &Config, db_path: &Path, no_encrypt: bool) -> Result<Store> {
    let path = path_str(db_path)?;
    Store::open(config, path, no_encrypt).context("Failed to open record store")
}

/// Open a tracker session over the configured store
pub async fn open_tracker(config: &Config, db_path: &Path, no_encrypt: bool) -> Result<Tracker<Store>> {
    let store = open_store(config, db_path, no_encrypt)?;
    Ok(Tracker::open(store)
        .await
        .with_policy(config.display.month_end))
}

/// `--today` if given, otherwise the local wall-clock date
pub fn resolve_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .context("Invalid --today format (use YYYY-MM-DD)"),
        None => Ok(Local::now().date_naive()),
    }
}

/// Ask a y/N question on stdin; anything but "y" is a no
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;
    let count = db.count_subscriptions()?;
    println!("   Subscriptions stored: {}", count);

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add a subscription: subtrack add --name Netflix --price 17000 --category Video --next 2024-07-15");
    println!("  2. Or import an export: subtrack import --file subscription-data.json");

    Ok(())
}

pub async fn cmd_status<S: RecordStore>(
    config: &Config,
    tracker: &Tracker<S>,
    today: NaiveDate,
) -> Result<()> {
    let store = tracker.store();

    println!();
    println!("📊 Subtrack Status");
    println!("   ─────────────────────────────");
    match config.source {
        Some(ref path) => println!("   Config:     {}", path.display()),
        None => println!("   Config:     (built-in defaults)"),
    }
    println!("   Store:      {}", store.backend().as_str());
    println!("   Location:   {}", store.location());

    match store.encrypted() {
        Some(true) => println!("   🔒 Encryption: ENABLED"),
        Some(false) => println!("   ⚠️  Encryption: DISABLED"),
        None => {}
    }

    match store.get_all().await {
        Ok(records) => println!("   Records:    {}", records.len()),
        Err(e) => println!("   ❌ Store unavailable: {}", e),
    }

    println!("   Today:      {}", today);
    println!("   Month end:  {}", tracker.policy());
    println!("   Currency:   {}", config.display.currency_symbol);
    println!(
        "   Reminders:  every {} min, lead days {:?}",
        config.reminders.interval.as_secs() / 60,
        config.reminders.lead_days
    );

    Ok(())
}
