//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Subtrack - Keep recurring payments in view
#[derive(Parser)]
#[command(name = "subtrack")]
#[command(about = "Subscription expense tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (local store only)
    #[arg(long, default_value = "subtrack.db", global = true)]
    pub db: PathBuf,

    /// Configuration file (overrides SUBTRACK_CONFIG and the user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for real data)
    ///
    /// By default, the local database is encrypted using SQLCipher.
    /// Set SUBTRACK_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    pub today: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the local database
    Init,

    /// Show store, configuration and record count
    Status,

    /// List subscriptions with their next payment dates
    List {
        /// Sort column: name, price, date (default: newest first)
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort descending (with --sort)
        #[arg(long)]
        desc: bool,

        /// Only active subscriptions
        #[arg(long, conflicts_with = "inactive")]
        active: bool,

        /// Only inactive subscriptions
        #[arg(long)]
        inactive: bool,

        /// Only this category (case-insensitive)
        #[arg(short, long)]
        category: Option<String>,

        /// Name contains this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one subscription
    Show {
        /// Subscription ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a subscription
    Add(AddArgs),

    /// Edit fields of a subscription
    Edit(EditArgs),

    /// Delete a subscription
    Delete {
        /// Subscription ID
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show spending totals
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Spending report: categories, periods and most expensive
    Report {
        /// Number of entries in the most-expensive list
        #[arg(long, default_value = "5")]
        top: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a month calendar with payment days
    Calendar {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Months to move forward (or back, if negative) from --month
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i32,
    },

    /// List payments due soon (one-shot reminder check)
    Remind {
        /// Days ahead to report (defaults to the configured lead days)
        #[arg(short, long, value_delimiter = ',')]
        days: Option<Vec<i64>>,
    },

    /// Run the reminder scheduler until interrupted (Ctrl-C)
    Watch {
        /// Check interval in minutes (defaults to the configured interval)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Export subscriptions to a file
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Output file (defaults to subscription-data-YYYY-MM-DD.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace all subscriptions with the contents of a JSON export
    Import {
        /// JSON file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete all subscriptions
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Service name
    #[arg(short, long)]
    pub name: String,

    /// Price per period (number, e.g. 17000 or 9.99)
    #[arg(short, long)]
    pub price: String,

    /// Billing period: weekly, monthly, yearly, none
    #[arg(long, default_value = "monthly")]
    pub period: String,

    /// Category
    #[arg(short, long)]
    pub category: String,

    /// Next payment date (YYYY-MM-DD)
    #[arg(long)]
    pub next: String,

    /// Payment method (card, account, ...)
    #[arg(long)]
    pub method: Option<String>,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Record as inactive (excluded from totals and calendar)
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Subscription ID
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub price: Option<String>,

    /// weekly, monthly, yearly, or none for a one-off payment
    #[arg(long)]
    pub period: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Next payment date (YYYY-MM-DD)
    #[arg(long)]
    pub next: Option<String>,

    /// Payment method (empty string clears it)
    #[arg(long)]
    pub method: Option<String>,

    /// Notes (empty string clears them)
    #[arg(long)]
    pub notes: Option<String>,

    /// Mark active
    #[arg(long, conflicts_with = "deactivate")]
    pub activate: bool,

    /// Mark inactive
    #[arg(long)]
    pub deactivate: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}
