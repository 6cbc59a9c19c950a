//! Subtrack Core Library
//!
//! Shared functionality for the Subtrack subscription expense tracker:
//! - Subscription records and the JSON interchange format
//! - Next-payment recurrence math with a configurable month-end policy
//! - Spending aggregation, sorting and filtering
//! - Month calendar grid
//! - Payment reminders with a background scheduler
//! - Record stores: local SQLite (optionally encrypted) and a remote document API
//! - JSON/CSV import and export
//! - TOML configuration with embedded defaults

pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod exchange;
pub mod models;
pub mod recurrence;
pub mod reminders;
pub mod sort;
pub mod stats;
pub mod store;
pub mod tracker;

/// Test utilities including mock document server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use calendar::{CalendarDay, CalendarEvent, MonthCalendar, YearMonth};
pub use config::{Config, StoreBackend};
pub use db::Database;
pub use error::{Error, Result};
pub use exchange::{ImportBatch, SkippedRecord};
pub use models::{NewSubscription, Period, Subscription, SubscriptionRecord, SubscriptionUpdate};
pub use recurrence::{days_until, next_occurrence, MonthEndPolicy};
pub use reminders::{
    check_upcoming, LogNotifier, Notifier, Reminder, ReminderHandle, ReminderScheduler,
    ReminderSettings,
};
pub use sort::{sort_subscriptions, SortColumn, SortDirection, SortState, SubscriptionFilter};
pub use stats::{
    format_amount, CategoryBreakdown, CategorySpend, ExpensiveEntry, PeriodShare, SpendingReport,
    SpendingStats,
};
pub use store::{RecordStore, RemoteStore, Store};
pub use tracker::{Dashboard, DashboardRow, ImportOutcome, Snapshot, Tracker};
