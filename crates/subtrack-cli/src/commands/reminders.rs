//! Reminder command implementations

use anyhow::Result;
use chrono::NaiveDate;
use subtrack_core::{
    config::{interval_from_minutes, Config, MAX_INTERVAL_MINUTES},
    reminders::{Notifier, Reminder, ReminderScheduler, ReminderSettings},
    RecordStore, Tracker,
};
use tracing::info;

use crate::render;

/// Notifier that prints reminders to the terminal
#[derive(Debug, Clone)]
pub struct ConsoleNotifier {
    currency_symbol: String,
}

impl ConsoleNotifier {
    pub fn new(currency_symbol: &str) -> Self {
        Self {
            currency_symbol: currency_symbol.to_string(),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, reminder: &Reminder) {
        println!(
            "🔔 {}: {}",
            reminder.title(),
            reminder.message(&self.currency_symbol)
        );
    }
}

pub fn cmd_remind<S: RecordStore>(
    tracker: &Tracker<S>,
    today: NaiveDate,
    lead_days: &[i64],
    symbol: &str,
) -> Result<Vec<Reminder>> {
    let reminders = tracker.upcoming(today, lead_days);
    print!("{}", render::render_reminders(&reminders, symbol));
    Ok(reminders)
}

/// Scheduler settings from config, with `--interval` (minutes) overriding
pub fn watch_settings(config: &Config, interval: Option<u64>) -> Result<ReminderSettings> {
    let mut settings = ReminderSettings::from_config(config);
    if let Some(minutes) = interval {
        settings.interval = interval_from_minutes(minutes).ok_or_else(|| {
            anyhow::anyhow!(
                "--interval must be between 1 and {} minutes",
                MAX_INTERVAL_MINUTES
            )
        })?;
    }
    Ok(settings)
}

/// Run the scheduler in the foreground until Ctrl-C
pub async fn cmd_watch<S: RecordStore + 'static>(
    store: S,
    settings: ReminderSettings,
    symbol: &str,
) -> Result<()> {
    println!(
        "👀 Watching for upcoming payments every {} min (lead days {:?})",
        settings.interval.as_secs() / 60,
        settings.lead_days
    );
    println!("   Press Ctrl-C to stop.");

    let handle = ReminderScheduler::new(store, settings, ConsoleNotifier::new(symbol)).start();

    tokio::signal::ctrl_c().await?;
    info!("Interrupted, stopping reminder scheduler");
    handle.stop().await;

    println!("Stopped.");
    Ok(())
}
