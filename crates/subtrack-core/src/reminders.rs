//! Upcoming payment reminders
//!
//! `check_upcoming` is the pure scan. `ReminderScheduler` runs it in a
//! background tokio task on a fixed interval, reloading the record set from
//! the store on every tick.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::models::Subscription;
use crate::recurrence::{days_until, MonthEndPolicy};
use crate::stats::format_amount;
use crate::store::RecordStore;

pub const REMINDER_TITLE: &str = "Subscription Payment Reminder";

/// A payment that is due soon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reminder {
    pub subscription_id: String,
    pub name: String,
    pub price: f64,
    pub due_date: NaiveDate,
    pub days_until: i64,
}

impl Reminder {
    pub fn title(&self) -> &'static str {
        REMINDER_TITLE
    }

    /// "Payment due TOMORROW for Netflix - ₩17,000"
    pub fn message(&self, currency_symbol: &str) -> String {
        let amount = format_amount(self.price, currency_symbol);
        match self.days_until {
            0 => format!("Payment due TODAY for {} - {}", self.name, amount),
            1 => format!("Payment due TOMORROW for {} - {}", self.name, amount),
            n => format!("Payment due in {} days for {} - {}", n, self.name, amount),
        }
    }
}

/// Active records whose next payment is exactly one of `lead_days` away
///
/// Results are ordered by due date; records due the same day keep their
/// input order.
pub fn check_upcoming(
    records: &[Subscription],
    today: NaiveDate,
    lead_days: &[i64],
    policy: MonthEndPolicy,
) -> Vec<Reminder> {
    let mut reminders: Vec<Reminder> = records
        .iter()
        .filter(|s| s.is_active)
        .filter_map(|s| {
            let due = policy.next_occurrence(s.next_payment, s.period, today);
            let days = days_until(due, today);
            lead_days.contains(&days).then(|| Reminder {
                subscription_id: s.id.clone(),
                name: s.name.clone(),
                price: s.price,
                due_date: due,
                days_until: days,
            })
        })
        .collect();

    reminders.sort_by_key(|r| r.days_until);
    reminders
}

/// Destination for reminders
pub trait Notifier: Send + Sync {
    fn notify(&self, reminder: &Reminder);
}

/// Notifier that writes reminders to the tracing log
#[derive(Debug, Clone)]
pub struct LogNotifier {
    currency_symbol: String,
}

impl LogNotifier {
    pub fn new(currency_symbol: &str) -> Self {
        Self {
            currency_symbol: currency_symbol.to_string(),
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, reminder: &Reminder) {
        info!(
            title = reminder.title(),
            id = %reminder.subscription_id,
            due = %reminder.due_date,
            "{}",
            reminder.message(&self.currency_symbol)
        );
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, reminder: &Reminder) {
        (**self).notify(reminder)
    }
}

/// Scheduling parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderSettings {
    pub interval: Duration,
    pub lead_days: Vec<i64>,
    pub policy: MonthEndPolicy,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            lead_days: vec![0, 1, 3],
            policy: MonthEndPolicy::Clamp,
        }
    }
}

impl ReminderSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.reminders.interval,
            lead_days: config.reminders.lead_days.clone(),
            policy: config.display.month_end,
        }
    }
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Periodic reminder check over a record store
pub struct ReminderScheduler<S, N> {
    store: S,
    notifier: N,
    settings: ReminderSettings,
    clock: Clock,
    /// (record id, due date, lead) already announced; past due dates are dropped
    sent: HashSet<(String, NaiveDate, i64)>,
}

impl<S, N> ReminderScheduler<S, N>
where
    S: RecordStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: S, settings: ReminderSettings, notifier: N) -> Self {
        Self {
            store,
            notifier,
            settings,
            clock: Arc::new(local_today),
            sent: HashSet::new(),
        }
    }

    /// Replace the source of "today" (local wall-clock date by default)
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Run one check now; returns the reminders that were newly sent
    ///
    /// A store failure is logged and yields no reminders.
    pub async fn check_now(&mut self) -> Vec<Reminder> {
        let today = (self.clock)();
        self.sent.retain(|(_, due_date, _)| *due_date >= today);

        let records = match self.store.get_all().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "Reminder check skipped: could not load subscriptions");
                return Vec::new();
            }
        };

        let due = check_upcoming(&records, today, &self.settings.lead_days, self.settings.policy);
        debug!(checked = records.len(), due = due.len(), %today, "Reminder check");

        let mut sent = Vec::new();
        for reminder in due {
            let key = (
                reminder.subscription_id.clone(),
                reminder.due_date,
                reminder.days_until,
            );
            if self.sent.insert(key) {
                self.notifier.notify(&reminder);
                sent.push(reminder);
            }
        }
        sent
    }

    /// Spawn the periodic check; the first check runs immediately
    pub fn start(mut self) -> ReminderHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let period = self.settings.interval;

        info!(
            "Starting reminder scheduler: every {}s, lead days {:?}",
            period.as_secs(),
            self.settings.lead_days
        );

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let sent = self.check_now().await;
                        if !sent.is_empty() {
                            info!("Sent {} payment reminder(s)", sent.len());
                        }
                    }
                }
            }

            info!("Reminder scheduler stopped");
        });

        ReminderHandle {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Running scheduler; dropping it stops the task
pub struct ReminderHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ReminderHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the task to stop and wait for it to finish
    pub async fn stop(mut self) {
        self.signal();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Reminder scheduler task failed");
            }
        }
    }

    fn signal(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ReminderHandle {
    fn drop(&mut self) {
        self.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{NewSubscription, Period};
    use crate::store::RemoteStore;
    use chrono::Utc;
    use std::sync::Mutex;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sub(id: &str, period: Option<Period>, anchor: NaiveDate) -> Subscription {
        Subscription {
            id: id.to_string(),
            name: id.to_string(),
            price: 17000.0,
            period,
            category: "Video".to_string(),
            next_payment: anchor,
            payment_method: None,
            is_active: true,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[derive(Clone, Default)]
    struct Collecting {
        seen: Arc<Mutex<Vec<Reminder>>>,
    }

    impl Notifier for Collecting {
        fn notify(&self, reminder: &Reminder) {
            self.seen.lock().unwrap().push(reminder.clone());
        }
    }

    #[test]
    fn test_lead_days_fire() {
        let today = d(2024, 3, 10);
        let records = vec![
            sub("today", Some(Period::Monthly), d(2023, 1, 10)),
            sub("tomorrow", Some(Period::Monthly), d(2023, 1, 11)),
            sub("two", Some(Period::Monthly), d(2023, 1, 12)),
            sub("three", Some(Period::Yearly), d(2020, 3, 13)),
            sub("later", Some(Period::Monthly), d(2023, 1, 25)),
        ];

        let reminders = check_upcoming(&records, today, &[0, 1, 3], MonthEndPolicy::Clamp);
        let ids: Vec<(&str, i64)> = reminders
            .iter()
            .map(|r| (r.subscription_id.as_str(), r.days_until))
            .collect();
        assert_eq!(ids, vec![("today", 0), ("tomorrow", 1), ("three", 3)]);
        assert_eq!(reminders[2].due_date, d(2024, 3, 13));
    }

    #[test]
    fn test_inactive_and_one_off_records() {
        let today = d(2024, 3, 10);
        let mut paused = sub("paused", Some(Period::Monthly), d(2023, 1, 10));
        paused.is_active = false;
        let once = sub("once", None, d(2024, 3, 11));
        let past_once = sub("past", None, d(2024, 3, 1));

        let reminders =
            check_upcoming(&[paused, once, past_once], today, &[0, 1, 3], MonthEndPolicy::Clamp);
        let ids: Vec<&str> = reminders.iter().map(|r| r.subscription_id.as_str()).collect();
        assert_eq!(ids, vec!["once"]);
    }

    #[test]
    fn test_weekly_never_due_today() {
        let anchor = d(2024, 1, 1);
        let mut today = d(2024, 1, 1);
        for _ in 0..60 {
            let reminders = check_upcoming(
                &[sub("weekly", Some(Period::Weekly), anchor)],
                today,
                &[0, 1, 3],
                MonthEndPolicy::Clamp,
            );
            assert!(reminders.iter().all(|r| r.days_until != 0));
            today = today.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_messages() {
        let mut reminder = Reminder {
            subscription_id: "n".to_string(),
            name: "Netflix".to_string(),
            price: 17000.4,
            due_date: d(2024, 3, 10),
            days_until: 0,
        };
        assert_eq!(reminder.message("₩"), "Payment due TODAY for Netflix - ₩17,000");
        reminder.days_until = 1;
        assert_eq!(reminder.message("₩"), "Payment due TOMORROW for Netflix - ₩17,000");
        reminder.days_until = 3;
        assert_eq!(reminder.message("₩"), "Payment due in 3 days for Netflix - ₩17,000");
        assert_eq!(reminder.title(), "Subscription Payment Reminder");
    }

    fn new_monthly(name: &str, anchor: NaiveDate) -> NewSubscription {
        NewSubscription {
            name: name.to_string(),
            price: 9900.0,
            period: Some(Period::Monthly),
            category: "Video".to_string(),
            next_payment: anchor,
            payment_method: None,
            is_active: true,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_check_now_dedupes_within_session() {
        let db = Database::in_memory().unwrap();
        db.insert_subscription(new_monthly("Tving", d(2024, 1, 11)))
            .unwrap();

        let notifier = Collecting::default();
        let mut scheduler =
            ReminderScheduler::new(db, ReminderSettings::default(), notifier.clone())
                .with_clock(|| NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());

        assert_eq!(scheduler.check_now().await.len(), 1);
        assert!(scheduler.check_now().await.is_empty());
        assert_eq!(notifier.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_past_due_dates_leave_the_sent_set() {
        let db = Database::in_memory().unwrap();
        db.insert_subscription(new_monthly("Tving", d(2024, 1, 11)))
            .unwrap();

        let today = Arc::new(Mutex::new(d(2024, 3, 10)));
        let clock = Arc::clone(&today);
        let mut scheduler =
            ReminderScheduler::new(db, ReminderSettings::default(), Collecting::default())
                .with_clock(move || *clock.lock().unwrap());

        assert_eq!(scheduler.check_now().await.len(), 1);
        assert_eq!(scheduler.sent.len(), 1);

        *today.lock().unwrap() = d(2024, 3, 11);
        assert_eq!(scheduler.check_now().await.len(), 1);
        assert_eq!(scheduler.sent.len(), 2);

        // Mar 11 has passed and the next payment is a month out
        *today.lock().unwrap() = d(2024, 3, 12);
        assert!(scheduler.check_now().await.is_empty());
        assert!(scheduler.sent.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_skips_tick() {
        let unreachable = RemoteStore::new(
            "http://127.0.0.1:9",
            "subscriptions",
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        let notifier = Collecting::default();
        let mut scheduler =
            ReminderScheduler::new(unreachable, ReminderSettings::default(), notifier.clone());

        assert!(scheduler.check_now().await.is_empty());
        assert!(notifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scheduler_start_and_stop() {
        let db = Database::in_memory().unwrap();
        db.insert_subscription(new_monthly("Watcha", d(2024, 1, 10)))
            .unwrap();

        let notifier = Collecting::default();
        let settings = ReminderSettings {
            interval: Duration::from_millis(20),
            ..Default::default()
        };
        let handle = ReminderScheduler::new(db, settings, notifier.clone())
            .with_clock(|| NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
            .start();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(handle.is_running());
        handle.stop().await;

        // Several ticks ran, but the reminder was only sent once
        let seen = notifier.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].days_until, 0);
    }
}
