//! Tracker session
//!
//! Owns the store handle and the current working set. Every mutation goes to
//! the store first and is followed by a full reload, so all derived views are
//! computed from an immutable snapshot of what the store actually holds.
//!
//! Store failures never reach the computations: reads degrade to an empty
//! set and single-record mutations report "nothing happened", with the cause
//! logged.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::calendar::{MonthCalendar, YearMonth};
use crate::error::{Error, Result};
use crate::exchange::{self, ImportBatch, SkippedRecord};
use crate::models::{NewSubscription, Subscription, SubscriptionUpdate};
use crate::recurrence::{days_until, MonthEndPolicy};
use crate::reminders::{check_upcoming, Reminder};
use crate::sort::{SortColumn, SortState, SubscriptionFilter};
use crate::stats::{SpendingReport, SpendingStats};
use crate::store::RecordStore;

/// Immutable working set from the latest load
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: Arc<[Subscription]>,
    loaded_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(records: Vec<Subscription>) -> Self {
        Self {
            records: records.into(),
            loaded_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Records newest first
    pub fn records(&self) -> &[Subscription] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn get(&self, id: &str) -> Option<&Subscription> {
        self.records.iter().find(|s| s.id == id)
    }
}

/// One list row: the record plus its computed next payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    #[serde(flatten)]
    pub subscription: Subscription,
    #[serde(rename = "dueDate")]
    pub due_date: NaiveDate,
    #[serde(rename = "daysUntil")]
    pub days_until: i64,
}

/// The list view model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub rows: Vec<DashboardRow>,
    pub totals: SpendingStats,
}

/// Result of a bulk import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: Vec<SkippedRecord>,
}

/// A subscription tracking session over a record store
pub struct Tracker<S> {
    store: S,
    snapshot: Snapshot,
    sort: SortState,
    policy: MonthEndPolicy,
}

impl<S: RecordStore> Tracker<S> {
    /// Open a session and load the current set
    pub async fn open(store: S) -> Self {
        let mut tracker = Self {
            store,
            snapshot: Snapshot::empty(),
            sort: SortState::default(),
            policy: MonthEndPolicy::default(),
        };
        tracker.reload().await;
        tracker
    }

    pub fn with_policy(mut self, policy: MonthEndPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> MonthEndPolicy {
        self.policy
    }

    /// Replace the snapshot with the store's current contents
    pub async fn reload(&mut self) -> &Snapshot {
        let records = match self.store.get_all().await {
            Ok(records) => records,
            Err(e) => {
                error!(
                    backend = self.store.backend().as_str(),
                    error = %e,
                    "Failed to load subscriptions, continuing with an empty set"
                );
                Vec::new()
            }
        };
        debug!(count = records.len(), "Reloaded subscriptions");
        self.snapshot = Snapshot::new(records);
        &self.snapshot
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn get(&self, id: &str) -> Option<&Subscription> {
        self.snapshot.get(id)
    }

    /// Add a record; `None` if the store rejected it
    pub async fn add(&mut self, new: NewSubscription) -> Option<Subscription> {
        let result = self.store.add(new).await;
        self.reload().await;
        match result {
            Ok(sub) => {
                info!(id = %sub.id, name = %sub.name, "Added subscription");
                Some(sub)
            }
            Err(e) => {
                error!(error = %e, "Failed to add subscription");
                None
            }
        }
    }

    /// Apply a partial update; `None` if the id is unknown or the store failed
    pub async fn update(&mut self, id: &str, update: &SubscriptionUpdate) -> Option<Subscription> {
        let result = self.store.update(id, update).await;
        self.reload().await;
        match result {
            Ok(Some(sub)) => {
                info!(id = %sub.id, "Updated subscription");
                Some(sub)
            }
            Ok(None) => {
                warn!(id, "Update for unknown subscription");
                None
            }
            Err(e) => {
                error!(id, error = %e, "Failed to update subscription");
                None
            }
        }
    }

    /// Delete a record; `false` if nothing was removed
    pub async fn delete(&mut self, id: &str) -> bool {
        let result = self.store.delete(id).await;
        self.reload().await;
        match result {
            Ok(true) => {
                info!(id, "Deleted subscription");
                true
            }
            Ok(false) => {
                warn!(id, "Delete for unknown subscription");
                false
            }
            Err(e) => {
                error!(id, error = %e, "Failed to delete subscription");
                false
            }
        }
    }

    /// Remove every record; returns how many were removed
    ///
    /// Store failures are returned as `Error::Store`.
    pub async fn clear(&mut self) -> Result<usize> {
        let result = self.store.clear().await;
        self.reload().await;

        let count = result.map_err(|e| {
            error!(error = %e, "Failed to clear subscriptions");
            Error::Store(format!("Clear failed: {}", e))
        })?;

        info!(count, "Cleared all subscriptions");
        Ok(count)
    }

    /// Replace the whole set with an import payload
    ///
    /// A payload that is not a JSON array fails before the store is touched.
    pub async fn import_json(&mut self, json: &str) -> Result<ImportOutcome> {
        let batch = exchange::parse_import(json)?;
        self.import_batch(batch).await
    }

    /// Replace the whole set with already parsed records
    ///
    /// Store failures are returned as `Error::Store`.
    pub async fn import_batch(&mut self, batch: ImportBatch) -> Result<ImportOutcome> {
        let skipped = batch.skipped;

        let result = self.store.save_all(batch.records).await;
        self.reload().await;

        let imported = result.map_err(|e| {
            error!(error = %e, "Import failed");
            Error::Store(format!("Import failed: {}", e))
        })?;

        info!(imported, skipped = skipped.len(), "Imported subscriptions");
        Ok(ImportOutcome { imported, skipped })
    }

    /// Current set as the interchange JSON array
    pub fn export_json(&self) -> Result<String> {
        exchange::to_json(self.snapshot.records())
    }

    pub fn export_csv(&self) -> Result<String> {
        exchange::to_csv(self.snapshot.records())
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Toggle sorting on a column (same column flips direction)
    pub fn sort_by(&mut self, column: SortColumn) {
        self.sort.toggle(column);
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    /// List rows in the current sort order, plus headline totals
    pub fn dashboard(&self, today: NaiveDate, filter: &SubscriptionFilter) -> Dashboard {
        let visible = filter.apply(self.snapshot.records());
        let rows = self
            .sort
            .apply(&visible)
            .into_iter()
            .map(|sub| {
                let due_date = self.policy.next_occurrence(sub.next_payment, sub.period, today);
                DashboardRow {
                    due_date,
                    days_until: days_until(due_date, today),
                    subscription: sub,
                }
            })
            .collect();

        Dashboard {
            rows,
            totals: SpendingStats::compute(self.snapshot.records()),
        }
    }

    pub fn report(&self) -> SpendingReport {
        SpendingReport::compute(self.snapshot.records())
    }

    pub fn calendar(&self, month: YearMonth, today: NaiveDate) -> MonthCalendar {
        MonthCalendar::build(month, self.snapshot.records(), today, self.policy)
    }

    pub fn upcoming(&self, today: NaiveDate, lead_days: &[i64]) -> Vec<Reminder> {
        check_upcoming(self.snapshot.records(), today, lead_days, self.policy)
    }
}
