//! Subscription record operations

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Row};
use tracing::debug;

use super::Database;
use crate::error::Result;
use crate::models::{
    NewSubscription, Period, Subscription, SubscriptionRecord, SubscriptionUpdate,
};

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, price, period, category, next_payment, payment_method, is_active, notes, created_at
    FROM subscriptions
"#;

/// Current time truncated to what the `created_at` column keeps
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn row_to_subscription(row: &Row) -> rusqlite::Result<Subscription> {
    let period_str: Option<String> = row.get(3)?;
    let date_str: String = row.get(5)?;
    let created_str: String = row.get(9)?;

    let next_payment = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Subscription {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        period: period_str.as_deref().and_then(Period::parse),
        category: row.get(4)?,
        next_payment,
        payment_method: row.get(6)?,
        is_active: row.get(7)?,
        notes: row.get(8)?,
        created_at,
    })
}

fn insert_row(conn: &rusqlite::Connection, sub: &Subscription) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO subscriptions
            (id, name, price, period, category, next_payment, payment_method, is_active, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            sub.id,
            sub.name,
            sub.price,
            sub.period.map(|p| p.as_str()),
            sub.category,
            sub.next_payment.to_string(),
            sub.payment_method,
            sub.is_active,
            sub.notes,
            format_timestamp(&sub.created_at),
        ],
    )?;
    Ok(())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Database {
    /// List all subscriptions, newest first
    pub fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))?;

        let subscriptions = stmt
            .query_map([], row_to_subscription)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subscriptions)
    }

    /// Get a subscription by id
    pub fn get_subscription(&self, id: &str) -> Result<Option<Subscription>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            &format!("{} WHERE id = ?", SELECT_COLUMNS),
            params![id],
            row_to_subscription,
        );

        match result {
            Ok(sub) => Ok(Some(sub)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a new subscription, assigning its id and creation time
    pub fn insert_subscription(&self, new: NewSubscription) -> Result<Subscription> {
        new.validate()?;
        let sub = new.into_subscription(new_id(), now_millis());

        let conn = self.conn()?;
        insert_row(&conn, &sub)?;
        debug!(id = %sub.id, name = %sub.name, "Inserted subscription");

        Ok(sub)
    }

    /// Merge an update into a stored subscription
    ///
    /// Returns `None` when the id does not exist.
    pub fn update_subscription(
        &self,
        id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<Option<Subscription>> {
        let Some(mut sub) = self.get_subscription(id)? else {
            return Ok(None);
        };
        update.apply(&mut sub)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE subscriptions
            SET name = ?, price = ?, period = ?, category = ?, next_payment = ?,
                payment_method = ?, is_active = ?, notes = ?
            WHERE id = ?
            "#,
            params![
                sub.name,
                sub.price,
                sub.period.map(|p| p.as_str()),
                sub.category,
                sub.next_payment.to_string(),
                sub.payment_method,
                sub.is_active,
                sub.notes,
                sub.id,
            ],
        )?;

        Ok(Some(sub))
    }

    /// Delete a subscription; returns whether a row was removed
    pub fn delete_subscription(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM subscriptions WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Replace every stored subscription with `records`
    ///
    /// Runs in one transaction, so an invalid record leaves the table as it
    /// was. Ids are kept when present; a repeated id keeps the last record.
    pub fn replace_all_subscriptions(&self, records: Vec<SubscriptionRecord>) -> Result<usize> {
        for record in &records {
            record.validate()?;
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM subscriptions", [])?;

        let now = now_millis();
        for record in records {
            let sub = record.into_subscription(new_id, now);
            insert_row(&tx, &sub)?;
        }

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM subscriptions", [], |row| row.get(0))?;
        tx.commit()?;

        Ok(count as usize)
    }

    /// Delete all subscriptions; returns how many were removed
    pub fn clear_subscriptions(&self) -> Result<usize> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM subscriptions", [])?)
    }

    pub fn count_subscriptions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM subscriptions", [], |row| row.get(0))?;
        Ok(count)
    }
}
