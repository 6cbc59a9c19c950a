//! JSON/CSV import and export
//!
//! The interchange file is a pretty-printed JSON array of records using the
//! camelCase field names. Import is all-or-nothing at the payload level (a
//! non-array is rejected before anything is touched) but lenient per element:
//! malformed entries are skipped and reported.

use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{Subscription, SubscriptionRecord};

pub const INVALID_FORMAT_MESSAGE: &str =
    "Invalid data format. Expected an array of subscriptions.";

/// `subscription-data-YYYY-MM-DD.json`
pub fn default_export_filename(today: NaiveDate) -> String {
    format!("subscription-data-{}.json", today.format("%Y-%m-%d"))
}

/// Serialize records as the interchange JSON array
pub fn to_json(records: &[Subscription]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    name: &'a str,
    price: f64,
    period: &'a str,
    category: &'a str,
    #[serde(rename = "nextPayment")]
    next_payment: String,
    #[serde(rename = "paymentMethod")]
    payment_method: &'a str,
    #[serde(rename = "isActive")]
    is_active: bool,
    notes: &'a str,
    #[serde(rename = "createdAt")]
    created_at: String,
}

/// Write records as CSV with a header row
pub fn write_csv<W: Write>(records: &[Subscription], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for sub in records {
        wtr.serialize(CsvRow {
            id: &sub.id,
            name: &sub.name,
            price: sub.price,
            period: sub.period.map(|p| p.as_str()).unwrap_or(""),
            category: &sub.category,
            next_payment: sub.next_payment.to_string(),
            payment_method: sub.payment_method.as_deref().unwrap_or(""),
            is_active: sub.is_active,
            notes: sub.notes.as_deref().unwrap_or(""),
            created_at: sub.created_at.to_rfc3339(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Records as a CSV string
pub fn to_csv(records: &[Subscription]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::InvalidData(format!("CSV is not UTF-8: {}", e)))
}

/// Write a file atomically (temp file in the same directory, then rename)
pub fn write_file_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// An import element that could not be used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    /// Position in the payload array
    pub index: usize,
    pub reason: String,
}

/// Parsed import payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportBatch {
    pub records: Vec<SubscriptionRecord>,
    pub skipped: Vec<SkippedRecord>,
}

impl ImportBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse an import payload
///
/// Fails when the text is not JSON or not an array. Elements that do not
/// form a valid record are skipped.
pub fn parse_import(json: &str) -> Result<ImportBatch> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::Import(format!("Could not parse import file: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(Error::Import(INVALID_FORMAT_MESSAGE.to_string()));
    };

    let mut batch = ImportBatch::default();
    for (index, item) in items.into_iter().enumerate() {
        let parsed = serde_json::from_value::<SubscriptionRecord>(item)
            .map_err(Error::from)
            .and_then(|record| record.validate().map(|_| record));

        match parsed {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                warn!(index, error = %e, "Skipping invalid import record");
                batch.skipped.push(SkippedRecord {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;
    use chrono::{TimeZone, Utc};

    fn sample() -> Subscription {
        Subscription {
            id: "sub-1".to_string(),
            name: "Netflix, Premium".to_string(),
            price: 17000.0,
            period: Some(Period::Monthly),
            category: "Entertainment".to_string(),
            next_payment: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            payment_method: Some("Card".to_string()),
            is_active: true,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_default_filename() {
        let today = NaiveDate::from_ymd_opt(2024, 7, 3).unwrap();
        assert_eq!(default_export_filename(today), "subscription-data-2024-07-03.json");
    }

    #[test]
    fn test_export_then_import_keeps_records() {
        let json = to_json(&[sample()]).unwrap();
        assert!(json.starts_with("[\n"));

        let batch = parse_import(&json).unwrap();
        assert!(batch.skipped.is_empty());
        assert_eq!(batch.records.len(), 1);

        let record = batch.records[0].clone();
        assert_eq!(record.id.as_deref(), Some("sub-1"));
        assert_eq!(record.created_at, Some(sample().created_at));
        assert_eq!(SubscriptionRecord::from(sample()), record);
    }

    #[test]
    fn test_import_rejects_non_array() {
        for payload in [r#"{"name": "x"}"#, "42", r#""text""#, "null"] {
            match parse_import(payload) {
                Err(Error::Import(msg)) => assert_eq!(msg, INVALID_FORMAT_MESSAGE),
                other => panic!("expected import error for {}, got {:?}", payload, other),
            }
        }
        assert!(matches!(parse_import("not json"), Err(Error::Import(_))));
    }

    #[test]
    fn test_import_skips_bad_elements() {
        let payload = r#"[
            {"name": "Spotify", "price": "10900", "period": "monthly",
             "category": "Music", "nextPayment": "2024-02-01"},
            {"name": "", "price": 1, "category": "x", "nextPayment": "2024-02-01"},
            {"name": "No date", "price": 1, "category": "x"},
            {"name": "Negative", "price": -3, "category": "x", "nextPayment": "2024-02-01"},
            "string element"
        ]"#;

        let batch = parse_import(payload).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].name, "Spotify");
        assert_eq!(batch.records[0].price, 10900.0);
        let skipped: Vec<usize> = batch.skipped.iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_array_is_valid() {
        let batch = parse_import("[]").unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_csv_export() {
        let csv = to_csv(&[sample()]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,name,price,period,category,nextPayment,paymentMethod,isActive,notes,createdAt"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("sub-1,\"Netflix, Premium\",17000.0,monthly,Entertainment,2024-01-15,Card,true,,"));
    }

    #[test]
    fn test_write_file_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        write_file_atomic(&path, "[]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");

        write_file_atomic(&path, "[1]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1]");
    }
}
