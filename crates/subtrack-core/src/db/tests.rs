//! Database tests

use super::*;
use crate::models::*;
use chrono::{NaiveDate, TimeZone, Utc};

fn new_sub(name: &str, price: f64, period: Option<Period>) -> NewSubscription {
    NewSubscription {
        name: name.to_string(),
        price,
        period,
        category: "Entertainment".to_string(),
        next_payment: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        payment_method: Some("Card".to_string()),
        is_active: true,
        notes: None,
    }
}

fn record(id: Option<&str>, name: &str) -> SubscriptionRecord {
    SubscriptionRecord {
        id: id.map(String::from),
        name: name.to_string(),
        price: 5000.0,
        period: Some(Period::Monthly),
        category: "Software".to_string(),
        next_payment: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        payment_method: None,
        is_active: true,
        notes: None,
        created_at: None,
    }
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert!(db.list_subscriptions().unwrap().is_empty());
    assert_eq!(db.count_subscriptions().unwrap(), 0);
}

#[test]
fn test_schema_exists() {
    let db = Database::in_memory().unwrap();
    let conn = db.conn().unwrap();

    let result: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('subscriptions') WHERE name IN ('id', 'name', 'price', 'period', 'category', 'next_payment', 'payment_method', 'is_active', 'notes', 'created_at')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(result, 10, "subscriptions table should have 10 expected columns");
}

#[test]
fn test_insert_and_get() {
    let db = Database::in_memory().unwrap();

    let created = db
        .insert_subscription(new_sub("Netflix", 17000.0, Some(Period::Monthly)))
        .unwrap();
    assert!(!created.id.is_empty());

    let fetched = db.get_subscription(&created.id).unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.payment_method.as_deref(), Some("Card"));

    assert!(db.get_subscription("missing").unwrap().is_none());
}

#[test]
fn test_insert_rejects_invalid() {
    let db = Database::in_memory().unwrap();
    let result = db.insert_subscription(new_sub("", 1000.0, None));
    assert!(result.is_err());
    assert_eq!(db.count_subscriptions().unwrap(), 0);
}

#[test]
fn test_ids_are_unique() {
    let db = Database::in_memory().unwrap();
    let a = db.insert_subscription(new_sub("A", 1.0, None)).unwrap();
    let b = db.insert_subscription(new_sub("A", 1.0, None)).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn test_list_newest_first() {
    let db = Database::in_memory().unwrap();
    db.insert_subscription(new_sub("First", 1.0, None)).unwrap();
    db.insert_subscription(new_sub("Second", 2.0, None)).unwrap();
    db.insert_subscription(new_sub("Third", 3.0, None)).unwrap();

    let names: Vec<String> = db
        .list_subscriptions()
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Third", "Second", "First"]);
}

#[test]
fn test_update_merges_fields() {
    let db = Database::in_memory().unwrap();
    let created = db
        .insert_subscription(new_sub("Spotify", 10900.0, Some(Period::Monthly)))
        .unwrap();

    let update = SubscriptionUpdate {
        price: Some(11900.0),
        is_active: Some(false),
        ..Default::default()
    };
    let updated = db.update_subscription(&created.id, &update).unwrap().unwrap();
    assert_eq!(updated.price, 11900.0);
    assert!(!updated.is_active);
    assert_eq!(updated.name, "Spotify");
    assert_eq!(updated.created_at, created.created_at);

    let fetched = db.get_subscription(&created.id).unwrap().unwrap();
    assert_eq!(fetched, updated);

    assert!(db
        .update_subscription("missing", &update)
        .unwrap()
        .is_none());
}

#[test]
fn test_delete() {
    let db = Database::in_memory().unwrap();
    let created = db.insert_subscription(new_sub("Gym", 50000.0, None)).unwrap();

    assert!(db.delete_subscription(&created.id).unwrap());
    assert!(!db.delete_subscription(&created.id).unwrap());
    assert!(db.get_subscription(&created.id).unwrap().is_none());
}

#[test]
fn test_replace_all_preserves_ids() {
    let db = Database::in_memory().unwrap();
    db.insert_subscription(new_sub("Old", 1.0, None)).unwrap();

    let mut kept = record(Some("keep-me"), "Kept");
    kept.created_at = Some(Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap());
    let count = db
        .replace_all_subscriptions(vec![kept, record(None, "Fresh")])
        .unwrap();
    assert_eq!(count, 2);

    let all = db.list_subscriptions().unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|s| s.name != "Old"));

    let kept = db.get_subscription("keep-me").unwrap().unwrap();
    assert_eq!(kept.name, "Kept");
    assert_eq!(
        kept.created_at,
        Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap()
    );
    // The record imported without a timestamp is newer
    assert_eq!(all[0].name, "Fresh");
}

#[test]
fn test_replace_all_duplicate_ids_keep_last() {
    let db = Database::in_memory().unwrap();
    let count = db
        .replace_all_subscriptions(vec![record(Some("dup"), "One"), record(Some("dup"), "Two")])
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(db.get_subscription("dup").unwrap().unwrap().name, "Two");
}

#[test]
fn test_replace_all_invalid_leaves_data() {
    let db = Database::in_memory().unwrap();
    db.insert_subscription(new_sub("Keep", 1.0, None)).unwrap();

    let mut bad = record(None, "Bad");
    bad.price = -5.0;
    assert!(db.replace_all_subscriptions(vec![record(None, "Ok"), bad]).is_err());

    let all = db.list_subscriptions().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Keep");
}

#[test]
fn test_clear() {
    let db = Database::in_memory().unwrap();
    db.insert_subscription(new_sub("A", 1.0, None)).unwrap();
    db.insert_subscription(new_sub("B", 2.0, None)).unwrap();

    assert_eq!(db.clear_subscriptions().unwrap(), 2);
    assert!(db.list_subscriptions().unwrap().is_empty());
}

#[test]
fn test_unencrypted_file_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subtrack.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::new_unencrypted(path).unwrap();
        db.insert_subscription(new_sub("Persisted", 9900.0, Some(Period::Yearly)))
            .unwrap();
    }

    let db = Database::new_unencrypted(path).unwrap();
    assert!(!db.is_encrypted());
    let all = db.list_subscriptions().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].period, Some(Period::Yearly));
    assert_eq!(db.path(), path);
}

#[test]
fn test_encrypted_file_needs_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secret.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::new_with_key(path, Some("correct horse")).unwrap();
        db.insert_subscription(new_sub("Secret", 1.0, None)).unwrap();
    }

    let db = Database::new_with_key(path, Some("correct horse")).unwrap();
    assert!(db.is_encrypted());
    assert_eq!(db.count_subscriptions().unwrap(), 1);

    assert!(Database::new_unencrypted(path).is_err());
}
