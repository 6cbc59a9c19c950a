//! Swappable record persistence
//!
//! # Architecture
//!
//! - `RecordStore` trait: the CRUD + bulk replace contract every backend honors
//! - `Store` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backends: `Database` (local SQLite file) and `RemoteStore` (HTTP document API)
//!
//! `get_all` always returns records newest first (by `createdAt`).

mod remote;

pub use remote::RemoteStore;

use async_trait::async_trait;

use crate::config::{Config, StoreBackend};
use crate::db::Database;
use crate::error::Result;
use crate::models::{NewSubscription, Subscription, SubscriptionRecord, SubscriptionUpdate};

/// Persistence contract shared by the local and remote backends
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records, newest first
    async fn get_all(&self) -> Result<Vec<Subscription>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>>;

    /// Store a new record; the backend assigns id and creation time
    async fn add(&self, new: NewSubscription) -> Result<Subscription>;

    /// Merge fields into an existing record; `None` if the id is unknown
    async fn update(&self, id: &str, update: &SubscriptionUpdate) -> Result<Option<Subscription>>;

    /// Remove a record; `false` if the id is unknown
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Destructively replace the whole set, keeping ids that are present
    async fn save_all(&self, records: Vec<SubscriptionRecord>) -> Result<usize>;

    /// Remove every record
    async fn clear(&self) -> Result<usize>;

    /// Backend name for logs and status output
    fn backend(&self) -> StoreBackend;

    /// Where the records live (file path or collection URL)
    fn location(&self) -> String;

    /// Encryption at rest, when the backend controls it
    fn encrypted(&self) -> Option<bool> {
        None
    }
}

#[async_trait]
impl RecordStore for Database {
    async fn get_all(&self) -> Result<Vec<Subscription>> {
        self.list_subscriptions()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        self.get_subscription(id)
    }

    async fn add(&self, new: NewSubscription) -> Result<Subscription> {
        self.insert_subscription(new)
    }

    async fn update(&self, id: &str, update: &SubscriptionUpdate) -> Result<Option<Subscription>> {
        self.update_subscription(id, update)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.delete_subscription(id)
    }

    async fn save_all(&self, records: Vec<SubscriptionRecord>) -> Result<usize> {
        self.replace_all_subscriptions(records)
    }

    async fn clear(&self) -> Result<usize> {
        self.clear_subscriptions()
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Local
    }

    fn location(&self) -> String {
        self.path().to_string()
    }

    fn encrypted(&self) -> Option<bool> {
        Some(self.is_encrypted())
    }
}

/// Concrete record store
#[derive(Clone)]
pub enum Store {
    /// SQLite file (optionally SQLCipher-encrypted)
    Local(Database),
    /// Remote document collection over HTTP
    Remote(RemoteStore),
}

impl Store {
    /// Open the backend selected by configuration
    ///
    /// `db_path` and `no_encrypt` only matter for the local backend.
    pub fn open(config: &Config, db_path: &str, no_encrypt: bool) -> Result<Self> {
        match config.backend {
            StoreBackend::Local => {
                let db = if no_encrypt {
                    Database::new_unencrypted(db_path)?
                } else {
                    Database::new(db_path)?
                };
                Ok(Store::Local(db))
            }
            StoreBackend::Remote => Ok(Store::Remote(RemoteStore::from_config(&config.remote)?)),
        }
    }
}

impl From<Database> for Store {
    fn from(db: Database) -> Self {
        Store::Local(db)
    }
}

impl From<RemoteStore> for Store {
    fn from(remote: RemoteStore) -> Self {
        Store::Remote(remote)
    }
}

// Implement RecordStore for Store by delegating to the inner backend
#[async_trait]
impl RecordStore for Store {
    async fn get_all(&self) -> Result<Vec<Subscription>> {
        match self {
            Store::Local(s) => s.get_all().await,
            Store::Remote(s) => s.get_all().await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        match self {
            Store::Local(s) => s.get_by_id(id).await,
            Store::Remote(s) => s.get_by_id(id).await,
        }
    }

    async fn add(&self, new: NewSubscription) -> Result<Subscription> {
        match self {
            Store::Local(s) => s.add(new).await,
            Store::Remote(s) => s.add(new).await,
        }
    }

    async fn update(&self, id: &str, update: &SubscriptionUpdate) -> Result<Option<Subscription>> {
        match self {
            Store::Local(s) => s.update(id, update).await,
            Store::Remote(s) => s.update(id, update).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        match self {
            Store::Local(s) => s.delete(id).await,
            Store::Remote(s) => s.delete(id).await,
        }
    }

    async fn save_all(&self, records: Vec<SubscriptionRecord>) -> Result<usize> {
        match self {
            Store::Local(s) => s.save_all(records).await,
            Store::Remote(s) => s.save_all(records).await,
        }
    }

    async fn clear(&self) -> Result<usize> {
        match self {
            Store::Local(s) => s.clear().await,
            Store::Remote(s) => s.clear().await,
        }
    }

    fn backend(&self) -> StoreBackend {
        match self {
            Store::Local(s) => s.backend(),
            Store::Remote(s) => s.backend(),
        }
    }

    fn location(&self) -> String {
        match self {
            Store::Local(s) => s.location(),
            Store::Remote(s) => s.location(),
        }
    }

    fn encrypted(&self) -> Option<bool> {
        match self {
            Store::Local(s) => s.encrypted(),
            Store::Remote(s) => s.encrypted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;
    use chrono::NaiveDate;

    fn new_sub(name: &str) -> NewSubscription {
        NewSubscription {
            name: name.to_string(),
            price: 9900.0,
            period: Some(Period::Monthly),
            category: "Video".to_string(),
            next_payment: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            payment_method: None,
            is_active: true,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_local_store_dispatch() {
        let store = Store::from(Database::in_memory().unwrap());
        assert_eq!(store.backend(), StoreBackend::Local);

        let created = store.add(new_sub("Wavve")).await.unwrap();
        assert_eq!(store.get_all().await.unwrap().len(), 1);
        assert_eq!(
            store.get_by_id(&created.id).await.unwrap().unwrap().name,
            "Wavve"
        );

        assert!(store.delete(&created.id).await.unwrap());
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_open_local_unencrypted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let config = Config::default();

        let store = Store::open(&config, path.to_str().unwrap(), true).unwrap();
        assert_eq!(store.backend(), StoreBackend::Local);
        assert_eq!(store.location(), path.to_str().unwrap());
        assert_eq!(store.encrypted(), Some(false));
    }

    #[test]
    fn test_open_remote_requires_url() {
        let mut config = Config::default();
        config.backend = StoreBackend::Remote;
        config.remote.url = None;
        assert!(Store::open(&config, "unused.db", true).is_err());

        config.remote.url = Some("http://127.0.0.1:9/api".to_string());
        let store = Store::open(&config, "unused.db", true).unwrap();
        assert_eq!(store.backend(), StoreBackend::Remote);
        assert_eq!(store.encrypted(), None);
        assert_eq!(
            store.location(),
            "http://127.0.0.1:9/api/collections/subscriptions/documents"
        );
    }
}
