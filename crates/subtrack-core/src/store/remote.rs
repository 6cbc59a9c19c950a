//! Remote document store backend
//!
//! Talks JSON over HTTP to a document service that keeps one collection of
//! subscription documents:
//!
//! | Method   | Path                                  | Body / response            |
//! |----------|---------------------------------------|----------------------------|
//! | `GET`    | `/collections/{c}/documents`          | array of documents         |
//! | `POST`   | `/collections/{c}/documents`          | document -> created doc    |
//! | `PUT`    | `/collections/{c}/documents`          | array -> stored array      |
//! | `DELETE` | `/collections/{c}/documents`          | `{"deleted": n}`           |
//! | `GET`    | `/collections/{c}/documents/{id}`     | document, 404 if absent    |
//! | `PATCH`  | `/collections/{c}/documents/{id}`     | partial doc -> merged doc  |
//! | `DELETE` | `/collections/{c}/documents/{id}`     | 204, 404 if absent         |
//!
//! Documents use the JSON interchange format. The server assigns ids.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::RecordStore;
use crate::config::{RemoteConfig, StoreBackend};
use crate::error::{Error, Result};
use crate::models::{NewSubscription, Subscription, SubscriptionRecord, SubscriptionUpdate};

/// HTTP client for a remote document collection
#[derive(Clone)]
pub struct RemoteStore {
    http_client: Client,
    base_url: Url,
    collection: String,
    token: Option<String>,
}

impl RemoteStore {
    /// Create a client for `collection` under `base_url`
    pub fn new(
        base_url: &str,
        collection: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| Error::Config(format!("Invalid remote URL {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Remote URL cannot be used as a base: {}",
                base_url
            )));
        }
        if collection.trim().is_empty() || collection.contains('/') {
            return Err(Error::Config(format!(
                "Invalid collection name: {:?}",
                collection
            )));
        }

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url,
            collection: collection.to_string(),
            token,
        })
    }

    /// Create from the `[remote]` config section
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let url = config.url.as_deref().ok_or_else(|| {
            Error::Config(
                "Remote store selected but no URL configured. Set [remote] url or SUBTRACK_REMOTE_URL"
                    .to_string(),
            )
        })?;
        Self::new(url, &config.collection, config.token(), config.timeout)
    }

    fn url(&self, id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Config(format!("Invalid remote URL: {}", self.base_url)))?;
            segments
                .pop_if_empty()
                .extend(["collections", self.collection.as_str(), "documents"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, id: Option<&str>) -> Result<RequestBuilder> {
        let url = self.url(id)?;
        debug!(%method, %url, "Remote store request");
        let builder = self.http_client.request(method, url);
        Ok(match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        })
    }
}

/// Document from a single-document response, or `None` on 404
async fn optional_document(response: Response) -> Result<Option<Subscription>> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let value: Value = response.error_for_status()?.json().await?;
    parse_document(value).map(Some)
}

/// Convert a remote document into a record
///
/// Documents must carry an id; a missing `createdAt` sorts last.
pub(crate) fn parse_document(value: Value) -> Result<Subscription> {
    let record: SubscriptionRecord = serde_json::from_value(value)?;
    record.validate()?;
    if record.id.is_none() {
        return Err(Error::InvalidData("document has no id".to_string()));
    }
    Ok(record.into_subscription(String::new, DateTime::<Utc>::default()))
}

/// Parse a document list, skipping malformed entries
fn parse_documents(values: Vec<Value>) -> Vec<Subscription> {
    let mut records: Vec<Subscription> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match parse_document(value) {
            Ok(sub) => Some(sub),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed remote document");
                None
            }
        })
        .collect();

    // Newest first; stable so equal timestamps keep server order
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Deserialize)]
struct DeletedResponse {
    #[serde(default)]
    deleted: usize,
}

#[async_trait]
impl RecordStore for RemoteStore {
    async fn get_all(&self) -> Result<Vec<Subscription>> {
        let response = self.request(Method::GET, None)?.send().await?;
        let values: Vec<Value> = response.error_for_status()?.json().await?;
        Ok(parse_documents(values))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        let response = self.request(Method::GET, Some(id))?.send().await?;
        optional_document(response).await
    }

    async fn add(&self, new: NewSubscription) -> Result<Subscription> {
        new.validate()?;

        let mut body = serde_json::to_value(&new)?;
        if let Value::Object(ref mut doc) = body {
            doc.insert("createdAt".into(), Value::from(timestamp(Utc::now())));
        }

        let response = self
            .request(Method::POST, None)?
            .json(&body)
            .send()
            .await?;
        let value: Value = response.error_for_status()?.json().await?;
        parse_document(value)
            .map_err(|e| Error::Store(format!("Server returned an invalid document: {}", e)))
    }

    async fn update(&self, id: &str, update: &SubscriptionUpdate) -> Result<Option<Subscription>> {
        update.validate()?;
        let response = self
            .request(Method::PATCH, Some(id))?
            .json(&update.to_document())
            .send()
            .await?;
        optional_document(response).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let response = self.request(Method::DELETE, Some(id))?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response.error_for_status()?;
        Ok(true)
    }

    async fn save_all(&self, records: Vec<SubscriptionRecord>) -> Result<usize> {
        for record in &records {
            record.validate()?;
        }

        let now = timestamp(Utc::now());
        let mut body = Vec::with_capacity(records.len());
        for record in &records {
            let mut doc = serde_json::to_value(record)?;
            if let Value::Object(ref mut map) = doc {
                map.entry("createdAt")
                    .or_insert_with(|| Value::from(now.clone()));
            }
            body.push(doc);
        }

        let response = self
            .request(Method::PUT, None)?
            .json(&body)
            .send()
            .await?;
        let stored: Vec<Value> = response.error_for_status()?.json().await?;
        Ok(stored.len())
    }

    async fn clear(&self) -> Result<usize> {
        let response = self.request(Method::DELETE, None)?.send().await?;
        let result: DeletedResponse = response.error_for_status()?.json().await?;
        Ok(result.deleted)
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Remote
    }

    fn location(&self) -> String {
        self.url(None)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| self.base_url.to_string())
    }
}
