//! Test utilities for subtrack-core
//!
//! Provides an in-process mock of the remote document service so the remote
//! store can be exercised without a real backend.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

#[derive(Default)]
struct MockState {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
    token: Option<String>,
    failing: AtomicBool,
    requests: AtomicUsize,
}

type SharedState = Arc<MockState>;

/// Mock document server for remote store tests
pub struct MockDocumentServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDocumentServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::spawn(MockState::default()).await
    }

    /// Start a server that requires `Authorization: Bearer <token>`
    pub async fn start_with_token(token: &str) -> Self {
        Self::spawn(MockState {
            token: Some(token.to_string()),
            ..Default::default()
        })
        .await
    }

    async fn spawn(state: MockState) -> Self {
        let state = Arc::new(state);
        let app = Router::new()
            .route(
                "/collections/:collection/documents",
                get(list_documents)
                    .post(create_document)
                    .put(replace_documents)
                    .delete(clear_documents),
            )
            .route(
                "/collections/:collection/documents/:id",
                get(get_document)
                    .patch(patch_document)
                    .delete(delete_document),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Snapshot of the stored documents of a collection
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.state
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Store a document as-is (no id assignment, no validation)
    pub fn insert_raw(&self, collection: &str, doc: Value) {
        self.state
            .collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    /// Make every request fail with 503 until switched off again
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDocumentServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Count the request and enforce outage/auth settings
fn admit(state: &MockState, headers: &HeaderMap) -> Result<(), StatusCode> {
    state.requests.fetch_add(1, Ordering::SeqCst);

    if state.failing.load(Ordering::SeqCst) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    if let Some(ref token) = state.token {
        let expected = format!("Bearer {}", token);
        let provided = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return Err(StatusCode::UNAUTHORIZED);
        }
    }
    Ok(())
}

fn assign_id(state: &MockState, doc: &mut Value) {
    if let Value::Object(map) = doc {
        if !map.get("id").is_some_and(Value::is_string) {
            let id = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            map.insert("id".into(), Value::from(format!("doc-{}", id)));
        }
    }
}

fn doc_id(doc: &Value) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

async fn list_documents(
    State(state): State<SharedState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>, StatusCode> {
    admit(&state, &headers)?;
    let collections = state.collections.lock().unwrap();
    Ok(Json(collections.get(&collection).cloned().unwrap_or_default()))
}

async fn create_document(
    State(state): State<SharedState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(mut doc): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    admit(&state, &headers)?;
    if !doc.is_object() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if let Value::Object(ref mut map) = doc {
        // The server owns ids
        map.remove("id");
    }
    assign_id(&state, &mut doc);

    state
        .collections
        .lock()
        .unwrap()
        .entry(collection)
        .or_default()
        .push(doc.clone());
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn replace_documents(
    State(state): State<SharedState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(docs): Json<Vec<Value>>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    admit(&state, &headers)?;
    let mut stored: Vec<Value> = Vec::with_capacity(docs.len());
    for mut doc in docs {
        assign_id(&state, &mut doc);
        // Same id twice: last write wins
        if let Some(id) = doc_id(&doc).map(String::from) {
            stored.retain(|d| doc_id(d) != Some(id.as_str()));
        }
        stored.push(doc);
    }

    state
        .collections
        .lock()
        .unwrap()
        .insert(collection, stored.clone());
    Ok(Json(stored))
}

async fn clear_documents(
    State(state): State<SharedState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    admit(&state, &headers)?;
    let removed = state
        .collections
        .lock()
        .unwrap()
        .remove(&collection)
        .map(|docs| docs.len())
        .unwrap_or(0);
    Ok(Json(json!({ "deleted": removed })))
}

async fn get_document(
    State(state): State<SharedState>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    admit(&state, &headers)?;
    let collections = state.collections.lock().unwrap();
    let found = collections
        .get(&collection)
        .and_then(|docs| docs.iter().find(|d| doc_id(d) == Some(id.as_str())))
        .cloned();
    found.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn patch_document(
    State(state): State<SharedState>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    admit(&state, &headers)?;
    let Value::Object(patch) = patch else {
        return Err(StatusCode::BAD_REQUEST);
    };

    let mut collections = state.collections.lock().unwrap();
    let doc = collections
        .get_mut(&collection)
        .and_then(|docs| docs.iter_mut().find(|d| doc_id(d) == Some(id.as_str())))
        .ok_or(StatusCode::NOT_FOUND)?;

    if let Value::Object(map) = doc {
        for (key, value) in patch {
            if key != "id" {
                map.insert(key, value);
            }
        }
    }
    Ok(Json(doc.clone()))
}

async fn delete_document(
    State(state): State<SharedState>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> StatusCode {
    if let Err(status) = admit(&state, &headers) {
        return status;
    }
    let mut collections = state.collections.lock().unwrap();
    let Some(docs) = collections.get_mut(&collection) else {
        return StatusCode::NOT_FOUND;
    };
    let before = docs.len();
    docs.retain(|d| doc_id(d) != Some(id.as_str()));
    if docs.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
