//! Shared test infrastructure.
//!
//! - `setup_test_db()` - fresh SQLite file in a temp dir, migrations applied
//! - `TestStorage` - uploads root in a temp dir
//! - `MockTransport` - scripted Google responses, counts calls

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;

use tourstack::config::GoogleEndpoints;
use tourstack::db;
use tourstack::google::{GoogleApi, GoogleError, Transport, UpstreamRequest, UpstreamResponse};
use tourstack::storage::Storage;

pub const TEST_API_KEY: &str = "test-key";

// ============================================================================
// DATABASE SETUP
// ============================================================================

/// Temp database; the directory lives as long as this value.
pub struct TestDb {
    _dir: TempDir,
    pool: SqlitePool,
}

impl TestDb {
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub async fn setup_test_db() -> TestDb {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("test.db").display());
    let pool = db::init_pool(&url).await.expect("Failed to open test DB");
    db::run_migrations(&pool).await.expect("Failed to run migrations");
    TestDb { _dir: dir, pool }
}

// ============================================================================
// UPLOADS
// ============================================================================

pub struct TestStorage {
    dir: TempDir,
    pub storage: Storage,
}

impl TestStorage {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create uploads dir");
        let storage = Storage::new(dir.path());
        TestStorage { dir, storage }
    }

    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }
}

// ============================================================================
// GOOGLE TRANSPORT
// ============================================================================

type Responder = Box<dyn Fn(&UpstreamRequest) -> Result<UpstreamResponse, GoogleError> + Send + Sync>;

/// Transport that records every request and answers from a closure.
pub struct MockTransport {
    calls: AtomicUsize,
    requests: Mutex<Vec<UpstreamRequest>>,
    responder: Responder,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&UpstreamRequest) -> Result<UpstreamResponse, GoogleError> + Send + Sync + 'static,
    {
        MockTransport {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Always answer 200 with `body`.
    pub fn ok_json(body: Value) -> Self {
        let text = body.to_string();
        Self::new(move |_| Ok(UpstreamResponse { status: 200, body: text.clone() }))
    }

    /// Always answer with `status` and a raw body.
    pub fn status(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::new(move |_| Ok(UpstreamResponse { status, body: body.clone() }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, GoogleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = (self.responder)(&request);
        self.requests.lock().expect("requests lock").push(request);
        response
    }
}

pub fn test_endpoints() -> GoogleEndpoints {
    GoogleEndpoints {
        translate_url: "https://translate.test/v2".to_string(),
        tts_url: "https://tts.test/v1".to_string(),
        vision_url: "https://vision.test/v1".to_string(),
    }
}

pub fn google_api(transport: MockTransport) -> GoogleApi<MockTransport> {
    GoogleApi::new(transport, TEST_API_KEY, test_endpoints())
}

/// Value of a query parameter on a recorded request.
pub fn query_param<'a>(request: &'a UpstreamRequest, key: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
