//! Common test utilities for API testing with a mock worker.
//!
//! This module provides a test fixture that creates an in-process server
//! with a [`MockWorker`] injected, so the full request path and the dispatch
//! loop can be exercised without any external service.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use ingestor_core::{testing::MockWorker, BatchWorker, Config, DispatcherConfig};
use ingestor_server::state::AppState;

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ingest() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/ingest", json!({
///         "ids": [1, 2, 3],
///         "priority": "HIGH"
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state, for driving the dispatcher directly
    pub state: Arc<AppState>,
    /// Mock worker - inspect dispatched batches, inject failures
    pub worker: Arc<MockWorker>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture whose dispatcher is stopped.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let worker = Arc::new(MockWorker::new());

        let config = Config {
            dispatcher: DispatcherConfig {
                rate_limit_window_ms: test_config.rate_limit_window_ms,
                burst: 1,
                process_delay_ms: 0,
                shutdown_grace_ms: 1000,
            },
            ..Config::default()
        };

        let state = Arc::new(AppState::in_memory(
            config,
            Arc::clone(&worker) as Arc<dyn BatchWorker>,
        ));
        if test_config.start_dispatcher {
            state.dispatcher().start().await;
        }

        // Create router
        let router = ingestor_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            worker,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> StatusCode {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        response.status()
    }

    /// Send a GET request and return the body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Poll `/status/{id}` until the aggregate status matches or the timeout expires.
    pub async fn wait_for_status(
        &self,
        ingestion_id: &str,
        expected: &str,
        timeout: Duration,
    ) -> Value {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let response = self.get(&format!("/status/{}", ingestion_id)).await;
            if response.body["status"] == expected {
                return response.body;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!(
                    "ingestion {} did not reach {} in time, last body: {}",
                    ingestion_id, expected, response.body
                );
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Start the dispatch loop before returning the fixture
    pub start_dispatcher: bool,
    /// Rate limit window for the dispatcher
    pub rate_limit_window_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            start_dispatcher: false,
            rate_limit_window_ms: 5000,
        }
    }
}

impl TestConfig {
    /// Running dispatcher with a short window, for lifecycle tests.
    pub fn with_dispatcher(rate_limit_window_ms: u64) -> Self {
        Self {
            start_dispatcher: true,
            rate_limit_window_ms,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
