//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock indexers and a mock debrid backend injected, enabling E2E
//! testing without network access.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use rdflix_core::{
    config::DebridConfig,
    debrid::RecordingSleeper,
    testing::{MockDebridClient, MockIndexer},
    Config, DebridResolver, Indexer, StreamService,
};

/// Re-export fixtures for test convenience
pub use rdflix_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_movie_stream() {
///     let fixture = TestFixture::new();
///     fixture.indexer.add_record(fixtures::record("Movie.1080p", 'a', 10)).await;
///
///     let response = fixture.get("/stream/movie/tt1.json").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock indexer - configure torrent records
    pub indexer: Arc<MockIndexer>,
    /// Mock debrid backend - control job progress
    pub debrid: Arc<MockDebridClient>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub content_type: Option<String>,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a fixture with a configured debrid key.
    pub fn new() -> Self {
        Self::with_config(Config {
            debrid: DebridConfig {
                api_key: "test-key".to_string(),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    /// Create a fixture with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let indexer = Arc::new(MockIndexer::new("mock"));
        let debrid = Arc::new(MockDebridClient::new());

        let resolver = DebridResolver::with_sleeper(
            Arc::clone(&debrid) as Arc<dyn rdflix_core::DebridClient>,
            config.debrid.clone(),
            Arc::new(RecordingSleeper::new()),
        );

        let config = Arc::new(config);
        let indexers: Vec<Arc<dyn Indexer>> = vec![Arc::clone(&indexer) as Arc<dyn Indexer>];
        let service = Arc::new(StreamService::new(Arc::clone(&config), indexers, resolver));
        let state = Arc::new(rdflix_server::state::AppState::new(config, service));

        Self {
            router: rdflix_server::api::create_router(state),
            indexer,
            debrid,
        }
    }

    /// Send a GET request to the test router.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a GET request as if it came from `client`.
    pub async fn get_from(&self, path: &str, client: SocketAddr) -> TestResponse {
        let mut request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(client));
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            content_type,
            body,
            text,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        let response = &$response;
        assert_eq!(
            response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            response.status,
            response.text
        );
    };
}
