//! HTTP mock server helpers for testing outbound HTTP calls.
//!
//! This module provides a thin wrapper around `wiremock` for declarative
//! HTTP stubbing of the upstream Parliament services.
//!
//! # Quick Start
//!
//! ```ignore
//! use crate::common::http_mock::MockHttpServer;
//!
//! #[tokio::test]
//! async fn test_external_api_call() {
//!     let server = MockHttpServer::start().await;
//!
//!     server
//!         .expect_get("/v1/Bills")
//!         .with_query("Skip", "0")
//!         .respond_with_json(json!({"items": []}))
//!         .expect_times(1)
//!         .mount()
//!         .await;
//!
//!     // Point a client at server.url(), then:
//!     server.verify().await;
//! }
//! ```
//!
//! # Patterns
//!
//! - **Success response**: `.respond_with_json(value)`
//! - **Error response**: `.respond_with_status(500)`, optionally `.with_json_response(value)`
//! - **Timeout simulation**: `.respond_with_delay(Duration::from_secs(30))`
//! - **Request verification**: `.expect_times(1)` to assert call count

#![allow(dead_code)]

use std::time::Duration;

use serde_json::Value;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer as WiremockServer, ResponseTemplate};

pub struct MockHttpServer {
    server: WiremockServer,
}

impl MockHttpServer {
    pub async fn start() -> Self {
        Self {
            server: WiremockServer::start().await,
        }
    }

    /// Base URL of the running server, without a trailing slash.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub fn inner(&self) -> &WiremockServer {
        &self.server
    }

    /// Assert every mounted `expect_times` expectation was met.
    pub async fn verify(&self) {
        self.server.verify().await;
    }

    /// Number of requests the server has received so far.
    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    /// Path and query of every request received, in order.
    pub async fn received_targets(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|request| match request.url.query() {
                Some(query) => format!("{}?{query}", request.url.path()),
                None => request.url.path().to_string(),
            })
            .collect()
    }

    pub fn expect_get(&self, route: &str) -> StubBuilder<'_> {
        StubBuilder {
            server: self,
            mock: Mock::given(method("GET")).and(path(route)),
            status: 200,
            body: None,
            delay: None,
            times: None,
        }
    }
}

pub struct StubBuilder<'a> {
    server: &'a MockHttpServer,
    mock: wiremock::MockBuilder,
    status: u16,
    body: Option<Value>,
    delay: Option<Duration>,
    times: Option<u64>,
}

impl StubBuilder<'_> {
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.mock = self.mock.and(header(name, value));
        self
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.mock = self.mock.and(query_param(name, value));
        self
    }

    pub fn without_query(mut self, name: &str) -> Self {
        self.mock = self.mock.and(query_param_is_missing(name));
        self
    }

    pub fn respond_with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn respond_with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// JSON body for a non-200 status set with `respond_with_status`.
    pub fn with_json_response(self, body: Value) -> Self {
        self.respond_with_json(body)
    }

    pub fn respond_with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn expect_times(mut self, times: u64) -> Self {
        self.times = Some(times);
        self
    }

    pub async fn mount(self) {
        let mut template = ResponseTemplate::new(self.status);
        if let Some(body) = self.body {
            template = template.set_body_json(body);
        }
        if let Some(delay) = self.delay {
            template = template.set_delay(delay);
        }
        let mut mock = self.mock.respond_with(template);
        if let Some(times) = self.times {
            mock = mock.expect(times);
        }
        mock.mount(&self.server.server).await;
    }
}
