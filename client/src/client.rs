//! Resource client: one bounded HTTP GET per call.
//!
//! The trait abstraction lets pagination and enrichment run against either
//! the real HTTP implementation or a scripted mock:
//!
//! - [`ResourceClient`] - Trait defining the single fetch operation
//! - [`HttpResourceClient`] - Real HTTP implementation using reqwest
//! - [`mock::MockResourceClient`] - Mock for unit tests (behind `test-utils` feature)
//!
//! # Example
//!
//! ```ignore
//! use parley_client::client::{HttpResourceClient, ResourceClient};
//! use parley_client::query::QueryParams;
//!
//! let client = HttpResourceClient::new("https://bills-api.parliament.uk/api/");
//! let page = client.fetch("v1/Bills", &QueryParams::new().with("Take", 5)).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::error::ParleyError;
use crate::query::QueryParams;

/// Trait for issuing a single GET against a configured base address.
///
/// `path` is relative to the base unless it is already an absolute
/// `http(s)://` URL, which is how server-supplied next-page links arrive.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch `path` with `params` and return the decoded JSON body unmodified.
    async fn fetch(&self, path: &str, params: &QueryParams) -> Result<Value, ParleyError>;
}

/// HTTP-based implementation of [`ResourceClient`].
///
/// The inner `reqwest::Client` pools connections across calls.
#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpResourceClient {
    /// Create a new client against the given base address.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a client with a custom `reqwest::Client` (for testing with custom config).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Create a client whose user agent and timeout come from [`Config`].
    ///
    /// # Errors
    /// Returns [`ParleyError::Request`] if the underlying client cannot be built.
    pub fn from_config(config: &Config, base_url: impl Into<String>) -> Result<Self, ParleyError> {
        let mut builder = reqwest::Client::builder().user_agent(config.http.user_agent.clone());
        if let Some(secs) = config.http.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self::with_client(builder.build()?, base_url))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a request target against the base address.
    #[must_use]
    pub fn url_for(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            target.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn fetch(&self, path: &str, params: &QueryParams) -> Result<Value, ParleyError> {
        let target = params.apply_to(path);
        let url = self.url_for(&target);
        tracing::debug!(%url, "fetching resource");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                path = %target,
                "upstream returned error status"
            );
            return Err(ParleyError::Http {
                status: status.as_u16(),
                path: target,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::missing_const_for_fn,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Mock implementation for unit testing.

    use super::{ParleyError, QueryParams, ResourceClient, Value};
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Canned response for one request target.
    pub enum Canned {
        Body(Value),
        Status(u16),
    }

    /// Mock implementation of [`ResourceClient`] for unit tests.
    ///
    /// Responses are keyed by request target (`path?query`, exactly as the
    /// HTTP client would build it). Several responses for the same target are
    /// served in order, the last one repeating. Unknown targets answer 404.
    /// Every target requested is recorded and available from [`Self::calls`].
    pub struct MockResourceClient {
        responses: Mutex<HashMap<String, VecDeque<Canned>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockResourceClient {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Queue a JSON body for `target`.
        pub fn respond_json(&self, target: impl Into<String>, body: Value) -> &Self {
            self.push(target.into(), Canned::Body(body));
            self
        }

        /// Queue an error status for `target`.
        pub fn respond_status(&self, target: impl Into<String>, status: u16) -> &Self {
            self.push(target.into(), Canned::Status(status));
            self
        }

        /// Get every request target, in the order requested.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn push(&self, target: String, canned: Canned) {
            self.responses
                .lock()
                .unwrap()
                .entry(target)
                .or_default()
                .push_back(canned);
        }
    }

    impl Default for MockResourceClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ResourceClient for MockResourceClient {
        async fn fetch(&self, path: &str, params: &QueryParams) -> Result<Value, ParleyError> {
            let target = params.apply_to(path);
            self.calls.lock().unwrap().push(target.clone());

            let mut responses = self.responses.lock().unwrap();
            let Some(queue) = responses.get_mut(&target) else {
                return Err(ParleyError::Http {
                    status: 404,
                    path: target,
                });
            };
            let canned = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().map(|c| match c {
                    Canned::Body(body) => Canned::Body(body.clone()),
                    Canned::Status(status) => Canned::Status(*status),
                })
            };

            match canned {
                Some(Canned::Body(body)) => Ok(body),
                Some(Canned::Status(status)) => Err(ParleyError::Http { status, path: target }),
                None => Err(ParleyError::Http {
                    status: 404,
                    path: target,
                }),
            }
        }
    }
}
