//! Per-domain orchestration over the UK Parliament APIs.
//!
//! Each domain owns its [`EndpointConfig`](crate::endpoint::EndpointConfig),
//! a [`Pager`](crate::pagination::Pager) bound to that endpoint's page size,
//! and a [`FanOut`](crate::enrich::FanOut) strategy for per-item enrichment.
//! Domains are built either from [`Config`] (`connect`) or around any
//! [`ResourceClient`] (`with_client`), which is how tests inject mocks.

mod bills;
mod calendar;
mod committees;
mod divisions;
mod members;
mod references;

pub use bills::{BillReferences, Bills};
pub use calendar::{Calendar, CalendarReferences, SessionSelector};
pub use committees::Committees;
pub use divisions::{Divisions, House};
pub use members::Members;
pub use references::ParliamentReferences;

use std::sync::Arc;

use serde_json::Value;

use crate::client::{HttpResourceClient, ResourceClient};
use crate::config::Config;
use crate::endpoint::EndpointConfig;
use crate::error::ParleyError;

fn http_client(
    config: &Config,
    endpoint: &EndpointConfig,
) -> Result<Arc<dyn ResourceClient>, ParleyError> {
    Ok(Arc::new(HttpResourceClient::from_config(config, endpoint.base())?))
}

/// Bodies that are a bare JSON array rather than a paged object.
fn expect_array(path: &str, body: Value) -> Result<Vec<Value>, ParleyError> {
    match body {
        Value::Array(items) => Ok(items),
        _ => Err(ParleyError::malformed_page(path, "expected a JSON array")),
    }
}
