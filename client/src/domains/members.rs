//! Members API.

use std::sync::Arc;

use serde_json::Value;

use crate::client::ResourceClient;
use crate::config::Config;
use crate::endpoint::{self, EndpointConfig};
use crate::error::ParleyError;
use crate::pagination::Pager;
use crate::query::QueryParams;

pub struct Members {
    endpoint: EndpointConfig,
    pager: Pager,
}

impl Members {
    /// # Errors
    /// Returns [`ParleyError::Request`] if the HTTP client cannot be built.
    pub fn connect(config: &Config) -> Result<Self, ParleyError> {
        let endpoint = endpoint::members().with_base(config.endpoints.members.as_deref());
        let client = super::http_client(config, &endpoint)?;
        Ok(Self::build(endpoint, client))
    }

    pub fn with_client(client: Arc<dyn ResourceClient>) -> Self {
        Self::build(endpoint::members(), client)
    }

    fn build(endpoint: EndpointConfig, client: Arc<dyn ResourceClient>) -> Self {
        let pager = Pager::new(client, endpoint.page_size_max());
        Self { endpoint, pager }
    }

    /// Every member matching `params` (all members ever, when empty).
    ///
    /// The search endpoint wraps each member as `{"value": {...}, "links": [...]}`;
    /// only the `value` is returned.
    ///
    /// # Errors
    /// Fails fast on any page fetch error or an item without `value`.
    pub async fn get_members(&self, params: &QueryParams) -> Result<Vec<Value>, ParleyError> {
        self.pager
            .paginate_by_link(self.endpoint.path("search")?, params)
            .await?
            .into_items()
            .into_iter()
            .map(|mut item| match item.get_mut("value") {
                Some(value) => Ok(value.take()),
                None => Err(ParleyError::malformed_record("value", "member item has no 'value'")),
            })
            .collect()
    }
}
