//! Bills API: bills, stages, publications, amendments, sittings and the
//! reference type tables.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::client::ResourceClient;
use crate::config::Config;
use crate::endpoint::{self, EndpointConfig};
use crate::enrich::{enrich_each, FanOut, Merge};
use crate::error::ParleyError;
use crate::normalize::{normalize, RecordId, TypeMap};
use crate::pagination::{AggregatedResult, Pager};
use crate::query::QueryParams;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lookup tables for the ids that appear on bill records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BillReferences {
    pub bill_types: TypeMap,
    pub publication_types: TypeMap,
    pub stage_types: TypeMap,
}

pub struct Bills {
    endpoint: EndpointConfig,
    pager: Pager,
    fan_out: FanOut,
}

impl Bills {
    /// # Errors
    /// Returns [`ParleyError::Request`] if the HTTP client cannot be built.
    pub fn connect(config: &Config) -> Result<Self, ParleyError> {
        let endpoint = endpoint::bills().with_base(config.endpoints.bills.as_deref());
        let client = super::http_client(config, &endpoint)?;
        Ok(Self::build(endpoint, client, config.fan_out()))
    }

    pub fn with_client(client: Arc<dyn ResourceClient>, fan_out: FanOut) -> Self {
        Self::build(endpoint::bills(), client, fan_out)
    }

    fn build(endpoint: EndpointConfig, client: Arc<dyn ResourceClient>, fan_out: FanOut) -> Self {
        let pager = Pager::new(client, endpoint.page_size_max());
        Self {
            endpoint,
            pager,
            fan_out,
        }
    }

    /// Every bill matching `params`, each replaced by its full record.
    ///
    /// # Errors
    /// Fails fast on any list or detail fetch error.
    pub async fn get_bills(&self, params: &QueryParams) -> Result<Vec<Value>, ParleyError> {
        let summaries = self
            .pager
            .paginate_by_window(self.endpoint.path("search")?, params)
            .await?
            .into_items();
        tracing::debug!(count = summaries.len(), "fetching bill details");

        let pager = &self.pager;
        let endpoint = &self.endpoint;
        let fetch_detail = move |bill_id: RecordId| async move {
            let path = endpoint.render("bill", &[("bill_id", &bill_id)])?;
            pager.fetch(&path, &QueryParams::new()).await
        };
        enrich_each(
            summaries,
            "billId",
            Merge::Replace,
            &self.fan_out,
            fetch_detail,
        )
        .await
    }

    /// Publications attached to one bill.
    ///
    /// # Errors
    /// Fails on fetch error or a body without a `publications` field.
    pub async fn get_publications(&self, bill_id: i64) -> Result<Value, ParleyError> {
        let path = self
            .endpoint
            .render("publications", &[("bill_id", &bill_id)])?;
        let mut body = self.pager.fetch(&path, &QueryParams::new()).await?;
        body.get_mut("publications")
            .map(Value::take)
            .ok_or_else(|| ParleyError::malformed_page(&path, "missing 'publications'"))
    }

    /// Every amendment tabled at one stage of a bill.
    ///
    /// # Errors
    /// Fails fast on any page fetch error.
    pub async fn get_amendments(
        &self,
        bill_id: i64,
        stage_id: i64,
    ) -> Result<Vec<Value>, ParleyError> {
        let path = self
            .endpoint
            .render("amendments", &[("bill_id", &bill_id), ("stage_id", &stage_id)])?;
        Ok(self
            .pager
            .paginate_by_window(&path, &QueryParams::new())
            .await?
            .into_items())
    }

    /// Every stage of a bill, each with its publications under `documents`.
    ///
    /// # Errors
    /// Fails fast on any list or detail fetch error.
    pub async fn get_stages(&self, bill_id: i64) -> Result<Vec<Value>, ParleyError> {
        let path = self.endpoint.render("stages", &[("bill_id", &bill_id)])?;
        let stages = self
            .pager
            .paginate_by_window(&path, &QueryParams::new())
            .await?
            .into_items();

        let pager = &self.pager;
        let endpoint = &self.endpoint;
        let fetch_publications = move |stage_id: RecordId| async move {
            let path = endpoint.render(
                "stage_publications",
                &[("bill_id", &bill_id), ("stage_id", &stage_id)],
            )?;
            pager.fetch(&path, &QueryParams::new()).await
        };
        enrich_each(
            stages,
            "id",
            Merge::Nest("documents"),
            &self.fan_out,
            fetch_publications,
        )
        .await
    }

    /// Sittings at which bills were discussed between two dates.
    ///
    /// # Errors
    /// Fails fast on any page fetch error.
    pub async fn get_sittings(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<AggregatedResult, ParleyError> {
        let params = QueryParams::new()
            .with("dateFrom", date_from.format(DATE_FORMAT).to_string())
            .with("dateTo", date_to.format(DATE_FORMAT).to_string());
        self.pager
            .paginate_by_window(self.endpoint.path("sittings")?, &params)
            .await
    }

    /// Bill, publication and stage type tables, fetched fresh on every call.
    ///
    /// # Errors
    /// Fails fast on any fetch error or unkeyable type record.
    pub async fn get_references(&self) -> Result<BillReferences, ParleyError> {
        Ok(BillReferences {
            bill_types: self.type_map("bill_types").await?,
            publication_types: self.type_map("publication_types").await?,
            stage_types: self.type_map("stage_types").await?,
        })
    }

    async fn type_map(&self, name: &str) -> Result<TypeMap, ParleyError> {
        let records = self
            .pager
            .paginate_by_window(self.endpoint.path(name)?, &QueryParams::new())
            .await?
            .into_items();
        normalize(records, "id")
    }
}
