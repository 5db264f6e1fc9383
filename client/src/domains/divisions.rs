//! Commons and Lords divisions (votes).
//!
//! The two houses publish divisions through separate services with different
//! shapes. [`House`] selects the endpoint set and whether per-division detail
//! is fetched.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use crate::client::ResourceClient;
use crate::config::Config;
use crate::endpoint::{self, EndpointConfig};
use crate::enrich::{enrich_each, FanOut, Merge};
use crate::error::ParleyError;
use crate::pagination::Pager;
use crate::query::QueryParams;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DETAIL_FIELDS: &[&str] = &["Ayes", "Noes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum House {
    Commons,
    Lords,
}

impl House {
    #[must_use]
    pub fn endpoint(self) -> EndpointConfig {
        match self {
            Self::Commons => endpoint::commons_divisions(),
            Self::Lords => endpoint::lords_divisions(),
        }
    }

    /// Whether each division in a search result is followed by a detail fetch.
    #[must_use]
    pub const fn fetches_detail(self) -> bool {
        matches!(self, Self::Commons)
    }

    fn base_override(self, config: &Config) -> Option<&str> {
        match self {
            Self::Commons => config.endpoints.commons_votes.as_deref(),
            Self::Lords => config.endpoints.lords_votes.as_deref(),
        }
    }
}

impl FromStr for House {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commons" => Ok(Self::Commons),
            "lords" => Ok(Self::Lords),
            _ => Err(ParleyError::Configuration(format!(
                "house must be 'Commons' or 'Lords', got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commons => f.write_str("Commons"),
            Self::Lords => f.write_str("Lords"),
        }
    }
}

pub struct Divisions {
    house: House,
    endpoint: EndpointConfig,
    pager: Pager,
    fan_out: FanOut,
}

impl Divisions {
    /// Build a divisions client for `house` ("Commons" or "Lords", any case).
    ///
    /// # Errors
    /// Returns [`ParleyError::Configuration`] for any other house, before an
    /// HTTP client is built or a request issued.
    pub fn connect(house: &str, config: &Config) -> Result<Self, ParleyError> {
        let house: House = house.parse()?;
        let endpoint = house.endpoint().with_base(house.base_override(config));
        let client = super::http_client(config, &endpoint)?;
        Ok(Self::build(house, endpoint, client, config.fan_out()))
    }

    /// # Errors
    /// Returns [`ParleyError::Configuration`] for an unrecognised house.
    pub fn with_client(
        house: &str,
        client: Arc<dyn ResourceClient>,
        fan_out: FanOut,
    ) -> Result<Self, ParleyError> {
        let house: House = house.parse()?;
        Ok(Self::build(house, house.endpoint(), client, fan_out))
    }

    fn build(
        house: House,
        endpoint: EndpointConfig,
        client: Arc<dyn ResourceClient>,
        fan_out: FanOut,
    ) -> Self {
        let pager = Pager::new(client, endpoint.page_size_max());
        Self {
            house,
            endpoint,
            pager,
            fan_out,
        }
    }

    #[must_use]
    pub const fn house(&self) -> House {
        self.house
    }

    /// Divisions held between two dates, including those where the member
    /// was a teller.
    ///
    /// Commons divisions gain their `Ayes` and `Noes` lists from one detail
    /// request each; Lords divisions are returned as searched.
    ///
    /// # Errors
    /// Fails fast on any fetch error, a search body that is not an array, or a
    /// Commons detail record without `Ayes` or `Noes`.
    pub async fn get_divisions(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Value>, ParleyError> {
        let path = self.endpoint.path("search")?;
        let params = QueryParams::new()
            .with("startDate", start_date.format(DATE_FORMAT).to_string())
            .with("endDate", end_date.format(DATE_FORMAT).to_string())
            .with("includeWhenMemberWasTeller", true);
        let divisions = super::expect_array(path, self.pager.fetch(path, &params).await?)?;
        tracing::debug!(house = %self.house, count = divisions.len(), "fetched divisions");

        if !self.house.fetches_detail() {
            return Ok(divisions);
        }

        let pager = &self.pager;
        let endpoint = &self.endpoint;
        enrich_each(
            divisions,
            "DivisionId",
            Merge::Copy(DETAIL_FIELDS),
            &self.fan_out,
            move |division_id| async move {
                let path = endpoint.render("division", &[("division_id", &division_id)])?;
                pager.fetch(&path, &QueryParams::new()).await
            },
        )
        .await
    }
}
