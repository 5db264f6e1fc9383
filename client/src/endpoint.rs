//! Immutable endpoint configuration and the catalogue of upstream services.
//!
//! Each domain owns one [`EndpointConfig`]: a base address, a set of named
//! relative paths (some templated with `{placeholder}` segments), and the
//! maximum page size used as the default pagination chunk.

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::error::ParleyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    base: String,
    paths: BTreeMap<&'static str, &'static str>,
    page_size_max: usize,
}

impl EndpointConfig {
    #[must_use]
    pub fn new(
        base: impl Into<String>,
        paths: &[(&'static str, &'static str)],
        page_size_max: usize,
    ) -> Self {
        Self {
            base: base.into(),
            paths: paths.iter().copied().collect(),
            page_size_max,
        }
    }

    /// Copy of this configuration pointing at a different base address.
    ///
    /// `None` keeps the current base, so optional overrides can be passed
    /// straight through.
    #[must_use]
    pub fn with_base(&self, base: Option<&str>) -> Self {
        let mut config = self.clone();
        if let Some(base) = base {
            config.base = base.to_string();
        }
        config
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub const fn page_size_max(&self) -> usize {
        self.page_size_max
    }

    /// Look up a named path.
    ///
    /// # Errors
    /// Returns [`ParleyError::Configuration`] if no path has that name.
    pub fn path(&self, name: &str) -> Result<&'static str, ParleyError> {
        self.paths.get(name).copied().ok_or_else(|| {
            ParleyError::Configuration(format!("no endpoint path named '{name}' for {}", self.base))
        })
    }

    /// Look up a named path and fill its `{placeholder}` segments.
    ///
    /// Substituted values are percent-encoded, so each fills exactly one
    /// path segment.
    ///
    /// # Errors
    /// Returns [`ParleyError::Configuration`] if the name is unknown or any
    /// placeholder is left without a substitution.
    pub fn render(
        &self,
        name: &str,
        substitutions: &[(&str, &dyn Display)],
    ) -> Result<String, ParleyError> {
        let mut rendered = self.path(name)?.to_string();
        for (placeholder, value) in substitutions {
            let segment = urlencoding::encode(&value.to_string()).into_owned();
            rendered = rendered.replace(&format!("{{{placeholder}}}"), &segment);
        }
        if let Some(start) = rendered.find('{') {
            let unfilled = rendered[start..]
                .split_once('}')
                .map_or(&rendered[start..], |(head, _)| head);
            return Err(ParleyError::Configuration(format!(
                "path '{name}' has unfilled placeholder {unfilled}}}"
            )));
        }
        Ok(rendered)
    }
}

pub const BILLS_BASE: &str = "https://bills-api.parliament.uk/api/";
pub const MEMBERS_BASE: &str = "https://members-api.parliament.uk/api/";
pub const COMMONS_VOTES_BASE: &str = "https://commonsvotes-api.parliament.uk/data/";
pub const LORDS_VOTES_BASE: &str = "https://lordsvotes-api.parliament.uk/data/";
pub const CALENDAR_BASE: &str = "https://whatson-api.parliament.uk/calendar/";
pub const COMMITTEES_BASE: &str = "https://committees-api.parliament.uk/api/";

#[must_use]
pub fn bills() -> EndpointConfig {
    EndpointConfig::new(
        BILLS_BASE,
        &[
            ("search", "v1/Bills"),
            ("bill", "v1/Bills/{bill_id}"),
            ("publications", "v1/Bills/{bill_id}/Publications"),
            ("stages", "v1/Bills/{bill_id}/Stages"),
            ("stage_publications", "v1/Bills/{bill_id}/Stages/{stage_id}/Publications"),
            ("amendments", "v1/Bills/{bill_id}/Stages/{stage_id}/Amendments"),
            ("sittings", "v1/Sittings"),
            ("bill_types", "v1/BillTypes"),
            ("publication_types", "v1/PublicationTypes"),
            ("stage_types", "v1/Stages"),
        ],
        999,
    )
}

#[must_use]
pub fn members() -> EndpointConfig {
    EndpointConfig::new(MEMBERS_BASE, &[("search", "Members/Search")], 20)
}

#[must_use]
pub fn commons_divisions() -> EndpointConfig {
    EndpointConfig::new(
        COMMONS_VOTES_BASE,
        &[
            ("search", "divisions.json/search"),
            ("division", "division/{division_id}.json"),
        ],
        999,
    )
}

#[must_use]
pub fn lords_divisions() -> EndpointConfig {
    EndpointConfig::new(LORDS_VOTES_BASE, &[("search", "Divisions/search")], 999)
}

#[must_use]
pub fn calendar() -> EndpointConfig {
    EndpointConfig::new(
        CALENDAR_BASE,
        &[
            ("events", "events/list.json"),
            ("non_sitting_days", "events/nonsitting.json"),
            ("sessions", "sessions/list.json"),
            ("event_types", "types/list.json"),
            ("event_categories", "categories/list.json"),
            ("event_locations", "locations/list.json"),
        ],
        31,
    )
}

#[must_use]
pub fn committees() -> EndpointConfig {
    EndpointConfig::new(
        COMMITTEES_BASE,
        &[
            ("search", "Committees"),
            ("members", "Committees/{committee_id}/Members"),
        ],
        30,
    )
}
