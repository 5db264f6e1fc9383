//! What's On calendar API: events, non-sitting days, sessions and the
//! event reference tables.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::client::ResourceClient;
use crate::config::Config;
use crate::endpoint::{self, EndpointConfig};
use crate::error::ParleyError;
use crate::normalize::{normalize, TypeMap};
use crate::pagination::Pager;
use crate::query::QueryParams;

// The calendar service takes dd-mm-yyyy.
const DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalendarReferences {
    pub event_types: TypeMap,
    pub event_categories: TypeMap,
    pub event_locations: TypeMap,
}

/// Picks a parliamentary session by explicit id or by a date inside it.
///
/// An explicit id wins when both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSelector {
    pub session_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

impl SessionSelector {
    #[must_use]
    pub const fn id(session_id: i64) -> Self {
        Self {
            session_id: Some(session_id),
            date: None,
        }
    }

    #[must_use]
    pub const fn date(date: NaiveDate) -> Self {
        Self {
            session_id: None,
            date: Some(date),
        }
    }

    fn validate(&self) -> Result<(), ParleyError> {
        if self.session_id.is_none() && self.date.is_none() {
            return Err(ParleyError::Configuration(
                "a session id or a date within the session is required".into(),
            ));
        }
        Ok(())
    }

    fn matches(&self, session: &Value) -> Result<bool, ParleyError> {
        if let Some(id) = self.session_id {
            return Ok(session.get("Id").and_then(Value::as_i64) == Some(id));
        }
        let Some(date) = self.date else {
            return Ok(false);
        };
        let (start, end) = session_bounds(session)?;
        Ok(start <= date && end.is_none_or(|end| date <= end))
    }
}

fn parse_session_date(session: &Value, field: &str) -> Result<Option<NaiveDate>, ParleyError> {
    match session.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => raw
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .map(Some)
            .ok_or_else(|| {
                ParleyError::malformed_record(field, format!("unparseable date '{raw}'"))
            }),
        Some(other) => Err(ParleyError::malformed_record(
            field,
            format!("expected a date string, got {other}"),
        )),
    }
}

/// `(StartDate, EndDate)` of a session; the current session has no end.
fn session_bounds(session: &Value) -> Result<(NaiveDate, Option<NaiveDate>), ParleyError> {
    let start = parse_session_date(session, "StartDate")?
        .ok_or_else(|| ParleyError::malformed_record("StartDate", "session has no start date"))?;
    Ok((start, parse_session_date(session, "EndDate")?))
}

pub struct Calendar {
    endpoint: EndpointConfig,
    pager: Pager,
}

impl Calendar {
    /// # Errors
    /// Returns [`ParleyError::Request`] if the HTTP client cannot be built.
    pub fn connect(config: &Config) -> Result<Self, ParleyError> {
        let endpoint = endpoint::calendar().with_base(config.endpoints.calendar.as_deref());
        let client = super::http_client(config, &endpoint)?;
        Ok(Self::build(endpoint, client))
    }

    pub fn with_client(client: Arc<dyn ResourceClient>) -> Self {
        Self::build(endpoint::calendar(), client)
    }

    fn build(endpoint: EndpointConfig, client: Arc<dyn ResourceClient>) -> Self {
        let pager = Pager::new(client, endpoint.page_size_max());
        Self { endpoint, pager }
    }

    /// Event type, category and location tables keyed by `Id`.
    ///
    /// # Errors
    /// Fails fast on any fetch error or unkeyable record.
    pub async fn get_references(&self) -> Result<CalendarReferences, ParleyError> {
        Ok(CalendarReferences {
            event_types: self.type_map("event_types").await?,
            event_categories: self.type_map("event_categories").await?,
            event_locations: self.type_map("event_locations").await?,
        })
    }

    /// Every session; the service offers no filtering.
    ///
    /// # Errors
    /// Fails on fetch error or a body that is not an array.
    pub async fn get_sessions(&self) -> Result<Vec<Value>, ParleyError> {
        let path = self.endpoint.path("sessions")?;
        let body = self.pager.fetch(path, &QueryParams::new()).await?;
        super::expect_array(path, body)
    }

    /// # Errors
    /// Propagates any fetch error.
    pub async fn get_events(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Value, ParleyError> {
        self.fetch_between("events", start_date, end_date).await
    }

    /// Non-sitting days (recesses) between two dates.
    ///
    /// # Errors
    /// Propagates any fetch error.
    pub async fn get_recesses(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Value, ParleyError> {
        self.fetch_between("non_sitting_days", start_date, end_date)
            .await
    }

    /// Events of the session chosen by `selector`.
    ///
    /// An open-ended (current) session runs up to today.
    ///
    /// # Errors
    /// Returns [`ParleyError::Configuration`] before any request when the
    /// selector names neither a session nor a date, and after the sessions
    /// lookup when nothing matches.
    pub async fn get_session_events(
        &self,
        selector: SessionSelector,
    ) -> Result<Value, ParleyError> {
        selector.validate()?;

        let sessions = self.get_sessions().await?;
        let mut found = None;
        for session in &sessions {
            if selector.matches(session)? {
                found = Some(session);
                break;
            }
        }
        let session = found.ok_or_else(|| {
            ParleyError::Configuration(format!("no session matches {selector:?}"))
        })?;

        let (start, end) = session_bounds(session)?;
        let end = end.unwrap_or_else(|| Utc::now().date_naive());
        tracing::debug!(%start, %end, "resolved session bounds");
        self.get_events(start, end).await
    }

    async fn fetch_between(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Value, ParleyError> {
        let params = QueryParams::new()
            .with("startDate", start_date.format(DATE_FORMAT).to_string())
            .with("endDate", end_date.format(DATE_FORMAT).to_string());
        self.pager.fetch(self.endpoint.path(name)?, &params).await
    }

    async fn type_map(&self, name: &str) -> Result<TypeMap, ParleyError> {
        let path = self.endpoint.path(name)?;
        let body = self.pager.fetch(path, &QueryParams::new()).await?;
        normalize(super::expect_array(path, body)?, "Id")
    }
}
