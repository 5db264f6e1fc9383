//! Reference tables from every service, loaded in one call.

use serde::Serialize;

use super::{BillReferences, Bills, Calendar, CalendarReferences};
use crate::config::Config;
use crate::error::ParleyError;

/// Every reference table the client knows about, fetched together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParliamentReferences {
    pub bills: BillReferences,
    pub calendar: CalendarReferences,
}

impl ParliamentReferences {
    /// # Errors
    /// Fails fast on the first fetch error from either service.
    pub async fn fetch(bills: &Bills, calendar: &Calendar) -> Result<Self, ParleyError> {
        Ok(Self {
            bills: bills.get_references().await?,
            calendar: calendar.get_references().await?,
        })
    }

    /// Connect to both services from `config` and fetch.
    ///
    /// # Errors
    /// Fails if either client cannot be built or any fetch fails.
    pub async fn load(config: &Config) -> Result<Self, ParleyError> {
        let bills = Bills::connect(config)?;
        let calendar = Calendar::connect(config)?;
        Self::fetch(&bills, &calendar).await
    }
}
