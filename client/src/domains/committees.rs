//! Committees API.

use std::sync::Arc;

use serde_json::Value;

use crate::client::ResourceClient;
use crate::config::Config;
use crate::endpoint::{self, EndpointConfig};
use crate::enrich::{flatten_tagged, FanOut};
use crate::error::ParleyError;
use crate::normalize::RecordId;
use crate::pagination::Pager;
use crate::query::QueryParams;

/// Field added to every member record naming the committee it came from.
pub const COMMITTEE_TAG: &str = "committeeId";

pub struct Committees {
    endpoint: EndpointConfig,
    pager: Pager,
    fan_out: FanOut,
}

impl Committees {
    /// # Errors
    /// Returns [`ParleyError::Request`] if the HTTP client cannot be built.
    pub fn connect(config: &Config) -> Result<Self, ParleyError> {
        let endpoint = endpoint::committees().with_base(config.endpoints.committees.as_deref());
        let client = super::http_client(config, &endpoint)?;
        Ok(Self::build(endpoint, client, config.fan_out()))
    }

    pub fn with_client(client: Arc<dyn ResourceClient>, fan_out: FanOut) -> Self {
        Self::build(endpoint::committees(), client, fan_out)
    }

    fn build(endpoint: EndpointConfig, client: Arc<dyn ResourceClient>, fan_out: FanOut) -> Self {
        let pager = Pager::new(client, endpoint.page_size_max());
        Self {
            endpoint,
            pager,
            fan_out,
        }
    }

    /// # Errors
    /// Fails fast on any page fetch error.
    pub async fn get_committees(&self, params: &QueryParams) -> Result<Vec<Value>, ParleyError> {
        Ok(self
            .pager
            .paginate_by_window(self.endpoint.path("search")?, params)
            .await?
            .into_items())
    }

    /// Members of one committee.
    ///
    /// # Errors
    /// Fails fast on any page fetch error.
    pub async fn get_members(&self, committee_id: i64) -> Result<Vec<Value>, ParleyError> {
        self.members_of(&RecordId::Int(committee_id)).await
    }

    /// Members of every committee matching `params`, each tagged with
    /// `committeeId` and flattened in committee order.
    ///
    /// # Errors
    /// Fails fast on any list or member fetch error.
    pub async fn get_all_members(&self, params: &QueryParams) -> Result<Vec<Value>, ParleyError> {
        let committees = self.get_committees(params).await?;
        tracing::debug!(count = committees.len(), "fetching committee members");

        let fetch_members = |committee_id: RecordId| async move {
            self.members_of(&committee_id).await
        };
        flatten_tagged(
            &committees,
            "id",
            COMMITTEE_TAG,
            &self.fan_out,
            fetch_members,
        )
        .await
    }

    async fn members_of(&self, committee_id: &RecordId) -> Result<Vec<Value>, ParleyError> {
        let path = self
            .endpoint
            .render("members", &[("committee_id", committee_id)])?;
        Ok(self
            .pager
            .paginate_by_window(&path, &QueryParams::new())
            .await?
            .into_items())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockResourceClient;
    use serde_json::json;

    #[tokio::test]
    async fn test_all_members_tagged_with_committee() {
        let mock = Arc::new(MockResourceClient::new());
        mock.respond_json(
            "Committees?Skip=0&Take=30",
            json!({
                "items": [{"id": 17, "name": "Treasury"}, {"id": 24, "name": "Justice"}],
                "totalResults": 2
            }),
        )
        .respond_json(
            "Committees/17/Members?Skip=0&Take=30",
            json!({"items": [{"personId": 1}]}),
        )
        .respond_json(
            "Committees/24/Members?Skip=0&Take=30",
            json!({"items": [{"personId": 2}, {"personId": 3}]}),
        );

        let committees = Committees::with_client(mock.clone(), FanOut::Sequential);
        let members = committees
            .get_all_members(&QueryParams::new())
            .await
            .expect("should fetch members");

        assert_eq!(members.len(), 3);
        assert_eq!(members[0], json!({"personId": 1, "committeeId": 17}));
        assert_eq!(members[1][COMMITTEE_TAG], 24);
        assert_eq!(members[2][COMMITTEE_TAG], 24);
        assert_eq!(
            mock.calls(),
            vec![
                "Committees?Skip=0&Take=30",
                "Committees/17/Members?Skip=0&Take=30",
                "Committees/24/Members?Skip=0&Take=30",
            ]
        );
    }

    #[tokio::test]
    async fn test_members_of_one_committee() {
        let mock = Arc::new(MockResourceClient::new());
        let full_page: Vec<_> = (0..30).map(|n| json!({"personId": n})).collect();
        mock.respond_json(
            "Committees/17/Members?Skip=0&Take=30",
            json!({"items": full_page}),
        )
        .respond_json(
            "Committees/17/Members?Skip=30&Take=30",
            json!({"items": [{"personId": 30}]}),
        );

        let committees = Committees::with_client(mock.clone(), FanOut::Sequential);
        let members = committees
            .get_members(17)
            .await
            .expect("should fetch members");

        assert_eq!(members.len(), 31);
        // Single-committee members are not tagged.
        assert!(members[0].get(COMMITTEE_TAG).is_none());
        assert_eq!(
            mock.calls(),
            vec![
                "Committees/17/Members?Skip=0&Take=30",
                "Committees/17/Members?Skip=30&Take=30",
            ]
        );
    }

    #[tokio::test]
    async fn test_member_fetch_failure_aborts_everything() {
        let mock = Arc::new(MockResourceClient::new());
        mock.respond_json(
            "Committees?Skip=0&Take=30",
            json!({"items": [{"id": 17}, {"id": 24}]}),
        )
        .respond_json("Committees/17/Members?Skip=0&Take=30", json!({"items": []}))
        .respond_status("Committees/24/Members?Skip=0&Take=30", 503);

        let result = Committees::with_client(mock, FanOut::Sequential)
            .get_all_members(&QueryParams::new())
            .await;

        assert!(matches!(result, Err(ParleyError::Http { status: 503, .. })));
    }
}
