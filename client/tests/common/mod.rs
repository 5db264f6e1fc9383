//! Common test utilities for integration tests.
//!
//! - [`http_mock::MockHttpServer`] - Declarative HTTP stubbing over `wiremock`
//! - [`config_for`] - A [`Config`] whose every endpoint points at one server

pub mod http_mock;

use parley_client::config::Config;

/// Default configuration with every base address overridden to `base`.
#[allow(dead_code)]
pub fn config_for(base: &str) -> Config {
    let mut config = Config::default();
    config.endpoints.bills = Some(base.to_string());
    config.endpoints.members = Some(base.to_string());
    config.endpoints.commons_votes = Some(base.to_string());
    config.endpoints.lords_votes = Some(base.to_string());
    config.endpoints.calendar = Some(base.to_string());
    config.endpoints.committees = Some(base.to_string());
    config
}
