use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::enrich::FanOut;

/// Client configuration loaded from multiple sources.
///
/// Configuration is loaded in priority order (lowest to highest):
/// 1. Struct defaults
/// 2. parley.yaml file (if exists)
/// 3. Environment variables with PARLEY_ prefix (always wins)
///
/// Nothing in the fetch, pagination or enrichment paths reads the
/// environment; this is only consulted by callers that opt in.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub fan_out: FanOutConfig,
    #[serde(default)]
    pub endpoints: EndpointOverrides,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional whole-request timeout handed to the HTTP client.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FanOutConfig {
    /// Maximum child fetches in flight during enrichment. 1 = sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Base address overrides per upstream service (mirrors, local stubs).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EndpointOverrides {
    #[serde(default)]
    pub bills: Option<String>,
    #[serde(default)]
    pub members: Option<String>,
    #[serde(default)]
    pub commons_votes: Option<String>,
    #[serde(default)]
    pub lords_votes: Option<String>,
    #[serde(default)]
    pub calendar: Option<String>,
    #[serde(default)]
    pub committees: Option<String>,
}

impl EndpointOverrides {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("bills", &self.bills),
            ("members", &self.members),
            ("commons_votes", &self.commons_votes),
            ("lords_votes", &self.lords_votes),
            ("calendar", &self.calendar),
            ("committees", &self.committees),
        ]
        .into_iter()
        .filter_map(|(name, base)| base.as_deref().map(|base| (name, base)))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter (debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_user_agent() -> String {
    format!("parley-client/{}", env!("CARGO_PKG_VERSION"))
}

// serde uses function pointers for defaults
#[allow(clippy::missing_const_for_fn)]
fn default_concurrency() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("parley.yaml")
    }

    /// Load configuration with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed("PARLEY_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation("http.user_agent cannot be empty".into()));
        }

        if self.http.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "http.timeout_secs cannot be 0; omit it to disable the timeout".into(),
            ));
        }

        if self.fan_out.concurrency == 0 {
            return Err(ConfigError::Validation(
                "fan_out.concurrency cannot be 0; use 1 for sequential enrichment".into(),
            ));
        }

        for (name, base) in self.endpoints.iter() {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "endpoints.{name} has invalid base '{base}'. Must start with http:// or https://"
                )));
            }
        }

        Ok(())
    }

    /// Enrichment strategy selected by `fan_out.concurrency`.
    #[must_use]
    pub fn fan_out(&self) -> FanOut {
        FanOut::with_limit(self.fan_out.concurrency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.http.user_agent.starts_with("parley-client/"));
        assert_eq!(config.http.timeout_secs, None);
        assert_eq!(config.fan_out.concurrency, 1);
        assert_eq!(config.fan_out(), FanOut::Sequential);
        assert_eq!(config.logging.level, "info");
        assert!(config.endpoints.bills.is_none());
    }

    #[test]
    fn test_validation_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = Config::default();
        config.http.timeout_secs = Some(0);
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validation_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bounded_fan_out_from_concurrency() {
        let mut config = Config::default();
        config.fan_out.concurrency = 4;
        assert!(matches!(config.fan_out(), FanOut::Bounded(n) if n.get() == 4));
    }

    #[test]
    fn concurrency_boundaries() {
        let cases = [
            (0usize, false, "zero"),
            (1, true, "sequential"),
            (8, true, "bounded"),
        ];

        for (concurrency, should_pass, desc) in cases {
            let mut config = Config::default();
            config.fan_out.concurrency = concurrency;
            let result = config.validate();
            assert_eq!(result.is_ok(), should_pass, "case '{}': {:?}", desc, result);
        }
    }

    #[test]
    fn endpoint_override_boundaries() {
        let cases = [
            ("https://bills-api.parliament.uk/api/", true, "https"),
            ("http://localhost:8080/", true, "local http"),
            ("ftp://mirror.example.com/", false, "ftp scheme"),
            ("bills-api.parliament.uk", false, "no scheme"),
        ];

        for (base, should_pass, desc) in cases {
            let mut config = Config::default();
            config.endpoints.bills = Some(base.into());
            let result = config.validate();
            assert_eq!(result.is_ok(), should_pass, "case '{}': {:?}", desc, result);
        }
    }

    #[test]
    fn test_load_merges_yaml_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "parley.yaml",
                r"
fan_out:
  concurrency: 2
endpoints:
  calendar: http://localhost:9000/calendar/
logging:
  level: debug
",
            )?;
            jail.set_env("PARLEY_FAN_OUT__CONCURRENCY", "6");
            jail.set_env("PARLEY_HTTP__TIMEOUT_SECS", "15");

            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config.fan_out.concurrency, 6);
            assert_eq!(config.http.timeout_secs, Some(15));
            assert_eq!(config.logging.level, "debug");
            assert_eq!(
                config.endpoints.calendar.as_deref(),
                Some("http://localhost:9000/calendar/")
            );
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_env_override() {
        Jail::expect_with(|jail| {
            jail.set_env("PARLEY_ENDPOINTS__MEMBERS", "members.local");
            let result = Config::load();
            assert!(matches!(result, Err(ConfigError::Validation(_))));
            Ok(())
        });
    }
}
