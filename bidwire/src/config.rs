use serde::Deserialize;
use std::fs::File;
use std::path::Path;

#[derive(Deserialize, Debug)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Deserialize, Debug)]
pub struct IdentityConfig {
    /// Partner id for the identity-resolution endpoint.
    pub pid: String,
    #[serde(default = "default_identity_endpoint")]
    pub endpoint: String,
}

fn default_identity_endpoint() -> String {
    identity::DEFAULT_ENDPOINT.to_string()
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub identity: Option<IdentityConfig>,
    pub analytics: Option<analytics::ForwarderConfig>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    Load(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            identity:
                pid: "12345"
            analytics:
                endpoint: https://tracker.example.com/ingest
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let identity_config = config.identity.expect("identity config");
        assert_eq!(identity_config.pid, "12345");
        assert_eq!(identity_config.endpoint, identity::DEFAULT_ENDPOINT);

        let analytics_config = config.analytics.expect("analytics config");
        assert_eq!(analytics_config.endpoint, "https://tracker.example.com/ingest");
        assert_eq!(analytics_config.bidder, analytics::BIDDER_CODE);

        assert_eq!(config.common.metrics.expect("metrics").statsd_port, 8125);
    }

    #[test]
    fn sections_are_optional() {
        let tmp = write_tmp_file("{}");
        let config = Config::from_file(tmp.path()).expect("load config");
        assert!(config.identity.is_none());
        assert!(config.analytics.is_none());
        assert!(config.common.metrics.is_none());
        assert!(config.common.logging.is_none());
    }

    #[test]
    fn identity_requires_a_pid() {
        let tmp = write_tmp_file("identity: {endpoint: https://id.example.com}");
        assert!(Config::from_file(tmp.path()).is_err());
    }
}
