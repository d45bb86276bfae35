use std::time::Duration;

use crate::version::{ServerVersion, VersionGate, DEFAULT_MINIMUM_VERSION, DEFAULT_NOTIFY_WHEN_VERSION};

/// Connection settings for a Kibana instance
#[derive(Debug, Clone)]
pub struct KibanaConfig {
    /// Base URL, including any base path Kibana is served under
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Space the alerts live in; `None` is the default space
    pub space_id: Option<String>,
    pub timeout: Duration,
    /// Oldest version exposing the alerting API
    pub minimum_version: ServerVersion,
    /// Oldest version honouring `notifyWhen`
    pub notify_when_version: ServerVersion,
}

impl KibanaConfig {
    /// Settings for a local, unauthenticated Kibana
    pub fn local() -> Self {
        Self {
            url: "http://127.0.0.1:5601".to_string(),
            username: None,
            password: None,
            space_id: None,
            timeout: Duration::from_secs(30),
            minimum_version: DEFAULT_MINIMUM_VERSION,
            notify_when_version: DEFAULT_NOTIFY_WHEN_VERSION,
        }
    }

    /// Create a config from environment variables
    /// KIBANA_URL=http://127.0.0.1:5601
    /// KIBANA_USERNAME=elastic
    /// KIBANA_PASSWORD=changeme
    /// KIBANA_SPACE=ops
    /// KIBANA_TIMEOUT_SECS=30
    /// KIBANA_MIN_VERSION=7.7.0
    /// KIBANA_NOTIFY_WHEN_VERSION=7.11.0
    pub fn from_env() -> Self {
        let defaults = Self::local();

        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let version = |key: &str, default: ServerVersion| {
            non_empty(key)
                .and_then(|v| match v.parse::<ServerVersion>() {
                    Ok(version) => Some(version),
                    Err(e) => {
                        tracing::warn!("Ignoring {}: {}", key, e);
                        None
                    }
                })
                .unwrap_or(default)
        };

        Self {
            url: non_empty("KIBANA_URL").unwrap_or(defaults.url),
            username: non_empty("KIBANA_USERNAME"),
            password: non_empty("KIBANA_PASSWORD"),
            space_id: non_empty("KIBANA_SPACE"),
            timeout: non_empty("KIBANA_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            minimum_version: version("KIBANA_MIN_VERSION", defaults.minimum_version),
            notify_when_version: version("KIBANA_NOTIFY_WHEN_VERSION", defaults.notify_when_version),
        }
    }

    /// Version gate carrying this config's thresholds
    pub fn version_gate(&self) -> VersionGate {
        VersionGate::new(self.minimum_version.clone(), self.notify_when_version.clone())
    }
}

impl Default for KibanaConfig {
    fn default() -> Self {
        Self::local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_defaults() {
        let config = KibanaConfig::default();
        assert_eq!(config.url, "http://127.0.0.1:5601");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.version_gate(), VersionGate::default());
    }

    #[test]
    fn test_custom_thresholds() {
        let config = KibanaConfig {
            minimum_version: ServerVersion::new(8, 0, 0),
            ..KibanaConfig::local()
        };
        let gate = config.version_gate();
        assert!(gate.check(&ServerVersion::new(7, 17, 0)).is_err());
        assert!(gate.supports_notify_when(&ServerVersion::new(8, 0, 0)));
    }
}
