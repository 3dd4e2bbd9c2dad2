//! Controller configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the topology controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Upper bound for the stability wait in milliseconds.
    ///
    /// `None` waits for as long as the engine takes; the surrounding test
    /// framework is then responsible for the deadline.
    pub stability_timeout_ms: Option<u64>,
}

impl ControllerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }

    /// Returns the stability timeout, if bounded.
    pub fn stability_timeout(&self) -> Option<Duration> {
        self.stability_timeout_ms.map(Duration::from_millis)
    }
}

/// Builder for `ControllerConfig`.
#[derive(Debug, Default)]
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    /// Bounds the stability wait.
    pub fn stability_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.config.stability_timeout_ms = Some(millis);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ControllerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded() {
        assert_eq!(ControllerConfig::default().stability_timeout(), None);

        let parsed: ControllerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(parsed.stability_timeout(), None);
    }

    #[test]
    fn test_builder() {
        let config = ControllerConfig::builder()
            .stability_timeout(Duration::from_secs(90))
            .build();
        assert_eq!(config.stability_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.stability_timeout_ms, Some(90_000));
    }

    #[test]
    fn test_oversized_timeout_saturates() {
        let config = ControllerConfig::builder()
            .stability_timeout(Duration::MAX)
            .build();
        assert_eq!(config.stability_timeout_ms, Some(u64::MAX));
    }
}
