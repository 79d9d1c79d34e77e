//! Configuration management for Globethrottle.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for a Globethrottle node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Event exchange configuration
    #[serde(default)]
    pub exchange: ExchangeSettings,

    /// Rate limiting configuration
    #[serde(default)]
    pub limits: LimitSettings,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            exchange: ExchangeSettings::default(),
            limits: LimitSettings::default(),
        }
    }
}

/// Event exchange configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSettings {
    /// UDP port shared by all nodes in the cluster
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the peer list file, one host or `host:port` per line
    #[serde(default = "default_peers_path")]
    pub peers_path: String,

    /// Node identifier used for log correlation
    #[serde(default = "default_node_id")]
    pub node_id: String,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            peers_path: default_peers_path(),
            node_id: default_node_id(),
        }
    }
}

fn default_port() -> u16 {
    12033
}

fn default_peers_path() -> String {
    "nodes.txt".to_string()
}

fn default_node_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Maximum admissible events per key per second
    #[serde(default = "default_max_rate")]
    pub max_rate: u32,

    /// How long an admitted event waits for peer corroboration, in
    /// milliseconds
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_rate: default_max_rate(),
            grace_period_ms: default_grace_period_ms(),
        }
    }
}

fn default_max_rate() -> u32 {
    2
}

fn default_grace_period_ms() -> u64 {
    100
}

impl LimitSettings {
    /// The grace period as a [`Duration`].
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl ThrottleConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ThrottleConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::ThrottleError::Config(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ThrottleConfig::default();

        assert_eq!(config.exchange.port, 12033);
        assert_eq!(config.exchange.peers_path, "nodes.txt");
        assert!(!config.exchange.node_id.is_empty());
        assert_eq!(config.limits.max_rate, 2);
        assert_eq!(config.limits.grace_period_ms, 100);
    }

    #[test]
    fn test_grace_period_duration() {
        let limits = LimitSettings {
            max_rate: 1,
            grace_period_ms: 150,
        };
        assert_eq!(limits.grace_period(), Duration::from_millis(150));
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let yaml = r#"
limits:
  max_rate: 5
"#;
        let config: ThrottleConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.limits.max_rate, 5);
        assert_eq!(config.limits.grace_period_ms, 100);
        assert_eq!(config.exchange.port, 12033);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
exchange:
  port: 13044
  peers_path: /etc/globethrottle/nodes.txt
  node_id: node-a
limits:
  max_rate: 10
  grace_period_ms: 150
"#;
        let config: ThrottleConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.exchange.port, 13044);
        assert_eq!(config.exchange.peers_path, "/etc/globethrottle/nodes.txt");
        assert_eq!(config.exchange.node_id, "node-a");
        assert_eq!(config.limits.max_rate, 10);
        assert_eq!(config.limits.grace_period_ms, 150);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(ThrottleConfig::from_file("/nonexistent/throttle.yaml").is_err());
    }
}
