//! Daemon configuration, loaded from TOML. Every field has a default so an
//! absent or empty config file yields a working setup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Reject configurations the daemon cannot honor.
    pub fn validate(&self) -> Result<()> {
        if let Some(tz) = &self.engine.timezone {
            if tz.parse::<chrono_tz::Tz>().is_err() {
                return Err(Error::Config(format!(
                    "invalid timezone: '{tz}' — use IANA names like 'America/New_York' or 'UTC'"
                )));
            }
        }
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding persisted timer state.
    #[serde(default = "d_state_dir")]
    pub state_dir: PathBuf,
    /// Optional IANA timezone override. When unset the system-local
    /// timezone drives `UntilTime` resolution.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_dir: d_state_dir(),
            timezone: None,
        }
    }
}

fn d_state_dir() -> PathBuf {
    PathBuf::from("data")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Observability
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    /// Emit JSON-formatted log lines instead of the human-readable format.
    #[serde(default)]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine.state_dir, PathBuf::from("data"));
        assert!(config.engine.timezone.is_none());
        assert!(!config.observability.json_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_overrides() {
        let config: Config = toml::from_str(
            r#"
            [engine]
            state_dir = "/var/lib/staywake"
            timezone = "Europe/London"

            [observability]
            json_logs = true
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.state_dir, PathBuf::from("/var/lib/staywake"));
        assert_eq!(config.engine.timezone.as_deref(), Some("Europe/London"));
        assert!(config.observability.json_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_timezone_rejected() {
        let config: Config = toml::from_str(
            r#"
            [engine]
            timezone = "Not/Real"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
