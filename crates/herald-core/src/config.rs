use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::HeraldError;

/// Top-level Herald configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub herald: HeraldConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// General agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// App id handed to the channel adapter when resuming conversations.
    #[serde(default = "default_app_id")]
    pub app_id: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Transcript slot all turns append to. Every conversation shares one
    /// log under this id unless a deployment overrides it.
    #[serde(default = "default_log_id")]
    pub log_id: String,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            log_level: default_log_level(),
            log_id: default_log_id(),
        }
    }
}

/// Proactive notification schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Target wall-clock hour (0-23), evaluated in `timezone`.
    #[serde(default = "default_notify_hour")]
    pub hour: u32,
    /// Target minute (0-59).
    #[serde(default)]
    pub minute: u32,
    /// IANA time zone the schedule is evaluated in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: default_notify_hour(),
            minute: 0,
            timezone: default_timezone(),
        }
    }
}

fn default_app_id() -> String {
    "herald".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_id() -> String {
    "shared".to_string()
}

fn default_true() -> bool {
    true
}

fn default_notify_hour() -> u32 {
    16
}

fn default_timezone() -> String {
    "America/Los_Angeles".to_string()
}

/// Load configuration from a TOML file, falling back to defaults when the
/// file does not exist.
pub fn load(path: &str) -> Result<Config, HeraldError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| HeraldError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| HeraldError::Config(format!("failed to parse config: {e}")))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.herald.app_id, "herald");
        assert_eq!(cfg.herald.log_id, "shared");
        assert!(cfg.notify.enabled);
        assert_eq!(cfg.notify.hour, 16);
        assert_eq!(cfg.notify.minute, 0);
        assert_eq!(cfg.notify.timezone, "America/Los_Angeles");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            [notify]
            hour = 9
            minute = 30
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.notify.hour, 9);
        assert_eq!(cfg.notify.minute, 30);
        assert!(cfg.notify.enabled, "enabled should default to true");
        assert_eq!(cfg.notify.timezone, "America/Los_Angeles");
        assert_eq!(cfg.herald.app_id, "herald");
    }

    #[test]
    fn test_full_toml_round_trip() {
        let toml_str = r#"
            [herald]
            app_id = "my-bot"
            log_level = "debug"
            log_id = "team-a"

            [notify]
            enabled = false
            hour = 8
            minute = 15
            timezone = "Europe/Berlin"
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.herald.app_id, "my-bot");
        assert_eq!(cfg.herald.log_id, "team-a");
        assert!(!cfg.notify.enabled);
        assert_eq!(cfg.notify.timezone, "Europe/Berlin");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cfg = load("/nonexistent/herald-test-config.toml").unwrap();
        assert_eq!(cfg.herald.app_id, "herald");
        assert!(cfg.notify.enabled);
    }
}
