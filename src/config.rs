use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("resync_interval_ms must be positive")]
    ZeroResyncInterval,
    #[error("max_catch_up_days must be positive when set")]
    ZeroCatchUpCap,
}

/// Engine settings. Every field has a default so partial files are fine.
///
/// ```
/// use accrual_engine::config::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{"parallel": false}"#).unwrap();
/// assert!(!config.parallel);
/// assert_eq!(config.resync_interval_ms, 60_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix of the description on posted interest transactions.
    pub description_prefix: String,
    /// How often a ticker re-anchors to authoritative data.
    pub resync_interval_ms: u64,
    /// Process accounts of a batch on the rayon pool.
    pub parallel: bool,
    /// Upper bound on days settled per account per run; the rest waits for
    /// the next run.
    pub max_catch_up_days: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            description_prefix: "Daily interest".to_string(),
            resync_interval_ms: 60_000,
            parallel: true,
            max_catch_up_days: None,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: EngineConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resync_interval_ms == 0 {
            return Err(ConfigError::ZeroResyncInterval);
        }
        if self.max_catch_up_days == Some(0) {
            return Err(ConfigError::ZeroCatchUpCap);
        }
        Ok(())
    }

    /// Description for the interest transaction of `day`.
    pub fn description_for(&self, day: NaiveDate) -> String {
        format!("{} for {}", self.description_prefix, day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.resync_interval_ms, 60_000);
        assert!(config.parallel);
        assert!(config.max_catch_up_days.is_none());
    }

    #[test]
    fn test_description_for() {
        let config = EngineConfig::default();
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(config.description_for(day), "Daily interest for 2024-02-29");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = EngineConfig {
            resync_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_catch_up_cap_rejected() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"max_catch_up_days": 0}"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::ZeroCatchUpCap)));

        let capped = EngineConfig {
            max_catch_up_days: Some(1),
            ..Default::default()
        };
        assert!(capped.validate().is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_file("/nonexistent/accrual.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
