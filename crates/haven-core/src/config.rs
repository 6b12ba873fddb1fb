//! Persistent Haven settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::queue::{QueueConfig, RetentionPolicy, DEFAULT_STORAGE_KEY};
use crate::sos::DEFAULT_COUNTDOWN_SECS;
use crate::{Error, Result};

/// Upper bound for the SOS confirmation countdown
pub const MAX_COUNTDOWN_SECS: u32 = 60;

/// Settings file contents. Every field is optional on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HavenConfig {
    pub storage_key: String,
    pub delivery_timeout_ms: u64,
    pub retention: RetentionPolicy,
    pub countdown_secs: u32,
}

impl Default for HavenConfig {
    fn default() -> Self {
        let queue = QueueConfig::default();
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            delivery_timeout_ms: u64::try_from(queue.delivery_timeout.as_millis())
                .unwrap_or(u64::MAX),
            retention: queue.retention,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
        }
    }
}

impl HavenConfig {
    /// Load settings from `path`; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(Error::InvalidInput("storage_key must not be empty".into()));
        }
        if self.delivery_timeout_ms == 0 {
            return Err(Error::InvalidInput(
                "delivery_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.countdown_secs > MAX_COUNTDOWN_SECS {
            return Err(Error::InvalidInput(format!(
                "countdown_secs must be at most {MAX_COUNTDOWN_SECS}"
            )));
        }
        Ok(())
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig::default()
            .with_storage_key(self.storage_key.trim())
            .with_delivery_timeout(Duration::from_millis(self.delivery_timeout_ms))
            .with_retention(self.retention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HavenConfig::load_from_path(&dir.path().join("config.json")).unwrap();

        assert_eq!(config, HavenConfig::default());
        assert_eq!(config.queue_config(), QueueConfig::default());
        assert_eq!(config.countdown_secs, 5);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "delivery_timeout_ms": 2500, "retention": { "mode": "keep_recent_synced", "keep": 3 } }"#,
        )
        .unwrap();

        let config = HavenConfig::load_from_path(&path).unwrap();
        let queue = config.queue_config();

        assert_eq!(queue.delivery_timeout, Duration::from_millis(2500));
        assert_eq!(queue.retention, RetentionPolicy::KeepRecentSynced(3));
        assert_eq!(queue.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "storage_keys": "typo" }"#).unwrap();

        let error = HavenConfig::load_from_path(&path).unwrap_err();
        assert!(matches!(error, Error::Serialization(_)));
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let config = HavenConfig {
            delivery_timeout_ms: 0,
            ..HavenConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = HavenConfig {
            storage_key: "alerts".into(),
            retention: RetentionPolicy::DropSynced,
            countdown_secs: 3,
            ..HavenConfig::default()
        };

        config.save_to_path(&path).unwrap();
        let loaded = HavenConfig::load_from_path(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_refuses_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = HavenConfig {
            countdown_secs: MAX_COUNTDOWN_SECS + 1,
            ..HavenConfig::default()
        };

        assert!(config.save_to_path(&path).is_err());
        assert!(!path.exists());
    }
}
