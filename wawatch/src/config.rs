use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::WatchError;
use crate::extractor::PresenceExtractor;

/// Runtime configuration, loadable from a TOML file with CLI flags applied
/// on top.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Contact to monitor, exactly as displayed in the chat list.
    pub contact: String,

    /// Seconds between polls.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Directory for per-run CSV logs; created if absent.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// Page to open at startup.
    #[serde(default = "default_chat_url")]
    pub chat_url: String,

    /// Pause after opening a conversation, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Bound on chat-list lookups, in seconds.
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    5
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_chat_url() -> String {
    "https://web.whatsapp.com/".to_string()
}

fn default_settle_ms() -> u64 {
    1500
}

fn default_lookup_timeout_secs() -> u64 {
    10
}

impl MonitorConfig {
    pub fn new(contact: impl Into<String>) -> Self {
        Self {
            contact: contact.into(),
            interval_secs: default_interval_secs(),
            logs_dir: default_logs_dir(),
            chat_url: default_chat_url(),
            settle_ms: default_settle_ms(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
        }
    }

    /// Load from a TOML file and validate.
    pub fn load(path: &Path) -> Result<Self, WatchError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)
            .map_err(|err| WatchError::Config(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WatchError> {
        if self.contact.trim().is_empty() {
            return Err(WatchError::Config("contact must not be empty".to_string()));
        }
        if self.interval_secs == 0 {
            return Err(WatchError::Config(
                "interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Build the extractor this configuration describes.
    pub fn extractor(&self) -> PresenceExtractor {
        PresenceExtractor::new(&self.contact)
            .with_settle_delay(self.settle_delay())
            .with_lookup_timeout(self.lookup_timeout())
    }
}
