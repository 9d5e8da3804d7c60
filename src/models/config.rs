use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::services::archive::{MAX_ENTRIES, MAX_ENTRY_SIZE};

/// Launcher configuration from `launcher.yaml`, environment and built-in defaults.
///
/// Every section falls back to its defaults field by field, so a file that
/// only sets `tools.extractor` is still a complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub paths: PathsConfig,
    pub tools: ToolsConfig,
    pub timeouts: TimeoutsConfig,
    pub safety: SafetyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of all launcher data (`MINECRAFT_DATA_DIR`).
    pub data_dir: Utf8PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: Utf8PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Base-content extractor, invoked as `extractor <source> <target>`.
    pub extractor: String,

    /// Game client used for import-file mode.
    pub client: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            extractor: "mcpelauncher-extract".to_string(),
            client: "mcpelauncher-client".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub extract_secs: u64,
    pub client_start_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            extract_secs: 120,
            client_start_secs: 5,
        }
    }
}

impl TimeoutsConfig {
    pub fn extract(&self) -> Duration {
        Duration::from_secs(self.extract_secs)
    }

    pub fn client_start(&self) -> Duration {
        Duration::from_secs(self.client_start_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub max_entries: usize,
    pub max_entry_size: u64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_entries: MAX_ENTRIES,
            max_entry_size: MAX_ENTRY_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub debug: bool,
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            console: true,
        }
    }
}
