use crate::models::LauncherConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::fs;

/// Name of the YAML file inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "launcher.yaml";

/// Prefix of structured environment overrides, e.g. `BEDROCK_TOOLS__EXTRACTOR`.
pub const ENV_PREFIX: &str = "BEDROCK";

/// Legacy single-purpose variables and the keys they override.
const LEGACY_OVERRIDES: [(&str, &str); 3] = [
    ("MINECRAFT_DATA_DIR", "paths.data_dir"),
    ("MCPELAUNCHER_EXTRACT", "tools.extractor"),
    ("MCPELAUNCHER_CLIENT", "tools.client"),
];

/// Configuration manager for `launcher.yaml`.
///
/// Sources, lowest precedence first: built-in defaults, the YAML file,
/// `BEDROCK_*` environment variables, then the legacy variables
/// `MINECRAFT_DATA_DIR`, `MCPELAUNCHER_EXTRACT` and `MCPELAUNCHER_CLIENT`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the layered configuration from the process environment.
    pub fn load_config(&self) -> Result<LauncherConfig> {
        self.build(None)
    }

    /// Load with an explicit environment instead of the process one.
    pub fn load_config_with_env(&self, env: HashMap<String, String>) -> Result<LauncherConfig> {
        self.build(Some(env))
    }

    fn build(&self, env: Option<HashMap<String, String>>) -> Result<LauncherConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }

        let defaults = Config::try_from(&LauncherConfig::default())
            .context("Failed to build default configuration")?;

        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::new(self.config_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env.clone()),
            );

        for (variable, key) in LEGACY_OVERRIDES {
            let value = match &env {
                Some(vars) => vars.get(variable).cloned(),
                None => std::env::var(variable).ok(),
            }
            .filter(|value| !value.is_empty());

            if let Some(value) = &value {
                tracing::info!("{} overrides {} = {}", variable, key, value);
            }
            builder = builder
                .set_override_option(key, value)
                .with_context(|| format!("Failed to apply {}", variable))?;
        }

        let config: LauncherConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| format!("Failed to load configuration from {}", self.config_path))?;

        tracing::info!(
            "Loaded configuration: data_dir={}, extractor={}, client={}",
            config.paths.data_dir,
            config.tools.extractor,
            config.tools.client
        );
        Ok(config)
    }

    /// Save the configuration file.
    pub fn save_config(&self, config: &LauncherConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
