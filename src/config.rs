use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context as _};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Used when `request_timeout_seconds` is unset, zero or negative.
pub const FALLBACK_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_provider: String,
    pub request_timeout_seconds: i64,
    pub llms: BTreeMap<String, ProviderSettings>,
}

/// Per-provider connection settings. Empty strings count as unset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProviderSettings {
    pub fn base_url(&self) -> Option<&str> {
        non_empty(&self.base_url)
    }

    pub fn api_key(&self) -> Option<&str> {
        non_empty(&self.api_key)
    }

    pub fn model(&self) -> Option<&str> {
        non_empty(&self.model)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Default for Config {
    fn default() -> Self {
        let mut llms = BTreeMap::new();
        llms.insert(
            "ollama".to_owned(),
            ProviderSettings {
                base_url: Some(DEFAULT_OLLAMA_URL.to_owned()),
                ..Default::default()
            },
        );
        for cloud in ["gemini", "groq"] {
            llms.insert(
                cloud.to_owned(),
                ProviderSettings {
                    api_key: Some(String::new()),
                    ..Default::default()
                },
            );
        }

        Self {
            default_provider: "ollama".to_owned(),
            request_timeout_seconds: FALLBACK_REQUEST_TIMEOUT.as_secs() as i64,
            llms,
        }
    }
}

impl Config {
    /// Load the config file, writing a default one first if there is none.
    pub fn load_or_create() -> anyhow::Result<Self> {
        let path = Self::filepath()?;
        if path.exists() {
            log::debug!("Loading configuration from {}", path.display());
            return Self::load_from(&path);
        }

        let config = Self::default();
        config.save_to(&path)?;
        log::warn!(
            "Created a default configuration at {}. Run `dreampipe config` to edit it.",
            path.display()
        );
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("failed to decode TOML config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let text = toml::to_string(self)?;
        let dir = path
            .parent()
            .ok_or_else(|| anyhow!("config path {} has no parent directory", path.display()))?;
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
        fs::write(path, text)
            .with_context(|| format!("failed to write config file {}", path.display()))?;

        // The file may hold API keys.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    pub fn filepath() -> anyhow::Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or(anyhow!("Failed to locate appropriate config directory"))?
            .join("dreampipe")
            .join("config.toml"))
    }

    /// Effective request timeout.
    pub fn request_timeout(&self) -> Duration {
        match u64::try_from(self.request_timeout_seconds) {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => FALLBACK_REQUEST_TIMEOUT,
        }
    }

    /// Check that the default provider has a settings entry.
    pub fn validate(&self) -> Result<(), Error> {
        if self.default_provider.trim().is_empty() {
            return Err(Error::Config(
                "no default LLM provider specified in configuration".to_owned(),
            ));
        }
        if !self.llms.contains_key(&self.default_provider) {
            return Err(Error::Config(format!(
                "default provider '{}' is specified but has no configuration section in [llms]",
                self.default_provider
            )));
        }
        Ok(())
    }
}
