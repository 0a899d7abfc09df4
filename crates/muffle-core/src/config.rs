use anyhow::Result;
use muffle_ai::{default_examples, ClassificationExample, ServiceConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::selector::Selector;
use crate::suppression::SuppressionConfig;
use crate::tree::TreeError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Where feed items live and how to recognise them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub root_id: String,
    pub item_selector: String,
    pub text_selector: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            root_id: "react-root".to_string(),
            item_selector: "[data-testid='cellInnerDiv']".to_string(),
            text_selector: "[data-testid='tweetText']".to_string(),
        }
    }
}

impl FeedConfig {
    /// Parse both selectors.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidSelector`] for unsupported selector syntax.
    pub fn selectors(&self) -> Result<(Selector, Selector), TreeError> {
        Ok((self.item_selector.parse()?, self.text_selector.parse()?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub feed: FeedConfig,
    pub suppression: SuppressionConfig,
    pub examples: Vec<ClassificationExample>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            feed: FeedConfig::default(),
            suppression: SuppressionConfig::default(),
            examples: default_examples(),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined or the
    /// file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Ok(Self::load_from(&get_config_path()?)?)
    }

    /// Load from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, cannot be parsed, or
    /// names an invalid selector.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.feed.selectors()?;
        Ok(config)
    }

    /// Write this configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// TOML rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Copy with the API key replaced by a mask, for display.
    #[must_use]
    pub fn masked(&self) -> Self {
        let mut config = self.clone();
        if let Some(key) = &config.service.api_key {
            let tail: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            config.service.api_key = Some(format!("****{tail}"));
        }
        config
    }
}

/// Get the local data directory for muffle.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    let mut path =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Failed to get local data dir"))?;
    path.push("muffle");
    Ok(path)
}

/// Get the path of the TOML configuration file.
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined.
pub fn get_config_path() -> Result<PathBuf> {
    let mut path =
        dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Failed to get config dir"))?;
    path.push("muffle");
    path.push("config.toml");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.examples.len(), 3);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[service]
model = "small"
api_key = "abc123"

[[examples]]
text = "you are trash"
label = "Toxic"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.service.model, "small");
        assert_eq!(config.service.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.service.violating_label, "Toxic");
        assert_eq!(config.examples, vec![ClassificationExample::new("you are trash", "Toxic")]);
        assert_eq!(config.feed, FeedConfig::default());
        assert_eq!(config.suppression, SuppressionConfig::default());
    }

    #[test]
    fn test_garbage_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "service = [").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[feed]\nitem_selector = \"div > span\"\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Tree(TreeError::InvalidSelector(_)))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.suppression.filter = "blur(4px)".to_string();

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_masked_hides_key() {
        let mut config = Config::default();
        config.service.api_key = Some("secret-key-9876".to_string());
        assert_eq!(config.masked().service.api_key.as_deref(), Some("****9876"));
        assert!(Config::default().masked().service.api_key.is_none());
    }
}
