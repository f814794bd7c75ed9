use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the exif-typed tools.
///
/// Controls how sessions write files back and how the CLI reports.
/// Every section and field is optional in the JSON file; missing values
/// take their defaults.
///
/// # Loading
///
/// ```rust,no_run
/// use exif_typed::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.session.backup_originals = true;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Write-back behavior of metadata sessions.
    pub session: SessionOptions,
    /// Output behavior of the batch tools (dry run, JSON).
    pub output: OutputConfig,
}

/// How a [`Session`](crate::Session) persists pending edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Suffix of the sibling file the new body is written to before it is
    /// renamed over the original.
    pub temp_suffix: String,
    /// If `true`, copy the file to `<name>.bak` before the first rewrite.
    pub backup_originals: bool,
    /// If `true`, `set` rejects values that do not decode under the tag's
    /// shape instead of deferring the failure to `close`.
    pub validate_on_set: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            temp_suffix: ".working".to_string(),
            backup_originals: false,
            validate_on_set: true,
        }
    }
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, preview edits without modifying any files.
    pub dry_run: bool,
    /// If `true`, print results as JSON.
    pub json: bool,
}

impl Config {
    /// Resolve the config file path, next to the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("exif-typed.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.session.temp_suffix, ".working");
        assert!(config.session.validate_on_set);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "session": { "backup_originals": true } }"#).unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert!(config.session.backup_originals);
        assert_eq!(config.session.temp_suffix, ".working");
        assert!(!config.output.dry_run);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.output.json = true;
        config.session.temp_suffix = ".tmp".into();
        config.save(Some(&path)).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
