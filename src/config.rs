//! User preferences, read from `~/.config/mmt/config.yaml`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::EmptyValuePolicy;

const APP_DIR: &str = "mmt";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct MergeConfig {
    pub(crate) empty_value: EmptyValuePolicy,
    /// Map placeholders to same-named columns when inputs are loaded.
    pub(crate) auto_map: bool,
    pub(crate) delimiter: char,
    pub(crate) export: ExportConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            empty_value: EmptyValuePolicy::default(),
            auto_map: true,
            delimiter: ',',
            export: ExportConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct ExportConfig {
    pub(crate) dir: PathBuf,
    /// Falls back to the template's own extension, then `txt`.
    pub(crate) extension: Option<String>,
    /// Column whose value names each exported file.
    pub(crate) name_column: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("merged"),
            extension: None,
            name_column: None,
        }
    }
}

impl MergeConfig {
    /// An explicit path must load; the default location falls back to defaults.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let Some(path) = config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        match Self::from_file(&path) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("{err:#}, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Delimiter as the single byte the CSV reader expects.
    pub(crate) fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .with_context(|| format!("Delimiter {:?} is not a single ASCII character", self.delimiter))
    }
}

/// `$XDG_CONFIG_HOME/mmt`, `~/.config/mmt`, or `%APPDATA%\mmt` on Windows.
pub(crate) fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var_os("APPDATA").map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

pub(crate) fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

pub(crate) fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(MergeConfig::parse("").unwrap(), MergeConfig::default());
        assert_eq!(MergeConfig::parse("  \n").unwrap(), MergeConfig::default());
    }

    #[test]
    fn partial_yaml_fills_missing_keys() {
        let config = MergeConfig::parse("empty_value: blank\nexport:\n  name_column: email\n").unwrap();
        assert_eq!(config.empty_value, EmptyValuePolicy::Blank);
        assert!(config.auto_map);
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.export.dir, PathBuf::from("merged"));
        assert_eq!(config.export.name_column.as_deref(), Some("email"));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(MergeConfig::parse("empty_value: shout\n").is_err());
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(MergeConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_path_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "auto_map: false\ndelimiter: \";\"").unwrap();
        let config = MergeConfig::load(Some(file.path())).unwrap();
        assert!(!config.auto_map);
        assert_eq!(config.delimiter_byte().unwrap(), b';');
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let config = MergeConfig {
            delimiter: '→',
            ..MergeConfig::default()
        };
        assert!(config.delimiter_byte().is_err());
    }
}
