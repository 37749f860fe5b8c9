//! Runtime settings
//!
//! ## Configuration Resolution
//!
//! 1. Explicit `--config` file (must exist)
//! 2. `~/.local/share/radar/config.toml`, when it exists
//! 3. Built-in defaults
//!
//! `INSIGHTS_LEARNING_PATH` in the environment overrides the learning store
//! path from any of the above.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::ClusterParams;
use crate::error::{Error, Result};
use crate::rotation::InsightRotation;

/// Environment variable overriding the learning store path
pub const LEARNING_PATH_ENV: &str = "INSIGHTS_LEARNING_PATH";

/// Learning store path used when nothing is configured
pub const DEFAULT_LEARNING_PATH: &str = "data/insights_learning.json";

/// Settings shared by the library and the CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Learning store file; [`DEFAULT_LEARNING_PATH`] when unset
    pub insights_learning_path: Option<PathBuf>,
    /// Status taxonomy override; the embedded taxonomy when unset
    pub status_taxonomy_path: Option<PathBuf>,
    /// Default duplicate detection parameters
    pub clusters: ClusterParams,
    /// Insight rotation limits
    pub rotation: InsightRotation,
}

impl Settings {
    /// Resolve settings from an explicit file, the user config file or defaults,
    /// then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::NotFound(format!(
                        "config file {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        settings.apply_learning_path_override(env::var(LEARNING_PATH_ENV).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading settings");
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Replace the learning path with a non-blank override
    pub fn apply_learning_path_override(&mut self, value: Option<String>) {
        if let Some(raw) = value {
            let raw = raw.trim();
            if !raw.is_empty() {
                self.insights_learning_path = Some(PathBuf::from(raw));
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.clusters.validate()?;
        self.rotation.validate()
    }

    /// Effective learning store path
    pub fn learning_path(&self) -> PathBuf {
        self.insights_learning_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEARNING_PATH))
    }
}

/// Get the default user config path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("radar").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.clusters, ClusterParams::default());
        assert_eq!(settings.rotation.max_visible, 4);
        assert_eq!(settings.rotation.max_repeats, 3);
        assert_eq!(settings.learning_path(), PathBuf::from(DEFAULT_LEARNING_PATH));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
insights_learning_path = "/tmp/learning.json"

[clusters]
jaccard_threshold = 0.7
"#,
        )
        .unwrap();
        assert_eq!(settings.learning_path(), PathBuf::from("/tmp/learning.json"));
        assert_eq!(settings.clusters.jaccard_threshold, 0.7);
        assert_eq!(settings.clusters.min_shared_tokens, 3);
        assert!(settings.clusters.only_open);
        assert_eq!(settings.rotation, InsightRotation::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Settings::from_toml("[clusters]\nmin_cluster_size = 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Settings::from_toml("[rotation]\nmax_visible = 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        assert!(matches!(
            Settings::from_toml("clusters = 3").unwrap_err(),
            Error::Toml(_)
        ));
    }

    #[test]
    fn test_learning_path_override() {
        let mut settings = Settings::default();
        settings.apply_learning_path_override(Some("   ".into()));
        assert_eq!(settings.insights_learning_path, None);

        settings.apply_learning_path_override(Some(" /data/custom.json ".into()));
        assert_eq!(settings.learning_path(), PathBuf::from("/data/custom.json"));
    }

    #[test]
    fn test_explicit_missing_file_errors() {
        let err = Settings::load(Some(Path::new("/nonexistent/radar.toml"))).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radar.toml");
        fs::write(&path, "[rotation]\nmax_visible = 2\n").unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.rotation.max_visible, 2);
    }
}
