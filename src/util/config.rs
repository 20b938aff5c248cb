//! Configuration file support for Manifold.
//!
//! Manifold supports two configuration file locations:
//! - Global: `~/.manifold/config.toml` - User-wide defaults
//! - Project: `.manifold/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Project types that support an in-memory bundle rebuild by default.
pub const DEFAULT_SUPPORTED_PROJECT_TYPES: &[&str] = &["jar", "bundle"];

/// Manifold configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Manifest generation settings
    pub manifest: ManifestConfig,
}

/// Manifest generation settings.
///
/// Every field is optional so that a project file only overrides what it
/// sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ManifestConfig {
    /// Directory receiving MANIFEST.MF (default: `<output-directory>/META-INF`)
    pub manifest_location: Option<PathBuf>,

    /// Directory receiving component descriptors (default: output directory)
    pub scr_location: Option<PathBuf>,

    /// Copy component descriptors named by Service-Component
    pub export_scr: Option<bool>,

    /// Write the analysed package contents back into the output directory
    pub unpack_bundle: Option<bool>,

    /// Put each clause of multi-clause headers on its own line
    pub nice_manifest: Option<bool>,

    /// Rebuild the whole bundle in memory instead of analysing the output
    pub rebuild_bundle: Option<bool>,

    /// Project types eligible for an in-memory rebuild
    pub supported_project_types: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let ours = &mut self.manifest;
        let theirs = other.manifest;

        if theirs.manifest_location.is_some() {
            ours.manifest_location = theirs.manifest_location;
        }
        if theirs.scr_location.is_some() {
            ours.scr_location = theirs.scr_location;
        }
        if theirs.export_scr.is_some() {
            ours.export_scr = theirs.export_scr;
        }
        if theirs.unpack_bundle.is_some() {
            ours.unpack_bundle = theirs.unpack_bundle;
        }
        if theirs.nice_manifest.is_some() {
            ours.nice_manifest = theirs.nice_manifest;
        }
        if theirs.rebuild_bundle.is_some() {
            ours.rebuild_bundle = theirs.rebuild_bundle;
        }
        if theirs.supported_project_types.is_some() {
            ours.supported_project_types = theirs.supported_project_types;
        }
    }
}

impl ManifestConfig {
    /// Supported project types, falling back to the defaults.
    pub fn supported_project_types(&self) -> Vec<String> {
        self.supported_project_types.clone().unwrap_or_else(|| {
            DEFAULT_SUPPORTED_PROJECT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect()
        })
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.manifold/config.toml)
/// 2. Global config (~/.manifold/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global manifold config directory (~/.manifold).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".manifold"))
}

/// Get the global config path (~/.manifold/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.manifold/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".manifold").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = project_config_path(tmp.path());

        std::fs::write(
            &global,
            "[manifest]\nexport-scr = true\nnice-manifest = true\n",
        )
        .unwrap();
        std::fs::create_dir_all(project.parent().unwrap()).unwrap();
        std::fs::write(&project, "[manifest]\nnice-manifest = false\n").unwrap();

        let config = load_config(Some(&global), &project);
        assert_eq!(config.manifest.export_scr, Some(true));
        assert_eq!(config.manifest.nice_manifest, Some(false));
        assert_eq!(config.manifest.unpack_bundle, None);
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, &tmp.path().join("nope.toml"));
        assert_eq!(
            config.manifest.supported_project_types(),
            vec!["jar".to_string(), "bundle".to_string()]
        );
    }

    #[test]
    fn test_broken_file_falls_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[manifest\n").unwrap();
        let config = Config::load_or_default(&path);
        assert!(config.manifest.export_scr.is_none());
    }
}
