//! Global context for Manifold operations.
//!
//! Provides centralized access to the working directory, the build request
//! file and the merged configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::request::REQUEST_FILE;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};
use crate::util::fs::find_upward;

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext for the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext {
            cwd,
            verbose: false,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            verbose: false,
        }
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Find `Bundle.toml` starting from cwd and searching upward.
    pub fn find_request(&self) -> Result<PathBuf> {
        find_upward(&self.cwd, REQUEST_FILE).with_context(|| {
            format!(
                "could not find `{}` in `{}` or any parent directory",
                REQUEST_FILE,
                self.cwd.display()
            )
        })
    }

    /// Load configuration for the project rooted at `project_root`.
    pub fn config(&self, project_root: &Path) -> Config {
        load_config(
            global_config_path().as_deref(),
            &project_config_path(project_root),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_request_searches_parents() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(REQUEST_FILE), "").unwrap();
        let nested = tmp.path().join("src/main");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        assert_eq!(ctx.find_request().unwrap(), tmp.path().join(REQUEST_FILE));
    }

    #[test]
    fn test_find_request_missing() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let err = ctx.find_request().unwrap_err();
        assert!(err.to_string().contains("Bundle.toml"));
    }
}
