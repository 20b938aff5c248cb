//! Test utilities for manifold unit tests.
//!
//! [`FakeAnalyzer`] is a scripted [`Analyzer`]: it reports whatever errors
//! and warnings it is told to, can fail on demand, and records what the
//! caller did through a shared [`FakeState`] that stays readable after the
//! analyser has been moved into an operation.
//!
//! # Example
//!
//! ```rust,ignore
//! use manifold::test_support::FakeAnalyzer;
//!
//! let fake = FakeAnalyzer::new().with_error("Unresolved reference");
//! let state = fake.state();
//! let _ = generate_manifest(fake, &request, &opts);
//! assert!(state.lock().unwrap().closed);
//! ```

pub mod fixtures;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

use crate::core::manifest::headers;
use crate::core::package::{Package, Resource};
use crate::core::{BuildRequest, Instructions, Manifest};
use crate::engine::Analyzer;

pub use fixtures::*;

/// What a [`FakeAnalyzer`] observed.
#[derive(Debug, Clone, Default)]
pub struct FakeState {
    /// Every property set, in order
    pub properties: Instructions,
    /// Locations passed to `load`
    pub loaded: Vec<PathBuf>,
    /// Whether `calculate_manifest` was called directly
    pub calculated: bool,
    /// Whether `build` ran
    pub built: bool,
    /// Whether `rebuild` ran
    pub rebuilt: bool,
    /// Whether `close` ran
    pub closed: bool,
}

/// Scripted analyser for orchestration tests.
#[derive(Debug, Default)]
pub struct FakeAnalyzer {
    properties: Instructions,
    package: Package,
    errors: Vec<String>,
    warnings: Vec<String>,
    fail_calculate: bool,
    fail_close: bool,
    state: Arc<Mutex<FakeState>>,
}

impl FakeAnalyzer {
    /// Create an analyser that succeeds with an empty package.
    pub fn new() -> Self {
        FakeAnalyzer::default()
    }

    /// Report `message` as an analysis error.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    /// Report `message` as an analysis warning.
    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }

    /// Seed the analysed package with a resource.
    pub fn with_resource(mut self, path: &str, resource: Resource) -> Self {
        self.package.put_resource(path, resource);
        self
    }

    /// Make `calculate_manifest` fail with a non-I/O error.
    pub fn failing_calculate(mut self) -> Self {
        self.fail_calculate = true;
        self
    }

    /// Make `close` fail with an I/O error.
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Shared handle on what the analyser observed.
    pub fn state(&self) -> Arc<Mutex<FakeState>> {
        Arc::clone(&self.state)
    }

    fn compute(&mut self) -> Result<Manifest> {
        if self.fail_calculate {
            bail!("scripted analysis failure");
        }

        let mut manifest = Manifest::new();
        manifest.insert(headers::MANIFEST_VERSION, "1.0");
        for (key, value) in self.properties.iter() {
            if key.starts_with('-') {
                continue;
            }
            manifest.insert(key, value);
        }
        self.package.set_manifest(manifest.clone());
        Ok(manifest)
    }

    fn record(&self, f: impl FnOnce(&mut FakeState)) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
    }
}

impl Analyzer for FakeAnalyzer {
    fn load(&mut self, location: &Path) -> Result<()> {
        self.record(|s| s.loaded.push(location.to_path_buf()));
        Ok(())
    }

    fn set_property(&mut self, key: &str, value: &str) {
        self.properties.insert(key, value);
        self.record(|s| {
            s.properties.insert(key, value);
        });
    }

    fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    fn package(&self) -> &Package {
        &self.package
    }

    fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    fn calculate_manifest(&mut self) -> Result<Manifest> {
        self.record(|s| s.calculated = true);
        self.compute()
    }

    fn merge_manifest(&mut self, _existing: &Manifest) {}

    fn build(&mut self) -> Result<()> {
        self.record(|s| s.built = true);
        self.compute().map(|_| ())
    }

    fn rebuild(&mut self, _request: &BuildRequest) -> Result<()> {
        self.record(|s| s.rebuilt = true);
        self.compute().map(|_| ())
    }

    fn errors(&self) -> &[String] {
        &self.errors
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn close(&mut self) -> Result<()> {
        self.record(|s| s.closed = true);
        if self.fail_close {
            return Err(io::Error::other("scripted close failure").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_records_calls() {
        let mut fake = FakeAnalyzer::new().with_warning("note");
        let state = fake.state();

        fake.set_property("Bundle-Name", "Demo");
        fake.load(Path::new("/tmp/classes")).unwrap();
        fake.close().unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.properties.get("Bundle-Name"), Some("Demo"));
        assert_eq!(state.loaded, vec![PathBuf::from("/tmp/classes")]);
        assert!(state.closed);
        assert_eq!(fake.warnings().len(), 1);
    }

    #[test]
    fn test_fake_failures() {
        let mut fake = FakeAnalyzer::new().failing_calculate().failing_close();
        assert!(fake.calculate_manifest().is_err());
        let err = fake.close().unwrap_err();
        assert!(err.downcast_ref::<io::Error>().is_some());
    }
}
