//! Interface to the bundle analysis engine.
//!
//! Manifest generation never computes capability headers itself: it loads
//! the package into an [`Analyzer`], feeds it instructions and asks it for
//! the manifest. [`BasicEngine`] is the built-in implementation; tests use a
//! scripted fake.

pub mod basic;

use std::path::Path;

use anyhow::Result;

use crate::core::{BuildRequest, Manifest, Package};

pub use basic::BasicEngine;

/// A handle on the analysis engine for one invocation.
///
/// The handle must be closed with [`Analyzer::close`] once the caller is
/// done with it, whether or not the work succeeded.
pub trait Analyzer {
    /// Load a directory or artifact as the package under analysis.
    fn load(&mut self, location: &Path) -> Result<()>;

    /// Set an instruction or property.
    fn set_property(&mut self, key: &str, value: &str);

    /// Current value of an instruction or property.
    fn property(&self, key: &str) -> Option<&str>;

    /// The package under analysis.
    fn package(&self) -> &Package;

    fn package_mut(&mut self) -> &mut Package;

    /// Compute the manifest from the package and the current instructions.
    fn calculate_manifest(&mut self) -> Result<Manifest>;

    /// Fold an existing manifest's headers into the instructions.
    fn merge_manifest(&mut self, existing: &Manifest);

    /// Full build: materialize included content, then compute the manifest.
    fn build(&mut self) -> Result<()>;

    /// Rebuild the whole bundle in memory from a build request.
    fn rebuild(&mut self, request: &BuildRequest) -> Result<()>;

    /// Errors reported so far.
    fn errors(&self) -> &[String];

    /// Warnings reported so far.
    fn warnings(&self) -> &[String];

    /// Release the handle.
    fn close(&mut self) -> Result<()>;
}
