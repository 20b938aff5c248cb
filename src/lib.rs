//! Manifold - bundle manifest generation for compiled build output
//!
//! This crate computes OSGi bundle manifests for a build unit: it analyses
//! the compiled output or packaged artifact, layers build instructions on
//! top, merges with a curated manifest on disk, and exports component
//! descriptors.

pub mod console;
pub mod core;
pub mod engine;
pub mod ops;
pub mod util;

/// Test utilities for manifold unit tests.
///
/// Only available when compiling tests. Provides a scripted analyser and
/// request and artifact fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildRequest, Dependency, Manifest, Package, ProjectMetadata};
pub use engine::{Analyzer, BasicEngine};
pub use ops::{ManifestError, ManifestOptions};
pub use util::context::GlobalContext;
