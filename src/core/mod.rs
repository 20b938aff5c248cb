//! Core data structures for Manifold.
//!
//! This module contains the foundational types used throughout Manifold:
//! - Manifests and header clauses
//! - Packages and their directory index
//! - Build requests and instructions

pub mod header;
pub mod instructions;
pub mod manifest;
pub mod package;
pub mod request;
pub mod version;

pub use instructions::{Instructions, MergeDirective, MergeInstructions};
pub use manifest::Manifest;
pub use package::{Package, Resource};
pub use request::{BuildRequest, Dependency, ProjectMetadata};
