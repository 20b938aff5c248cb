//! High-level operations.
//!
//! This module contains the implementation of manifold commands.

pub mod embed;
pub mod errors;
pub mod exports;
pub mod manifest_build;
pub mod merge;
pub mod policy;
pub mod scr;

pub use embed::{embed_dependencies, EmbedError, Embedding};
pub use errors::{ErrorKind, ManifestError};
pub use exports::{calculate_exports_from_contents, exportable_packages};
pub use manifest_build::{
    analyze, compute_manifest, default_properties, generate_manifest, write_manifest,
    write_manifest_file, ManifestOptions, ManifestOutcome,
};
pub use merge::merge_manifests;
pub use policy::{is_fatal, report_problems};
pub use scr::export_component_descriptors;
