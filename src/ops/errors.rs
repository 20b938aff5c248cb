//! Manifest generation error types and diagnostics.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Failure category of a manifest invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    IoFailure,
    ConfigurationInvalid,
    InternalError,
}

/// Error aborting a manifest invocation.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ManifestError {
    #[error("cannot find {location} (manifest generation must run after the compile phase)")]
    #[diagnostic(
        code(manifold::manifest::not_found),
        help("Run the compile step before generating the manifest")
    )]
    NotFound { location: String },

    #[error("failed to {action} {}", .path.display())]
    #[diagnostic(code(manifold::manifest::io))]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error(s) found in manifest configuration")]
    #[diagnostic(
        code(manifold::manifest::invalid_configuration),
        help("Fix the reported problems, or set `-failok` to downgrade them to warnings")
    )]
    ConfigurationInvalid { errors: Vec<String> },

    #[error("internal error in manifest generation")]
    #[diagnostic(code(manifold::manifest::internal))]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl ManifestError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        ManifestError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Classify an engine failure.
    ///
    /// I/O errors anywhere in the chain become [`ManifestError::Io`] against
    /// `path`; everything else is internal.
    pub fn from_engine(action: &'static str, path: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        match err.downcast::<io::Error>() {
            Ok(source) => ManifestError::io(action, path, source),
            Err(source) => ManifestError::Internal { source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ManifestError::NotFound { .. } => ErrorKind::NotFound,
            ManifestError::Io { .. } => ErrorKind::IoFailure,
            ManifestError::ConfigurationInvalid { .. } => ErrorKind::ConfigurationInvalid,
            ManifestError::Internal { .. } => ErrorKind::InternalError,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ManifestError::NotFound { location } => {
                Diagnostic::error(format!("cannot find {}", location))
                    .with_context("manifest generation must run after the compile phase")
                    .with_suggestion(suggestions::RUN_COMPILE_FIRST)
            }

            ManifestError::Io {
                action,
                path,
                source,
            } => Diagnostic::error(format!("failed to {}", action))
                .with_location(path)
                .with_context(source.to_string()),

            ManifestError::ConfigurationInvalid { errors } => {
                let mut diag = Diagnostic::error(self.to_string());
                for error in errors {
                    diag = diag.with_context(error.clone());
                }
                diag.with_suggestion(suggestions::FAILOK)
            }

            ManifestError::Internal { .. } => {
                Diagnostic::error(self.to_string()).with_suggestion(suggestions::VERBOSE)
            }
        }
    }
}
