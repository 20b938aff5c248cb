//! Bundle manifest model and `MANIFEST.MF` codec.
//!
//! A manifest is an ordered set of `Name: value` headers. The text form
//! follows the JAR manifest rules: lines are at most 72 bytes, longer values
//! continue on lines starting with a single space, and a blank line ends the
//! main section.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::core::header::split_clauses;

/// File name of the manifest inside its metadata directory.
pub const MANIFEST_FILE: &str = "MANIFEST.MF";

/// Metadata directory holding the manifest.
pub const META_INF: &str = "META-INF";

/// Directory for optional, opaque resources (sources, docs).
pub const OSGI_OPT: &str = "OSGI-OPT";

/// Path of the manifest resource inside a package.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Well-known header and instruction names.
pub mod headers {
    pub const MANIFEST_VERSION: &str = "Manifest-Version";
    pub const CREATED_BY: &str = "Created-By";
    pub const BUNDLE_MANIFESTVERSION: &str = "Bundle-ManifestVersion";
    pub const BUNDLE_SYMBOLICNAME: &str = "Bundle-SymbolicName";
    pub const BUNDLE_NAME: &str = "Bundle-Name";
    pub const BUNDLE_VERSION: &str = "Bundle-Version";
    pub const BUNDLE_DESCRIPTION: &str = "Bundle-Description";
    pub const BUNDLE_CLASSPATH: &str = "Bundle-ClassPath";
    pub const EXPORT_PACKAGE: &str = "Export-Package";
    pub const IMPORT_PACKAGE: &str = "Import-Package";
    pub const PRIVATE_PACKAGE: &str = "Private-Package";
    pub const SERVICE_COMPONENT: &str = "Service-Component";
    pub const INCLUDE_RESOURCE: &str = "Include-Resource";
    pub const EMBED_DEPENDENCY: &str = "Embed-Dependency";
    pub const EMBED_DIRECTORY: &str = "Embed-Directory";
    pub const MERGE_HEADERS: &str = "Merge-Headers";

    /// Instruction: export the listed packages' contents without the header.
    pub const EXPORT_CONTENTS: &str = "-exportcontents";
    /// Instruction: downgrade analysis errors to warnings unless `false`.
    pub const FAILOK: &str = "-failok";
    /// Instruction: classpath entries available to the analyser.
    pub const CLASSPATH: &str = "-classpath";
    /// Instruction: directory relative instruction paths resolve against.
    pub const BASEDIR: &str = "-basedir";
}

const MAX_LINE: usize = 72;
const MAX_NAME: usize = 70;

static HEADER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("header name pattern is valid")
});

/// Check whether `name` is a legal manifest header name.
pub fn is_valid_header_name(name: &str) -> bool {
    name.len() <= MAX_NAME && HEADER_NAME.is_match(name)
}

/// Error reading manifest text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestParseError {
    #[error("line {line}: continuation line without a preceding header")]
    UnexpectedContinuation { line: usize },

    #[error("line {line}: expected `Name: value`")]
    MissingSeparator { line: usize },

    #[error("line {line}: invalid header name `{name}`")]
    InvalidName { line: usize, name: String },

    #[error("line {line}: duplicate header `{name}`")]
    DuplicateHeader { line: usize, name: String },
}

/// An ordered header map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    headers: Vec<(String, String)>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Manifest {
            headers: Vec::new(),
        }
    }

    /// Get a header value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Check whether a header is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a header, keeping its position when it already exists.
    ///
    /// Returns the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();

        if let Some(slot) = self.headers.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(&mut slot.1, value));
        }

        self.headers.push((name, value));
        None
    }

    /// Set a header only if it is not present yet. Returns true if inserted.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.headers.push((name, value.into()));
        true
    }

    /// Iterate headers in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Header names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Parse manifest text. Only the main section is read.
    pub fn parse(text: &str) -> Result<Self, ManifestParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut manifest = Manifest::new();
        let mut current: Option<(usize, String)> = None;

        for (idx, raw) in text.split('\n').enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);

            if let Some(rest) = line.strip_prefix(' ') {
                match current.as_mut() {
                    Some((_, logical)) => logical.push_str(rest),
                    None => return Err(ManifestParseError::UnexpectedContinuation { line: idx + 1 }),
                }
                continue;
            }

            if let Some((line_no, logical)) = current.take() {
                manifest.insert_parsed(line_no, &logical)?;
            }

            if line.is_empty() {
                break;
            }

            current = Some((idx + 1, line.to_string()));
        }

        if let Some((line_no, logical)) = current.take() {
            manifest.insert_parsed(line_no, &logical)?;
        }

        Ok(manifest)
    }

    fn insert_parsed(&mut self, line: usize, logical: &str) -> Result<(), ManifestParseError> {
        let (name, value) = logical
            .split_once(": ")
            .ok_or(ManifestParseError::MissingSeparator { line })?;

        if !is_valid_header_name(name) {
            return Err(ManifestParseError::InvalidName {
                line,
                name: name.to_string(),
            });
        }

        if !self.insert_if_absent(name, value) {
            return Err(ManifestParseError::DuplicateHeader {
                line,
                name: name.to_string(),
            });
        }

        Ok(())
    }

    /// Render the manifest text.
    ///
    /// `Manifest-Version` always comes first. In `nice` mode every clause of a
    /// multi-clause header starts on its own line.
    pub fn render(&self, nice: bool) -> String {
        let mut out = String::new();

        let version = self.get(headers::MANIFEST_VERSION).unwrap_or("1.0");
        push_wrapped(&mut out, &format!("{}: {}", headers::MANIFEST_VERSION, version), false);

        for (name, value) in self.iter() {
            if name == headers::MANIFEST_VERSION {
                continue;
            }

            let clauses = if nice {
                split_clauses(value).unwrap_or_default()
            } else {
                Vec::new()
            };

            if clauses.len() > 1 {
                push_wrapped(&mut out, &format!("{}: {},", name, clauses[0]), false);
                let last = clauses.len() - 1;
                for (i, clause) in clauses.iter().enumerate().skip(1) {
                    let text = if i == last {
                        clause.to_string()
                    } else {
                        format!("{},", clause)
                    };
                    push_wrapped(&mut out, &text, true);
                }
            } else {
                push_wrapped(&mut out, &format!("{}: {}", name, value), false);
            }
        }

        out.push_str("\r\n");
        out
    }
}

/// Append one logical line, folding it at 72 bytes.
fn push_wrapped(out: &mut String, line: &str, continuation: bool) {
    let mut rest = line;
    let mut continued = continuation;

    loop {
        let limit = if continued { MAX_LINE - 1 } else { MAX_LINE };
        if continued {
            out.push(' ');
        }

        if rest.len() <= limit {
            out.push_str(rest);
            out.push_str("\r\n");
            return;
        }

        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }

        out.push_str(&rest[..cut]);
        out.push_str("\r\n");
        rest = &rest[cut..];
        continued = true;
    }
}
