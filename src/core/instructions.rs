//! Build instructions and `Merge-Headers` patterns.

use glob::Pattern;
use thiserror::Error;

use crate::core::header::{parse_header, HeaderError};
use crate::core::manifest::headers;

/// Ordered key/value instruction set.
///
/// Later inserts of an existing key replace the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instructions {
    entries: Vec<(String, String)>,
}

impl Instructions {
    pub fn new() -> Self {
        Instructions {
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Instructions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut instructions = Instructions::new();
        for (k, v) in iter {
            instructions.insert(k, v);
        }
        instructions
    }
}

/// How a matched header is merged with the value already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDirective {
    /// Keep the on-disk value when there is one.
    Keep,
    /// Take the freshly computed value when there is one.
    Replace,
    /// Union of both clause lists, on-disk clauses first.
    Union,
}

impl MergeDirective {
    /// Directive used when a clause does not name one.
    pub fn default_for(header: &str) -> Self {
        if header == headers::IMPORT_PACKAGE || header == headers::EXPORT_PACKAGE {
            MergeDirective::Union
        } else {
            MergeDirective::Keep
        }
    }
}

impl std::str::FromStr for MergeDirective {
    type Err = InstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(MergeDirective::Keep),
            "replace" => Ok(MergeDirective::Replace),
            "union" => Ok(MergeDirective::Union),
            _ => Err(InstructionError::UnknownDirective(s.to_string())),
        }
    }
}

/// Error in a `Merge-Headers` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstructionError {
    #[error("invalid Merge-Headers instruction: {0}")]
    Header(#[from] HeaderError),

    #[error("invalid header pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    #[error("unknown merge directive `{0}` (expected keep, replace or union)")]
    UnknownDirective(String),
}

#[derive(Debug, Clone)]
struct MergeRule {
    pattern: Pattern,
    negated: bool,
    directive: Option<MergeDirective>,
}

/// Parsed `Merge-Headers` value: header patterns with merge directives.
///
/// The first rule whose pattern matches a header decides. A negated rule
/// (`!Pattern`) excludes matching headers from merging.
#[derive(Debug, Clone, Default)]
pub struct MergeInstructions {
    rules: Vec<MergeRule>,
}

impl MergeInstructions {
    /// Parse e.g. `Bundle-Changelog;merge:=keep, !Bnd-*, *-Package`.
    pub fn parse(value: &str) -> Result<Self, InstructionError> {
        let mut rules = Vec::new();

        for clause in parse_header(value)? {
            let (negated, raw) = match clause.key.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, clause.key.as_str()),
            };

            let pattern = Pattern::new(raw).map_err(|e| InstructionError::Pattern {
                pattern: raw.to_string(),
                message: e.msg.to_string(),
            })?;

            let directive = clause.directive("merge").map(str::parse).transpose()?;

            rules.push(MergeRule {
                pattern,
                negated,
                directive,
            });
        }

        Ok(MergeInstructions { rules })
    }

    /// The merge decision for a header, or `None` if it is not merged.
    pub fn decision(&self, header: &str) -> Option<MergeDirective> {
        let rule = self.rules.iter().find(|r| r.pattern.matches(header))?;
        if rule.negated {
            return None;
        }
        Some(rule.directive.unwrap_or_else(|| MergeDirective::default_for(header)))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
