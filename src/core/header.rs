//! Clause parsing for manifest header values.
//!
//! Header values such as `Export-Package` are comma-separated lists of
//! clauses. Each clause is one or more keys followed by `;`-separated
//! parameters, where `name=value` is an attribute and `name:=value` is a
//! directive. Separators inside double quotes are literal, so
//! `version="[1.0,2.0)"` stays a single parameter.

use std::collections::HashSet;

use thiserror::Error;

/// Error raised for header values that cannot be split into clauses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("unbalanced quotes in header value `{0}`")]
    UnbalancedQuotes(String),
}

/// A single parsed clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Clause key (package name, resource path, pattern, ...)
    pub key: String,
    /// `name=value` parameters, in declaration order
    pub attributes: Vec<(String, String)>,
    /// `name:=value` parameters, in declaration order
    pub directives: Vec<(String, String)>,
}

impl Clause {
    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a directive by name.
    pub fn directive(&self, name: &str) -> Option<&str> {
        self.directives
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Split `value` on `sep`, ignoring separators inside double quotes.
///
/// Pieces are trimmed; empty pieces are dropped.
fn split_unquoted(value: &str, sep: char) -> Result<Vec<&str>, HeaderError> {
    let mut pieces = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (idx, ch) in value.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == sep && !in_quotes {
            pieces.push(value[start..idx].trim());
            start = idx + ch.len_utf8();
        }
    }

    if in_quotes {
        return Err(HeaderError::UnbalancedQuotes(value.to_string()));
    }

    pieces.push(value[start..].trim());
    pieces.retain(|p| !p.is_empty());
    Ok(pieces)
}

/// Split a header value into its top-level clauses, keeping each clause's text.
pub fn split_clauses(value: &str) -> Result<Vec<&str>, HeaderError> {
    split_unquoted(value, ',')
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

/// Parse a header value into clauses.
///
/// A clause with several leading keys (`a;b;version=1`) yields one clause per
/// key, each sharing the parameters.
pub fn parse_header(value: &str) -> Result<Vec<Clause>, HeaderError> {
    let mut clauses = Vec::new();

    for clause in split_clauses(value)? {
        let mut keys = Vec::new();
        let mut attributes = Vec::new();
        let mut directives = Vec::new();

        for part in split_unquoted(clause, ';')? {
            if let Some((name, value)) = part.split_once(":=") {
                directives.push((name.trim().to_string(), unquote(value)));
            } else if let Some((name, value)) = part.split_once('=') {
                attributes.push((name.trim().to_string(), unquote(value)));
            } else {
                keys.push(part.to_string());
            }
        }

        for key in keys {
            clauses.push(Clause {
                key,
                attributes: attributes.clone(),
                directives: directives.clone(),
            });
        }
    }

    Ok(clauses)
}

fn clauses_or_whole(value: &str) -> Vec<&str> {
    split_clauses(value).unwrap_or_else(|_| vec![value.trim()])
}

/// Ordered, duplicate-free union of two clause lists.
///
/// `existing` is kept as written, followed by the clauses of `fresh` that are
/// not already present. Values that cannot be split are treated as a single
/// clause.
pub fn union_clauses(existing: &str, fresh: &str) -> String {
    let mut seen: HashSet<&str> = clauses_or_whole(existing).into_iter().collect();
    let added: Vec<&str> = clauses_or_whole(fresh)
        .into_iter()
        .filter(|clause| seen.insert(*clause))
        .collect();

    if added.is_empty() {
        existing.to_string()
    } else if existing.trim().is_empty() {
        added.join(",")
    } else {
        format!("{},{}", existing.trim_end(), added.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_quotes() {
        let clauses =
            split_clauses(r#"com.a;version="[1.0,2.0)", com.b ,,com.c"#).unwrap();
        assert_eq!(clauses, vec![r#"com.a;version="[1.0,2.0)""#, "com.b", "com.c"]);
    }

    #[test]
    fn test_unbalanced_quotes() {
        assert!(matches!(
            split_clauses(r#"com.a;version="1.0"#),
            Err(HeaderError::UnbalancedQuotes(_))
        ));
    }

    #[test]
    fn test_parse_attributes_and_directives() {
        let clauses =
            parse_header(r#"com.a;com.b;version="1.2";uses:="com.c,com.d""#).unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].key, "com.a");
        assert_eq!(clauses[1].key, "com.b");
        assert_eq!(clauses[0].attribute("version"), Some("1.2"));
        assert_eq!(clauses[1].directive("uses"), Some("com.c,com.d"));
        assert_eq!(clauses[0].directive("version"), None);
    }

    #[test]
    fn test_union_existing_first() {
        assert_eq!(union_clauses("a, b", "c,a"), "a, b,c");
        assert_eq!(union_clauses("a, b", "b,a"), "a, b");
        assert_eq!(union_clauses("", "x"), "x");
        assert_eq!(union_clauses("x", ""), "x");
    }

    #[test]
    fn test_union_membership_is_commutative() {
        let left = union_clauses("a,b;version=1", "c,b;version=1");
        let right = union_clauses("c,b;version=1", "a,b;version=1");

        let mut left: Vec<_> = left.split(',').map(str::trim).collect();
        let mut right: Vec<_> = right.split(',').map(str::trim).collect();
        left.sort_unstable();
        right.sort_unstable();
        assert_eq!(left, right);
    }
}
