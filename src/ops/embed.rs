//! Translation of `Embed-Dependency` into resource instructions.
//!
//! `Embed-Dependency: commons-*;scope=compile|runtime, org.acme:util`
//! selects dependencies by artifact id (or `group:artifact`) and embeds
//! their files into the bundle, adding them to `Bundle-ClassPath`.

use glob::Pattern;
use thiserror::Error;

use crate::core::header::{parse_header, HeaderError};
use crate::core::request::Dependency;

/// Error in an `Embed-Dependency` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedError {
    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("invalid dependency pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
}

/// Instructions derived from an `Embed-Dependency` clause list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embedding {
    /// `target=source` clauses for `Include-Resource`
    pub include_resource: Vec<String>,
    /// Entries for `Bundle-ClassPath`, without the leading `.`
    pub bundle_classpath: Vec<String>,
}

impl Embedding {
    pub fn is_empty(&self) -> bool {
        self.include_resource.is_empty()
    }
}

fn matches_dependency(pattern: &Pattern, key: &str, dep: &Dependency) -> bool {
    if key.contains(':') {
        let group = dep.group.as_deref().unwrap_or("");
        pattern.matches(&format!("{}:{}", group, dep.artifact))
    } else {
        pattern.matches(&dep.artifact)
    }
}

/// Select and embed dependencies.
///
/// `embed_directory` prefixes embedded file names. Matched dependencies
/// without a resolved file are skipped with a warning.
pub fn embed_dependencies(
    instruction: &str,
    embed_directory: Option<&str>,
    dependencies: &[Dependency],
) -> Result<Embedding, EmbedError> {
    let mut embedding = Embedding::default();
    let mut embedded: Vec<&Dependency> = Vec::new();

    for clause in parse_header(instruction)? {
        let pattern = Pattern::new(&clause.key).map_err(|e| EmbedError::Pattern {
            pattern: clause.key.clone(),
            message: e.msg.to_string(),
        })?;
        let scopes: Option<Vec<&str>> = clause
            .attribute("scope")
            .map(|s| s.split('|').map(str::trim).collect());
        let optional = clause.attribute("optional").map(|o| o != "false");

        for dep in dependencies {
            if !matches_dependency(&pattern, &clause.key, dep) {
                continue;
            }
            if let Some(scopes) = &scopes {
                if !scopes.iter().any(|s| *s == dep.scope) {
                    continue;
                }
            }
            if optional == Some(false) && dep.optional {
                continue;
            }
            if embedded.iter().any(|d| std::ptr::eq(*d, dep)) {
                continue;
            }
            embedded.push(dep);

            let Some(file) = &dep.file else {
                tracing::warn!("cannot embed `{}`: dependency has no resolved file", dep.artifact);
                continue;
            };

            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dep.artifact.clone());
            let target = match embed_directory.map(|d| d.trim_matches('/')) {
                Some(dir) if !dir.is_empty() => format!("{}/{}", dir, file_name),
                _ => file_name,
            };

            tracing::debug!("embedding {} as {}", file.display(), target);
            embedding
                .include_resource
                .push(format!("{}={}", target, file.display()));
            embedding.bundle_classpath.push(target);
        }
    }

    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps() -> Vec<Dependency> {
        let mut util = Dependency::new("util").with_file("/repo/util-1.0.jar");
        util.group = Some("org.acme".to_string());
        let mut opt = Dependency::new("commons-extra").with_file("/repo/commons-extra.jar");
        opt.optional = true;

        vec![
            Dependency::new("commons-lang").with_file("/repo/commons-lang-2.6.jar"),
            Dependency::new("commons-io")
                .with_file("/repo/commons-io-2.4.jar")
                .with_scope("test"),
            util,
            opt,
            Dependency::new("unresolved"),
        ]
    }

    #[test]
    fn test_scope_filter() {
        let embedding = embed_dependencies("commons-*;scope=compile|runtime", None, &deps()).unwrap();
        assert_eq!(
            embedding.include_resource,
            vec![
                "commons-lang-2.6.jar=/repo/commons-lang-2.6.jar".to_string(),
                "commons-extra.jar=/repo/commons-extra.jar".to_string(),
            ]
        );
    }

    #[test]
    fn test_group_pattern_and_directory() {
        let embedding = embed_dependencies("org.acme:*", Some("lib/"), &deps()).unwrap();
        assert_eq!(embedding.bundle_classpath, vec!["lib/util-1.0.jar".to_string()]);
    }

    #[test]
    fn test_optional_and_unresolved_are_skipped() {
        let embedding = embed_dependencies("*;optional=false", None, &deps()).unwrap();
        assert_eq!(
            embedding.bundle_classpath,
            vec![
                "commons-lang-2.6.jar".to_string(),
                "commons-io-2.4.jar".to_string(),
                "util-1.0.jar".to_string(),
            ]
        );
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let err = embed_dependencies("commons-lang, [bad", None, &deps()).unwrap_err();
        assert!(matches!(err, EmbedError::Pattern { ref pattern, .. } if pattern == "[bad"));
    }

    #[test]
    fn test_duplicate_matches_embedded_once() {
        let embedding = embed_dependencies("commons-lang, commons-*", None, &deps()).unwrap();
        assert_eq!(embedding.include_resource.len(), 3);
        assert!(!embedding.is_empty());
    }
}
