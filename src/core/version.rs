//! Conversion of build versions to OSGi bundle versions.

use std::sync::LazyLock;

use regex::Regex;

static BUILD_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+)(?:\.(\d+))?)?(?:[-.](.*))?$").expect("version pattern is valid")
});

static INVALID_QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("qualifier pattern is valid"));

fn clean_qualifier(qualifier: &str) -> String {
    INVALID_QUALIFIER.replace_all(qualifier, "_").into_owned()
}

/// Convert a build version such as `1.0-SNAPSHOT` into `1.0.0.SNAPSHOT`.
///
/// Missing numeric parts default to `0`. A version that does not start with
/// a number is kept as the qualifier of `0.0.0`.
pub fn to_osgi_version(version: &str) -> String {
    let version = version.trim();

    let Some(caps) = BUILD_VERSION.captures(version) else {
        if version.is_empty() {
            return "0.0.0".to_string();
        }
        return format!("0.0.0.{}", clean_qualifier(version));
    };

    let part = |i: usize| caps.get(i).map_or("0", |m| m.as_str());
    let mut osgi = format!("{}.{}.{}", part(1), part(2), part(3));

    if let Some(qualifier) = caps.get(4).map(|m| m.as_str()).filter(|q| !q.is_empty()) {
        osgi.push('.');
        osgi.push_str(&clean_qualifier(qualifier));
    }

    osgi
}
