//! Whether analysis problems fail the build unit.

/// Log the analyser's problems. Returns true if any errors were reported.
pub fn report_problems(label: &str, errors: &[String], warnings: &[String]) -> bool {
    for warning in warnings {
        tracing::warn!("{}: {}", label, warning);
    }
    for error in errors {
        tracing::error!("{}: {}", label, error);
    }
    !errors.is_empty()
}

/// Decide whether reported errors are fatal.
///
/// Errors fail the build unless `failok` is set to anything other than
/// `false` (compared case-insensitively). An empty value also suppresses the
/// failure.
pub fn is_fatal(error_count: usize, failok: Option<&str>) -> bool {
    if error_count == 0 {
        return false;
    }
    match failok {
        None => true,
        Some(value) => value.eq_ignore_ascii_case("false"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_errors_never_fatal() {
        assert!(!is_fatal(0, None));
        assert!(!is_fatal(0, Some("false")));
    }

    #[test]
    fn test_failok_polarity() {
        assert!(is_fatal(1, None));
        assert!(is_fatal(1, Some("false")));
        assert!(is_fatal(2, Some("FALSE")));
        assert!(!is_fatal(1, Some("true")));
        assert!(!is_fatal(1, Some("no")));
        assert!(!is_fatal(1, Some("")));
    }

    #[test]
    fn test_report_problems() {
        let warnings = vec!["superfluous export".to_string()];
        assert!(!report_problems("demo", &[], &warnings));
        assert!(report_problems("demo", &["broken".to_string()], &[]));
    }
}
