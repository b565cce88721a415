//! String-field safety checks.
//!
//! Effect programs name stats, statuses, entity types and other effects
//! by string. Those strings eventually reach host code, so every one is
//! screened twice:
//! - against a denylist of injection markers (prototype pollution, path
//!   traversal, script/template injection, code loading), compiled once
//!   into a single case-insensitive matcher
//! - against the identifier grammar `^[A-Za-z_][A-Za-z0-9_]*$`
//!
//! Free-form strings (event payload literals, flavor names) only get the
//! denylist check.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

/// Substrings that never belong in an effect program.
pub const DANGEROUS_PATTERNS: &[&str] = &[
    "__proto__",
    "constructor",
    "prototype",
    "../",
    "..\\",
    "<script",
    "</script",
    "javascript:",
    "${",
    "{{",
    "eval(",
    "require(",
    "import(",
    "function(",
    "process.",
    "globalthis",
    "\0",
];

static DENYLIST: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(
        DANGEROUS_PATTERNS
            .iter()
            .map(|p| format!("(?i){}", regex::escape(p))),
    )
    .expect("denylist patterns are escaped literals")
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex must compile"));

/// A string field failed screening.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecurityViolation {
    #[error("Dangerous pattern {pattern:?} in {field}: {value:?}")]
    DangerousPattern {
        field: String,
        value: String,
        pattern: &'static str,
    },

    #[error("Invalid identifier in {field}: {value:?}")]
    InvalidIdentifier { field: String, value: String },
}

impl SecurityViolation {
    /// The field that failed.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::DangerousPattern { field, .. } | Self::InvalidIdentifier { field, .. } => field,
        }
    }
}

/// The first denylisted pattern contained in `value`, if any.
#[must_use]
pub fn find_dangerous_pattern(value: &str) -> Option<&'static str> {
    DENYLIST
        .matches(value)
        .into_iter()
        .next()
        .map(|index| DANGEROUS_PATTERNS[index])
}

/// Check a free-form string against the denylist only.
pub fn check_text(field: &str, value: &str) -> Result<(), SecurityViolation> {
    match find_dangerous_pattern(value) {
        Some(pattern) => Err(SecurityViolation::DangerousPattern {
            field: field.to_string(),
            value: value.to_string(),
            pattern,
        }),
        None => Ok(()),
    }
}

/// Check a string that must be a plain identifier.
pub fn check_identifier(field: &str, value: &str) -> Result<(), SecurityViolation> {
    check_text(field, value)?;
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(SecurityViolation::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifiers_pass() {
        assert!(check_identifier("stat", "intelligence").is_ok());
        assert!(check_identifier("stat", "_hidden2").is_ok());
    }

    #[test]
    fn test_denylist_hits() {
        for value in [
            "__proto__",
            "Constructor",
            "../../etc/passwd",
            "<SCRIPT>alert(1)",
            "${process.env}",
            "eval(1)",
            "require('fs')",
        ] {
            assert!(
                matches!(check_text("field", value), Err(SecurityViolation::DangerousPattern { .. })),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_identifier_grammar() {
        for value in ["", "9lives", "fire-ball", "a b", "stat.name"] {
            assert!(
                matches!(
                    check_identifier("stat", value),
                    Err(SecurityViolation::InvalidIdentifier { .. })
                ),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_denylist_reported_before_grammar() {
        let err = check_identifier("status", "prototype").unwrap_err();
        assert_eq!(err.field(), "status");
        assert!(matches!(err, SecurityViolation::DangerousPattern { pattern: "prototype", .. }));
    }

    #[test]
    fn test_free_text_allows_spaces() {
        assert!(check_text("payload.message", "The sky burns").is_ok());
    }
}
