//! Structured diagnostics
//!
//! Malformed-but-parseable input, unknown analysis names and unsupported
//! modes are reported here instead of aborting the batch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One reported problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Stable machine-readable code, e.g. `unknown-analysis`
    pub code: String,

    pub message: String,

    /// Function or program point the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Emit through `tracing` at the matching level
    pub fn log(&self) {
        match self.severity {
            Severity::Info => tracing::info!(code = %self.code, "{}", self),
            Severity::Warning => tracing::warn!(code = %self.code, "{}", self),
            Severity::Error => tracing::error!(code = %self.code, "{}", self),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "{} [{}] {}: {}",
                self.severity, self.code, location, self.message
            ),
            None => write!(f, "{} [{}] {}", self.severity, self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_location() {
        let diag = Diagnostic::warning("empty-body", "function has no instructions").at("foo");
        assert_eq!(
            diag.to_string(),
            "warning [empty-body] foo: function has no instructions"
        );
    }

    #[test]
    fn test_serialize_skips_missing_location() {
        let diag = Diagnostic::error("duplicate-function", "main defined twice");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"severity\":\"error\""));
        assert!(!json.contains("location"));
    }
}
