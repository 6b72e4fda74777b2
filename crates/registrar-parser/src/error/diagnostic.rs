//! The core diagnostic type.
//!
//! A [`Diagnostic`] represents a single error, warning or note with an
//! optional error code, the origin it was raised at, labeled related origins
//! and help text.

use std::fmt;

use registrar_core::provenance::ProvenanceOrigin;

use crate::error::{Severity, error_code::ErrorCode, label::Label};

/// A diagnostic message with provenance information.
///
/// # Example
///
/// ```text
/// error[E208]: literal `5.5` does not match parameter `count` of type `System.Int32`
///   --> registry.yaml (NamedInstances[0].Assignments[0].Value)
///    = help: integer parameters accept integer literals only
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    location: Option<ProvenanceOrigin>,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use registrar_parser::error::{Diagnostic, ErrorCode};
    /// # use registrar_core::provenance::ProvenanceOrigin;
    /// let origin = ProvenanceOrigin::new("registry.yaml", "NamedInstances[0].Class");
    /// let diag = Diagnostic::error("class `Ns.Missing` is not declared")
    ///     .with_code(ErrorCode::E209)
    ///     .with_location(origin)
    ///     .with_help("declare the class under `Namespaces`");
    /// assert!(diag.severity().is_error());
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the origin the diagnostic was raised at, if known.
    pub fn location(&self) -> Option<&ProvenanceOrigin> {
        self.location.as_ref()
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Returns `true` if this diagnostic has error severity.
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the origin the diagnostic is raised at.
    pub fn with_location(mut self, origin: ProvenanceOrigin) -> Self {
        self.location = Some(origin);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, origin: ProvenanceOrigin, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(origin, message));
        self
    }

    /// Add a secondary label pointing at a related origin.
    pub fn with_related(mut self, origin: ProvenanceOrigin, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(origin, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Change the severity, keeping everything else.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            location: None,
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(path: &str) -> ProvenanceOrigin {
        ProvenanceOrigin::new("a.yaml", path)
    }

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.location().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
    }

    #[test]
    fn test_diagnostic_with_location_and_related() {
        let diag = Diagnostic::error("named instance `A` is defined multiple times")
            .with_code(ErrorCode::E304)
            .with_location(origin("NamedInstances[1].Name"))
            .with_related(origin("NamedInstances[0].Name"), "first defined here");

        assert_eq!(
            diag.location().map(ProvenanceOrigin::logical_path),
            Some("NamedInstances[1].Name")
        );
        assert_eq!(diag.labels().len(), 1);
        assert!(diag.labels()[0].is_secondary());
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::error("unknown key `Nmae`").with_code(ErrorCode::E100);
        assert_eq!(diag.to_string(), "error[E100]: unknown key `Nmae`");
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::info("reference cycle");
        assert_eq!(diag.to_string(), "info: reference cycle");
    }

    #[test]
    fn test_with_severity() {
        let diag = Diagnostic::error("unknown placeholder").with_severity(Severity::Warning);
        assert!(diag.severity().is_warning());
        assert!(!diag.is_error());
    }
}
