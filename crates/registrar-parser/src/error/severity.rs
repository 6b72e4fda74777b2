//! Severity levels for diagnostics.

use std::fmt;

/// The severity level of a diagnostic.
///
/// Only [`Severity::Error`] blocks a pipeline stage:
/// - [`Severity::Error`] prevents the affected value from propagating
/// - [`Severity::Warning`] reports a problem the pipeline recovered from
/// - [`Severity::Info`] records a noteworthy but legal situation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Informational note, such as a reference cycle between instances.
    Info,

    /// A non-fatal problem.
    ///
    /// Unknown keys, inherited provenance and external parameter types are
    /// reported as warnings.
    Warning,

    /// A fatal problem for the affected entity.
    Error,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }

    /// Returns `true` if this is an info severity.
    pub fn is_info(&self) -> bool {
        matches!(self, Severity::Info)
    }
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
