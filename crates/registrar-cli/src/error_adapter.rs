//! Error adapter for converting RegistrarError to miette diagnostics.
//!
//! This module provides the bridge between the library's diagnostic types
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! # Positions
//!
//! Diagnostics locate problems through provenance origins. Only origins that
//! carry a line (YAML syntax errors, template placeholders) become source
//! spans; the logical path of the other origins is shown in the label text.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceOffset, SourceSpan};

use registrar::{RegistrarError, provenance::ProvenanceOrigin};
use registrar_parser::error::{Diagnostic, Severity};

/// Adapter for a single registrar diagnostic.
pub struct DiagnosticAdapter<'a> {
    /// The wrapped diagnostic
    diag: &'a Diagnostic,
    /// Source text for displaying snippets
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter.
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }

    fn span(&self, origin: &ProvenanceOrigin) -> Option<SourceSpan> {
        if !origin.has_position() {
            return None;
        }
        let column = origin.column().unwrap_or(1);
        let offset = SourceOffset::from_location(self.src, origin.line(), column);
        Some(SourceSpan::new(offset, 0))
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diag.location() {
            Some(origin) if !origin.logical_path().is_empty() => {
                write!(f, "{} (at {})", self.diag.message(), origin.logical_path())
            }
            _ => write!(f, "{}", self.diag.message()),
        }
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diag.severity() {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Info => miette::Severity::Advice,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let primary = self.diag.location().and_then(|origin| {
            self.span(origin)
                .map(|span| LabeledSpan::new_primary_with_span(None, span))
        });
        let related = self.diag.labels().iter().filter_map(|label| {
            let span = self.span(label.origin())?;
            let message = Some(label.message().to_string());
            Some(if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            })
        });

        let labels: Vec<_> = primary.into_iter().chain(related).collect();
        if labels.is_empty() {
            return None;
        }
        Some(Box::new(labels.into_iter()))
    }
}

/// Adapter for non-diagnostic [`RegistrarError`] variants.
pub struct ErrorAdapter<'a>(pub &'a RegistrarError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            RegistrarError::Io(_) => "registrar::io",
            RegistrarError::Compile { .. } => return None,
            RegistrarError::Template(_) => "registrar::template",
            RegistrarError::Config(_) => "registrar::config",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A diagnostic with provenance information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`RegistrarError`] into a list of reportable errors.
///
/// For [`RegistrarError::Compile`], this returns one [`Reportable`] for each
/// diagnostic in the error. For other error variants, this returns a single
/// [`Reportable`].
pub fn to_reportables(err: &RegistrarError) -> Vec<Reportable<'_>> {
    match err {
        RegistrarError::Compile {
            err: parse_err,
            src,
        } => diagnostic_reportables(parse_err.diagnostics(), src),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

/// Wrap the diagnostics of a run that produced a model, one per diagnostic.
pub fn diagnostic_reportables<'a>(
    diagnostics: &'a [Diagnostic],
    src: &'a str,
) -> Vec<Reportable<'a>> {
    diagnostics
        .iter()
        .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d, src)))
        .collect()
}

#[cfg(test)]
mod tests {
    use registrar_parser::error::{ErrorCode, ParseError};

    use super::*;

    fn origin(line: usize, column: usize) -> ProvenanceOrigin {
        ProvenanceOrigin::new("registry.yaml", "CodeGen").with_position(line, Some(column))
    }

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("YAML syntax error")
            .with_code(ErrorCode::E001)
            .with_location(origin(2, 3))
            .with_help("check the indentation");
        let err = RegistrarError::new_compile_error(ParseError::from(diag), "a: 1\nb: [\n");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Diagnostic(d) => {
                assert_eq!(d.to_string(), "YAML syntax error (at CodeGen)");
                let labels: Vec<_> = d.labels().unwrap().collect();
                assert_eq!(labels.len(), 1);
                assert!(labels[0].primary());
                assert_eq!(labels[0].offset(), 7);
            }
            Reportable::Error(_) => panic!("Expected Diagnostic"),
        }
    }

    #[test]
    fn test_multiple_diagnostics() {
        let diags = vec![
            Diagnostic::error("first error").with_code(ErrorCode::E200),
            Diagnostic::error("second error").with_code(ErrorCode::E201),
        ];
        let err = RegistrarError::new_compile_error(ParseError::from(diags), "source");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 2);
        assert_eq!(reportables[0].to_string(), "first error");
        assert_eq!(reportables[1].to_string(), "second error");
    }

    #[test]
    fn test_positionless_origins_have_no_labels() {
        let diag = Diagnostic::error("duplicate named instance")
            .with_location(ProvenanceOrigin::new("registry.yaml", "NamedInstances[1]"))
            .with_related(
                ProvenanceOrigin::new("registry.yaml", "NamedInstances[0]"),
                "first defined here",
            );
        let adapter = DiagnosticAdapter::new(&diag, "source");
        assert!(adapter.labels().is_none());
        assert_eq!(
            adapter.to_string(),
            "duplicate named instance (at NamedInstances[1])"
        );
    }

    #[test]
    fn test_severity_mapping() {
        let warning = Diagnostic::warning("unknown key");
        let info = Diagnostic::info("reference cycle");
        assert_eq!(
            DiagnosticAdapter::new(&warning, "").severity(),
            Some(miette::Severity::Warning)
        );
        assert_eq!(
            DiagnosticAdapter::new(&info, "").severity(),
            Some(miette::Severity::Advice)
        );
    }

    #[test]
    fn test_non_compile_error() {
        let err = RegistrarError::Config("bad value".to_string());

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Configuration error: bad value");
                assert_eq!(e.code().unwrap().to_string(), "registrar::config");
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }
}
