//! # Registrar Parser
//!
//! Front-end for Registrar registry descriptions. This crate turns YAML text
//! into a resolved, invariant-checked model.
//!
//! ## Usage
//!
//! ```
//! # use registrar_parser::{compile, normalize::NormalizeContext};
//! let source = r#"
//! CodeGen:
//!   RegistryClassName: Registry
//!   GeneratedCodePath: Generated
//!   NamespaceName: App.Generated
//!   InitializerName: Initialize
//! Namespaces:
//!   - Name: Ns
//!     Classes:
//!       - Name: Foo
//!         Parameters:
//!           - { Name: count, Class: System.Int32 }
//! NamedInstances:
//!   - Name: MyFoo
//!     Class: Ns.Foo
//!     Assignments:
//!       - { Parameter: count, Value: "5" }
//! "#;
//!
//! let compilation = compile(source, "registry.yaml", &NormalizeContext::default());
//! assert!(compilation.is_success());
//! assert!(compilation.model().unwrap().instance("MyFoo").is_some());
//! ```

pub mod error;
pub mod extract;
pub mod ingest;
pub mod normalize;
pub mod resolve;
pub mod schema;

use log::{info, trace};

use registrar_core::raw::RawConfiguration;

use error::{Diagnostic, DiagnosticCollector, ParseError};
use normalize::{NormalizeContext, normalize_configuration};
use resolve::ResolvedModel;

/// Outcome of compiling one document.
///
/// The diagnostic list is always complete and ordered by phase (ingest,
/// schema, extraction, normalization, resolution). The model is present when
/// normalization succeeded, even if resolution reported errors for some
/// named instances; those instances are missing from the model.
#[derive(Debug, Clone)]
pub struct Compilation {
    model: Option<ResolvedModel>,
    diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn model(&self) -> Option<&ResolvedModel> {
        self.model.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if a model was produced and no error was reported.
    pub fn is_success(&self) -> bool {
        self.model.is_some() && !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Split into the model and the diagnostics.
    pub fn into_parts(self) -> (Option<ResolvedModel>, Vec<Diagnostic>) {
        (self.model, self.diagnostics)
    }

    /// Convert into a `Result`, returning the model with its warnings on
    /// success and every diagnostic on failure.
    pub fn into_result(self) -> Result<(ResolvedModel, Vec<Diagnostic>), ParseError> {
        let success = self.is_success();
        match self.model {
            Some(model) if success => Ok((model, self.diagnostics)),
            _ => Err(ParseError::new(self.diagnostics)),
        }
    }
}

/// Compile YAML `source` into a resolved model.
///
/// 1. **Ingest** - Parse the YAML text into a node tree
/// 2. **Validate keys** - Check every key against the schema table
/// 3. **Extract** - Read the tree into the raw model
/// 4. **Normalize** - Convert the raw model to the canonical model
/// 5. **Resolve** - Build lookup tables and validate references
///
/// Resolution only runs when the earlier phases produced no errors.
pub fn compile(source: &str, source_path: &str, cx: &NormalizeContext) -> Compilation {
    let mut collector = DiagnosticCollector::new();

    let (document, diagnostics) = ingest::ingest(source, source_path);
    collector.extend(diagnostics);
    let Some(document) = document else {
        return Compilation {
            model: None,
            diagnostics: collector.into_diagnostics(),
        };
    };

    collector.extend(schema::validate_document(&document));

    let (raw, diagnostics) = extract::extract(&document, cx);
    collector.extend(diagnostics);
    trace!(raw:?; "Raw model");

    finish(&raw, cx, collector)
}

/// Compile a raw model built by hand or by another front-end.
pub fn compile_raw(raw: &RawConfiguration, cx: &NormalizeContext) -> Compilation {
    finish(raw, cx, DiagnosticCollector::new())
}

fn finish(
    raw: &RawConfiguration,
    cx: &NormalizeContext,
    mut collector: DiagnosticCollector,
) -> Compilation {
    let configuration = normalize_configuration(raw, cx).into_canonical(&mut collector);

    let model = match configuration {
        Some(configuration) if !collector.has_errors() => {
            Some(resolve::resolve(configuration, &mut collector))
        }
        _ => {
            let errors = collector.diagnostics().iter().filter(|d| d.is_error()).count();
            info!(errors; "Skipping resolution");
            None
        }
    };

    Compilation {
        model,
        diagnostics: collector.into_diagnostics(),
    }
}
