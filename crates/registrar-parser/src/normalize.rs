//! Normalizer: raw model to canonical model.
//!
//! One function per entity kind turns a raw DTO into its canonical
//! counterpart. Every function follows the same steps:
//!
//! 1. Normalize the entity's own provenance, or inherit the parent's stack
//!    with an E215 warning when it is absent or malformed.
//! 2. Check required scalar fields are present and non-blank (E200).
//! 3. Check identifier, namespace, interface-name and type-reference shapes.
//! 4. Normalize child collections, accumulating their diagnostics.
//! 5. Apply defaults: absent booleans are `false`, absent collections empty.
//! 6. Construct the canonical value, even when errors were recorded.
//!
//! The result is a [`Normalized`] value. Its partial value is available for
//! best-effort processing, but [`Normalized::into_canonical`] only yields it
//! when no error was produced for the node or any of its children.

mod instances;
pub(crate) mod shape;
mod types;

use chrono::{DateTime, Utc};
use log::{debug, info};

use registrar_core::{
    canonical::{Assembly, Configuration},
    provenance::ProvenanceStack,
    raw::RawConfiguration,
};

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode};

pub use instances::{ClassIndex, normalize_assignment, normalize_element, normalize_named_instance};
pub use types::{
    normalize_assembly, normalize_class, normalize_code_gen, normalize_interface,
    normalize_namespace, normalize_parameter,
};

use shape::{entity_provenance, origin_of};

/// Tool identifier recorded in provenance entries by default.
pub const DEFAULT_TOOL_ID: &str = "registrar";

/// Settings shared by every normalization call of one compilation.
///
/// The timestamp is injected rather than read from the clock inside the
/// pipeline, so normalizing the same document twice with the same context
/// yields identical output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeContext {
    tool_id: String,
    timestamp: DateTime<Utc>,
    allow_int_to_float: bool,
}

impl NormalizeContext {
    pub fn new(tool_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            tool_id: tool_id.into(),
            timestamp,
            allow_int_to_float: false,
        }
    }

    /// Accept integer literals for floating-point parameters.
    pub fn with_allow_int_to_float(mut self, allow: bool) -> Self {
        self.allow_int_to_float = allow;
        self
    }

    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn allow_int_to_float(&self) -> bool {
        self.allow_int_to_float
    }
}

impl Default for NormalizeContext {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_ID, Utc::now())
    }
}

/// Result of normalizing one entity.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    value: Option<T>,
    diagnostics: Vec<Diagnostic>,
}

impl<T> Normalized<T> {
    pub(crate) fn new(value: Option<T>, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// The constructed value, possibly built despite errors.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Diagnostics for this entity and its children.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if an error was produced for this entity or a child.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Move the diagnostics into `sink` and return the value only if no
    /// error was produced.
    pub fn into_canonical(self, sink: &mut DiagnosticCollector) -> Option<T> {
        let failed = self.has_errors();
        sink.extend(self.diagnostics);
        if failed { None } else { self.value }
    }

    /// Split into the partial value and the diagnostics.
    pub fn into_parts(self) -> (Option<T>, Vec<Diagnostic>) {
        (self.value, self.diagnostics)
    }

    /// Append the diagnostics to a parent's list and return the partial value.
    pub(crate) fn absorb(self, diagnostics: &mut Vec<Diagnostic>) -> Option<T> {
        diagnostics.extend(self.diagnostics);
        self.value
    }
}

/// Normalize a whole document.
///
/// Namespaces are normalized first; named instances are then normalized
/// against an index of the normalized classes (first declaration wins) and
/// the builtin types.
pub fn normalize_configuration(
    raw: &RawConfiguration,
    cx: &NormalizeContext,
) -> Normalized<Configuration> {
    let mut diagnostics = Vec::new();
    let provenance = entity_provenance(
        raw.provenance.as_ref(),
        &ProvenanceStack::new(),
        "Configuration",
        cx,
        &mut diagnostics,
    );
    let origin = origin_of(&provenance);
    let source_path = raw
        .source_path
        .clone()
        .unwrap_or_else(|| origin.source_path().to_string());
    info!(source_path; "Normalizing registry description");

    let code_gen = match &raw.code_gen {
        Some(code_gen) => normalize_code_gen(code_gen, &provenance, cx).absorb(&mut diagnostics),
        None => {
            diagnostics.push(
                Diagnostic::error("required section `CodeGen` is missing")
                    .with_code(ErrorCode::E200)
                    .with_location(origin.field("CodeGen"))
                    .with_help("add a `CodeGen` mapping with `RegistryClassName`, `GeneratedCodePath`, `NamespaceName` and `InitializerName`"),
            );
            None
        }
    };

    let mut assemblies: Vec<Assembly> = Vec::new();
    for raw_assembly in raw.assemblies.iter().flatten() {
        let Some(assembly) =
            normalize_assembly(raw_assembly, &provenance, cx).absorb(&mut diagnostics)
        else {
            continue;
        };
        if let Some(first) = assemblies.iter().find(|a| a.name() == assembly.name()) {
            diagnostics.push(
                Diagnostic::warning(format!("assembly `{}` is listed more than once", assembly.name()))
                    .with_code(ErrorCode::E216)
                    .with_location(origin_of(assembly.provenance()))
                    .with_related(origin_of(first.provenance()), "first listed here"),
            );
            continue;
        }
        assemblies.push(assembly);
    }

    let namespaces: Vec<_> = raw
        .namespaces
        .iter()
        .flatten()
        .filter_map(|ns| normalize_namespace(ns, &provenance, cx).absorb(&mut diagnostics))
        .collect();

    let classes = ClassIndex::from_namespaces(&namespaces);
    debug!(classes = classes.len(); "Class index built");

    let named_instances: Vec<_> = raw
        .named_instances
        .iter()
        .flatten()
        .filter_map(|instance| {
            normalize_named_instance(instance, &provenance, cx, &classes).absorb(&mut diagnostics)
        })
        .collect();

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    info!(
        namespaces = namespaces.len(),
        named_instances = named_instances.len(),
        errors;
        "Normalization finished"
    );

    let value = code_gen.map(|code_gen| {
        Configuration::new(
            provenance,
            source_path,
            code_gen,
            assemblies,
            namespaces,
            named_instances,
        )
    });
    Normalized::new(value, diagnostics)
}
