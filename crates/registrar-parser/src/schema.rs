//! Schema/key validator.
//!
//! A static table maps each structural context (e.g. `root`, `CodeGen`,
//! `NamedInstances.item`) to the keys legal in it, and a second table says
//! which keys descend into a child context. Unknown keys are reported as E100
//! warnings; keys that only differ from a legal key by casing are reported
//! as E101 with the correct spelling. The pass never blocks normalization.

use log::debug;
use marked_yaml::{Node, types::MarkedMappingNode};

use registrar_core::provenance::ProvenanceOrigin;

use crate::{
    error::{Diagnostic, ErrorCode},
    ingest::{Document, positioned},
};

/// Name of the context of the document root.
pub const ROOT_CONTEXT: &str = "root";

/// Allowed keys per structural context.
const CONTEXTS: &[(&str, &[&str])] = &[
    (
        ROOT_CONTEXT,
        &[
            "CodeGen",
            "Assemblies",
            "Namespaces",
            "NamedInstances",
            "SourcePath",
            "Provenance",
        ],
    ),
    (
        "CodeGen",
        &[
            "RegistryClassName",
            "GeneratedCodePath",
            "NamespaceName",
            "InitializerName",
            "Enums",
            "FailFast",
        ],
    ),
    ("Assemblies.item", &["Name", "Path"]),
    ("Namespaces.item", &["Name", "Interfaces", "Classes"]),
    ("Interfaces.item", &["Name"]),
    (
        "Classes.item",
        &["Name", "Interface", "Implements", "Parameters"],
    ),
    (
        "Parameters.item",
        &["Name", "Class", "Interface", "IsElementNullable"],
    ),
    (
        "NamedInstances.item",
        &["Name", "Class", "IsArray", "Assignments", "Elements"],
    ),
    ("Assignments.item", &["Parameter", "Value", "Instance"]),
    ("Elements.item", &["Value", "Instance"]),
    ("Provenance", &["Version", "Entries"]),
    (
        "Provenance.Entries.item",
        &["Origin", "Stage", "Tool", "Timestamp"],
    ),
    (
        "Provenance.Origin",
        &["SourcePath", "Line", "Column", "LogicalPath"],
    ),
];

/// How a key's value is entered when descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Descent {
    /// The value is a mapping validated in the child context.
    Mapping,
    /// The value is a sequence whose mapping items are validated in the child context.
    Sequence,
}

/// `(context, key) -> (child context, descent)`.
const CHILDREN: &[(&str, &str, &str, Descent)] = &[
    (ROOT_CONTEXT, "CodeGen", "CodeGen", Descent::Mapping),
    (ROOT_CONTEXT, "Assemblies", "Assemblies.item", Descent::Sequence),
    (ROOT_CONTEXT, "Namespaces", "Namespaces.item", Descent::Sequence),
    (
        ROOT_CONTEXT,
        "NamedInstances",
        "NamedInstances.item",
        Descent::Sequence,
    ),
    (ROOT_CONTEXT, "Provenance", "Provenance", Descent::Mapping),
    (
        "Namespaces.item",
        "Interfaces",
        "Interfaces.item",
        Descent::Sequence,
    ),
    ("Namespaces.item", "Classes", "Classes.item", Descent::Sequence),
    (
        "Classes.item",
        "Parameters",
        "Parameters.item",
        Descent::Sequence,
    ),
    (
        "NamedInstances.item",
        "Assignments",
        "Assignments.item",
        Descent::Sequence,
    ),
    (
        "NamedInstances.item",
        "Elements",
        "Elements.item",
        Descent::Sequence,
    ),
    (
        "Provenance",
        "Entries",
        "Provenance.Entries.item",
        Descent::Sequence,
    ),
    (
        "Provenance.Entries.item",
        "Origin",
        "Provenance.Origin",
        Descent::Mapping,
    ),
];

/// The keys legal in `context`, or `None` for an unknown context.
pub fn allowed_keys(context: &str) -> Option<&'static [&'static str]> {
    CONTEXTS
        .iter()
        .find(|(name, _)| *name == context)
        .map(|(_, keys)| *keys)
}

fn child_context(context: &str, key: &str) -> Option<(&'static str, Descent)> {
    CHILDREN
        .iter()
        .find(|(parent, k, _, _)| *parent == context && *k == key)
        .map(|(_, _, child, descent)| (*child, *descent))
}

/// Validate every key of the document against the schema table.
pub fn validate_document(document: &Document) -> Vec<Diagnostic> {
    let diagnostics = validate_keys(document.root(), ROOT_CONTEXT, &document.root_origin());
    debug!(count = diagnostics.len(); "Schema validation finished");
    diagnostics
}

/// Validate the keys of `mapping` in `context`, recursing into known
/// children.
///
/// `origin` is the origin of the mapping itself; each key is reported at
/// `origin.field(key)`, positioned at the key in the source.
pub fn validate_keys(
    mapping: &MarkedMappingNode,
    context: &str,
    origin: &ProvenanceOrigin,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let Some(allowed) = allowed_keys(context) else {
        return diagnostics;
    };

    for (key, value) in mapping.iter() {
        let name = key.as_str();
        let key_origin = positioned(origin.field(name), key.span());

        if !allowed.contains(&name) {
            diagnostics.push(unknown_key(name, context, allowed, key_origin));
            continue;
        }

        let Some((child, descent)) = child_context(context, name) else {
            continue;
        };
        match (descent, value) {
            (Descent::Mapping, Node::Mapping(inner)) => {
                diagnostics.extend(validate_keys(inner, child, &key_origin));
            }
            (Descent::Sequence, Node::Sequence(items)) => {
                for (index, item) in items.iter().enumerate() {
                    if let Node::Mapping(inner) = item {
                        let item_origin = positioned(key_origin.item(index), item.span());
                        diagnostics.extend(validate_keys(inner, child, &item_origin));
                    }
                }
            }
            // Wrong shapes are reported by extraction.
            _ => {}
        }
    }

    diagnostics
}

fn unknown_key(
    name: &str,
    context: &str,
    allowed: &[&str],
    location: ProvenanceOrigin,
) -> Diagnostic {
    match allowed.iter().find(|k| k.eq_ignore_ascii_case(name)) {
        Some(correct) => Diagnostic::warning(format!(
            "key `{name}` in `{context}` has the wrong casing"
        ))
        .with_code(ErrorCode::E101)
        .with_location(location)
        .with_help(format!("rename it to `{correct}`")),
        None => Diagnostic::warning(format!("unknown key `{name}` in `{context}`"))
            .with_code(ErrorCode::E100)
            .with_location(location)
            .with_help(format!("expected one of: {}", allowed.join(", "))),
    }
}
