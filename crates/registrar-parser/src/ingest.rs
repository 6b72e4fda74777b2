//! Tree ingestor: YAML text to a positioned node tree.
//!
//! The document is parsed with `marked_yaml` into a [`Node`] tree in which
//! every key, scalar, sequence and mapping remembers where it starts in the
//! source. Later phases copy those positions into the origins they report.
//!
//! Syntax errors become a single E001 diagnostic carrying the parser's own
//! message and position; an empty document or a non-mapping root becomes
//! E002. In both cases no [`Document`] is returned and later phases are
//! skipped.

use log::{debug, info};
use marked_yaml::{LoadError, Marker, Node, Span, types::MarkedMappingNode};

use registrar_core::provenance::ProvenanceOrigin;

use crate::error::{Diagnostic, ErrorCode};

/// Root key that overrides the caller-supplied source path.
const SOURCE_PATH_KEY: &str = "SourcePath";

/// A successfully ingested registry description.
#[derive(Debug, Clone)]
pub struct Document {
    root: MarkedMappingNode,
    source_path: String,
}

impl Document {
    /// The root mapping of the document.
    pub fn root(&self) -> &MarkedMappingNode {
        &self.root
    }

    /// The effective source path: the root `SourcePath` value when present,
    /// otherwise the path supplied by the caller.
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Origin of the document root, used to derive every child origin.
    pub fn root_origin(&self) -> ProvenanceOrigin {
        ProvenanceOrigin::new(self.source_path.clone(), "")
    }
}

/// Parse `text` into a [`Document`].
///
/// Never panics: every failure is returned as a diagnostic.
///
/// # Example
///
/// ```
/// # use registrar_parser::ingest::ingest;
/// let (document, diagnostics) = ingest("CodeGen: {}\n", "registry.yaml");
/// assert!(document.is_some());
/// assert!(diagnostics.is_empty());
///
/// let (document, diagnostics) = ingest("- just\n- a list\n", "registry.yaml");
/// assert!(document.is_none());
/// assert_eq!(diagnostics.len(), 1);
/// ```
pub fn ingest(text: &str, source_path: &str) -> (Option<Document>, Vec<Diagnostic>) {
    info!(source_path, bytes = text.len(); "Ingesting registry description");

    if is_blank(text) {
        return (
            None,
            vec![missing_root(
                ProvenanceOrigin::new(source_path, ""),
                "the document is empty",
            )],
        );
    }

    let root = match marked_yaml::parse_yaml(0, text) {
        Ok(Node::Mapping(root)) => root,
        Ok(other) => {
            let origin = positioned(ProvenanceOrigin::new(source_path, ""), other.span());
            return (
                None,
                vec![missing_root(
                    origin,
                    &format!("the document root is {}, expected a mapping", describe(&other)),
                )],
            );
        }
        Err(LoadError::TopLevelMustBeMapping(marker)) => {
            let origin = at_marker(ProvenanceOrigin::new(source_path, ""), &marker);
            return (
                None,
                vec![missing_root(origin, "the document root is not a mapping")],
            );
        }
        Err(err) => {
            let mut origin = ProvenanceOrigin::new(source_path, "");
            if let LoadError::ScanError(marker, _) = &err {
                origin = at_marker(origin, marker);
            }
            debug!(err:% = err; "YAML syntax error");
            let diagnostic = Diagnostic::error(format!("invalid YAML: {err}"))
                .with_code(ErrorCode::E001)
                .with_location(origin);
            return (None, vec![diagnostic]);
        }
    };

    let source_path = match root.get_node(SOURCE_PATH_KEY).and_then(scalar_text) {
        Some(path) if !path.trim().is_empty() => path.to_string(),
        _ => source_path.to_string(),
    };
    debug!(source_path, keys = root.len(); "Document root ingested");

    (Some(Document { root, source_path }), Vec::new())
}

fn missing_root(origin: ProvenanceOrigin, message: &str) -> Diagnostic {
    Diagnostic::error(message)
        .with_code(ErrorCode::E002)
        .with_location(origin)
        .with_help("a registry description is a mapping with a `CodeGen` section")
}

/// Only whitespace, comments and document markers.
fn is_blank(text: &str) -> bool {
    text.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

/// Copy the start of `span` into `origin`, when the parser recorded one.
pub(crate) fn positioned(origin: ProvenanceOrigin, span: &Span) -> ProvenanceOrigin {
    match span.start() {
        Some(marker) => at_marker(origin, marker),
        None => origin,
    }
}

fn at_marker(origin: ProvenanceOrigin, marker: &Marker) -> ProvenanceOrigin {
    origin.with_position(marker.line(), Some(marker.column()))
}

/// The text of a scalar node, or `None` for a null scalar or a collection.
///
/// The plain scalars `~`, `null` and the empty value are null.
pub(crate) fn scalar_text(node: &Node) -> Option<&str> {
    let text = node.as_scalar()?.as_str();
    (!is_null(text)).then_some(text)
}

/// Returns `true` for a scalar YAML reads as null.
pub(crate) fn is_null_node(node: &Node) -> bool {
    node.as_scalar().is_some_and(|scalar| is_null(scalar.as_str()))
}

fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

/// The key and value stored under `key`, so both positions are available.
pub(crate) fn entry<'m>(
    mapping: &'m MarkedMappingNode,
    key: &str,
) -> Option<(&'m Span, &'m Node)> {
    mapping
        .iter()
        .find(|(k, _)| k.as_str() == key)
        .map(|(k, value)| (k.span(), value))
}

/// Short description of a node's shape, for messages.
pub(crate) fn describe(node: &Node) -> &'static str {
    match node {
        Node::Scalar(_) if is_null_node(node) => "null",
        Node::Scalar(_) => "a scalar",
        Node::Sequence(_) => "a sequence",
        Node::Mapping(_) => "a mapping",
    }
}
