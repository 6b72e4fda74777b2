//! Extraction: generic YAML tree to the raw model.
//!
//! The reader is permissive. Only known keys are read, scalars are coerced
//! to text, and a value of the wrong shape is reported as an E102 warning and
//! treated as absent. Every raw node receives a parser-stage provenance entry
//! whose origin is the node's logical path in the document.
//!
//! A root `Provenance` block, when present and well formed, seeds every stack
//! with the upstream stages it records.

use chrono::{DateTime, Utc};
use log::{debug, info};
use marked_yaml::{Node, types::MarkedMappingNode};

use registrar_core::{
    provenance::{
        PROVENANCE_VERSION, ProvenanceEntry, ProvenanceOrigin, ProvenanceStack, ProvenanceStage,
    },
    raw::{
        RawAssembly, RawAssignment, RawClass, RawCodeGen, RawConfiguration, RawElement,
        RawInterface, RawNamedInstance, RawNamespace, RawParameter, RawValue,
    },
};

use crate::{
    error::{Diagnostic, ErrorCode},
    ingest::{Document, describe, entry, is_null_node, positioned, scalar_text},
    normalize::NormalizeContext,
};

/// Logical path of the document root.
pub const ROOT_PATH: &str = "$";

/// Extract the raw model from an ingested document.
///
/// Returns the raw configuration and the E102/E103 warnings raised while
/// reading it.
pub fn extract(document: &Document, cx: &NormalizeContext) -> (RawConfiguration, Vec<Diagnostic>) {
    info!(source_path = document.source_path(); "Extracting raw model");

    let mut extractor = Extractor::new(document, cx);
    let raw = extractor.configuration(document.root());

    debug!(warnings = extractor.diagnostics.len(); "Raw model extracted");
    (raw, extractor.diagnostics)
}

struct Extractor<'a> {
    cx: &'a NormalizeContext,
    source_path: String,
    seed: ProvenanceStack,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Extractor<'a> {
    fn new(document: &Document, cx: &'a NormalizeContext) -> Self {
        Self {
            cx,
            source_path: document.source_path().to_string(),
            seed: ProvenanceStack::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Parser-stage stack for the node at `origin`.
    fn stack(&self, origin: &ProvenanceOrigin) -> ProvenanceStack {
        self.seed.extended(ProvenanceEntry::new(
            origin.clone(),
            ProvenanceStage::Parser,
            self.cx.tool_id(),
            self.cx.timestamp(),
        ))
    }

    fn wrong_shape(&mut self, origin: &ProvenanceOrigin, expected: &str, found: &Node) {
        self.diagnostics.push(
            Diagnostic::warning(format!(
                "expected {expected} at `{}`, found {}",
                origin.logical_path(),
                describe(found)
            ))
            .with_code(ErrorCode::E102)
            .with_location(origin.clone())
            .with_help("the value is ignored"),
        );
    }

    fn configuration(&mut self, root: &MarkedMappingNode) -> RawConfiguration {
        let doc = ProvenanceOrigin::new(self.source_path.clone(), "");

        if let Some((key, value)) = entry(root, "Provenance") {
            let origin = positioned(doc.field("Provenance"), key);
            match read_provenance(value) {
                Ok(seed) => self.seed = seed,
                Err(reason) => self.diagnostics.push(
                    Diagnostic::warning(format!("malformed provenance block: {reason}"))
                        .with_code(ErrorCode::E103)
                        .with_location(origin)
                        .with_help("upstream provenance is ignored for this document"),
                ),
            }
        }

        let root_origin = positioned(
            ProvenanceOrigin::new(self.source_path.clone(), ROOT_PATH),
            root.span(),
        );
        RawConfiguration {
            provenance: Some(self.stack(&root_origin)),
            source_path: Some(self.source_path.clone()),
            code_gen: self
                .mapping(root, "CodeGen", &doc)
                .map(|(m, origin)| self.code_gen(m, &origin)),
            assemblies: self.items(root, "Assemblies", &doc, Self::assembly),
            namespaces: self.items(root, "Namespaces", &doc, Self::namespace),
            named_instances: self.items(root, "NamedInstances", &doc, Self::named_instance),
        }
    }

    fn code_gen(&mut self, m: &MarkedMappingNode, origin: &ProvenanceOrigin) -> RawCodeGen {
        RawCodeGen {
            provenance: Some(self.stack(origin)),
            registry_class_name: self.scalar(m, "RegistryClassName", origin),
            generated_code_path: self.scalar(m, "GeneratedCodePath", origin),
            namespace_name: self.scalar(m, "NamespaceName", origin),
            initializer_name: self.scalar(m, "InitializerName", origin),
            enums: self.scalars(m, "Enums", origin),
            fail_fast: self.flag(m, "FailFast", origin),
        }
    }

    fn assembly(&mut self, m: &MarkedMappingNode, origin: &ProvenanceOrigin) -> RawAssembly {
        RawAssembly {
            provenance: Some(self.stack(origin)),
            name: self.scalar(m, "Name", origin),
            path: self.scalar(m, "Path", origin),
        }
    }

    fn namespace(&mut self, m: &MarkedMappingNode, origin: &ProvenanceOrigin) -> RawNamespace {
        RawNamespace {
            provenance: Some(self.stack(origin)),
            name: self.scalar(m, "Name", origin),
            interfaces: self.items(m, "Interfaces", origin, Self::interface),
            classes: self.items(m, "Classes", origin, Self::class),
        }
    }

    fn interface(&mut self, m: &MarkedMappingNode, origin: &ProvenanceOrigin) -> RawInterface {
        RawInterface {
            provenance: Some(self.stack(origin)),
            name: self.scalar(m, "Name", origin),
        }
    }

    fn class(&mut self, m: &MarkedMappingNode, origin: &ProvenanceOrigin) -> RawClass {
        RawClass {
            provenance: Some(self.stack(origin)),
            name: self.scalar(m, "Name", origin),
            interface: self.scalar(m, "Interface", origin),
            implements: self.scalars(m, "Implements", origin),
            parameters: self.items(m, "Parameters", origin, Self::parameter),
        }
    }

    fn parameter(&mut self, m: &MarkedMappingNode, origin: &ProvenanceOrigin) -> RawParameter {
        RawParameter {
            provenance: Some(self.stack(origin)),
            name: self.scalar(m, "Name", origin),
            class: self.scalar(m, "Class", origin),
            interface: self.scalar(m, "Interface", origin),
            is_element_nullable: self.flag(m, "IsElementNullable", origin),
        }
    }

    fn named_instance(
        &mut self,
        m: &MarkedMappingNode,
        origin: &ProvenanceOrigin,
    ) -> RawNamedInstance {
        RawNamedInstance {
            provenance: Some(self.stack(origin)),
            name: self.scalar(m, "Name", origin),
            class: self.scalar(m, "Class", origin),
            is_array: self.flag(m, "IsArray", origin),
            assignments: self.items(m, "Assignments", origin, Self::assignment),
            elements: self.items(m, "Elements", origin, Self::element),
        }
    }

    fn assignment(&mut self, m: &MarkedMappingNode, origin: &ProvenanceOrigin) -> RawAssignment {
        RawAssignment {
            provenance: Some(self.stack(origin)),
            parameter: self.scalar(m, "Parameter", origin),
            value: self.value(m, "Value", origin),
            instance: self.scalar(m, "Instance", origin),
        }
    }

    fn element(&mut self, m: &MarkedMappingNode, origin: &ProvenanceOrigin) -> RawElement {
        RawElement {
            provenance: Some(self.stack(origin)),
            value: self.value(m, "Value", origin),
            instance: self.scalar(m, "Instance", origin),
        }
    }

    // -------------------------------------------------------------------------
    // Field readers
    // -------------------------------------------------------------------------

    /// The value under `key` and the origin of its key.
    fn field<'m>(
        &self,
        m: &'m MarkedMappingNode,
        key: &str,
        parent: &ProvenanceOrigin,
    ) -> Option<(&'m Node, ProvenanceOrigin)> {
        let (key_span, value) = entry(m, key)?;
        Some((value, positioned(parent.field(key), key_span)))
    }

    /// A scalar field as text. `null` reads as absent.
    fn scalar(
        &mut self,
        m: &MarkedMappingNode,
        key: &str,
        parent: &ProvenanceOrigin,
    ) -> Option<String> {
        let (value, origin) = self.field(m, key, parent)?;
        let text = scalar_text(value).map(str::to_string);
        if text.is_none() && !is_null_node(value) {
            self.wrong_shape(&origin, "a scalar", value);
        }
        text
    }

    /// A boolean field. `true`/`false` are accepted in any case.
    fn flag(&mut self, m: &MarkedMappingNode, key: &str, parent: &ProvenanceOrigin) -> Option<bool> {
        let (value, origin) = self.field(m, key, parent)?;
        if is_null_node(value) {
            return None;
        }
        match scalar_text(value) {
            Some(text) if text.eq_ignore_ascii_case("true") => Some(true),
            Some(text) if text.eq_ignore_ascii_case("false") => Some(false),
            _ => {
                self.wrong_shape(&origin, "a boolean", value);
                None
            }
        }
    }

    /// A literal value: a scalar or the empty sequence `[]`.
    fn value(
        &mut self,
        m: &MarkedMappingNode,
        key: &str,
        parent: &ProvenanceOrigin,
    ) -> Option<RawValue> {
        let (value, origin) = self.field(m, key, parent)?;
        match value {
            Node::Sequence(items) if items.is_empty() => Some(RawValue::EmptySequence),
            _ if is_null_node(value) => None,
            _ => match scalar_text(value) {
                Some(text) => Some(RawValue::Scalar(text.to_string())),
                None => {
                    self.wrong_shape(&origin, "a scalar or `[]`", value);
                    None
                }
            },
        }
    }

    /// A sequence of scalars, such as `Implements` or `Enums`.
    fn scalars(
        &mut self,
        m: &MarkedMappingNode,
        key: &str,
        parent: &ProvenanceOrigin,
    ) -> Option<Vec<String>> {
        let (value, origin) = self.field(m, key, parent)?;
        match value {
            Node::Sequence(items) => {
                let mut texts = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match scalar_text(item) {
                        Some(text) => texts.push(text.to_string()),
                        None => {
                            let item_origin = positioned(origin.item(index), item.span());
                            self.wrong_shape(&item_origin, "a scalar", item);
                        }
                    }
                }
                Some(texts)
            }
            _ if is_null_node(value) => None,
            other => {
                self.wrong_shape(&origin, "a sequence", other);
                None
            }
        }
    }

    /// A nested mapping field, with its origin.
    fn mapping<'m>(
        &mut self,
        m: &'m MarkedMappingNode,
        key: &str,
        parent: &ProvenanceOrigin,
    ) -> Option<(&'m MarkedMappingNode, ProvenanceOrigin)> {
        let (value, origin) = self.field(m, key, parent)?;
        match value {
            Node::Mapping(inner) => Some((inner, origin)),
            _ if is_null_node(value) => None,
            other => {
                self.wrong_shape(&origin, "a mapping", other);
                None
            }
        }
    }

    /// A sequence of mappings, each read with `read` at the item's position.
    fn items<T>(
        &mut self,
        m: &MarkedMappingNode,
        key: &str,
        parent: &ProvenanceOrigin,
        read: fn(&mut Self, &MarkedMappingNode, &ProvenanceOrigin) -> T,
    ) -> Option<Vec<T>> {
        let (value, origin) = self.field(m, key, parent)?;
        match value {
            Node::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_origin = positioned(origin.item(index), item.span());
                    match item {
                        Node::Mapping(inner) => out.push(read(self, inner, &item_origin)),
                        other => self.wrong_shape(&item_origin, "a mapping", other),
                    }
                }
                Some(out)
            }
            _ if is_null_node(value) => None,
            other => {
                self.wrong_shape(&origin, "a sequence", other);
                None
            }
        }
    }
}

/// Read a root `Provenance` block into a seed stack.
fn read_provenance(value: &Node) -> Result<ProvenanceStack, String> {
    let Node::Mapping(block) = value else {
        return Err(format!("expected a mapping, found {}", describe(value)));
    };

    let version = match block.get_node("Version").and_then(scalar_text) {
        None => PROVENANCE_VERSION,
        Some(text) => text
            .parse::<u32>()
            .map_err(|_| "`Version` must be a non-negative integer".to_string())?,
    };

    let Some(Node::Sequence(entries)) = block.get_node("Entries") else {
        return Err("`Entries` must be a sequence".to_string());
    };

    let mut stack = ProvenanceStack::with_version(version);
    for (index, entry) in entries.iter().enumerate() {
        let entry = read_entry(entry).map_err(|reason| format!("entry {index}: {reason}"))?;
        stack.push(entry);
    }
    Ok(stack)
}

fn read_entry(value: &Node) -> Result<ProvenanceEntry, String> {
    let Node::Mapping(entry) = value else {
        return Err(format!("expected a mapping, found {}", describe(value)));
    };

    let Some(Node::Mapping(origin)) = entry.get_node("Origin") else {
        return Err("`Origin` must be a mapping".to_string());
    };
    let source_path = required_text(origin, "SourcePath")?;
    let logical_path = required_text(origin, "LogicalPath")?;
    let line = match origin.get_node("Line").and_then(scalar_text) {
        None => 0,
        Some(text) => text
            .parse::<usize>()
            .map_err(|_| "`Line` must be a non-negative integer".to_string())?,
    };
    let column = match origin.get_node("Column").and_then(scalar_text) {
        None => None,
        Some(text) => Some(
            text.parse::<usize>()
                .map_err(|_| "`Column` must be a non-negative integer".to_string())?,
        ),
    };

    let stage = ProvenanceStage::from_name(&required_text(entry, "Stage")?);
    let tool = required_text(entry, "Tool")?;
    let timestamp = required_text(entry, "Timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|err| format!("`Timestamp` is not an RFC 3339 date: {err}"))?
        .with_timezone(&Utc);

    Ok(ProvenanceEntry::new(
        ProvenanceOrigin::new(source_path, logical_path).with_position(line, column),
        stage,
        tool,
        timestamp,
    ))
}

fn required_text(m: &MarkedMappingNode, key: &str) -> Result<String, String> {
    m.get_node(key)
        .and_then(scalar_text)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("`{key}` is required"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::ingest::ingest;

    fn context() -> NormalizeContext {
        NormalizeContext::new("registrar", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn extract_text(text: &str) -> (RawConfiguration, Vec<Diagnostic>) {
        let (document, diagnostics) = ingest(text, "a.yaml");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        extract(&document.unwrap(), &context())
    }

    #[test]
    fn test_extract_named_instance() {
        let (raw, diagnostics) = extract_text(
            r#"
NamedInstances:
  - Name: MyFoo
    Class: Ns.Foo
    Assignments:
      - Parameter: count
        Value: 5
      - Parameter: items
        Value: []
      - Parameter: other
        Instance: Other
"#,
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");

        let instances = raw.named_instances.unwrap();
        let instance = &instances[0];
        assert_eq!(instance.name.as_deref(), Some("MyFoo"));
        assert_eq!(instance.is_array, None);

        let assignments = instance.assignments.as_ref().unwrap();
        assert_eq!(assignments[0].value, Some(RawValue::Scalar("5".to_string())));
        assert_eq!(assignments[1].value, Some(RawValue::EmptySequence));
        assert_eq!(assignments[2].instance.as_deref(), Some("Other"));

        let origin = assignments[1].provenance.as_ref().unwrap().origin().unwrap();
        assert_eq!(origin.logical_path(), "NamedInstances[0].Assignments[1]");
        assert_eq!(origin.line(), 8);
        assert_eq!(
            assignments[1].provenance.as_ref().unwrap().latest().unwrap().stage(),
            &ProvenanceStage::Parser
        );
    }

    #[test]
    fn test_wrong_shapes_are_warnings_and_absent() {
        let (raw, diagnostics) = extract_text(
            r#"
CodeGen: [not, a, mapping]
Namespaces:
  - Name: Ns
    Classes: nope
  - just a string
"#,
        );

        assert!(raw.code_gen.is_none());
        let namespaces = raw.namespaces.unwrap();
        assert_eq!(namespaces.len(), 1);
        assert!(namespaces[0].classes.is_none());

        let paths: Vec<_> = diagnostics
            .iter()
            .map(|d| {
                assert_eq!(d.code(), Some(ErrorCode::E102));
                assert!(d.severity().is_warning());
                d.location().unwrap().logical_path().to_string()
            })
            .collect();
        assert_eq!(paths, ["CodeGen", "Namespaces[0].Classes", "Namespaces[1]"]);

        let lines: Vec<_> = diagnostics
            .iter()
            .map(|d| d.location().unwrap().line())
            .collect();
        assert_eq!(lines, [2, 5, 6]);
    }

    #[test]
    fn test_flags_accept_strings() {
        let (raw, diagnostics) = extract_text(
            "NamedInstances:\n  - Name: A\n    IsArray: \"TRUE\"\n  - Name: B\n    IsArray: 3\n",
        );

        let instances = raw.named_instances.unwrap();
        assert_eq!(instances[0].is_array, Some(true));
        assert_eq!(instances[1].is_array, None);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_root_provenance_seeds_stacks() {
        let (raw, diagnostics) = extract_text(
            r#"
Provenance:
  Version: 1
  Entries:
    - Origin: { SourcePath: model.xml, Line: 4, Column: 2, LogicalPath: "/registry" }
      Stage: importer
      Tool: xml2yaml
      Timestamp: "2023-06-01T10:00:00Z"
CodeGen:
  RegistryClassName: Registry
"#,
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");

        let stack = raw.code_gen.unwrap().provenance.unwrap();
        assert_eq!(stack.entries().len(), 2);
        assert_eq!(
            stack.entries()[0].stage(),
            &ProvenanceStage::External("importer".to_string())
        );
        assert_eq!(stack.entries()[0].origin().line(), 4);
        assert_eq!(stack.origin().unwrap().logical_path(), "CodeGen");
    }

    #[test]
    fn test_malformed_root_provenance() {
        let (raw, diagnostics) = extract_text(
            "Provenance:\n  Entries:\n    - Stage: importer\nCodeGen: {}\n",
        );

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E103));
        assert_eq!(raw.code_gen.unwrap().provenance.unwrap().entries().len(), 1);
    }
}
