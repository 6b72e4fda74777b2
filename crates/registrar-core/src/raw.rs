//! Raw registry description model.
//!
//! Raw DTOs mirror the YAML document literally: every field is optional and
//! no cross-reference is resolved. They are produced by the extraction step
//! from the generic YAML tree and consumed by the normalizer, which turns them
//! into the strict [`canonical`](crate::canonical) model.
//!
//! Each raw entity carries the provenance stack recorded when it was read.
//! A missing stack is legal (raw values may be built by hand) and makes the
//! normalizer inherit the parent's stack instead.

use crate::provenance::ProvenanceStack;

/// A literal value as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Any scalar, converted to its text form.
    Scalar(String),
    /// The YAML empty-sequence marker `[]`.
    EmptySequence,
}

/// Document root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfiguration {
    pub provenance: Option<ProvenanceStack>,
    pub source_path: Option<String>,
    pub code_gen: Option<RawCodeGen>,
    pub assemblies: Option<Vec<RawAssembly>>,
    pub namespaces: Option<Vec<RawNamespace>>,
    pub named_instances: Option<Vec<RawNamedInstance>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCodeGen {
    pub provenance: Option<ProvenanceStack>,
    pub registry_class_name: Option<String>,
    pub generated_code_path: Option<String>,
    pub namespace_name: Option<String>,
    pub initializer_name: Option<String>,
    pub enums: Option<Vec<String>>,
    pub fail_fast: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAssembly {
    pub provenance: Option<ProvenanceStack>,
    pub name: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNamespace {
    pub provenance: Option<ProvenanceStack>,
    pub name: Option<String>,
    pub interfaces: Option<Vec<RawInterface>>,
    pub classes: Option<Vec<RawClass>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInterface {
    pub provenance: Option<ProvenanceStack>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawClass {
    pub provenance: Option<ProvenanceStack>,
    pub name: Option<String>,
    /// Exposure interface, qualified or relative to the owning namespace.
    pub interface: Option<String>,
    pub implements: Option<Vec<String>>,
    pub parameters: Option<Vec<RawParameter>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParameter {
    pub provenance: Option<ProvenanceStack>,
    pub name: Option<String>,
    /// Class type token, e.g. `System.Int32[]?`.
    pub class: Option<String>,
    /// Interface type token.
    pub interface: Option<String>,
    pub is_element_nullable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNamedInstance {
    pub provenance: Option<ProvenanceStack>,
    pub name: Option<String>,
    /// Class type token; a `[]` suffix makes the instance array-shaped.
    pub class: Option<String>,
    pub is_array: Option<bool>,
    pub assignments: Option<Vec<RawAssignment>>,
    pub elements: Option<Vec<RawElement>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAssignment {
    pub provenance: Option<ProvenanceStack>,
    pub parameter: Option<String>,
    pub value: Option<RawValue>,
    pub instance: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawElement {
    pub provenance: Option<ProvenanceStack>,
    pub value: Option<RawValue>,
    pub instance: Option<String>,
}
