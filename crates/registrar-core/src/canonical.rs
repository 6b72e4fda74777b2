//! Canonical registry model.
//!
//! Canonical values are produced by the normalizer from the [`raw`](crate::raw)
//! model. Required fields are always present, defaults are applied (absent
//! booleans are `false`, absent collections are empty), identifiers have been
//! shape-checked and every node carries a well-formed [`ProvenanceStack`].
//!
//! Cross-references (class of a named instance, parameter types, instance
//! references) are stored as qualified-name keys and resolved through lookup
//! tables, never as pointers into the graph.

use serde::Serialize;

use crate::{
    builtin_types::BuiltinType,
    identifier::{qualify, split_qualified},
    provenance::ProvenanceStack,
};

// =============================================================================
// Literals
// =============================================================================

/// Primitive kind inferred from a literal's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LiteralKind {
    Integer,
    Float,
    Boolean,
    Text,
    /// The YAML empty-sequence marker.
    EmptyArray,
}

/// A literal value with its inferred kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Literal {
    text: String,
    kind: LiteralKind,
}

impl Literal {
    /// Build a literal from scalar text, inferring its kind.
    ///
    /// ```
    /// # use registrar_core::canonical::{Literal, LiteralKind};
    /// assert_eq!(Literal::infer("5").kind(), LiteralKind::Integer);
    /// assert_eq!(Literal::infer("5.5").kind(), LiteralKind::Float);
    /// assert_eq!(Literal::infer("true").kind(), LiteralKind::Boolean);
    /// assert_eq!(Literal::infer("five").kind(), LiteralKind::Text);
    /// ```
    pub fn infer(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = infer_kind(&text);
        Self { text, kind }
    }

    /// The empty-array literal.
    pub fn empty_array() -> Self {
        Self {
            text: "[]".to_string(),
            kind: LiteralKind::EmptyArray,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> LiteralKind {
        self.kind
    }
}

fn infer_kind(text: &str) -> LiteralKind {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        return LiteralKind::Boolean;
    }

    let numeric_chars = !trimmed.is_empty()
        && trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if numeric_chars {
        // Digits only are an integer however large; range is checked against the target.
        let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
        if digits.chars().all(|c| c.is_ascii_digit()) {
            return LiteralKind::Integer;
        }
        if trimmed.parse::<f64>().is_ok() {
            return LiteralKind::Float;
        }
    }
    LiteralKind::Text
}

/// Where a value comes from: a literal, another named instance, or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValueSource {
    Literal(Literal),
    /// Name of the referenced named instance.
    Reference(String),
    /// Explicit null; only valid for nullable targets.
    Null,
}

impl ValueSource {
    pub fn literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn named_instance_ref(&self) -> Option<&str> {
        match self {
            Self::Reference(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

// =============================================================================
// Configuration root
// =============================================================================

/// A fully normalized registry description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    provenance: ProvenanceStack,
    source_path: String,
    code_gen: CodeGen,
    assemblies: Vec<Assembly>,
    namespaces: Vec<Namespace>,
    named_instances: Vec<NamedInstance>,
}

impl Configuration {
    pub fn new(
        provenance: ProvenanceStack,
        source_path: impl Into<String>,
        code_gen: CodeGen,
        assemblies: Vec<Assembly>,
        namespaces: Vec<Namespace>,
        named_instances: Vec<NamedInstance>,
    ) -> Self {
        Self {
            provenance,
            source_path: source_path.into(),
            code_gen,
            assemblies,
            namespaces,
            named_instances,
        }
    }

    pub fn provenance(&self) -> &ProvenanceStack {
        &self.provenance
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn code_gen(&self) -> &CodeGen {
        &self.code_gen
    }

    pub fn assemblies(&self) -> &[Assembly] {
        &self.assemblies
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn named_instances(&self) -> &[NamedInstance] {
        &self.named_instances
    }

    /// Iterate over every class of every namespace, in declaration order.
    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.namespaces.iter().flat_map(|ns| ns.classes())
    }

    /// Iterate over every interface of every namespace, in declaration order.
    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.namespaces.iter().flat_map(|ns| ns.interfaces())
    }
}

/// Code generation settings shared by every generated class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeGen {
    provenance: ProvenanceStack,
    registry_class_name: String,
    generated_code_path: String,
    namespace_name: String,
    initializer_name: String,
    enums: Vec<String>,
    fail_fast: bool,
}

impl CodeGen {
    pub fn new(
        provenance: ProvenanceStack,
        registry_class_name: impl Into<String>,
        generated_code_path: impl Into<String>,
        namespace_name: impl Into<String>,
        initializer_name: impl Into<String>,
        enums: Vec<String>,
        fail_fast: bool,
    ) -> Self {
        Self {
            provenance,
            registry_class_name: registry_class_name.into(),
            generated_code_path: generated_code_path.into(),
            namespace_name: namespace_name.into(),
            initializer_name: initializer_name.into(),
            enums,
            fail_fast,
        }
    }

    pub fn provenance(&self) -> &ProvenanceStack {
        &self.provenance
    }

    pub fn registry_class_name(&self) -> &str {
        &self.registry_class_name
    }

    pub fn generated_code_path(&self) -> &str {
        &self.generated_code_path
    }

    pub fn namespace_name(&self) -> &str {
        &self.namespace_name
    }

    /// Name of the initializer method every generated class exposes.
    pub fn initializer_name(&self) -> &str {
        &self.initializer_name
    }

    /// Qualified names of enum types whose literals render as `Enum.Member`.
    pub fn enums(&self) -> &[String] {
        &self.enums
    }

    pub fn is_enum(&self, qualified_name: &str) -> bool {
        self.enums.iter().any(|e| e == qualified_name)
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assembly {
    provenance: ProvenanceStack,
    name: String,
    path: Option<String>,
}

impl Assembly {
    pub fn new(provenance: ProvenanceStack, name: impl Into<String>, path: Option<String>) -> Self {
        Self {
            provenance,
            name: name.into(),
            path,
        }
    }

    pub fn provenance(&self) -> &ProvenanceStack {
        &self.provenance
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Namespace {
    provenance: ProvenanceStack,
    name: String,
    interfaces: Vec<Interface>,
    classes: Vec<Class>,
}

impl Namespace {
    pub fn new(
        provenance: ProvenanceStack,
        name: impl Into<String>,
        interfaces: Vec<Interface>,
        classes: Vec<Class>,
    ) -> Self {
        Self {
            provenance,
            name: name.into(),
            interfaces,
            classes,
        }
    }

    pub fn provenance(&self) -> &ProvenanceStack {
        &self.provenance
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interface {
    provenance: ProvenanceStack,
    namespace: String,
    interface_name: String,
}

impl Interface {
    pub fn new(
        provenance: ProvenanceStack,
        namespace: impl Into<String>,
        interface_name: impl Into<String>,
    ) -> Self {
        Self {
            provenance,
            namespace: namespace.into(),
            interface_name: interface_name.into(),
        }
    }

    pub fn provenance(&self) -> &ProvenanceStack {
        &self.provenance
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.interface_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Class {
    provenance: ProvenanceStack,
    namespace: String,
    class_name: String,
    interface_qualified: Option<String>,
    implements: Vec<String>,
    parameters: Vec<Parameter>,
}

impl Class {
    pub fn new(
        provenance: ProvenanceStack,
        namespace: impl Into<String>,
        class_name: impl Into<String>,
        interface_qualified: Option<String>,
        implements: Vec<String>,
        parameters: Vec<Parameter>,
    ) -> Self {
        Self {
            provenance,
            namespace: namespace.into(),
            class_name: class_name.into(),
            interface_qualified,
            implements,
            parameters,
        }
    }

    /// Synthesize a parameterless class for a builtin type.
    pub fn for_builtin(builtin: BuiltinType, provenance: ProvenanceStack) -> Self {
        let (namespace, class_name) = split_qualified(builtin.qualified_name());
        Self::new(provenance, namespace, class_name, None, Vec::new(), Vec::new())
    }

    pub fn provenance(&self) -> &ProvenanceStack {
        &self.provenance
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.class_name)
    }

    /// The exposure interface, fully qualified.
    pub fn interface_qualified(&self) -> Option<&str> {
        self.interface_qualified.as_deref()
    }

    /// Qualified names of the interfaces this class implements.
    pub fn implements(&self) -> &[String] {
        &self.implements
    }

    pub fn implements_interface(&self, qualified_name: &str) -> bool {
        self.implements.iter().any(|i| i == qualified_name)
    }

    /// Initializer parameters in declaration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Look up a parameter by name. The first declaration wins.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.parameter_name() == name)
    }

    /// The builtin type this class stands for, if any.
    pub fn builtin(&self) -> Option<BuiltinType> {
        BuiltinType::from_name(&self.qualified_name())
    }
}

/// The declared type of a parameter: a class or an interface, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParameterType {
    Class(String),
    Interface(String),
}

impl ParameterType {
    /// The base type name, without array or nullable markers.
    pub fn name(&self) -> &str {
        match self {
            Self::Class(name) | Self::Interface(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    provenance: ProvenanceStack,
    namespace: String,
    class_name: String,
    parameter_name: String,
    parameter_type: ParameterType,
    is_array: bool,
    is_nullable: bool,
    is_element_nullable: bool,
}

impl Parameter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provenance: ProvenanceStack,
        namespace: impl Into<String>,
        class_name: impl Into<String>,
        parameter_name: impl Into<String>,
        parameter_type: ParameterType,
        is_array: bool,
        is_nullable: bool,
        is_element_nullable: bool,
    ) -> Self {
        Self {
            provenance,
            namespace: namespace.into(),
            class_name: class_name.into(),
            parameter_name: parameter_name.into(),
            parameter_type,
            is_array,
            is_nullable,
            is_element_nullable,
        }
    }

    pub fn provenance(&self) -> &ProvenanceStack {
        &self.provenance
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    pub fn parameter_type(&self) -> &ParameterType {
        &self.parameter_type
    }

    pub fn class_ref(&self) -> Option<&str> {
        match &self.parameter_type {
            ParameterType::Class(name) => Some(name),
            ParameterType::Interface(_) => None,
        }
    }

    pub fn interface_ref(&self) -> Option<&str> {
        match &self.parameter_type {
            ParameterType::Interface(name) => Some(name),
            ParameterType::Class(_) => None,
        }
    }

    /// Base type name of the declared type.
    pub fn type_name(&self) -> &str {
        self.parameter_type.name()
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    pub fn is_element_nullable(&self) -> bool {
        self.is_element_nullable
    }

    /// Qualified name of the owning class.
    pub fn qualified_class_name(&self) -> String {
        qualify(&self.namespace, &self.class_name)
    }

    /// Key used in the parameter lookup table: `Ns.Class.parameter`.
    pub fn lookup_key(&self) -> String {
        format!("{}.{}", self.qualified_class_name(), self.parameter_name)
    }

    /// The declared type as written in source form, e.g. `System.Int32[]`.
    pub fn declared_type(&self) -> String {
        let mut declared = self.type_name().to_string();
        if self.is_array {
            declared.push_str("[]");
        }
        declared
    }

    /// The builtin type of the declared base type, if any.
    pub fn builtin(&self) -> Option<BuiltinType> {
        BuiltinType::from_name(self.type_name())
    }
}

// =============================================================================
// Named instances
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedInstance {
    provenance: ProvenanceStack,
    name: String,
    class: Class,
    class_token: String,
    is_array: bool,
    assignments: Vec<Assignment>,
    elements: Vec<Element>,
}

impl NamedInstance {
    pub fn new(
        provenance: ProvenanceStack,
        name: impl Into<String>,
        class: Class,
        class_token: impl Into<String>,
        is_array: bool,
        assignments: Vec<Assignment>,
        elements: Vec<Element>,
    ) -> Self {
        Self {
            provenance,
            name: name.into(),
            class,
            class_token: class_token.into(),
            is_array,
            assignments,
            elements,
        }
    }

    pub fn provenance(&self) -> &ProvenanceStack {
        &self.provenance
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    /// The class token exactly as written in the document.
    pub fn class_token(&self) -> &str {
        &self.class_token
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Qualified class name with a `[]` suffix when array-shaped.
    pub fn qualified_class_name(&self) -> String {
        let mut name = self.class.qualified_name();
        if self.is_array {
            name.push_str("[]");
        }
        name
    }

    /// Replace the assignments, keeping everything else.
    pub fn with_assignments(mut self, assignments: Vec<Assignment>) -> Self {
        self.assignments = assignments;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    provenance: ProvenanceStack,
    parameter_name: String,
    value: ValueSource,
    resolved_parameter: Parameter,
    initializer_expression: Option<String>,
}

impl Assignment {
    pub fn new(
        provenance: ProvenanceStack,
        parameter_name: impl Into<String>,
        value: ValueSource,
        resolved_parameter: Parameter,
    ) -> Self {
        Self {
            provenance,
            parameter_name: parameter_name.into(),
            value,
            resolved_parameter,
            initializer_expression: None,
        }
    }

    pub fn provenance(&self) -> &ProvenanceStack {
        &self.provenance
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    pub fn value(&self) -> &ValueSource {
        &self.value
    }

    pub fn literal(&self) -> Option<&Literal> {
        self.value.literal()
    }

    pub fn named_instance_ref(&self) -> Option<&str> {
        self.value.named_instance_ref()
    }

    pub fn resolved_parameter(&self) -> &Parameter {
        &self.resolved_parameter
    }

    /// The rendered initializer argument, filled in by token derivation.
    pub fn initializer_expression(&self) -> Option<&str> {
        self.initializer_expression.as_deref()
    }

    pub fn with_initializer_expression(mut self, expression: impl Into<String>) -> Self {
        self.initializer_expression = Some(expression.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    provenance: ProvenanceStack,
    value: ValueSource,
}

impl Element {
    pub fn new(provenance: ProvenanceStack, value: ValueSource) -> Self {
        Self { provenance, value }
    }

    pub fn provenance(&self) -> &ProvenanceStack {
        &self.provenance
    }

    pub fn value(&self) -> &ValueSource {
        &self.value
    }

    pub fn literal(&self) -> Option<&Literal> {
        self.value.literal()
    }

    pub fn named_instance_ref(&self) -> Option<&str> {
        self.value.named_instance_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_kind_inference() {
        assert_eq!(Literal::infer("5").kind(), LiteralKind::Integer);
        assert_eq!(Literal::infer("-12").kind(), LiteralKind::Integer);
        assert_eq!(Literal::infer("5.5").kind(), LiteralKind::Float);
        assert_eq!(Literal::infer("1e3").kind(), LiteralKind::Float);
        assert_eq!(
            Literal::infer("1000000000000000000000000000000000000000000").kind(),
            LiteralKind::Integer
        );
        assert_eq!(Literal::infer("-1").kind(), LiteralKind::Integer);
        assert_eq!(Literal::infer("--1").kind(), LiteralKind::Text);
        assert_eq!(Literal::infer("FALSE").kind(), LiteralKind::Boolean);
        assert_eq!(Literal::infer("inf").kind(), LiteralKind::Text);
        assert_eq!(Literal::infer("1.2.3").kind(), LiteralKind::Text);
        assert_eq!(Literal::infer("").kind(), LiteralKind::Text);
        assert_eq!(Literal::empty_array().kind(), LiteralKind::EmptyArray);
    }

    #[test]
    fn test_value_source_accessors() {
        let literal = ValueSource::Literal(Literal::infer("5"));
        assert_eq!(literal.literal().map(Literal::text), Some("5"));
        assert!(literal.named_instance_ref().is_none());

        let reference = ValueSource::Reference("Other".to_string());
        assert_eq!(reference.named_instance_ref(), Some("Other"));
        assert!(ValueSource::Null.is_null());
    }

    #[test]
    fn test_builtin_class() {
        let class = Class::for_builtin(BuiltinType::Int32, ProvenanceStack::new());
        assert_eq!(class.namespace(), "System");
        assert_eq!(class.class_name(), "Int32");
        assert_eq!(class.builtin(), Some(BuiltinType::Int32));
        assert!(class.parameters().is_empty());
    }

    #[test]
    fn test_parameter_keys() {
        let parameter = Parameter::new(
            ProvenanceStack::new(),
            "Ns",
            "Foo",
            "count",
            ParameterType::Class("System.Int32".to_string()),
            true,
            false,
            false,
        );
        assert_eq!(parameter.lookup_key(), "Ns.Foo.count");
        assert_eq!(parameter.declared_type(), "System.Int32[]");
        assert_eq!(parameter.class_ref(), Some("System.Int32"));
        assert_eq!(parameter.interface_ref(), None);
        assert_eq!(parameter.builtin(), Some(BuiltinType::Int32));
    }
}
