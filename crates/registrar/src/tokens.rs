//! Token derivation.
//!
//! Turns each resolved named instance into a flat map of named values that a
//! template renderer substitutes into registry and accessor source files.
//! Expressions are symbolic: references read other instances through the
//! registry's internal accessors, so derivation never evaluates anything and
//! reference cycles need no special handling.
//!
//! # Instance tokens
//!
//! | token | kind | example |
//! |-------|------|---------|
//! | `Name` | text | `MyFoo` |
//! | `QualifiedClassName` | text | `Ns.Foo`, `Ns.Foo[]` |
//! | `ElementTypeName` | text | `Ns.Foo` |
//! | `BackingFieldName` | text | `_MyFooInstance` |
//! | `AccessorName` | text | `MyFoo` |
//! | `InternalAccessorName` | text | `MyFooInternal` |
//! | `ExternalReturnType` | text | exposure interface, else the concrete type |
//! | `InternalReturnType` | text | concrete type |
//! | `HasExposureInterface` | flag | |
//! | `IsArray` | flag | |
//! | `InitializerName` | text | `Initialize` |
//! | `RegistryClassName` | text | `Registry` |
//! | `InitializationExpression` | text | `new Ns.Foo()` |
//! | `HasAssignments` | flag | |
//! | `HasElements` | flag | |
//! | `InitializerArguments` | text | `count: 5, label: "a"` |
//! | `InitializerCall` | text | `_MyFooInstance.Initialize(count: 5)` |
//! | `Assignments` | list | `ParameterName`, `ParameterType`, `Expression`, `IsNull` |
//! | `Elements` | list | `Index`, `Expression` |

mod context;
pub mod literal;

use indexmap::IndexMap;
use log::{debug, info, trace};
use serde::Serialize;

use registrar_core::{
    canonical::{Assignment, Element, LiteralKind, NamedInstance, Parameter, ValueSource},
    provenance::{ProvenanceOrigin, ProvenanceStack},
};
use registrar_parser::error::{Diagnostic, ErrorCode};

pub use context::DerivationContext;

/// Tokens of one instance or of the whole registry, in insertion order.
pub type TokenMap = IndexMap<String, TokenValue>;

/// A single token value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    Text(String),
    Flag(bool),
    List(Vec<TokenMap>),
}

impl TokenValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TokenMap]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<String> for TokenValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for TokenValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<bool> for TokenValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<Vec<TokenMap>> for TokenValue {
    fn from(items: Vec<TokenMap>) -> Self {
        Self::List(items)
    }
}

/// Result of deriving tokens for every instance of a document.
#[derive(Debug, Clone, Default)]
pub struct TokenDerivation {
    instances: IndexMap<String, TokenMap>,
    diagnostics: Vec<Diagnostic>,
}

impl TokenDerivation {
    /// Token maps of the instances that derived successfully, in
    /// declaration order.
    pub fn instances(&self) -> &IndexMap<String, TokenMap> {
        &self.instances
    }

    pub fn instance(&self, name: &str) -> Option<&TokenMap> {
        self.instances.get(name)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn into_parts(self) -> (IndexMap<String, TokenMap>, Vec<Diagnostic>) {
        (self.instances, self.diagnostics)
    }
}

/// Derive tokens for every resolved instance.
///
/// A failing instance records its diagnostic and is left out of the result;
/// its siblings are still derived.
pub fn derive_all(cx: &DerivationContext<'_>) -> TokenDerivation {
    info!(instances = cx.instance_count(); "Deriving tokens");

    let mut derivation = TokenDerivation::default();
    for instance in cx.instances() {
        match derive_tokens(instance, cx) {
            Ok(tokens) => {
                derivation
                    .instances
                    .insert(instance.name().to_string(), tokens);
            }
            Err(diagnostic) => {
                debug!(instance = instance.name(); "Token derivation failed");
                derivation.diagnostics.push(diagnostic);
            }
        }
    }

    info!(
        derived = derivation.instances.len(),
        failed = derivation.diagnostics.len();
        "Token derivation finished"
    );
    derivation
}

/// Derive the token map of one named instance.
///
/// # Errors
///
/// Returns the first construction problem found: a reference to an instance
/// missing from `cx` (E400), an array parameter bound to an instance without
/// elements (E401), a non-array element-driven instance without exactly one
/// element (E402), a literal that cannot be rendered for its type (E403) or
/// a literal bound to an interface-typed parameter (E404).
pub fn derive_tokens(
    instance: &NamedInstance,
    cx: &DerivationContext<'_>,
) -> Result<TokenMap, Diagnostic> {
    let instance = annotate_assignments(instance, cx)?;
    let name = instance.name();
    let class = instance.class();
    let concrete = instance.qualified_class_name();
    let backing_field = format!("_{name}Instance");

    let external_return_type = match class.interface_qualified() {
        Some(interface) if instance.is_array() => format!("{interface}[]"),
        Some(interface) => interface.to_string(),
        None => concrete.clone(),
    };

    let element_expressions = element_expressions(&instance, cx)?;
    let initialization_expression = initialization_expression(&instance, &element_expressions)?;

    let arguments = instance
        .assignments()
        .iter()
        .map(|a| {
            format!(
                "{}: {}",
                a.parameter_name(),
                a.initializer_expression().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    let initializer_call = if instance.assignments().is_empty() {
        String::new()
    } else {
        format!("{backing_field}.{}({arguments})", cx.initializer_name())
    };

    let assignments = instance.assignments().iter().map(assignment_tokens).collect();
    let elements = element_expressions
        .iter()
        .enumerate()
        .map(|(index, expression)| {
            let mut tokens = TokenMap::new();
            tokens.insert("Index".to_string(), index.to_string().into());
            tokens.insert("Expression".to_string(), expression.as_str().into());
            tokens
        })
        .collect::<Vec<_>>();

    let mut tokens = TokenMap::new();
    let mut put = |key: &str, value: TokenValue| {
        tokens.insert(key.to_string(), value);
    };
    put("Name", name.into());
    put("QualifiedClassName", concrete.as_str().into());
    put("ElementTypeName", class.qualified_name().into());
    put("BackingFieldName", backing_field.into());
    put("AccessorName", name.into());
    put("InternalAccessorName", format!("{name}Internal").into());
    put("ExternalReturnType", external_return_type.into());
    put("InternalReturnType", concrete.into());
    put("HasExposureInterface", class.interface_qualified().is_some().into());
    put("IsArray", instance.is_array().into());
    put("InitializerName", cx.initializer_name().into());
    put("RegistryClassName", cx.registry_class_name().into());
    put("InitializationExpression", initialization_expression.into());
    put("HasAssignments", (!instance.assignments().is_empty()).into());
    put("HasElements", (!elements.is_empty()).into());
    put("InitializerArguments", arguments.into());
    put("InitializerCall", initializer_call.into());
    put("Assignments", TokenValue::List(assignments));
    put("Elements", TokenValue::List(elements));

    trace!(instance = name, tokens:?; "Derived tokens");
    Ok(tokens)
}

/// Copy `instance` with every assignment's initializer expression filled in.
///
/// # Errors
///
/// Returns the diagnostic of the first assignment whose expression cannot
/// be built.
pub fn annotate_assignments(
    instance: &NamedInstance,
    cx: &DerivationContext<'_>,
) -> Result<NamedInstance, Diagnostic> {
    let assignments = instance
        .assignments()
        .iter()
        .map(|assignment| {
            assignment_expression(assignment, cx)
                .map(|expression| assignment.clone().with_initializer_expression(expression))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(instance.clone().with_assignments(assignments))
}

/// Registry-level tokens.
///
/// `order` lists instance names in the order their maps appear under
/// `Instances`; names without derived tokens are skipped.
pub fn registry_tokens(
    cx: &DerivationContext<'_>,
    derivation: &TokenDerivation,
    order: &[String],
) -> TokenMap {
    let code_gen = cx.code_gen();

    let enums = code_gen
        .enums()
        .iter()
        .map(|name| {
            let mut tokens = TokenMap::new();
            tokens.insert("Name".to_string(), name.as_str().into());
            tokens
        })
        .collect::<Vec<_>>();
    let instances = order
        .iter()
        .filter_map(|name| derivation.instance(name).cloned())
        .collect::<Vec<_>>();

    let mut tokens = TokenMap::new();
    tokens.insert("RegistryClassName".to_string(), code_gen.registry_class_name().into());
    tokens.insert("NamespaceName".to_string(), code_gen.namespace_name().into());
    tokens.insert("GeneratedCodePath".to_string(), code_gen.generated_code_path().into());
    tokens.insert("InitializerName".to_string(), code_gen.initializer_name().into());
    tokens.insert("FailFast".to_string(), code_gen.fail_fast().into());
    tokens.insert("Enums".to_string(), TokenValue::List(enums));
    tokens.insert("Instances".to_string(), TokenValue::List(instances));
    tokens
}

fn assignment_tokens(assignment: &Assignment) -> TokenMap {
    let mut tokens = TokenMap::new();
    tokens.insert("ParameterName".to_string(), assignment.parameter_name().into());
    tokens.insert(
        "ParameterType".to_string(),
        assignment.resolved_parameter().declared_type().into(),
    );
    tokens.insert(
        "Expression".to_string(),
        assignment.initializer_expression().unwrap_or_default().into(),
    );
    tokens.insert("IsNull".to_string(), assignment.value().is_null().into());
    tokens
}

fn initialization_expression(
    instance: &NamedInstance,
    elements: &[String],
) -> Result<String, Diagnostic> {
    let type_name = instance.class().qualified_name();

    if !instance.assignments().is_empty() {
        return Ok(format!("new {type_name}()"));
    }
    if instance.elements().is_empty() {
        return Ok(literal::default_expression(instance.class(), instance.is_array()));
    }
    if instance.is_array() {
        return Ok(literal::array(&type_name, elements));
    }

    match elements {
        [single] => Ok(single.clone()),
        _ => Err(Diagnostic::error(format!(
            "named instance `{}` is not an array but has {} elements",
            instance.name(),
            elements.len()
        ))
        .with_code(ErrorCode::E402)
        .with_location(origin_of(instance.provenance()))
        .with_help("declare exactly one element, or mark the instance as an array")),
    }
}

fn element_expressions(
    instance: &NamedInstance,
    cx: &DerivationContext<'_>,
) -> Result<Vec<String>, Diagnostic> {
    let type_name = instance.class().qualified_name();
    instance
        .elements()
        .iter()
        .map(|element| element_expression(element, &type_name, cx))
        .collect()
}

fn element_expression(
    element: &Element,
    type_name: &str,
    cx: &DerivationContext<'_>,
) -> Result<String, Diagnostic> {
    match element.value() {
        ValueSource::Literal(literal) => literal::render_literal(literal, type_name, cx.code_gen())
            .ok_or_else(|| unrenderable(literal.text(), type_name, element.provenance())),
        ValueSource::Reference(target) => {
            lookup(target, element.provenance(), cx)?;
            Ok(cx.accessor_expression(target))
        }
        ValueSource::Null => Ok("null".to_string()),
    }
}

fn assignment_expression(
    assignment: &Assignment,
    cx: &DerivationContext<'_>,
) -> Result<String, Diagnostic> {
    let parameter = assignment.resolved_parameter();
    match assignment.value() {
        ValueSource::Literal(literal)
            if literal.kind() != LiteralKind::EmptyArray
                && (parameter.interface_ref().is_some() || cx.is_interface(parameter.type_name())) =>
        {
            Err(Diagnostic::error(format!(
                "literal `{}` cannot be bound to parameter `{}` of interface type `{}`",
                literal.text(),
                parameter.lookup_key(),
                parameter.type_name()
            ))
            .with_code(ErrorCode::E404)
            .with_location(origin_of(assignment.provenance()))
            .with_help("bind a named instance that implements the interface with `Instance`"))
        }
        ValueSource::Literal(literal) => {
            literal::render_literal(literal, parameter.type_name(), cx.code_gen()).ok_or_else(
                || unrenderable(literal.text(), parameter.type_name(), assignment.provenance()),
            )
        }
        ValueSource::Reference(target) => {
            let referenced = lookup(target, assignment.provenance(), cx)?;
            if parameter.is_array() {
                spread_elements(referenced, parameter, assignment.provenance(), cx)
            } else {
                Ok(cx.accessor_expression(target))
            }
        }
        ValueSource::Null => Ok("null".to_string()),
    }
}

/// Array argument built from the element expressions of `referenced`.
fn spread_elements(
    referenced: &NamedInstance,
    parameter: &Parameter,
    at: &ProvenanceStack,
    cx: &DerivationContext<'_>,
) -> Result<String, Diagnostic> {
    if referenced.elements().is_empty() {
        return Err(Diagnostic::error(format!(
            "array parameter `{}` is bound to named instance `{}`, which has no elements",
            parameter.lookup_key(),
            referenced.name()
        ))
        .with_code(ErrorCode::E401)
        .with_location(origin_of(at))
        .with_related(origin_of(referenced.provenance()), "instance declared here")
        .with_help("add `Elements` to the referenced instance or bind an empty array `[]`"));
    }

    let items = element_expressions(referenced, cx)?;
    Ok(literal::array(parameter.type_name(), &items))
}

fn lookup<'a>(
    target: &str,
    at: &ProvenanceStack,
    cx: &DerivationContext<'a>,
) -> Result<&'a NamedInstance, Diagnostic> {
    cx.instance(target).ok_or_else(|| {
        Diagnostic::error(format!(
            "named instance `{target}` is not available for token derivation"
        ))
        .with_code(ErrorCode::E400)
        .with_location(origin_of(at))
        .with_help("the instance may have been excluded by an earlier error")
    })
}

fn unrenderable(text: &str, type_name: &str, at: &ProvenanceStack) -> Diagnostic {
    Diagnostic::error(format!("literal `{text}` cannot be rendered as `{type_name}`"))
        .with_code(ErrorCode::E403)
        .with_location(origin_of(at))
}

fn origin_of(stack: &ProvenanceStack) -> ProvenanceOrigin {
    stack
        .origin()
        .cloned()
        .unwrap_or_else(|| ProvenanceOrigin::new("", ""))
}
