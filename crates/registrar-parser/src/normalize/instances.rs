//! Named-instance normalization.
//!
//! Named instances are checked against the classes declared in the document
//! (or a builtin type). Beyond the common steps they enforce:
//!
//! - assignments and elements are mutually exclusive (E206)
//! - an assignment or element binds a literal or an instance, not both (E207)
//! - literals match the declared type of their target (E208, E212)
//! - non-nullable targets have a value (E213)
//! - a parameter is assigned at most once (E217)
//! - non-array element-driven instances have exactly one element (E211)

use indexmap::IndexMap;
use log::debug;

use registrar_core::{
    builtin_types::{BuiltinType, ValueKind},
    canonical::{
        Assignment, Class, Element, Literal, LiteralKind, NamedInstance, Namespace, ValueSource,
    },
    identifier::IdentifierRole,
    provenance::{ProvenanceOrigin, ProvenanceStack},
    raw::{RawAssignment, RawElement, RawNamedInstance, RawValue},
};

use super::{
    NormalizeContext, Normalized,
    shape::{check_name, entity_provenance, optional, origin_of, parse_type, required},
};
use crate::error::{Diagnostic, ErrorCode};

/// Classes a named instance may be declared with, keyed by qualified name.
///
/// The first declaration of a qualified name wins. Builtin types are
/// resolved on demand.
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    classes: IndexMap<String, Class>,
}

impl ClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every class of `namespaces` in declaration order.
    pub fn from_namespaces(namespaces: &[Namespace]) -> Self {
        let mut index = Self::new();
        for class in namespaces.iter().flat_map(Namespace::classes) {
            index.insert(class.clone());
        }
        index
    }

    /// Add a class. Returns `false` and keeps the existing entry when the
    /// qualified name is already indexed.
    pub fn insert(&mut self, class: Class) -> bool {
        let key = class.qualified_name();
        if self.classes.contains_key(&key) {
            return false;
        }
        self.classes.insert(key, class);
        true
    }

    pub fn get(&self, qualified_name: &str) -> Option<&Class> {
        self.classes.get(qualified_name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Resolve a class token base: a declared class, or a builtin type
    /// synthesized as a parameterless class with `provenance`.
    pub fn resolve(&self, name: &str, provenance: &ProvenanceStack) -> Option<Class> {
        self.get(name).cloned().or_else(|| {
            BuiltinType::from_name(name).map(|builtin| Class::for_builtin(builtin, provenance.clone()))
        })
    }
}

/// A place a literal is bound to.
struct Target<'a> {
    /// Human-readable description, e.g. "parameter `count`".
    label: String,
    type_name: &'a str,
    is_array: bool,
}

pub fn normalize_named_instance(
    raw: &RawNamedInstance,
    parent: &ProvenanceStack,
    cx: &NormalizeContext,
    classes: &ClassIndex,
) -> Normalized<NamedInstance> {
    let mut diagnostics = Vec::new();
    let provenance =
        entity_provenance(raw.provenance.as_ref(), parent, "NamedInstance", cx, &mut diagnostics);
    let origin = origin_of(&provenance);

    let name = required(raw.name.as_deref(), "Name", "named instance", &origin, &mut diagnostics);
    check_name(
        &name,
        IdentifierRole::PascalCase,
        &origin.field("Name"),
        &mut diagnostics,
    );

    let class_origin = origin.field("Class");
    let class_token = required(raw.class.as_deref(), "Class", "named instance", &origin, &mut diagnostics);
    let type_ref = if class_token.is_empty() {
        None
    } else {
        parse_type(&class_token, &class_origin, &mut diagnostics)
    };

    if type_ref.as_ref().is_some_and(|ty| ty.is_nullable()) {
        diagnostics.push(
            Diagnostic::error(format!(
                "named instance `{name}` cannot have the nullable class `{class_token}`"
            ))
            .with_code(ErrorCode::E214)
            .with_location(class_origin.clone())
            .with_help("remove the trailing `?`"),
        );
    }

    let is_array =
        type_ref.as_ref().is_some_and(|ty| ty.is_array()) || raw.is_array.unwrap_or(false);

    let class = type_ref.as_ref().and_then(|ty| {
        let class = classes.resolve(ty.base(), &provenance);
        if class.is_none() {
            diagnostics.push(
                Diagnostic::error(format!(
                    "class `{}` of named instance `{name}` is not declared",
                    ty.base()
                ))
                .with_code(ErrorCode::E209)
                .with_location(class_origin.clone())
                .with_help("declare the class under `Namespaces` or use a builtin type"),
            );
        }
        class
    });

    let raw_assignments = raw.assignments.as_deref().unwrap_or_default();
    let mut raw_elements = raw.elements.as_deref().unwrap_or_default();

    if !raw_assignments.is_empty() && !raw_elements.is_empty() {
        diagnostics.push(
            Diagnostic::error(format!(
                "named instance `{name}` has both `Assignments` and `Elements`"
            ))
            .with_code(ErrorCode::E206)
            .with_location(origin.clone())
            .with_help("an instance is built either from initializer assignments or from elements"),
        );
        raw_elements = &[];
    } else if is_array && !raw_assignments.is_empty() {
        diagnostics.push(
            Diagnostic::error(format!(
                "array named instance `{name}` cannot have assignments"
            ))
            .with_code(ErrorCode::E214)
            .with_location(origin.field("Assignments"))
            .with_help("list the array items under `Elements`"),
        );
    }

    let mut assignments: Vec<Assignment> = Vec::new();
    let mut elements = Vec::new();
    if let Some(class) = &class {
        for raw_assignment in raw_assignments {
            let Some(assignment) =
                normalize_assignment(raw_assignment, &provenance, cx, class).absorb(&mut diagnostics)
            else {
                continue;
            };
            if let Some(first) = assignments
                .iter()
                .find(|a| a.parameter_name() == assignment.parameter_name())
            {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "parameter `{}` of named instance `{name}` is assigned more than once",
                        assignment.parameter_name()
                    ))
                    .with_code(ErrorCode::E217)
                    .with_location(origin_of(assignment.provenance()).field("Parameter"))
                    .with_related(origin_of(first.provenance()), "first assigned here")
                    .with_help("the first assignment is kept; remove the duplicate"),
                );
                continue;
            }
            assignments.push(assignment);
        }
        elements = raw_elements
            .iter()
            .filter_map(|e| normalize_element(e, &provenance, cx, class).absorb(&mut diagnostics))
            .collect();
    }

    if !is_array && raw_elements.len() > 1 {
        diagnostics.push(
            Diagnostic::error(format!(
                "named instance `{name}` is not an array but has {} elements",
                raw_elements.len()
            ))
            .with_code(ErrorCode::E211)
            .with_location(origin.field("Elements"))
            .with_help("use a single element, or make the instance an array with `IsArray: true`"),
        );
    }

    debug!(
        instance = name,
        is_array,
        assignments = assignments.len(),
        elements = elements.len();
        "Named instance normalized"
    );

    let value = class.map(|class| {
        NamedInstance::new(
            provenance,
            name,
            class,
            class_token,
            is_array,
            assignments,
            elements,
        )
    });
    Normalized::new(value, diagnostics)
}

/// Normalize an assignment of an instance of `class`.
pub fn normalize_assignment(
    raw: &RawAssignment,
    parent: &ProvenanceStack,
    cx: &NormalizeContext,
    class: &Class,
) -> Normalized<Assignment> {
    let mut diagnostics = Vec::new();
    let provenance =
        entity_provenance(raw.provenance.as_ref(), parent, "Assignment", cx, &mut diagnostics);
    let origin = origin_of(&provenance);

    let parameter_name = required(
        raw.parameter.as_deref(),
        "Parameter",
        "assignment",
        &origin,
        &mut diagnostics,
    );
    if parameter_name.is_empty() {
        return Normalized::new(None, diagnostics);
    }

    let Some(parameter) = class.parameter(&parameter_name) else {
        let declared: Vec<_> = class
            .parameters()
            .iter()
            .map(|p| format!("`{}`", p.parameter_name()))
            .collect();
        let help = if declared.is_empty() {
            format!("`{}` declares no parameters", class.qualified_name())
        } else {
            format!("declared parameters: {}", declared.join(", "))
        };
        diagnostics.push(
            Diagnostic::error(format!(
                "class `{}` has no parameter `{parameter_name}`",
                class.qualified_name()
            ))
            .with_code(ErrorCode::E210)
            .with_location(origin.field("Parameter"))
            .with_help(help),
        );
        return Normalized::new(None, diagnostics);
    };

    let target = Target {
        label: format!("parameter `{parameter_name}`"),
        type_name: parameter.type_name(),
        is_array: parameter.is_array(),
    };
    let value = value_source(
        raw.value.as_ref(),
        raw.instance.as_deref(),
        &target,
        parameter.is_nullable(),
        &origin,
        cx,
        &mut diagnostics,
    );

    let assignment = Assignment::new(provenance, parameter_name, value, parameter.clone());
    Normalized::new(Some(assignment), diagnostics)
}

/// Normalize an element of an instance of `class`. Elements are typed by
/// the instance's class.
pub fn normalize_element(
    raw: &RawElement,
    parent: &ProvenanceStack,
    cx: &NormalizeContext,
    class: &Class,
) -> Normalized<Element> {
    let mut diagnostics = Vec::new();
    let provenance =
        entity_provenance(raw.provenance.as_ref(), parent, "Element", cx, &mut diagnostics);
    let origin = origin_of(&provenance);

    let type_name = class.qualified_name();
    let target = Target {
        label: format!("element of type `{type_name}`"),
        type_name: &type_name,
        is_array: false,
    };
    let value = value_source(
        raw.value.as_ref(),
        raw.instance.as_deref(),
        &target,
        false,
        &origin,
        cx,
        &mut diagnostics,
    );

    Normalized::new(Some(Element::new(provenance, value)), diagnostics)
}

/// Decide where a bound value comes from, enforcing value/instance
/// exclusivity and literal compatibility.
fn value_source(
    value: Option<&RawValue>,
    instance: Option<&str>,
    target: &Target<'_>,
    is_nullable: bool,
    origin: &ProvenanceOrigin,
    cx: &NormalizeContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> ValueSource {
    let literal = value.map(|value| match value {
        RawValue::Scalar(text) => Literal::infer(text.as_str()),
        RawValue::EmptySequence => Literal::empty_array(),
    });
    let instance = optional(instance);

    match (literal, instance) {
        (Some(literal), Some(instance)) => {
            diagnostics.push(
                Diagnostic::error(format!(
                    "{} binds both the value `{}` and the instance `{instance}`",
                    target.label,
                    literal.text()
                ))
                .with_code(ErrorCode::E207)
                .with_location(origin.clone())
                .with_help("set either `Value` or `Instance`"),
            );
            ValueSource::Literal(literal)
        }
        (Some(literal), None) => {
            check_literal(&literal, target, &origin.field("Value"), cx, diagnostics);
            ValueSource::Literal(literal)
        }
        (None, Some(instance)) => ValueSource::Reference(instance),
        (None, None) => {
            if !is_nullable {
                diagnostics.push(
                    Diagnostic::error(format!("{} has no value", target.label))
                        .with_code(ErrorCode::E213)
                        .with_location(origin.clone())
                        .with_help("set `Value` or `Instance`; only nullable parameters may be left unset"),
                );
            }
            ValueSource::Null
        }
    }
}

/// Check that `literal` may be bound to `target`.
fn check_literal(
    literal: &Literal,
    target: &Target<'_>,
    location: &ProvenanceOrigin,
    cx: &NormalizeContext,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let type_name = target.type_name;
    let label = &target.label;

    if literal.kind() == LiteralKind::EmptyArray {
        if !target.is_array {
            diagnostics.push(
                Diagnostic::error(format!(
                    "`[]` cannot be bound to {label} of non-array type `{type_name}`"
                ))
                .with_code(ErrorCode::E212)
                .with_location(location.clone()),
            );
        }
        return;
    }

    if target.is_array {
        diagnostics.push(
            Diagnostic::error(format!(
                "literal `{}` cannot be bound to {label} of array type `{type_name}[]`",
                literal.text()
            ))
            .with_code(ErrorCode::E208)
            .with_location(location.clone())
            .with_help("bind an array named instance with `Instance`, or `[]` for an empty array"),
        );
        return;
    }

    let builtin = BuiltinType::from_name(type_name);
    let kind = builtin.map_or(ValueKind::Opaque, BuiltinType::value_kind);
    if !kind.accepts(literal.kind(), cx.allow_int_to_float()) {
        let mut diagnostic = Diagnostic::error(format!(
            "literal `{}` does not match {label} of type `{type_name}`",
            literal.text()
        ))
        .with_code(ErrorCode::E208)
        .with_location(location.clone());
        diagnostic = if kind == ValueKind::Float && literal.kind() == LiteralKind::Integer {
            diagnostic.with_help(format!(
                "write `{}.0`, or enable integer to floating-point coercion",
                literal.text()
            ))
        } else {
            diagnostic.with_help(format!("`{type_name}` accepts {kind} literals"))
        };
        diagnostics.push(diagnostic);
        return;
    }

    if let Some(builtin) = builtin {
        if builtin.render_literal(literal.text()).is_none() {
            diagnostics.push(
                Diagnostic::error(format!(
                    "literal `{}` is not a valid `{type_name}` for {label}",
                    literal.text()
                ))
                .with_code(ErrorCode::E208)
                .with_location(location.clone()),
            );
        }
    }
}
