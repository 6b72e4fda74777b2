//! Normalizers for code generation settings and type declarations:
//! CodeGen, assemblies, namespaces, interfaces, classes and parameters.

use log::debug;

use registrar_core::{
    builtin_types::BuiltinType,
    canonical::{Assembly, Class, CodeGen, Interface, Namespace, Parameter, ParameterType},
    identifier::{IdentifierRole, qualify_if_simple},
    provenance::ProvenanceStack,
    raw::{RawAssembly, RawClass, RawCodeGen, RawInterface, RawNamespace, RawParameter},
};

use super::{
    NormalizeContext, Normalized,
    shape::{
        check_interface_ref, check_name, entity_provenance, optional, origin_of, parse_type,
        required,
    },
};
use crate::error::{Diagnostic, ErrorCode};

pub fn normalize_code_gen(
    raw: &RawCodeGen,
    parent: &ProvenanceStack,
    cx: &NormalizeContext,
) -> Normalized<CodeGen> {
    let mut diagnostics = Vec::new();
    let provenance = entity_provenance(raw.provenance.as_ref(), parent, "CodeGen", cx, &mut diagnostics);
    let origin = origin_of(&provenance);
    let d = &mut diagnostics;

    let registry_class_name = required(
        raw.registry_class_name.as_deref(),
        "RegistryClassName",
        "CodeGen",
        &origin,
        d,
    );
    check_name(
        &registry_class_name,
        IdentifierRole::PascalCase,
        &origin.field("RegistryClassName"),
        d,
    );

    let generated_code_path = required(
        raw.generated_code_path.as_deref(),
        "GeneratedCodePath",
        "CodeGen",
        &origin,
        d,
    );

    let namespace_name = required(raw.namespace_name.as_deref(), "NamespaceName", "CodeGen", &origin, d);
    check_name(
        &namespace_name,
        IdentifierRole::Namespace,
        &origin.field("NamespaceName"),
        d,
    );

    let initializer_name = required(
        raw.initializer_name.as_deref(),
        "InitializerName",
        "CodeGen",
        &origin,
        d,
    );
    check_name(
        &initializer_name,
        IdentifierRole::Identifier,
        &origin.field("InitializerName"),
        d,
    );

    let enums_origin = origin.field("Enums");
    let mut enums = Vec::new();
    for (index, name) in raw.enums.iter().flatten().enumerate() {
        let name = name.trim();
        check_name(name, IdentifierRole::Namespace, &enums_origin.item(index), d);
        if !name.is_empty() && !enums.iter().any(|e| e == name) {
            enums.push(name.to_string());
        }
    }

    let code_gen = CodeGen::new(
        provenance,
        registry_class_name,
        generated_code_path,
        namespace_name,
        initializer_name,
        enums,
        raw.fail_fast.unwrap_or(false),
    );
    Normalized::new(Some(code_gen), diagnostics)
}

pub fn normalize_assembly(
    raw: &RawAssembly,
    parent: &ProvenanceStack,
    cx: &NormalizeContext,
) -> Normalized<Assembly> {
    let mut diagnostics = Vec::new();
    let provenance =
        entity_provenance(raw.provenance.as_ref(), parent, "Assembly", cx, &mut diagnostics);
    let origin = origin_of(&provenance);

    let name = required(raw.name.as_deref(), "Name", "assembly", &origin, &mut diagnostics);
    check_name(
        &name,
        IdentifierRole::Namespace,
        &origin.field("Name"),
        &mut diagnostics,
    );

    let assembly = Assembly::new(provenance, name, optional(raw.path.as_deref()));
    Normalized::new(Some(assembly), diagnostics)
}

pub fn normalize_namespace(
    raw: &RawNamespace,
    parent: &ProvenanceStack,
    cx: &NormalizeContext,
) -> Normalized<Namespace> {
    let mut diagnostics = Vec::new();
    let provenance =
        entity_provenance(raw.provenance.as_ref(), parent, "Namespace", cx, &mut diagnostics);
    let origin = origin_of(&provenance);

    let name = required(raw.name.as_deref(), "Name", "namespace", &origin, &mut diagnostics);
    check_name(
        &name,
        IdentifierRole::Namespace,
        &origin.field("Name"),
        &mut diagnostics,
    );

    let interfaces: Vec<_> = raw
        .interfaces
        .iter()
        .flatten()
        .filter_map(|i| normalize_interface(i, &provenance, cx, &name).absorb(&mut diagnostics))
        .collect();

    let classes: Vec<_> = raw
        .classes
        .iter()
        .flatten()
        .filter_map(|c| normalize_class(c, &provenance, cx, &name).absorb(&mut diagnostics))
        .collect();

    debug!(
        namespace = name,
        interfaces = interfaces.len(),
        classes = classes.len();
        "Namespace normalized"
    );
    let namespace = Namespace::new(provenance, name, interfaces, classes);
    Normalized::new(Some(namespace), diagnostics)
}

pub fn normalize_interface(
    raw: &RawInterface,
    parent: &ProvenanceStack,
    cx: &NormalizeContext,
    namespace: &str,
) -> Normalized<Interface> {
    let mut diagnostics = Vec::new();
    let provenance =
        entity_provenance(raw.provenance.as_ref(), parent, "Interface", cx, &mut diagnostics);
    let origin = origin_of(&provenance);

    let name = required(raw.name.as_deref(), "Name", "interface", &origin, &mut diagnostics);
    check_name(
        &name,
        IdentifierRole::InterfaceName,
        &origin.field("Name"),
        &mut diagnostics,
    );

    let interface = Interface::new(provenance, namespace, name);
    Normalized::new(Some(interface), diagnostics)
}

pub fn normalize_class(
    raw: &RawClass,
    parent: &ProvenanceStack,
    cx: &NormalizeContext,
    namespace: &str,
) -> Normalized<Class> {
    let mut diagnostics = Vec::new();
    let provenance =
        entity_provenance(raw.provenance.as_ref(), parent, "Class", cx, &mut diagnostics);
    let origin = origin_of(&provenance);

    let name = required(raw.name.as_deref(), "Name", "class", &origin, &mut diagnostics);
    check_name(
        &name,
        IdentifierRole::PascalCase,
        &origin.field("Name"),
        &mut diagnostics,
    );

    let interface_qualified = optional(raw.interface.as_deref()).map(|interface| {
        check_interface_ref(&interface, &origin.field("Interface"), &mut diagnostics);
        qualify_if_simple(namespace, &interface)
    });

    let implements_origin = origin.field("Implements");
    let mut implements: Vec<String> = Vec::new();
    for (index, interface) in raw.implements.iter().flatten().enumerate() {
        let Some(interface) = optional(Some(interface)) else {
            continue;
        };
        check_interface_ref(&interface, &implements_origin.item(index), &mut diagnostics);
        let qualified = qualify_if_simple(namespace, &interface);
        if !implements.contains(&qualified) {
            implements.push(qualified);
        }
    }

    let parameters: Vec<_> = raw
        .parameters
        .iter()
        .flatten()
        .filter_map(|p| {
            normalize_parameter(p, &provenance, cx, namespace, &name).absorb(&mut diagnostics)
        })
        .collect();

    let class = Class::new(
        provenance,
        namespace,
        name,
        interface_qualified,
        implements,
        parameters,
    );
    Normalized::new(Some(class), diagnostics)
}

/// Normalize an initializer parameter of `namespace.class_name`.
///
/// Builtin aliases (`int`, `string`, ...) are replaced by their qualified
/// names, and unqualified type names are qualified with the class's
/// namespace. A type token outside the grammar is kept verbatim.
pub fn normalize_parameter(
    raw: &RawParameter,
    parent: &ProvenanceStack,
    cx: &NormalizeContext,
    namespace: &str,
    class_name: &str,
) -> Normalized<Parameter> {
    let mut diagnostics = Vec::new();
    let provenance =
        entity_provenance(raw.provenance.as_ref(), parent, "Parameter", cx, &mut diagnostics);
    let origin = origin_of(&provenance);

    let name = required(raw.name.as_deref(), "Name", "parameter", &origin, &mut diagnostics);
    check_name(
        &name,
        IdentifierRole::Identifier,
        &origin.field("Name"),
        &mut diagnostics,
    );

    let class = optional(raw.class.as_deref());
    let interface = optional(raw.interface.as_deref());
    let (field, token, is_interface) = match (class, interface) {
        (Some(token), None) => ("Class", token, false),
        (None, Some(token)) => ("Interface", token, true),
        (class, interface) => {
            let message = if class.is_some() && interface.is_some() {
                format!("parameter `{name}` declares both `Class` and `Interface`")
            } else {
                format!("parameter `{name}` declares neither `Class` nor `Interface`")
            };
            diagnostics.push(
                Diagnostic::error(message)
                    .with_code(ErrorCode::E205)
                    .with_location(origin.clone())
                    .with_help("declare exactly one of `Class` and `Interface`"),
            );
            return Normalized::new(None, diagnostics);
        }
    };

    let location = origin.field(field);
    let (base, is_array, is_nullable) = match parse_type(&token, &location, &mut diagnostics) {
        Some(ty) => {
            let base = match BuiltinType::from_name(ty.base()) {
                Some(builtin) if !is_interface => builtin.qualified_name().to_string(),
                _ => qualify_if_simple(namespace, ty.base()),
            };
            (base, ty.is_array(), ty.is_nullable())
        }
        None => (token, false, false),
    };
    if is_interface {
        check_interface_ref(&base, &location, &mut diagnostics);
    }

    let is_element_nullable = raw.is_element_nullable.unwrap_or(false);
    if is_element_nullable && !is_array {
        diagnostics.push(
            Diagnostic::error(format!(
                "parameter `{name}` is element-nullable but not an array"
            ))
            .with_code(ErrorCode::E214)
            .with_location(origin.field("IsElementNullable"))
            .with_help("only array parameters (`Name[]`) may have nullable elements"),
        );
    }

    let parameter_type = if is_interface {
        ParameterType::Interface(base)
    } else {
        ParameterType::Class(base)
    };
    let parameter = Parameter::new(
        provenance,
        namespace,
        class_name,
        name,
        parameter_type,
        is_array,
        is_nullable,
        is_element_nullable,
    );
    Normalized::new(Some(parameter), diagnostics)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use registrar_core::provenance::{ProvenanceEntry, ProvenanceOrigin, ProvenanceStage};

    use super::*;

    fn context() -> NormalizeContext {
        NormalizeContext::new("registrar", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn stack(path: &str) -> Option<ProvenanceStack> {
        Some(ProvenanceStack::new().extended(ProvenanceEntry::new(
            ProvenanceOrigin::new("a.yaml", path),
            ProvenanceStage::Parser,
            "registrar",
            context().timestamp(),
        )))
    }

    fn parameter(name: &str, class: Option<&str>, interface: Option<&str>) -> RawParameter {
        RawParameter {
            provenance: stack("Namespaces[0].Classes[0].Parameters[0]"),
            name: Some(name.to_string()),
            class: class.map(str::to_string),
            interface: interface.map(str::to_string),
            is_element_nullable: None,
        }
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
        diagnostics.iter().filter_map(Diagnostic::code).collect()
    }

    #[test]
    fn test_parameter_builtin_alias_is_qualified() {
        let normalized = normalize_parameter(
            &parameter("count", Some("int"), None),
            &ProvenanceStack::new(),
            &context(),
            "Ns",
            "Foo",
        );

        assert!(normalized.diagnostics().is_empty());
        let parameter = normalized.value().unwrap();
        assert_eq!(parameter.class_ref(), Some("System.Int32"));
        assert_eq!(parameter.lookup_key(), "Ns.Foo.count");
    }

    #[test]
    fn test_parameter_array_and_nullable_flags() {
        let normalized = normalize_parameter(
            &parameter("items", Some("Bar[]?"), None),
            &ProvenanceStack::new(),
            &context(),
            "Ns",
            "Foo",
        );

        let parameter = normalized.value().unwrap();
        assert_eq!(parameter.class_ref(), Some("Ns.Bar"));
        assert!(parameter.is_array());
        assert!(parameter.is_nullable());
    }

    #[test]
    fn test_parameter_exactly_one_type() {
        for (class, interface) in [(Some("Bar"), Some("IBar")), (None, None)] {
            let normalized = normalize_parameter(
                &parameter("x", class, interface),
                &ProvenanceStack::new(),
                &context(),
                "Ns",
                "Foo",
            );
            assert!(normalized.value().is_none());
            assert_eq!(codes(normalized.diagnostics()), [ErrorCode::E205]);
        }
    }

    #[test]
    fn test_parameter_invalid_type_token_preserved() {
        let normalized = normalize_parameter(
            &parameter("x", Some("Bar?[]"), None),
            &ProvenanceStack::new(),
            &context(),
            "Ns",
            "Foo",
        );

        assert_eq!(codes(normalized.diagnostics()), [ErrorCode::E204]);
        assert!(normalized.diagnostics()[0].message().contains("`Bar?[]`"));
        assert_eq!(normalized.value().unwrap().type_name(), "Bar?[]");
    }

    #[test]
    fn test_element_nullable_requires_array() {
        let mut raw = parameter("x", Some("Bar"), None);
        raw.is_element_nullable = Some(true);

        let normalized =
            normalize_parameter(&raw, &ProvenanceStack::new(), &context(), "Ns", "Foo");
        assert_eq!(codes(normalized.diagnostics()), [ErrorCode::E214]);
    }

    #[test]
    fn test_class_interfaces_are_qualified() {
        let raw = RawClass {
            provenance: stack("Namespaces[0].Classes[0]"),
            name: Some("Foo".to_string()),
            interface: Some("IFoo".to_string()),
            implements: Some(vec!["IFoo".to_string(), "Other.IBar".to_string()]),
            parameters: None,
        };

        let normalized = normalize_class(&raw, &ProvenanceStack::new(), &context(), "Ns");
        assert!(normalized.diagnostics().is_empty());

        let class = normalized.value().unwrap();
        assert_eq!(class.interface_qualified(), Some("Ns.IFoo"));
        assert_eq!(class.implements(), ["Ns.IFoo", "Other.IBar"]);
        assert!(class.parameters().is_empty());
    }

    #[test]
    fn test_class_name_shape() {
        let raw = RawClass {
            provenance: stack("Namespaces[0].Classes[0]"),
            name: Some("foo".to_string()),
            ..RawClass::default()
        };

        let normalized = normalize_class(&raw, &ProvenanceStack::new(), &context(), "Ns");
        assert_eq!(codes(normalized.diagnostics()), [ErrorCode::E201]);
        assert_eq!(normalized.value().unwrap().class_name(), "foo");
    }

    #[test]
    fn test_interface_name_shape() {
        let raw = RawInterface {
            provenance: stack("Namespaces[0].Interfaces[0]"),
            name: Some("Foo".to_string()),
        };

        let normalized = normalize_interface(&raw, &ProvenanceStack::new(), &context(), "Ns");
        assert_eq!(codes(normalized.diagnostics()), [ErrorCode::E203]);
    }

    #[test]
    fn test_code_gen_required_fields() {
        let raw = RawCodeGen {
            provenance: stack("CodeGen"),
            registry_class_name: Some("Registry".to_string()),
            ..RawCodeGen::default()
        };

        let normalized = normalize_code_gen(&raw, &ProvenanceStack::new(), &context());
        assert_eq!(
            codes(normalized.diagnostics()),
            [ErrorCode::E200, ErrorCode::E200, ErrorCode::E200]
        );
    }
}
