//! Reference resolver and exposure validator.
//!
//! Runs on a canonical configuration that normalized without errors. Builds
//! the lookup tables of the document in a single pass, validates every named
//! instance against them and returns a [`ResolvedModel`] holding the tables
//! and the instances that passed.
//!
//! Reference validity is a table membership check only. Self references,
//! forward references and references back to an ancestor are all accepted;
//! instance accessors are evaluated lazily, so evaluation order never matters
//! here.

use indexmap::IndexMap;
use log::{debug, info};

use registrar_core::{
    builtin_types::BuiltinType,
    canonical::{Class, Configuration, Interface, NamedInstance, Namespace, Parameter},
    provenance::ProvenanceStack,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    normalize::shape::origin_of,
};

/// A configuration together with its lookup tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModel {
    configuration: Configuration,
    namespaces: IndexMap<String, Namespace>,
    classes: IndexMap<String, Class>,
    interfaces: IndexMap<String, Interface>,
    parameters: IndexMap<String, Parameter>,
    instances: IndexMap<String, NamedInstance>,
}

impl ResolvedModel {
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn namespaces(&self) -> &IndexMap<String, Namespace> {
        &self.namespaces
    }

    pub fn classes(&self) -> &IndexMap<String, Class> {
        &self.classes
    }

    pub fn interfaces(&self) -> &IndexMap<String, Interface> {
        &self.interfaces
    }

    /// Parameters keyed by `Namespace.Class.parameter`.
    pub fn parameters(&self) -> &IndexMap<String, Parameter> {
        &self.parameters
    }

    /// Named instances that resolved successfully, in declaration order.
    pub fn instances(&self) -> &IndexMap<String, NamedInstance> {
        &self.instances
    }

    pub fn instance(&self, name: &str) -> Option<&NamedInstance> {
        self.instances.get(name)
    }
}

/// Resolve a canonical configuration, emitting diagnostics into `sink`.
pub fn resolve(configuration: Configuration, sink: &mut DiagnosticCollector) -> ResolvedModel {
    info!(source_path = configuration.source_path(); "Resolving references");

    let mut namespaces: IndexMap<String, Namespace> = IndexMap::new();
    let mut classes: IndexMap<String, Class> = IndexMap::new();
    let mut interfaces: IndexMap<String, Interface> = IndexMap::new();
    let mut parameters: IndexMap<String, Parameter> = IndexMap::new();

    for namespace in configuration.namespaces() {
        if let Some(first) = namespaces.get(namespace.name()) {
            sink.emit(duplicate(
                ErrorCode::E300,
                "namespace",
                namespace.name(),
                namespace.provenance(),
                first.provenance(),
            ));
        } else {
            namespaces.insert(namespace.name().to_string(), namespace.clone());
        }

        for interface in namespace.interfaces() {
            let key = interface.qualified_name();
            if let Some(first) = interfaces.get(&key) {
                sink.emit(duplicate(
                    ErrorCode::E302,
                    "interface",
                    &key,
                    interface.provenance(),
                    first.provenance(),
                ));
                continue;
            }
            interfaces.insert(key, interface.clone());
        }

        for class in namespace.classes() {
            let key = class.qualified_name();
            if let Some(first) = classes.get(&key) {
                sink.emit(duplicate(
                    ErrorCode::E301,
                    "class",
                    &key,
                    class.provenance(),
                    first.provenance(),
                ));
                continue;
            }

            for parameter in class.parameters() {
                let key = parameter.lookup_key();
                if let Some(first) = parameters.get(&key) {
                    sink.emit(duplicate(
                        ErrorCode::E303,
                        "parameter",
                        &key,
                        parameter.provenance(),
                        first.provenance(),
                    ));
                    continue;
                }
                parameters.insert(key, parameter.clone());
            }
            classes.insert(key, class.clone());
        }
    }

    for parameter in parameters.values() {
        let type_name = parameter.type_name();
        let known = BuiltinType::from_name(type_name).is_some()
            || configuration.code_gen().is_enum(type_name)
            || classes.contains_key(type_name)
            || interfaces.contains_key(type_name);
        if !known {
            debug!(parameter = parameter.lookup_key(), type_name; "External parameter type");
            sink.emit(
                Diagnostic::warning(format!(
                    "type `{type_name}` of parameter `{}` is not declared in this configuration",
                    parameter.lookup_key()
                ))
                .with_code(ErrorCode::E309)
                .with_location(origin_of(parameter.provenance()))
                .with_help("it is treated as an external type"),
            );
        }
    }

    // Lookup table of every named instance, first declaration kept.
    let mut declared: IndexMap<&str, &NamedInstance> = IndexMap::new();
    for instance in configuration.named_instances() {
        if let Some(first) = declared.get(instance.name()) {
            sink.emit(duplicate(
                ErrorCode::E304,
                "named instance",
                instance.name(),
                instance.provenance(),
                first.provenance(),
            ));
            continue;
        }
        declared.insert(instance.name(), instance);
    }

    let mut instances = IndexMap::new();
    for (name, instance) in &declared {
        let mut diagnostics = Vec::new();
        check_exposure(instance, &interfaces, &mut diagnostics);
        check_parameters(instance, &parameters, &mut diagnostics);
        check_references(instance, &declared, &mut diagnostics);

        let failed = diagnostics.iter().any(Diagnostic::is_error);
        sink.extend(diagnostics);
        if failed {
            debug!(instance = name; "Named instance excluded from resolved model");
            continue;
        }
        instances.insert(name.to_string(), (*instance).clone());
    }

    info!(
        classes = classes.len(),
        interfaces = interfaces.len(),
        instances = instances.len();
        "Resolution finished"
    );

    ResolvedModel {
        configuration,
        namespaces,
        classes,
        interfaces,
        parameters,
        instances,
    }
}

fn duplicate(
    code: ErrorCode,
    kind: &str,
    name: &str,
    this: &ProvenanceStack,
    first: &ProvenanceStack,
) -> Diagnostic {
    Diagnostic::error(format!("{kind} `{name}` is defined multiple times"))
        .with_code(code)
        .with_location(origin_of(this))
        .with_related(origin_of(first), "first defined here")
        .with_help("the first definition is kept; remove or rename the duplicate")
}

/// The exposure interface must exist and be implemented by the class.
fn check_exposure(
    instance: &NamedInstance,
    interfaces: &IndexMap<String, Interface>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let class = instance.class();
    let Some(interface) = class.interface_qualified() else {
        return;
    };
    let location = origin_of(instance.provenance());

    if !interfaces.contains_key(interface) {
        diagnostics.push(
            Diagnostic::error(format!(
                "exposure interface `{interface}` of named instance `{}` does not resolve to a known interface",
                instance.name()
            ))
            .with_code(ErrorCode::E305)
            .with_location(location)
            .with_related(origin_of(class.provenance()), "exposure declared on this class"),
        );
        return;
    }

    if !class.implements_interface(interface) {
        diagnostics.push(
            Diagnostic::error(format!(
                "type `{}` does not implement interface `{interface}`",
                class.qualified_name()
            ))
            .with_code(ErrorCode::E306)
            .with_location(location)
            .with_related(origin_of(class.provenance()), "class declared here")
            .with_help(format!("add `{interface}` to the class's `Implements` list")),
        );
    }
}

fn check_parameters(
    instance: &NamedInstance,
    parameters: &IndexMap<String, Parameter>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let class_name = instance.class().qualified_name();
    for assignment in instance.assignments() {
        let key = format!("{class_name}.{}", assignment.parameter_name());
        if !parameters.contains_key(&key) {
            diagnostics.push(
                Diagnostic::error(format!(
                    "parameter `{}` is not a parameter of `{class_name}`",
                    assignment.parameter_name()
                ))
                .with_code(ErrorCode::E307)
                .with_location(origin_of(assignment.provenance())),
            );
        }
    }
}

fn check_references(
    instance: &NamedInstance,
    declared: &IndexMap<&str, &NamedInstance>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let assignment_refs = instance
        .assignments()
        .iter()
        .filter_map(|a| a.named_instance_ref().map(|r| (r, a.provenance())));
    let element_refs = instance
        .elements()
        .iter()
        .filter_map(|e| e.named_instance_ref().map(|r| (r, e.provenance())));

    for (reference, provenance) in assignment_refs.chain(element_refs) {
        if !declared.contains_key(reference) {
            diagnostics.push(
                Diagnostic::error(format!(
                    "named instance `{}` references unknown instance `{reference}`",
                    instance.name()
                ))
                .with_code(ErrorCode::E308)
                .with_location(origin_of(provenance).field("Instance")),
            );
        }
    }
}
