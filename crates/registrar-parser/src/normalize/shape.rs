//! Shared checks for the entity normalizers: provenance, required fields,
//! identifier shapes and type tokens.

use log::debug;

use registrar_core::{
    identifier::{IdentifierRole, is_interface_name, is_namespace, split_qualified},
    provenance::{ProvenanceEntry, ProvenanceOrigin, ProvenanceStack, ProvenanceStage},
    type_ref::TypeRef,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    normalize::NormalizeContext,
};

/// Normalize an entity's provenance stack.
///
/// A well-formed stack gets a normalizer entry appended. Otherwise the
/// parent's stack is inherited, extended with an entry naming `entity`, and an
/// E215 warning is recorded.
pub(crate) fn entity_provenance(
    own: Option<&ProvenanceStack>,
    parent: &ProvenanceStack,
    entity: &str,
    cx: &NormalizeContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> ProvenanceStack {
    let entry = |origin: ProvenanceOrigin| {
        ProvenanceEntry::new(
            origin,
            ProvenanceStage::Normalizer,
            cx.tool_id(),
            cx.timestamp(),
        )
    };

    if let Some(stack) = own.filter(|stack| stack.is_well_formed()) {
        if let Some(origin) = stack.origin() {
            return stack.extended(entry(origin.clone()));
        }
    }

    let origin = match parent.origin() {
        Some(parent_origin) if !parent_origin.logical_path().is_empty() => {
            parent_origin.field(entity)
        }
        Some(parent_origin) => ProvenanceOrigin::new(parent_origin.source_path(), entity),
        None => ProvenanceOrigin::new("", entity),
    };
    debug!(entity, origin:% = origin; "Inheriting parent provenance");
    diagnostics.push(
        Diagnostic::warning(format!(
            "{entity} has no usable provenance; inheriting its parent's"
        ))
        .with_code(ErrorCode::E215)
        .with_location(origin.clone()),
    );
    parent.extended(entry(origin))
}

/// Origin of the latest entry of a normalized stack.
pub(crate) fn origin_of(stack: &ProvenanceStack) -> ProvenanceOrigin {
    stack
        .origin()
        .cloned()
        .unwrap_or_else(|| ProvenanceOrigin::new("", ""))
}

/// Read a required scalar, returning it trimmed.
///
/// A missing or blank value records one E200 error and yields an empty string
/// so the entity can still be constructed.
pub(crate) fn required(
    value: Option<&str>,
    field: &str,
    entity: &str,
    origin: &ProvenanceOrigin,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value.to_string(),
        None => {
            diagnostics.push(
                Diagnostic::error(format!("required field `{field}` of {entity} is missing"))
                    .with_code(ErrorCode::E200)
                    .with_location(origin.field(field)),
            );
            String::new()
        }
    }
}

/// Trim an optional scalar, treating blank as absent.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Check `name` against the rule for `role`. Empty names are skipped, since
/// they were already reported as missing.
pub(crate) fn check_name(
    name: &str,
    role: IdentifierRole,
    location: &ProvenanceOrigin,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    if name.is_empty() || role.accepts(name) {
        return true;
    }
    let code = match role {
        IdentifierRole::Namespace => ErrorCode::E202,
        IdentifierRole::InterfaceName => ErrorCode::E203,
        IdentifierRole::Identifier | IdentifierRole::PascalCase => ErrorCode::E201,
    };
    diagnostics.push(
        Diagnostic::error(format!("`{name}` is not a valid {role}"))
            .with_code(code)
            .with_location(location.clone())
            .with_help(format!("a {role} {}", role.rule())),
    );
    false
}

/// Check a possibly qualified interface name such as `Company.IService`.
pub(crate) fn check_interface_ref(
    name: &str,
    location: &ProvenanceOrigin,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let (namespace, simple) = split_qualified(name);
    if (namespace.is_empty() || is_namespace(namespace)) && is_interface_name(simple) {
        return true;
    }
    diagnostics.push(
        Diagnostic::error(format!("`{name}` is not a valid interface name"))
            .with_code(ErrorCode::E203)
            .with_location(location.clone())
            .with_help(format!(
                "an interface name {}",
                IdentifierRole::InterfaceName.rule()
            )),
    );
    false
}

/// Parse a type token, recording E204 on failure.
pub(crate) fn parse_type(
    token: &str,
    location: &ProvenanceOrigin,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<TypeRef> {
    match TypeRef::parse(token) {
        Ok(ty) => Some(ty),
        Err(err) => {
            diagnostics.push(
                Diagnostic::error(err.to_string())
                    .with_code(ErrorCode::E204)
                    .with_location(location.clone())
                    .with_help("a nullable element type inside an array (`Name?[]`) is not supported"),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn context() -> NormalizeContext {
        NormalizeContext::new("registrar", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn parser_stack(path: &str) -> ProvenanceStack {
        ProvenanceStack::new().extended(ProvenanceEntry::new(
            ProvenanceOrigin::new("a.yaml", path),
            ProvenanceStage::Parser,
            "registrar",
            context().timestamp(),
        ))
    }

    #[test]
    fn test_own_provenance_extended() {
        let mut diagnostics = Vec::new();
        let own = parser_stack("Namespaces[0]");
        let stack = entity_provenance(
            Some(&own),
            &ProvenanceStack::new(),
            "Namespace",
            &context(),
            &mut diagnostics,
        );

        assert!(diagnostics.is_empty());
        assert_eq!(stack.entries().len(), 2);
        assert_eq!(stack.latest().unwrap().stage(), &ProvenanceStage::Normalizer);
        assert_eq!(stack.origin().unwrap().logical_path(), "Namespaces[0]");
    }

    #[test]
    fn test_missing_provenance_inherits_parent() {
        let mut diagnostics = Vec::new();
        let parent = parser_stack("Namespaces[0]");
        let stack = entity_provenance(None, &parent, "Class", &context(), &mut diagnostics);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E215));
        assert!(stack.is_well_formed());
        assert_eq!(stack.origin().unwrap().logical_path(), "Namespaces[0].Class");
        assert_eq!(stack.entries()[0], parent.entries()[0]);
    }

    #[test]
    fn test_required_blank_is_missing() {
        let mut diagnostics = Vec::new();
        let origin = ProvenanceOrigin::new("a.yaml", "Namespaces[0]");

        assert_eq!(required(Some("  "), "Name", "namespace", &origin, &mut diagnostics), "");
        assert_eq!(required(Some(" Ns "), "Name", "namespace", &origin, &mut diagnostics), "Ns");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].location().unwrap().logical_path(),
            "Namespaces[0].Name"
        );
    }

    #[test]
    fn test_check_name_codes() {
        let origin = ProvenanceOrigin::new("a.yaml", "x");
        let mut diagnostics = Vec::new();

        assert!(!check_name("1abc", IdentifierRole::Identifier, &origin, &mut diagnostics));
        assert!(!check_name("A..B", IdentifierRole::Namespace, &origin, &mut diagnostics));
        assert!(!check_name("Foo", IdentifierRole::InterfaceName, &origin, &mut diagnostics));
        assert!(check_name("", IdentifierRole::PascalCase, &origin, &mut diagnostics));

        let codes: Vec<_> = diagnostics.iter().filter_map(Diagnostic::code).collect();
        assert_eq!(codes, [ErrorCode::E201, ErrorCode::E202, ErrorCode::E203]);
    }

    #[test]
    fn test_check_interface_ref() {
        let origin = ProvenanceOrigin::new("a.yaml", "x");
        let mut diagnostics = Vec::new();

        assert!(check_interface_ref("Ns.IFoo", &origin, &mut diagnostics));
        assert!(check_interface_ref("IFoo", &origin, &mut diagnostics));
        assert!(!check_interface_ref("Ns.Foo", &origin, &mut diagnostics));
        assert_eq!(diagnostics.len(), 1);
    }
}
