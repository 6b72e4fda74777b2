//! Expression rendering for literals and default values.

use registrar_core::{
    builtin_types::{BuiltinType, quote_string},
    canonical::{Class, CodeGen, Literal, LiteralKind},
    identifier::is_identifier,
};

/// Render `literal` as a value of `type_name`.
///
/// Builtin types use their own rendering table, configured enums render as
/// `Enum.Member` and any other type is constructed from the quoted text.
/// Returns `None` when the text is not a valid value of the type.
pub fn render_literal(literal: &Literal, type_name: &str, code_gen: &CodeGen) -> Option<String> {
    if literal.kind() == LiteralKind::EmptyArray {
        return Some(empty_array(type_name));
    }
    if let Some(builtin) = BuiltinType::from_name(type_name) {
        return builtin.render_literal(literal.text());
    }
    if code_gen.is_enum(type_name) {
        return enum_member(type_name, literal.text());
    }
    Some(format!("new {type_name}({})", quote_string(literal.text())))
}

/// `Enum.Member`, accepting the member written bare or already qualified.
fn enum_member(type_name: &str, text: &str) -> Option<String> {
    let text = text.trim();
    let member = text
        .strip_prefix(type_name)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(text);
    is_identifier(member).then(|| format!("{type_name}.{member}"))
}

pub fn empty_array(type_name: &str) -> String {
    format!("new {type_name}[] {{ }}")
}

/// Array construction expression over `items`.
pub fn array(type_name: &str, items: &[String]) -> String {
    if items.is_empty() {
        empty_array(type_name)
    } else {
        format!("new {type_name}[] {{ {} }}", items.join(", "))
    }
}

/// Expression for an instance declared without assignments or elements.
pub fn default_expression(class: &Class, is_array: bool) -> String {
    let type_name = class.qualified_name();
    if is_array {
        return empty_array(&type_name);
    }
    match class.builtin() {
        Some(builtin) => builtin.default_expression().to_string(),
        None => format!("new {type_name}()"),
    }
}
