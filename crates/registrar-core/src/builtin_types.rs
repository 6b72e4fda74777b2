//! Builtin type table.
//!
//! The primitive types a registry description can name without declaring
//! them. Each entry knows its qualified name, the aliases it may be written
//! as, the kind of literal it accepts, its default-construction expression and
//! how to render a literal of its type into source text.

use std::fmt;

use crate::canonical::LiteralKind;

/// A primitive type known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    String,
    Int16,
    Int32,
    Int64,
    UInt16,
    UInt32,
    UInt64,
    Byte,
    Single,
    Double,
    Decimal,
    Boolean,
    Char,
    Guid,
    DateTime,
}

/// The kind of literal a declared type accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Accepts any literal (strings).
    Text,
    Integer,
    Float,
    Boolean,
    /// A single character.
    Char,
    /// Parsed at runtime from its text form (GUIDs, dates, enums, external types).
    Opaque,
}

/// Qualified name and accepted aliases for every builtin type.
const TABLE: &[(BuiltinType, &str, &[&str])] = &[
    (BuiltinType::String, "System.String", &["String", "string"]),
    (BuiltinType::Int16, "System.Int16", &["Int16", "short"]),
    (BuiltinType::Int32, "System.Int32", &["Int32", "int"]),
    (BuiltinType::Int64, "System.Int64", &["Int64", "long"]),
    (BuiltinType::UInt16, "System.UInt16", &["UInt16", "ushort"]),
    (BuiltinType::UInt32, "System.UInt32", &["UInt32", "uint"]),
    (BuiltinType::UInt64, "System.UInt64", &["UInt64", "ulong"]),
    (BuiltinType::Byte, "System.Byte", &["Byte", "byte"]),
    (BuiltinType::Single, "System.Single", &["Single", "float"]),
    (BuiltinType::Double, "System.Double", &["Double", "double"]),
    (BuiltinType::Decimal, "System.Decimal", &["Decimal", "decimal"]),
    (BuiltinType::Boolean, "System.Boolean", &["Boolean", "bool"]),
    (BuiltinType::Char, "System.Char", &["Char", "char"]),
    (BuiltinType::Guid, "System.Guid", &["Guid"]),
    (BuiltinType::DateTime, "System.DateTime", &["DateTime"]),
];

impl BuiltinType {
    /// Look up a builtin by its qualified name or one of its aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(_, qualified, aliases)| *qualified == name || aliases.contains(&name))
            .map(|(ty, _, _)| *ty)
    }

    /// Every builtin type, in table order.
    pub fn all() -> impl Iterator<Item = Self> {
        TABLE.iter().map(|(ty, _, _)| *ty)
    }

    pub fn qualified_name(self) -> &'static str {
        TABLE
            .iter()
            .find(|(ty, _, _)| *ty == self)
            .map(|(_, qualified, _)| *qualified)
            .unwrap_or("System.Object")
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::String => ValueKind::Text,
            Self::Int16
            | Self::Int32
            | Self::Int64
            | Self::UInt16
            | Self::UInt32
            | Self::UInt64
            | Self::Byte => ValueKind::Integer,
            Self::Single | Self::Double | Self::Decimal => ValueKind::Float,
            Self::Boolean => ValueKind::Boolean,
            Self::Char => ValueKind::Char,
            Self::Guid | Self::DateTime => ValueKind::Opaque,
        }
    }

    /// Expression producing the default value of this type.
    pub fn default_expression(self) -> &'static str {
        match self {
            Self::String => "\"\"",
            Self::Int16 | Self::Int32 | Self::UInt16 | Self::Byte => "0",
            Self::Int64 => "0L",
            Self::UInt32 => "0U",
            Self::UInt64 => "0UL",
            Self::Single => "0f",
            Self::Double => "0d",
            Self::Decimal => "0m",
            Self::Boolean => "false",
            Self::Char => "'\\0'",
            Self::Guid => "System.Guid.Empty",
            Self::DateTime => "System.DateTime.MinValue",
        }
    }

    /// Render `text` as a literal of this type.
    ///
    /// Returns `None` when the text is not a valid value of the type.
    pub fn render_literal(self, text: &str) -> Option<String> {
        let text = text.trim();
        match self {
            Self::String => Some(quote_string(text)),
            Self::Int16 => text.parse::<i16>().ok().map(|v| v.to_string()),
            Self::Int32 => text.parse::<i32>().ok().map(|v| v.to_string()),
            Self::Int64 => text.parse::<i64>().ok().map(|v| format!("{v}L")),
            Self::UInt16 => text.parse::<u16>().ok().map(|v| v.to_string()),
            Self::UInt32 => text.parse::<u32>().ok().map(|v| format!("{v}U")),
            Self::UInt64 => text.parse::<u64>().ok().map(|v| format!("{v}UL")),
            Self::Byte => text.parse::<u8>().ok().map(|v| v.to_string()),
            Self::Single => numeric_text(text, f64::from(f32::MAX)).map(|t| format!("{t}f")),
            Self::Double => numeric_text(text, f64::MAX).map(|t| {
                if t.contains(['.', 'e', 'E']) {
                    t.to_string()
                } else {
                    format!("{t}.0")
                }
            }),
            Self::Decimal => numeric_text(text, DECIMAL_MAX).map(|t| format!("{t}m")),
            Self::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" => Some("true".to_string()),
                "false" => Some("false".to_string()),
                _ => None,
            },
            Self::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(format!("'{}'", escape_char(c, '\''))),
                    _ => None,
                }
            }
            Self::Guid => Some(format!("new System.Guid({})", quote_string(text))),
            Self::DateTime => Some(format!(
                "System.DateTime.Parse({}, System.Globalization.CultureInfo.InvariantCulture)",
                quote_string(text)
            )),
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

impl ValueKind {
    /// Returns `true` if a literal of `literal` kind may be bound to a target
    /// of this kind.
    ///
    /// Integer literals are accepted for float targets only when
    /// `allow_int_to_float` is set; float literals are never accepted for
    /// integer targets.
    pub fn accepts(self, literal: LiteralKind, allow_int_to_float: bool) -> bool {
        match (self, literal) {
            (_, LiteralKind::EmptyArray) => false,
            (Self::Text | Self::Opaque, _) => true,
            (Self::Integer, LiteralKind::Integer) => true,
            (Self::Float, LiteralKind::Float) => true,
            (Self::Float, LiteralKind::Integer) => allow_int_to_float,
            (Self::Boolean, LiteralKind::Boolean) => true,
            (Self::Char, LiteralKind::Text | LiteralKind::Integer) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "floating-point"),
            Self::Boolean => write!(f, "boolean"),
            Self::Char => write!(f, "character"),
            Self::Opaque => write!(f, "opaque"),
        }
    }
}

/// Quote and escape `text` as a string literal.
pub fn quote_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        out.push_str(&escape_char(c, '"'));
    }
    out.push('"');
    out
}

fn escape_char(c: char, quote: char) -> String {
    match c {
        '\\' => "\\\\".to_string(),
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        '\0' => "\\0".to_string(),
        c if c == quote => format!("\\{c}"),
        c => c.to_string(),
    }
}

/// Largest magnitude of `System.Decimal`.
const DECIMAL_MAX: f64 = 79_228_162_514_264_337_593_543_950_335.0;

/// Accept only plain decimal/scientific notation with a magnitude of at most
/// `max`, rejecting `inf`/`NaN` and values that overflow to infinity.
fn numeric_text(text: &str, max: f64) -> Option<&str> {
    let plain = !text.is_empty()
        && text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !plain {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.abs() <= max)
        .map(|_| text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_alias() {
        assert_eq!(BuiltinType::from_name("System.Int32"), Some(BuiltinType::Int32));
        assert_eq!(BuiltinType::from_name("int"), Some(BuiltinType::Int32));
        assert_eq!(BuiltinType::from_name("String"), Some(BuiltinType::String));
        assert_eq!(BuiltinType::from_name("Ns.Foo"), None);
    }

    #[test]
    fn test_every_builtin_has_qualified_name() {
        for ty in BuiltinType::all() {
            assert!(ty.qualified_name().starts_with("System."));
            assert_eq!(BuiltinType::from_name(ty.qualified_name()), Some(ty));
        }
    }

    #[test]
    fn test_render_integers() {
        assert_eq!(BuiltinType::Int32.render_literal("5"), Some("5".to_string()));
        assert_eq!(BuiltinType::Int64.render_literal("5"), Some("5L".to_string()));
        assert_eq!(BuiltinType::Int32.render_literal("5.5"), None);
        assert_eq!(BuiltinType::Byte.render_literal("300"), None);
    }

    #[test]
    fn test_render_floats() {
        assert_eq!(BuiltinType::Double.render_literal("5"), Some("5.0".to_string()));
        assert_eq!(BuiltinType::Double.render_literal("5.5"), Some("5.5".to_string()));
        assert_eq!(BuiltinType::Single.render_literal("2.5"), Some("2.5f".to_string()));
        assert_eq!(BuiltinType::Decimal.render_literal("9.99"), Some("9.99m".to_string()));
        assert_eq!(BuiltinType::Double.render_literal("inf"), None);
    }

    #[test]
    fn test_render_floats_out_of_range() {
        assert_eq!(BuiltinType::Double.render_literal("1e400"), None);
        assert_eq!(BuiltinType::Double.render_literal("-1e400"), None);
        assert_eq!(BuiltinType::Double.render_literal("1e300"), Some("1e300".to_string()));
        assert_eq!(BuiltinType::Single.render_literal("1e39"), None);
        assert_eq!(BuiltinType::Single.render_literal("1e38"), Some("1e38f".to_string()));
        assert_eq!(BuiltinType::Decimal.render_literal("1e29"), None);
        assert_eq!(BuiltinType::Decimal.render_literal("1e28"), Some("1e28m".to_string()));
    }

    #[test]
    fn test_render_text_types() {
        assert_eq!(
            BuiltinType::String.render_literal("say \"hi\""),
            Some("\"say \\\"hi\\\"\"".to_string())
        );
        assert_eq!(BuiltinType::Char.render_literal("x"), Some("'x'".to_string()));
        assert_eq!(BuiltinType::Char.render_literal("'"), Some("'\\''".to_string()));
        assert_eq!(BuiltinType::Char.render_literal("xy"), None);
        assert_eq!(BuiltinType::Boolean.render_literal("True"), Some("true".to_string()));
        assert_eq!(
            BuiltinType::Guid.render_literal("6f9619ff-8b86-d011-b42d-00cf4fc964ff"),
            Some("new System.Guid(\"6f9619ff-8b86-d011-b42d-00cf4fc964ff\")".to_string())
        );
    }

    #[test]
    fn test_default_expressions() {
        assert_eq!(BuiltinType::Int32.default_expression(), "0");
        assert_eq!(BuiltinType::Boolean.default_expression(), "false");
        assert_eq!(BuiltinType::Guid.default_expression(), "System.Guid.Empty");
        assert_eq!(BuiltinType::DateTime.default_expression(), "System.DateTime.MinValue");
    }

    #[test]
    fn test_value_kind_acceptance() {
        assert!(ValueKind::Text.accepts(LiteralKind::Float, false));
        assert!(ValueKind::Integer.accepts(LiteralKind::Integer, false));
        assert!(!ValueKind::Integer.accepts(LiteralKind::Float, true));
        assert!(!ValueKind::Float.accepts(LiteralKind::Integer, false));
        assert!(ValueKind::Float.accepts(LiteralKind::Integer, true));
        assert!(!ValueKind::Boolean.accepts(LiteralKind::Text, false));
        assert!(!ValueKind::Text.accepts(LiteralKind::EmptyArray, false));
    }
}
