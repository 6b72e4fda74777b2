//! Error codes for the Registrar diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Ingest errors
//! - `E1xx` - Schema and extraction errors
//! - `E2xx` - Normalization errors
//! - `E3xx` - Resolution errors
//! - `E4xx` - Token derivation errors
//! - `E5xx` - Template errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Ingest Errors (E0xx)
    // =========================================================================
    /// YAML syntax error.
    ///
    /// The document is not valid YAML.
    E001,

    /// Missing document root.
    ///
    /// The document is empty or its root is not a mapping.
    E002,

    // =========================================================================
    // Schema Errors (E1xx)
    // =========================================================================
    /// Unknown key.
    ///
    /// A key is not legal in its structural context.
    E100,

    /// Mis-cased key.
    ///
    /// A key matches a legal key only when casing is ignored.
    E101,

    /// Unexpected value shape.
    ///
    /// A value is not the expected mapping, sequence or scalar. The field is
    /// treated as absent.
    E102,

    /// Malformed provenance block.
    ///
    /// A `Provenance` block could not be read. The parser-only stack is used.
    E103,

    // =========================================================================
    // Normalization Errors (E2xx)
    // =========================================================================
    /// Required field missing.
    ///
    /// A required field is absent or blank.
    E200,

    /// Invalid identifier.
    ///
    /// A name does not satisfy the identifier rule for its role.
    E201,

    /// Invalid namespace.
    ///
    /// A namespace segment is not a valid identifier.
    E202,

    /// Invalid interface name.
    ///
    /// Interface names must be `I` followed by an uppercase letter.
    E203,

    /// Invalid type reference.
    ///
    /// A type token is outside the `Name`, `Name?`, `Name[]`, `Name[]?` grammar.
    E204,

    /// Ambiguous parameter type.
    ///
    /// A parameter must declare exactly one of `Class` and `Interface`.
    E205,

    /// Assignments and elements both present.
    ///
    /// A named instance is either assignment-driven or element-driven.
    E206,

    /// Value and instance both present.
    ///
    /// An assignment or element binds either a literal or a named instance.
    E207,

    /// Literal kind mismatch.
    ///
    /// A literal's kind is not accepted by its declared type.
    E208,

    /// Undeclared class.
    ///
    /// A named instance names a class that is neither declared nor builtin.
    E209,

    /// Unknown parameter.
    ///
    /// An assignment names a parameter the class does not declare.
    E210,

    /// Element count mismatch.
    ///
    /// A non-array element-driven instance must have exactly one element.
    E211,

    /// Empty array for non-array target.
    ///
    /// The empty-sequence literal was bound to a non-array target.
    E212,

    /// Missing value.
    ///
    /// A non-nullable target has neither a literal nor an instance reference.
    E213,

    /// Invalid type flags.
    ///
    /// A flag combination is not allowed, such as a nullable instance class
    /// or an element-nullable non-array parameter.
    E214,

    /// Provenance inherited.
    ///
    /// An entity's own provenance is absent or malformed; its parent's stack
    /// is inherited instead.
    E215,

    /// Duplicate assembly.
    ///
    /// An assembly is listed more than once. The first entry is kept.
    E216,

    /// Duplicate assignment.
    ///
    /// A named instance assigns the same parameter more than once. The first
    /// assignment is kept.
    E217,

    // =========================================================================
    // Resolution Errors (E3xx)
    // =========================================================================
    /// Duplicate namespace.
    ///
    /// A namespace is declared more than once.
    E300,

    /// Duplicate class.
    ///
    /// A qualified class name is declared more than once.
    E301,

    /// Duplicate interface.
    ///
    /// A qualified interface name is declared more than once.
    E302,

    /// Duplicate parameter.
    ///
    /// A class declares the same parameter name more than once.
    E303,

    /// Duplicate named instance.
    ///
    /// Two named instances share a name. The first is kept.
    E304,

    /// Unresolved exposure interface.
    ///
    /// The exposure interface does not resolve to a known interface.
    E305,

    /// Interface not implemented.
    ///
    /// The class does not list its exposure interface under `Implements`.
    E306,

    /// Unknown parameter.
    ///
    /// An assignment's parameter is not in the class's parameter table.
    E307,

    /// Unresolved instance reference.
    ///
    /// An assignment or element references an unknown named instance.
    E308,

    /// External parameter type.
    ///
    /// A parameter type is not declared in this configuration and is treated
    /// as external.
    E309,

    /// Reference cycle.
    ///
    /// Named instances reference each other in a cycle. Accessors are
    /// evaluated lazily, so this is legal.
    E310,

    // =========================================================================
    // Derivation Errors (E4xx)
    // =========================================================================
    /// Missing derivation lookup.
    ///
    /// A referenced instance is absent from the derivation context.
    E400,

    /// Empty array reference.
    ///
    /// An array parameter is bound to an instance with zero elements.
    E401,

    /// Element-driven instance without one element.
    ///
    /// A non-array element-driven instance has other than one element.
    E402,

    /// Unrenderable literal.
    ///
    /// A literal cannot be rendered for its declared type.
    E403,

    /// Literal for an interface type.
    ///
    /// A literal is bound to a parameter whose type is an interface, which
    /// cannot be constructed.
    E404,

    // =========================================================================
    // Template Errors (E5xx)
    // =========================================================================
    /// Unknown template placeholder.
    ///
    /// A template placeholder names a token the schema does not define.
    E500,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
            ErrorCode::E209 => "E209",
            ErrorCode::E210 => "E210",
            ErrorCode::E211 => "E211",
            ErrorCode::E212 => "E212",
            ErrorCode::E213 => "E213",
            ErrorCode::E214 => "E214",
            ErrorCode::E215 => "E215",
            ErrorCode::E216 => "E216",
            ErrorCode::E217 => "E217",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
            ErrorCode::E307 => "E307",
            ErrorCode::E308 => "E308",
            ErrorCode::E309 => "E309",
            ErrorCode::E310 => "E310",
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
            ErrorCode::E402 => "E402",
            ErrorCode::E403 => "E403",
            ErrorCode::E404 => "E404",
            ErrorCode::E500 => "E500",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Ingest Errors
            ErrorCode::E001 => "yaml syntax error",
            ErrorCode::E002 => "missing document root",
            // Schema Errors
            ErrorCode::E100 => "unknown key",
            ErrorCode::E101 => "mis-cased key",
            ErrorCode::E102 => "unexpected value shape",
            ErrorCode::E103 => "malformed provenance block",
            // Normalization Errors
            ErrorCode::E200 => "required field missing",
            ErrorCode::E201 => "invalid identifier",
            ErrorCode::E202 => "invalid namespace",
            ErrorCode::E203 => "invalid interface name",
            ErrorCode::E204 => "invalid type reference",
            ErrorCode::E205 => "ambiguous parameter type",
            ErrorCode::E206 => "assignments and elements both present",
            ErrorCode::E207 => "value and instance both present",
            ErrorCode::E208 => "literal kind mismatch",
            ErrorCode::E209 => "undeclared class",
            ErrorCode::E210 => "unknown parameter",
            ErrorCode::E211 => "element count mismatch",
            ErrorCode::E212 => "empty array for non-array target",
            ErrorCode::E213 => "missing value",
            ErrorCode::E214 => "invalid type flags",
            ErrorCode::E215 => "provenance inherited",
            ErrorCode::E216 => "duplicate assembly",
            ErrorCode::E217 => "duplicate assignment",
            // Resolution Errors
            ErrorCode::E300 => "duplicate namespace",
            ErrorCode::E301 => "duplicate class",
            ErrorCode::E302 => "duplicate interface",
            ErrorCode::E303 => "duplicate parameter",
            ErrorCode::E304 => "duplicate named instance",
            ErrorCode::E305 => "unresolved exposure interface",
            ErrorCode::E306 => "interface not implemented",
            ErrorCode::E307 => "unknown parameter",
            ErrorCode::E308 => "unresolved instance reference",
            ErrorCode::E309 => "external parameter type",
            ErrorCode::E310 => "reference cycle",
            // Derivation Errors
            ErrorCode::E400 => "missing derivation lookup",
            ErrorCode::E401 => "empty array reference",
            ErrorCode::E402 => "element count mismatch",
            ErrorCode::E403 => "unrenderable literal",
            ErrorCode::E404 => "literal for interface type",
            // Template Errors
            ErrorCode::E500 => "unknown template placeholder",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E208.to_string(), "E208");
        assert_eq!(ErrorCode::E310.to_string(), "E310");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E101.description(), "mis-cased key");
        assert_eq!(ErrorCode::E206.description(), "assignments and elements both present");
        assert_eq!(ErrorCode::E304.description(), "duplicate named instance");
    }
}
