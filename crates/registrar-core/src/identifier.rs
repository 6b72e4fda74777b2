//! Identifier shape rules.
//!
//! Each name in a registry description plays a role with its own rule:
//!
//! - [`IdentifierRole::Identifier`] - `[A-Za-z_][A-Za-z0-9_]*` (parameter and initializer names)
//! - [`IdentifierRole::PascalCase`] - an identifier starting with an uppercase letter
//!   (registry class, class and named-instance names)
//! - [`IdentifierRole::InterfaceName`] - `I` followed by an uppercase letter, then identifier characters
//! - [`IdentifierRole::Namespace`] - dot-separated segments, each a valid identifier
//!   (namespaces and qualified type names)

use std::{fmt, sync::LazyLock};

use regex::Regex;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

static PASCAL_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9_]*$").expect("pascal-case pattern is valid"));

static INTERFACE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^I[A-Z][A-Za-z0-9_]*$").expect("interface pattern is valid"));

/// The role a name plays, which selects the rule it must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierRole {
    Identifier,
    PascalCase,
    InterfaceName,
    Namespace,
}

impl IdentifierRole {
    /// Check `name` against the rule for this role.
    pub fn accepts(self, name: &str) -> bool {
        match self {
            Self::Identifier => is_identifier(name),
            Self::PascalCase => is_pascal_case(name),
            Self::InterfaceName => is_interface_name(name),
            Self::Namespace => is_namespace(name),
        }
    }

    /// Short description of the rule, suitable for help text.
    pub fn rule(self) -> &'static str {
        match self {
            Self::Identifier => {
                "must start with a letter or underscore and contain only letters, digits and underscores"
            }
            Self::PascalCase => {
                "must start with an uppercase letter and contain only letters, digits and underscores"
            }
            Self::InterfaceName => "must start with `I` followed by an uppercase letter",
            Self::Namespace => "every dot-separated segment must be a valid identifier",
        }
    }
}

impl fmt::Display for IdentifierRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::PascalCase => write!(f, "PascalCase identifier"),
            Self::InterfaceName => write!(f, "interface name"),
            Self::Namespace => write!(f, "namespace"),
        }
    }
}

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

pub fn is_pascal_case(name: &str) -> bool {
    PASCAL_CASE.is_match(name)
}

pub fn is_interface_name(name: &str) -> bool {
    INTERFACE_NAME.is_match(name)
}

pub fn is_namespace(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_identifier)
}

/// Join a namespace and a simple name into a qualified name.
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// Qualify `name` with `namespace` unless it already contains a dot.
pub fn qualify_if_simple(namespace: &str, name: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        qualify(namespace, name)
    }
}

/// Split a qualified name into `(namespace, simple name)`.
pub fn split_qualified(qualified: &str) -> (&str, &str) {
    match qualified.rsplit_once('.') {
        Some((namespace, name)) => (namespace, name),
        None => ("", qualified),
    }
}
