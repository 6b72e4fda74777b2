//! Type-reference grammar.
//!
//! Type tokens in registry descriptions take exactly one of four forms:
//!
//! | token      | array | nullable |
//! |------------|-------|----------|
//! | `Name`     | no    | no       |
//! | `Name?`    | no    | yes      |
//! | `Name[]`   | yes   | no       |
//! | `Name[]?`  | yes   | yes      |
//!
//! `Name?[]` (a nullable element inside an array) is rejected. The grammar is
//! purely literal: generic arguments and assembly qualification are not
//! interpreted, and the base name is checked only for the grammar's own
//! punctuation.

use std::fmt;

use thiserror::Error;

/// Human-readable list of the supported forms, used in error messages.
pub const SUPPORTED_FORMS: &str = "`Name`, `Name?`, `Name[]`, `Name[]?`";

/// A parsed type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    base: String,
    is_array: bool,
    is_nullable: bool,
    is_element_nullable: bool,
}

/// Error returned for tokens outside the type-reference grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type reference `{token}`: expected one of {SUPPORTED_FORMS}")]
pub struct TypeRefError {
    token: String,
}

impl TypeRefError {
    fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }

    /// The offending token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl TypeRef {
    /// Parse a type token.
    ///
    /// Rules are checked in order: `Name[]?`, `Name[]`, `Name?`, `Name`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeRefError`] when the base name is blank, still carries
    /// grammar punctuation (e.g. `Name?[]`), or contains whitespace.
    ///
    /// # Example
    ///
    /// ```
    /// # use registrar_core::type_ref::TypeRef;
    /// let ty = TypeRef::parse("System.Int32[]?").unwrap();
    /// assert_eq!(ty.base(), "System.Int32");
    /// assert!(ty.is_array());
    /// assert!(ty.is_nullable());
    ///
    /// assert!(TypeRef::parse("System.Int32?[]").is_err());
    /// ```
    pub fn parse(token: &str) -> Result<Self, TypeRefError> {
        let trimmed = token.trim();

        let (base, is_array, is_nullable) = if let Some(rest) = trimmed.strip_suffix("[]?") {
            (rest, true, true)
        } else if let Some(rest) = trimmed.strip_suffix("[]") {
            if rest.ends_with('?') {
                return Err(TypeRefError::new(token));
            }
            (rest, true, false)
        } else if let Some(rest) = trimmed.strip_suffix('?') {
            (rest, false, true)
        } else {
            (trimmed, false, false)
        };

        let malformed = base.is_empty()
            || base
                .chars()
                .any(|c| matches!(c, '?' | '[' | ']') || c.is_whitespace());
        if malformed {
            return Err(TypeRefError::new(token));
        }

        Ok(Self {
            base: base.to_string(),
            is_array,
            is_nullable,
            is_element_nullable: false,
        })
    }

    /// Build a plain, non-array, non-nullable reference.
    pub fn plain(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            is_array: false,
            is_nullable: false,
            is_element_nullable: false,
        }
    }

    /// The base type name without array or nullable markers.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Whether the container (the whole value) may be null.
    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    /// Whether array elements may be null. The grammar never sets this; it is
    /// declared separately on parameters.
    pub fn is_element_nullable(&self) -> bool {
        self.is_element_nullable
    }

    /// Mark the elements of an array reference as nullable.
    pub fn with_element_nullable(mut self, is_element_nullable: bool) -> Self {
        self.is_element_nullable = is_element_nullable;
        self
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if self.is_array {
            write!(f, "[]")?;
        }
        if self.is_nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Strategy for generating dotted base names such as `Ns.Sub.Foo`.
    fn base_name_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[A-Za-z_][A-Za-z0-9_]{0,12}", 1..4).prop_map(|parts| parts.join("."))
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every supported form round-trips the base name and exactly its flags.
    fn check_supported_forms(base: &str) -> Result<(), TestCaseError> {
        let cases = [
            (base.to_string(), false, false),
            (format!("{base}?"), false, true),
            (format!("{base}[]"), true, false),
            (format!("{base}[]?"), true, true),
        ];

        for (token, is_array, is_nullable) in cases {
            let parsed = TypeRef::parse(&token);
            prop_assert!(parsed.is_ok(), "`{token}` failed to parse: {parsed:?}");
            let parsed = parsed.unwrap();
            prop_assert_eq!(parsed.base(), base);
            prop_assert_eq!(parsed.is_array(), is_array);
            prop_assert_eq!(parsed.is_nullable(), is_nullable);
            prop_assert!(!parsed.is_element_nullable());
        }
        Ok(())
    }

    /// `T?[]` never parses.
    fn check_nullable_element_array_fails(base: &str) -> Result<(), TestCaseError> {
        let token = format!("{base}?[]");
        prop_assert!(TypeRef::parse(&token).is_err(), "`{token}` should fail");
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn supported_forms_round_trip(base in base_name_strategy()) {
            check_supported_forms(&base)?;
        }

        #[test]
        fn nullable_element_array_fails(base in base_name_strategy()) {
            check_nullable_element_array_fails(&base)?;
        }
    }
}
