//! Static token schema.
//!
//! A closed table of the token names each token map carries and the kind of
//! value stored under each name. Template placeholders are checked against
//! it before rendering.

use std::fmt;

/// The kind of value a token holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Flag,
    /// A list of token maps described by the inner schema.
    List(TokenSchema),
}

/// A token map shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSchema {
    Registry,
    Enum,
    Instance,
    Assignment,
    Element,
}

const REGISTRY: &[(&str, TokenKind)] = &[
    ("RegistryClassName", TokenKind::Text),
    ("NamespaceName", TokenKind::Text),
    ("GeneratedCodePath", TokenKind::Text),
    ("InitializerName", TokenKind::Text),
    ("FailFast", TokenKind::Flag),
    ("Enums", TokenKind::List(TokenSchema::Enum)),
    ("Instances", TokenKind::List(TokenSchema::Instance)),
];

const ENUM: &[(&str, TokenKind)] = &[("Name", TokenKind::Text)];

const INSTANCE: &[(&str, TokenKind)] = &[
    ("Name", TokenKind::Text),
    ("QualifiedClassName", TokenKind::Text),
    ("ElementTypeName", TokenKind::Text),
    ("BackingFieldName", TokenKind::Text),
    ("AccessorName", TokenKind::Text),
    ("InternalAccessorName", TokenKind::Text),
    ("ExternalReturnType", TokenKind::Text),
    ("InternalReturnType", TokenKind::Text),
    ("HasExposureInterface", TokenKind::Flag),
    ("IsArray", TokenKind::Flag),
    ("InitializerName", TokenKind::Text),
    ("RegistryClassName", TokenKind::Text),
    ("InitializationExpression", TokenKind::Text),
    ("HasAssignments", TokenKind::Flag),
    ("HasElements", TokenKind::Flag),
    ("InitializerArguments", TokenKind::Text),
    ("InitializerCall", TokenKind::Text),
    ("Assignments", TokenKind::List(TokenSchema::Assignment)),
    ("Elements", TokenKind::List(TokenSchema::Element)),
];

const ASSIGNMENT: &[(&str, TokenKind)] = &[
    ("ParameterName", TokenKind::Text),
    ("ParameterType", TokenKind::Text),
    ("Expression", TokenKind::Text),
    ("IsNull", TokenKind::Flag),
];

const ELEMENT: &[(&str, TokenKind)] = &[
    ("Index", TokenKind::Text),
    ("Expression", TokenKind::Text),
];

impl TokenSchema {
    /// Every token of this schema, in derivation order.
    pub fn fields(self) -> &'static [(&'static str, TokenKind)] {
        match self {
            Self::Registry => REGISTRY,
            Self::Enum => ENUM,
            Self::Instance => INSTANCE,
            Self::Assignment => ASSIGNMENT,
            Self::Element => ELEMENT,
        }
    }

    pub fn field(self, name: &str) -> Option<TokenKind> {
        self.fields()
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, kind)| *kind)
    }

    pub fn field_names(self) -> impl Iterator<Item = &'static str> {
        self.fields().iter().map(|(name, _)| *name)
    }
}

impl fmt::Display for TokenSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => write!(f, "Registry"),
            Self::Enum => write!(f, "Enum"),
            Self::Instance => write!(f, "Instance"),
            Self::Assignment => write!(f, "Assignment"),
            Self::Element => write!(f, "Element"),
        }
    }
}

#[cfg(test)]
mod tests {
    use registrar_parser::{compile, normalize::NormalizeContext};

    use super::*;
    use crate::{
        graph::InstanceGraph,
        tokens::{DerivationContext, TokenMap, TokenValue, derive_all, registry_tokens},
    };

    const SOURCE: &str = r#"
CodeGen:
  RegistryClassName: Registry
  GeneratedCodePath: Generated
  NamespaceName: App.Generated
  InitializerName: Initialize
  Enums: [Ns.Color]
Namespaces:
  - Name: Ns
    Interfaces:
      - Name: IFoo
    Classes:
      - Name: Foo
        Interface: IFoo
        Implements: [IFoo]
        Parameters:
          - { Name: count, Class: System.Int32 }
NamedInstances:
  - Name: MyFoo
    Class: Ns.Foo
    Assignments:
      - { Parameter: count, Value: "5" }
  - Name: Foos
    Class: "Ns.Foo[]"
    Elements:
      - Instance: MyFoo
"#;

    /// Assert that `tokens` carries exactly the fields of `schema`, in order
    /// and of the declared kinds, descending into lists.
    fn assert_shape(schema: TokenSchema, tokens: &TokenMap) {
        let emitted: Vec<_> = tokens.keys().map(String::as_str).collect();
        let declared: Vec<_> = schema.field_names().collect();
        assert_eq!(emitted, declared, "{schema} tokens");

        for (name, value) in tokens {
            match (schema.field(name), value) {
                (Some(TokenKind::Text), TokenValue::Text(_)) => {}
                (Some(TokenKind::Flag), TokenValue::Flag(_)) => {}
                (Some(TokenKind::List(item)), TokenValue::List(items)) => {
                    for tokens in items {
                        assert_shape(item, tokens);
                    }
                }
                (kind, value) => panic!("{schema}.{name}: declared {kind:?}, emitted {value:?}"),
            }
        }
    }

    #[test]
    fn test_field_lookup() {
        assert_eq!(TokenSchema::Instance.field("Name"), Some(TokenKind::Text));
        assert_eq!(TokenSchema::Instance.field("IsArray"), Some(TokenKind::Flag));
        assert_eq!(
            TokenSchema::Registry.field("Instances"),
            Some(TokenKind::List(TokenSchema::Instance))
        );
        assert_eq!(TokenSchema::Element.field("Name"), None);
    }

    #[test]
    fn test_field_names_are_unique() {
        for schema in [
            TokenSchema::Registry,
            TokenSchema::Enum,
            TokenSchema::Instance,
            TokenSchema::Assignment,
            TokenSchema::Element,
        ] {
            let mut names: Vec<_> = schema.field_names().collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), total, "duplicate token in {schema}");
        }
    }

    #[test]
    fn test_schema_matches_derived_tokens() {
        let compilation = compile(SOURCE, "registry.yaml", &NormalizeContext::default());
        assert!(compilation.is_success(), "{:?}", compilation.diagnostics());
        let model = compilation.model().unwrap();

        let cx = DerivationContext::new(model);
        let derivation = derive_all(&cx);
        assert!(derivation.diagnostics().is_empty());
        let order = InstanceGraph::build(model).initialization_order();
        let tokens = registry_tokens(&cx, &derivation, &order);

        let instances = tokens["Instances"].as_list().unwrap();
        assert_eq!(instances.len(), 2);
        assert!(instances.iter().any(|t| !t["Assignments"].as_list().unwrap().is_empty()));
        assert!(instances.iter().any(|t| !t["Elements"].as_list().unwrap().is_empty()));
        assert!(!tokens["Enums"].as_list().unwrap().is_empty());

        assert_shape(TokenSchema::Registry, &tokens);
    }
}
