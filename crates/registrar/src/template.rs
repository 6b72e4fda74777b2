//! Template collaborator contracts.
//!
//! Rendering is done by an external engine. This module defines what the
//! pipeline expects from it:
//!
//! - [`TemplateStore`] - looks templates up by name
//! - [`TemplateRenderer`] - substitutes a token map into a template body
//! - [`validate_placeholders`] - checks a template's `{{ name }}` placeholders
//!   against the static [`TokenSchema`] table before anything is rendered
//!
//! Placeholders follow the usual mustache shape. `{{#each List}}` switches to
//! the item schema of `List` until the matching `{{/each}}`; `{{#if Name}}`
//! and `{{#unless Name}}` check `Name` in the current schema. `this`, `else`,
//! `@`-variables and `{{! comments }}` are not checked.

mod schema;

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use registrar_core::provenance::ProvenanceOrigin;
use registrar_parser::error::{Diagnostic, ErrorCode, Severity};

use crate::tokens::TokenMap;

pub use schema::{TokenKind, TokenSchema};

/// Errors reported by template collaborators.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{0}` not found")]
    NotFound(String),

    #[error("template `{name}` references {} unknown token(s)", .diagnostics.len())]
    UnknownTokens {
        name: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("failed to render template: {0}")]
    Render(String),
}

/// Source of template bodies.
pub trait TemplateStore {
    /// Look up a template body by name.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] when no template has that name.
    fn template(&self, name: &str) -> Result<&str, TemplateError>;
}

/// Engine that substitutes tokens into a template body.
pub trait TemplateRenderer {
    fn render(&self, template: &str, tokens: &TokenMap) -> Result<String, TemplateError>;
}

/// In-memory [`TemplateStore`], in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    templates: IndexMap<String, String>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_template(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(name, body);
        self
    }

    /// Add or replace a template.
    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(name.into(), body.into());
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn template(&self, name: &str) -> Result<&str, TemplateError> {
        self.templates
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }
}

/// A parsed `{{ … }}` tag.
#[derive(Debug, PartialEq, Eq)]
enum Tag<'a> {
    Value(&'a str),
    Each(&'a str),
    Condition(&'a str),
    EndEach,
    Ignored,
}

impl<'a> Tag<'a> {
    fn parse(inner: &'a str) -> Self {
        let inner = inner.trim_start_matches('{').trim_end_matches('}').trim();
        let first_word = |text: &'a str| text.split_whitespace().next().unwrap_or_default();

        if let Some(rest) = inner.strip_prefix("#each") {
            return Self::Each(first_word(rest));
        }
        if let Some(rest) = inner
            .strip_prefix("#if")
            .or_else(|| inner.strip_prefix("#unless"))
        {
            return Self::Condition(first_word(rest));
        }
        if inner.starts_with("/each") {
            return Self::EndEach;
        }

        let name = first_word(inner);
        let ignored = name.is_empty()
            || name == "this"
            || name == "else"
            || name.starts_with(['@', '!', '/', '#', '>']);
        if ignored { Self::Ignored } else { Self::Value(name) }
    }
}

/// Check every placeholder of `template` against `schema`.
///
/// Unknown names produce E500 diagnostics located at the placeholder's line
/// and column. They are errors when `strict` is set and warnings otherwise.
/// Placeholders inside an `{{#each}}` over an unknown list are not checked.
pub fn validate_placeholders(
    template_name: &str,
    template: &str,
    schema: TokenSchema,
    strict: bool,
) -> Vec<Diagnostic> {
    let severity = if strict {
        Severity::Error
    } else {
        Severity::Warning
    };
    let mut scopes: Vec<Option<TokenSchema>> = vec![Some(schema)];
    let mut diagnostics = Vec::new();

    let mut offset = 0;
    while let Some(start) = template[offset..].find("{{") {
        let open = offset + start;
        let Some(len) = template[open + 2..].find("}}") else {
            break;
        };
        let inner = &template[open + 2..open + 2 + len];
        offset = open + 2 + len + 2;

        let scope = scopes.last().copied().flatten();
        let unknown = |name: &str, reason: &str, scope: TokenSchema| {
            let (line, column) = position(template, open);
            Diagnostic::error(format!(
                "placeholder `{name}` in template `{template_name}` {reason}"
            ))
            .with_code(ErrorCode::E500)
            .with_severity(severity)
            .with_location(
                ProvenanceOrigin::new(template_name, name).with_position(line, Some(column)),
            )
            .with_help(format!(
                "tokens of the `{scope}` map: {}",
                scope.field_names().collect::<Vec<_>>().join(", ")
            ))
        };

        match Tag::parse(inner) {
            Tag::Value(name) | Tag::Condition(name) => {
                if let Some(scope) = scope {
                    if scope.field(name).is_none() {
                        diagnostics.push(unknown(name, "names an unknown token", scope));
                    }
                }
            }
            Tag::Each(name) => {
                let item = match scope.map(|scope| (scope, scope.field(name))) {
                    Some((_, Some(TokenKind::List(item)))) => Some(item),
                    Some((scope, Some(_))) => {
                        diagnostics.push(unknown(name, "is not a list", scope));
                        None
                    }
                    Some((scope, None)) => {
                        diagnostics.push(unknown(name, "names an unknown token", scope));
                        None
                    }
                    None => None,
                };
                scopes.push(item);
            }
            Tag::EndEach => {
                if scopes.len() > 1 {
                    scopes.pop();
                }
            }
            Tag::Ignored => {}
        }
    }

    debug!(template = template_name, problems = diagnostics.len(); "Placeholders validated");
    diagnostics
}

/// 1-based line and column of the byte offset `at`.
fn position(text: &str, at: usize) -> (usize, usize) {
    let before = &text[..at];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use crate::tokens::TokenValue;

    use super::*;

    /// Replaces top-level `{{Name}}` text tokens only.
    struct FlatRenderer;

    impl TemplateRenderer for FlatRenderer {
        fn render(&self, template: &str, tokens: &TokenMap) -> Result<String, TemplateError> {
            let mut out = template.to_string();
            for (name, value) in tokens {
                if let TokenValue::Text(text) = value {
                    out = out.replace(&format!("{{{{{name}}}}}"), text);
                }
            }
            if out.contains("{{") {
                return Err(TemplateError::Render("unsubstituted placeholder".to_string()));
            }
            Ok(out)
        }
    }

    #[test]
    fn test_memory_store_lookup() {
        let store = MemoryTemplateStore::new().with_template("Registry", "class {{RegistryClassName}}");
        assert_eq!(store.len(), 1);
        assert_eq!(store.template("Registry").unwrap(), "class {{RegistryClassName}}");

        let err = store.template("Accessor").unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(ref name) if name == "Accessor"));
        assert_eq!(err.to_string(), "template `Accessor` not found");
    }

    #[test]
    fn test_renderer_contract() {
        let mut tokens = TokenMap::new();
        tokens.insert("Name".to_string(), "MyFoo".into());
        let rendered = FlatRenderer.render("get {{Name}}", &tokens).unwrap();
        assert_eq!(rendered, "get MyFoo");
        assert!(FlatRenderer.render("get {{Other}}", &tokens).is_err());
    }

    #[test]
    fn test_known_placeholders_pass() {
        let template = "\
public static class {{ RegistryClassName }}
{
{{#each Instances}}
    private static {{InternalReturnType}} {{BackingFieldName}};
{{#if HasAssignments}}    {{InitializerCall}};{{/if}}
{{#each Assignments}}{{ParameterName}}{{/each}}
{{/each}}
}";
        let diagnostics = validate_placeholders("Registry", template, TokenSchema::Registry, true);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_unknown_placeholder_reported_with_position() {
        let template = "class {{RegistryClassName}}\n  {{Bogus}}";
        let diagnostics = validate_placeholders("Registry", template, TokenSchema::Registry, true);
        assert_eq!(diagnostics.len(), 1);

        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.code(), Some(ErrorCode::E500));
        assert!(diagnostic.is_error());
        let location = diagnostic.location().unwrap();
        assert_eq!(location.source_path(), "Registry");
        assert_eq!(location.line(), 2);
        assert_eq!(location.column(), Some(3));
    }

    #[test]
    fn test_lenient_mode_warns() {
        let diagnostics =
            validate_placeholders("Accessor", "{{Missing}}", TokenSchema::Instance, false);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity(), Severity::Warning);
    }

    #[test]
    fn test_each_scopes() {
        // `Name` exists on instances but not on assignments.
        let template = "{{#each Assignments}}{{Name}}{{/each}}{{Name}}";
        let diagnostics = validate_placeholders("Accessor", template, TokenSchema::Instance, true);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location().unwrap().column(), Some(22));
    }

    #[test]
    fn test_each_over_non_list() {
        let template = "{{#each Name}}{{Anything}}{{/each}}";
        let diagnostics = validate_placeholders("Accessor", template, TokenSchema::Instance, true);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message().contains("is not a list"));
    }

    #[test]
    fn test_ignored_tags() {
        let template = "{{! note }}{{#each Elements}}{{@index}}{{this}}{{else}}{{/each}}";
        let diagnostics = validate_placeholders("Accessor", template, TokenSchema::Instance, true);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }
}
