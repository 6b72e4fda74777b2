//! Registrar - compile YAML registry descriptions into source-generation tokens.
//!
//! A registry description declares classes, interfaces, initializer
//! parameters and named instances. This crate runs the front-end pipeline
//! (ingestion, validation, normalization, resolution) and derives the flat
//! token maps a template renderer uses to emit registry and accessor sources.

pub mod config;
pub mod graph;
pub mod template;
pub mod tokens;

mod error;

pub use registrar_core::{builtin_types, canonical, identifier, provenance, raw, type_ref};
pub use registrar_parser::{Compilation, error as diagnostics, resolve::ResolvedModel};

pub use error::RegistrarError;

use std::{fs, path::Path};

use chrono::Utc;
use indexmap::IndexMap;
use log::{debug, info, trace, warn};

use registrar_parser::{
    error::{Diagnostic, ParseError},
    normalize::NormalizeContext,
};

use config::AppConfig;
use graph::InstanceGraph;
use template::{TemplateError, TemplateRenderer, TemplateStore, TokenSchema};
use tokens::{DerivationContext, TokenMap};

/// Everything a build produced: the resolved model, the tokens of every
/// instance that derived cleanly and the diagnostics of all phases.
#[derive(Debug, Clone)]
pub struct RegistryOutput {
    model: ResolvedModel,
    tokens: TokenMap,
    instances: IndexMap<String, TokenMap>,
    initialization_order: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl RegistryOutput {
    pub fn model(&self) -> &ResolvedModel {
        &self.model
    }

    /// Registry-level tokens, including every instance map under `Instances`.
    pub fn tokens(&self) -> &TokenMap {
        &self.tokens
    }

    /// Token maps by instance name, in declaration order.
    pub fn instances(&self) -> &IndexMap<String, TokenMap> {
        &self.instances
    }

    pub fn instance_tokens(&self, name: &str) -> Option<&TokenMap> {
        self.instances.get(name)
    }

    /// Instance names with referenced instances first.
    pub fn initialization_order(&self) -> &[String] {
        &self.initialization_order
    }

    /// Diagnostics from every phase, errors of skipped instances included.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` when some instance was left out because of an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Builder for compiling registry descriptions and deriving their tokens.
///
/// # Examples
///
/// ```rust
/// use registrar::{RegistryBuilder, config::AppConfig};
///
/// let source = r#"
/// CodeGen:
///   RegistryClassName: Registry
///   GeneratedCodePath: Generated
///   NamespaceName: App.Generated
///   InitializerName: Initialize
/// Namespaces:
///   - Name: Ns
///     Classes:
///       - Name: Foo
///         Parameters:
///           - { Name: count, Class: System.Int32 }
/// NamedInstances:
///   - Name: MyFoo
///     Class: Ns.Foo
///     Assignments:
///       - { Parameter: count, Value: "5" }
/// "#;
///
/// let builder = RegistryBuilder::new(AppConfig::default());
/// let output = builder.build(source, "registry.yaml").expect("Failed to build");
/// assert!(!output.has_errors());
///
/// let tokens = output.instance_tokens("MyFoo").unwrap();
/// assert_eq!(
///     tokens["InitializerCall"].as_text(),
///     Some("_MyFooInstance.Initialize(count: 5)")
/// );
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    config: AppConfig,
}

impl RegistryBuilder {
    /// Create a new builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration with normalizer and template settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Normalizer settings for one compilation, stamped with the current time.
    pub fn normalize_context(&self) -> NormalizeContext {
        let normalize = self.config.normalize();
        NormalizeContext::new(normalize.tool_id(), Utc::now())
            .with_allow_int_to_float(normalize.allow_int_to_float())
    }

    /// Compile `source` into a resolved model.
    ///
    /// Instances that failed resolution are left out of the model; their
    /// errors are part of the returned diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError::Compile`] carrying every diagnostic when no
    /// model could be produced: the document could not be ingested, or
    /// validation or normalization reported an error.
    pub fn compile(
        &self,
        source: &str,
        source_path: &str,
    ) -> Result<(ResolvedModel, Vec<Diagnostic>), RegistrarError> {
        info!(source_path; "Compiling registry description");

        let compilation = registrar_parser::compile(source, source_path, &self.normalize_context());
        let (model, diagnostics) = match compilation.into_parts() {
            (Some(model), diagnostics) => (model, diagnostics),
            (None, diagnostics) => {
                return Err(RegistrarError::new_compile_error(
                    ParseError::new(diagnostics),
                    source,
                ));
            }
        };

        debug!(
            instances = model.instances().len(),
            diagnostics = diagnostics.len();
            "Registry description compiled"
        );
        trace!(model:?; "Resolved model");
        Ok((model, diagnostics))
    }

    /// Read and compile the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError::Io`] when the file cannot be read, otherwise
    /// as [`compile`](Self::compile).
    pub fn compile_file(
        &self,
        path: &Path,
    ) -> Result<(ResolvedModel, Vec<Diagnostic>), RegistrarError> {
        let source = fs::read_to_string(path)?;
        self.compile(&source, &path.to_string_lossy())
    }

    /// Compile `source`, order its instances and derive all tokens.
    ///
    /// An instance that fails resolution or derivation is left out of the
    /// output and its siblings are still derived. Check
    /// [`RegistryOutput::has_errors`] before generating sources.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError::Compile`] when no model could be produced,
    /// as [`compile`](Self::compile).
    pub fn build(&self, source: &str, source_path: &str) -> Result<RegistryOutput, RegistrarError> {
        let (model, mut diagnostics) = self.compile(source, source_path)?;

        let graph = InstanceGraph::build(&model);
        diagnostics.extend(graph.cycle_diagnostics());
        let initialization_order = graph.initialization_order();

        let cx = DerivationContext::new(&model);
        let derivation = tokens::derive_all(&cx);
        let tokens = tokens::registry_tokens(&cx, &derivation, &initialization_order);

        let (instances, derivation_diagnostics) = derivation.into_parts();
        diagnostics.extend(derivation_diagnostics);

        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        if errors > 0 {
            warn!(errors, instances = instances.len(); "Registry tokens derived with errors");
        } else {
            info!(instances = instances.len(); "Registry tokens derived");
        }
        Ok(RegistryOutput {
            model,
            tokens,
            instances,
            initialization_order,
            diagnostics,
        })
    }

    /// Check a template body against a token schema using the configured
    /// strictness.
    pub fn check_template(&self, name: &str, body: &str, schema: TokenSchema) -> Vec<Diagnostic> {
        template::validate_placeholders(name, body, schema, self.config.templates().strict())
    }

    /// Fetch a template from `store`, validate its placeholders and render it
    /// with `renderer`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError::Template`] when the template is missing,
    /// names unknown tokens in strict mode, or fails to render.
    pub fn render_template(
        &self,
        store: &impl TemplateStore,
        renderer: &impl TemplateRenderer,
        name: &str,
        schema: TokenSchema,
        tokens: &TokenMap,
    ) -> Result<String, RegistrarError> {
        let body = store.template(name)?;

        let diagnostics = self.check_template(name, body, schema);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(TemplateError::UnknownTokens {
                name: name.to_string(),
                diagnostics,
            }
            .into());
        }
        for diagnostic in &diagnostics {
            warn!(template = name, message = diagnostic.message(); "Unknown template placeholder");
        }

        let rendered = renderer.render(body, tokens)?;
        info!(template = name, bytes = rendered.len(); "Template rendered");
        Ok(rendered)
    }
}
