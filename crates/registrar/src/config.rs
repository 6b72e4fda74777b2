//! Configuration types for the Registrar pipeline.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so
//! a partial (or empty) TOML document is a valid configuration.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`NormalizeConfig`] - Settings for the normalizer.
//! - [`TemplateConfig`] - Settings for template placeholder validation.
//!
//! # Example
//!
//! ```
//! # use registrar::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.normalize().tool_id(), "registrar");
//! assert!(config.templates().strict());
//! ```

use serde::Deserialize;

use registrar_parser::normalize::DEFAULT_TOOL_ID;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Normalizer section.
    #[serde(default)]
    normalize: NormalizeConfig,

    /// Template section.
    #[serde(default)]
    templates: TemplateConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    ///
    /// # Arguments
    ///
    /// * `normalize` - Normalizer settings.
    /// * `templates` - Template validation settings.
    pub fn new(normalize: NormalizeConfig, templates: TemplateConfig) -> Self {
        Self {
            normalize,
            templates,
        }
    }

    /// Returns the normalizer configuration.
    pub fn normalize(&self) -> &NormalizeConfig {
        &self.normalize
    }

    /// Returns the template configuration.
    pub fn templates(&self) -> &TemplateConfig {
        &self.templates
    }
}

/// Normalizer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeConfig {
    /// Tool identifier recorded in every provenance entry.
    #[serde(default = "default_tool_id")]
    tool_id: String,

    /// Accept integer literals for floating-point parameters.
    #[serde(default)]
    allow_int_to_float: bool,
}

impl NormalizeConfig {
    pub fn new(tool_id: impl Into<String>, allow_int_to_float: bool) -> Self {
        Self {
            tool_id: tool_id.into(),
            allow_int_to_float,
        }
    }

    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    pub fn allow_int_to_float(&self) -> bool {
        self.allow_int_to_float
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self::new(default_tool_id(), false)
    }
}

/// Template validation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Report unknown placeholders as errors instead of warnings.
    #[serde(default = "default_strict")]
    strict: bool,
}

impl TemplateConfig {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn strict(&self) -> bool {
        self.strict
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self::new(default_strict())
    }
}

fn default_tool_id() -> String {
    DEFAULT_TOOL_ID.to_string()
}

fn default_strict() -> bool {
    true
}
