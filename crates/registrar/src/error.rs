//! Error types for Registrar operations.
//!
//! This module provides the main error type [`RegistrarError`] which wraps
//! the failures a host can hit while compiling a registry description and
//! feeding its tokens to a template renderer.

use std::io;

use thiserror::Error;

use registrar_parser::error::ParseError;

use crate::template::TemplateError;

/// The main error type for Registrar operations.
///
/// # Diagnostic Variants
///
/// The `Compile` variant carries every diagnostic produced by the pipeline
/// together with the source text, so hosts can render them with source
/// excerpts.
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Compile { err: ParseError, src: String },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistrarError {
    /// Create a new `Compile` error with the associated source text.
    pub fn new_compile_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Compile {
            err,
            src: src.into(),
        }
    }
}
