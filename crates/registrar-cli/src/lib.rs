//! CLI logic for the Registrar registry compiler.
//!
//! This module contains the core CLI logic: load configuration, compile the
//! input description, derive its tokens and optionally write them as JSON.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fmt::Write as _, fs, io};

use log::info;

use registrar::{RegistrarError, RegistryBuilder, RegistryOutput, tokens::TokenMap};

/// Result of a run that produced a model.
#[derive(Debug)]
pub struct Outcome {
    /// Source text of the input description.
    pub source: String,
    /// Model, tokens of the instances that derived cleanly and all
    /// diagnostics.
    pub output: RegistryOutput,
}

/// Run the Registrar CLI application
///
/// This function processes the input file through the Registrar pipeline
/// and, when an output path is given, writes the registry tokens to it.
/// Instances skipped because of an error are absent from the written tokens;
/// callers check [`RegistryOutput::has_errors`].
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `RegistrarError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Descriptions that could not be compiled into a model
pub fn run(args: &Args) -> Result<Outcome, RegistrarError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing registry description"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let builder = RegistryBuilder::new(app_config);
    let output = builder.build(&source, &args.input)?;

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(output.tokens()).map_err(io::Error::from)?;
        fs::write(path, json)?;
        info!(output_file = path; "Tokens exported successfully");
    }

    Ok(Outcome { source, output })
}

/// One line per instance in initialization order, under a registry header.
pub fn summary(output: &RegistryOutput) -> String {
    let code_gen = output.model().configuration().code_gen();
    let mut text = format!(
        "{}.{} ({} instances)\n",
        code_gen.namespace_name(),
        code_gen.registry_class_name(),
        output.instances().len()
    );

    for name in output.initialization_order() {
        let Some(tokens) = output.instance_tokens(name) else {
            continue;
        };
        let _ = writeln!(
            text,
            "  {}: {} = {}",
            name,
            text_token(tokens, "ExternalReturnType"),
            text_token(tokens, "InitializationExpression")
        );
    }
    text
}

fn text_token<'a>(tokens: &'a TokenMap, key: &str) -> &'a str {
    tokens
        .get(key)
        .and_then(|value| value.as_text())
        .unwrap_or_default()
}
