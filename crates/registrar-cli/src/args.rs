//! Command-line argument definitions for the Registrar CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the input description, the optional
//! token output file, configuration file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Registrar registry compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input registry description (YAML)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Write the derived registry tokens to this file as JSON
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
