//! Registrar CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info, warn};

use registrar_cli::{
    Args,
    error_adapter::{Reportable, diagnostic_reportables, to_reportables},
};

fn render(reportable: &Reportable<'_>) -> String {
    let reporter = miette::GraphicalReportHandler::new();
    let mut writer = String::new();
    reporter
        .render_report(&mut writer, reportable)
        .expect("Writing to String buffer is infallible");
    writer
}

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Registrar");
    debug!(args:?; "Parsed arguments");

    match registrar_cli::run(&args) {
        Ok(outcome) => {
            let diagnostics = outcome.output.diagnostics();
            for (diagnostic, reportable) in diagnostics
                .iter()
                .zip(diagnostic_reportables(diagnostics, &outcome.source))
            {
                if diagnostic.is_error() {
                    error!("{}", render(&reportable));
                } else {
                    warn!("{}", render(&reportable));
                }
            }
            print!("{}", registrar_cli::summary(&outcome.output));
            if outcome.output.has_errors() {
                process::exit(1);
            }
        }
        Err(err) => {
            // Render each diagnostic independently
            for reportable in to_reportables(&err) {
                error!("{}", render(&reportable));
            }
            process::exit(1);
        }
    }

    info!("Completed successfully");
}
