use std::{fs, path::PathBuf};

use tempfile::tempdir;

use registrar::RegistrarError;
use registrar_cli::{Args, run, summary};

/// Collects all .yaml files from a directory
fn collect_yaml_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yaml")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

/// Demos live at the workspace root, not in the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args(input: &PathBuf, output: Option<String>) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output,
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let valid_demos = collect_yaml_files(demos_path());
    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let output_filename = format!(
            "{}.json",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        match run(&args(demo_path, Some(output_path.to_string_lossy().to_string()))) {
            Ok(outcome) if !outcome.output.has_errors() => {
                let json = fs::read_to_string(&output_path).expect("token file written");
                assert!(json.contains("\"RegistryClassName\""));
                assert!(!summary(&outcome.output).is_empty());
            }
            Ok(outcome) => {
                let codes: Vec<_> = outcome
                    .output
                    .diagnostics()
                    .iter()
                    .filter(|d| d.is_error())
                    .map(|d| d.code())
                    .collect();
                failed_demos.push((demo_path.clone(), format!("errors {codes:?}")));
            }
            Err(err) => failed_demos.push((demo_path.clone(), err.to_string())),
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed_demos.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let error_demos = collect_yaml_files(demos_path().join("errors"));
    assert!(!error_demos.is_empty(), "No error demos found in demos/errors/");

    let mut unexpected_successes = Vec::new();

    for demo_path in &error_demos {
        match run(&args(demo_path, None)) {
            Ok(outcome) if outcome.output.has_errors() => {}
            Ok(_) => unexpected_successes.push(demo_path.clone()),
            Err(err) => {
                assert!(
                    matches!(err, RegistrarError::Compile { .. }),
                    "{}: expected a compile error, got {err}",
                    demo_path.display()
                );
            }
        }
    }

    if !unexpected_successes.is_empty() {
        eprintln!("\nError demos that succeeded unexpectedly:");
        for path in &unexpected_successes {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpected_successes.len()
        );
    }
}

#[test]
fn e2e_unresolved_reference_keeps_model() {
    let demo = demos_path().join("errors").join("unresolved_reference.yaml");
    let outcome = run(&args(&demo, None)).expect("resolution errors keep the model");

    assert!(outcome.output.has_errors());
    assert!(outcome.output.instance_tokens("Head").is_none());
    assert!(summary(&outcome.output).starts_with("Demo.Generated.Registry (0 instances)"));
}

#[test]
fn e2e_wiring_summary() {
    let demo = demos_path().join("wiring.yaml");
    let outcome = run(&args(&demo, None)).expect("wiring demo should build");

    let text = summary(&outcome.output);
    assert!(text.starts_with("Shop.Generated.Services (4 instances)"));
    assert!(text.contains(
        "  Rules: Shop.Core.IPriceRule[] = new Shop.Core.Discount[] { Services.SeasonalInternal, Services.LoyaltyInternal }"
    ));

    let catalog = outcome.output.instance_tokens("MainCatalog").unwrap();
    assert_eq!(
        catalog["InitializerArguments"].as_text(),
        Some(
            "rules: new Shop.Core.Discount[] { Services.SeasonalInternal, Services.LoyaltyInternal }, \
             currency: Shop.Core.Currency.Euro, fallback: Services.MainCatalogInternal, \
             tags: new System.String[] { }"
        )
    );
}

#[test]
fn e2e_missing_input_is_io_error() {
    let missing = demos_path().join("does-not-exist.yaml");
    let result = run(&args(&missing, None));
    assert!(matches!(result, Err(RegistrarError::Io(_))));
}
