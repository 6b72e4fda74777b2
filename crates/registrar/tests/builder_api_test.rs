//! Integration tests for the RegistryBuilder API
//!
//! These tests verify that the public API works end to end, from YAML text
//! to derived tokens and rendered templates.

use registrar::{
    RegistrarError, RegistryBuilder,
    config::{AppConfig, NormalizeConfig, TemplateConfig},
    diagnostics::ErrorCode,
    template::{MemoryTemplateStore, TemplateError, TemplateRenderer, TokenSchema},
    tokens::{TokenMap, TokenValue},
};

const HEADER: &str = r#"
CodeGen:
  RegistryClassName: Registry
  GeneratedCodePath: Generated
  NamespaceName: App.Generated
  InitializerName: Initialize
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
      - Name: Gauge
        Parameters:
          - { Name: level, Class: System.Double }
      - Name: Bar
        Parameters:
          - { Name: foos, Class: "Foo[]" }
          - { Name: next, Class: "Bar?" }
"#;

fn source(instances: &str) -> String {
    format!("{HEADER}NamedInstances:\n{instances}")
}

fn text<'a>(tokens: &'a TokenMap, key: &str) -> &'a str {
    tokens[key].as_text().expect("text token")
}

/// Substitutes top-level text tokens.
struct FlatRenderer;

impl TemplateRenderer for FlatRenderer {
    fn render(&self, template: &str, tokens: &TokenMap) -> Result<String, TemplateError> {
        let mut out = template.to_string();
        for (name, value) in tokens {
            if let TokenValue::Text(text) = value {
                out = out.replace(&format!("{{{{{name}}}}}"), text);
            }
        }
        Ok(out)
    }
}

#[test]
fn test_builder_api_exists() {
    let _builder = RegistryBuilder::default();
}

#[test]
fn test_integer_literal_becomes_initializer_argument() {
    let source = source(
        r#"
  - Name: MyFoo
    Class: Ns.Foo
    Assignments:
      - { Parameter: count, Value: "5" }
"#,
    );

    let builder = RegistryBuilder::default();
    let output = builder.build(&source, "registry.yaml").expect("Failed to build");
    assert!(!output.has_errors());

    let tokens = output.instance_tokens("MyFoo").expect("MyFoo tokens");
    let assignments = tokens["Assignments"].as_list().unwrap();
    assert_eq!(text(&assignments[0], "Expression"), "5");
    assert_eq!(text(tokens, "InitializerCall"), "_MyFooInstance.Initialize(count: 5)");
    assert!(output.diagnostics().is_empty(), "{:?}", output.diagnostics());
}

#[test]
fn test_empty_array_instance_uses_empty_array_expression() {
    let source = source(
        r#"
  - Name: NoFoos
    Class: "Ns.Foo[]"
"#,
    );

    let output = RegistryBuilder::default()
        .build(&source, "registry.yaml")
        .expect("Failed to build");

    let tokens = output.instance_tokens("NoFoos").unwrap();
    assert_eq!(text(tokens, "QualifiedClassName"), "Ns.Foo[]");
    assert_eq!(text(tokens, "InitializationExpression"), "new Ns.Foo[] { }");
    assert_eq!(tokens["IsArray"], TokenValue::Flag(true));
}

#[test]
fn test_float_literal_for_integer_parameter_fails() {
    let source = source(
        r#"
  - Name: MyFoo
    Class: Ns.Foo
    Assignments:
      - { Parameter: count, Value: "5.5" }
"#,
    );

    let result = RegistryBuilder::default().build(&source, "registry.yaml");
    let Err(RegistrarError::Compile { err, src }) = result else {
        panic!("expected a compile error");
    };
    assert_eq!(src, source);
    assert_eq!(err.error_count(), 1);
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E208));
}

#[test]
fn test_int_to_float_coercion_is_configurable() {
    let source = source(
        r#"
  - Name: MyGauge
    Class: Ns.Gauge
    Assignments:
      - { Parameter: level, Value: "3" }
"#,
    );

    let strict = RegistryBuilder::default().build(&source, "registry.yaml");
    assert!(strict.is_err());

    let config = AppConfig::new(NormalizeConfig::new("registrar", true), TemplateConfig::default());
    let output = RegistryBuilder::new(config)
        .build(&source, "registry.yaml")
        .expect("coercion should be accepted");
    let tokens = output.instance_tokens("MyGauge").unwrap();
    assert_eq!(text(tokens, "InitializerArguments"), "level: 3.0");
}

#[test]
fn test_failed_derivation_keeps_sibling_instances() {
    let source = source(
        r#"
  - Name: Good
    Class: Ns.Foo
    Assignments:
      - { Parameter: count, Value: "1" }
  - Name: NoFoos
    Class: "Ns.Foo[]"
  - Name: BadBar
    Class: Ns.Bar
    Assignments:
      - { Parameter: foos, Instance: NoFoos }
"#,
    );

    let output = RegistryBuilder::default()
        .build(&source, "registry.yaml")
        .expect("derivation errors keep the output");

    assert!(output.has_errors());
    let errors: Vec<_> = output.diagnostics().iter().filter(|d| d.is_error()).collect();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].code(), Some(ErrorCode::E401));

    let good = output.instance_tokens("Good").expect("Good tokens");
    assert_eq!(text(good, "InitializerCall"), "_GoodInstance.Initialize(count: 1)");
    assert!(output.instance_tokens("NoFoos").is_some());
    assert!(output.instance_tokens("BadBar").is_none());

    let names: Vec<_> = output.tokens()["Instances"]
        .as_list()
        .unwrap()
        .iter()
        .map(|tokens| text(tokens, "Name"))
        .collect();
    assert_eq!(names, ["Good", "NoFoos"]);
}

#[test]
fn test_unresolved_reference_keeps_sibling_instances() {
    let source = source(
        r#"
  - Name: Good
    Class: Ns.Foo
  - Name: Dangling
    Class: "Ns.Foo[]"
    Elements:
      - Instance: Nowhere
"#,
    );

    let (model, diagnostics) = RegistryBuilder::default()
        .compile(&source, "registry.yaml")
        .expect("resolution errors keep the model");
    assert!(model.instance("Good").is_some());
    assert!(model.instance("Dangling").is_none());
    assert!(diagnostics.iter().any(|d| d.code() == Some(ErrorCode::E308)));

    let output = RegistryBuilder::default()
        .build(&source, "registry.yaml")
        .expect("resolution errors keep the output");
    assert!(output.has_errors());
    assert!(output.instance_tokens("Good").is_some());
    assert!(output.instance_tokens("Dangling").is_none());
}

#[test]
fn test_cycles_are_reported_as_info() {
    let source = source(
        r#"
  - Name: Ping
    Class: Ns.Bar
    Assignments:
      - { Parameter: next, Instance: Pong }
  - Name: Pong
    Class: Ns.Bar
    Assignments:
      - { Parameter: next, Instance: Ping }
"#,
    );

    let output = RegistryBuilder::default()
        .build(&source, "registry.yaml")
        .expect("cycles are legal");
    let cycles: Vec<_> = output
        .diagnostics()
        .iter()
        .filter(|d| d.code() == Some(ErrorCode::E310))
        .collect();
    assert_eq!(cycles.len(), 1);
    assert_eq!(output.initialization_order(), ["Ping", "Pong"]);

    let pong = output.instance_tokens("Pong").unwrap();
    assert_eq!(text(pong, "InitializerArguments"), "next: Registry.PingInternal");
}

#[test]
fn test_registry_tokens_list_instances_in_initialization_order() {
    let source = source(
        r#"
  - Name: MyBar
    Class: Ns.Bar
    Assignments:
      - { Parameter: foos, Instance: Foos }
  - Name: Foos
    Class: "Ns.Foo[]"
    Elements:
      - Instance: MyFoo
  - Name: MyFoo
    Class: Ns.Foo
"#,
    );

    let output = RegistryBuilder::default()
        .build(&source, "registry.yaml")
        .expect("Failed to build");
    assert_eq!(output.initialization_order(), ["MyFoo", "Foos", "MyBar"]);

    let names: Vec<_> = output.tokens()["Instances"]
        .as_list()
        .unwrap()
        .iter()
        .map(|tokens| text(tokens, "Name"))
        .collect();
    assert_eq!(names, ["MyFoo", "Foos", "MyBar"]);
}

#[test]
fn test_render_template_through_store() {
    let source = source(
        r#"
  - Name: MyFoo
    Class: Ns.Foo
"#,
    );
    let builder = RegistryBuilder::default();
    let output = builder.build(&source, "registry.yaml").expect("Failed to build");

    let store = MemoryTemplateStore::new()
        .with_template("Registry", "public static partial class {{RegistryClassName}} { }")
        .with_template("Broken", "{{RegistryClassName}} {{Nope}}");

    let rendered = builder
        .render_template(&store, &FlatRenderer, "Registry", TokenSchema::Registry, output.tokens())
        .expect("Failed to render");
    assert_eq!(rendered, "public static partial class Registry { }");

    let missing = builder.render_template(
        &store,
        &FlatRenderer,
        "Accessor",
        TokenSchema::Instance,
        output.tokens(),
    );
    assert!(matches!(
        missing,
        Err(RegistrarError::Template(TemplateError::NotFound(_)))
    ));

    let broken = builder.render_template(
        &store,
        &FlatRenderer,
        "Broken",
        TokenSchema::Registry,
        output.tokens(),
    );
    assert!(matches!(
        broken,
        Err(RegistrarError::Template(TemplateError::UnknownTokens { .. }))
    ));
}

#[test]
fn test_lenient_templates_render_with_unknown_tokens() {
    let source = source(
        r#"
  - Name: MyFoo
    Class: Ns.Foo
"#,
    );
    let config = AppConfig::new(NormalizeConfig::default(), TemplateConfig::new(false));
    let builder = RegistryBuilder::new(config);
    let output = builder.build(&source, "registry.yaml").expect("Failed to build");

    let store = MemoryTemplateStore::new().with_template("Broken", "{{RegistryClassName}} {{Nope}}");
    let rendered = builder
        .render_template(&store, &FlatRenderer, "Broken", TokenSchema::Registry, output.tokens())
        .expect("lenient mode should render");
    assert_eq!(rendered, "Registry {{Nope}}");
}

#[test]
fn test_compile_file_reports_io_errors() {
    let result = RegistryBuilder::default().compile_file(std::path::Path::new("/nonexistent/registry.yaml"));
    assert!(matches!(result, Err(RegistrarError::Io(_))));
}

#[test]
fn test_builder_reusability() {
    let builder = RegistryBuilder::default();
    let first = builder
        .build(&source("  - { Name: A, Class: Ns.Foo }\n"), "a.yaml")
        .expect("Failed to build first");
    let second = builder
        .build(&source("  - { Name: B, Class: Ns.Foo }\n"), "b.yaml")
        .expect("Failed to build second");

    assert!(first.instance_tokens("A").is_some());
    assert!(second.instance_tokens("B").is_some());
    assert!(second.instance_tokens("A").is_none());
}
