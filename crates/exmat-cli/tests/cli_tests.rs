//! Tests for the exmat CLI

use clap::Parser;
use exmat_cli::{Cli, CliConfig, CommandExecutor, Commands, OutputFormat};
use exmat_owl::{vocabulary, Triple};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn ex(local: &str) -> String {
    format!("http://example.org/{}", local)
}

/// Leaf ⊑ partOf some Branch, Branch ⊑ partOf some Tree, partOf transitive
fn tree_triples() -> Vec<Triple> {
    vec![
        Triple::new(ex("trees"), vocabulary::RDF_TYPE, vocabulary::OWL_ONTOLOGY),
        Triple::new(ex("partOf"), vocabulary::RDF_TYPE, vocabulary::OWL_OBJECT_PROPERTY),
        Triple::new(ex("partOf"), vocabulary::RDF_TYPE, vocabulary::OWL_TRANSITIVE_PROPERTY),
        Triple::new(ex("Leaf"), vocabulary::RDFS_SUBCLASS_OF, "_:r1"),
        Triple::new("_:r1", vocabulary::RDF_TYPE, vocabulary::OWL_RESTRICTION),
        Triple::new("_:r1", vocabulary::OWL_ON_PROPERTY, ex("partOf")),
        Triple::new("_:r1", vocabulary::OWL_SOME_VALUES_FROM, ex("Branch")),
        Triple::new(ex("Branch"), vocabulary::RDFS_SUBCLASS_OF, "_:r2"),
        Triple::new("_:r2", vocabulary::RDF_TYPE, vocabulary::OWL_RESTRICTION),
        Triple::new("_:r2", vocabulary::OWL_ON_PROPERTY, ex("partOf")),
        Triple::new("_:r2", vocabulary::OWL_SOME_VALUES_FROM, ex("Tree")),
    ]
}

fn write_triples(dir: &TempDir, name: &str, triples: &[Triple]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string(triples).unwrap()).unwrap();
    path
}

fn ontology_args(path: &Path) -> Vec<String> {
    vec!["--ontology".to_string(), path.display().to_string()]
}

fn parse(args: &[&str]) -> Commands {
    Cli::try_parse_from(args.iter().copied()).unwrap().command
}

#[test]
fn test_cli_parsing_materialize() {
    let command = parse(&["exmat", "materialize", "-O", "a.json", "-O", "b.json", "-r", "http://example.org/partOf"]);
    match command {
        Commands::Materialize { input, relation, output, format } => {
            assert_eq!(input.ontologies, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
            assert_eq!(relation, vec!["http://example.org/partOf".to_string()]);
            assert!(!input.include_imports);
            assert!(output.is_none());
            assert_eq!(format, OutputFormat::Text);
        }
        _ => panic!("Expected Materialize command"),
    }
}

#[test]
fn test_cli_parsing_superclasses() {
    let command = parse(&[
        "exmat",
        "superclasses",
        "--ontology",
        "tree.json",
        "--class",
        "http://example.org/Leaf",
        "--relation",
        "http://example.org/partOf",
        "--direct",
        "--format",
        "json-pretty",
    ]);
    match command {
        Commands::Superclasses { class, relation, direct, reflexive, format, .. } => {
            assert_eq!(class, "http://example.org/Leaf");
            assert_eq!(relation, "http://example.org/partOf");
            assert!(direct);
            assert!(!reflexive);
            assert_eq!(format, OutputFormat::JsonPretty);
        }
        _ => panic!("Expected Superclasses command"),
    }
}

#[test]
fn test_cli_parsing_global_config_and_flags() {
    let cli = Cli::try_parse_from([
        "exmat",
        "subsumptions",
        "-O",
        "tree.json",
        "--include-imports",
        "--no-range-rewrite",
        "--timeout-ms",
        "500",
        "--config",
        "exmat.json",
    ])
    .unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("exmat.json")));
    match cli.command {
        Commands::Subsumptions { input, .. } => {
            assert!(input.include_imports);
            assert!(input.no_range_rewrite);
            assert_eq!(input.timeout_ms, Some(500));
        }
        _ => panic!("Expected Subsumptions command"),
    }
}

#[test]
fn test_cli_requires_ontology() {
    assert!(Cli::try_parse_from(["exmat", "materialize"]).is_err());
    assert!(Cli::try_parse_from(["exmat", "info"]).is_ok());
}

#[test]
fn test_execute_materialize() {
    let dir = TempDir::new().unwrap();
    let path = write_triples(&dir, "tree.json", &tree_triples());
    let output = dir.path().join("out.json");

    let mut args = vec!["exmat".to_string(), "materialize".to_string()];
    args.extend(ontology_args(&path));
    args.extend(["--format".to_string(), "json".to_string()]);
    args.extend(["--output".to_string(), output.display().to_string()]);
    let cli = Cli::try_parse_from(args).unwrap();

    let result = CommandExecutor::new().execute(cli.command).unwrap();
    assert!(result.success);

    let data = result.data.unwrap();
    assert_eq!(data["report"]["classes_created"], 3);
    assert_eq!(data["synthetic_classes"].as_array().unwrap().len(), 3);

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written, data);
}

#[test]
fn test_execute_subsumptions() {
    let dir = TempDir::new().unwrap();
    let path = write_triples(&dir, "tree.json", &tree_triples());

    let mut args = vec!["exmat".to_string(), "subsumptions".to_string()];
    args.extend(ontology_args(&path));
    let cli = Cli::try_parse_from(args).unwrap();

    let result = CommandExecutor::new().execute(cli.command).unwrap();
    assert!(result.success);
    assert_eq!(result.data.unwrap()["subsumptions"].as_array().unwrap().len(), 3);
}

#[test]
fn test_execute_over_direct() {
    let dir = TempDir::new().unwrap();
    let path = write_triples(&dir, "tree.json", &tree_triples());

    let mut args = vec!["exmat".to_string(), "over".to_string()];
    args.extend(ontology_args(&path));
    args.extend(["--class".to_string(), ex("Leaf")]);
    args.extend(["--relation".to_string(), ex("partOf")]);
    args.push("--direct".to_string());
    let cli = Cli::try_parse_from(args).unwrap();

    let result = CommandExecutor::new().execute(cli.command).unwrap();
    let fillers = result.data.unwrap()["fillers"].as_array().unwrap().len();
    assert_eq!(fillers, 1);
    assert_eq!(result.message, "Found 1 fillers");
}

#[test]
fn test_execute_with_imports_loaded_in_order() {
    let dir = TempDir::new().unwrap();
    let upper = write_triples(
        &dir,
        "upper.json",
        &[
            Triple::new(ex("upper"), vocabulary::RDF_TYPE, vocabulary::OWL_ONTOLOGY),
            Triple::new(ex("Branch"), vocabulary::RDFS_SUBCLASS_OF, ex("Plant_part")),
        ],
    );
    let mut tree = tree_triples();
    tree.push(Triple::new(ex("trees"), vocabulary::OWL_IMPORTS, ex("upper")));
    let root = write_triples(&dir, "tree.json", &tree);

    let mut args = vec!["exmat".to_string(), "superclasses".to_string()];
    args.extend(ontology_args(&upper));
    args.extend(ontology_args(&root));
    args.extend(["--class".to_string(), ex("Leaf")]);
    args.extend(["--relation".to_string(), ex("partOf")]);
    args.push("--include-imports".to_string());
    args.extend(["--format".to_string(), "json".to_string()]);
    let cli = Cli::try_parse_from(args).unwrap();

    let result = CommandExecutor::new().execute(cli.command).unwrap();
    let supers = result.data.unwrap()["superclasses"].as_array().unwrap().len();
    // partOf some Branch, partOf some Tree, partOf some Plant_part
    assert_eq!(supers, 3);
}

#[test]
fn test_execute_missing_import_fails() {
    let dir = TempDir::new().unwrap();
    let mut tree = tree_triples();
    tree.push(Triple::new(ex("trees"), vocabulary::OWL_IMPORTS, ex("upper")));
    let root = write_triples(&dir, "tree.json", &tree);

    let mut args = vec!["exmat".to_string(), "materialize".to_string()];
    args.extend(ontology_args(&root));
    let cli = Cli::try_parse_from(args).unwrap();

    assert!(CommandExecutor::new().execute(cli.command).is_err());
}

#[test]
fn test_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("exmat.json");
    std::fs::write(
        &path,
        r#"{"materializer": {"include_imports": true, "buffering": "non_buffering"}, "saturation": {"timeout_ms": 1000}}"#,
    )
    .unwrap();

    let config = CliConfig::from_file(&path).unwrap();
    assert!(config.materializer.include_imports);
    assert!(config.materializer.rewrite_range_axioms);
    assert_eq!(config.saturation.timeout_ms, Some(1000));

    assert!(CliConfig::from_file(dir.path().join("missing.json")).is_err());
}

#[test]
fn test_execute_info() {
    let result = CommandExecutor::default().execute(Commands::Info).unwrap();
    assert!(result.success);
    assert_eq!(result.data.unwrap()["name"], "exmat-cli");
}
