use rkjm::models::recipe::SchemaVersion;
use rkjm::services::dependency_resolver::DependencyResolver;
use rkjm::services::source_exporter::{SourceExporter, StaticIgnoreList};
use rkjm::services::source_preparer::SourcePreparer;
use rkjm::utils::config::ConfigParser;
use std::fs;
use tempfile::TempDir;

/// Integration tests for the packaging steps driven by one recipe

const SCHEMA_2_RECIPE: &str = r#"
schema_version = 2
name = "module_jitter_measurement"
description = "robotkernel jitter measurement module."
requires = [
    "robotkernel/[~2]@robotkernel/stable",
    "service_provider_process_data_inspection/[~2]@robotkernel/stable",
]

[exports]
include = ["*"]
exclude = [".gitignore"]
vcs_ignored = true

[prepare]
template = "configure.ac.in"
output = "configure.ac"
author = "robotkernel"

[test_package]
config = "mod_test.rkc"
"#;

fn source_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("recipe.toml"), SCHEMA_2_RECIPE).unwrap();
    fs::write(root.join(".gitignore"), "configure.ac\nbuild/\n").unwrap();
    fs::write(
        root.join("configure.ac.in"),
        "AC_INIT(module_jitter_measurement, 0.0.0, nobody)\nAM_INIT_AUTOMAKE\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("build")).unwrap();
    fs::write(root.join("src/jitter_measurement.cpp"), "").unwrap();
    fs::write(root.join("build/Makefile"), "").unwrap();
    temp_dir
}

#[test]
fn test_schema_2_prepare_then_export() {
    let tree = source_tree();
    let root = tree.path();

    let recipe = ConfigParser::load_recipe(root.join("recipe.toml")).unwrap();
    assert_eq!(recipe.schema_version, SchemaVersion::new(2).unwrap());

    let step = recipe.prepare.as_ref().unwrap();
    SourcePreparer::new(root)
        .prepare(step, &"2.3.0".parse().unwrap())
        .unwrap();
    let configure = fs::read_to_string(root.join("configure.ac")).unwrap();
    assert!(configure.starts_with("AC_INIT([robotkernel], [2.3.0], [robotkernel])\n"));

    // What git would report for the .gitignore above
    let ignored = StaticIgnoreList(vec!["build/".to_string(), "configure.ac".to_string()]);
    let files = SourceExporter::with_query(recipe.exports.clone(), ignored)
        .collect(root)
        .unwrap();

    assert_eq!(
        files,
        vec![
            "configure.ac.in".to_string(),
            "recipe.toml".to_string(),
            "src/jitter_measurement.cpp".to_string(),
        ]
    );
}

#[test]
fn test_recipe_requirements_resolve() {
    let tree = source_tree();
    let recipe = ConfigParser::load_recipe(tree.path().join("recipe.toml")).unwrap();

    let catalog_path = tree.path().join("catalog.toml");
    fs::write(
        &catalog_path,
        "[packages]\nrobotkernel = [\"2.0.0\", \"2.9.1\", \"3.0.0\"]\nservice_provider_process_data_inspection = [\"2.1.0\"]\n",
    )
    .unwrap();
    let catalog = ConfigParser::load_catalog(&catalog_path).unwrap();

    let result = DependencyResolver::new(catalog).resolve_recipe(&recipe);
    assert!(result.is_satisfiable());
    assert_eq!(result.version_of("robotkernel").unwrap().to_string(), "2.9.1");
    assert_eq!(recipe.requirement("robotkernel").unwrap().user.as_deref(), Some("robotkernel"));
}

#[test]
fn test_every_schema_revision_loads_with_its_sections() {
    for revision in 1..=5u32 {
        let mut recipe = format!("schema_version = {revision}\nname = \"module_jitter_measurement\"\n");
        if revision <= 3 {
            recipe.push_str("\n[exports]\nvcs_ignored = true\n");
        }
        if revision <= 2 {
            recipe.push_str("\n[prepare]\ntemplate = \"configure.ac.in\"\noutput = \"configure.ac\"\nauthor = \"robotkernel\"\n");
        }
        if revision == 5 {
            recipe = format!("base = \"conan_template/[^5.0.6]@robotkernel/stable\"\n{recipe}");
        }

        let parsed = ConfigParser::parse_recipe(&recipe).unwrap();
        assert_eq!(parsed.schema_version.revision(), revision);
    }
}

#[test]
fn test_unknown_schema_revision_rejected() {
    let err = ConfigParser::parse_recipe("schema_version = 6\nname = \"module_jitter_measurement\"\n").unwrap_err();
    assert!(err.to_string().contains("schema_version"));
}
