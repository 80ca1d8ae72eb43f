use rkjm::models::catalog::Catalog;
use rkjm::models::package_reference::PackageReference;
use rkjm::models::version::Version;
use rkjm::services::dependency_resolver::{DependencyResolver, ResolverError};
use rkjm::utils::config::ConfigParser;

fn catalog() -> Catalog {
    toml::from_str(
        r#"
[packages]
robotkernel = ["1.9.0", "2.0.0", "2.4.1", "3.0.0"]
service_provider_process_data_inspection = ["2.1.0"]
conan_template = ["5.0.6"]
"#,
    )
    .unwrap()
}

fn references(specs: &[&str]) -> Vec<PackageReference> {
    specs.iter().map(|s| s.parse().unwrap()).collect()
}

#[test]
fn test_highest_version_in_range() {
    let resolver = DependencyResolver::new(catalog());
    let refs = references(&["robotkernel/[~2]@robotkernel/stable"]);

    let result = resolver.resolve(&refs);
    assert!(result.is_satisfiable());
    assert_eq!(result.version_of("robotkernel"), Some(&Version::new(2, 4, 1)));
    assert_eq!(result.resolved[0].ranges, vec!["~2".to_string()]);
}

#[test]
fn test_repeated_package_intersects_ranges() {
    let resolver = DependencyResolver::new(catalog());
    let refs = references(&[
        "robotkernel/[>=1.9]@robotkernel/stable",
        "robotkernel/[<2.4]@robotkernel/stable",
    ]);

    let result = resolver.resolve(&refs);
    assert_eq!(result.resolved.len(), 1);
    assert_eq!(result.version_of("robotkernel"), Some(&Version::new(2, 0, 0)));
}

#[test]
fn test_disjoint_ranges_fail() {
    let resolver = DependencyResolver::new(catalog());
    let refs = references(&[
        "robotkernel/[~1]@robotkernel/stable",
        "robotkernel/[~3]@robotkernel/stable",
    ]);

    let result = resolver.resolve(&refs);
    assert!(!result.is_satisfiable());
    assert_eq!(
        result.failed,
        vec![ResolverError::Unsatisfiable {
            package: "robotkernel".to_string(),
            ranges: "~1 and ~3".to_string(),
        }]
    );
    assert_eq!(
        result.failed[0].to_string(),
        "No version of 'robotkernel' satisfies ~1 and ~3"
    );
}

#[test]
fn test_unknown_package_reported() {
    let resolver = DependencyResolver::new(catalog());
    let refs = references(&["ethercat/[~5]@robotkernel/stable"]);

    let result = resolver.resolve(&refs);
    assert!(result.resolved.is_empty());
    assert_eq!(
        result.failed[0].to_string(),
        "Package 'ethercat' not found in catalog"
    );
}

#[test]
fn test_recipe_base_is_resolved_with_requirements() {
    let recipe = ConfigParser::parse_recipe(
        r#"
name = "module_jitter_measurement"
base = "conan_template/[^5.0.6]@robotkernel/stable"
requires = [
    "robotkernel/[~2]@robotkernel/stable",
    "service_provider_process_data_inspection/[~2]@robotkernel/stable",
]
"#,
    )
    .unwrap();

    let result = DependencyResolver::new(catalog()).resolve_recipe(&recipe);
    assert!(result.is_satisfiable());
    let names: Vec<&str> = result.resolved.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "conan_template",
            "robotkernel",
            "service_provider_process_data_inspection"
        ]
    );
    assert_eq!(result.version_of("conan_template"), Some(&Version::new(5, 0, 6)));
}

#[test]
fn test_failures_serialize_as_messages() {
    let resolver = DependencyResolver::new(catalog());
    let refs = references(&["robotkernel/[~4]@robotkernel/stable"]);

    let json = serde_json::to_value(resolver.resolve(&refs)).unwrap();
    assert_eq!(json["resolved"], serde_json::json!([]));
    assert_eq!(
        json["failed"][0],
        "No version of 'robotkernel' satisfies ~4"
    );
}
