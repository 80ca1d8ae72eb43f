use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::models::catalog::Catalog;
use crate::models::package_reference::PackageReference;
use crate::models::recipe::Recipe;
use crate::models::version::{Version, VersionRange};

/// Dependency resolver errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolverError {
    /// Package not present in the catalog
    #[error("Package '{package}' not found in catalog")]
    PackageNotFound { package: String },

    /// No catalog version lies in every declared range
    #[error("No version of '{package}' satisfies {ranges}")]
    Unsatisfiable { package: String, ranges: String },
}

/// A package pinned to a concrete version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: Version,
    /// Range expressions that constrained the choice
    pub ranges: Vec<String>,
}

/// Outcome of resolving a recipe against a catalog
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionResult {
    pub resolved: Vec<ResolvedPackage>,
    #[serde(serialize_with = "serialize_failures")]
    pub failed: Vec<ResolverError>,
}

fn serialize_failures<S: serde::Serializer>(
    failures: &[ResolverError],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(failures.iter().map(ToString::to_string))
}

impl ResolutionResult {
    /// All declared ranges can be met at the same time
    pub fn is_satisfiable(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn version_of(&self, name: &str) -> Option<&Version> {
        self.resolved.iter().find(|p| p.name == name).map(|p| &p.version)
    }
}

/// Checks that a recipe's version ranges can be satisfied together
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    catalog: Catalog,
}

impl DependencyResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Resolve the recipe's requirements, including its base recipe
    pub fn resolve_recipe(&self, recipe: &Recipe) -> ResolutionResult {
        let references = recipe.base.iter().chain(&recipe.requires);
        self.resolve(references)
    }

    /// Pick the highest catalog version for each package lying in all its ranges
    ///
    /// A package referenced more than once is constrained by the intersection
    /// of its ranges.
    pub fn resolve<'a, I>(&self, references: I) -> ResolutionResult
    where
        I: IntoIterator<Item = &'a PackageReference>,
    {
        let mut grouped: BTreeMap<&str, Vec<&VersionRange>> = BTreeMap::new();
        for reference in references {
            grouped.entry(&reference.name).or_default().push(&reference.range);
        }

        let mut result = ResolutionResult::default();

        for (name, ranges) in grouped {
            let expressions: Vec<String> = ranges.iter().map(|r| r.expression().to_string()).collect();

            if !self.catalog.contains_package(name) {
                warn!(package = name, "package not in catalog");
                result.failed.push(ResolverError::PackageNotFound {
                    package: name.to_string(),
                });
                continue;
            }

            match self.catalog.best_match(name, ranges.iter().copied()) {
                Some(version) => {
                    debug!(package = name, version = %version, "resolved");
                    result.resolved.push(ResolvedPackage {
                        name: name.to_string(),
                        version: version.clone(),
                        ranges: expressions,
                    });
                }
                None => {
                    warn!(package = name, ranges = ?expressions, "unsatisfiable ranges");
                    result.failed.push(ResolverError::Unsatisfiable {
                        package: name.to_string(),
                        ranges: expressions.join(" and "),
                    });
                }
            }
        }

        info!(
            resolved = result.resolved.len(),
            failed = result.failed.len(),
            "dependency resolution finished"
        );

        result
    }
}
