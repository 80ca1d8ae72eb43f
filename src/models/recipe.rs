use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::models::package_reference::PackageReference;

/// Revision of the recipe schema
///
/// Each revision of the descriptor enables or retires some sections, see
/// [`SchemaVersion::supports_prepare`] and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SchemaVersion(u32);

impl SchemaVersion {
    pub const OLDEST: Self = Self(1);
    pub const LATEST: Self = Self(5);

    pub fn new(revision: u32) -> Result<Self, String> {
        if (Self::OLDEST.0..=Self::LATEST.0).contains(&revision) {
            Ok(Self(revision))
        } else {
            Err(format!(
                "Unsupported schema_version {} (supported: {}..={})",
                revision,
                Self::OLDEST.0,
                Self::LATEST.0
            ))
        }
    }

    pub fn revision(self) -> u32 {
        self.0
    }

    /// The configure-template substitution exists in the first two revisions
    pub fn supports_prepare(self) -> bool {
        self.0 <= 2
    }

    /// The dynamic VCS-ignored exclusion was replaced by a static list in revision 4
    pub fn supports_vcs_exclusion(self) -> bool {
        self.0 <= 3
    }

    /// Inheriting from a shared base recipe arrived with revision 5
    pub fn supports_base(self) -> bool {
        self.0 >= 5
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl TryFrom<u32> for SchemaVersion {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SchemaVersion> for u32 {
    fn from(version: SchemaVersion) -> Self {
        version.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which source files are exported with the package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRules {
    /// Glob patterns of files to export, relative to the source root
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    /// Glob patterns of files never to export
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Also exclude everything the version control system ignores
    #[serde(default)]
    pub vcs_ignored: bool,
}

fn default_include() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec![".gitignore".to_string()]
}

impl Default for ExportRules {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            vcs_ignored: false,
        }
    }
}

/// Source preparation: rewrite the `AC_INIT` line of a configure template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareStep {
    /// Template read from the source root
    pub template: PathBuf,
    /// Derived file written to the source root
    pub output: PathBuf,
    /// Project name placed in the first `AC_INIT` argument
    #[serde(default = "default_project")]
    pub project: String,
    /// Bug-report address or author placed in the third argument
    pub author: String,
}

fn default_project() -> String {
    "robotkernel".to_string()
}

/// The test package: copy a config and run the host binary against it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPackage {
    /// Test configuration shipped next to the recipe
    #[serde(default = "default_test_config")]
    pub config: PathBuf,
    /// Host framework executable
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Extra run environment for the child process
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_test_config() -> PathBuf {
    PathBuf::from("mod_test.rkc")
}

fn default_executable() -> String {
    "robotkernel".to_string()
}

impl Default for TestPackage {
    fn default() -> Self {
        Self {
            config: default_test_config(),
            executable: default_executable(),
            env: BTreeMap::new(),
        }
    }
}

/// The package descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub schema_version: SchemaVersion,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Shared base recipe this one extends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<PackageReference>,
    #[serde(default)]
    pub requires: Vec<PackageReference>,
    #[serde(default)]
    pub exports: ExportRules,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepare: Option<PrepareStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_package: Option<TestPackage>,
}

impl Recipe {
    /// Create a latest-schema recipe with default export rules
    pub fn new(name: String, description: String) -> Self {
        Self {
            schema_version: SchemaVersion::LATEST,
            name,
            description,
            base: None,
            requires: Vec::new(),
            exports: ExportRules::default(),
            prepare: None,
            test_package: None,
        }
    }

    /// Validate the recipe against the rules of its schema revision
    pub fn validate(&self) -> Result<(), String> {
        self.validate_name()?;
        self.validate_exports()?;
        self.validate_schema_sections()?;
        self.validate_prepare()?;
        Ok(())
    }

    fn validate_name(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Recipe name cannot be empty".to_string());
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(format!(
                "Invalid recipe name '{}' (lowercase letters, digits, '_' and '-' only)",
                self.name
            ));
        }

        Ok(())
    }

    fn validate_exports(&self) -> Result<(), String> {
        if self.exports.include.is_empty() {
            return Err("exports.include must list at least one pattern".to_string());
        }

        for pattern in self.exports.include.iter().chain(&self.exports.exclude) {
            glob::Pattern::new(pattern)
                .map_err(|e| format!("Invalid export pattern '{pattern}': {e}"))?;
        }

        Ok(())
    }

    fn validate_schema_sections(&self) -> Result<(), String> {
        let schema = self.schema_version;

        if self.prepare.is_some() && !schema.supports_prepare() {
            return Err(format!(
                "[prepare] is not available in schema_version {schema} (only 1 and 2)"
            ));
        }

        if self.exports.vcs_ignored && !schema.supports_vcs_exclusion() {
            return Err(format!(
                "exports.vcs_ignored is not available in schema_version {schema} (only 1 to 3)"
            ));
        }

        if self.base.is_some() && !schema.supports_base() {
            return Err(format!(
                "base is not available in schema_version {schema} (5 and later)"
            ));
        }

        Ok(())
    }

    fn validate_prepare(&self) -> Result<(), String> {
        if let Some(prepare) = &self.prepare {
            if prepare.template == prepare.output {
                return Err("prepare.template and prepare.output must differ".to_string());
            }
            if prepare.author.trim().is_empty() {
                return Err("prepare.author cannot be empty".to_string());
            }
            for path in [&prepare.template, &prepare.output] {
                if path.is_absolute() || path.components().any(|c| c.as_os_str() == "..") {
                    return Err(format!(
                        "prepare path '{}' must stay inside the source root",
                        path.display()
                    ));
                }
            }
        }

        Ok(())
    }

    /// Requirement on the given package, if declared
    pub fn requirement(&self, name: &str) -> Option<&PackageReference> {
        self.requires.iter().find(|r| r.name == name)
    }
}
