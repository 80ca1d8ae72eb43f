use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::models::recipe::ExportRules;
use crate::utils::error::{Result, RkjmError};

/// `*` crosses directory separators, like fnmatch in the recipe language
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Version control metadata, never part of an export
const VCS_DIR: &str = ".git";

/// Source of the files the version control system ignores
pub trait IgnoreQuery {
    /// Ignored paths relative to `root`, `/`-separated; directories end in `/`
    fn ignored(&self, root: &Path) -> Result<Vec<String>>;
}

/// Asks git for ignored, untracked files
#[derive(Debug, Clone, Default)]
pub struct GitIgnoreQuery;

impl IgnoreQuery for GitIgnoreQuery {
    fn ignored(&self, root: &Path) -> Result<Vec<String>> {
        let output = Command::new("git")
            .args(["ls-files", "--others", "--ignored", "--exclude-standard", "--directory"])
            .current_dir(root)
            .output()
            .map_err(|e| RkjmError::ExecutionError(format!("Failed to run git: {e}")))?;

        if !output.status.success() {
            return Err(RkjmError::ExecutionError(format!(
                "git ls-files failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect())
    }
}

/// Fixed ignore list, for callers that already know the ignored files
#[derive(Debug, Clone, Default)]
pub struct StaticIgnoreList(pub Vec<String>);

impl IgnoreQuery for StaticIgnoreList {
    fn ignored(&self, _root: &Path) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Computes and copies the list of exported source files
pub struct SourceExporter<Q: IgnoreQuery = GitIgnoreQuery> {
    rules: ExportRules,
    ignore_query: Q,
}

impl SourceExporter<GitIgnoreQuery> {
    pub fn new(rules: ExportRules) -> Self {
        Self::with_query(rules, GitIgnoreQuery)
    }
}

impl<Q: IgnoreQuery> SourceExporter<Q> {
    pub fn with_query(rules: ExportRules, ignore_query: Q) -> Self {
        Self { rules, ignore_query }
    }

    /// Sorted relative paths of all files to export from `root`
    pub fn collect(&self, root: &Path) -> Result<Vec<String>> {
        if !root.is_dir() {
            return Err(RkjmError::FileNotFound(root.to_path_buf()));
        }

        let include = Self::compile(&self.rules.include)?;
        let exclude = Self::compile(&self.rules.exclude)?;

        let ignored = if self.rules.vcs_ignored {
            let ignored = self.ignore_query.ignored(root)?;
            debug!(count = ignored.len(), "version control ignores files");
            ignored
        } else {
            Vec::new()
        };

        let mut files = BTreeSet::new();
        walk(root, Path::new(""), &mut |relative: &str| {
            let matches_any = |patterns: &[Pattern]| {
                patterns.iter().any(|p| p.matches_with(relative, MATCH_OPTIONS))
            };

            if matches_any(&include) && !matches_any(&exclude) && !is_ignored(relative, &ignored) {
                files.insert(relative.to_string());
            }
        })?;

        Ok(files.into_iter().collect())
    }

    /// Copy the export list from `root` into `dest`, returning the copied paths
    pub fn export(&self, root: &Path, dest: &Path) -> Result<Vec<String>> {
        let files = self.collect(root)?;

        for relative in &files {
            let target = dest.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(root.join(relative), &target)?;
        }

        info!(
            count = files.len(),
            source = %root.display(),
            dest = %dest.display(),
            "exported sources"
        );

        Ok(files)
    }

    fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
        patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    RkjmError::ValidationError(format!("Invalid export pattern '{p}': {e}"))
                })
            })
            .collect()
    }
}

/// Whether `relative` is listed by the ignore query, directly or below an ignored directory
fn is_ignored(relative: &str, ignored: &[String]) -> bool {
    ignored.iter().any(|entry| {
        entry
            .strip_suffix('/')
            .map_or(relative == entry, |dir| {
                relative.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
            })
    })
}

fn walk(dir: &Path, relative: &Path, visit: &mut dyn FnMut(&str)) -> Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        if entry.file_name() == VCS_DIR {
            continue;
        }

        let name = PathBuf::from(entry.file_name());
        let child = relative.join(&name);
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk(&entry.path(), &child, visit)?;
        } else if file_type.is_file() {
            let components: Vec<String> = child
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            visit(&components.join("/"));
        }
    }

    Ok(())
}
