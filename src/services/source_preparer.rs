use regex::{NoExpand, Regex};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::models::recipe::PrepareStep;
use crate::models::version::Version;
use crate::utils::error::{Result, RkjmError};

fn ac_init_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    // `.` stops at '\n', so a trailing '\r' stays outside the match
    PATTERN
        .get_or_init(|| Regex::new(r"(?m)^([ \t]*)AC_INIT\(.*\)"))
        .as_ref()
        .map_err(|e| RkjmError::ExecutionError(format!("Invalid AC_INIT pattern: {e}")))
}

/// Outcome of a preparation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSource {
    pub output: PathBuf,
    /// Number of lines rewritten, 0 or 1
    pub replaced: usize,
}

/// Rewrite the `AC_INIT(...)` call in `template` with the given identity
///
/// Only the first `AC_INIT` line changes; every other byte is copied through.
/// Returns the new text and the number of replaced lines.
pub fn substitute_ac_init(template: &str, project: &str, version: &str, author: &str) -> Result<(String, usize)> {
    let pattern = ac_init_pattern()?;

    let Some(captures) = pattern.captures(template) else {
        return Ok((template.to_string(), 0));
    };

    let indent = captures.get(1).map_or("", |m| m.as_str());
    let replacement = format!("{indent}AC_INIT([{project}], [{version}], [{author}])");
    let result = pattern.replacen(template, 1, NoExpand(&replacement));

    Ok((result.into_owned(), 1))
}

/// Runs the recipe's source-preparation step
pub struct SourcePreparer {
    source_dir: PathBuf,
}

impl SourcePreparer {
    pub fn new<P: Into<PathBuf>>(source_dir: P) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }

    /// Read the template, substitute version and author, write the output file
    pub fn prepare(&self, step: &PrepareStep, version: &Version) -> Result<PreparedSource> {
        let template_path = self.source_dir.join(&step.template);
        let output_path = self.source_dir.join(&step.output);

        if !template_path.is_file() {
            return Err(RkjmError::FileNotFound(template_path));
        }

        let template = fs::read_to_string(&template_path)?;
        let (content, replaced) =
            substitute_ac_init(&template, &step.project, &version.to_string(), &step.author)?;

        if replaced == 0 {
            warn!(
                template = %template_path.display(),
                "no AC_INIT line found, template copied unchanged"
            );
        }

        fs::write(&output_path, content)?;

        info!(
            template = %template_path.display(),
            output = %output_path.display(),
            version = %version,
            author = %step.author,
            "prepared configure template"
        );

        Ok(PreparedSource {
            output: output_path,
            replaced,
        })
    }
}
