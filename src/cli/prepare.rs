use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::print_json;
use crate::models::version::Version;
use crate::services::source_preparer::SourcePreparer;
use crate::utils::config::ConfigParser;
use crate::utils::error::{Result, RkjmError};

/// Stamp the package version into the configure template
#[derive(Debug, Args)]
pub struct PrepareCommand {
    /// Recipe file
    #[arg(long)]
    pub recipe: PathBuf,

    /// Package version written into AC_INIT
    #[arg(long)]
    pub version: String,

    /// Source root holding the template
    #[arg(long)]
    pub source_dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON response format for prepare command
#[derive(Debug, Serialize)]
pub struct PrepareResponse {
    pub status: String,
    pub output: String,
    pub version: String,
    pub replaced: usize,
}

impl PrepareCommand {
    pub fn run(&self) -> Result<()> {
        let recipe = ConfigParser::load_recipe(&self.recipe)?;

        let step = recipe.prepare.as_ref().ok_or_else(|| {
            RkjmError::ValidationError(format!(
                "Recipe '{}' (schema {}) has no [prepare] section",
                recipe.name, recipe.schema_version
            ))
        })?;

        let version: Version = self
            .version
            .parse()
            .map_err(|e| RkjmError::ValidationError(format!("{e}")))?;

        let prepared = SourcePreparer::new(&self.source_dir).prepare(step, &version)?;

        if self.json {
            print_json(&PrepareResponse {
                status: "success".to_string(),
                output: prepared.output.display().to_string(),
                version: version.to_string(),
                replaced: prepared.replaced,
            })
        } else {
            println!(
                "Prepared {} for {} v{} ({} AC_INIT line replaced)",
                prepared.output.display(),
                recipe.name,
                version,
                prepared.replaced
            );
            Ok(())
        }
    }
}
