use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::print_json;
use crate::services::source_exporter::SourceExporter;
use crate::utils::config::ConfigParser;
use crate::utils::error::Result;

/// List or copy the exported source files
#[derive(Debug, Args)]
pub struct ExportsCommand {
    /// Recipe file
    #[arg(long)]
    pub recipe: PathBuf,

    /// Source root to export from
    #[arg(long)]
    pub source_dir: PathBuf,

    /// Copy the files into this directory
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON response format for exports command
#[derive(Debug, Serialize)]
pub struct ExportsResponse {
    pub package: String,
    pub vcs_ignored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    pub files: Vec<String>,
}

impl ExportsCommand {
    pub fn run(&self) -> Result<()> {
        let recipe = ConfigParser::load_recipe(&self.recipe)?;
        let exporter = SourceExporter::new(recipe.exports.clone());

        let files = match &self.dest {
            Some(dest) => exporter.export(&self.source_dir, dest)?,
            None => exporter.collect(&self.source_dir)?,
        };

        if self.json {
            return print_json(&ExportsResponse {
                package: recipe.name,
                vcs_ignored: recipe.exports.vcs_ignored,
                dest: self.dest.as_ref().map(|d| d.display().to_string()),
                files,
            });
        }

        for file in &files {
            println!("{file}");
        }
        if let Some(dest) = &self.dest {
            println!("Exported {} files to {}", files.len(), dest.display());
        }

        Ok(())
    }
}
