use clap::Args;
use std::path::PathBuf;

use crate::cli::print_json;
use crate::services::dependency_resolver::DependencyResolver;
use crate::utils::config::ConfigParser;
use crate::utils::error::{Result, RkjmError};

/// Check that the declared version ranges can be met together
#[derive(Debug, Args)]
pub struct ResolveCommand {
    /// Recipe file
    #[arg(long)]
    pub recipe: PathBuf,

    /// Package catalog
    #[arg(long)]
    pub catalog: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ResolveCommand {
    pub fn run(&self) -> Result<()> {
        let recipe = ConfigParser::load_recipe(&self.recipe)?;
        let catalog = ConfigParser::load_catalog(&self.catalog)?;

        let result = DependencyResolver::new(catalog).resolve_recipe(&recipe);

        if self.json {
            print_json(&result)?;
        } else {
            for package in &result.resolved {
                println!("{} {} ({})", package.name, package.version, package.ranges.join(", "));
            }
            for failure in &result.failed {
                println!("✗ {failure}");
            }
        }

        if result.is_satisfiable() {
            Ok(())
        } else {
            Err(RkjmError::ValidationError(format!(
                "{} requirement(s) of '{}' cannot be satisfied",
                result.failed.len(),
                recipe.name
            )))
        }
    }
}
