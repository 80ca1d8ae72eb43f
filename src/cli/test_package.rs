use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::print_json;
use crate::models::platform::Platform;
use crate::services::smoke_test_runner::{SmokeOutcome, SmokeTestRunner};
use crate::utils::config::ConfigParser;
use crate::utils::error::Result;

/// Run the test package against the host framework
#[derive(Debug, Args)]
pub struct TestCommand {
    /// Recipe file
    #[arg(long)]
    pub recipe: PathBuf,

    /// Directory the test config is read from
    #[arg(long)]
    pub recipe_dir: Option<PathBuf>,

    /// Working directory for the run
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Target operating system
    #[arg(long)]
    pub target_os: Option<String>,

    /// Target architecture
    #[arg(long)]
    pub target_arch: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON response format for test command
#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub package: String,
    pub target: String,
    pub host: String,
    #[serde(flatten)]
    pub outcome: SmokeOutcome,
}

impl TestCommand {
    /// Run the test package, returning the exit code to report
    pub async fn run(&self) -> Result<i32> {
        let recipe = ConfigParser::load_recipe(&self.recipe)?;
        let package = recipe.test_package.clone().unwrap_or_default();

        let recipe_dir = self.recipe_dir.clone().unwrap_or_else(|| {
            self.recipe
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        });
        let work_dir = self.work_dir.clone().unwrap_or_else(|| recipe_dir.join("build"));

        let host = Platform::host();
        let target = Platform::host_with(self.target_os.clone(), self.target_arch.clone());

        let outcome = SmokeTestRunner::new(package, &recipe_dir, &work_dir)
            .run(&target, &host)
            .await?;

        if self.json {
            print_json(&TestResponse {
                package: recipe.name,
                target: target.to_string(),
                host: host.to_string(),
                outcome,
            })?;
        } else {
            match outcome {
                SmokeOutcome::Passed => println!("✓ Test package passed"),
                SmokeOutcome::Failed { exit_code } => {
                    println!("✗ Test package failed with exit code {exit_code}");
                }
                SmokeOutcome::Skipped => {
                    println!("Skipping run cross built package ({target} on {host})");
                }
            }
        }

        Ok(outcome.exit_code())
    }
}
