use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use crate::models::platform::Platform;
use crate::models::recipe::TestPackage;
use crate::utils::error::{Result, RkjmError};

/// Result of a test-package run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SmokeOutcome {
    Passed,
    Failed { exit_code: i32 },
    /// Target binaries cannot execute on the host
    Skipped,
}

impl SmokeOutcome {
    /// Process exit code reporting this outcome
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Passed | Self::Skipped => 0,
            Self::Failed { exit_code } => exit_code,
        }
    }
}

/// Runs the host framework against the shipped test configuration
pub struct SmokeTestRunner {
    package: TestPackage,
    recipe_dir: PathBuf,
    work_dir: PathBuf,
}

impl SmokeTestRunner {
    pub fn new<P: Into<PathBuf>, W: Into<PathBuf>>(package: TestPackage, recipe_dir: P, work_dir: W) -> Self {
        Self {
            package,
            recipe_dir: recipe_dir.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Copy the test config into the working directory
    ///
    /// Returns the file name the config was copied to.
    pub fn stage_config(&self) -> Result<PathBuf> {
        let source = self.recipe_dir.join(&self.package.config);
        if !source.is_file() {
            return Err(RkjmError::FileNotFound(source));
        }

        let file_name = source
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| RkjmError::ConfigError(format!("Invalid test config path: {}", source.display())))?;

        fs::create_dir_all(&self.work_dir)?;
        fs::copy(&source, self.work_dir.join(&file_name))?;

        Ok(file_name)
    }

    /// Stage the config and run the executable unless cross building
    pub async fn run(&self, target: &Platform, host: &Platform) -> Result<SmokeOutcome> {
        let config = self.stage_config()?;

        if !target.can_run_on(host) {
            warn!(target_platform = %target, host = %host, "Skipping run cross built package");
            return Ok(SmokeOutcome::Skipped);
        }

        let config_arg = Path::new(".").join(&config);
        info!(
            executable = %self.package.executable,
            config = %config_arg.display(),
            work_dir = %self.work_dir.display(),
            "running test package"
        );

        let status = Command::new(&self.package.executable)
            .arg("--test-run")
            .arg("--config")
            .arg(&config_arg)
            .envs(&self.package.env)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                RkjmError::ExecutionError(format!("Failed to run '{}': {e}", self.package.executable))
            })?;

        if status.success() {
            info!("test package passed");
            return Ok(SmokeOutcome::Passed);
        }

        // No code means the child died from a signal
        let exit_code = status.code().unwrap_or(1);
        warn!(exit_code, "test package failed");
        Ok(SmokeOutcome::Failed { exit_code })
    }
}
