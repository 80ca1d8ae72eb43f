// CLI module for command-line interface

pub mod exports;
pub mod measure;
pub mod prepare;
pub mod resolve;
pub mod test_package;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::utils::config::{get_catalog_path, get_recipe_path};
use crate::utils::error::{Result, RkjmError};

use self::exports::ExportsCommand;
use self::measure::MeasureCommand;
use self::prepare::PrepareCommand;
use self::resolve::ResolveCommand;
use self::test_package::TestCommand;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "rkjm")]
#[command(about = "Build, export and test the robotkernel jitter measurement module")]
#[command(long_about = r#"rkjm packages the robotkernel jitter measurement module and runs its
measurement core outside of the kernel.

Features:
  • Single recipe.toml with an explicit schema revision
  • Version-range dependencies checked against a package catalog
  • Source export lists honoring VCS-ignored files
  • AC_INIT version stamping of configure templates
  • Test-package smoke runs that skip cross builds
  • Standalone jitter measurement with the module's own configuration

Examples:
  rkjm resolve --catalog catalog.toml   Check that all version ranges can be met
  rkjm exports --dest /tmp/export       Copy the exported sources
  rkjm prepare --version 2.3.0          Stamp configure.ac from its template
  rkjm test                             Run the test package
  rkjm measure --config module.yml      Measure trigger jitter"#)]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// All available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Stamp the package version into the configure template
    #[command(long_about = r#"Run the recipe's source-preparation step.

Reads the configure template named in the [prepare] section, rewrites its
first AC_INIT(...) line to AC_INIT([project], [version], [author]) and writes
the derived file. Only schema revisions 1 and 2 carry a [prepare] section.

Examples:
  rkjm prepare --version 2.3.0
  rkjm prepare --version 5.0.0 --source-dir ../module_jitter_measurement"#)]
    Prepare {
        /// Recipe file
        #[arg(long, default_value_os_t = get_recipe_path())]
        recipe: PathBuf,
        /// Package version written into AC_INIT
        #[arg(long)]
        version: String,
        /// Source root holding the template
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List or copy the exported source files
    #[command(long_about = r#"Compute the export list from the recipe's [exports] rules.

Files matching an include pattern and no exclude pattern are exported. With
vcs_ignored = true (schema 1 to 3) files ignored by git are left out as well.

Examples:
  rkjm exports                          List exported files
  rkjm exports --dest /tmp/export       Copy them into a directory
  rkjm exports --json                   Machine-readable list"#)]
    Exports {
        /// Recipe file
        #[arg(long, default_value_os_t = get_recipe_path())]
        recipe: PathBuf,
        /// Source root to export from
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,
        /// Copy the files into this directory
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the declared version ranges can be met together
    #[command(long_about = r#"Resolve the recipe's requirements against a package catalog.

For every required package the highest catalog version lying in all declared
ranges is chosen. The command fails when any package cannot be resolved.

Examples:
  rkjm resolve --catalog catalog.toml
  rkjm resolve --recipe recipe.toml --catalog catalog.toml --json"#)]
    Resolve {
        /// Recipe file
        #[arg(long, default_value_os_t = get_recipe_path())]
        recipe: PathBuf,
        /// Package catalog
        #[arg(long, default_value_os_t = get_catalog_path())]
        catalog: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the test package against the host framework
    #[command(long_about = r#"Copy the test configuration into the working directory and run
`<executable> --test-run --config ./<config>` there.

The process exits with the executable's exit code. When the target platform
cannot run on this host the run is skipped with a warning and exits 0.

Examples:
  rkjm test
  rkjm test --target-os Windows         Cross build: skipped"#)]
    Test {
        /// Recipe file
        #[arg(long, default_value_os_t = get_recipe_path())]
        recipe: PathBuf,
        /// Directory the test config is read from (default: the recipe's directory)
        #[arg(long)]
        recipe_dir: Option<PathBuf>,
        /// Working directory for the run (default: <recipe-dir>/build)
        #[arg(long)]
        work_dir: Option<PathBuf>,
        /// Target operating system (default: host)
        #[arg(long)]
        target_os: Option<String>,
        /// Target architecture (default: host)
        #[arg(long)]
        target_arch: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Measure trigger jitter with a module configuration
    #[command(long_about = r#"Run the jitter measurement module on a periodic software trigger.

The module is configured from a YAML module configuration, taken to OP,
triggered every --period-us microseconds and taken back to INIT. Statistics
are logged for every filled buffer.

Examples:
  rkjm measure --config module.yml
  rkjm measure --config module.yml --period-us 500 --ticks 20000
  rkjm measure --config module.yml --test-run --json"#)]
    Measure {
        /// Module configuration (YAML)
        #[arg(long)]
        config: PathBuf,
        /// Module instance name
        #[arg(long, default_value = "jitter_measurement")]
        name: String,
        /// Trigger period in microseconds
        #[arg(long, default_value_t = 1000)]
        period_us: u64,
        /// Number of triggers (default: 10 buffers, 2 with --test-run)
        #[arg(long)]
        ticks: Option<u64>,
        /// Short run that fails unless a buffer was analyzed
        #[arg(long)]
        test_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// CLI command dispatcher
pub struct CliDispatcher;

impl CliDispatcher {
    /// Execute a CLI command, returning the process exit code
    pub async fn execute(command: Commands) -> Result<i32> {
        match command {
            Commands::Prepare { recipe, version, source_dir, json } => {
                let cmd = PrepareCommand {
                    recipe,
                    version,
                    source_dir,
                    json,
                };
                cmd.run().map(|()| 0)
            }

            Commands::Exports { recipe, source_dir, dest, json } => {
                let cmd = ExportsCommand {
                    recipe,
                    source_dir,
                    dest,
                    json,
                };
                cmd.run().map(|()| 0)
            }

            Commands::Resolve { recipe, catalog, json } => {
                let cmd = ResolveCommand { recipe, catalog, json };
                cmd.run().map(|()| 0)
            }

            Commands::Test {
                recipe,
                recipe_dir,
                work_dir,
                target_os,
                target_arch,
                json,
            } => {
                let cmd = TestCommand {
                    recipe,
                    recipe_dir,
                    work_dir,
                    target_os,
                    target_arch,
                    json,
                };
                cmd.run().await
            }

            Commands::Measure {
                config,
                name,
                period_us,
                ticks,
                test_run,
                json,
            } => {
                let cmd = MeasureCommand {
                    config,
                    name,
                    period_us,
                    ticks,
                    test_run,
                    json,
                };
                cmd.run().await.map(|()| 0)
            }
        }
    }
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| RkjmError::ExecutionError(format!("Failed to serialize JSON response: {e}")))?;
    println!("{output}");
    Ok(())
}
