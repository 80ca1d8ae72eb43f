use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::cli::print_json;
use crate::models::module_state::ModuleState;
use crate::models::process_data::JitterInputs;
use crate::services::jitter::analyzer::CycleReport;
use crate::services::jitter::JitterMeasurement;
use crate::services::kernel::Kernel;
use crate::utils::config::ConfigParser;
use crate::utils::error::{Result, RkjmError};

/// Buffers filled by default
const DEFAULT_BUFFERS: u64 = 10;
/// Buffers filled by a test run
const TEST_RUN_BUFFERS: u64 = 2;

/// Measure trigger jitter with a module configuration
#[derive(Debug, Args)]
pub struct MeasureCommand {
    /// Module configuration (YAML)
    #[arg(long)]
    pub config: PathBuf,

    /// Module instance name
    #[arg(long)]
    pub name: String,

    /// Trigger period in microseconds
    #[arg(long)]
    pub period_us: u64,

    /// Number of triggers
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Short run that fails unless a buffer was analyzed
    #[arg(long)]
    pub test_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON response format for measure command
#[derive(Debug, Serialize)]
pub struct MeasureResponse {
    pub module: String,
    pub cps: u64,
    pub ticks: u64,
    pub inputs: JitterInputs,
    pub last_report: Option<CycleReport>,
    pub dropped_buffers: u64,
}

impl MeasureCommand {
    pub async fn run(&self) -> Result<()> {
        let config = ConfigParser::load_module_config(&self.config)?;
        let buffers = if self.test_run { TEST_RUN_BUFFERS } else { DEFAULT_BUFFERS };
        let ticks = match self.ticks {
            Some(ticks) => ticks,
            None => u64::try_from(config.buffer_size)
                .ok()
                .and_then(|size| size.checked_mul(buffers))
                .ok_or_else(|| {
                    RkjmError::ValidationError(format!(
                        "buffer_size {} is too large to derive a trigger count",
                        config.buffer_size
                    ))
                })?,
        };
        let period = Duration::from_micros(self.period_us);
        // The last deadline must be representable
        let last_deadline = self
            .period_us
            .checked_mul(ticks)
            .and_then(|total_us| Instant::now().checked_add(Duration::from_micros(total_us)));
        if last_deadline.is_none() {
            return Err(RkjmError::ValidationError(format!(
                "{ticks} triggers every {}us exceed the supported run time",
                self.period_us
            )));
        }
        let name = self.name.clone();

        // The trigger loop sleeps; keep it off the async runtime
        let response = tokio::task::spawn_blocking(move || -> Result<MeasureResponse> {
            let kernel = Arc::new(Kernel::new());
            let mut module = JitterMeasurement::configure(&name, config, kernel)?;
            module.set_state(ModuleState::Op)?;

            info!(module = %name, ticks, period_us = period.as_micros() as u64, "measuring");
            let start = Instant::now();
            let mut deadline = start;
            for _ in 0..ticks {
                module.tick();
                // Deadlines are absolute so sleep overshoot does not accumulate
                deadline += period;
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
            }

            module.set_state(ModuleState::Init)?;

            Ok(MeasureResponse {
                module: name,
                cps: module.cps(),
                ticks,
                inputs: module.inputs(),
                last_report: module.last_report(),
                dropped_buffers: module.dropped_buffers(),
            })
        })
        .await
        .map_err(|e| RkjmError::ExecutionError(format!("Measurement task failed: {e}")))??;

        if self.test_run && response.last_report.is_none() {
            return Err(RkjmError::ExecutionError(format!(
                "No buffer analyzed after {} triggers",
                response.ticks
            )));
        }

        if self.json {
            return print_json(&response);
        }

        println!("Module:          {}", response.module);
        println!("Clocks/sec:      {}", response.cps);
        println!("Triggers:        {}", response.ticks);
        println!("Mean period:     {}us", response.inputs.last_cycle);
        println!("Last max jitter: {}us", response.inputs.last_max);
        println!("Max ever jitter: {}us", response.inputs.max_ever);
        if let Some(time) = response.last_report.as_ref().and_then(|r| r.max_ever_time.as_ref()) {
            println!("Max ever at:     {time}");
        }

        Ok(())
    }
}
