use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use std::process::Command;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use super::clock::Clock;
use super::statistics::{self, CycleStats};
use super::tty::{self, TtyControl};
use crate::models::module_config::PulseSignal;
use crate::models::process_data::{JitterInputs, JitterOutputs};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Seconds since the unix epoch, as a float
pub fn unix_seconds(now: DateTime<Utc>) -> f64 {
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) * 1e-9
}

/// Format unix seconds as local `HH:MM:SS.ffff`
///
/// The fraction is truncated to four digits and clamped to 9999.
pub fn format_time_of_day(unix_seconds: f64) -> String {
    let whole = unix_seconds.trunc();
    let fraction = ((unix_seconds - whole) * 10_000.0) as u32;
    let fraction = fraction.min(9_999);

    match Local.timestamp_opt(whole as i64, 0).single() {
        Some(time) => format!("{}.{fraction:04}", time.format("%H:%M:%S")),
        None => format!("??:??:??.{fraction:04}"),
    }
}

/// Command line run on a new max ever
pub fn max_ever_command_line(command: &str, max_ever: u64, time_of_day: &str) -> String {
    format!("{command} {max_ever} {time_of_day}")
}

/// Reaction to a new max ever beyond the analysis itself
#[derive(Debug, Clone, Default)]
pub struct MaxEverActions {
    /// Shell command, empty to disable
    pub command: String,
    /// Max ever in microseconds the command requires
    pub threshold: u64,
    pub pulse: Option<PulseSignal>,
}

/// One analyzed buffer as reported to the log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub stats: CycleStats,
    /// Max ever after this buffer, clamp applied
    pub max_ever_us: u64,
    /// Local time of day of the max ever, if one is recorded
    pub max_ever_time: Option<String>,
    /// Command line run for a new max ever
    pub command: Option<String>,
}

#[derive(Debug, Default)]
struct MaxEverState {
    inputs: JitterInputs,
    time_of_day: Option<String>,
}

/// Measurement state shared between the trigger path, the print worker and services
pub struct Analyzer {
    cps: u64,
    clock: Arc<dyn Clock>,
    state: Mutex<MaxEverState>,
    outputs: Mutex<JitterOutputs>,
    last_report: Mutex<Option<CycleReport>>,
    actions: MaxEverActions,
    tty: Option<Arc<TtyControl>>,
}

impl Analyzer {
    pub fn new(cps: u64, clock: Arc<dyn Clock>, actions: MaxEverActions, tty: Option<Arc<TtyControl>>) -> Self {
        Self {
            cps,
            clock,
            state: Mutex::new(MaxEverState::default()),
            outputs: Mutex::new(JitterOutputs::default()),
            last_report: Mutex::new(None),
            actions,
            tty,
        }
    }

    pub fn cps(&self) -> u64 {
        self.cps
    }

    pub fn inputs(&self) -> JitterInputs {
        lock(&self.state).inputs
    }

    pub fn outputs(&self) -> JitterOutputs {
        *lock(&self.outputs)
    }

    pub fn set_outputs(&self, outputs: JitterOutputs) {
        *lock(&self.outputs) = outputs;
    }

    pub fn last_report(&self) -> Option<CycleReport> {
        lock(&self.last_report).clone()
    }

    /// Publish the latest trigger timestamp, returning the input image
    pub fn record_timestamp(&self, ts: u64) -> JitterInputs {
        let mut state = lock(&self.state);
        state.inputs.last_ts = ts;
        state.inputs
    }

    /// Clear the max ever, returning its previous value
    pub fn reset_max_ever(&self) -> u64 {
        let mut state = lock(&self.state);
        let previous = state.inputs.max_ever;
        state.inputs.max_ever = 0;
        state.inputs.max_ever_time = 0.0;
        state.time_of_day = None;
        info!(previous, "max ever reset");
        previous
    }

    /// Analyze a filled buffer and publish the results
    pub fn process(&self, timestamps: &[u64]) -> CycleReport {
        let clamp = self.outputs().max_ever_clamp;
        let now = Utc::now();

        let (report, seconds_ago) = {
            let mut state = lock(&self.state);
            let stats = statistics::analyze(timestamps, self.cps, state.inputs.max_ever);

            state.inputs.last_cycle = stats.cycle_us;
            state.inputs.last_max = stats.jitter_max_us;

            if let Some(new) = stats.new_max_ever {
                tty::pulse(self.tty.as_deref(), self.actions.pulse);

                let ago = self.clock.now().saturating_sub(new.at_ticks) as f64 / self.cps as f64;
                info!("new max ever is {:.3}ms ago", ago * 1e3);

                state.inputs.max_ever = new.value_us;
                state.inputs.max_ever_time = unix_seconds(now) - ago;
                state.time_of_day = Some(format_time_of_day(state.inputs.max_ever_time));
            }

            if clamp != 0 && state.inputs.max_ever > clamp {
                state.inputs.max_ever = clamp;
            }

            let command = match (&stats.new_max_ever, &state.time_of_day) {
                (Some(_), Some(time_of_day))
                    if !self.actions.command.is_empty() && state.inputs.max_ever > self.actions.threshold =>
                {
                    Some(max_ever_command_line(
                        &self.actions.command,
                        state.inputs.max_ever,
                        time_of_day,
                    ))
                }
                _ => None,
            };

            let report = CycleReport {
                stats,
                max_ever_us: state.inputs.max_ever,
                max_ever_time: state.time_of_day.clone(),
                command,
            };
            let seconds_ago = unix_seconds(now) - state.inputs.max_ever_time;
            (report, seconds_ago)
        };

        let running = report
            .max_ever_time
            .as_ref()
            .map(|time| format!(" (at {time}, {seconds_ago:.1}s ago)"))
            .unwrap_or_default();

        info!(
            "mean period: {:4}us, jitter mean: {:2}us, max {:4}us, max ever {:4}us{}",
            report.stats.cycle_us,
            report.stats.jitter_mean_us,
            report.stats.jitter_max_us,
            report.max_ever_us,
            running
        );

        if let Some(command) = &report.command {
            run_command(command);
        }

        *lock(&self.last_report) = Some(report.clone());
        report
    }
}

fn run_command(command: &str) {
    info!(command, "execute new_maxever_command");
    match Command::new("sh").arg("-c").arg(command).status() {
        Ok(status) if status.success() => {}
        Ok(status) => warn!(command, %status, "new_maxever_command failed"),
        Err(e) => warn!(command, error = %e, "cannot run new_maxever_command"),
    }
}
