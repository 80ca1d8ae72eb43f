//! The jitter measurement module.
//!
//! Every trigger is timestamped; timestamps fill one of two buffers and each
//! full buffer is analyzed for mean period, RMS jitter, max jitter and the
//! sticky max-ever jitter. Results are published as input process data and
//! through the `reset_max_ever` / `get_cps` services.

pub mod analyzer;
pub mod clock;
pub mod recorder;
pub mod statistics;
pub mod tty;
pub mod worker;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, error, info};

use self::analyzer::{Analyzer, CycleReport, MaxEverActions};
use self::clock::{Clock, MonotonicClock};
use self::recorder::TimestampRecorder;
use self::tty::TtyControl;
use self::worker::PrintWorker;
use crate::models::module_config::{ModuleConfig, PulseSignal};
use crate::models::module_state::ModuleState;
use crate::models::process_data::{JitterInputs, JitterOutputs, PDIN_DEFINITION, PDOUT_DEFINITION};
use crate::services::kernel::{DeviceKind, Kernel};
use crate::utils::error::{Result, RkjmError};

/// Names under which the module registers with the kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNames {
    pub inputs: String,
    pub inputs_trigger: String,
    pub outputs: String,
    pub inspection: String,
    pub reset_max_ever: String,
    pub get_cps: String,
}

impl DeviceNames {
    pub fn new(module: &str) -> Self {
        Self {
            inputs: format!("{module}.inputs"),
            inputs_trigger: format!("{module}.inputs.trigger"),
            outputs: format!("{module}.outputs"),
            inspection: format!("{module}.jitter"),
            reset_max_ever: format!("{module}.reset_max_ever"),
            get_cps: format!("{module}.get_cps"),
        }
    }
}

/// A configured jitter measurement module instance
pub struct JitterMeasurement {
    name: String,
    config: ModuleConfig,
    devices: DeviceNames,
    kernel: Arc<Kernel>,
    clock: Arc<dyn Clock>,
    analyzer: Arc<Analyzer>,
    recorder: TimestampRecorder,
    recycle_tx: Sender<Vec<u64>>,
    recycle_rx: Receiver<Vec<u64>>,
    worker: Option<PrintWorker>,
    state: ModuleState,
    tty: Option<Arc<TtyControl>>,
    pulse_on_trigger: Option<PulseSignal>,
    dropped_buffers: u64,
}

impl JitterMeasurement {
    /// Configure the module with the monotonic clock
    pub fn configure(name: &str, config: ModuleConfig, kernel: Arc<Kernel>) -> Result<Self> {
        Self::with_clock(name, config, kernel, Arc::new(MonotonicClock::new()))
    }

    /// Configure the module on a given clock
    ///
    /// Calibrates clocks per second when the configuration asks for it and
    /// registers the module's services. Devices are added by [`Self::set_state`].
    pub fn with_clock(name: &str, config: ModuleConfig, kernel: Arc<Kernel>, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate().map_err(RkjmError::ValidationError)?;

        let cps = if config.needs_calibration() {
            clock::calibrate(clock.as_ref())
        } else {
            config.cps
        };

        let (tty, pulse_on_trigger, pulse_on_new_max_ever) = match &config.tty_control_signals {
            Some(signals) => match TtyControl::open(&signals.port) {
                Ok(port) => (
                    Some(Arc::new(port)),
                    signals.pulse_on_trigger,
                    signals.pulse_on_new_max_ever,
                ),
                Err(e) => {
                    error!(module = name, error = %e, "tty control signals disabled");
                    (None, None, None)
                }
            },
            None => (None, None, None),
        };

        let actions = MaxEverActions {
            command: config.new_maxever_command.clone(),
            threshold: config.new_maxever_command_threshold,
            pulse: pulse_on_new_max_ever,
        };
        let analyzer = Arc::new(Analyzer::new(cps, Arc::clone(&clock), actions, tty.clone()));

        let devices = DeviceNames::new(name);
        let reset = Arc::clone(&analyzer);
        kernel.add_service(&devices.reset_max_ever, Arc::new(move || vec![reset.reset_max_ever()]));
        let get_cps = Arc::clone(&analyzer);
        kernel.add_service(&devices.get_cps, Arc::new(move || vec![get_cps.cps()]));

        let (recycle_tx, recycle_rx) = mpsc::channel();

        info!(
            module = name,
            buffer_size = config.buffer_size,
            cps,
            threaded = config.threaded,
            "jitter measurement configured"
        );

        Ok(Self {
            name: name.to_string(),
            recorder: TimestampRecorder::new(config.buffer_size),
            config,
            devices,
            kernel,
            clock,
            analyzer,
            recycle_tx,
            recycle_rx,
            worker: None,
            state: ModuleState::Init,
            tty,
            pulse_on_trigger,
            dropped_buffers: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn cps(&self) -> u64 {
        self.analyzer.cps()
    }

    pub fn devices(&self) -> &DeviceNames {
        &self.devices
    }

    /// Full buffers discarded because no print worker was running
    pub fn dropped_buffers(&self) -> u64 {
        self.dropped_buffers
    }

    pub fn last_report(&self) -> Option<CycleReport> {
        self.analyzer.last_report()
    }

    /// Take one measurement
    ///
    /// Called on every trigger. A full buffer goes to the print worker when
    /// threaded, otherwise it is analyzed before returning.
    pub fn tick(&mut self) {
        tty::pulse(self.tty.as_deref(), self.pulse_on_trigger);

        let ts = self.clock.now();
        self.analyzer.record_timestamp(ts);
        self.kernel.trigger(&self.devices.inputs_trigger, ts);

        while let Ok(buffer) = self.recycle_rx.try_recv() {
            self.recorder.recycle(buffer);
        }

        let Some(full) = self.recorder.record(ts) else {
            return;
        };

        if !self.config.threaded {
            self.analyzer.process(&full);
            self.recorder.recycle(full);
            return;
        }

        let rejected = match &self.worker {
            Some(worker) => worker.submit(full).err(),
            None => Some(full),
        };

        if let Some(buffer) = rejected {
            self.dropped_buffers += 1;
            debug!(module = %self.name, "no print worker, buffer dropped");
            self.recorder.recycle(buffer);
        }
    }

    /// Latest trigger period in seconds, `None` before two triggers
    pub fn last_measurement(&self) -> Option<f64> {
        self.recorder
            .last_period()
            .map(|ticks| ticks as f64 / self.analyzer.cps() as f64)
    }

    /// Service: clear the max ever, returning the previous value
    pub fn reset_max_ever(&self) -> u64 {
        self.analyzer.reset_max_ever()
    }

    /// Service: clocks per second in use
    pub fn get_cps(&self) -> u64 {
        self.analyzer.cps()
    }

    /// Packed input process data
    pub fn get_pdin(&self) -> Vec<u8> {
        self.analyzer.inputs().to_bytes()
    }

    /// Packed output process data
    pub fn get_pdout(&self) -> Vec<u8> {
        self.analyzer.outputs().to_bytes()
    }

    pub fn inputs(&self) -> JitterInputs {
        self.analyzer.inputs()
    }

    /// Write output process data, as a consumer of the outputs device does
    pub fn write_pdout(&self, outputs: JitterOutputs) {
        self.analyzer.set_outputs(outputs);
    }

    /// Move the module to `target`, adding and removing devices on the way
    ///
    /// Every transition is accepted. Devices follow the target state:
    /// measuring states (SafeOp, Op) publish inputs, Op also consumes outputs.
    pub fn set_state(&mut self, target: ModuleState) -> Result<ModuleState> {
        let current = self.state;
        info!(module = %self.name, from = %current, to = %target, "state requested");

        if current.accepts_commands() && !target.accepts_commands() {
            self.kernel.remove_device(&self.devices.outputs);
        }

        if current.is_measuring() && !target.is_measuring() {
            self.stop_worker();
            self.kernel.remove_device(&self.devices.inputs_trigger);
            self.kernel.remove_device(&self.devices.inputs);
            self.kernel.remove_device(&self.devices.inspection);
        }

        if !current.is_measuring() && target.is_measuring() {
            if self.config.threaded {
                self.start_worker()?;
            }
            self.kernel.add_device(&self.devices.inspection, DeviceKind::ProcessDataInspection);
            self.kernel.add_process_data(&self.devices.inputs, PDIN_DEFINITION);
            self.kernel.add_device(&self.devices.inputs_trigger, DeviceKind::Trigger);
        }

        if !current.accepts_commands() && target.accepts_commands() {
            self.kernel.add_process_data(&self.devices.outputs, PDOUT_DEFINITION);
        }

        self.state = target;
        Ok(target)
    }

    fn start_worker(&mut self) -> Result<()> {
        if self.worker.is_none() {
            self.worker = Some(PrintWorker::spawn(
                &self.name,
                Arc::clone(&self.analyzer),
                self.recycle_tx.clone(),
            )?);
        }
        Ok(())
    }

    fn stop_worker(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
    }
}

impl Drop for JitterMeasurement {
    fn drop(&mut self) {
        self.stop_worker();
        self.kernel.remove_service(&self.devices.reset_max_ever);
        self.kernel.remove_service(&self.devices.get_cps);
    }
}
