use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Control line pulsed on the serial port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseSignal {
    /// RTS up then down
    Rts,
    /// RTS down then up
    RtsNeg,
    /// DTR up then down
    Dtr,
    /// DTR down then up
    DtrNeg,
}

impl FromStr for PulseSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rts" => Ok(Self::Rts),
            "rts_neg" => Ok(Self::RtsNeg),
            "dtr" => Ok(Self::Dtr),
            "dtr_neg" => Ok(Self::DtrNeg),
            _ => Err(format!("Unknown pulse signal '{s}' (rts, rts_neg, dtr, dtr_neg)")),
        }
    }
}

impl fmt::Display for PulseSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rts => "rts",
            Self::RtsNeg => "rts_neg",
            Self::Dtr => "dtr",
            Self::DtrNeg => "dtr_neg",
        };
        write!(f, "{name}")
    }
}

/// Serial port used to make triggers and new max-ever events visible on a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtyControlConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub pulse_on_trigger: Option<PulseSignal>,
    #[serde(default)]
    pub pulse_on_new_max_ever: Option<PulseSignal>,
}

fn default_port() -> String {
    "/dev/ttyS0".to_string()
}

/// Module configuration as found in the kernel's module list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Timestamps per analysis window
    pub buffer_size: usize,
    /// Clock ticks per second, 1 requests calibration
    #[serde(default = "default_cps")]
    pub cps: u64,
    /// Analyze filled buffers on a worker thread instead of the trigger thread
    #[serde(default = "default_threaded")]
    pub threaded: bool,
    /// Shell command run on a new max ever
    #[serde(default)]
    pub new_maxever_command: String,
    /// Max ever in microseconds above which the command runs
    #[serde(default = "default_threshold")]
    pub new_maxever_command_threshold: u64,
    #[serde(default)]
    pub tty_control_signals: Option<TtyControlConfig>,
}

const fn default_cps() -> u64 {
    1
}

const fn default_threaded() -> bool {
    true
}

const fn default_threshold() -> u64 {
    50
}

impl ModuleConfig {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            cps: default_cps(),
            threaded: default_threaded(),
            new_maxever_command: String::new(),
            new_maxever_command_threshold: default_threshold(),
            tty_control_signals: None,
        }
    }

    /// Whether clocks per second must be measured at configure time
    pub fn needs_calibration(&self) -> bool {
        self.cps == 1
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_size < 2 {
            return Err(format!(
                "buffer_size must be at least 2 (got {})",
                self.buffer_size
            ));
        }

        if self.cps == 0 {
            return Err("cps cannot be 0 (use 1 to calibrate)".to_string());
        }

        if let Some(tty) = &self.tty_control_signals {
            if tty.port.trim().is_empty() {
                return Err("tty_control_signals.port cannot be empty".to_string());
            }
        }

        Ok(())
    }
}
