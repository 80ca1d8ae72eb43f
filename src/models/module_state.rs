use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Module state machine states, ordered from least to most active
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    Boot,
    Init,
    PreOp,
    SafeOp,
    Op,
}

impl ModuleState {
    /// Whether measurements are produced in this state
    pub fn is_measuring(self) -> bool {
        self >= Self::SafeOp
    }

    /// Whether commands (output process data) are consumed in this state
    pub fn accepts_commands(self) -> bool {
        self == Self::Op
    }

    pub fn all() -> &'static [Self] {
        &[Self::Boot, Self::Init, Self::PreOp, Self::SafeOp, Self::Op]
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boot => "<BOOT>",
            Self::Init => "<INIT>",
            Self::PreOp => "<PREOP>",
            Self::SafeOp => "<SAFEOP>",
            Self::Op => "<OP>",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ModuleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_matches(|c| c == '<' || c == '>').to_lowercase().as_str() {
            "boot" => Ok(Self::Boot),
            "init" => Ok(Self::Init),
            "preop" => Ok(Self::PreOp),
            "safeop" => Ok(Self::SafeOp),
            "op" => Ok(Self::Op),
            _ => Err(format!("Unknown module state '{s}'")),
        }
    }
}
