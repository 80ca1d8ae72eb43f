use serde::{Deserialize, Serialize};

/// Layout of the input process data, one `type: name` entry per field
pub const PDIN_DEFINITION: &str = "uint64_t: max_ever\n\
uint64_t: last_max\n\
uint64_t: last_cycle\n\
uint64_t: last_ts\n\
double: max_ever_time\n";

/// Layout of the output process data
pub const PDOUT_DEFINITION: &str = "uint64_t: max_ever_clamp\n";

/// Measurements published by the module
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JitterInputs {
    /// Largest jitter ever seen, in microseconds
    pub max_ever: u64,
    /// Largest jitter of the last analyzed buffer, in microseconds
    pub last_max: u64,
    /// Mean period of the last analyzed buffer, in microseconds
    pub last_cycle: u64,
    /// Clock ticks of the latest trigger
    pub last_ts: u64,
    /// Unix time of the latest max-ever increase, 0 when unset
    pub max_ever_time: f64,
}

impl JitterInputs {
    pub const SIZE: usize = 40;

    /// Packed little-endian image in definition order
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.extend_from_slice(&self.max_ever.to_le_bytes());
        bytes.extend_from_slice(&self.last_max.to_le_bytes());
        bytes.extend_from_slice(&self.last_cycle.to_le_bytes());
        bytes.extend_from_slice(&self.last_ts.to_le_bytes());
        bytes.extend_from_slice(&self.max_ever_time.to_le_bytes());
        bytes
    }
}

/// Commands accepted by the module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitterOutputs {
    /// Upper bound applied to `max_ever`, 0 disables the clamp
    pub max_ever_clamp: u64,
}

impl JitterOutputs {
    pub const SIZE: usize = 8;

    pub fn to_bytes(&self) -> Vec<u8> {
        self.max_ever_clamp.to_le_bytes().to_vec()
    }

    /// Decode a packed image, `None` if the length is wrong
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; Self::SIZE] = bytes.try_into().ok()?;
        Some(Self {
            max_ever_clamp: u64::from_le_bytes(raw),
        })
    }
}
