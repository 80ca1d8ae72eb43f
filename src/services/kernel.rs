use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::utils::error::{Result, RkjmError};

/// Kind of device a module publishes to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    ProcessData,
    Trigger,
    ProcessDataInspection,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProcessData => "process data",
            Self::Trigger => "trigger",
            Self::ProcessDataInspection => "process data inspection",
        };
        write!(f, "{name}")
    }
}

/// Service callback; the response is a list of integers
pub type ServiceHandler = Arc<dyn Fn() -> Vec<u64> + Send + Sync>;

/// Trigger callback, receives the trigger timestamp
pub type TriggerHandler = Arc<dyn Fn(u64) + Send + Sync>;

#[derive(Debug, Clone)]
struct Device {
    kind: DeviceKind,
    /// Layout of a process data device, `type: name` per line
    definition: Option<String>,
}

/// Host-side registry of devices, services and trigger subscriptions
#[derive(Default)]
pub struct Kernel {
    devices: Mutex<BTreeMap<String, Device>>,
    services: Mutex<BTreeMap<String, ServiceHandler>>,
    subscribers: Mutex<BTreeMap<String, Vec<TriggerHandler>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Kernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&self, name: &str, kind: DeviceKind) {
        self.insert_device(name, Device { kind, definition: None });
    }

    /// Add a process data device together with its layout definition
    pub fn add_process_data(&self, name: &str, definition: &str) {
        self.insert_device(
            name,
            Device {
                kind: DeviceKind::ProcessData,
                definition: Some(definition.to_string()),
            },
        );
    }

    fn insert_device(&self, name: &str, device: Device) {
        let kind = device.kind;
        if lock(&self.devices).insert(name.to_string(), device).is_some() {
            warn!(device = name, "device registered twice");
        } else {
            debug!(device = name, kind = %kind, "device added");
        }
    }

    pub fn remove_device(&self, name: &str) {
        if lock(&self.devices).remove(name).is_some() {
            debug!(device = name, "device removed");
        }
    }

    pub fn has_device(&self, name: &str) -> bool {
        lock(&self.devices).contains_key(name)
    }

    /// Registered devices, sorted by name
    pub fn devices(&self) -> Vec<(String, DeviceKind)> {
        lock(&self.devices)
            .iter()
            .map(|(name, device)| (name.clone(), device.kind))
            .collect()
    }

    /// Layout definition of a registered process data device
    pub fn process_data_definition(&self, name: &str) -> Option<String> {
        lock(&self.devices).get(name)?.definition.clone()
    }

    pub fn add_service(&self, name: &str, handler: ServiceHandler) {
        lock(&self.services).insert(name.to_string(), handler);
        debug!(service = name, "service registered");
    }

    pub fn remove_service(&self, name: &str) {
        lock(&self.services).remove(name);
    }

    pub fn services(&self) -> Vec<String> {
        lock(&self.services).keys().cloned().collect()
    }

    /// Call a registered service
    pub fn call_service(&self, name: &str) -> Result<Vec<u64>> {
        // Release the registry lock before running the handler
        let handler = lock(&self.services)
            .get(name)
            .cloned()
            .ok_or_else(|| RkjmError::ExecutionError(format!("Service '{name}' not registered")))?;
        Ok(handler())
    }

    /// Subscribe to a trigger device
    pub fn subscribe(&self, trigger: &str, handler: TriggerHandler) {
        lock(&self.subscribers)
            .entry(trigger.to_string())
            .or_default()
            .push(handler);
    }

    /// Run every subscriber of `trigger`, if the trigger device is registered
    pub fn trigger(&self, trigger: &str, ts: u64) {
        if !self.has_device(trigger) {
            return;
        }

        let handlers = lock(&self.subscribers).get(trigger).cloned().unwrap_or_default();
        for handler in handlers {
            handler(ts);
        }
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("devices", &self.devices())
            .field("services", &self.services())
            .finish_non_exhaustive()
    }
}
