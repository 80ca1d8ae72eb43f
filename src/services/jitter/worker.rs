use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

use super::analyzer::Analyzer;
use crate::utils::error::{Result, RkjmError};

/// How long the worker waits for a buffer before rechecking its stop flag
const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Background thread analyzing filled buffers off the trigger path
pub struct PrintWorker {
    running: Arc<AtomicBool>,
    buffers: Option<Sender<Vec<u64>>>,
    handle: Option<JoinHandle<()>>,
}

impl PrintWorker {
    /// Start the worker; processed buffers are sent back on `recycle`
    pub fn spawn(name: &str, analyzer: Arc<Analyzer>, recycle: Sender<Vec<u64>>) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name(format!("{name}-print"))
            .spawn(move || run(&flag, &rx, &analyzer, &recycle))
            .map_err(|e| RkjmError::ExecutionError(format!("Cannot start print worker: {e}")))?;

        debug!(module = name, "print worker started");
        Ok(Self {
            running,
            buffers: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue a full buffer, handing it back if the worker is gone
    pub fn submit(&self, buffer: Vec<u64>) -> std::result::Result<(), Vec<u64>> {
        match &self.buffers {
            Some(tx) => tx.send(buffer).map_err(|e| e.0),
            None => Err(buffer),
        }
    }

    /// Stop the worker and wait for it to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.buffers = None;

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("print worker panicked");
            }
        }
    }
}

impl Drop for PrintWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(running: &AtomicBool, buffers: &Receiver<Vec<u64>>, analyzer: &Analyzer, recycle: &Sender<Vec<u64>>) {
    // Queued buffers are drained before the disconnect is seen
    loop {
        match buffers.recv_timeout(RECV_TIMEOUT) {
            Ok(buffer) => {
                analyzer.process(&buffer);
                // The trigger side may already be gone
                let _ = recycle.send(buffer);
            }
            Err(RecvTimeoutError::Timeout) if running.load(Ordering::SeqCst) => {}
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("print worker stopped");
}
