//! Timestamp sources for the trigger path.
//!
//! Timestamps are plain tick counts; the module converts them with its
//! clocks-per-second value, which is either configured or measured here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Sleep used to measure clocks per second
const CALIBRATION_SLEEP: Duration = Duration::from_millis(10);

/// A monotonic tick counter
pub trait Clock: Send + Sync {
    /// Current tick count
    fn now(&self) -> u64;
}

/// Nanoseconds since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            ticks: AtomicU64::new(start),
        }
    }

    pub fn set(&self, ticks: u64) {
        self.ticks.store(ticks, Ordering::SeqCst);
    }

    pub fn advance(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }
}

/// Measure clock ticks per wall-clock second
///
/// Sleeps for 10 ms and compares the tick delta with the elapsed time.
/// Never returns less than 1.
pub fn calibrate(clock: &dyn Clock) -> u64 {
    info!("calibrating clocks/sec");

    let begin_time = Instant::now();
    let begin = clock.now();

    std::thread::sleep(CALIBRATION_SLEEP);

    let end = clock.now();
    let elapsed = begin_time.elapsed().as_secs_f64();
    info!(seconds = elapsed, "calibration sleep finished");

    let cps = (end.saturating_sub(begin) as f64 / elapsed) as u64;
    let cps = cps.max(1);
    info!(cps, "got clocks/sec");
    cps
}
