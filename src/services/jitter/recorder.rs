/// Double-buffered timestamp recorder for the trigger path
///
/// Timestamps go into the active buffer. When it fills, it is handed out
/// and a spare buffer takes its place; spares come back through
/// [`TimestampRecorder::recycle`] once the consumer is done with them.
#[derive(Debug)]
pub struct TimestampRecorder {
    capacity: usize,
    active: Vec<u64>,
    spare: Option<Vec<u64>>,
    latest: Option<u64>,
    previous: Option<u64>,
}

impl TimestampRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            active: Vec::with_capacity(capacity),
            spare: Some(Vec::with_capacity(capacity)),
            latest: None,
            previous: None,
        }
    }

    /// Timestamps in the active buffer
    pub fn position(&self) -> usize {
        self.active.len()
    }

    /// Append a timestamp, returning the full buffer when it fills
    pub fn record(&mut self, ts: u64) -> Option<Vec<u64>> {
        self.previous = self.latest.replace(ts);
        self.active.push(ts);

        if self.active.len() < self.capacity {
            return None;
        }

        let next = self
            .spare
            .take()
            .unwrap_or_else(|| Vec::with_capacity(self.capacity));
        Some(std::mem::replace(&mut self.active, next))
    }

    /// Return a processed buffer for reuse
    pub fn recycle(&mut self, mut buffer: Vec<u64>) {
        buffer.clear();
        if self.spare.is_none() {
            self.spare = Some(buffer);
        }
    }

    /// Ticks between the two latest timestamps, across buffer swaps
    pub fn last_period(&self) -> Option<u64> {
        Some(self.latest?.saturating_sub(self.previous?))
    }
}
