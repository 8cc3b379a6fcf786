//! Inter-event interval bookkeeping

use eod_core::Event;
use std::time::Duration;

/// Turns detections into events and keeps the interval log
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    previous: Duration,
    intervals: Vec<Duration>,
}

impl EventRecorder {
    /// Recorder whose first interval is measured from `start`
    pub fn new(start: Duration) -> Self {
        Self {
            previous: start,
            intervals: Vec::new(),
        }
    }

    /// Record a detection at `sample_index` observed at `now`
    pub fn record(&mut self, sample_index: u64, now: Duration) -> Event {
        let interval = now.saturating_sub(self.previous);
        self.intervals.push(interval);
        self.previous = now;

        Event {
            sample_index,
            occurred_at: now,
            interval_since_previous: Some(interval),
        }
    }

    /// Interval log, first entry measured from session start
    pub fn intervals(&self) -> &[Duration] {
        &self.intervals
    }

    pub fn event_count(&self) -> u64 {
        self.intervals.len() as u64
    }
}
