//! Session clocks
//!
//! Event times either come from the wall clock, as on live hardware, or are
//! derived from the tick index, which makes replayed recordings and tests
//! independent of how fast the host processes them.

use std::time::{Duration, Instant};

/// Source of session-relative time
pub trait Clock: Send {
    /// Time since session start as seen at tick `tick`
    fn now(&self, tick: u64) -> Duration;
}

/// Real elapsed time since construction
#[derive(Debug, Clone)]
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for WallClock {
    fn now(&self, _tick: u64) -> Duration {
        self.start.elapsed()
    }
}

/// Nominal time of a tick at a fixed sample rate
#[derive(Debug, Clone, Copy)]
pub struct SampleClock {
    samples_per_second: u32,
}

impl SampleClock {
    pub fn new(samples_per_second: u32) -> Self {
        Self {
            samples_per_second: samples_per_second.max(1),
        }
    }
}

impl Clock for SampleClock {
    fn now(&self, tick: u64) -> Duration {
        let rate = self.samples_per_second as u64;
        let secs = tick / rate;
        let nanos = (tick % rate) * 1_000_000_000 / rate;
        Duration::new(secs, nanos as u32)
    }
}
