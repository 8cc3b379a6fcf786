//! Detection events and session results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A detected discharge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Tick at which the envelope crossed into the detection band
    pub sample_index: u64,
    /// Session clock reading at detection
    pub occurred_at: Duration,
    /// Time since the previous event, or since session start for the first one
    pub interval_since_previous: Option<Duration>,
}

/// Request to draw the corrected trace around a finished detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationRequest {
    /// Tick that ended the refractory period
    pub sample_index: u64,
    /// Corrected values, oldest first
    pub samples: Vec<i32>,
}

/// Why a capture session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Requested sample count reached
    SampleLimit,
    /// Source reported end of stream
    EndOfStream,
    /// Stop signal from keyboard, interrupt or window close
    Interrupted,
    /// Source failed mid-run
    AcquisitionFailed,
    /// Trace output could not be written
    OutputFailed,
    /// Pipeline rejected a buffer operation
    PipelineFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::SampleLimit => write!(f, "sample limit reached"),
            StopReason::EndOfStream => write!(f, "end of stream"),
            StopReason::Interrupted => write!(f, "interrupted"),
            StopReason::AcquisitionFailed => write!(f, "acquisition failed"),
            StopReason::OutputFailed => write!(f, "output failed"),
            StopReason::PipelineFailed => write!(f, "pipeline failed"),
        }
    }
}

/// Statistics written at the end of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub ticks: u64,
    pub detected_events: u64,
    pub dropped_samples: u64,
    pub slow_ticks: u64,
    pub duration: Duration,
    pub events_per_second: f64,
    pub samples_per_second: f64,
    pub stop_reason: StopReason,
    /// Sink calls that returned an error; sinks never stop a session
    #[serde(default)]
    pub sink_failures: u64,
}

impl SessionSummary {
    /// Derive rates from raw counts; a zero duration yields zero rates
    pub fn new(
        ticks: u64,
        detected_events: u64,
        dropped_samples: u64,
        slow_ticks: u64,
        duration: Duration,
        stop_reason: StopReason,
    ) -> Self {
        let secs = duration.as_secs_f64();
        let rate = |count: u64| if secs > 0.0 { count as f64 / secs } else { 0.0 };

        Self {
            ticks,
            detected_events,
            dropped_samples,
            slow_ticks,
            duration,
            events_per_second: rate(detected_events),
            samples_per_second: rate(ticks),
            stop_reason,
            sink_failures: 0,
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "duration in seconds: {}", self.duration.as_secs_f64())?;
        writeln!(f, "samples per second: {}", self.samples_per_second)?;
        writeln!(f, "number of detected EOD: {}", self.detected_events)?;
        writeln!(f, "EOD per second: {}", self.events_per_second)?;
        write!(f, "dropped samples: {} ({})", self.dropped_samples, self.stop_reason)?;
        if self.sink_failures > 0 {
            write!(f, "\nsink failures: {}", self.sink_failures)?;
        }
        Ok(())
    }
}
