//! Output sinks and fan-out
//!
//! Sinks are called synchronously from the acquisition loop and must return
//! within a small fraction of a sample period. A failing sink is logged and
//! skipped; it never stops acquisition.

use eod_core::{EodResult, Event, SampleFrame, VisualizationRequest};
use tracing::warn;

/// Receives windows of the corrected trace for drawing
pub trait DisplaySink: Send {
    fn render_window(&mut self, samples: &[i32]) -> EodResult<()>;
}

/// Announces detections
pub trait AlertSink: Send {
    fn play_alert(&mut self, event: &Event) -> EodResult<()>;
}

/// Broadcasts raw channel data
pub trait TelemetrySink: Send {
    fn publish(&mut self, frame: &SampleFrame) -> EodResult<()>;
}

/// Registered sinks of a capture session
#[derive(Default)]
pub struct SinkSet {
    displays: Vec<Box<dyn DisplaySink>>,
    alerts: Vec<Box<dyn AlertSink>>,
    telemetry: Vec<Box<dyn TelemetrySink>>,
    failures: u64,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_display(&mut self, sink: Box<dyn DisplaySink>) {
        self.displays.push(sink);
    }

    pub fn add_alert(&mut self, sink: Box<dyn AlertSink>) {
        self.alerts.push(sink);
    }

    pub fn add_telemetry(&mut self, sink: Box<dyn TelemetrySink>) {
        self.telemetry.push(sink);
    }

    /// Sink calls that returned an error so far
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn render(&mut self, request: &VisualizationRequest) {
        for sink in self.displays.iter_mut() {
            if let Err(e) = sink.render_window(&request.samples) {
                warn!(sample_index = request.sample_index, "display sink failed: {}", e);
                self.failures += 1;
            }
        }
    }

    pub fn alert(&mut self, event: &Event) {
        for sink in self.alerts.iter_mut() {
            if let Err(e) = sink.play_alert(event) {
                warn!(sample_index = event.sample_index, "alert sink failed: {}", e);
                self.failures += 1;
            }
        }
    }

    pub fn publish(&mut self, frame: &SampleFrame) {
        for sink in self.telemetry.iter_mut() {
            if let Err(e) = sink.publish(frame) {
                warn!(sample_number = frame.sample_number, "telemetry sink failed: {}", e);
                self.failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eod_core::EodError;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct CountingAlert(Arc<Mutex<Vec<u64>>>);

    impl AlertSink for CountingAlert {
        fn play_alert(&mut self, event: &Event) -> EodResult<()> {
            self.0.lock().unwrap().push(event.sample_index);
            Ok(())
        }
    }

    struct BrokenDisplay;

    impl DisplaySink for BrokenDisplay {
        fn render_window(&mut self, _samples: &[i32]) -> EodResult<()> {
            Err(EodError::output("window", "closed"))
        }
    }

    #[test]
    fn test_fan_out_to_every_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut sinks = SinkSet::new();
        sinks.add_alert(Box::new(CountingAlert(seen.clone())));
        sinks.add_alert(Box::new(CountingAlert(seen.clone())));

        let event = Event {
            sample_index: 7,
            occurred_at: Duration::from_millis(14),
            interval_since_previous: Some(Duration::from_millis(14)),
        };
        sinks.alert(&event);

        assert_eq!(*seen.lock().unwrap(), vec![7, 7]);
        assert_eq!(sinks.failures(), 0);
    }

    #[test]
    fn test_failing_sink_is_counted() {
        let mut sinks = SinkSet::new();
        sinks.add_display(Box::new(BrokenDisplay));

        sinks.render(&VisualizationRequest {
            sample_index: 300,
            samples: vec![0; 200],
        });
        assert_eq!(sinks.failures(), 1);
    }
}
