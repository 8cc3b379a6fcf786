//! Capture session driver
//!
//! Pulls one frame per tick from the sample source, runs the pipeline on the
//! analysed channel and fans the results out to sinks and session outputs.
//! The loop is single-threaded; the only blocking call is the source read.

use crate::clock::Clock;
use crate::pipeline::{Pipeline, TickContext};
use crate::sink::SinkSet;
use eod_core::{
    CorrectedSample, EodError, EodResult, SampleFrame, SampleSource, SessionSummary, StopReason,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Persisted results of a session
pub trait SessionOutput {
    /// A value of the cleaned trace, in tick order
    fn corrected(&mut self, sample: CorrectedSample) -> EodResult<()>;

    /// Called once when the session ends, also after any mid-run failure
    fn finish(&mut self, intervals: &[Duration], summary: &SessionSummary) -> EodResult<()>;
}

/// When a session ends on its own
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionLimits {
    /// Stop after this many ticks; `None` runs until stopped
    pub max_samples: Option<u64>,
}

/// Outcome of a finished session
#[derive(Debug)]
pub struct SessionReport {
    pub summary: SessionSummary,
    /// Error that ended the session early, if any
    pub failure: Option<EodError>,
}

/// Warn about slow ticks at most this often
const SLOW_TICK_WARN_EVERY: u64 = 1000;

/// One capture session over a sample source
pub struct CaptureSession<'a> {
    pipeline: Pipeline,
    source: &'a mut dyn SampleSource,
    sinks: SinkSet,
    output: &'a mut dyn SessionOutput,
    clock: Box<dyn Clock>,
    stop: Arc<AtomicBool>,
    limits: SessionLimits,
    channel: usize,
    tick_budget: Duration,
}

impl<'a> CaptureSession<'a> {
    pub fn new(
        pipeline: Pipeline,
        source: &'a mut dyn SampleSource,
        sinks: SinkSet,
        output: &'a mut dyn SessionOutput,
        clock: Box<dyn Clock>,
    ) -> Self {
        let settings = source.settings();
        let channel = settings.channel;
        let tick_budget = settings.sample_period();

        Self {
            pipeline,
            source,
            sinks,
            output,
            clock,
            stop: Arc::new(AtomicBool::new(false)),
            limits: SessionLimits::default(),
            channel,
            tick_budget,
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Use an externally owned stop flag
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    fn next_frame(&mut self) -> Result<Option<SampleFrame>, EodError> {
        self.source.next_frame()
    }

    /// Run until the sample limit, end of stream, a stop request or a
    /// failure. Outputs are flushed in every case; a failure is carried in
    /// the report.
    pub fn run(mut self) -> SessionReport {
        info!(
            source = %self.source.describe(),
            channel = self.channel,
            max_samples = ?self.limits.max_samples,
            "capture session started"
        );

        let mut dropped: u64 = 0;
        let mut slow_ticks: u64 = 0;
        let mut last_sample_number: Option<u64> = None;
        let mut failure = None;

        let stop_reason = loop {
            if self.stop.load(Ordering::SeqCst) {
                break StopReason::Interrupted;
            }
            if let Some(max) = self.limits.max_samples {
                if self.pipeline.ticks() >= max {
                    break StopReason::SampleLimit;
                }
            }

            let frame = match self.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break StopReason::EndOfStream,
                Err(e) => {
                    error!(tick = self.pipeline.ticks(), "acquisition failed: {}", e);
                    failure = Some(e);
                    break StopReason::AcquisitionFailed;
                }
            };
            let tick_start = Instant::now();

            if let Some(previous) = last_sample_number {
                let gap = frame.sample_number.saturating_sub(previous + 1);
                if gap > 0 {
                    warn!(after = previous, missing = gap, "dropped samples");
                    dropped += gap;
                }
            }
            last_sample_number = Some(frame.sample_number);

            self.sinks.publish(&frame);

            let tick = self.pipeline.ticks();
            let raw = match frame.raw_sample(self.channel, tick) {
                Some(raw) => raw,
                None => {
                    let e = EodError::acquisition(format!(
                        "frame {} has {} channel(s), channel {} requested",
                        frame.sample_number,
                        frame.channel_count(),
                        self.channel
                    ));
                    error!("{}", e);
                    failure = Some(e);
                    break StopReason::AcquisitionFailed;
                }
            };

            let ctx = TickContext {
                now: self.clock.now(tick),
                session_active: !self.stop.load(Ordering::SeqCst),
            };
            let output = match self.pipeline.step(raw, ctx) {
                Ok(output) => output,
                Err(e) => {
                    error!(tick, "pipeline failed: {}", e);
                    failure = Some(e);
                    break StopReason::PipelineFailed;
                }
            };

            if let Some(sample) = output.corrected {
                if let Err(e) = self.output.corrected(sample) {
                    error!(tick, "trace write failed: {}", e);
                    failure = Some(e);
                    break StopReason::OutputFailed;
                }
            }
            if let Some(event) = output.event {
                info!(
                    sample_index = event.sample_index,
                    at = event.occurred_at.as_secs_f64(),
                    "EOD detected"
                );
                self.sinks.alert(&event);
            }
            if let Some(request) = output.visualization {
                self.sinks.render(&request);
            }

            if tick_start.elapsed() > self.tick_budget {
                slow_ticks += 1;
                if slow_ticks % SLOW_TICK_WARN_EVERY == 1 {
                    warn!(
                        tick,
                        budget_us = self.tick_budget.as_micros() as u64,
                        slow_ticks,
                        "tick exceeded the sample period"
                    );
                }
            }
        };

        let ticks = self.pipeline.ticks();
        let duration = if ticks == 0 {
            Duration::ZERO
        } else {
            self.clock.now(ticks)
        };
        let mut summary = SessionSummary::new(
            ticks,
            self.pipeline.event_count(),
            dropped,
            slow_ticks,
            duration,
            stop_reason,
        );
        summary.sink_failures = self.sinks.failures();

        if let Err(e) = self.output.finish(self.pipeline.intervals(), &summary) {
            error!("flushing session outputs failed: {}", e);
            failure.get_or_insert(e);
        }
        info!(
            ticks,
            events = summary.detected_events,
            dropped = summary.dropped_samples,
            sink_failures = summary.sink_failures,
            reason = %stop_reason,
            "capture session finished"
        );

        SessionReport { summary, failure }
    }
}
