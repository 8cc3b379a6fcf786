//! Per-tick detection pipeline
//!
//! Each call to [`Pipeline::step`] runs corrector, transform, integrator,
//! detector and recorder in that order for one raw sample. The order matters:
//! the transform reads the slot the corrector finalized on the same tick.

use crate::artifact::{ArtifactCorrector, Correction, DelayLine};
use crate::buffer::CorrectedBuffer;
use crate::config::DetectionConfig;
use crate::derivative::DerivativeSquareTransform;
use crate::detector::EventDetector;
use crate::envelope::{EnvelopeIntegrator, SquaredDerivatives};
use crate::recorder::EventRecorder;
use eod_core::{
    CorrectedSample, EodError, EodResult, Event, RawSample, VisualizationRequest,
};
use std::time::Duration;
use tracing::debug;

/// Per-tick inputs that do not come from the sample itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Session clock reading for this tick
    pub now: Duration,
    /// False once a stop was requested; suppresses visualization
    pub session_active: bool,
}

/// Everything a tick produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub index: u64,
    /// Cleaned-trace value released this tick
    pub corrected: Option<CorrectedSample>,
    /// Repair applied to an earlier sample
    pub correction: Option<Correction>,
    pub squared_derivative: Option<f64>,
    pub envelope: Option<f64>,
    pub event: Option<Event>,
    pub visualization: Option<VisualizationRequest>,
}

/// Mutable state carried from tick to tick
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub delay_line: DelayLine,
    pub corrected: CorrectedBuffer,
    pub derivatives: SquaredDerivatives,
    pub detector: EventDetector,
    pub recorder: EventRecorder,
    pub ticks: u64,
}

impl PipelineState {
    fn new(config: &DetectionConfig, integrator: &EnvelopeIntegrator) -> Self {
        // Enough history for the derivative stencil and the display window
        let corrected_retention = config.visualization_window + 8;

        Self {
            delay_line: DelayLine::new(),
            corrected: CorrectedBuffer::with_retention(corrected_retention),
            derivatives: SquaredDerivatives::with_retention(integrator.required_history()),
            detector: EventDetector::new(config),
            recorder: EventRecorder::new(Duration::ZERO),
            ticks: 0,
        }
    }
}

/// Detection pipeline for one channel
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: DetectionConfig,
    corrector: ArtifactCorrector,
    transform: DerivativeSquareTransform,
    integrator: EnvelopeIntegrator,
    state: PipelineState,
}

impl Pipeline {
    /// Create a pipeline; the configuration is validated first
    pub fn new(config: DetectionConfig) -> EodResult<Self> {
        config.validate()?;

        let integrator = EnvelopeIntegrator::new(&config);
        let state = PipelineState::new(&config, &integrator);

        Ok(Self {
            corrector: ArtifactCorrector::new(&config),
            transform: DerivativeSquareTransform::new(),
            integrator,
            state,
            config,
        })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Ticks processed so far, also the index of the next sample
    pub fn ticks(&self) -> u64 {
        self.state.ticks
    }

    /// Inter-event interval log
    pub fn intervals(&self) -> &[Duration] {
        self.state.recorder.intervals()
    }

    pub fn event_count(&self) -> u64 {
        self.state.recorder.event_count()
    }

    /// Process one raw sample
    pub fn step(&mut self, sample: RawSample, ctx: TickContext) -> EodResult<TickOutput> {
        let n = self.state.ticks;
        if sample.index != n {
            return Err(EodError::SlotOutOfRange {
                index: sample.index,
                len: n,
            });
        }

        let mut output = TickOutput {
            index: n,
            ..Default::default()
        };

        let corrected = self.corrector.process(
            sample,
            &mut self.state.delay_line,
            &mut self.state.corrected,
        )?;
        output.corrected = corrected.emitted;
        output.correction = corrected.correction;
        if let Some(correction) = corrected.correction {
            debug!(
                index = correction.index,
                original = correction.original,
                replacement = correction.replacement,
                "glitch repaired"
            );
        }

        output.squared_derivative = self.transform.process(n, &self.state.corrected)?;
        if let Some(value) = output.squared_derivative {
            self.state.derivatives.push(value);
        }

        output.envelope = self.integrator.process(n, &self.state.derivatives);
        if let Some(envelope) = output.envelope {
            let decision = self.state.detector.process(envelope);

            if decision.fired {
                let event = self.state.recorder.record(n, ctx.now);
                debug!(sample_index = n, envelope, "discharge detected");
                output.event = Some(event);
            }

            let window = self.config.visualization_window;
            if decision.refractory_ended && ctx.session_active && n >= window as u64 {
                output.visualization = Some(VisualizationRequest {
                    sample_index: n,
                    samples: self.state.corrected.window(n, window)?,
                });
            }
        }

        self.state.ticks += 1;
        Ok(output)
    }
}
