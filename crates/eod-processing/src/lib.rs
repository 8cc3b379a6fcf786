//! EOD-Processing: Streaming discharge detection
//!
//! Artifact correction, derivative-square transform, envelope integration and
//! refractory-gated detection, driven one sample per tick.

pub mod artifact;
pub mod buffer;
pub mod clock;
pub mod config;
pub mod derivative;
pub mod detector;
pub mod display;
pub mod driver;
pub mod envelope;
pub mod pipeline;
pub mod recorder;
pub mod sink;

pub use artifact::{ArtifactCorrector, Correction, DelayLine};
pub use buffer::{CorrectedBuffer, SlotState};
pub use clock::{Clock, SampleClock, WallClock};
pub use config::DetectionConfig;
pub use derivative::DerivativeSquareTransform;
pub use detector::{DetectorState, EventDetector};
pub use display::WaveformScale;
pub use driver::{CaptureSession, SessionLimits, SessionOutput, SessionReport};
pub use envelope::{EnvelopeIntegrator, SquaredDerivatives};
pub use pipeline::{Pipeline, PipelineState, TickContext, TickOutput};
pub use recorder::EventRecorder;
pub use sink::{AlertSink, DisplaySink, SinkSet, TelemetrySink};
