//! EOD-Core: Foundation types for discharge detection
//!
//! Sample, frame and event types shared by the processing core, the sample
//! sources and the capture binary, plus the common error taxonomy.

pub mod acquisition;
pub mod error;
pub mod event;
pub mod sample;
pub mod source;

pub use acquisition::*;
pub use error::{EodError, EodResult};
pub use event::*;
pub use sample::*;
pub use source::SampleSource;
