//! Sample source abstraction

use crate::acquisition::AcquisitionSettings;
use crate::error::EodResult;
use crate::sample::SampleFrame;

/// Pull-based provider of acquisition frames
///
/// `next_frame` may block for up to one sample period. `Ok(None)` marks the
/// end of the stream; an `Err` is fatal to the running session.
pub trait SampleSource: Send {
    /// Retrieve the next frame
    fn next_frame(&mut self) -> EodResult<Option<SampleFrame>>;

    /// Acquisition setup this source delivers
    fn settings(&self) -> &AcquisitionSettings;

    /// Short human readable description for logs
    fn describe(&self) -> String {
        format!(
            "{} channel(s) at {} sps",
            self.settings().channel_count,
            self.settings().samples_per_second
        )
    }
}
