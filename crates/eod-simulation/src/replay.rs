//! Replay of recorded traces
//!
//! One frame per line, channel values separated by whitespace or commas.
//! Blank lines and lines starting with `#` are skipped. A line holding a
//! single value is a one-channel frame.

use eod_core::{
    acquisition_error, AcquisitionSettings, EodError, EodResult, SampleFrame, SampleSource,
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Sample source reading frames from a text stream
pub struct ReplaySource {
    reader: Box<dyn BufRead + Send>,
    settings: AcquisitionSettings,
    origin: String,
    line_number: usize,
    sample_number: u64,
    line: String,
}

impl ReplaySource {
    pub fn new(
        reader: Box<dyn BufRead + Send>,
        settings: AcquisitionSettings,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            settings,
            origin: origin.into(),
            line_number: 0,
            sample_number: 0,
            line: String::new(),
        }
    }

    /// Open a recorded file; an unreadable path is a configuration error
    pub fn open(path: impl AsRef<Path>, settings: AcquisitionSettings) -> EodResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            EodError::config("replay file", path.display(), format!("a readable trace ({})", e))
        })?;
        info!(path = %path.display(), "replaying recorded trace");
        Ok(Self::new(
            Box::new(BufReader::new(file)),
            settings,
            path.display().to_string(),
        ))
    }

    fn parse_line(&self, line: &str) -> EodResult<Vec<i32>> {
        line.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .map(|field| {
                field.parse::<i32>().map_err(|_| {
                    acquisition_error!(
                        "{} line {}: '{}' is not an integer sample",
                        self.origin,
                        self.line_number,
                        field
                    )
                })
            })
            .collect()
    }
}

impl SampleSource for ReplaySource {
    fn next_frame(&mut self) -> EodResult<Option<SampleFrame>> {
        loop {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line).map_err(|e| {
                EodError::acquisition(format!("reading {}: {}", self.origin, e))
            })?;
            if read == 0 {
                info!(origin = %self.origin, frames = self.sample_number, "replay finished");
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let channel_data = self.parse_line(trimmed)?;
            let frame = SampleFrame::new(self.sample_number, channel_data);
            self.sample_number += 1;
            return Ok(Some(frame));
        }
    }

    fn settings(&self) -> &AcquisitionSettings {
        &self.settings
    }

    fn describe(&self) -> String {
        format!(
            "replay of {} at {} sps",
            self.origin, self.settings.samples_per_second
        )
    }
}
