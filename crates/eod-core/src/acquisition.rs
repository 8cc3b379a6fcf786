//! Acquisition settings and their valid domains
//!
//! The supported rates and gains are those of the ADS1299 front end used by
//! the capture hardware. Register programming itself happens elsewhere; this
//! module only decides whether a requested setup is acceptable.

use crate::error::{EodError, EodResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Sample rates accepted by the acquisition front end
pub const VALID_SAMPLE_RATES: [u32; 7] = [250, 500, 1024, 2048, 4096, 8192, 16384];

/// Programmable gain settings accepted by the acquisition front end
pub const VALID_GAINS: [u32; 7] = [1, 2, 4, 6, 8, 12, 24];

/// Maximum number of channels delivered per frame
pub const MAX_CHANNELS: usize = 8;

/// Acquisition setup for one capture session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionSettings {
    /// Samples per second per channel
    pub samples_per_second: u32,
    /// Gain applied to all channels
    pub gain: u32,
    /// Channels per frame
    pub channel_count: usize,
    /// Channel fed to the detection pipeline
    pub channel: usize,
    /// Telemetry stream name
    pub stream_name: String,
    /// Telemetry stream identifier, fresh per session
    pub stream_id: Uuid,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            samples_per_second: 500,
            gain: 1,
            channel_count: MAX_CHANNELS,
            channel: 0,
            stream_name: "HackEEG".to_string(),
            stream_id: Uuid::new_v4(),
        }
    }
}

impl AcquisitionSettings {
    /// Check every field against its valid domain
    pub fn validate(&self) -> EodResult<()> {
        Self::validate_sample_rate(self.samples_per_second)?;
        Self::validate_gain(self.gain)?;

        if self.channel_count == 0 || self.channel_count > MAX_CHANNELS {
            return Err(EodError::config(
                "channel count",
                self.channel_count,
                format!("1-{}", MAX_CHANNELS),
            ));
        }

        if self.channel >= self.channel_count {
            return Err(EodError::config(
                "channel",
                self.channel,
                format!("0-{}", self.channel_count - 1),
            ));
        }

        if self.stream_name.trim().is_empty() {
            return Err(EodError::config("stream name", "\"\"", "any non-empty name"));
        }

        Ok(())
    }

    /// Validate a sample rate
    pub fn validate_sample_rate(rate: u32) -> EodResult<()> {
        if VALID_SAMPLE_RATES.contains(&rate) {
            Ok(())
        } else {
            Err(EodError::config("speed", rate, format!("{:?}", VALID_SAMPLE_RATES)))
        }
    }

    /// Validate a gain setting
    pub fn validate_gain(gain: u32) -> EodResult<()> {
        if VALID_GAINS.contains(&gain) {
            Ok(())
        } else {
            Err(EodError::config("gain", gain, format!("{:?}", VALID_GAINS)))
        }
    }

    /// Time budget for one pipeline tick
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.samples_per_second as f64)
    }
}
