//! Detection parameters
//!
//! Every threshold and window length of the pipeline lives here so it can be
//! tuned without touching control flow. Defaults are the published values the
//! detection band was calibrated with.

use crate::derivative::DERIVATIVE_WARMUP_TICKS;
use eod_core::{EodError, EodResult};
use serde::{Deserialize, Serialize};

/// Configuration of the detection pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Maximum distance (exclusive) between the new sample and the samples
    /// three and four ticks back for a glitch repair to be considered
    pub neighbor_tolerance: i64,
    /// Minimum jump (exclusive) between the samples three and two ticks back
    /// that marks the latter as a glitch
    pub glitch_jump: i64,
    /// Number of squared derivatives summed into the envelope
    pub envelope_window: usize,
    /// Distance from the current tick to the newest summed derivative position
    pub envelope_lag: u64,
    /// Lower bound of the detection band (exclusive)
    pub envelope_lower: f64,
    /// Upper bound of the detection band (exclusive)
    pub envelope_upper: f64,
    /// Ticks during which no new event may fire
    pub refractory_ticks: u32,
    /// Corrected samples handed to the display after a detection
    pub visualization_window: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            neighbor_tolerance: 700,
            glitch_jump: 10_000,
            envelope_window: 10,
            envelope_lag: 9,
            envelope_lower: 1_500_000_000.0,
            envelope_upper: 12_000_000_000.0,
            refractory_ticks: 100,
            visualization_window: 200,
        }
    }
}

impl DetectionConfig {
    /// First tick that produces an envelope value
    pub fn envelope_warmup_tick(&self) -> u64 {
        self.envelope_lag + self.envelope_window as u64 - 1
    }

    /// Validate configuration
    pub fn validate(&self) -> EodResult<()> {
        if self.neighbor_tolerance <= 0 {
            return Err(EodError::config(
                "neighbor tolerance",
                self.neighbor_tolerance,
                "a positive sample distance",
            ));
        }

        if self.glitch_jump <= 0 {
            return Err(EodError::config(
                "glitch jump",
                self.glitch_jump,
                "a positive sample distance",
            ));
        }

        if self.envelope_window == 0 {
            return Err(EodError::config("envelope window", 0, "at least 1 value"));
        }

        // The newest summed position must already exist when the envelope is read
        if self.envelope_lag < DERIVATIVE_WARMUP_TICKS {
            return Err(EodError::config(
                "envelope lag",
                self.envelope_lag,
                format!("at least {} ticks", DERIVATIVE_WARMUP_TICKS),
            ));
        }

        if !self.envelope_lower.is_finite()
            || !self.envelope_upper.is_finite()
            || self.envelope_lower < 0.0
            || self.envelope_lower >= self.envelope_upper
        {
            return Err(EodError::config(
                "detection band",
                format!("({}, {})", self.envelope_lower, self.envelope_upper),
                "finite bounds with 0 <= lower < upper",
            ));
        }

        if self.refractory_ticks == 0 {
            return Err(EodError::config("refractory period", 0, "at least 1 tick"));
        }

        if self.visualization_window < 2 {
            return Err(EodError::config(
                "visualization window",
                self.visualization_window,
                "at least 2 samples",
            ));
        }

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> EodResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EodError::config("detection config", "<unserializable>", e))
    }

    /// Import configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> EodResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EodError::config("detection config", e, "a JSON detection config"))?;
        config.validate()?;
        Ok(config)
    }
}
