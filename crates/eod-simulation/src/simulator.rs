//! Synthetic electric organ discharge source
//!
//! Produces frames shaped like those of the acquisition board: a noisy
//! baseline with periodic discharge pulses and rare single-sample glitches on
//! every channel.

use crate::pulse::PulseShape;
use eod_core::{AcquisitionSettings, EodError, EodResult, SampleFrame, SampleSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Parameters of the synthetic signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Discharges per second
    pub discharge_rate_hz: f64,
    /// Peak pulse value in ADC counts
    pub pulse_amplitude: i32,
    pub pulse_shape: PulseShape,
    /// Constant offset of every channel
    pub baseline: i32,
    /// Standard deviation of the Gaussian baseline noise
    pub noise_std: f64,
    /// Chance per sample and channel of a one-sample glitch
    pub glitch_probability: f64,
    pub glitch_amplitude: i32,
    /// Stop after this many frames; `None` runs forever
    pub length: Option<u64>,
    /// Pace frames to the sample rate instead of producing them at once
    pub realtime: bool,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            discharge_rate_hz: 2.0,
            pulse_amplitude: 100_000,
            pulse_shape: PulseShape::default(),
            baseline: 0,
            noise_std: 100.0,
            glitch_probability: 0.0005,
            glitch_amplitude: 300_000,
            length: None,
            realtime: false,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> EodResult<()> {
        if !(self.discharge_rate_hz > 0.0) {
            return Err(EodError::config(
                "discharge rate",
                self.discharge_rate_hz.to_string(),
                "a positive frequency in Hz",
            ));
        }
        if !(0.0..=1.0).contains(&self.glitch_probability) {
            return Err(EodError::config(
                "glitch probability",
                self.glitch_probability.to_string(),
                "0.0 to 1.0",
            ));
        }
        if self.pulse_shape.width() == 0 {
            return Err(EodError::config("pulse width", "0", "at least 1 sample"));
        }
        Ok(())
    }

    /// Samples between pulse onsets at the given rate
    pub fn pulse_period(&self, samples_per_second: u32) -> u64 {
        ((samples_per_second as f64 / self.discharge_rate_hz).round() as u64).max(1)
    }
}

/// Seeded synthetic sample source
pub struct DischargeSimulator {
    settings: AcquisitionSettings,
    config: SimulationConfig,
    rng: StdRng,
    noise: Normal<f64>,
    period: u64,
    sample_number: u64,
    glitches: u64,
    started: Option<Instant>,
}

impl DischargeSimulator {
    pub fn new(settings: AcquisitionSettings, config: SimulationConfig) -> EodResult<Self> {
        settings.validate()?;
        config.validate()?;

        let period = config.pulse_period(settings.samples_per_second);
        if period <= config.pulse_shape.width() as u64 {
            return Err(EodError::config(
                "discharge rate",
                config.discharge_rate_hz.to_string(),
                format!(
                    "a rate whose period exceeds the {} sample pulse",
                    config.pulse_shape.width()
                ),
            ));
        }

        let noise = Normal::new(0.0, config.noise_std.max(0.0)).map_err(|e| {
            EodError::config("noise level", config.noise_std.to_string(), e.to_string())
        })?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        debug!(
            period,
            shape = config.pulse_shape.description(),
            seed = ?config.seed,
            "discharge simulator ready"
        );

        Ok(Self {
            settings,
            config,
            rng,
            noise,
            period,
            sample_number: 0,
            glitches: 0,
            started: None,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Noise-free value of frame `sample_number`
    fn clean_value(&self, sample_number: u64) -> i32 {
        let width = self.config.pulse_shape.width() as u64;
        let offset = sample_number % self.period;
        let onset = self.period - width;

        let pulse = if offset >= onset {
            self.config.pulse_shape.level_at((offset - onset) as usize)
                * self.config.pulse_amplitude as f64
        } else {
            0.0
        };
        self.config.baseline.saturating_add(pulse as i32)
    }

    fn pace(&mut self) {
        let started = *self.started.get_or_insert_with(Instant::now);
        let due = started + self.settings.sample_period().mul_f64(self.sample_number as f64);
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
    }

    fn sample_channel(&mut self, clean: i32) -> i32 {
        let mut value = clean as f64 + self.noise.sample(&mut self.rng);
        if self.config.glitch_probability > 0.0 && self.rng.gen_bool(self.config.glitch_probability) {
            value += self.config.glitch_amplitude as f64;
            self.glitches += 1;
        }
        value.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
    }
}

impl SampleSource for DischargeSimulator {
    fn next_frame(&mut self) -> EodResult<Option<SampleFrame>> {
        if let Some(length) = self.config.length {
            if self.sample_number >= length {
                if self.sample_number == length {
                    info!(frames = length, glitches = self.glitches, "simulation finished");
                    // Log once; later calls keep returning end of stream
                    self.sample_number += 1;
                }
                return Ok(None);
            }
        }
        if self.config.realtime {
            self.pace();
        }

        let clean = self.clean_value(self.sample_number);
        let channel_data = (0..self.settings.channel_count)
            .map(|_| self.sample_channel(clean))
            .collect();

        let frame = SampleFrame::new(self.sample_number, channel_data);
        self.sample_number += 1;
        Ok(Some(frame))
    }

    fn settings(&self) -> &AcquisitionSettings {
        &self.settings
    }

    fn describe(&self) -> String {
        format!(
            "simulated {} at {:.1} Hz, {} channel(s) at {} sps",
            self.config.pulse_shape.description(),
            self.config.discharge_rate_hz,
            self.settings.channel_count,
            self.settings.samples_per_second
        )
    }
}
