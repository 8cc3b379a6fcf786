//! Envelope integration over squared derivatives

use crate::config::DetectionConfig;
use std::collections::VecDeque;
use std::ops::RangeInclusive;

/// Squared derivatives in emission order
///
/// Position 0 is the value produced at the first post-warm-up tick. Only the
/// most recent `retention` values are kept; positions stay absolute.
#[derive(Debug, Clone)]
pub struct SquaredDerivatives {
    values: VecDeque<f64>,
    evicted: u64,
    retention: usize,
}

impl SquaredDerivatives {
    pub fn with_retention(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            values: VecDeque::with_capacity(retention + 1),
            evicted: 0,
            retention,
        }
    }

    /// Number of values ever pushed
    pub fn len(&self) -> u64 {
        self.evicted + self.values.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        if self.values.len() > self.retention {
            self.values.pop_front();
            self.evicted += 1;
        }
    }

    /// Value at absolute `position`, if still retained
    pub fn get(&self, position: u64) -> Option<f64> {
        position
            .checked_sub(self.evicted)
            .and_then(|offset| self.values.get(offset as usize).copied())
    }

    /// Sum over an inclusive range of positions, `None` if any is missing
    pub fn sum(&self, positions: RangeInclusive<u64>) -> Option<f64> {
        positions.map(|p| self.get(p)).sum()
    }
}

/// Plain sliding sum of squared derivatives
///
/// The result is a sum, not a mean: the detection band is calibrated against
/// the sum of the window.
#[derive(Debug, Clone)]
pub struct EnvelopeIntegrator {
    window: usize,
    lag: u64,
}

impl EnvelopeIntegrator {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            window: config.envelope_window,
            lag: config.envelope_lag,
        }
    }

    /// First tick with an envelope value
    pub fn warmup_tick(&self) -> u64 {
        self.lag + self.window as u64 - 1
    }

    /// Positions summed at tick `n`
    pub fn window_positions(&self, n: u64) -> Option<RangeInclusive<u64>> {
        if n < self.warmup_tick() {
            return None;
        }
        let end = n - self.lag;
        Some(end + 1 - self.window as u64..=end)
    }

    /// Envelope at tick `n`, `None` during warm-up
    pub fn process(&self, n: u64, derivatives: &SquaredDerivatives) -> Option<f64> {
        self.window_positions(n)
            .and_then(|positions| derivatives.sum(positions))
    }

    /// Number of derivative values the integrator needs to look back on
    pub fn required_history(&self) -> usize {
        self.window + self.lag as usize
    }
}
