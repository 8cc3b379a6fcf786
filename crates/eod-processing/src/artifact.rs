//! Single-sample glitch repair
//!
//! A glitch shows up as one sample that jumps far away from its predecessor
//! while the samples around it agree with each other. The sample two ticks
//! back is checked against that pattern once its successor has arrived and,
//! if it matches, replaced by the midpoint of its neighbours instead of being
//! dropped, so that downstream windows keep their fixed rate.

use crate::buffer::CorrectedBuffer;
use crate::config::DetectionConfig;
use eod_core::{CorrectedSample, EodResult, RawSample};

/// First tick at which a repair can be attempted
pub const CORRECTION_WARMUP_TICKS: u64 = 4;

/// Distance between the current tick and the slot under inspection
pub const CORRECTION_LAG: u64 = 2;

/// The four most recent corrected values, most recent first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelayLine {
    slots: [i32; 4],
}

impl DelayLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value `offset` ticks back, `offset` in 1..=4
    pub fn back(&self, offset: usize) -> i32 {
        self.slots[offset - 1]
    }

    fn set_back(&mut self, offset: usize, value: i32) {
        self.slots[offset - 1] = value;
    }

    /// Shift every slot one tick further back and insert `value` at offset 1
    pub fn shift(&mut self, value: i32) {
        self.slots.rotate_right(1);
        self.slots[0] = value;
    }
}

/// A repair applied to an earlier sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub index: u64,
    pub original: i32,
    pub replacement: i32,
}

/// Result of running the corrector for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectorOutput {
    /// Repair applied this tick, if any
    pub correction: Option<Correction>,
    /// Sample released to the cleaned trace this tick
    pub emitted: Option<CorrectedSample>,
}

/// Detects and repairs isolated spikes two ticks behind the input
#[derive(Debug, Clone)]
pub struct ArtifactCorrector {
    neighbor_tolerance: i64,
    glitch_jump: i64,
}

impl ArtifactCorrector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            neighbor_tolerance: config.neighbor_tolerance,
            glitch_jump: config.glitch_jump,
        }
    }

    /// Whether the sample two ticks back is a glitch given the new value `v`
    pub fn is_glitch(&self, delay: &DelayLine, v: i32) -> bool {
        let v = v as i64;
        let s2 = delay.back(2) as i64;
        let s3 = delay.back(3) as i64;
        let s4 = delay.back(4) as i64;

        (v - s3).abs() < self.neighbor_tolerance
            && (v - s4).abs() < self.neighbor_tolerance
            && (s3 - s2).abs() > self.glitch_jump
    }

    /// Midpoint between two samples, truncated toward zero
    pub fn midpoint(a: i32, b: i32) -> i32 {
        ((a as i64 + b as i64) / 2) as i32
    }

    /// Run one tick: repair, finalize and emit `n-2`, shift, append `n`
    pub fn process(
        &self,
        sample: RawSample,
        delay: &mut DelayLine,
        buffer: &mut CorrectedBuffer,
    ) -> EodResult<CorrectorOutput> {
        let n = sample.index;
        let mut output = CorrectorOutput::default();

        if n >= CORRECTION_WARMUP_TICKS && self.is_glitch(delay, sample.value) {
            let index = n - CORRECTION_LAG;
            let original = delay.back(2);
            let replacement = Self::midpoint(delay.back(3), sample.value);

            buffer.rewrite_and_finalize(index, replacement)?;
            delay.set_back(2, replacement);
            output.correction = Some(Correction {
                index,
                original,
                replacement,
            });
        } else if n >= CORRECTION_LAG {
            buffer.finalize(n - CORRECTION_LAG)?;
        }

        if n > CORRECTION_LAG {
            output.emitted = Some(CorrectedSample {
                index: n - CORRECTION_LAG,
                value: delay.back(2),
            });
        }

        delay.shift(sample.value);
        let appended = buffer.push_provisional(sample.value);
        debug_assert_eq!(appended, n, "ticks must reach the corrector in order");

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SlotState;
    use eod_core::EodError;

    fn run(values: &[i32]) -> (CorrectedBuffer, Vec<CorrectorOutput>) {
        let corrector = ArtifactCorrector::new(&DetectionConfig::default());
        let mut delay = DelayLine::new();
        let mut buffer = CorrectedBuffer::new();
        let outputs = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                corrector
                    .process(RawSample::new(i as u64, v), &mut delay, &mut buffer)
                    .unwrap()
            })
            .collect();
        (buffer, outputs)
    }

    #[test]
    fn test_delay_line_shift() {
        let mut delay = DelayLine::new();
        for v in 1..=5 {
            delay.shift(v);
        }
        assert_eq!(delay.back(1), 5);
        assert_eq!(delay.back(2), 4);
        assert_eq!(delay.back(3), 3);
        assert_eq!(delay.back(4), 2);
    }

    #[test]
    fn test_spike_is_repaired() {
        // Spike at index 3, confirmed at tick 5
        let (buffer, outputs) = run(&[100, 100, 100, 50_000, 100, 300, 100]);

        assert_eq!(
            outputs[5].correction,
            Some(Correction { index: 3, original: 50_000, replacement: 200 })
        );
        assert_eq!(outputs[5].emitted, Some(CorrectedSample { index: 3, value: 200 }));
        assert_eq!(buffer.get(3).unwrap().value, 200);
        assert_eq!(buffer.state(3).unwrap(), SlotState::Finalized);
        // Provisional entries keep the raw value
        assert_eq!(buffer.get(6).unwrap().value, 100);
    }

    #[test]
    fn test_no_correction_before_warmup() {
        // The jump sits at index 1 and would be inspected at tick 3
        let (buffer, outputs) = run(&[0, 50_000, 0, 0]);
        assert!(outputs.iter().all(|o| o.correction.is_none()));
        assert_eq!(buffer.get(1).unwrap().value, 50_000);
    }

    #[test]
    fn test_tolerance_bound_is_exclusive() {
        let corrector = ArtifactCorrector::new(&DetectionConfig::default());
        let mut delay = DelayLine::new();
        // s[-4] = 0, s[-3] = 1000, s[-2] = 20_000, s[-1] = 0
        for v in [0, 1000, 20_000, 0] {
            delay.shift(v);
        }
        // |5 - 1000| is far beyond the tolerance
        assert!(!corrector.is_glitch(&delay, 5));

        let mut delay = DelayLine::new();
        for v in [0, 0, 20_000, 0] {
            delay.shift(v);
        }
        assert!(corrector.is_glitch(&delay, 699));
        assert!(!corrector.is_glitch(&delay, 700));
        assert!(!corrector.is_glitch(&delay, -700));
    }

    #[test]
    fn test_jump_bound_is_exclusive() {
        let corrector = ArtifactCorrector::new(&DetectionConfig::default());
        let mut delay = DelayLine::new();
        for v in [0, 0, 10_000, 0] {
            delay.shift(v);
        }
        assert!(!corrector.is_glitch(&delay, 0));

        let mut delay = DelayLine::new();
        for v in [0, 0, -10_001, 0] {
            delay.shift(v);
        }
        assert!(corrector.is_glitch(&delay, 0));
    }

    #[test]
    fn test_emission_starts_at_index_one() {
        let (buffer, outputs) = run(&[1, 2, 3, 4, 5]);
        let emitted: Vec<_> = outputs.iter().filter_map(|o| o.emitted).map(|s| s.value).collect();
        assert_eq!(emitted, vec![2, 3]);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.finalized_count(), 3);
    }

    #[test]
    fn test_finalized_slots_never_change() {
        let values = [0, 0, 0, 30_000, 0, 0, 40_000, 0, 0, 0, -25_000, 10, 10, 0];
        let corrector = ArtifactCorrector::new(&DetectionConfig::default());
        let mut delay = DelayLine::new();
        let mut buffer = CorrectedBuffer::new();
        let mut snapshots: Vec<Option<i32>> = vec![None; values.len()];

        for (n, &v) in values.iter().enumerate() {
            corrector
                .process(RawSample::new(n as u64, v), &mut delay, &mut buffer)
                .unwrap();
            if n >= 2 {
                snapshots[n - 2] = Some(buffer.get(n as u64 - 2).unwrap().value);
            }
            for (k, snapshot) in snapshots.iter().enumerate() {
                if let Some(value) = snapshot {
                    assert_eq!(buffer.get(k as u64).unwrap().value, *value);
                }
            }
        }
        assert_eq!(buffer.get(3).unwrap().value, 0);
        assert_eq!(buffer.get(6).unwrap().value, 0);
        assert_eq!(buffer.get(10).unwrap().value, 5);
    }

    #[test]
    fn test_rejected_rewrite_leaves_delay_line() {
        let corrector = ArtifactCorrector::new(&DetectionConfig::default());
        let mut delay = DelayLine::new();
        let mut buffer = CorrectedBuffer::new();
        for v in [100, 100, 100, 50_000, 100] {
            delay.shift(v);
            buffer.push_provisional(v);
        }
        // Slot 3 is finalized out of turn, so its repair at tick 5 must fail
        buffer.finalize(3).unwrap();
        let before = delay;

        let err = corrector
            .process(RawSample::new(5, 100), &mut delay, &mut buffer)
            .unwrap_err();

        assert_eq!(err, EodError::SlotAlreadyFinalized { index: 3 });
        assert_eq!(delay, before);
        assert_eq!(delay.back(2), 50_000);
        assert_eq!(buffer.get(3).unwrap().value, 50_000);
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn test_midpoint_handles_extremes() {
        assert_eq!(ArtifactCorrector::midpoint(i32::MAX, i32::MAX), i32::MAX);
        assert_eq!(ArtifactCorrector::midpoint(-3, 0), -1);
    }
}
