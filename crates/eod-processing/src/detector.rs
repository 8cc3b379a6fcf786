//! Refractory-gated threshold detector

use crate::config::DetectionConfig;

/// Detector arming state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Ready to fire
    Armed,
    /// Dead time after a detection
    Refractory { remaining: u32 },
}

/// What happened on one detector tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorDecision {
    /// The envelope entered the detection band while armed
    pub fired: bool,
    /// The refractory counter reached zero on this tick
    pub refractory_ended: bool,
}

/// Fires when the envelope lies strictly inside the detection band, then
/// stays silent for a fixed number of ticks
#[derive(Debug, Clone)]
pub struct EventDetector {
    lower: f64,
    upper: f64,
    refractory_ticks: u32,
    counter: u32,
}

impl EventDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            lower: config.envelope_lower,
            upper: config.envelope_upper,
            refractory_ticks: config.refractory_ticks,
            counter: 0,
        }
    }

    pub fn state(&self) -> DetectorState {
        match self.counter {
            0 => DetectorState::Armed,
            remaining => DetectorState::Refractory { remaining },
        }
    }

    /// Remaining refractory ticks
    pub fn refractory_remaining(&self) -> u32 {
        self.counter
    }

    /// Whether `envelope` lies inside the open detection band
    pub fn in_band(&self, envelope: f64) -> bool {
        self.lower < envelope && envelope < self.upper
    }

    /// Feed one envelope value
    pub fn process(&mut self, envelope: f64) -> DetectorDecision {
        let mut decision = DetectorDecision::default();

        if self.counter == 0 && self.in_band(envelope) {
            self.counter = self.refractory_ticks;
            decision.fired = true;
        }

        if self.counter > 0 {
            self.counter -= 1;
            decision.refractory_ended = self.counter == 0;
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IN_BAND: f64 = 3_000_000_000.0;

    fn detector() -> EventDetector {
        EventDetector::new(&DetectionConfig::default())
    }

    #[test]
    fn test_band_bounds_exclusive() {
        let detector = detector();
        assert!(!detector.in_band(1_500_000_000.0));
        assert!(detector.in_band(1_500_000_001.0));
        assert!(detector.in_band(11_999_999_999.0));
        assert!(!detector.in_band(12_000_000_000.0));
    }

    #[test]
    fn test_exact_lower_bound_does_not_fire() {
        let mut detector = detector();
        assert!(!detector.process(1_500_000_000.0).fired);
        assert_eq!(detector.state(), DetectorState::Armed);
        assert!(detector.process(1_500_000_001.0).fired);
    }

    #[test]
    fn test_refractory_countdown() {
        let mut detector = detector();
        let decision = detector.process(IN_BAND);
        assert!(decision.fired);
        assert_eq!(detector.refractory_remaining(), 99);

        let mut previous = detector.refractory_remaining();
        let mut ended_at = None;
        for tick in 1..=99 {
            let decision = detector.process(IN_BAND);
            assert!(!decision.fired, "fired while refractory at tick {}", tick);
            assert_eq!(detector.refractory_remaining(), previous - 1);
            previous = detector.refractory_remaining();
            if decision.refractory_ended {
                ended_at = Some(tick);
            }
        }
        assert_eq!(ended_at, Some(99));
        assert_eq!(detector.state(), DetectorState::Armed);

        // Armed again exactly 100 ticks after the first detection
        assert!(detector.process(IN_BAND).fired);
    }

    #[test]
    fn test_counter_never_negative() {
        let mut detector = detector();
        for _ in 0..500 {
            let decision = detector.process(0.0);
            assert!(!decision.fired);
            assert!(!decision.refractory_ended);
            assert_eq!(detector.refractory_remaining(), 0);
        }
    }

    #[test]
    fn test_single_tick_refractory() {
        let mut config = DetectionConfig::default();
        config.refractory_ticks = 1;
        let mut detector = EventDetector::new(&config);

        let decision = detector.process(IN_BAND);
        assert!(decision.fired && decision.refractory_ended);
        assert!(detector.process(IN_BAND).fired);
    }
}
