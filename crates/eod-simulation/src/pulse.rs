//! Discharge waveform shapes

use serde::{Deserialize, Serialize};

/// Shape of one synthetic discharge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PulseShape {
    /// Flat top of `width` samples
    Square { width: usize },
    /// Positive phase followed by a negative phase of half the amplitude
    Biphasic { width: usize },
    /// Linear rise and fall over `width` samples
    Triangle { width: usize },
}

impl Default for PulseShape {
    fn default() -> Self {
        PulseShape::Square { width: 3 }
    }
}

impl PulseShape {
    /// Number of samples the pulse occupies
    pub fn width(&self) -> usize {
        match self {
            PulseShape::Square { width } | PulseShape::Triangle { width } => *width,
            PulseShape::Biphasic { width } => *width * 2,
        }
    }

    /// Relative level at `offset` samples into the pulse
    pub fn level_at(&self, offset: usize) -> f64 {
        if offset >= self.width() {
            return 0.0;
        }

        match self {
            PulseShape::Square { .. } => 1.0,
            PulseShape::Biphasic { width } => {
                if offset < *width {
                    1.0
                } else {
                    -0.5
                }
            }
            PulseShape::Triangle { width } => {
                let half = (*width as f64 - 1.0) / 2.0;
                if half <= 0.0 {
                    1.0
                } else {
                    1.0 - (offset as f64 - half).abs() / (half + 1.0)
                }
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PulseShape::Square { .. } => "square pulse",
            PulseShape::Biphasic { .. } => "biphasic pulse",
            PulseShape::Triangle { .. } => "triangular pulse",
        }
    }
}
