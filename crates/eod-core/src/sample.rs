//! Sample and frame types

use serde::{Deserialize, Serialize};

/// One raw value of the analysed channel, one per pipeline tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    /// Tick index, monotonic and 0-based
    pub index: u64,
    /// ADC reading
    pub value: i32,
}

impl RawSample {
    pub fn new(index: u64, value: i32) -> Self {
        Self { index, value }
    }
}

/// All channel readings of a single acquisition instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFrame {
    /// Sequence number assigned by the source
    pub sample_number: u64,
    /// One reading per acquisition channel
    pub channel_data: Vec<i32>,
}

impl SampleFrame {
    pub fn new(sample_number: u64, channel_data: Vec<i32>) -> Self {
        Self {
            sample_number,
            channel_data,
        }
    }

    /// Number of channels in the frame
    pub fn channel_count(&self) -> usize {
        self.channel_data.len()
    }

    /// Extract one channel as the raw sample for tick `index`
    pub fn raw_sample(&self, channel: usize, index: u64) -> Option<RawSample> {
        self.channel_data
            .get(channel)
            .map(|&value| RawSample::new(index, value))
    }
}

/// A value of the cleaned trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectedSample {
    pub index: u64,
    pub value: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_sample_extraction() {
        let frame = SampleFrame::new(41, vec![10, -20, 30]);
        assert_eq!(frame.channel_count(), 3);
        assert_eq!(frame.raw_sample(1, 7), Some(RawSample::new(7, -20)));
        assert_eq!(frame.raw_sample(3, 7), None);
    }
}
