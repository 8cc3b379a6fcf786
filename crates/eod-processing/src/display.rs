//! Waveform scaling for display sinks
//!
//! Maps a window of corrected samples onto a pixel canvas: the value range
//! `[min_value, max_value]` spans the canvas height with larger values drawn
//! higher, and the points are spread evenly across the width.

use serde::{Deserialize, Serialize};

/// Canvas geometry and value range of the waveform view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformScale {
    pub width: u32,
    pub height: u32,
    pub min_value: f64,
    pub max_value: f64,
    /// Number of horizontal slots, normally the visualization window length
    pub points: usize,
}

impl Default for WaveformScale {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            min_value: -50_000.0,
            max_value: 500_000.0,
            points: 200,
        }
    }
}

impl WaveformScale {
    /// Horizontal pixel of the `i`-th point
    pub fn x(&self, i: usize) -> f64 {
        i as f64 * self.width as f64 / self.points.max(1) as f64
    }

    /// Vertical pixel of value `v`
    pub fn y(&self, v: i32) -> f64 {
        let h = self.height as f64;
        ((v as f64 - self.min_value) / (self.max_value - self.min_value)) * -h + h
    }

    /// Pixel coordinates of a window, truncated to whole pixels
    pub fn polyline(&self, samples: &[i32]) -> Vec<(i32, i32)> {
        samples
            .iter()
            .enumerate()
            .map(|(i, &v)| (self.x(i) as i32, self.y(v) as i32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_maps_to_height() {
        let scale = WaveformScale::default();
        assert_eq!(scale.y(-50_000), 500.0);
        assert_eq!(scale.y(500_000), 0.0);
        assert_eq!(scale.y(225_000), 250.0);
    }

    #[test]
    fn test_points_spread_across_width() {
        let scale = WaveformScale::default();
        assert_eq!(scale.x(0), 0.0);
        assert_eq!(scale.x(100), 500.0);
        assert_eq!(scale.x(199), 995.0);
    }

    #[test]
    fn test_polyline_truncates_to_pixels() {
        let scale = WaveformScale::default();
        let points = scale.polyline(&vec![0; 200]);
        assert_eq!(points.len(), 200);
        assert_eq!(points[0], (0, 454));
        assert_eq!(points[1], (5, 454));
    }
}
