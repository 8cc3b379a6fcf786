//! Derivative-square transform

use crate::buffer::CorrectedBuffer;
use eod_core::EodResult;

/// First tick that produces a squared derivative
pub const DERIVATIVE_WARMUP_TICKS: u64 = 8;

/// Squared three-point derivative over the finalized part of the trace
///
/// `x = (-3*C[n-2] + 4*C[n-4] - C[n-6]) / 4`, evaluated on every second
/// sample so that the newest input is the value finalized this tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivativeSquareTransform;

impl DerivativeSquareTransform {
    pub fn new() -> Self {
        Self
    }

    /// Derivative estimate from the three stencil points, newest first
    pub fn derivative(c2: i32, c4: i32, c6: i32) -> f64 {
        (-3.0 * c2 as f64 + 4.0 * c4 as f64 - c6 as f64) / 4.0
    }

    /// Squared derivative for tick `n`, `None` during warm-up
    ///
    /// Must run after the corrector of the same tick: `C[n-2]` is only
    /// finalized once the corrector has seen sample `n`.
    pub fn process(&self, n: u64, buffer: &CorrectedBuffer) -> EodResult<Option<f64>> {
        if n < DERIVATIVE_WARMUP_TICKS {
            return Ok(None);
        }

        let c2 = buffer.finalized_value(n - 2)?;
        let c4 = buffer.finalized_value(n - 4)?;
        let c6 = buffer.finalized_value(n - 6)?;
        let x = Self::derivative(c2, c4, c6);

        Ok(Some(x * x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eod_core::EodError;

    fn finalized_buffer(values: &[i32]) -> CorrectedBuffer {
        let mut buffer = CorrectedBuffer::new();
        for &v in values {
            buffer.push_provisional(v);
        }
        for index in 0..values.len().saturating_sub(2) {
            buffer.finalize(index as u64).unwrap();
        }
        buffer
    }

    #[test]
    fn test_derivative_coefficients() {
        assert_eq!(DerivativeSquareTransform::derivative(0, 0, 0), 0.0);
        assert_eq!(DerivativeSquareTransform::derivative(4, 0, 0), -3.0);
        assert_eq!(DerivativeSquareTransform::derivative(0, 1, 0), 1.0);
        assert_eq!(DerivativeSquareTransform::derivative(0, 0, 2), -0.5);
    }

    #[test]
    fn test_warmup_produces_nothing() {
        let buffer = finalized_buffer(&[1; 8]);
        let transform = DerivativeSquareTransform::new();
        for n in 0..8 {
            assert_eq!(transform.process(n, &buffer).unwrap(), None);
        }
    }

    #[test]
    fn test_linear_ramp() {
        // C[k] = 10k: x = (-3*60 + 4*40 - 20) / 4 = -10
        let values: Vec<i32> = (0..10).map(|k| 10 * k).collect();
        let buffer = finalized_buffer(&values);
        let transform = DerivativeSquareTransform::new();
        assert_eq!(transform.process(8, &buffer).unwrap(), Some(100.0));
    }

    #[test]
    fn test_squared_value_non_negative() {
        let values = [5, -90_000, 3, 70_000, -1, 8, 400_000, -400_000, 12, 0, 1];
        let buffer = finalized_buffer(&values);
        let transform = DerivativeSquareTransform::new();
        for n in 8..values.len() as u64 {
            let squared = transform.process(n, &buffer).unwrap().unwrap();
            assert!(squared >= 0.0);
        }
    }

    #[test]
    fn test_requires_finalized_input() {
        let mut buffer = CorrectedBuffer::new();
        for v in 0..9 {
            buffer.push_provisional(v);
        }
        // Nothing finalized: reading C[6] at tick 8 is an ordering violation
        let transform = DerivativeSquareTransform::new();
        assert_eq!(
            transform.process(8, &buffer),
            Err(EodError::SlotNotFinalized { index: 6 })
        );
    }
}
