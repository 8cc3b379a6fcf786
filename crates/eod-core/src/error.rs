//! Error handling for the EOD Framework
//!
//! Configuration problems are reported before a session exists, acquisition
//! problems end a running session, and buffer misuse flags a programming error
//! in the driver.

use std::fmt;

/// Result type alias for EOD Framework operations
pub type EodResult<T> = Result<T, EodError>;

/// Error type for all EOD Framework operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EodError {
    /// Invalid configuration parameter, reported before acquisition starts
    ConfigurationError {
        /// Parameter name as the user knows it
        parameter: &'static str,
        /// Rejected value, formatted
        value: String,
        /// Human readable description of the valid domain
        valid: String,
    },

    /// Sample source failure during a running session
    AcquisitionError {
        /// Description of the failure
        reason: String,
    },

    /// Output file or sink failure
    OutputError {
        /// File or endpoint involved
        path: String,
        /// Description of the failure
        reason: String,
    },

    /// A corrected-buffer slot was rewritten after finalization
    SlotAlreadyFinalized {
        /// Tick index of the slot
        index: u64,
    },

    /// A corrected-buffer slot was read before it was finalized
    SlotNotFinalized {
        /// Tick index of the slot
        index: u64,
    },

    /// A corrected-buffer slot outside the retained range was addressed
    SlotOutOfRange {
        /// Requested tick index
        index: u64,
        /// Number of slots written so far
        len: u64,
    },
}

impl EodError {
    /// Build a configuration error from any displayable value and domain
    pub fn config(
        parameter: &'static str,
        value: impl fmt::Display,
        valid: impl fmt::Display,
    ) -> Self {
        EodError::ConfigurationError {
            parameter,
            value: value.to_string(),
            valid: valid.to_string(),
        }
    }

    /// Build an acquisition error
    pub fn acquisition(reason: impl Into<String>) -> Self {
        EodError::AcquisitionError {
            reason: reason.into(),
        }
    }

    /// Build an output error for a path
    pub fn output(path: impl fmt::Display, reason: impl fmt::Display) -> Self {
        EodError::OutputError {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error was raised before any session state existed
    pub fn is_configuration(&self) -> bool {
        matches!(self, EodError::ConfigurationError { .. })
    }
}

impl fmt::Display for EodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EodError::ConfigurationError {
                parameter,
                value,
                valid,
            } => {
                write!(f, "{} is not a valid {}; valid values are {}", value, parameter, valid)
            }
            EodError::AcquisitionError { reason } => {
                write!(f, "Acquisition failed: {}", reason)
            }
            EodError::OutputError { path, reason } => {
                write!(f, "Output error for {}: {}", path, reason)
            }
            EodError::SlotAlreadyFinalized { index } => {
                write!(f, "Corrected sample {} is already finalized", index)
            }
            EodError::SlotNotFinalized { index } => {
                write!(f, "Corrected sample {} read while still provisional", index)
            }
            EodError::SlotOutOfRange { index, len } => {
                write!(f, "Corrected sample {} out of range (buffer holds {})", index, len)
            }
        }
    }
}

impl std::error::Error for EodError {}

/// Convenience macro for creating acquisition errors
#[macro_export]
macro_rules! acquisition_error {
    ($($arg:tt)*) => {
        $crate::error::EodError::AcquisitionError {
            reason: format!($($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_lists_valid_domain() {
        let error = EodError::config("speed", 300, "[250, 500, 1024]");
        let display = format!("{}", error);
        assert!(display.contains("300 is not a valid speed"));
        assert!(display.contains("[250, 500, 1024]"));
        assert!(error.is_configuration());
    }

    #[test]
    fn test_acquisition_macro() {
        let error = acquisition_error!("serial port closed after {} frames", 12);
        assert_eq!(
            error,
            EodError::AcquisitionError {
                reason: "serial port closed after 12 frames".to_string()
            }
        );
        assert!(!error.is_configuration());
    }

    #[test]
    fn test_buffer_error_display() {
        let error = EodError::SlotOutOfRange { index: 9, len: 4 };
        let display = format!("{}", error);
        assert!(display.contains("9"));
        assert!(display.contains("4"));
    }
}
