//! Interpreter and canonical-machine error types.
//!
//! Parse errors abort a block before any dispatch happens. Machine errors
//! abort the remaining dispatch steps; steps already applied stay applied.

use thiserror::Error;

/// Errors surfaced by the interpretation pipeline.
///
/// None of these are fatal to the controller: the caller reports the error
/// and keeps accepting blocks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpError {
    /// The scanner found something other than an uppercase letter where a
    /// command word had to start.
    #[error("expected a command letter at offset {offset}, found {found:?}")]
    ExpectedCommandLetter { found: char, offset: usize },

    /// A command letter was not followed by a valid signed decimal number.
    #[error("bad number format after '{letter}'")]
    BadNumberFormat { letter: char },

    /// A letter or G/M code outside the supported table.
    #[error("unrecognized command {letter}{value}")]
    UnrecognizedCommand { letter: char, value: f64 },

    /// A canonical-machine operation failed; forwarded unchanged.
    #[error(transparent)]
    Machine(#[from] MachineError),
}

/// Failures reported by a canonical machine.
///
/// The interpreter treats these as opaque. The variants here are the ones
/// the reference machine produces from its profile limits; other
/// implementations can use [`MachineError::Other`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    #[error("feed rate {requested} outside 0..={max}")]
    FeedRateLimit { requested: f64, max: f64 },

    #[error("spindle speed {requested} outside 0..={max}")]
    SpindleSpeedLimit { requested: f64, max: f64 },

    #[error("tool {tool} exceeds magazine capacity {slots}")]
    ToolOutOfRange { tool: u8, slots: u8 },

    #[error("{axis} target {value} outside travel {min}..={max}")]
    TravelLimit {
        axis: char,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("arc needs a radius or a center offset")]
    MissingArcGeometry,

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = InterpError::BadNumberFormat { letter: 'X' };
        assert_eq!(err.to_string(), "bad number format after 'X'");

        let err = InterpError::UnrecognizedCommand {
            letter: 'G',
            value: 22.0,
        };
        assert_eq!(err.to_string(), "unrecognized command G22");
    }

    #[test]
    fn test_machine_error_is_transparent() {
        let err: InterpError = MachineError::MissingArcGeometry.into();
        assert_eq!(err.to_string(), "arc needs a radius or a center offset");
    }
}
