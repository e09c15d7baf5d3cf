//! Canonical machine interface.
//!
//! The interpreter never touches hardware. Everything a block does goes
//! through [`CanonicalMachine`], which owns the persistent machine state:
//! the interpreter reads modal state through the getters and applies a
//! block's effects through the setters and action triggers.

pub mod sim;

pub use sim::{MachineState, Op, SimMachine};

use serde::{Deserialize, Serialize};

use crate::error::MachineError;

/// Number of controlled axes.
pub const AXES: usize = 6;

/// A controlled axis. U/V/W are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    X,
    Y,
    Z,
    A,
    B,
    C,
}

impl Axis {
    /// All axes in target-array order.
    pub const ALL: [Axis; AXES] = [Axis::X, Axis::Y, Axis::Z, Axis::A, Axis::B, Axis::C];

    /// Index into a `[f64; AXES]` target array.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The G-code word letter for this axis.
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::A => 'A',
            Axis::B => 'B',
            Axis::C => 'C',
        }
    }
}

/// What a block asks the machine to do, beyond plain state changes.
/// Persists modally: a bare coordinate word continues the previous action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum NextAction {
    #[default]
    None,
    Motion,
    Dwell,
    ReturnToHome,
    HomingCycle,
    OffsetCoordinates,
}

/// Modal motion mode (G modal group 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MotionMode {
    #[default]
    StraightTraverse,
    StraightFeed,
    CwArc,
    CcwArc,
    CancelMotionMode,
}

/// Arc plane selection (G17/G18/G19).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Plane {
    #[default]
    Xy,
    Xz,
    Yz,
}

/// Length units (G20/G21).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Units {
    #[default]
    #[serde(rename = "mm", alias = "millimeters")]
    Millimeters,
    #[serde(rename = "in", alias = "inches")]
    Inches,
}

/// Spindle rotation state (M3/M4/M5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SpindleMode {
    #[default]
    Off,
    Clockwise,
    Counterclockwise,
}

/// Path control mode (G61/G61.1/G64).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PathControl {
    #[default]
    ExactPath,
    ExactStop,
    Continuous,
}

/// Program flow requested by M0/M1/M2/M30/M60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ProgramFlow {
    #[default]
    Running,
    Paused,
    Completed,
}

/// The abstraction layer owning true machine state.
///
/// Fallible operations return [`MachineError`]; the dispatcher forwards the
/// first failure and stops. The infallible hooks are bookkeeping the
/// interpreter performs unconditionally while parsing.
pub trait CanonicalMachine {
    // -- modal state getters, used to seed each block's pending state

    fn next_action(&self) -> NextAction;
    fn motion_mode(&self) -> MotionMode;
    fn absolute_mode(&self) -> bool;

    /// Current position of one axis, in the machine's native units.
    fn position(&self, axis: Axis) -> f64;

    // -- infallible bookkeeping hooks

    /// Called once per normalized block, before parsing. Feeds the
    /// persistent block counter used for diagnostics.
    fn begin_block(&mut self);

    /// Records the line number from an `N` word.
    fn set_line_number(&mut self, number: u32);

    /// G53 applies only to the block it appears in; the resolver clears
    /// this at the start of every block.
    fn set_absolute_override(&mut self, on: bool);

    /// Message sink for `(MSG...)` comments.
    fn comment_message(&mut self, text: &str);

    // -- state setters

    fn set_inverse_feed_rate_mode(&mut self, on: bool) -> Result<(), MachineError>;
    fn set_feed_rate(&mut self, rate: f64) -> Result<(), MachineError>;
    fn set_spindle_speed(&mut self, speed: f64) -> Result<(), MachineError>;
    fn select_tool(&mut self, tool: u8) -> Result<(), MachineError>;
    fn change_tool(&mut self, tool: u8) -> Result<(), MachineError>;
    fn start_spindle_clockwise(&mut self) -> Result<(), MachineError>;
    fn start_spindle_counterclockwise(&mut self) -> Result<(), MachineError>;
    fn stop_spindle(&mut self) -> Result<(), MachineError>;
    fn select_plane(&mut self, plane: Plane) -> Result<(), MachineError>;
    fn set_units(&mut self, units: Units) -> Result<(), MachineError>;
    fn set_absolute_mode(&mut self, absolute: bool) -> Result<(), MachineError>;
    fn set_origin_offsets(&mut self, target: &[f64; AXES]) -> Result<(), MachineError>;

    // -- action triggers

    fn dwell(&mut self, seconds: f64) -> Result<(), MachineError>;
    fn return_to_home(&mut self) -> Result<(), MachineError>;
    fn homing_cycle(&mut self) -> Result<(), MachineError>;
    fn straight_traverse(&mut self, target: &[f64; AXES]) -> Result<(), MachineError>;
    fn straight_feed(&mut self, target: &[f64; AXES]) -> Result<(), MachineError>;
    fn arc_feed(
        &mut self,
        target: &[f64; AXES],
        offset: &[f64; 3],
        radius: f64,
        mode: MotionMode,
    ) -> Result<(), MachineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_order_matches_target_array() {
        for (i, axis) in Axis::ALL.iter().enumerate() {
            assert_eq!(axis.index(), i);
        }
        assert_eq!(Axis::X.letter(), 'X');
        assert_eq!(Axis::C.letter(), 'C');
    }
}
