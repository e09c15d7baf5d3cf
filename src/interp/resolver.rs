//! Modal state resolution.
//!
//! Interprets a normalized block's statements against the G/M code tables,
//! accumulating a [`PendingState`] and the matching [`StateFlags`]. Nothing
//! here touches persistent machine state except the N-word line number and
//! the per-block absolute-override reset; applying the pending state is the
//! dispatcher's job.

use crate::error::InterpError;
use crate::interp::scanner::{next_statement, Statement};
use crate::machine::{
    Axis, CanonicalMachine, MotionMode, NextAction, PathControl, Plane, ProgramFlow, SpindleMode,
    AXES,
};
use crate::EPSILON;

/// Everything one block could ask to change. Created zeroed per block, then
/// seeded with the modal fields that persist across blocks (next_action,
/// motion_mode, absolute_mode). Values are in the program's original units;
/// the canonical machine does unit handling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingState {
    pub next_action: NextAction,
    pub motion_mode: MotionMode,
    pub select_plane: Plane,
    pub inches_mode: bool,
    pub absolute_mode: bool,
    pub absolute_override: bool,
    pub inverse_feed_rate_mode: bool,
    pub path_control: PathControl,
    pub program_flow: ProgramFlow,
    pub spindle_mode: SpindleMode,
    pub tool: u8,
    pub change_tool: bool,
    pub feed_rate: f64,
    pub dwell_time: f64,
    pub spindle_speed: f64,
    pub target: [f64; AXES],
    pub arc_offset: [f64; 3],
    pub arc_radius: f64,
}

/// One flag per [`PendingState`] field: true iff the field was explicitly
/// set by this block. The dispatcher acts only on flagged fields, which
/// keeps "value happens to be zero" apart from "was not specified". All
/// false at block start; never carried across blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateFlags {
    pub next_action: bool,
    pub motion_mode: bool,
    pub select_plane: bool,
    pub inches_mode: bool,
    pub absolute_mode: bool,
    pub absolute_override: bool,
    pub inverse_feed_rate_mode: bool,
    pub path_control: bool,
    pub program_flow: bool,
    pub spindle_mode: bool,
    pub tool: bool,
    pub change_tool: bool,
    pub feed_rate: bool,
    pub dwell_time: bool,
    pub spindle_speed: bool,
    pub target: [bool; AXES],
    pub arc_offset: [bool; 3],
    pub arc_radius: bool,
}

/// Resolve a normalized block into pending state + flags.
///
/// The first error abandons the block; no partial result escapes. After a
/// successful scan, unspecified axis targets are filled from the current
/// position when the block runs in absolute mode (or under G53), so the
/// dispatcher always sees fully-specified absolute targets. In relative
/// mode unspecified targets stay zero and mean zero delta.
pub fn resolve_block<M: CanonicalMachine>(
    buf: &str,
    machine: &mut M,
) -> Result<(PendingState, StateFlags), InterpError> {
    // modal fields persist even when this block never mentions them
    let mut pending = PendingState {
        next_action: machine.next_action(),
        motion_mode: machine.motion_mode(),
        absolute_mode: machine.absolute_mode(),
        ..PendingState::default()
    };
    let mut flags = StateFlags::default();
    machine.set_absolute_override(false);

    let mut cursor = 0;
    while let Some(stmt) = next_statement(buf, &mut cursor)? {
        apply_statement(&stmt, &mut pending, &mut flags, machine)?;
    }

    for axis in Axis::ALL {
        let i = axis.index();
        if (pending.absolute_mode || pending.absolute_override) && !flags.target[i] {
            pending.target[i] = machine.position(axis);
        }
    }

    Ok((pending, flags))
}

fn apply_statement<M: CanonicalMachine>(
    stmt: &Statement,
    pending: &mut PendingState,
    flags: &mut StateFlags,
    machine: &mut M,
) -> Result<(), InterpError> {
    match stmt.letter {
        'G' => apply_g_code(stmt, pending, flags)?,
        'M' => apply_m_code(stmt, pending, flags)?,
        'T' => {
            pending.tool = stmt.value.trunc() as u8;
            flags.tool = true;
        }
        'F' => {
            pending.feed_rate = stmt.value;
            flags.feed_rate = true;
        }
        'P' => {
            pending.dwell_time = stmt.value;
            flags.dwell_time = true;
        }
        'S' => {
            pending.spindle_speed = stmt.value;
            flags.spindle_speed = true;
        }
        'X' => set_target(pending, flags, Axis::X, stmt.value),
        'Y' => set_target(pending, flags, Axis::Y, stmt.value),
        'Z' => set_target(pending, flags, Axis::Z, stmt.value),
        'A' => set_target(pending, flags, Axis::A, stmt.value),
        'B' => set_target(pending, flags, Axis::B, stmt.value),
        'C' => set_target(pending, flags, Axis::C, stmt.value),
        'I' => set_arc_offset(pending, flags, 0, stmt.value),
        'J' => set_arc_offset(pending, flags, 1, stmt.value),
        'K' => set_arc_offset(pending, flags, 2, stmt.value),
        'R' => {
            pending.arc_radius = stmt.value;
            flags.arc_radius = true;
        }
        // line number goes straight to persistent state, no flag
        'N' => machine.set_line_number(stmt.value as u32),
        // U/V/W reserved, deliberately unsupported
        letter => {
            return Err(InterpError::UnrecognizedCommand {
                letter,
                value: stmt.value,
            });
        }
    }
    Ok(())
}

fn set_target(pending: &mut PendingState, flags: &mut StateFlags, axis: Axis, value: f64) {
    // last write wins within a block
    pending.target[axis.index()] = value;
    flags.target[axis.index()] = true;
}

fn set_arc_offset(pending: &mut PendingState, flags: &mut StateFlags, index: usize, value: f64) {
    pending.arc_offset[index] = value;
    flags.arc_offset[index] = true;
}

fn apply_g_code(
    stmt: &Statement,
    pending: &mut PendingState,
    flags: &mut StateFlags,
) -> Result<(), InterpError> {
    match stmt.value.trunc() as i64 {
        0 => set_motion(pending, flags, MotionMode::StraightTraverse),
        1 => set_motion(pending, flags, MotionMode::StraightFeed),
        2 => set_motion(pending, flags, MotionMode::CwArc),
        3 => set_motion(pending, flags, MotionMode::CcwArc),
        4 => {
            pending.next_action = NextAction::Dwell;
            flags.next_action = true;
        }
        17 => set_plane(pending, flags, Plane::Xy),
        18 => set_plane(pending, flags, Plane::Xz),
        19 => set_plane(pending, flags, Plane::Yz),
        20 => {
            pending.inches_mode = true;
            flags.inches_mode = true;
        }
        21 => {
            pending.inches_mode = false;
            flags.inches_mode = true;
        }
        28 => {
            pending.next_action = NextAction::ReturnToHome;
            flags.next_action = true;
        }
        30 => {
            pending.next_action = NextAction::HomingCycle;
            flags.next_action = true;
        }
        // cutter radius / tool length compensation are not implemented;
        // the cancel codes are accepted so programs that emit them run
        40 | 49 => {}
        53 => {
            pending.absolute_override = true;
            flags.absolute_override = true;
        }
        61 => {
            let mode = if stmt.fraction.abs() > EPSILON {
                PathControl::ExactStop // G61.1
            } else {
                PathControl::ExactPath
            };
            pending.path_control = mode;
            flags.path_control = true;
        }
        64 => {
            pending.path_control = PathControl::Continuous;
            flags.path_control = true;
        }
        80 => {
            pending.motion_mode = MotionMode::CancelMotionMode;
            flags.motion_mode = true;
        }
        90 => {
            pending.absolute_mode = true;
            flags.absolute_mode = true;
        }
        91 => {
            pending.absolute_mode = false;
            flags.absolute_mode = true;
        }
        92 => {
            pending.next_action = NextAction::OffsetCoordinates;
            flags.next_action = true;
            if stmt.fraction.abs() > EPSILON {
                // G92.1 cancels offsets: zero every target, overriding any
                // axis words already seen in this block
                for i in 0..AXES {
                    pending.target[i] = 0.0;
                    flags.target[i] = true;
                }
            }
        }
        93 => {
            pending.inverse_feed_rate_mode = true;
            flags.inverse_feed_rate_mode = true;
        }
        94 => {
            pending.inverse_feed_rate_mode = false;
            flags.inverse_feed_rate_mode = true;
        }
        _ => {
            return Err(InterpError::UnrecognizedCommand {
                letter: 'G',
                value: stmt.value,
            });
        }
    }
    Ok(())
}

fn apply_m_code(
    stmt: &Statement,
    pending: &mut PendingState,
    flags: &mut StateFlags,
) -> Result<(), InterpError> {
    match stmt.value.trunc() as i64 {
        0 | 1 => {
            pending.program_flow = ProgramFlow::Paused;
            flags.program_flow = true;
        }
        2 | 30 | 60 => {
            pending.program_flow = ProgramFlow::Completed;
            flags.program_flow = true;
        }
        3 => {
            pending.spindle_mode = SpindleMode::Clockwise;
            flags.spindle_mode = true;
        }
        4 => {
            pending.spindle_mode = SpindleMode::Counterclockwise;
            flags.spindle_mode = true;
        }
        5 => {
            pending.spindle_mode = SpindleMode::Off;
            flags.spindle_mode = true;
        }
        6 => {
            pending.change_tool = true;
            flags.change_tool = true;
        }
        // coolant and override enables are accepted no-ops
        7 | 8 | 9 | 48 | 49 => {}
        _ => {
            return Err(InterpError::UnrecognizedCommand {
                letter: 'M',
                value: stmt.value,
            });
        }
    }
    Ok(())
}

fn set_motion(pending: &mut PendingState, flags: &mut StateFlags, mode: MotionMode) {
    pending.motion_mode = mode;
    flags.motion_mode = true;
    // motion-commanding codes also commit the block to moving
    pending.next_action = NextAction::Motion;
    flags.next_action = true;
}

fn set_plane(pending: &mut PendingState, flags: &mut StateFlags, plane: Plane) {
    pending.select_plane = plane;
    flags.select_plane = true;
}
