//! Ordered canonical dispatch.
//!
//! Applies a resolved block to the canonical machine in the fixed RS274
//! evaluation order, regardless of how the words were ordered in the input
//! line. Fail-fast: the first failed operation aborts the remaining steps,
//! and steps already applied stay applied.

use crate::error::{InterpError, MachineError};
use crate::interp::resolver::{PendingState, StateFlags};
use crate::machine::{CanonicalMachine, MotionMode, NextAction, SpindleMode, Units};

/// Invoke `op` only when `flag` is set, propagating its failure. Every
/// flag-gated step below goes through here so the ordering reads as one
/// list.
fn apply_if<F>(flag: bool, op: F) -> Result<(), MachineError>
where
    F: FnOnce() -> Result<(), MachineError>,
{
    if flag {
        op()
    } else {
        Ok(())
    }
}

/// Execute a resolved block against the machine.
///
/// Step order follows the RS274/NGC evaluation-order table: feed rate mode,
/// feed rate, spindle speed, tool select, tool change, spindle, dwell,
/// plane, units, distance mode, homing, origin offsets, motion.
pub fn execute_block<M: CanonicalMachine>(
    pending: &PendingState,
    flags: &StateFlags,
    machine: &mut M,
) -> Result<(), InterpError> {
    apply_if(flags.inverse_feed_rate_mode, || {
        machine.set_inverse_feed_rate_mode(pending.inverse_feed_rate_mode)
    })?;
    apply_if(flags.feed_rate, || machine.set_feed_rate(pending.feed_rate))?;
    apply_if(flags.spindle_speed, || {
        machine.set_spindle_speed(pending.spindle_speed)
    })?;
    apply_if(flags.tool, || machine.select_tool(pending.tool))?;
    apply_if(flags.change_tool, || machine.change_tool(pending.tool))?;

    if flags.spindle_mode {
        match pending.spindle_mode {
            SpindleMode::Clockwise => machine.start_spindle_clockwise()?,
            SpindleMode::Counterclockwise => machine.start_spindle_counterclockwise()?,
            // fail-safe: anything else stops the spindle
            SpindleMode::Off => machine.stop_spindle()?,
        }
    }

    if pending.next_action == NextAction::Dwell {
        machine.dwell(pending.dwell_time)?;
    }

    apply_if(flags.select_plane, || {
        machine.select_plane(pending.select_plane)
    })?;

    if flags.inches_mode {
        let units = if pending.inches_mode {
            Units::Inches
        } else {
            Units::Millimeters
        };
        machine.set_units(units)?;
        // A units change ends the block here; any distance-mode change,
        // homing, or motion in the same block is dropped. Kept for
        // compatibility with the historical execution list (see DESIGN.md).
        log::debug!("units change ends block execution early");
        return Ok(());
    }

    apply_if(flags.absolute_mode, || {
        machine.set_absolute_mode(pending.absolute_mode)
    })?;

    if pending.next_action == NextAction::ReturnToHome {
        machine.return_to_home()?;
    }

    if pending.next_action == NextAction::HomingCycle {
        machine.homing_cycle()?;
    }

    if pending.next_action == NextAction::OffsetCoordinates {
        machine.set_origin_offsets(&pending.target)?;
    }

    if pending.next_action == NextAction::Motion {
        match pending.motion_mode {
            MotionMode::StraightTraverse => machine.straight_traverse(&pending.target)?,
            MotionMode::StraightFeed => machine.straight_feed(&pending.target)?,
            MotionMode::CwArc | MotionMode::CcwArc => machine.arc_feed(
                &pending.target,
                &pending.arc_offset,
                pending.arc_radius,
                pending.motion_mode,
            )?,
            MotionMode::CancelMotionMode => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{Axis, Op, Plane, SimMachine, AXES};

    fn pending() -> (PendingState, StateFlags) {
        (PendingState::default(), StateFlags::default())
    }

    #[test]
    fn test_empty_flags_invoke_nothing() {
        let mut machine = SimMachine::default();
        let (p, f) = pending();
        execute_block(&p, &f, &mut machine).expect("execute");
        assert!(machine.ops().is_empty());
    }

    #[test]
    fn test_settings_applied_in_fixed_order() {
        let mut machine = SimMachine::default();
        let (mut p, mut f) = pending();
        // flags set "out of order" relative to the execution list
        p.select_plane = Plane::Yz;
        f.select_plane = true;
        p.feed_rate = 350.0;
        f.feed_rate = true;
        p.spindle_speed = 900.0;
        f.spindle_speed = true;
        p.spindle_mode = SpindleMode::Clockwise;
        f.spindle_mode = true;

        execute_block(&p, &f, &mut machine).expect("execute");
        assert_eq!(
            machine.ops(),
            &[
                Op::SetFeedRate(350.0),
                Op::SetSpindleSpeed(900.0),
                Op::StartSpindleCw,
                Op::SelectPlane(Plane::Yz),
            ]
        );
    }

    #[test]
    fn test_units_step_skips_rest_of_block() {
        let mut machine = SimMachine::default();
        let (mut p, mut f) = pending();
        p.inches_mode = true;
        f.inches_mode = true;
        p.absolute_mode = false;
        f.absolute_mode = true;
        p.next_action = NextAction::Motion;
        p.motion_mode = MotionMode::StraightTraverse;
        p.target[Axis::X.index()] = 10.0;

        execute_block(&p, &f, &mut machine).expect("execute");
        assert_eq!(machine.ops(), &[Op::SetUnits(Units::Inches)]);
        // distance mode and motion were dropped
        assert!(machine.absolute_mode());
        assert_eq!(machine.position(Axis::X), 0.0);
    }

    #[test]
    fn test_dwell_runs_then_block_continues() {
        let mut machine = SimMachine::default();
        let (mut p, mut f) = pending();
        p.next_action = NextAction::Dwell;
        p.dwell_time = 1.5;
        p.select_plane = Plane::Xz;
        f.select_plane = true;

        execute_block(&p, &f, &mut machine).expect("execute");
        assert_eq!(
            machine.ops(),
            &[Op::Dwell(1.5), Op::SelectPlane(Plane::Xz)]
        );
    }

    #[test]
    fn test_failed_step_keeps_earlier_effects() {
        let mut machine = SimMachine::default();
        let max = machine.profile().max_spindle_rpm;
        let (mut p, mut f) = pending();
        p.feed_rate = 100.0;
        f.feed_rate = true;
        p.spindle_speed = max + 1.0;
        f.spindle_speed = true;
        p.spindle_mode = SpindleMode::Clockwise;
        f.spindle_mode = true;

        let err = execute_block(&p, &f, &mut machine).unwrap_err();
        assert!(matches!(
            err,
            InterpError::Machine(MachineError::SpindleSpeedLimit { .. })
        ));
        // feed rate step already committed; spindle never started
        assert_eq!(machine.state().feed_rate, 100.0);
        assert_eq!(machine.state().spindle, SpindleMode::Off);
        assert_eq!(machine.ops(), &[Op::SetFeedRate(100.0)]);
    }

    #[test]
    fn test_origin_offsets_use_resolved_target() {
        let mut machine = SimMachine::default();
        let (mut p, f) = pending();
        p.next_action = NextAction::OffsetCoordinates;
        p.target[Axis::X.index()] = 25.0;

        execute_block(&p, &f, &mut machine).expect("execute");
        let mut expected = [0.0; AXES];
        expected[Axis::X.index()] = 25.0;
        assert_eq!(machine.ops(), &[Op::SetOriginOffsets(expected)]);
    }

    #[test]
    fn test_cancelled_motion_mode_moves_nothing() {
        let mut machine = SimMachine::default();
        let (mut p, f) = pending();
        p.next_action = NextAction::Motion;
        p.motion_mode = MotionMode::CancelMotionMode;
        p.target[Axis::X.index()] = 10.0;

        execute_block(&p, &f, &mut machine).expect("execute");
        assert!(machine.ops().is_empty());
        assert_eq!(machine.position(Axis::X), 0.0);
    }

    #[test]
    fn test_arc_forwards_offsets_radius_and_mode() {
        let mut machine = SimMachine::default();
        let (mut p, f) = pending();
        p.next_action = NextAction::Motion;
        p.motion_mode = MotionMode::CcwArc;
        p.target[Axis::X.index()] = 4.0;
        p.arc_offset = [2.0, 0.0, 0.0];

        execute_block(&p, &f, &mut machine).expect("execute");
        assert_eq!(
            machine.ops(),
            &[Op::ArcFeed {
                target: p.target,
                offset: [2.0, 0.0, 0.0],
                radius: 0.0,
                mode: MotionMode::CcwArc,
            }]
        );
    }
}
