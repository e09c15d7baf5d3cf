//! Reference canonical machine.
//!
//! Stands in for the hardware-backed canonical machine: owns persistent
//! state, enforces the active [`MachineProfile`] limits, and records every
//! canonical operation so callers (and tests) can observe exactly what a
//! block did. Motion is applied instantaneously; trajectory planning is a
//! collaborator concern, not simulated here.

use serde::Serialize;

use crate::error::MachineError;
use crate::machine::{
    Axis, CanonicalMachine, MotionMode, NextAction, Plane, SpindleMode, Units, AXES,
};
use crate::profile::MachineProfile;
use crate::EPSILON;

/// A canonical operation applied by the dispatcher, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    SetInverseFeedRateMode(bool),
    SetFeedRate(f64),
    SetSpindleSpeed(f64),
    SelectTool(u8),
    ChangeTool(u8),
    StartSpindleCw,
    StartSpindleCcw,
    StopSpindle,
    Dwell(f64),
    SelectPlane(Plane),
    SetUnits(Units),
    SetAbsoluteMode(bool),
    ReturnToHome,
    HomingCycle,
    SetOriginOffsets([f64; AXES]),
    StraightTraverse([f64; AXES]),
    StraightFeed([f64; AXES]),
    ArcFeed {
        target: [f64; AXES],
        offset: [f64; 3],
        radius: f64,
        mode: MotionMode,
    },
    Message(String),
}

/// Serializable snapshot of the persistent machine state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineState {
    pub next_action: NextAction,
    pub motion_mode: MotionMode,
    pub absolute_mode: bool,
    pub absolute_override: bool,
    pub plane: Plane,
    pub units: Units,
    pub inverse_feed_rate_mode: bool,
    pub position: [f64; AXES],
    pub feed_rate: f64,
    pub spindle: SpindleMode,
    pub spindle_speed: f64,
    pub tool: u8,
    pub line_number: u32,
    pub line_count: u64,
    pub dwell_total: f64,
    pub messages: Vec<String>,
}

impl MachineState {
    fn initial(units: Units) -> Self {
        Self {
            next_action: NextAction::None,
            motion_mode: MotionMode::StraightTraverse,
            // power-on defaults: absolute distance mode, profile units
            absolute_mode: true,
            absolute_override: false,
            plane: Plane::Xy,
            units,
            inverse_feed_rate_mode: false,
            position: [0.0; AXES],
            feed_rate: 0.0,
            spindle: SpindleMode::Off,
            spindle_speed: 0.0,
            tool: 0,
            line_number: 0,
            line_count: 0,
            dwell_total: 0.0,
            messages: Vec::new(),
        }
    }
}

/// Reference [`CanonicalMachine`] implementation.
#[derive(Debug, Clone)]
pub struct SimMachine {
    profile: MachineProfile,
    state: MachineState,
    ops: Vec<Op>,
}

impl Default for SimMachine {
    fn default() -> Self {
        Self::new(MachineProfile::default())
    }
}

impl SimMachine {
    pub fn new(profile: MachineProfile) -> Self {
        let state = MachineState::initial(profile.units);
        Self {
            profile,
            state,
            ops: Vec::new(),
        }
    }

    /// Current persistent state snapshot.
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn profile(&self) -> &MachineProfile {
        &self.profile
    }

    /// Canonical operations applied so far, in call order. Only operations
    /// that passed validation are recorded.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Resolve the commanded target into machine coordinates: the target is
    /// a position in absolute mode (or under G53 override), a per-axis delta
    /// in relative mode.
    fn resolve_motion(&self, target: &[f64; AXES]) -> [f64; AXES] {
        let mut next = self.state.position;
        for axis in Axis::ALL {
            let i = axis.index();
            if self.state.absolute_mode || self.state.absolute_override {
                next[i] = target[i];
            } else {
                next[i] += target[i];
            }
        }
        next
    }

    fn check_travel(&self, next: &[f64; AXES]) -> Result<(), MachineError> {
        for axis in Axis::ALL {
            let value = next[axis.index()];
            if let Some(travel) = self.profile.travel(axis) {
                if value < travel.min || value > travel.max {
                    return Err(MachineError::TravelLimit {
                        axis: axis.letter(),
                        value,
                        min: travel.min,
                        max: travel.max,
                    });
                }
            }
        }
        Ok(())
    }

    fn check_tool(&self, tool: u8) -> Result<(), MachineError> {
        if tool > self.profile.tool_slots {
            return Err(MachineError::ToolOutOfRange {
                tool,
                slots: self.profile.tool_slots,
            });
        }
        Ok(())
    }

    fn commit_motion(&mut self, next: [f64; AXES], mode: MotionMode) {
        self.state.position = next;
        self.state.motion_mode = mode;
        self.state.next_action = NextAction::Motion;
    }
}

impl CanonicalMachine for SimMachine {
    fn next_action(&self) -> NextAction {
        self.state.next_action
    }

    fn motion_mode(&self) -> MotionMode {
        self.state.motion_mode
    }

    fn absolute_mode(&self) -> bool {
        self.state.absolute_mode
    }

    fn position(&self, axis: Axis) -> f64 {
        self.state.position[axis.index()]
    }

    fn begin_block(&mut self) {
        self.state.line_count += 1;
    }

    fn set_line_number(&mut self, number: u32) {
        self.state.line_number = number;
    }

    fn set_absolute_override(&mut self, on: bool) {
        self.state.absolute_override = on;
    }

    fn comment_message(&mut self, text: &str) {
        self.state.messages.push(text.to_string());
        self.ops.push(Op::Message(text.to_string()));
    }

    fn set_inverse_feed_rate_mode(&mut self, on: bool) -> Result<(), MachineError> {
        self.state.inverse_feed_rate_mode = on;
        self.ops.push(Op::SetInverseFeedRateMode(on));
        Ok(())
    }

    fn set_feed_rate(&mut self, rate: f64) -> Result<(), MachineError> {
        if !(0.0..=self.profile.max_feed_rate).contains(&rate) {
            return Err(MachineError::FeedRateLimit {
                requested: rate,
                max: self.profile.max_feed_rate,
            });
        }
        self.state.feed_rate = rate;
        self.ops.push(Op::SetFeedRate(rate));
        Ok(())
    }

    fn set_spindle_speed(&mut self, speed: f64) -> Result<(), MachineError> {
        if !(0.0..=self.profile.max_spindle_rpm).contains(&speed) {
            return Err(MachineError::SpindleSpeedLimit {
                requested: speed,
                max: self.profile.max_spindle_rpm,
            });
        }
        self.state.spindle_speed = speed;
        self.ops.push(Op::SetSpindleSpeed(speed));
        Ok(())
    }

    fn select_tool(&mut self, tool: u8) -> Result<(), MachineError> {
        self.check_tool(tool)?;
        self.ops.push(Op::SelectTool(tool));
        Ok(())
    }

    fn change_tool(&mut self, tool: u8) -> Result<(), MachineError> {
        self.check_tool(tool)?;
        self.state.tool = tool;
        self.ops.push(Op::ChangeTool(tool));
        Ok(())
    }

    fn start_spindle_clockwise(&mut self) -> Result<(), MachineError> {
        self.state.spindle = SpindleMode::Clockwise;
        self.ops.push(Op::StartSpindleCw);
        Ok(())
    }

    fn start_spindle_counterclockwise(&mut self) -> Result<(), MachineError> {
        self.state.spindle = SpindleMode::Counterclockwise;
        self.ops.push(Op::StartSpindleCcw);
        Ok(())
    }

    fn stop_spindle(&mut self) -> Result<(), MachineError> {
        self.state.spindle = SpindleMode::Off;
        self.ops.push(Op::StopSpindle);
        Ok(())
    }

    fn select_plane(&mut self, plane: Plane) -> Result<(), MachineError> {
        self.state.plane = plane;
        self.ops.push(Op::SelectPlane(plane));
        Ok(())
    }

    fn set_units(&mut self, units: Units) -> Result<(), MachineError> {
        // positions are kept in the numbers the program used; no rescaling
        self.state.units = units;
        self.ops.push(Op::SetUnits(units));
        Ok(())
    }

    fn set_absolute_mode(&mut self, absolute: bool) -> Result<(), MachineError> {
        self.state.absolute_mode = absolute;
        self.ops.push(Op::SetAbsoluteMode(absolute));
        Ok(())
    }

    fn set_origin_offsets(&mut self, target: &[f64; AXES]) -> Result<(), MachineError> {
        // relabel the current point as the commanded coordinates
        self.state.position = *target;
        self.ops.push(Op::SetOriginOffsets(*target));
        Ok(())
    }

    fn dwell(&mut self, seconds: f64) -> Result<(), MachineError> {
        self.state.dwell_total += seconds;
        self.ops.push(Op::Dwell(seconds));
        Ok(())
    }

    fn return_to_home(&mut self) -> Result<(), MachineError> {
        self.state.position = [0.0; AXES];
        self.ops.push(Op::ReturnToHome);
        Ok(())
    }

    fn homing_cycle(&mut self) -> Result<(), MachineError> {
        self.state.position = [0.0; AXES];
        self.ops.push(Op::HomingCycle);
        Ok(())
    }

    fn straight_traverse(&mut self, target: &[f64; AXES]) -> Result<(), MachineError> {
        let next = self.resolve_motion(target);
        self.check_travel(&next)?;
        self.commit_motion(next, MotionMode::StraightTraverse);
        self.ops.push(Op::StraightTraverse(*target));
        Ok(())
    }

    fn straight_feed(&mut self, target: &[f64; AXES]) -> Result<(), MachineError> {
        let next = self.resolve_motion(target);
        self.check_travel(&next)?;
        self.commit_motion(next, MotionMode::StraightFeed);
        self.ops.push(Op::StraightFeed(*target));
        Ok(())
    }

    fn arc_feed(
        &mut self,
        target: &[f64; AXES],
        offset: &[f64; 3],
        radius: f64,
        mode: MotionMode,
    ) -> Result<(), MachineError> {
        let radius_mode = radius.abs() > EPSILON;
        let has_offset = offset.iter().any(|v| v.abs() > EPSILON);
        if !radius_mode && !has_offset {
            return Err(MachineError::MissingArcGeometry);
        }

        let next = self.resolve_motion(target);
        self.check_travel(&next)?;
        self.commit_motion(next, mode);
        self.ops.push(Op::ArcFeed {
            target: *target,
            offset: *offset,
            radius,
            mode,
        });
        Ok(())
    }
}
