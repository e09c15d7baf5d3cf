//! G-code interpreter core
//!
//! The interpretation pipeline of a CNC motion controller: block
//! normalization, statement scanning, modal-state resolution, and ordered
//! dispatch to a canonical machine.
//!
//! This library provides:
//! - The block pipeline: [`interpret_block`] / [`interpret_line`]
//! - The [`CanonicalMachine`] interface the dispatcher drives
//! - A reference machine ([`SimMachine`]) with profile-based limits
//! - Machine profile loading from TOML

pub mod config;
pub mod error;
pub mod interp;
pub mod machine;
pub mod profile;

// Re-exports for clean public API
pub use config::Config;
pub use error::{InterpError, MachineError};
pub use interp::{interpret_block, interpret_line, BlockOutcome, PendingState, StateFlags};
pub use machine::{Axis, CanonicalMachine, SimMachine, AXES};
pub use profile::MachineProfile;

/// Tolerance for "is this float meaningfully nonzero" checks on parsed
/// fractions and arc geometry.
pub(crate) const EPSILON: f64 = 1e-9;
