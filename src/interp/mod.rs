//! G-code interpretation pipeline.
//!
//! One block at a time: normalize in place, scan statements, resolve modal
//! state, dispatch canonical operations in fixed order. Synchronous and
//! non-reentrant; the machine is exclusively borrowed for the whole block.

pub mod dispatch;
pub mod normalize;
pub mod resolver;
pub mod scanner;

pub use normalize::{BLOCK_DELETE, QUERY};
pub use resolver::{PendingState, StateFlags};
pub use scanner::Statement;

use crate::error::InterpError;
use crate::machine::CanonicalMachine;

/// What a successfully handled block amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The block resolved and dispatched.
    Executed,
    /// Nothing to execute: the line was a comment, a deleted block, or
    /// empty. Distinct from a parse error.
    Empty,
    /// A `?` status query; the line is left unparsed for the caller.
    Query,
}

/// Interpret one block of G-code, normalizing the buffer in place.
///
/// Parse errors abort before any dispatch; dispatch errors abort the
/// remaining steps without undoing the ones already applied. Neither is
/// fatal: the caller reports the error and feeds the next block.
pub fn interpret_block<M: CanonicalMachine>(
    block: &mut String,
    machine: &mut M,
) -> Result<BlockOutcome, InterpError> {
    normalize::normalize_block(block, machine);
    if block.starts_with(QUERY) {
        return Ok(BlockOutcome::Query);
    }
    if block.is_empty() {
        return Ok(BlockOutcome::Empty);
    }
    log::trace!("normalized block: {}", block);

    let (pending, flags) = resolver::resolve_block(block, machine)?;
    dispatch::execute_block(&pending, &flags, machine)?;
    Ok(BlockOutcome::Executed)
}

/// Convenience wrapper for callers with an immutable line.
pub fn interpret_line<M: CanonicalMachine>(
    line: &str,
    machine: &mut M,
) -> Result<BlockOutcome, InterpError> {
    let mut block = line.to_string();
    interpret_block(&mut block, machine)
}
