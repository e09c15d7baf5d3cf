//! Block normalization.
//!
//! Turns a raw input line into the canonical command string the scanner
//! expects: uppercase, no whitespace, comment stripped. Inline `MSG`
//! comments are delivered to the machine's message sink on the way through.

use crate::machine::CanonicalMachine;

/// A line starting with this character is discarded entirely.
pub const BLOCK_DELETE: char = '/';

/// A line starting with this character bypasses parsing; the caller handles
/// it as an out-of-band status query.
pub const QUERY: char = '?';

/// Punctuation that is never part of a command and is silently dropped.
const DISCARD: &str = "!$%,;:?@^_~`'\"";

/// Normalize a block in place.
///
/// After the call the buffer holds only characters the scanner accepts:
/// uppercase letters, digits, and `+ - . / * < = > | # ) [ ] { }`. The first
/// `(` terminates the command portion; the comment region is not emitted.
/// A block-delete line normalizes to empty. A query line is left untouched.
/// Idempotent on already-normalized input.
///
/// Also bumps the machine's persistent block counter, once per call.
pub fn normalize_block<M: CanonicalMachine>(block: &mut String, machine: &mut M) {
    machine.begin_block();

    if block.starts_with(BLOCK_DELETE) {
        block.clear();
        return;
    }
    if block.starts_with(QUERY) {
        return;
    }

    let mut out = String::with_capacity(block.len());
    let mut comment: Option<&str> = None;

    for (idx, raw) in block.char_indices() {
        let c = raw.to_ascii_uppercase();
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            out.push(c);
            continue;
        }
        if c == '(' {
            // comment runs to end of line; embedded commands after a
            // comment are not supported
            comment = Some(&block[idx + raw.len_utf8()..]);
            break;
        }
        if c <= ' ' || c == '\x7f' {
            continue;
        }
        if DISCARD.contains(c) {
            continue;
        }
        out.push(c);
    }

    if let Some(comment) = comment {
        deliver_message(comment, machine);
    }

    *block = out;
}

/// Forward a `MSG` comment to the machine, stripped of the closing paren.
/// The marker is case-insensitive; other comments are dropped.
fn deliver_message<M: CanonicalMachine>(comment: &str, machine: &mut M) {
    let bytes = comment.as_bytes();
    if bytes.len() < 3 || !bytes[..3].eq_ignore_ascii_case(b"MSG") {
        return;
    }
    let body = &comment[3..];
    let text = match body.find(')') {
        Some(end) => &body[..end],
        None => body,
    };
    machine.comment_message(text);
}
