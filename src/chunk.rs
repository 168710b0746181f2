//! Text units and transport batches.
//!
//! Two unrelated kinds of splitting happen during ingest:
//! - [`split_units`] cuts a document into indexable lines. Each unit gets
//!   one id and one vector.
//! - [`batch_ranges`] groups already-numbered vector records into insert
//!   requests. It never affects which id a unit receives.

use std::ops::Range;

/// Split text into indexable units, one per non-blank line.
///
/// Lines are trimmed; empty and whitespace-only lines are dropped and
/// consume no identifier.
pub fn split_units(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Half-open ranges covering `0..len` in steps of `batch_size`.
///
/// The final range may be shorter. Returns no ranges when `len == 0`.
pub fn batch_ranges(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..len)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(len))
        .collect()
}
