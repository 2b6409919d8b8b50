//! Navigator reference entries and presence counts.

use crate::error::{EdmError, Result};

/// Row index meaning "no corresponding row for this event".
pub const NO_REFERENCE: i64 = -1;

/// One slot of a navigator reference row: which navigation path the
/// reference targets and which row of that path's event table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartRefEntry {
    /// Process/table identifier of the target navigation path.
    pub pidf: u16,
    /// Row index in the target event table, or [`NO_REFERENCE`].
    pub entry: i64,
}

impl SmartRefEntry {
    /// Whether this slot points at an actual row.
    pub fn is_present(&self) -> bool {
        self.entry != NO_REFERENCE
    }
}

/// Derive the presence-count matrix from per-event reference rows.
///
/// Returned path-major: `counts[path][event]` is 1 iff the event has a
/// row in that path's table. Every reference row must carry exactly
/// `n_paths` slots; a ragged row is a fatal
/// [`EdmError::SlotCountMismatch`].
///
/// Recomputed on every assembly call; nothing is cached across calls.
pub fn presence_counts(rows: &[Vec<SmartRefEntry>], n_paths: usize) -> Result<Vec<Vec<u32>>> {
    let mut counts = vec![vec![0u32; rows.len()]; n_paths];
    for (event, row) in rows.iter().enumerate() {
        if row.len() != n_paths {
            return Err(EdmError::SlotCountMismatch { slots: row.len(), paths: n_paths });
        }
        for (path, slot) in row.iter().enumerate() {
            counts[path][event] = u32::from(slot.is_present());
        }
    }
    Ok(counts)
}

/// Sum of one path's presence flags over `[0, event)`: the first
/// sub-table row belonging to `event`, because sub-tables store rows
/// contiguously in event order.
pub fn row_offset(path_counts: &[u32], event: usize) -> usize {
    path_counts[..event].iter().map(|&c| c as usize).sum()
}
