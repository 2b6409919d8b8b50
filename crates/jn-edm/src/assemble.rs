//! Event assembly from the navigator reference table.
//!
//! Each logical event references at most one row in every sub-detector
//! table. The assembler derives per-path presence counts from the
//! reference rows, reads exactly the row range each path contributes to
//! the requested event slice, and regroups the flat rows into one
//! variable-length group per event. Events with no row anywhere survive
//! as empty groups, so the result always has one outer entry per event.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, ListArray, StructArray};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field, FieldRef, Fields};

use crate::error::{EdmError, Result};
use crate::filter::PathFilter;
use crate::refs::{presence_counts, row_offset};
use crate::store::{event_table_name, EventStore, GEN_PATH};

/// Assemble events over `[entry_start, entry_stop)`.
///
/// Defaults: full event range. The result is a struct keyed by resolved
/// event-table name; each field is a list column whose outer length is
/// the number of events in range and whose inner lengths are that
/// path's presence counts. A filter matching nothing yields a zero-field
/// struct of the correct length, not an error.
///
/// Presence counts are recomputed from the live reference table on every
/// call; files are typically opened once and queried a bounded number of
/// times, so no cache is kept.
pub fn assemble<S: EventStore + ?Sized>(
    store: &S,
    filter: &PathFilter,
    entry_start: Option<usize>,
    entry_stop: Option<usize>,
) -> Result<StructArray> {
    let nav_paths = store.nav_paths()?;
    let ref_rows = store.navigator_refs()?;
    let n_events = ref_rows.len();

    // Fails on any reference row whose slot count differs from the
    // navigation-path count: mispaired or corrupted file.
    let counts = presence_counts(&ref_rows, nav_paths.len())?;

    let entry_stop = entry_stop.unwrap_or(n_events).min(n_events);
    let entry_start = entry_start.unwrap_or(0).min(entry_stop);

    let mut fields: Vec<FieldRef> = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();

    for (i, nav_path) in nav_paths.iter().enumerate() {
        if nav_path == GEN_PATH {
            continue;
        }
        if !store.contains(nav_path) || !filter.matches(nav_path) {
            continue;
        }
        let Some(table_name) = event_table_name(nav_path) else {
            log::warn!("no event-table mapping for navigation path '{nav_path}', skipping");
            continue;
        };

        // Sub-tables store rows contiguously in event order, so the row
        // range for an event slice is the prefix sum of presence flags
        // over the full range up to each slice boundary.
        let row_start = row_offset(&counts[i], entry_start);
        let row_stop = row_offset(&counts[i], entry_stop);
        let raw = store.read_rows(nav_path, row_start, row_stop)?;

        // One-field tables lose their wrapper: the caller gets the bare
        // column, not a single-field record.
        let values: ArrayRef = if raw.num_columns() == 1 {
            raw.column(0).clone()
        } else {
            Arc::new(raw)
        };

        let group_sizes = &counts[i][entry_start..entry_stop];
        let expected: usize = group_sizes.iter().map(|&c| c as usize).sum();
        if expected != values.len() {
            return Err(EdmError::GroupSizeMismatch {
                path: nav_path.clone(),
                expected,
                got: values.len(),
            });
        }

        let item_field = Arc::new(Field::new("item", values.data_type().clone(), true));
        let offsets = OffsetBuffer::from_lengths(group_sizes.iter().map(|&c| c as usize));
        let list = ListArray::try_new(item_field.clone(), offsets, values, None)?;

        fields.push(Arc::new(Field::new(table_name, DataType::List(item_field), false)));
        columns.push(Arc::new(list) as ArrayRef);
    }

    if fields.is_empty() {
        // Downstream row-count expectations still hold with no columns.
        return Ok(StructArray::new_empty_fields(entry_stop - entry_start, None));
    }
    Ok(StructArray::try_new(Fields::from(fields), columns, None)?)
}
