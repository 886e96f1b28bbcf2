//! Helpers over parent-index arrays.
//!
//! None of these assume a well-formed index: out-of-range entries are
//! clamped or skipped so malformed input never panics.

use crate::calculate::CalculateError;

/// The slot of `index` in a parent of `size` elements, if in range.
pub(crate) fn slot(index: i64, size: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < size)
}

/// Like [`slot`], but pulls out-of-range indices to the nearest end.
pub(crate) fn clamp_slot(index: i64, size: usize) -> Option<usize> {
    if size == 0 {
        return None;
    }

    Some(usize::try_from(index).map_or(0, |i| i.min(size - 1)))
}

/// Number of children of each parent.
#[must_use]
pub fn counts_per_parent(parent_index: &[i64], parent_size: usize) -> Vec<i64> {
    let mut counts = vec![0_i64; parent_size];
    for &index in parent_index {
        if let Some(i) = clamp_slot(index, parent_size) {
            counts[i] += 1;
        }
    }

    counts
}

/// Position of each element among the children of its parent.
#[must_use]
pub fn positions_in_parent(parent_index: &[i64], parent_size: usize) -> Vec<i64> {
    let mut seen = vec![0_i64; parent_size];

    parent_index
        .iter()
        .map(|&index| match clamp_slot(index, parent_size) {
            Some(i) => {
                let position = seen[i];
                seen[i] += 1;
                position
            }
            None => 0,
        })
        .collect()
}

/// Cumulative child counts, `parent_size + 1` entries starting at zero.
#[must_use]
pub fn row_splits(parent_index: &[i64], parent_size: usize) -> Vec<i64> {
    let mut splits = Vec::with_capacity(parent_size + 1);
    splits.push(0);

    let mut total = 0;
    for count in counts_per_parent(parent_index, parent_size) {
        total += count;
        splits.push(total);
    }

    splits
}

/// Check that a parent index is in range and sorted.
///
/// Entries must be non-decreasing, and strictly increasing when the level is
/// not repeated. The range check is skipped when the parent size is unknown.
pub fn validate_parent_index(
    parent_index: &[i64],
    parent_size: Option<usize>,
    is_repeated: bool,
    context: &str,
) -> Result<(), CalculateError> {
    if let Some(size) = parent_size
        && let Some(&bad) = parent_index.iter().find(|&&i| slot(i, size).is_none())
    {
        return Err(CalculateError::shape(
            context,
            format!("parent index {bad} out of range for parent size {size}"),
        ));
    }

    for pair in parent_index.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next < prev {
            return Err(CalculateError::shape(
                context,
                format!("parent index decreases from {prev} to {next}"),
            ));
        }
        if !is_repeated && next == prev {
            return Err(CalculateError::shape(
                context,
                format!("optional field has two values for parent {prev}"),
            ));
        }
    }

    Ok(())
}
