//! Locating the typology table inside a worksheet.

use crate::storage::{ColumnMap, Grid};

/// No row of the sheet contains the marker token.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{marker} not found in any row")]
pub struct HeaderNotFound {
    marker: String,
}

/// Finds the first row with a cell containing `marker`.
///
/// Rows are scanned top to bottom and no row is assumed to be a header.
///
/// # Errors
///
/// Returns [`HeaderNotFound`] if no row contains the marker.
pub fn locate(grid: &Grid, marker: &str) -> Result<usize, HeaderNotFound> {
    grid.rows()
        .position(|row| row.iter().any(|cell| cell.contains(marker)))
        .ok_or_else(|| HeaderNotFound {
            marker: marker.to_string(),
        })
}

/// Picks the row holding the column labels, given the marker row.
///
/// The marker usually sits in a title row (e.g. "MQM Error Types") above the
/// labels. A marker row that already carries every required label is used as
/// is; otherwise the labels are on the first non-blank row below it.
#[must_use]
pub fn column_header_row(grid: &Grid, marker_row: usize) -> usize {
    let labels_on_marker_row = grid
        .row(marker_row)
        .is_some_and(|row| ColumnMap::map(row).is_ok());

    if labels_on_marker_row {
        return marker_row;
    }

    (marker_row + 1..grid.len())
        .find(|&index| grid.row(index).is_some_and(|row| !is_blank(row)))
        .unwrap_or(marker_row + 1)
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}
