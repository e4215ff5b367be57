//! Post-retrieval pipeline: permission filtering, column normalization and
//! offset/limit slicing.

use crate::condition::{Condition, ConditionError};
use crate::frame::DataFrame;
use serde::{Deserialize, Serialize};

/// Counters describing a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStats {
    /// Row count after permission filtering, before slicing.
    pub total_returned_rows: usize,
    /// Row count actually returned in the slice.
    pub returned_rows: usize,
}

/// Window position of a slice within the filtered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlicePagination {
    pub offset: usize,
    pub limit: Option<usize>,
    /// Offset of the next page, or `None` when this slice reaches the end.
    pub next_offset: Option<usize>,
}

/// A sliced result: the rows plus the statistics paginated callers need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSlice {
    pub df: DataFrame,
    pub stats: DataStats,
    pub pagination: SlicePagination,
}

/// Run the full pipeline over a raw frame.
///
/// Steps, in order: keep the rows satisfying `permissions` (no filtering when
/// absent), normalize column labels to text, then apply `offset` and `limit`.
/// `stats.total_returned_rows` counts rows after filtering and before
/// slicing; an offset past the end yields an empty slice, not an error.
pub fn slice_frame(
    frame: DataFrame,
    permissions: Option<&Condition>,
    offset: usize,
    limit: Option<usize>,
) -> Result<DataSlice, ConditionError> {
    let mut filtered = match permissions {
        Some(cond) => cond.filter(&frame)?,
        None => frame,
    };
    filtered.normalize_columns();

    let total_returned_rows = filtered.num_rows();
    let df = filtered.slice(offset, limit);
    let returned_rows = df.num_rows();

    let next_offset = if offset + returned_rows < total_returned_rows && returned_rows > 0 {
        Some(offset + returned_rows)
    } else {
        None
    };

    Ok(DataSlice {
        df,
        stats: DataStats {
            total_returned_rows,
            returned_rows,
        },
        pagination: SlicePagination {
            offset,
            limit,
            next_offset,
        },
    })
}
