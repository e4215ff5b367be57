//! Quarry Core - tabular data model and result pipeline
//!
//! This crate holds the pieces of Quarry that do not touch a connector:
//! - [`DataFrame`]: row-major tabular results with named columns
//! - [`Condition`]: row-level permission filters as a boolean expression tree
//! - [`slice_frame`]: the filter / normalize / slice pipeline

pub mod condition;
pub mod frame;
pub mod slice;

pub use condition::{Comparison, Condition, ConditionError, Operator};
pub use frame::{ColumnLabel, DataFrame, FrameError};
pub use slice::{slice_frame, DataSlice, DataStats, SlicePagination};
