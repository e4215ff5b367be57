//! In-memory tabular results returned by connectors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Errors raised when assembling a [`DataFrame`] from raw parts.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("row {row} has {found} values, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}' has {found} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// A column identifier as produced by a connector.
///
/// Sources that label columns positionally (e.g. headerless files, some
/// driver result sets) yield numeric labels; [`DataFrame::normalize_columns`]
/// converts every label to its textual form so downstream consumers see a
/// uniform key type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnLabel {
    Index(i64),
    Text(String),
}

impl ColumnLabel {
    /// The textual form of the label, as produced by normalization.
    pub fn to_text(&self) -> String {
        match self {
            ColumnLabel::Text(s) => s.clone(),
            ColumnLabel::Index(i) => i.to_string(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ColumnLabel::Text(_))
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnLabel::Text(s) => f.write_str(s),
            ColumnLabel::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for ColumnLabel {
    fn from(s: &str) -> Self {
        ColumnLabel::Text(s.to_string())
    }
}

impl From<String> for ColumnLabel {
    fn from(s: String) -> Self {
        ColumnLabel::Text(s)
    }
}

impl From<i64> for ColumnLabel {
    fn from(i: i64) -> Self {
        ColumnLabel::Index(i)
    }
}

/// A row-major table with named columns and arbitrary JSON cell values.
///
/// Row order is preserved exactly as produced by the connector; the framework
/// never sorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<ColumnLabel>,
    rows: Vec<Vec<Value>>,
}

impl DataFrame {
    /// Build a frame from column labels and row-major cells, checking that
    /// every row matches the header arity.
    pub fn new(columns: Vec<ColumnLabel>, rows: Vec<Vec<Value>>) -> Result<Self, FrameError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(FrameError::RowLength {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a frame column by column. All columns must have the same length.
    pub fn from_columns<L: Into<ColumnLabel>>(
        columns: Vec<(L, Vec<Value>)>,
    ) -> Result<Self, FrameError> {
        let columns: Vec<(ColumnLabel, Vec<Value>)> = columns
            .into_iter()
            .map(|(label, values)| (label.into(), values))
            .collect();

        let expected = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        for (label, values) in &columns {
            if values.len() != expected {
                return Err(FrameError::ColumnLength {
                    column: label.to_text(),
                    expected,
                    found: values.len(),
                });
            }
        }

        let labels: Vec<ColumnLabel> = columns.iter().map(|(l, _)| l.clone()).collect();
        let mut rows = vec![Vec::with_capacity(labels.len()); expected];
        for (_, values) in columns {
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
        }
        Ok(Self {
            columns: labels,
            rows,
        })
    }

    /// An empty frame with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[ColumnLabel] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Position of the column whose textual form equals `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.to_text() == name)
    }

    /// The cell at (`row`, column named `name`), if both exist.
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let col = self.column_index(name)?;
        self.rows.get(row)?.get(col)
    }

    /// Convert every column label to its textual form in place.
    pub fn normalize_columns(&mut self) {
        for label in &mut self.columns {
            if !label.is_text() {
                *label = ColumnLabel::Text(label.to_text());
            }
        }
    }

    /// Keep the rows whose flag in `keep` is true. `keep` must have one entry
    /// per row.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let mut it = keep.iter();
        self.rows.retain(|_| *it.next().unwrap_or(&false));
    }

    /// Drop the first `offset` rows, then cap the remainder at `limit`.
    ///
    /// An offset beyond the row count yields an empty frame; an unset limit
    /// keeps all remaining rows.
    pub fn slice(mut self, offset: usize, limit: Option<usize>) -> Self {
        if offset >= self.rows.len() {
            self.rows.clear();
            return self;
        }
        self.rows.drain(..offset);
        if let Some(limit) = limit {
            self.rows.truncate(limit);
        }
        self
    }

    /// Rows as JSON records keyed by the textual column labels.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        let names: Vec<String> = self.columns.iter().map(ColumnLabel::to_text).collect();
        self.rows
            .iter()
            .map(|row| {
                names
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<Map<String, Value>>()
            })
            .collect()
    }
}
