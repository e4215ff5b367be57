//! Row-level permission filters as a small boolean expression tree.
//!
//! A filter is either a single column comparison or an `and`/`or` combination
//! of nested filters. The JSON shape is the one callers already exchange:
//! `{"column": "A", "operator": "eq", "value": 1}`,
//! `{"and": [...]}` or `{"or": [...]}`.

use crate::frame::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

/// Errors raised while evaluating a filter against a frame.
#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("unknown column '{0}' in permission filter")]
    UnknownColumn(String),

    #[error("operator '{operator}' cannot compare column '{column}' with the given value")]
    NotComparable { column: String, operator: Operator },

    #[error("operator '{operator}' requires an array value")]
    ExpectedArray { operator: Operator },
}

/// Comparison operators supported in filter leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Nin,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::In => "in",
            Operator::Nin => "nin",
        };
        f.write_str(s)
    }
}

/// A single column comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

/// A filter expression: a comparison leaf or a boolean combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    And { and: Vec<Condition> },
    Or { or: Vec<Condition> },
    Comparison(Comparison),
}

impl Condition {
    /// Convenience constructor for a comparison leaf.
    pub fn comparison(column: impl Into<String>, operator: Operator, value: Value) -> Self {
        Condition::Comparison(Comparison {
            column: column.into(),
            operator,
            value,
        })
    }

    /// Whether row `row` of `frame` satisfies this filter.
    pub fn matches_row(&self, frame: &DataFrame, row: usize) -> Result<bool, ConditionError> {
        match self {
            Condition::And { and } => {
                for cond in and {
                    if !cond.matches_row(frame, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Or { or } => {
                for cond in or {
                    if cond.matches_row(frame, row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Comparison(cmp) => cmp.matches_row(frame, row),
        }
    }

    /// Return a new frame keeping only the rows that satisfy this filter.
    /// Row order is preserved.
    pub fn filter(&self, frame: &DataFrame) -> Result<DataFrame, ConditionError> {
        let mut keep = Vec::with_capacity(frame.num_rows());
        for row in 0..frame.num_rows() {
            keep.push(self.matches_row(frame, row)?);
        }
        let mut filtered = frame.clone();
        filtered.retain_rows(&keep);
        Ok(filtered)
    }
}

impl Comparison {
    fn matches_row(&self, frame: &DataFrame, row: usize) -> Result<bool, ConditionError> {
        let col = frame
            .column_index(&self.column)
            .ok_or_else(|| ConditionError::UnknownColumn(self.column.clone()))?;
        let null = Value::Null;
        let cell = frame
            .row(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&null);

        match self.operator {
            Operator::Eq => Ok(values_equal(cell, &self.value)),
            Operator::Ne => Ok(!values_equal(cell, &self.value)),
            Operator::Lt => self.ordered(cell, |o| o == Ordering::Less),
            Operator::Le => self.ordered(cell, |o| o != Ordering::Greater),
            Operator::Gt => self.ordered(cell, |o| o == Ordering::Greater),
            Operator::Ge => self.ordered(cell, |o| o != Ordering::Less),
            Operator::In => Ok(self.candidates()?.iter().any(|v| values_equal(cell, v))),
            Operator::Nin => Ok(!self.candidates()?.iter().any(|v| values_equal(cell, v))),
        }
    }

    fn ordered(&self, cell: &Value, accept: impl Fn(Ordering) -> bool) -> Result<bool, ConditionError> {
        match compare_values(cell, &self.value) {
            Some(ordering) => Ok(accept(ordering)),
            None => Err(ConditionError::NotComparable {
                column: self.column.clone(),
                operator: self.operator,
            }),
        }
    }

    fn candidates(&self) -> Result<&Vec<Value>, ConditionError> {
        self.value.as_array().ok_or(ConditionError::ExpectedArray {
            operator: self.operator,
        })
    }
}

/// Value equality with numeric coercion: `1` and `1.0` are the same cell
/// value even though their JSON representations differ.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering between two cell values. Numbers compare numerically, strings
/// lexicographically; any other pairing is not comparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Some(x.cmp(y));
    }
    None
}
