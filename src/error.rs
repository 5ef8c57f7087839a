//! Error type shared by the chart model, the encoders and the tree parser.

use thiserror::Error;

/// Recoverable failures of chart construction and style editing.
///
/// Style edits that fail with any of these leave the element untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChartError {
    #[error("invalid color specification: {0:?}")]
    InvalidColor(String),

    #[error("{field} must be a non-negative finite number, got {value}")]
    NegativeValue { field: &'static str, value: f64 },

    #[error("opacity must lie in [0, 1], got {0}")]
    OpacityOutOfRange(f64),

    #[error("{kind} elements have no {field} property")]
    UnsupportedField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("element {0} mirrors a linked primary and cannot be styled directly")]
    LinkedReadOnly(usize),

    #[error("cannot link element {primary} to {secondary}: {reason}")]
    InvalidLink {
        primary: usize,
        secondary: usize,
        reason: &'static str,
    },

    #[error("no element with id {0}")]
    UnknownElement(usize),

    #[error("row {row:?} is missing required field {field}")]
    MissingField { row: String, field: &'static str },

    #[error("weight range is degenerate (min = max = {0}); scaled sizing needs max > min")]
    DegenerateWeights(f64),

    #[error("unknown colormap {0:?}")]
    UnknownColormap(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("newick parse error at byte {pos}: {msg}")]
    Newick { pos: usize, msg: String },
}

pub type Result<T> = std::result::Result<T, ChartError>;
