//! Error taxonomy shared by the lingroup tools
//!
//! Everything here is fatal for the current run. Input-access failures are
//! not listed: they surface as the underlying I/O or CSV error with the
//! offending path attached as context.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LingroupError {
    #[error("column '{column}' not found in {table}")]
    MissingColumn { table: String, column: String },

    #[error("non-numeric value '{value}' in column '{column}' at data row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("input file has no header line: {0}")]
    EmptyInput(String),

    #[error("cannot compute {0}: denominator is zero")]
    EmptyDenominator(String),

    #[error("invalid containment threshold: {0}")]
    InvalidThreshold(String),
}
