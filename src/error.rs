//! Errors raised while configuring a grid.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    /// The packed engine stores whole elements per row.
    #[error("grid width {width} is not a multiple of {lanes} cells per element")]
    InvalidWidth { width: usize, lanes: usize },
    #[error("live chance {chance} must be between 0.0 and 1.0")]
    InvalidChance { chance: f64 },
    #[error("unknown kernel variant: {0} (expected table or bitwise)")]
    UnknownKernel(String),
}
