use std::fmt;

/// Errors raised when a batch cannot be generated from the current
/// parameter and variable definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// An enabled variable generates no values (bad range or empty list)
    EmptyVariable { name: String },
    /// The combined batch would contain no cases
    EmptyBatch,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::EmptyVariable { name } => {
                write!(f, "variable '{name}' is enabled but has no generated values")
            }
            BatchError::EmptyBatch => write!(f, "batch size is 0 (check variable settings)"),
        }
    }
}

impl std::error::Error for BatchError {}

pub type Result<T> = std::result::Result<T, BatchError>;
