use std::collections::TryReserveError;
use std::fmt::Debug;

use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum DescriptorIndexError {
    /// An argument was absent, empty, zero where a positive value is required, or not finite.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A descriptor did not have the dimension of the records in the tree.
    #[error("Descriptor dimension mismatch: expected {expected}, got {actual}.")]
    DimensionMismatch {
        /// The dimension shared by the indexed records.
        expected: usize,
        /// The dimension that was supplied.
        actual: usize,
    },

    /// Memory for tree nodes or a result sequence could not be reserved.
    #[error("Allocation failure: {0}")]
    AllocationFailure(#[from] TryReserveError),
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, DescriptorIndexError>;
