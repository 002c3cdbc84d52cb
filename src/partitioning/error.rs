//! Partitioning errors for mesh-halo

use thiserror::Error;

/// Errors reported by a [`MeshPartitioner`](super::MeshPartitioner).
///
/// Partitioning is deterministic: none of these are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionerError {
    /// The backend returned a non-success status code.
    #[error("Partitioner returned status {0}")]
    Status(i32),
    /// The backend produced an assignment of the wrong length.
    #[error("Partitioner returned {found} assignments for {expected} elements")]
    LengthMismatch { expected: usize, found: usize },
    /// The requested number of parts cannot be produced.
    #[error("Cannot partition into {0} parts")]
    InvalidPartCount(usize),
    /// Other errors (e.g. METIS wrapper failures)
    #[error("Partitioner error: {0}")]
    Other(String),
}
