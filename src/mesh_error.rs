//! MeshHaloError: unified error type for mesh-halo public APIs
//!
//! Classification-time errors are fatal for the mesh/partition configuration
//! that produced them: there is no partial-success mode, callers are expected
//! to abort the pipeline and fix the input.

use crate::data::accumulation::FieldState;
use crate::overlap::role::Role;
use crate::partitioning::error::PartitionerError;
use thiserror::Error;

/// Unified error type for mesh-halo operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshHaloError {
    /// A face references an element id outside `[0, n_elements)`.
    #[error("Invalid adjacency: face {face} references element {element}, outside [0, {n_elements})")]
    InvalidAdjacency {
        face: usize,
        element: usize,
        n_elements: usize,
    },
    /// A face whose left and right endpoints are the same element.
    #[error("Invalid adjacency: face {face} connects element {element} to itself")]
    DegenerateFace { face: usize, element: usize },
    /// An element id outside the mesh was passed to a per-element accessor.
    #[error("Element {element} out of range [0, {n_elements})")]
    ElementOutOfRange { element: usize, n_elements: usize },
    /// An element has no partition assigned.
    #[error("Element {0} has no partition assignment")]
    UnpartitionedElement(usize),
    /// The requested partition count does not fit in a ghost mask.
    #[error("Requested {requested} partitions, but ghost masks hold at most {capacity}")]
    PartitionCountExceedsCapacity { requested: usize, capacity: usize },
    /// An element is assigned to a partition id not covered by the requested count.
    #[error("Element {element} is assigned to partition {partition}, but only {n_parts} partitions were requested")]
    PartitionOutOfRange {
        element: usize,
        partition: usize,
        n_parts: usize,
    },
    /// Accumulated value deviates from the expected multiple of the stored reference.
    #[error("Reduction ordering violation at element {element} (iteration {iteration}): relative error {relative_error:e}")]
    ReductionOrderingViolation {
        element: usize,
        iteration: usize,
        relative_error: f64,
    },
    /// A permutation is not a bijection over the element ids, or does not fit the mesh.
    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),
    /// Element-to-node connectivity handed over by mesh I/O is malformed.
    #[error("Invalid element connectivity: {0}")]
    InvalidConnectivity(String),
    /// Operation not allowed in the current accumulation-field state.
    #[error("Accumulation field is {found:?}, operation requires {expected}")]
    InvalidFieldState {
        found: FieldState,
        expected: &'static str,
    },
    /// A contribution was routed with a role the element does not have.
    #[error("Element {element} cannot take a {role:?} contribution")]
    RoleMismatch { element: usize, role: Role },
    /// A contribution or reference does not match the field width.
    #[error("Width mismatch: expected {expected} values per element, found {found}")]
    WidthMismatch { expected: usize, found: usize },
    /// A classification was used with a mesh other than the one it was built for.
    #[error("Classification built for {expected_elements} elements / {expected_faces} faces, used with {found_elements} / {found_faces}")]
    StaleClassification {
        expected_elements: usize,
        expected_faces: usize,
        found_elements: usize,
        found_faces: usize,
    },
    /// Consistency check requested before a reference pass was captured.
    #[error("No reference pass captured")]
    MissingReference,
    /// Configuration rejected before any work started.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// A structural invariant did not hold.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    /// The external partitioner failed.
    #[error(transparent)]
    Partitioner(#[from] PartitionerError),
}
