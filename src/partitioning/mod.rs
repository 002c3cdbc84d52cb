//! Entry-point for element partitioning.
//!
//! The partitioner is an external collaborator: the classifier only consumes
//! the element→partition array it produces. [`BlockPartitioner`] is a
//! deterministic in-crate backend; METIS is available behind the
//! `metis-support` feature.

pub mod block;
pub mod error;
#[cfg(feature = "metis-support")]
pub mod metis;
pub mod metrics;

pub use block::BlockPartitioner;
pub use error::PartitionerError;
#[cfg(feature = "metis-support")]
pub use self::metis::MetisPartitioner;
pub use metrics::{edge_cut, face_cut};

use crate::topology::{ElementMesh, PartitionAssignment};

/// Element assignment plus the backend's objective value (edge cut for
/// graph partitioners).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOutcome {
    pub assignment: PartitionAssignment,
    pub objective: i64,
}

/// Produces an element→partition assignment from element→node connectivity.
pub trait MeshPartitioner {
    /// Partition `mesh` into `n_parts` parts; elements sharing at least
    /// `n_common_nodes` nodes are treated as neighbours.
    fn partition(
        &self,
        mesh: &ElementMesh,
        n_common_nodes: usize,
        n_parts: usize,
    ) -> Result<PartitionOutcome, PartitionerError>;
}

/// Run `partitioner` and check that every element received a part in range.
pub fn partition_mesh<P>(
    partitioner: &P,
    mesh: &ElementMesh,
    n_common_nodes: usize,
    n_parts: usize,
) -> Result<PartitionOutcome, PartitionerError>
where
    P: MeshPartitioner + ?Sized,
{
    if n_parts == 0 {
        return Err(PartitionerError::InvalidPartCount(n_parts));
    }
    let outcome = partitioner.partition(mesh, n_common_nodes, n_parts)?;
    if outcome.assignment.len() != mesh.n_elements() {
        return Err(PartitionerError::LengthMismatch {
            expected: mesh.n_elements(),
            found: outcome.assignment.len(),
        });
    }
    if let Some(&p) = outcome.assignment.as_slice().iter().find(|&&p| p >= n_parts) {
        return Err(PartitionerError::Other(format!(
            "part id {p} outside [0, {n_parts})"
        )));
    }
    let sizes = outcome.assignment.part_sizes(n_parts);
    log::info!(
        "partitioned {} elements into {n_parts} parts (objective {}): sizes {:?}",
        mesh.n_elements(),
        outcome.objective,
        sizes
    );
    if sizes.contains(&0) {
        log::warn!("partitioner left at least one part empty");
    }
    Ok(outcome)
}
