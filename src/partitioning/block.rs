//! Contiguous block partitioner.

use super::{MeshPartitioner, PartitionOutcome, PartitionerError};
use crate::partitioning::metrics::edge_cut;
use crate::topology::dual_graph::build_dual;
use crate::topology::{ElementMesh, PartitionAssignment};

/// Splits element ids `0..n` into `n_parts` contiguous blocks whose sizes
/// differ by at most one. Deterministic and connectivity-blind; the
/// objective is the resulting dual-graph edge cut.
#[derive(Copy, Clone, Debug, Default)]
pub struct BlockPartitioner;

impl BlockPartitioner {
    /// Block assignment for `n_elements` elements.
    pub fn assign(n_elements: usize, n_parts: usize) -> Result<PartitionAssignment, PartitionerError> {
        if n_parts == 0 {
            return Err(PartitionerError::InvalidPartCount(n_parts));
        }
        Ok(PartitionAssignment::new(
            (0..n_elements).map(|e| e * n_parts / n_elements).collect(),
        ))
    }
}

impl MeshPartitioner for BlockPartitioner {
    fn partition(
        &self,
        mesh: &ElementMesh,
        n_common_nodes: usize,
        n_parts: usize,
    ) -> Result<PartitionOutcome, PartitionerError> {
        let assignment = Self::assign(mesh.n_elements(), n_parts)?;
        let dual = build_dual(mesh, n_common_nodes);
        let objective = edge_cut(&dual, &assignment) as i64;
        Ok(PartitionOutcome {
            assignment,
            objective,
        })
    }
}
